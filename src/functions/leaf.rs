//! Parameter storage shared by all atomic functions.

use super::{BoundaryConstraint, Function, FunctionId, ParameterRef, ParameterTie, ParameterValues};
use crate::error::{FrameworkError, Result};
use ndarray::{Array1, Array2};

/// Names, values, fixed flags, ties and constraints of one atomic
/// function's parameters.
///
/// A parameter is active when it is neither fixed nor tied. Fixing and tying
/// are independent, so removing a tie leaves a fixed parameter fixed.
#[derive(Debug, Clone)]
pub struct ParameterStore {
    id: FunctionId,
    names: Vec<String>,
    values: Vec<f64>,
    fixed: Vec<bool>,
    ties: Vec<ParameterTie>,
    constraints: Vec<(usize, BoundaryConstraint)>,
}

impl Default for ParameterStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ParameterStore {
    pub fn new() -> Self {
        Self {
            id: FunctionId::next(),
            names: Vec::new(),
            values: Vec::new(),
            fixed: Vec::new(),
            ties: Vec::new(),
            constraints: Vec::new(),
        }
    }

    pub fn id(&self) -> FunctionId {
        self.id
    }

    pub fn declare(&mut self, name: &str, initial: f64) -> Result<()> {
        if name.is_empty() || name.contains('.') {
            return Err(FrameworkError::InvalidArgument(format!(
                "'{}' is not a valid parameter name",
                name
            )));
        }
        if self.names.iter().any(|n| n == name) {
            return Err(FrameworkError::DuplicateName(format!("parameter '{}'", name)));
        }
        self.names.push(name.to_string());
        self.values.push(initial);
        self.fixed.push(false);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn check(&self, i: usize) -> Result<()> {
        if i >= self.values.len() {
            return Err(FrameworkError::OutOfRange(format!(
                "parameter {} of {}",
                i,
                self.values.len()
            )));
        }
        Ok(())
    }

    pub fn value(&self, i: usize) -> Result<f64> {
        self.check(i)?;
        Ok(self.values[i])
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn set_value(&mut self, i: usize, value: f64) -> Result<()> {
        self.check(i)?;
        self.values[i] = value;
        Ok(())
    }

    pub fn name(&self, i: usize) -> Result<&str> {
        self.check(i)?;
        Ok(&self.names[i])
    }

    pub fn index(&self, name: &str) -> Result<usize> {
        self.names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| FrameworkError::NotFound(format!("parameter '{}'", name)))
    }

    fn is_tied(&self, i: usize) -> bool {
        self.ties.iter().any(|t| t.parameter().index == i)
    }

    pub fn is_active(&self, i: usize) -> Result<bool> {
        self.check(i)?;
        Ok(!self.fixed[i] && !self.is_tied(i))
    }

    pub fn is_fixed(&self, i: usize) -> Result<bool> {
        self.check(i)?;
        Ok(self.fixed[i])
    }

    /// Fix (`active == false`) or release a parameter. A tied parameter
    /// cannot be made active.
    pub fn set_active(&mut self, i: usize, active: bool) -> Result<()> {
        self.check(i)?;
        if active && self.is_tied(i) {
            return Err(FrameworkError::Runtime(format!(
                "parameter '{}' is tied",
                self.names[i]
            )));
        }
        self.fixed[i] = !active;
        Ok(())
    }

    pub fn n_active(&self) -> usize {
        self.active_indices().len()
    }

    /// Declared indices of the active parameters, ascending.
    pub fn active_indices(&self) -> Vec<usize> {
        (0..self.values.len())
            .filter(|&i| !self.fixed[i] && !self.is_tied(i))
            .collect()
    }

    pub fn n_ties(&self) -> usize {
        self.ties.len()
    }

    pub fn index_of_active(&self, i: usize) -> Result<usize> {
        self.active_indices().get(i).copied().ok_or_else(|| {
            FrameworkError::OutOfRange(format!("active parameter {} of {}", i, self.n_active()))
        })
    }

    pub fn tie(&self, i: usize) -> Result<Option<&ParameterTie>> {
        self.check(i)?;
        Ok(self.ties.iter().find(|t| t.parameter().index == i))
    }

    /// Store a tie on one of this store's parameters, replacing any existing
    /// tie.
    pub fn add_tie(&mut self, tie: ParameterTie) -> Result<()> {
        let target = tie.parameter();
        if target.function != self.id {
            return Err(FrameworkError::InvalidArgument(
                "tie does not belong to this function".to_string(),
            ));
        }
        self.check(target.index)?;
        self.ties.retain(|t| t.parameter().index != target.index);
        self.ties.push(tie);
        Ok(())
    }

    pub fn remove_tie(&mut self, i: usize) -> Result<bool> {
        self.check(i)?;
        let before = self.ties.len();
        self.ties.retain(|t| t.parameter().index != i);
        Ok(self.ties.len() != before)
    }

    pub fn clear_ties(&mut self) {
        self.ties.clear();
    }

    pub fn apply_ties(&mut self, values: &ParameterValues) -> Result<()> {
        for tie in &self.ties {
            self.values[tie.parameter().index] = tie.evaluate(values)?;
        }
        Ok(())
    }

    pub fn add_constraint(&mut self, constraint: BoundaryConstraint) -> Result<()> {
        let i = self.index(constraint.parameter_name())?;
        self.constraints.retain(|(index, _)| *index != i);
        self.constraints.push((i, constraint));
        Ok(())
    }

    pub fn remove_constraint(&mut self, name: &str) -> Result<bool> {
        let i = self.index(name)?;
        let before = self.constraints.len();
        self.constraints.retain(|(index, _)| *index != i);
        Ok(self.constraints.len() != before)
    }

    pub fn constraint_penalty(&self) -> f64 {
        self.constraints
            .iter()
            .map(|(i, c)| c.check(self.values[*i]))
            .sum()
    }
}

/// An atomic function: one [`ParameterStore`] and a formula.
///
/// Every `LeafFunction` is a [`Function`] through a blanket implementation.
pub trait LeafFunction: Clone + Send + Sync + 'static {
    /// Registered name.
    const NAME: &'static str;

    fn store(&self) -> &ParameterStore;

    fn store_mut(&mut self) -> &mut ParameterStore;

    fn evaluate(&self, x: &Array1<f64>) -> Array1<f64>;

    /// Analytic Jacobian over all declared parameters, if available.
    fn derivatives(&self, _x: &Array1<f64>) -> Option<Array2<f64>> {
        None
    }
}

impl<T: LeafFunction> Function for T {
    fn name(&self) -> String {
        T::NAME.to_string()
    }

    fn id(&self) -> FunctionId {
        self.store().id()
    }

    fn function_ids(&self) -> Vec<FunctionId> {
        vec![self.store().id()]
    }

    fn clone_box(&self) -> Box<dyn Function> {
        Box::new(self.clone())
    }

    fn n_params(&self) -> usize {
        self.store().len()
    }

    fn parameter(&self, i: usize) -> Result<f64> {
        self.store().value(i)
    }

    fn set_parameter(&mut self, i: usize, value: f64) -> Result<()> {
        self.store_mut().set_value(i, value)
    }

    fn parameter_name(&self, i: usize) -> Result<String> {
        Ok(self.store().name(i)?.to_string())
    }

    fn parameter_index(&self, name: &str) -> Result<usize> {
        self.store().index(name)
    }

    fn parameter_ref(&self, i: usize) -> Result<ParameterRef> {
        self.store().name(i)?;
        Ok(ParameterRef {
            function: self.store().id(),
            index: i,
        })
    }

    fn name_of_ref(&self, reference: &ParameterRef) -> Option<String> {
        if reference.function != self.store().id() {
            return None;
        }
        self.store().name(reference.index).ok().map(str::to_string)
    }

    fn collect_values(&self, values: &mut ParameterValues) {
        let id = self.store().id();
        for (index, value) in self.store().values().iter().enumerate() {
            values.insert(ParameterRef { function: id, index }, *value);
        }
    }

    fn n_active(&self) -> usize {
        self.store().n_active()
    }

    fn is_active(&self, i: usize) -> Result<bool> {
        self.store().is_active(i)
    }

    fn index_of_active(&self, i: usize) -> Result<usize> {
        self.store().index_of_active(i)
    }

    fn remove_active(&mut self, i: usize) -> Result<()> {
        self.store_mut().set_active(i, false)
    }

    fn restore_active(&mut self, i: usize) -> Result<()> {
        self.store_mut().set_active(i, true)
    }

    fn add_tie(&mut self, tie: ParameterTie) -> Result<()> {
        self.store_mut().add_tie(tie)
    }

    fn remove_tie(&mut self, i: usize) -> Result<bool> {
        self.store_mut().remove_tie(i)
    }

    fn get_tie(&self, i: usize) -> Result<Option<&ParameterTie>> {
        self.store().tie(i)
    }

    fn n_ties(&self) -> usize {
        self.store().n_ties()
    }

    fn apply_ties_with(&mut self, values: &ParameterValues) -> Result<()> {
        self.store_mut().apply_ties(values)
    }

    fn clear_ties(&mut self) {
        self.store_mut().clear_ties()
    }

    fn declare_parameter(&mut self, name: &str, initial: f64) -> Result<()> {
        self.store_mut().declare(name, initial)
    }

    fn add_constraint(&mut self, constraint: BoundaryConstraint) -> Result<()> {
        self.store_mut().add_constraint(constraint)
    }

    fn remove_constraint(&mut self, name: &str) -> Result<bool> {
        self.store_mut().remove_constraint(name)
    }

    fn constraint_penalty(&self) -> f64 {
        self.store().constraint_penalty()
    }

    fn function(&self, x: &Array1<f64>) -> Result<Array1<f64>> {
        Ok(self.evaluate(x))
    }

    /// Tied functions use numeric differences.
    fn function_deriv(&self, x: &Array1<f64>) -> Result<Array2<f64>> {
        let analytic = if self.store().n_ties() == 0 {
            self.derivatives(x)
        } else {
            None
        };
        match analytic {
            Some(full) => {
                let active = self.store().active_indices();
                Ok(full.select(ndarray::Axis(1), &active))
            }
            None => super::numeric_derivative(self, x, super::numeric::DEFAULT_STEP),
        }
    }

    fn definition(&self) -> String {
        let store = self.store();
        let mut parts = vec![format!("name={}", T::NAME)];
        for i in 0..store.len() {
            parts.push(format!("{}={}", store.names[i], store.values[i]));
        }
        parts.join(",")
    }

    fn as_dyn(&self) -> &dyn Function {
        self
    }
}
