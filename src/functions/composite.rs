//! Composite functions.
//!
//! A [`CompositeFunction`] owns an ordered list of child functions and
//! presents the union of their parameters as one contiguous space. Global
//! parameter `i` belongs to the child `k` with
//! `param_offsets[k] <= i < param_offsets[k] + children[k].n_params()`; the
//! same holds for active parameters and `active_offsets`.
//!
//! All index translation goes through one [`ParameterLayout`] which is
//! rebuilt from the children after every edit that can change a child's
//! declared or active parameter count.

use super::numeric::DEFAULT_STEP;
use super::{
    function_to_string, numeric_derivative, BoundaryConstraint, Function, FunctionId,
    ParameterRef, ParameterTie, ParameterValues,
};
use crate::error::{FrameworkError, Result};
use ndarray::{s, Array1, Array2};
use tracing::debug;

/// Split a composite parameter name `fK.rest` into `(Some(K), rest)`.
///
/// A name without a `.` is unqualified and yields `(None, name)`. Fails with
/// `InvalidArgument` when the part before the first `.` is not `f` followed
/// by digits, or when nothing follows the `.`.
pub fn parse_name(name: &str) -> Result<(Option<usize>, String)> {
    let (prefix, rest) = match name.split_once('.') {
        None => return Ok((None, name.to_string())),
        Some(parts) => parts,
    };

    let digits = prefix
        .strip_prefix('f')
        .filter(|d| !d.is_empty() && d.chars().all(|c| c.is_ascii_digit()))
        .ok_or_else(|| {
            FrameworkError::InvalidArgument(format!(
                "parameter name '{}' must start with f<index>.",
                name
            ))
        })?;
    let index = digits.parse::<usize>().map_err(|_| {
        FrameworkError::InvalidArgument(format!("bad function index in '{}'", name))
    })?;

    if rest.is_empty() {
        return Err(FrameworkError::InvalidArgument(format!(
            "parameter name '{}' has no name after the function index",
            name
        )));
    }
    Ok((Some(index), rest.to_string()))
}

/// Derived index tables of a composite.
#[derive(Debug, Clone, Default, PartialEq)]
struct ParameterLayout {
    param_offsets: Vec<usize>,
    active_offsets: Vec<usize>,
    /// Owning child of each declared parameter.
    param_owner: Vec<usize>,
    /// Owning child of each active parameter.
    active_owner: Vec<usize>,
}

impl ParameterLayout {
    fn build(children: &[Box<dyn Function>]) -> Self {
        let mut layout = Self::default();
        for (k, child) in children.iter().enumerate() {
            layout.param_offsets.push(layout.param_owner.len());
            layout.active_offsets.push(layout.active_owner.len());
            layout
                .param_owner
                .extend(std::iter::repeat(k).take(child.n_params()));
            layout
                .active_owner
                .extend(std::iter::repeat(k).take(child.n_active()));
        }
        layout
    }
}

/// A sum of child functions sharing one flat parameter space.
#[derive(Clone)]
pub struct CompositeFunction {
    id: FunctionId,
    children: Vec<Box<dyn Function>>,
    layout: ParameterLayout,
}

impl Default for CompositeFunction {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CompositeFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&function_to_string(self))
    }
}

impl CompositeFunction {
    pub fn new() -> Self {
        Self {
            id: FunctionId::next(),
            children: Vec::new(),
            layout: ParameterLayout::default(),
        }
    }

    fn rebuild(&mut self) {
        self.layout = ParameterLayout::build(&self.children);
    }

    fn check_function_index(&self, i: usize) -> Result<()> {
        if i >= self.children.len() {
            return Err(FrameworkError::OutOfRange(format!(
                "function {} of {}",
                i,
                self.children.len()
            )));
        }
        Ok(())
    }

    /// Reject a child that shares an identity with any function already in
    /// the tree, except the one at `replacing`.
    fn check_distinct(&self, child: &dyn Function, replacing: Option<usize>) -> Result<()> {
        let incoming = child.function_ids();
        let clash = incoming.contains(&self.id)
            || self
                .children
                .iter()
                .enumerate()
                .filter(|(k, _)| Some(*k) != replacing)
                .flat_map(|(_, c)| c.function_ids())
                .any(|id| incoming.contains(&id));
        if clash {
            return Err(FrameworkError::InvalidArgument(
                "function (or a clone of it) is already part of this composite".to_string(),
            ));
        }
        Ok(())
    }

    /// Remove every tie outside child `i` whose expression reads a parameter
    /// of child `i`.
    fn remove_ties_into(&mut self, i: usize) -> Result<()> {
        let departing = self.children[i].function_ids();
        let mut dangling = Vec::new();
        for global in 0..self.n_params() {
            if self.layout.param_owner[global] == i {
                continue;
            }
            if let Some(tie) = self.get_tie(global)? {
                if tie.depends_on(|r| departing.contains(&r.function)) {
                    dangling.push(global);
                }
            }
        }
        for global in dangling {
            debug!(parameter = %self.parameter_name(global)?, "removing tie on departing function");
            self.remove_tie(global)?;
        }
        Ok(())
    }

    /// Append a child; returns its index.
    pub fn add_function(&mut self, child: Box<dyn Function>) -> Result<usize> {
        self.check_distinct(child.as_ref(), None)?;
        self.children.push(child);
        self.rebuild();
        Ok(self.children.len() - 1)
    }

    /// Remove and drop child `i`, first removing the ties that read its
    /// parameters.
    pub fn remove_function(&mut self, i: usize) -> Result<()> {
        self.check_function_index(i)?;
        self.remove_ties_into(i)?;
        self.children.remove(i);
        self.rebuild();
        Ok(())
    }

    /// Put `child` in place of child `i`, dropping the old one.
    pub fn replace_function(&mut self, i: usize, child: Box<dyn Function>) -> Result<()> {
        self.check_function_index(i)?;
        self.check_distinct(child.as_ref(), Some(i))?;
        self.remove_ties_into(i)?;
        self.children[i] = child;
        self.rebuild();
        Ok(())
    }

    pub fn n_functions(&self) -> usize {
        self.children.len()
    }

    pub fn get_function(&self, i: usize) -> Result<&dyn Function> {
        self.check_function_index(i)?;
        Ok(self.children[i].as_ref())
    }

    /// Run `edit` on child `i` and refresh the index tables afterwards.
    pub fn function_mut<R, F>(&mut self, i: usize, edit: F) -> Result<R>
    where
        F: FnOnce(&mut dyn Function) -> R,
    {
        self.check_function_index(i)?;
        let result = edit(self.children[i].as_mut());
        self.rebuild();
        Ok(result)
    }

    /// `(child, local index)` of declared parameter `i`.
    pub fn locate(&self, i: usize) -> Result<(usize, usize)> {
        let k = self.function_index(i)?;
        Ok((k, i - self.layout.param_offsets[k]))
    }

    /// `(child, local active index)` of active parameter `i`.
    pub fn locate_active(&self, i: usize) -> Result<(usize, usize)> {
        let k = self.function_index_active(i)?;
        Ok((k, i - self.layout.active_offsets[k]))
    }

    /// Child owning declared parameter `i`.
    pub fn function_index(&self, i: usize) -> Result<usize> {
        self.layout.param_owner.get(i).copied().ok_or_else(|| {
            FrameworkError::OutOfRange(format!("parameter {} of {}", i, self.n_params()))
        })
    }

    /// Child owning active parameter `i`.
    pub fn function_index_active(&self, i: usize) -> Result<usize> {
        self.layout.active_owner.get(i).copied().ok_or_else(|| {
            FrameworkError::OutOfRange(format!("active parameter {} of {}", i, self.n_active()))
        })
    }

    pub fn param_offset(&self, k: usize) -> Result<usize> {
        self.check_function_index(k)?;
        Ok(self.layout.param_offsets[k])
    }

    pub fn active_offset(&self, k: usize) -> Result<usize> {
        self.check_function_index(k)?;
        Ok(self.layout.active_offsets[k])
    }

    pub fn param_offsets(&self) -> &[usize] {
        &self.layout.param_offsets
    }

    pub fn active_offsets(&self) -> &[usize] {
        &self.layout.active_offsets
    }

    fn qualified(&self, name: &str) -> Result<(usize, String)> {
        match parse_name(name)? {
            (Some(k), local) => {
                self.check_function_index(k)?;
                Ok((k, local))
            }
            (None, _) => Err(FrameworkError::InvalidArgument(format!(
                "'{}' must be qualified as f<index>.<name> in a composite function",
                name
            ))),
        }
    }
}

impl Function for CompositeFunction {
    fn name(&self) -> String {
        "CompositeFunction".to_string()
    }

    fn id(&self) -> FunctionId {
        self.id
    }

    fn function_ids(&self) -> Vec<FunctionId> {
        let mut ids = vec![self.id];
        for child in &self.children {
            ids.extend(child.function_ids());
        }
        ids
    }

    fn clone_box(&self) -> Box<dyn Function> {
        Box::new(self.clone())
    }

    fn n_params(&self) -> usize {
        self.layout.param_owner.len()
    }

    fn parameter(&self, i: usize) -> Result<f64> {
        let (k, local) = self.locate(i)?;
        self.children[k].parameter(local)
    }

    fn set_parameter(&mut self, i: usize, value: f64) -> Result<()> {
        let (k, local) = self.locate(i)?;
        self.children[k].set_parameter(local, value)
    }

    fn parameter_name(&self, i: usize) -> Result<String> {
        let (k, local) = self.locate(i)?;
        Ok(format!("f{}.{}", k, self.children[k].parameter_name(local)?))
    }

    fn parameter_index(&self, name: &str) -> Result<usize> {
        let (k, local) = self.qualified(name)?;
        Ok(self.layout.param_offsets[k] + self.children[k].parameter_index(&local)?)
    }

    fn parameter_ref(&self, i: usize) -> Result<ParameterRef> {
        let (k, local) = self.locate(i)?;
        self.children[k].parameter_ref(local)
    }

    fn name_of_ref(&self, reference: &ParameterRef) -> Option<String> {
        self.children
            .iter()
            .enumerate()
            .find_map(|(k, c)| c.name_of_ref(reference).map(|n| format!("f{}.{}", k, n)))
    }

    fn collect_values(&self, values: &mut ParameterValues) {
        for child in &self.children {
            child.collect_values(values);
        }
    }

    fn n_active(&self) -> usize {
        self.layout.active_owner.len()
    }

    fn is_active(&self, i: usize) -> Result<bool> {
        let (k, local) = self.locate(i)?;
        self.children[k].is_active(local)
    }

    fn index_of_active(&self, i: usize) -> Result<usize> {
        let (k, local) = self.locate_active(i)?;
        Ok(self.layout.param_offsets[k] + self.children[k].index_of_active(local)?)
    }

    fn remove_active(&mut self, i: usize) -> Result<()> {
        let (k, local) = self.locate(i)?;
        self.children[k].remove_active(local)?;
        self.rebuild();
        Ok(())
    }

    fn restore_active(&mut self, i: usize) -> Result<()> {
        let (k, local) = self.locate(i)?;
        self.children[k].restore_active(local)?;
        self.rebuild();
        Ok(())
    }

    fn add_tie(&mut self, tie: ParameterTie) -> Result<()> {
        let owner = tie.parameter().function;
        let k = self
            .children
            .iter()
            .position(|c| c.function_ids().contains(&owner))
            .ok_or_else(|| {
                FrameworkError::InvalidArgument(
                    "tied parameter is not part of this composite".to_string(),
                )
            })?;
        self.children[k].add_tie(tie)?;
        self.rebuild();
        Ok(())
    }

    fn remove_tie(&mut self, i: usize) -> Result<bool> {
        let (k, local) = self.locate(i)?;
        let removed = self.children[k].remove_tie(local)?;
        self.rebuild();
        Ok(removed)
    }

    fn get_tie(&self, i: usize) -> Result<Option<&ParameterTie>> {
        let (k, local) = self.locate(i)?;
        self.children[k].get_tie(local)
    }

    fn n_ties(&self) -> usize {
        self.children.iter().map(|c| c.n_ties()).sum()
    }

    fn apply_ties_with(&mut self, values: &ParameterValues) -> Result<()> {
        for child in self.children.iter_mut() {
            child.apply_ties_with(values)?;
        }
        Ok(())
    }

    fn clear_ties(&mut self) {
        for child in self.children.iter_mut() {
            child.clear_ties();
        }
        self.rebuild();
    }

    fn declare_parameter(&mut self, name: &str, _initial: f64) -> Result<()> {
        Err(FrameworkError::NotImplemented(format!(
            "a composite function cannot declare its own parameter '{}'",
            name
        )))
    }

    fn add_constraint(&mut self, constraint: BoundaryConstraint) -> Result<()> {
        Err(FrameworkError::NotImplemented(format!(
            "a composite function cannot hold constraints (on '{}'); add it to the child",
            constraint.parameter_name()
        )))
    }

    fn remove_constraint(&mut self, name: &str) -> Result<bool> {
        let (k, local) = self.qualified(name)?;
        self.children[k].remove_constraint(&local)
    }

    fn constraint_penalty(&self) -> f64 {
        self.children.iter().map(|c| c.constraint_penalty()).sum()
    }

    fn function(&self, x: &Array1<f64>) -> Result<Array1<f64>> {
        let mut total = Array1::zeros(x.len());
        for child in &self.children {
            total += &child.function(x)?;
        }
        Ok(total)
    }

    /// Without ties, each child's block sits at its active offset. Ties can
    /// couple children, so a tied composite is differenced as a whole.
    fn function_deriv(&self, x: &Array1<f64>) -> Result<Array2<f64>> {
        if self.n_ties() > 0 {
            return numeric_derivative(self, x, DEFAULT_STEP);
        }
        let mut jac = Array2::zeros((x.len(), self.n_active()));
        for (k, child) in self.children.iter().enumerate() {
            let cols = child.n_active();
            if cols == 0 {
                continue;
            }
            let offset = self.layout.active_offsets[k];
            let block = child.function_deriv(x)?;
            jac.slice_mut(s![.., offset..offset + cols]).assign(&block);
        }
        Ok(jac)
    }

    fn definition(&self) -> String {
        self.children
            .iter()
            .map(|c| match c.as_composite() {
                Some(_) => format!("({})", c.definition()),
                None => c.definition(),
            })
            .collect::<Vec<_>>()
            .join(";")
    }

    fn as_dyn(&self) -> &dyn Function {
        self
    }

    fn as_composite(&self) -> Option<&CompositeFunction> {
        Some(self)
    }
}
