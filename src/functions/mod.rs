//! # Fit Functions
//!
//! Mathematical models with named parameters, combined into composite
//! functions that expose one flat parameter space.
//!
//! ## Key Features
//!
//! - **Declared and active parameters**: every parameter has a global index;
//!   parameters that are fixed or tied are removed from the active space a
//!   minimizer works in
//! - **Ties**: a parameter can be bound to an expression of others
//!   (`f1.A0 = 2 * f0.Height`)
//! - **Composites**: [`CompositeFunction`] sums its children and translates
//!   global indices and `fK.name` names to the owning child
//! - **Factory**: [`FunctionFactory`] builds functions from definition strings
//!
//! ## Example Usage
//!
//! ```rust
//! use datareduce_rs::functions::{CompositeFunction, Function, Gaussian, LinearBackground};
//!
//! let mut composite = CompositeFunction::new();
//! composite.add_function(Box::new(Gaussian::new(1.0, 0.0, 0.5))).unwrap();
//! composite.add_function(Box::new(LinearBackground::new(0.1, 0.0))).unwrap();
//!
//! assert_eq!(composite.n_params(), 5);
//! assert_eq!(composite.parameter_name(3).unwrap(), "f1.A0");
//!
//! composite.tie("f1.A0", "f0.Height / 10").unwrap();
//! assert_eq!(composite.n_active(), 4);
//! ```

mod composite;
mod constraint;
mod factory;
mod leaf;
mod numeric;
mod peaks;
mod tie;

use crate::error::{FrameworkError, Result};
use ndarray::{Array1, Array2};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

pub use composite::{parse_name, CompositeFunction};
pub use constraint::BoundaryConstraint;
pub use factory::FunctionFactory;
pub use leaf::{LeafFunction, ParameterStore};
pub use numeric::numeric_derivative;
pub use peaks::{ExpDecay, FlatBackground, Gaussian, LinearBackground, Lorentzian};
pub use tie::ParameterTie;

static NEXT_FUNCTION_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a function instance. Clones share the identity of the
/// original.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FunctionId(u64);

impl FunctionId {
    pub fn next() -> Self {
        FunctionId(NEXT_FUNCTION_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Stable address of a parameter: the declaring function and the
/// parameter's index within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParameterRef {
    pub function: FunctionId,
    pub index: usize,
}

/// Snapshot of parameter values keyed by address.
pub type ParameterValues = HashMap<ParameterRef, f64>;

/// A fittable function of one variable.
///
/// Global parameter indices run over all declared parameters; active indices
/// run over the declared parameters that are neither fixed nor tied.
pub trait Function: Send + Sync {
    /// Registered name, e.g. `"Gaussian"`.
    fn name(&self) -> String;

    fn id(&self) -> FunctionId;

    /// Identities of this function and every function nested in it.
    fn function_ids(&self) -> Vec<FunctionId>;

    fn clone_box(&self) -> Box<dyn Function>;

    fn n_params(&self) -> usize;

    fn parameter(&self, i: usize) -> Result<f64>;

    fn set_parameter(&mut self, i: usize, value: f64) -> Result<()>;

    fn parameter_name(&self, i: usize) -> Result<String>;

    fn parameter_index(&self, name: &str) -> Result<usize>;

    fn get_parameter(&self, name: &str) -> Result<f64> {
        self.parameter(self.parameter_index(name)?)
    }

    fn set_parameter_by_name(&mut self, name: &str, value: f64) -> Result<()> {
        let i = self.parameter_index(name)?;
        self.set_parameter(i, value)
    }

    fn parameter_ref(&self, i: usize) -> Result<ParameterRef>;

    fn parameter_ref_by_name(&self, name: &str) -> Result<ParameterRef> {
        self.parameter_ref(self.parameter_index(name)?)
    }

    /// Current name of an addressed parameter, if it belongs to this function.
    fn name_of_ref(&self, reference: &ParameterRef) -> Option<String>;

    /// Add every parameter value to `values`.
    fn collect_values(&self, values: &mut ParameterValues);

    fn n_active(&self) -> usize;

    fn is_active(&self, i: usize) -> Result<bool>;

    /// Declared index of the `i`-th active parameter.
    fn index_of_active(&self, i: usize) -> Result<usize>;

    fn active_parameter(&self, i: usize) -> Result<f64> {
        self.parameter(self.index_of_active(i)?)
    }

    fn set_active_parameter(&mut self, i: usize, value: f64) -> Result<()> {
        let declared = self.index_of_active(i)?;
        self.set_parameter(declared, value)
    }

    fn name_of_active(&self, i: usize) -> Result<String> {
        self.parameter_name(self.index_of_active(i)?)
    }

    /// Take a declared parameter out of the active space.
    fn remove_active(&mut self, i: usize) -> Result<()>;

    /// Return a declared parameter to the active space.
    fn restore_active(&mut self, i: usize) -> Result<()>;

    fn fix(&mut self, i: usize) -> Result<()> {
        self.remove_active(i)
    }

    /// Release a fixed parameter. Tied parameters stay inactive.
    fn unfix(&mut self, i: usize) -> Result<()> {
        if self.get_tie(i)?.is_some() {
            return Err(FrameworkError::Runtime(format!(
                "parameter '{}' is tied",
                self.parameter_name(i)?
            )));
        }
        self.restore_active(i)
    }

    /// Tie the parameter `name` to `expression`; names in the expression
    /// are spelled as seen from this function.
    fn tie(&mut self, name: &str, expression: &str) -> Result<()> {
        let target = self.parameter_ref_by_name(name)?;
        let tie = ParameterTie::new(target, expression, self.as_dyn())?;
        self.add_tie(tie)
    }

    /// Hand a tie to the function that declares its parameter.
    fn add_tie(&mut self, tie: ParameterTie) -> Result<()>;

    /// Remove the tie on declared parameter `i`. Returns whether there was one.
    fn remove_tie(&mut self, i: usize) -> Result<bool>;

    fn get_tie(&self, i: usize) -> Result<Option<&ParameterTie>>;

    /// Number of tied parameters.
    fn n_ties(&self) -> usize {
        (0..self.n_params())
            .filter(|&i| matches!(self.get_tie(i), Ok(Some(_))))
            .count()
    }

    /// Set every tied parameter from the current values.
    ///
    /// A tie may read another tied parameter, so ties are applied in passes
    /// until no value changes. A chain of `n` ties settles within `n` passes;
    /// ties that never settle are circular and fail with `Runtime`.
    fn apply_ties(&mut self) -> Result<()> {
        let n_ties = self.n_ties();
        let mut values = ParameterValues::new();
        self.collect_values(&mut values);
        for _ in 0..=n_ties {
            self.apply_ties_with(&values)?;
            let mut updated = ParameterValues::new();
            self.collect_values(&mut updated);
            if same_values(&values, &updated) {
                return Ok(());
            }
            values = updated;
        }
        Err(FrameworkError::Runtime(format!(
            "ties did not settle after {} passes; check for circular ties",
            n_ties + 1
        )))
    }

    /// Set every tied parameter from a snapshot taken at an enclosing scope.
    fn apply_ties_with(&mut self, values: &ParameterValues) -> Result<()>;

    fn clear_ties(&mut self);

    /// Add a new parameter to this function.
    fn declare_parameter(&mut self, name: &str, initial: f64) -> Result<()>;

    fn add_constraint(&mut self, constraint: BoundaryConstraint) -> Result<()>;

    /// Remove the constraint on parameter `name`, returning whether one existed.
    fn remove_constraint(&mut self, name: &str) -> Result<bool>;

    /// Sum of all constraint penalties at the current values.
    fn constraint_penalty(&self) -> f64;

    /// Evaluate at every point of `x`.
    fn function(&self, x: &Array1<f64>) -> Result<Array1<f64>>;

    /// Jacobian with one column per active parameter.
    fn function_deriv(&self, x: &Array1<f64>) -> Result<Array2<f64>> {
        numeric_derivative(self.as_dyn(), x, numeric::DEFAULT_STEP)
    }

    /// `name=...` definition without ties, understood by [`FunctionFactory`].
    fn definition(&self) -> String;

    fn as_dyn(&self) -> &dyn Function;

    fn as_composite(&self) -> Option<&CompositeFunction> {
        None
    }
}

/// Bitwise comparison, so a NaN produced by a tie still compares equal to
/// itself.
fn same_values(a: &ParameterValues, b: &ParameterValues) -> bool {
    a.len() == b.len()
        && a
            .iter()
            .all(|(k, v)| b.get(k).is_some_and(|w| w.to_bits() == v.to_bits()))
}

impl Clone for Box<dyn Function> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

impl std::fmt::Debug for dyn Function {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&function_to_string(self))
    }
}

/// Full definition string including ties, e.g.
/// `name=Gaussian,Height=1,PeakCentre=0,Sigma=1;name=FlatBackground,A0=0;ties=(f1.A0=f0.Height/10)`.
pub fn function_to_string(function: &dyn Function) -> String {
    let ties: Vec<String> = (0..function.n_params())
        .filter_map(|i| function.get_tie(i).ok().flatten())
        .filter_map(|tie| tie.as_string(function))
        .collect();

    let definition = function.definition();
    if ties.is_empty() {
        definition
    } else {
        let separator = if function.as_composite().is_some() { ";" } else { "," };
        format!("{}{}ties=({})", definition, separator, ties.join(","))
    }
}
