//! Finite difference derivatives for functions without analytic ones.

use super::Function;
use crate::error::Result;
use ndarray::{Array1, Array2};

/// Default relative step for forward differences.
pub const DEFAULT_STEP: f64 = 1e-8;

/// Compute the Jacobian over the active parameters with forward differences.
///
/// Column `j` holds ∂f(x_i)/∂p_j where `p_j` is the `j`-th active parameter.
/// The step is scaled by the parameter's magnitude when that exceeds `step`.
/// Ties are re-applied after every step, so a tied parameter's dependence on
/// active ones shows up in their columns.
pub fn numeric_derivative(
    function: &dyn Function,
    x: &Array1<f64>,
    step: f64,
) -> Result<Array2<f64>> {
    let n_active = function.n_active();
    let tied = function.n_ties() > 0;
    let mut jac = Array2::zeros((x.len(), n_active));

    let mut probe = function.clone_box();
    if tied {
        probe.apply_ties()?;
    }
    let base = probe.function(x)?;

    for j in 0..n_active {
        let value = probe.active_parameter(j)?;
        let h = if value.abs() > step {
            value.abs() * step
        } else {
            step
        };

        probe.set_active_parameter(j, value + h)?;
        if tied {
            probe.apply_ties()?;
        }
        let shifted = probe.function(x)?;
        probe.set_active_parameter(j, value)?;
        if tied {
            probe.apply_ties()?;
        }

        let column = (shifted - &base) / h;
        jac.column_mut(j).assign(&column);
    }

    Ok(jac)
}
