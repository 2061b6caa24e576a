use crate::algorithm::{Algorithm, ExecutionContext, InitContext};
use crate::error::Result;
use crate::properties::{Direction, MandatoryValidator, PropertyWithValue};
use crate::workspace::Workspace2D;
use ndarray::{Array1, Array2};
use rayon::prelude::*;
use std::sync::Arc;

/// Evaluates a function definition (see
/// [`FunctionFactory`](crate::functions::FunctionFactory)) on the X values of
/// every spectrum. The output has the input's X, the model as Y and zero E.
///
/// With at least `parallel_threshold` spectra the evaluation runs on the
/// rayon pool and cancellation is only checked before it starts.
#[derive(Debug, Default)]
pub struct EvaluateFunction;

impl Algorithm for EvaluateFunction {
    fn name(&self) -> &str {
        "EvaluateFunction"
    }

    fn category(&self) -> &str {
        "Optimization"
    }

    fn summary(&self) -> &str {
        "Calculates the values of a function on the X values of a workspace."
    }

    fn init(&mut self, ctx: &mut InitContext<'_>) -> Result<()> {
        ctx.declare(
            PropertyWithValue::new("Function", String::new(), Direction::Input)
                .with_validator(MandatoryValidator)
                .with_documentation("Definition string, e.g. name=Gaussian,Height=1,PeakCentre=0,Sigma=1"),
        )?;
        ctx.declare_workspace::<Workspace2D>("InputWorkspace", Direction::Input, "")?;
        ctx.declare_workspace::<Workspace2D>("OutputWorkspace", Direction::Output, "")?;
        Ok(())
    }

    fn exec(&mut self, ctx: &mut ExecutionContext<'_>) -> Result<()> {
        let definition: String = ctx.get_value("Function")?;
        let function = ctx.function_factory().create_function(&definition)?;
        let input = ctx.get_workspace::<Workspace2D>("InputWorkspace")?;

        let evaluate = |i: usize| -> Result<Array1<f64>> {
            function.function(&input.read_x(i)?.to_owned())
        };
        let n = input.n_histograms();
        let rows: Vec<Array1<f64>> = if n >= ctx.config().parallel_threshold {
            ctx.interruption_point()?;
            (0..n).into_par_iter().map(&evaluate).collect::<Result<_>>()?
        } else {
            (0..n)
                .map(|i| {
                    ctx.interruption_point()?;
                    evaluate(i)
                })
                .collect::<Result<_>>()?
        };

        let mut y = Array2::<f64>::zeros(input.y().dim());
        for (mut target, row) in y.rows_mut().into_iter().zip(&rows) {
            target.assign(row);
        }
        let e = Array2::<f64>::zeros(y.dim());
        let output = Workspace2D::from_arrays(input.x().clone(), y, e)?;
        ctx.set_workspace("OutputWorkspace", Arc::new(output))
    }
}
