use crate::algorithm::{Algorithm, ExecutionContext, InitContext};
use crate::error::Result;
use crate::properties::{Direction, ListValidator, PropertyWithValue};
use crate::workspace::Workspace2D;
use std::sync::Arc;

/// Multiplies every Y value by `Factor`, or adds `Factor` to it.
///
/// Multiplication scales E by `|Factor|`; addition leaves E unchanged.
/// Spectra are processed on the rayon pool once there are at least
/// `parallel_threshold` of them.
#[derive(Debug, Default)]
pub struct Scale;

impl Algorithm for Scale {
    fn name(&self) -> &str {
        "Scale"
    }

    fn category(&self) -> &str {
        "Arithmetic"
    }

    fn summary(&self) -> &str {
        "Scales a workspace by a constant factor or offsets it by a constant."
    }

    fn init(&mut self, ctx: &mut InitContext<'_>) -> Result<()> {
        ctx.declare_workspace::<Workspace2D>("InputWorkspace", Direction::Input, "")?;
        ctx.declare_workspace::<Workspace2D>("OutputWorkspace", Direction::Output, "")?;
        ctx.declare_value("Factor", 1.0_f64, Direction::Input)?;
        ctx.declare(
            PropertyWithValue::new("Operation", "Multiply".to_string(), Direction::Input)
                .with_validator(ListValidator::new(["Multiply", "Add"])),
        )?;
        Ok(())
    }

    fn exec(&mut self, ctx: &mut ExecutionContext<'_>) -> Result<()> {
        let input = ctx.get_workspace::<Workspace2D>("InputWorkspace")?;
        let factor: f64 = ctx.get_value("Factor")?;
        let multiply = ctx.get_value::<String>("Operation")? == "Multiply";
        ctx.interruption_point()?;

        let output = input.map_spectra(ctx.config().parallel_threshold, |_, y, e| {
            if multiply {
                y.iter_mut().for_each(|v| *v *= factor);
                e.iter_mut().for_each(|v| *v *= factor.abs());
            } else {
                y.iter_mut().for_each(|v| *v += factor);
            }
        });
        ctx.set_workspace("OutputWorkspace", Arc::new(output))
    }
}
