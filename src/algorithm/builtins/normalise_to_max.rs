use crate::algorithm::{Algorithm, ExecutionContext, InitContext};
use crate::error::{FrameworkError, Result};
use crate::properties::Direction;
use crate::workspace::Workspace2D;

/// Divides a workspace by its largest Y value by running `Scale` as a child
/// algorithm.
#[derive(Debug, Default)]
pub struct NormaliseToMax;

impl Algorithm for NormaliseToMax {
    fn name(&self) -> &str {
        "NormaliseToMax"
    }

    fn category(&self) -> &str {
        "Arithmetic"
    }

    fn summary(&self) -> &str {
        "Normalises a workspace so that its largest value is 1."
    }

    fn init(&mut self, ctx: &mut InitContext<'_>) -> Result<()> {
        ctx.declare_workspace::<Workspace2D>("InputWorkspace", Direction::Input, "")?;
        ctx.declare_workspace::<Workspace2D>("OutputWorkspace", Direction::Output, "")?;
        Ok(())
    }

    fn exec(&mut self, ctx: &mut ExecutionContext<'_>) -> Result<()> {
        let input = ctx.get_workspace::<Workspace2D>("InputWorkspace")?;
        let max = input
            .max_y()
            .ok_or_else(|| FrameworkError::Runtime("input workspace is empty".to_string()))?;
        if max == 0.0 {
            return Err(FrameworkError::Runtime(
                "cannot normalise a workspace whose maximum is zero".to_string(),
            ));
        }

        let mut scale = ctx.create_child_algorithm("Scale", None)?;
        scale.set_property_value("InputWorkspace", &ctx.get_property_value("InputWorkspace")?)?;
        scale.set_workspace("InputWorkspace", input)?;
        scale.set_property_value("OutputWorkspace", &ctx.get_property_value("OutputWorkspace")?)?;
        scale.set_value("Factor", 1.0 / max)?;
        if !scale.execute()? {
            return Err(FrameworkError::Runtime("child Scale failed".to_string()));
        }

        let output = scale.get_workspace::<Workspace2D>("OutputWorkspace")?;
        ctx.set_workspace("OutputWorkspace", output)
    }
}
