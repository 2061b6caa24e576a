use crate::algorithm::{Algorithm, ExecutionContext, InitContext};
use crate::error::{FrameworkError, Result};
use crate::properties::{BoundedValidator, Direction, MandatoryValidator, PropertyWithValue};
use crate::workspace::Workspace2D;
use ndarray::Array2;
use std::sync::Arc;

/// Builds a workspace from flat X, Y and E lists split into `NSpec` spectra.
///
/// `DataX` must have as many values as `DataY`. An empty `DataE` gives zero
/// errors.
#[derive(Debug, Default)]
pub struct CreateWorkspace;

fn to_spectra(name: &str, values: Vec<f64>, n_spec: usize, n_bins: usize) -> Result<Array2<f64>> {
    Array2::from_shape_vec((n_spec, n_bins), values).map_err(|e| {
        FrameworkError::InvalidArgument(format!(
            "{} cannot be split into {} spectra of {} points: {}",
            name, n_spec, n_bins, e
        ))
    })
}

impl Algorithm for CreateWorkspace {
    fn name(&self) -> &str {
        "CreateWorkspace"
    }

    fn category(&self) -> &str {
        "Utility\\Workspaces"
    }

    fn summary(&self) -> &str {
        "Creates a 2D workspace from lists of X, Y and E values."
    }

    fn init(&mut self, ctx: &mut InitContext<'_>) -> Result<()> {
        ctx.declare_workspace::<Workspace2D>(
            "OutputWorkspace",
            Direction::Output,
            "Name of the new workspace",
        )?;
        ctx.declare(
            PropertyWithValue::new("DataX", Vec::<f64>::new(), Direction::Input)
                .with_validator(MandatoryValidator),
        )?;
        ctx.declare(
            PropertyWithValue::new("DataY", Vec::<f64>::new(), Direction::Input)
                .with_validator(MandatoryValidator),
        )?;
        ctx.declare_value("DataE", Vec::<f64>::new(), Direction::Input)?;
        ctx.declare(
            PropertyWithValue::new("NSpec", 1usize, Direction::Input)
                .with_validator(BoundedValidator::lower(1usize))
                .with_documentation("Number of spectra to split the data into"),
        )?;
        Ok(())
    }

    fn exec(&mut self, ctx: &mut ExecutionContext<'_>) -> Result<()> {
        let data_x: Vec<f64> = ctx.get_value("DataX")?;
        let data_y: Vec<f64> = ctx.get_value("DataY")?;
        let mut data_e: Vec<f64> = ctx.get_value("DataE")?;
        let n_spec: usize = ctx.get_value("NSpec")?;

        if data_y.len() % n_spec != 0 {
            return Err(FrameworkError::InvalidArgument(format!(
                "DataY has {} values, not a multiple of NSpec = {}",
                data_y.len(),
                n_spec
            )));
        }
        if data_x.len() != data_y.len() {
            return Err(FrameworkError::InvalidArgument(format!(
                "DataX has {} values but DataY has {}",
                data_x.len(),
                data_y.len()
            )));
        }
        if data_e.is_empty() {
            data_e = vec![0.0; data_y.len()];
        }

        let n_bins = data_y.len() / n_spec;
        let workspace = Workspace2D::from_arrays(
            to_spectra("DataX", data_x, n_spec, n_bins)?,
            to_spectra("DataY", data_y, n_spec, n_bins)?,
            to_spectra("DataE", data_e, n_spec, n_bins)?,
        )?;
        ctx.set_workspace("OutputWorkspace", Arc::new(workspace))
    }
}
