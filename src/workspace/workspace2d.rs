//! Histogram workspace.

use super::Workspace;
use crate::error::{FrameworkError, Result};
use ndarray::{s, Array1, Array2, ArrayView1, ArrayViewMut1, Zip};
use std::any::Any;
use std::sync::Arc;

/// A two-dimensional workspace holding `n_histograms` spectra of equal
/// length, each with X, Y and E (error) values.
#[derive(Debug, Clone, PartialEq)]
pub struct Workspace2D {
    x: Array2<f64>,
    y: Array2<f64>,
    e: Array2<f64>,
}

impl Workspace2D {
    /// Create a zero-filled workspace with `n_histograms` spectra of `n_bins` points.
    pub fn new(n_histograms: usize, n_bins: usize) -> Self {
        Self {
            x: Array2::zeros((n_histograms, n_bins)),
            y: Array2::zeros((n_histograms, n_bins)),
            e: Array2::zeros((n_histograms, n_bins)),
        }
    }

    /// Create a workspace from X, Y and E arrays of identical shape.
    pub fn from_arrays(x: Array2<f64>, y: Array2<f64>, e: Array2<f64>) -> Result<Self> {
        if x.dim() != y.dim() || y.dim() != e.dim() {
            return Err(FrameworkError::InvalidArgument(format!(
                "X {:?}, Y {:?} and E {:?} must have the same shape",
                x.dim(),
                y.dim(),
                e.dim()
            )));
        }
        Ok(Self { x, y, e })
    }

    /// Number of spectra.
    pub fn n_histograms(&self) -> usize {
        self.y.nrows()
    }

    /// Number of points per spectrum.
    pub fn blocksize(&self) -> usize {
        self.y.ncols()
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index >= self.n_histograms() {
            return Err(FrameworkError::OutOfRange(format!(
                "spectrum {} of {}",
                index,
                self.n_histograms()
            )));
        }
        Ok(())
    }

    pub fn read_x(&self, index: usize) -> Result<ArrayView1<'_, f64>> {
        self.check_index(index)?;
        Ok(self.x.row(index))
    }

    pub fn read_y(&self, index: usize) -> Result<ArrayView1<'_, f64>> {
        self.check_index(index)?;
        Ok(self.y.row(index))
    }

    pub fn read_e(&self, index: usize) -> Result<ArrayView1<'_, f64>> {
        self.check_index(index)?;
        Ok(self.e.row(index))
    }

    /// Replace one spectrum.
    pub fn set_spectrum(
        &mut self,
        index: usize,
        x: &Array1<f64>,
        y: &Array1<f64>,
        e: &Array1<f64>,
    ) -> Result<()> {
        self.check_index(index)?;
        let n = self.blocksize();
        if x.len() != n || y.len() != n || e.len() != n {
            return Err(FrameworkError::InvalidArgument(format!(
                "spectrum {} needs {} points",
                index, n
            )));
        }
        self.x.slice_mut(s![index, ..]).assign(x);
        self.y.slice_mut(s![index, ..]).assign(y);
        self.e.slice_mut(s![index, ..]).assign(e);
        Ok(())
    }

    pub fn x(&self) -> &Array2<f64> {
        &self.x
    }

    pub fn y(&self) -> &Array2<f64> {
        &self.y
    }

    pub fn e(&self) -> &Array2<f64> {
        &self.e
    }

    /// Build a new workspace by transforming every spectrum's Y and E.
    ///
    /// Each call of `f` receives `(x, y, e)` of one spectrum and writes the
    /// new Y and E in place. Spectra are disjoint, so when there are at least
    /// `parallel_threshold` of them the work is spread over the rayon pool.
    pub fn map_spectra<F>(&self, parallel_threshold: usize, f: F) -> Self
    where
        F: Fn(ArrayView1<'_, f64>, &mut [f64], &mut [f64]) + Send + Sync,
    {
        let mut out = self.clone();
        let zip = Zip::from(self.x.rows())
            .and(out.y.rows_mut())
            .and(out.e.rows_mut());

        let apply = |x: ArrayView1<'_, f64>, mut y: ArrayViewMut1<'_, f64>, mut e: ArrayViewMut1<'_, f64>| {
            let mut y_buf = y.to_vec();
            let mut e_buf = e.to_vec();
            f(x, &mut y_buf, &mut e_buf);
            y.assign(&Array1::from(y_buf));
            e.assign(&Array1::from(e_buf));
        };

        if self.n_histograms() >= parallel_threshold {
            zip.par_for_each(apply);
        } else {
            zip.for_each(apply);
        }
        out
    }

    /// Largest Y value across all spectra, `None` for an empty workspace.
    pub fn max_y(&self) -> Option<f64> {
        self.y.iter().copied().reduce(f64::max)
    }
}

impl Workspace for Workspace2D {
    fn id(&self) -> &'static str {
        "Workspace2D"
    }

    fn memory_size(&self) -> usize {
        3 * self.y.len() * std::mem::size_of::<f64>()
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}
