//! Built-in peak and background functions.
//!
//! Parameter names follow the usual conventions of neutron and X-ray data
//! reduction so that definition strings are portable between tools.

use super::{LeafFunction, ParameterStore};
use ndarray::{Array1, Array2};

fn store_with(params: &[(&str, f64)]) -> ParameterStore {
    let mut store = ParameterStore::new();
    for (name, value) in params {
        // Names here are fixed literals, unique and without dots.
        let _ = store.declare(name, *value);
    }
    store
}

/// A Gaussian peak.
///
/// f(x) = Height * exp(-(x - PeakCentre)² / (2 * Sigma²))
#[derive(Debug, Clone)]
pub struct Gaussian {
    store: ParameterStore,
}

impl Gaussian {
    pub fn new(height: f64, centre: f64, sigma: f64) -> Self {
        Self {
            store: store_with(&[("Height", height), ("PeakCentre", centre), ("Sigma", sigma)]),
        }
    }
}

impl Default for Gaussian {
    fn default() -> Self {
        Self::new(0.0, 0.0, 1.0)
    }
}

impl LeafFunction for Gaussian {
    const NAME: &'static str = "Gaussian";

    fn store(&self) -> &ParameterStore {
        &self.store
    }

    fn store_mut(&mut self) -> &mut ParameterStore {
        &mut self.store
    }

    fn evaluate(&self, x: &Array1<f64>) -> Array1<f64> {
        let p = self.store.values();
        let (height, centre, sigma) = (p[0], p[1], p[2]);
        x.mapv(|xv| {
            let arg = (xv - centre) / sigma;
            height * (-0.5 * arg * arg).exp()
        })
    }

    fn derivatives(&self, x: &Array1<f64>) -> Option<Array2<f64>> {
        let p = self.store.values();
        let (height, centre, sigma) = (p[0], p[1], p[2]);
        let mut jac = Array2::zeros((x.len(), self.store.len()));

        for (i, &xv) in x.iter().enumerate() {
            let arg = (xv - centre) / sigma;
            let e = (-0.5 * arg * arg).exp();
            jac[[i, 0]] = e;
            jac[[i, 1]] = height * e * arg / sigma;
            jac[[i, 2]] = height * e * arg * arg / sigma;
        }
        Some(jac)
    }
}

/// A Lorentzian peak with integrated intensity `Amplitude`.
///
/// f(x) = Amplitude / π * (FWHM / 2) / ((x - PeakCentre)² + (FWHM / 2)²)
#[derive(Debug, Clone)]
pub struct Lorentzian {
    store: ParameterStore,
}

impl Lorentzian {
    pub fn new(amplitude: f64, centre: f64, fwhm: f64) -> Self {
        Self {
            store: store_with(&[("Amplitude", amplitude), ("PeakCentre", centre), ("FWHM", fwhm)]),
        }
    }
}

impl Default for Lorentzian {
    fn default() -> Self {
        Self::new(1.0, 0.0, 1.0)
    }
}

impl LeafFunction for Lorentzian {
    const NAME: &'static str = "Lorentzian";

    fn store(&self) -> &ParameterStore {
        &self.store
    }

    fn store_mut(&mut self) -> &mut ParameterStore {
        &mut self.store
    }

    fn evaluate(&self, x: &Array1<f64>) -> Array1<f64> {
        let p = self.store.values();
        let (amplitude, centre, half) = (p[0], p[1], p[2] / 2.0);
        x.mapv(|xv| {
            let d = xv - centre;
            amplitude / std::f64::consts::PI * half / (d * d + half * half)
        })
    }
}

/// A straight line, A0 + A1 * x.
#[derive(Debug, Clone)]
pub struct LinearBackground {
    store: ParameterStore,
}

impl LinearBackground {
    pub fn new(a0: f64, a1: f64) -> Self {
        Self {
            store: store_with(&[("A0", a0), ("A1", a1)]),
        }
    }
}

impl Default for LinearBackground {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

impl LeafFunction for LinearBackground {
    const NAME: &'static str = "LinearBackground";

    fn store(&self) -> &ParameterStore {
        &self.store
    }

    fn store_mut(&mut self) -> &mut ParameterStore {
        &mut self.store
    }

    fn evaluate(&self, x: &Array1<f64>) -> Array1<f64> {
        let p = self.store.values();
        x.mapv(|xv| p[0] + p[1] * xv)
    }

    fn derivatives(&self, x: &Array1<f64>) -> Option<Array2<f64>> {
        let mut jac = Array2::zeros((x.len(), self.store.len()));
        jac.column_mut(0).fill(1.0);
        jac.column_mut(1).assign(x);
        Some(jac)
    }
}

/// A constant, A0.
#[derive(Debug, Clone)]
pub struct FlatBackground {
    store: ParameterStore,
}

impl FlatBackground {
    pub fn new(a0: f64) -> Self {
        Self {
            store: store_with(&[("A0", a0)]),
        }
    }
}

impl Default for FlatBackground {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl LeafFunction for FlatBackground {
    const NAME: &'static str = "FlatBackground";

    fn store(&self) -> &ParameterStore {
        &self.store
    }

    fn store_mut(&mut self) -> &mut ParameterStore {
        &mut self.store
    }

    fn evaluate(&self, x: &Array1<f64>) -> Array1<f64> {
        Array1::from_elem(x.len(), self.store.values()[0])
    }

    fn derivatives(&self, x: &Array1<f64>) -> Option<Array2<f64>> {
        Some(Array2::ones((x.len(), self.store.len())))
    }
}

/// Exponential decay, Height * exp(-x / Lifetime).
#[derive(Debug, Clone)]
pub struct ExpDecay {
    store: ParameterStore,
}

impl ExpDecay {
    pub fn new(height: f64, lifetime: f64) -> Self {
        Self {
            store: store_with(&[("Height", height), ("Lifetime", lifetime)]),
        }
    }
}

impl Default for ExpDecay {
    fn default() -> Self {
        Self::new(1.0, 1.0)
    }
}

impl LeafFunction for ExpDecay {
    const NAME: &'static str = "ExpDecay";

    fn store(&self) -> &ParameterStore {
        &self.store
    }

    fn store_mut(&mut self) -> &mut ParameterStore {
        &mut self.store
    }

    fn evaluate(&self, x: &Array1<f64>) -> Array1<f64> {
        let p = self.store.values();
        x.mapv(|xv| p[0] * (-xv / p[1]).exp())
    }
}
