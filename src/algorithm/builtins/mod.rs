//! Algorithms registered by [`AlgorithmFactory::with_builtins`](super::AlgorithmFactory::with_builtins).
//!
//! - `CreateWorkspace`: build a [`Workspace2D`](crate::workspace::Workspace2D) from number lists
//! - `Scale`: multiply by or add a constant, spectrum by spectrum
//! - `NormaliseToMax`: divide by the largest Y value through a child `Scale`
//! - `EvaluateFunction`: evaluate a function definition on every spectrum's X

mod create_workspace;
mod evaluate_function;
mod normalise_to_max;
mod scale;

pub use create_workspace::CreateWorkspace;
pub use evaluate_function::EvaluateFunction;
pub use normalise_to_max::NormaliseToMax;
pub use scale::Scale;
