//! # datareduce-rs
//!
//! `datareduce-rs` is the orchestration core of a scientific data-reduction
//! framework: named, versioned algorithms run against shared,
//! reference-counted workspaces, plus a composite-function engine that
//! assembles peak and background models into one fittable function.
//!
//! The library provides:
//! - A [`DataService`] registry of named workspaces
//! - A property system whose workspace properties resolve names through that
//!   registry
//! - An algorithm life cycle with child algorithms and automatic output
//!   storage, driven through an [`AlgorithmManager`]
//! - Composite functions with index translation, fixed parameters and ties
//!
//! ## Basic Usage
//!
//! ```
//! use datareduce_rs::{AlgorithmManager, DataService, Workspace2D};
//! use std::sync::Arc;
//!
//! let service = Arc::new(DataService::new());
//! let manager = AlgorithmManager::new(Arc::clone(&service));
//!
//! let mut create = manager.create("CreateWorkspace", None).unwrap();
//! create
//!     .set_properties("OutputWorkspace=peak;DataX=-1,0,1;DataY=1,4,2")
//!     .unwrap();
//! create.execute().unwrap();
//!
//! let mut normalise = manager.create("NormaliseToMax", None).unwrap();
//! normalise
//!     .set_properties("InputWorkspace=peak;OutputWorkspace=normalised")
//!     .unwrap();
//! normalise.execute().unwrap();
//!
//! let normalised = service.retrieve_as::<Workspace2D>("normalised").unwrap();
//! assert_eq!(normalised.read_y(0).unwrap().to_vec(), vec![0.25, 1.0, 0.5]);
//! ```

// Public modules
pub mod error;
pub mod config;
pub mod logging;

// Data layer
pub mod data_service;
pub mod workspace;

// Properties and algorithms
pub mod algorithm;
pub mod properties;

// Function engine
pub mod expression;
pub mod functions;

// Re-exports for convenience
pub use algorithm::{Algorithm, AlgorithmManager, ManagedAlgorithm};
pub use config::FrameworkConfig;
pub use data_service::DataService;
pub use error::{FrameworkError, Result};
pub use functions::{CompositeFunction, Function, FunctionFactory};
pub use workspace::{try_cast, TableWorkspace, Workspace, Workspace2D, WorkspaceHandle};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
