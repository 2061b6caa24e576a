//! # Algorithms
//!
//! Named, versioned units of work run against workspaces in a
//! [`DataService`](crate::data_service::DataService).
//!
//! An [`Algorithm`] only supplies two hooks: `init` declares its properties
//! and `exec` does the work. The surrounding [`ManagedAlgorithm`] owns the
//! property manager and runs the life cycle:
//!
//! ```text
//! Constructed --initialize()--> Initialized --execute()--> Executed
//!      |                            |                         |
//!      +--------------------------> Failed <------------------+
//! ```
//!
//! `initialize` is idempotent. `execute` validates every property, runs
//! `exec`, and for a top-level algorithm stores the first output workspace
//! property in the data service. Algorithms are created by name through the
//! [`AlgorithmManager`], which also records parent/child relations of child
//! algorithms created while a parent runs.
//!
//! ## Example Usage
//!
//! ```rust
//! use datareduce_rs::algorithm::AlgorithmManager;
//! use datareduce_rs::data_service::DataService;
//! use datareduce_rs::workspace::Workspace2D;
//! use std::sync::Arc;
//!
//! let service = Arc::new(DataService::new());
//! let manager = AlgorithmManager::new(Arc::clone(&service));
//!
//! let mut create = manager.create("CreateWorkspace", None).unwrap();
//! create
//!     .set_properties("OutputWorkspace=raw;DataX=0,1,2;DataY=2,4,8")
//!     .unwrap();
//! create.execute().unwrap();
//!
//! let mut scale = manager.create("Scale", None).unwrap();
//! scale
//!     .set_properties("InputWorkspace=raw;OutputWorkspace=scaled;Factor=0.5")
//!     .unwrap();
//! scale.execute().unwrap();
//!
//! let scaled = service.retrieve_as::<Workspace2D>("scaled").unwrap();
//! assert_eq!(scaled.read_y(0).unwrap().to_vec(), vec![1.0, 2.0, 4.0]);
//! ```

pub mod builtins;
mod context;
mod factory;
mod managed;
mod manager;

use crate::error::Result;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

pub use context::{ExecutionContext, InitContext};
pub use factory::AlgorithmFactory;
pub use managed::ManagedAlgorithm;
pub use manager::{AlgorithmManager, AlgorithmRecord};

/// A unit of work with declared properties.
pub trait Algorithm: Send {
    fn name(&self) -> &str;

    fn version(&self) -> u32 {
        1
    }

    fn category(&self) -> &str {
        "General"
    }

    /// One-line description.
    fn summary(&self) -> &str {
        ""
    }

    /// Declare the algorithm's properties.
    fn init(&mut self, ctx: &mut InitContext<'_>) -> Result<()>;

    /// Run the computation. Property values are valid when this is called.
    fn exec(&mut self, ctx: &mut ExecutionContext<'_>) -> Result<()>;
}

static NEXT_ALGORITHM_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of one algorithm instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AlgorithmId(u64);

impl AlgorithmId {
    pub(crate) fn next() -> Self {
        AlgorithmId(NEXT_ALGORITHM_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for AlgorithmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Life-cycle state of a [`ManagedAlgorithm`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlgorithmState {
    Constructed,
    Initialized,
    Executed,
    Failed,
}

/// Shared flag that asks a running algorithm to stop at its next
/// interruption point.
///
/// Child algorithms share the flag of the parent that created them.
#[derive(Debug, Clone, Default)]
pub struct CancellationHandle(Arc<AtomicBool>);

impl CancellationHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub(crate) fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
