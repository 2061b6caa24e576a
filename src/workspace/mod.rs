//! # Workspaces
//!
//! Workspaces are the reference-counted datasets that algorithms read and
//! produce. They are shared as [`WorkspaceHandle`]s (`Arc<dyn Workspace>`):
//! the data service, workspace properties and running algorithms may all
//! hold the same object, and it is dropped with the last handle.
//!
//! A handle is recovered as a concrete type with [`try_cast`], which returns
//! `None` on a type mismatch instead of failing.

use std::any::Any;
use std::sync::Arc;

mod table;
mod workspace2d;

pub use table::TableWorkspace;
pub use workspace2d::Workspace2D;

/// A dataset that can be stored in the data service.
pub trait Workspace: Any + Send + Sync {
    /// The kind of workspace, e.g. `"Workspace2D"`.
    fn id(&self) -> &'static str;

    /// Approximate size of the data held, in bytes.
    fn memory_size(&self) -> usize;

    /// Convert the shared handle into `Any` for down-casting.
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

/// Shared handle to a workspace of any kind.
pub type WorkspaceHandle = Arc<dyn Workspace>;

/// Down-cast a handle to a concrete workspace type.
///
/// The returned `Arc` shares ownership with `handle`.
pub fn try_cast<T: Workspace>(handle: &WorkspaceHandle) -> Option<Arc<T>> {
    Arc::clone(handle).into_any().downcast::<T>().ok()
}
