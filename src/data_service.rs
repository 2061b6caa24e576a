//! Named workspace registry.
//!
//! The [`DataService`] maps case-sensitive, non-empty names to shared
//! workspace handles. It is normally injected as an `Arc<DataService>` into
//! the algorithm manager and the workspace properties it creates;
//! [`DataService::instance`] returns the process-wide service for callers
//! that want one shared registry.
//!
//! Every operation takes the internal lock exactly once, so a reader never
//! sees a half-applied update and concurrent `add_or_replace` calls on the
//! same name resolve to whichever writer took the lock last.

use crate::error::{FrameworkError, Result};
use crate::workspace::{try_cast, Workspace, WorkspaceHandle};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use tracing::debug;

static INSTANCE: OnceLock<Arc<DataService>> = OnceLock::new();

/// Registry of named workspaces.
#[derive(Default)]
pub struct DataService {
    entries: RwLock<HashMap<String, WorkspaceHandle>>,
}

impl std::fmt::Debug for DataService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataService")
            .field("names", &self.names())
            .finish()
    }
}

fn check_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(FrameworkError::InvalidArgument(
            "workspace names must not be empty".to_string(),
        ));
    }
    Ok(())
}

impl DataService {
    /// Create an empty, independent registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry.
    pub fn instance() -> Arc<DataService> {
        Arc::clone(INSTANCE.get_or_init(|| Arc::new(DataService::new())))
    }

    /// Insert a workspace under a new name.
    ///
    /// Fails with `DuplicateName` if the name is already taken.
    pub fn add(&self, name: &str, workspace: WorkspaceHandle) -> Result<()> {
        check_name(name)?;
        let mut entries = self.entries.write();
        if entries.contains_key(name) {
            return Err(FrameworkError::DuplicateName(name.to_string()));
        }
        debug!(name, kind = workspace.id(), "adding workspace");
        entries.insert(name.to_string(), workspace);
        Ok(())
    }

    /// Insert a workspace, replacing and releasing any previous entry.
    pub fn add_or_replace(&self, name: &str, workspace: WorkspaceHandle) -> Result<()> {
        check_name(name)?;
        debug!(name, kind = workspace.id(), "adding or replacing workspace");
        let previous = self.entries.write().insert(name.to_string(), workspace);
        // Released outside the lock.
        drop(previous);
        Ok(())
    }

    /// Get a shared handle to a workspace.
    pub fn retrieve(&self, name: &str) -> Result<WorkspaceHandle> {
        self.entries
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| FrameworkError::NotFound(format!("workspace '{}'", name)))
    }

    /// Get a workspace as a concrete type.
    ///
    /// Fails with `NotFound` when absent and `TypeMismatch` when the stored
    /// workspace is of another kind.
    pub fn retrieve_as<T: Workspace>(&self, name: &str) -> Result<Arc<T>> {
        let handle = self.retrieve(name)?;
        try_cast::<T>(&handle).ok_or_else(|| FrameworkError::TypeMismatch {
            name: name.to_string(),
            expected: std::any::type_name::<T>().to_string(),
        })
    }

    /// Remove an entry and return it.
    ///
    /// Fails with `NotFound` if there is no such name.
    pub fn remove(&self, name: &str) -> Result<WorkspaceHandle> {
        let removed = self
            .entries
            .write()
            .remove(name)
            .ok_or_else(|| FrameworkError::NotFound(format!("workspace '{}'", name)))?;
        debug!(name, "removed workspace");
        Ok(removed)
    }

    /// Move an entry to a new name.
    pub fn rename(&self, old_name: &str, new_name: &str) -> Result<()> {
        check_name(new_name)?;
        let mut entries = self.entries.write();
        if entries.contains_key(new_name) {
            return Err(FrameworkError::DuplicateName(new_name.to_string()));
        }
        let workspace = entries
            .remove(old_name)
            .ok_or_else(|| FrameworkError::NotFound(format!("workspace '{}'", old_name)))?;
        entries.insert(new_name.to_string(), workspace);
        debug!(old_name, new_name, "renamed workspace");
        Ok(())
    }

    pub fn does_exist(&self, name: &str) -> bool {
        self.entries.read().contains_key(name)
    }

    /// All names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Drop every entry.
    pub fn clear(&self) {
        let old = std::mem::take(&mut *self.entries.write());
        debug!(count = old.len(), "cleared data service");
    }
}
