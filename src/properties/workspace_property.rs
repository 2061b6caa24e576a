//! Properties bound to a named entry in the data service.

use super::{Direction, Property};
use crate::data_service::DataService;
use crate::error::{FrameworkError, Result};
use crate::workspace::{try_cast, Workspace, WorkspaceHandle};
use std::any::Any;
use std::sync::Arc;

/// A property whose string value is a workspace name and which also holds the
/// resolved workspace.
///
/// Input and InOut properties resolve the name through the data service
/// during validation; Output and InOut properties push the held workspace
/// back under the bound name when stored.
pub struct WorkspaceProperty<T: Workspace> {
    name: String,
    workspace_name: String,
    direction: Direction,
    data_service: Arc<DataService>,
    workspace: Option<Arc<T>>,
    documentation: String,
}

impl<T: Workspace> WorkspaceProperty<T> {
    /// Create a property from an integer direction code.
    ///
    /// Fails with `InvalidDirection` unless `direction` is 0, 1 or 2.
    pub fn new(
        name: &str,
        workspace_name: &str,
        direction: i32,
        data_service: Arc<DataService>,
    ) -> Result<Self> {
        let direction = Direction::try_from(direction)?;
        Ok(Self::with_direction(name, workspace_name, direction, data_service))
    }

    pub fn with_direction(
        name: &str,
        workspace_name: &str,
        direction: Direction,
        data_service: Arc<DataService>,
    ) -> Self {
        Self {
            name: name.to_string(),
            workspace_name: workspace_name.to_string(),
            direction,
            data_service,
            workspace: None,
            documentation: String::new(),
        }
    }

    pub fn with_documentation(mut self, doc: &str) -> Self {
        self.documentation = doc.to_string();
        self
    }

    /// The held workspace, if resolved or set.
    pub fn workspace(&self) -> Option<Arc<T>> {
        self.workspace.clone()
    }

    /// Hold a workspace directly, skipping the lookup during validation.
    pub fn set_workspace(&mut self, workspace: Arc<T>) {
        self.workspace = Some(workspace);
    }

    /// Drop the held workspace without touching the data service.
    pub fn clear(&mut self) {
        self.workspace = None;
    }

    fn resolve(&self) -> std::result::Result<Arc<T>, String> {
        let handle = self
            .data_service
            .retrieve(&self.workspace_name)
            .map_err(|e| e.to_string())?;
        try_cast::<T>(&handle).ok_or_else(|| {
            format!(
                "Workspace '{}' is not of type {}",
                self.workspace_name,
                std::any::type_name::<T>()
            )
        })
    }
}

impl<T: Workspace> Property for WorkspaceProperty<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn direction(&self) -> Direction {
        self.direction
    }

    fn value(&self) -> String {
        self.workspace_name.clone()
    }

    fn set_value(&mut self, value: &str) -> Result<()> {
        if value.is_empty() {
            return Err(FrameworkError::InvalidProperty {
                name: self.name.clone(),
                message: "workspace name must not be empty".to_string(),
            });
        }
        self.workspace_name = value.to_string();
        self.workspace = None;
        Ok(())
    }

    fn is_valid_message(&mut self) -> Option<String> {
        if self.workspace_name.is_empty() {
            return Some("Enter a name for the workspace".to_string());
        }
        if self.direction.is_input() && self.workspace.is_none() {
            match self.resolve() {
                Ok(workspace) => self.workspace = Some(workspace),
                Err(message) => return Some(message),
            }
        }
        None
    }

    fn is_default(&self) -> bool {
        self.workspace_name.is_empty()
    }

    fn documentation(&self) -> &str {
        &self.documentation
    }

    fn type_name(&self) -> &'static str {
        "Workspace"
    }

    fn store(&mut self) -> Result<bool> {
        if !self.direction.is_output() {
            return Ok(false);
        }
        let workspace = self.workspace.clone().ok_or_else(|| {
            FrameworkError::Runtime(format!(
                "WorkspaceProperty '{}' does not hold a workspace to store",
                self.name
            ))
        })?;
        let handle: WorkspaceHandle = workspace;
        self.data_service
            .add_or_replace(&self.workspace_name, handle)?;
        Ok(true)
    }

    fn is_workspace_property(&self) -> bool {
        true
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
