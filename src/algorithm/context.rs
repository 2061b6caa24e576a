//! What an algorithm sees while it declares properties and while it runs.

use super::{AlgorithmId, AlgorithmManager, CancellationHandle, ManagedAlgorithm};
use crate::config::FrameworkConfig;
use crate::data_service::DataService;
use crate::error::{FrameworkError, Result};
use crate::functions::FunctionFactory;
use crate::properties::{
    Direction, Property, PropertyManager, PropertyValue, PropertyWithValue, WorkspaceProperty,
};
use crate::workspace::Workspace;
use std::sync::Arc;
use tracing::warn;

/// Handed to [`Algorithm::init`](super::Algorithm::init).
pub struct InitContext<'a> {
    pub(crate) properties: &'a mut PropertyManager,
    pub(crate) data_service: &'a Arc<DataService>,
}

impl InitContext<'_> {
    /// Declare any property.
    pub fn declare<P: Property>(&mut self, property: P) -> Result<()> {
        self.properties.declare_property(property)
    }

    /// Declare a plain property with a default value.
    pub fn declare_value<T: PropertyValue>(
        &mut self,
        name: &str,
        default: T,
        direction: Direction,
    ) -> Result<()> {
        self.declare(PropertyWithValue::new(name, default, direction))
    }

    /// Declare a workspace property bound to the algorithm's data service.
    /// The workspace name starts out empty.
    pub fn declare_workspace<T: Workspace>(
        &mut self,
        name: &str,
        direction: Direction,
        documentation: &str,
    ) -> Result<()> {
        let property =
            WorkspaceProperty::<T>::with_direction(name, "", direction, Arc::clone(self.data_service))
                .with_documentation(documentation);
        self.declare(property)
    }

    pub fn data_service(&self) -> &Arc<DataService> {
        self.data_service
    }
}

/// Handed to [`Algorithm::exec`](super::Algorithm::exec).
pub struct ExecutionContext<'a> {
    pub(crate) id: AlgorithmId,
    pub(crate) properties: &'a mut PropertyManager,
    pub(crate) manager: &'a Arc<AlgorithmManager>,
    pub(crate) cancellation: &'a CancellationHandle,
}

impl ExecutionContext<'_> {
    /// Identity of the running algorithm.
    pub fn algorithm_id(&self) -> AlgorithmId {
        self.id
    }

    pub fn get_value<T: PropertyValue>(&self, name: &str) -> Result<T> {
        self.properties.get_value(name)
    }

    pub fn set_value<T: PropertyValue>(&mut self, name: &str, value: T) -> Result<()> {
        self.properties.set_value(name, value)
    }

    pub fn get_property_value(&self, name: &str) -> Result<String> {
        self.properties.get_property_value(name)
    }

    /// The workspace held by a workspace property. Input properties hold
    /// their workspace once validation has resolved it.
    pub fn get_workspace<T: Workspace>(&self, name: &str) -> Result<Arc<T>> {
        self.properties.get_workspace(name)
    }

    /// Hand a result to an output workspace property.
    pub fn set_workspace<T: Workspace>(&mut self, name: &str, workspace: Arc<T>) -> Result<()> {
        self.properties.set_workspace(name, workspace)
    }

    /// Store one workspace property in the data service now, for algorithms
    /// with more than one output.
    pub fn store_output(&mut self, name: &str) -> Result<bool> {
        self.properties.get_property_mut(name)?.store()
    }

    /// Create, mark and initialize a child algorithm.
    ///
    /// A child whose initialization fails is still returned; the failure is
    /// logged and the child's later `execute` fails because it is not
    /// initialized.
    pub fn create_child_algorithm(
        &self,
        name: &str,
        version: Option<u32>,
    ) -> Result<ManagedAlgorithm> {
        let mut child = self.manager.create_child(self.id, name, version)?;
        child.share_cancellation(self.cancellation.clone());
        if let Err(err) = child.initialize() {
            warn!(parent = %self.id, child = name, %err, "child algorithm failed to initialize");
        }
        Ok(child)
    }

    pub fn data_service(&self) -> &Arc<DataService> {
        self.manager.data_service()
    }

    pub fn config(&self) -> &FrameworkConfig {
        self.manager.config()
    }

    pub fn function_factory(&self) -> &FunctionFactory {
        self.manager.function_factory()
    }

    /// Fail with `Cancelled` if cancellation was requested.
    pub fn interruption_point(&self) -> Result<()> {
        if self.cancellation.is_cancelled() {
            return Err(FrameworkError::Cancelled(self.id.to_string()));
        }
        Ok(())
    }
}
