//! The algorithm life cycle.

use super::context::{ExecutionContext, InitContext};
use super::{Algorithm, AlgorithmId, AlgorithmManager, AlgorithmState, CancellationHandle};
use crate::error::{FrameworkError, Result};
use crate::properties::{Direction, PropertyManager, PropertyValue};
use crate::workspace::Workspace;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

/// An [`Algorithm`] together with its properties and life-cycle state.
pub struct ManagedAlgorithm {
    id: AlgorithmId,
    algorithm: Box<dyn Algorithm>,
    properties: PropertyManager,
    state: AlgorithmState,
    initialized: bool,
    executed: bool,
    is_child: bool,
    manager: Arc<AlgorithmManager>,
    cancellation: CancellationHandle,
}

impl std::fmt::Debug for ManagedAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManagedAlgorithm")
            .field("id", &self.id)
            .field("name", &self.algorithm.name())
            .field("version", &self.algorithm.version())
            .field("state", &self.state)
            .field("is_child", &self.is_child)
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

impl ManagedAlgorithm {
    pub(crate) fn new(algorithm: Box<dyn Algorithm>, manager: Arc<AlgorithmManager>) -> Self {
        Self {
            id: AlgorithmId::next(),
            algorithm,
            properties: PropertyManager::new(),
            state: AlgorithmState::Constructed,
            initialized: false,
            executed: false,
            is_child: false,
            manager,
            cancellation: CancellationHandle::new(),
        }
    }

    pub fn id(&self) -> AlgorithmId {
        self.id
    }

    pub fn name(&self) -> &str {
        self.algorithm.name()
    }

    pub fn version(&self) -> u32 {
        self.algorithm.version()
    }

    pub fn category(&self) -> &str {
        self.algorithm.category()
    }

    pub fn summary(&self) -> &str {
        self.algorithm.summary()
    }

    pub fn state(&self) -> AlgorithmState {
        self.state
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn is_executed(&self) -> bool {
        self.executed
    }

    pub fn is_child(&self) -> bool {
        self.is_child
    }

    /// Child algorithms do not store their outputs in the data service and
    /// swallow recoverable execution errors.
    pub fn set_child(&mut self, is_child: bool) {
        self.is_child = is_child;
    }

    /// A handle that can cancel this algorithm from another thread.
    pub fn cancellation_handle(&self) -> CancellationHandle {
        self.cancellation.clone()
    }

    /// Request cancellation at the next interruption point.
    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    pub(crate) fn share_cancellation(&mut self, handle: CancellationHandle) {
        self.cancellation = handle;
    }

    /// Declare the properties. A second call does nothing.
    ///
    /// An error from the declaration hook is logged and returned; a panic is
    /// logged as fatal and resumed. Either way the partially declared
    /// properties are discarded so the call can be retried.
    pub fn initialize(&mut self) -> Result<()> {
        if self.initialized {
            return Ok(());
        }

        let outcome = {
            let mut ctx = InitContext {
                properties: &mut self.properties,
                data_service: self.manager.data_service(),
            };
            let algorithm = &mut self.algorithm;
            panic::catch_unwind(AssertUnwindSafe(|| algorithm.init(&mut ctx)))
        };

        match outcome {
            Ok(Ok(())) => {
                self.initialized = true;
                self.state = AlgorithmState::Initialized;
                Ok(())
            }
            Ok(Err(err)) => {
                error!(algorithm = self.name(), %err, "error initializing algorithm");
                self.properties = PropertyManager::new();
                self.state = AlgorithmState::Failed;
                Err(err)
            }
            Err(payload) => {
                error!(
                    algorithm = self.name(),
                    panic = %panic_message(payload.as_ref()),
                    "FATAL: unexpected error initializing algorithm"
                );
                self.properties = PropertyManager::new();
                self.state = AlgorithmState::Failed;
                panic::resume_unwind(payload)
            }
        }
    }

    /// Validate the properties and run the algorithm.
    ///
    /// Returns `Ok(true)` on success. A child algorithm returns `Ok(false)`
    /// instead of a recoverable error, which it only logs. Panics from the
    /// computation are logged as fatal and resumed whether or not the
    /// algorithm is a child.
    pub fn execute(&mut self) -> Result<bool> {
        if !self.initialized {
            return Err(FrameworkError::Runtime(format!(
                "algorithm {} is not initialized",
                self.name()
            )));
        }

        let invalid = self.properties.validate_properties();
        if !invalid.is_empty() {
            error!(algorithm = self.name(), invalid = ?invalid, "some invalid properties");
            self.executed = false;
            self.state = AlgorithmState::Failed;
            return Err(FrameworkError::Runtime(format!(
                "Some invalid properties found: {}",
                invalid.join(", ")
            )));
        }

        info!(algorithm = self.name(), id = %self.id, child = self.is_child, "started");
        let start = Instant::now();

        let outcome = {
            let mut ctx = ExecutionContext {
                id: self.id,
                properties: &mut self.properties,
                manager: &self.manager,
                cancellation: &self.cancellation,
            };
            let algorithm = &mut self.algorithm;
            panic::catch_unwind(AssertUnwindSafe(|| algorithm.exec(&mut ctx)))
        };
        let outcome = match outcome {
            Ok(Ok(())) if !self.is_child => Ok(self.commit_output()),
            other => other,
        };
        if !self.is_child {
            self.cancellation.reset();
        }

        match outcome {
            Ok(Ok(())) => {
                self.executed = true;
                self.state = AlgorithmState::Executed;
                info!(
                    algorithm = self.name(),
                    id = %self.id,
                    elapsed_ms = start.elapsed().as_secs_f64() * 1e3,
                    "finished"
                );
                Ok(true)
            }
            Ok(Err(err)) => {
                error!(algorithm = self.name(), id = %self.id, %err, "execution failed");
                self.executed = false;
                self.state = AlgorithmState::Failed;
                if self.is_child && err.is_recoverable() {
                    warn!(algorithm = self.name(), "error in child algorithm ignored by parent");
                    Ok(false)
                } else {
                    Err(err)
                }
            }
            Err(payload) => {
                error!(
                    algorithm = self.name(),
                    id = %self.id,
                    panic = %panic_message(payload.as_ref()),
                    "FATAL: unexpected error during execution"
                );
                self.executed = false;
                self.state = AlgorithmState::Failed;
                panic::resume_unwind(payload)
            }
        }
    }

    /// Store the first output workspace property.
    fn commit_output(&mut self) -> Result<()> {
        let output = self
            .properties
            .properties_mut()
            .find(|p| p.is_workspace_property() && p.direction() == Direction::Output);
        if let Some(property) = output {
            property.store()?;
        }
        Ok(())
    }

    pub fn properties(&self) -> &PropertyManager {
        &self.properties
    }

    pub fn properties_mut(&mut self) -> &mut PropertyManager {
        &mut self.properties
    }

    pub fn set_property_value(&mut self, name: &str, value: &str) -> Result<()> {
        self.properties.set_property_value(name, value)
    }

    pub fn get_property_value(&self, name: &str) -> Result<String> {
        self.properties.get_property_value(name)
    }

    /// Set several properties from `Name=Value;Name=Value`.
    pub fn set_properties(&mut self, assignments: &str) -> Result<()> {
        self.properties.set_properties(assignments)
    }

    pub fn get_value<T: PropertyValue>(&self, name: &str) -> Result<T> {
        self.properties.get_value(name)
    }

    pub fn set_value<T: PropertyValue>(&mut self, name: &str, value: T) -> Result<()> {
        self.properties.set_value(name, value)
    }

    pub fn get_workspace<T: Workspace>(&self, name: &str) -> Result<Arc<T>> {
        self.properties.get_workspace(name)
    }

    pub fn set_workspace<T: Workspace>(&mut self, name: &str, workspace: Arc<T>) -> Result<()> {
        self.properties.set_workspace(name, workspace)
    }
}
