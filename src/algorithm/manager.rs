//! Creation and bookkeeping of algorithm instances.

use super::{AlgorithmFactory, AlgorithmId, ManagedAlgorithm};
use crate::config::FrameworkConfig;
use crate::data_service::DataService;
use crate::error::Result;
use crate::functions::FunctionFactory;
use parking_lot::{Mutex, RwLock};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::debug;

/// One created algorithm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlgorithmRecord {
    pub id: AlgorithmId,
    pub name: String,
    pub version: u32,
    pub parent: Option<AlgorithmId>,
}

/// Creates algorithms by name and remembers who created whom.
///
/// The manager owns the factories, the injected data service and the
/// configuration; algorithms keep an `Arc` to it. It does not keep the
/// algorithms themselves, only a bounded history of creation records.
pub struct AlgorithmManager {
    factory: RwLock<AlgorithmFactory>,
    function_factory: FunctionFactory,
    data_service: Arc<DataService>,
    config: FrameworkConfig,
    history: Mutex<VecDeque<AlgorithmRecord>>,
}

impl std::fmt::Debug for AlgorithmManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlgorithmManager")
            .field("factory", &*self.factory.read())
            .field("config", &self.config)
            .field("history", &self.history.lock().len())
            .finish()
    }
}

impl AlgorithmManager {
    /// A manager with the built-in algorithms and functions and the default
    /// configuration.
    pub fn new(data_service: Arc<DataService>) -> Arc<Self> {
        Self::with_config(data_service, FrameworkConfig::default())
    }

    pub fn with_config(data_service: Arc<DataService>, config: FrameworkConfig) -> Arc<Self> {
        Self::from_parts(
            AlgorithmFactory::with_builtins(),
            FunctionFactory::with_builtins(),
            data_service,
            config,
        )
    }

    pub fn from_parts(
        factory: AlgorithmFactory,
        function_factory: FunctionFactory,
        data_service: Arc<DataService>,
        config: FrameworkConfig,
    ) -> Arc<Self> {
        Arc::new(Self {
            factory: RwLock::new(factory),
            function_factory,
            data_service,
            config,
            history: Mutex::new(VecDeque::new()),
        })
    }

    /// Register another algorithm constructor.
    pub fn subscribe<F>(&self, name: &str, version: u32, constructor: F) -> Result<()>
    where
        F: Fn() -> Box<dyn super::Algorithm> + Send + Sync + 'static,
    {
        self.factory.write().subscribe(name, version, constructor)
    }

    /// Registered `(name, version)` pairs.
    pub fn algorithm_keys(&self) -> Vec<(String, u32)> {
        self.factory.read().keys()
    }

    /// Create and initialize a top-level algorithm.
    ///
    /// Fails with `NotFound` for an unknown name or version.
    pub fn create(self: &Arc<Self>, name: &str, version: Option<u32>) -> Result<ManagedAlgorithm> {
        let mut algorithm = self.create_unmanaged(name, version)?;
        algorithm.initialize()?;
        self.record(&algorithm, None);
        Ok(algorithm)
    }

    /// Create an algorithm that is neither initialized nor recorded.
    pub fn create_unmanaged(
        self: &Arc<Self>,
        name: &str,
        version: Option<u32>,
    ) -> Result<ManagedAlgorithm> {
        let algorithm = self.factory.read().create(name, version)?;
        Ok(ManagedAlgorithm::new(algorithm, Arc::clone(self)))
    }

    /// Create a child of `parent`. The child is marked but not initialized.
    pub fn create_child(
        self: &Arc<Self>,
        parent: AlgorithmId,
        name: &str,
        version: Option<u32>,
    ) -> Result<ManagedAlgorithm> {
        let mut child = self.create_unmanaged(name, version)?;
        child.set_child(true);
        self.record(&child, Some(parent));
        Ok(child)
    }

    fn record(&self, algorithm: &ManagedAlgorithm, parent: Option<AlgorithmId>) {
        debug!(
            algorithm = algorithm.name(),
            id = %algorithm.id(),
            parent = ?parent,
            "created algorithm"
        );
        let mut history = self.history.lock();
        history.push_back(AlgorithmRecord {
            id: algorithm.id(),
            name: algorithm.name().to_string(),
            version: algorithm.version(),
            parent,
        });
        while history.len() > self.config.algorithm_history_limit {
            history.pop_front();
        }
    }

    /// Children recorded for `parent`, in creation order.
    pub fn children_of(&self, parent: AlgorithmId) -> Vec<AlgorithmId> {
        self.history
            .lock()
            .iter()
            .filter(|r| r.parent == Some(parent))
            .map(|r| r.id)
            .collect()
    }

    pub fn parent_of(&self, child: AlgorithmId) -> Option<AlgorithmId> {
        self.history
            .lock()
            .iter()
            .find(|r| r.id == child)
            .and_then(|r| r.parent)
    }

    /// Creation records, oldest first.
    pub fn history(&self) -> Vec<AlgorithmRecord> {
        self.history.lock().iter().cloned().collect()
    }

    pub fn clear(&self) {
        self.history.lock().clear();
    }

    pub fn data_service(&self) -> &Arc<DataService> {
        &self.data_service
    }

    pub fn config(&self) -> &FrameworkConfig {
        &self.config
    }

    pub fn function_factory(&self) -> &FunctionFactory {
        &self.function_factory
    }
}
