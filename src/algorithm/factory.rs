//! Registry of algorithm constructors keyed by name and version.

use super::builtins::{CreateWorkspace, EvaluateFunction, NormaliseToMax, Scale};
use super::Algorithm;
use crate::error::{FrameworkError, Result};
use std::collections::BTreeMap;

type AlgorithmConstructor = Box<dyn Fn() -> Box<dyn Algorithm> + Send + Sync>;

/// Key and constructor for `A`, keyed by the name and version it reports.
fn default_entry<A: Algorithm + Default + 'static>() -> ((String, u32), AlgorithmConstructor) {
    let sample = A::default();
    let key = (sample.name().to_string(), sample.version());
    let constructor: AlgorithmConstructor =
        Box::new(|| -> Box<dyn Algorithm> { Box::new(A::default()) });
    (key, constructor)
}

/// Creates algorithms by `(name, version)`.
#[derive(Default)]
pub struct AlgorithmFactory {
    constructors: BTreeMap<(String, u32), AlgorithmConstructor>,
}

impl std::fmt::Debug for AlgorithmFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlgorithmFactory")
            .field("keys", &self.keys())
            .finish()
    }
}

impl AlgorithmFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// A factory with the built-in algorithms registered.
    pub fn with_builtins() -> Self {
        let constructors = [
            default_entry::<CreateWorkspace>(),
            default_entry::<Scale>(),
            default_entry::<NormaliseToMax>(),
            default_entry::<EvaluateFunction>(),
        ];
        Self {
            constructors: constructors.into_iter().collect(),
        }
    }

    /// Register a constructor. Fails with `DuplicateName` if the
    /// `(name, version)` pair is taken.
    pub fn subscribe<F>(&mut self, name: &str, version: u32, constructor: F) -> Result<()>
    where
        F: Fn() -> Box<dyn Algorithm> + Send + Sync + 'static,
    {
        let key = (name.to_string(), version);
        if self.constructors.contains_key(&key) {
            return Err(FrameworkError::DuplicateName(format!(
                "algorithm '{}' version {}",
                name, version
            )));
        }
        self.constructors.insert(key, Box::new(constructor));
        Ok(())
    }

    /// Register `A` under the name and version it reports.
    pub fn subscribe_default<A: Algorithm + Default + 'static>(&mut self) -> Result<()> {
        let ((name, version), constructor) = default_entry::<A>();
        self.subscribe(&name, version, constructor)
    }

    /// Highest registered version of `name`.
    pub fn highest_version(&self, name: &str) -> Option<u32> {
        self.constructors
            .keys()
            .filter(|(n, _)| n == name)
            .map(|(_, v)| *v)
            .max()
    }

    pub fn exists(&self, name: &str, version: Option<u32>) -> bool {
        match version {
            Some(v) => self.constructors.contains_key(&(name.to_string(), v)),
            None => self.highest_version(name).is_some(),
        }
    }

    /// Create an algorithm; `None` picks the highest registered version.
    pub fn create(&self, name: &str, version: Option<u32>) -> Result<Box<dyn Algorithm>> {
        let version = match version {
            Some(v) => v,
            None => self
                .highest_version(name)
                .ok_or_else(|| FrameworkError::NotFound(format!("algorithm '{}'", name)))?,
        };
        let constructor = self
            .constructors
            .get(&(name.to_string(), version))
            .ok_or_else(|| {
                FrameworkError::NotFound(format!("algorithm '{}' version {}", name, version))
            })?;
        Ok(constructor())
    }

    /// Registered `(name, version)` pairs in order.
    pub fn keys(&self) -> Vec<(String, u32)> {
        self.constructors.keys().cloned().collect()
    }
}
