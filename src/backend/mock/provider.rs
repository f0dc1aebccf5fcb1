use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use crate::backend::{AccessMode, DataProvider, ProviderError, PyramidDescriptor};

/// Pyramid store held in memory.
pub struct InMemoryProvider {
    pyramids: RwLock<HashMap<String, PyramidDescriptor>>,
    open_outputs: RwLock<HashSet<String>>,
}

impl InMemoryProvider {
    pub fn new() -> Self {
        Self {
            pyramids: RwLock::new(HashMap::new()),
            open_outputs: RwLock::new(HashSet::new()),
        }
    }

    /// Stores (or replaces) a pyramid under its own name.
    pub fn insert(&self, descriptor: PyramidDescriptor) {
        if let Ok(mut outputs) = self.open_outputs.write() {
            outputs.remove(&descriptor.name);
        }
        if let Ok(mut pyramids) = self.pyramids.write() {
            pyramids.insert(descriptor.name.clone(), descriptor);
        }
    }

    pub fn get(&self, name: &str) -> Option<PyramidDescriptor> {
        self.pyramids.read().ok()?.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn is_open_for_output(&self, name: &str) -> bool {
        self.open_outputs
            .read()
            .map(|outputs| outputs.contains(name))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.pyramids.read().map(|p| p.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DataProvider for InMemoryProvider {
    async fn resolve(&self, name: &str, mode: AccessMode) -> Result<PyramidDescriptor, ProviderError> {
        match (self.get(name), mode) {
            (Some(descriptor), _) => Ok(descriptor),
            (None, AccessMode::Write) if self.is_open_for_output(name) => {
                Ok(PyramidDescriptor::new(name, 0, 512, 1))
            }
            (None, _) => Err(ProviderError::NotFound(name.to_string())),
        }
    }

    async fn open_output(&self, name: &str) -> Result<String, ProviderError> {
        let mut outputs = self.open_outputs.write().map_err(|_| {
            ProviderError::OutputUnavailable(name.to_string(), "provider lock poisoned".to_string())
        })?;
        outputs.insert(name.to_string());
        Ok(name.to_string())
    }
}
