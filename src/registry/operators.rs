use std::collections::BTreeMap;

use super::{OperatorMetadata, OperatorMetadataFactoryWrapper};
use crate::core::MapOp;
use crate::error::{MapAlgebraError, Result};

/// Maps operator keywords to operator constructors.
///
/// Keywords are matched case-insensitively.
pub struct OperatorRegistry {
    operators: BTreeMap<String, OperatorMetadata>,
}

impl OperatorRegistry {
    pub fn new() -> Self {
        Self {
            operators: BTreeMap::new(),
        }
    }

    /// Registry holding every operator submitted with `#[derive(MapOperator)]`.
    pub fn discover() -> Self {
        let mut registry = Self::new();
        for wrapper in inventory::iter::<OperatorMetadataFactoryWrapper> {
            registry.register((wrapper.0)());
        }
        registry
    }

    /// Registers an operator under all its aliases, replacing earlier owners.
    pub fn register(&mut self, metadata: OperatorMetadata) {
        for alias in &metadata.aliases {
            if let Some(previous) = self.operators.insert(alias.to_lowercase(), metadata.clone()) {
                tracing::debug!(alias = %alias, replaced = %previous.name, "operator alias re-registered");
            }
        }
    }

    pub fn get(&self, keyword: &str) -> Option<&OperatorMetadata> {
        self.operators.get(&keyword.to_lowercase())
    }

    pub fn create(&self, keyword: &str) -> Result<Box<dyn MapOp>> {
        self.get(keyword)
            .map(|metadata| metadata.create_instance())
            .ok_or_else(|| MapAlgebraError::argument(format!("unknown operator: {}", keyword)))
    }

    pub fn contains(&self, keyword: &str) -> bool {
        self.get(keyword).is_some()
    }

    /// All registered keywords, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.operators.keys().map(String::as_str).collect()
    }
}

impl Default for OperatorRegistry {
    fn default() -> Self {
        Self::new()
    }
}
