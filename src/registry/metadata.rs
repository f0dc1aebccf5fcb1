use crate::core::MapOp;

/// Factory function type for creating operator instances
pub type OperatorFactory = fn() -> Box<dyn MapOp>;

/// Registration record for one operator type
#[derive(Clone)]
pub struct OperatorMetadata {
    pub name: String,
    /// Lower-cased keywords the operator answers to
    pub aliases: Vec<String>,
    pub usage: String,
    pub factory: OperatorFactory,
}

impl OperatorMetadata {
    pub fn new(name: impl Into<String>, aliases: &[&str], factory: OperatorFactory) -> Self {
        let aliases: Vec<String> = aliases.iter().map(|a| a.to_lowercase()).collect();
        let usage = format!("{}(...)", aliases.first().map(String::as_str).unwrap_or("?"));
        Self {
            name: name.into(),
            aliases,
            usage,
            factory,
        }
    }

    pub fn with_usage(mut self, usage: impl Into<String>) -> Self {
        self.usage = usage.into();
        self
    }

    /// Create a new, unconfigured instance of this operator
    pub fn create_instance(&self) -> Box<dyn MapOp> {
        (self.factory)()
    }
}

impl std::fmt::Debug for OperatorMetadata {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperatorMetadata")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("usage", &self.usage)
            .finish()
    }
}

// Factory type for creating operator metadata at runtime
pub type OperatorMetadataFactory = fn() -> OperatorMetadata;

// Wrapper for inventory collection
pub struct OperatorMetadataFactoryWrapper(pub OperatorMetadataFactory);

// Inventory submission type
inventory::collect!(OperatorMetadataFactoryWrapper);
