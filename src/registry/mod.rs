pub mod metadata;
pub mod operators;

pub use metadata::{
    OperatorFactory, OperatorMetadata, OperatorMetadataFactory, OperatorMetadataFactoryWrapper,
};
pub use operators::OperatorRegistry;
