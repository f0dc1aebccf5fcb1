pub mod node;
pub mod operand;
pub mod parsed;

pub use node::{BuildContext, Input, MapOp, OutputKind};
pub use parsed::ParsedNode;
