pub mod graph;
pub mod scheduler;
pub mod state;

pub use graph::{ExpressionGraph, NodeId};
pub use scheduler::Scheduler;
pub use state::{BuildCell, BuildState};
