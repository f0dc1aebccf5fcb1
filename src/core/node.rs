use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::backend::{DataProvider, JobDriver, PyramidDescriptor};
use crate::config::ExecutionConfig;
use crate::core::ParsedNode;
use crate::engine::{BuildState, ExpressionGraph, NodeId};
use crate::error::{MapAlgebraError, Result};
use crate::observability::Progress;

/// What a node's build step produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    Raster,
    Scalar,
}

/// Edge from a consumer to one of its upstream nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Input {
    pub id: NodeId,
    pub kind: OutputKind,
}

/// Contract every operator in the expression language satisfies.
///
/// A node is created empty by the registry, configured once through
/// [`MapOp::process_children`], wired to its upstream nodes with
/// [`MapOp::add_input`] and finally built by the scheduler. `build` takes
/// `&self`: the produced output lives behind interior synchronization so
/// that shared nodes submit their job at most once.
#[async_trait]
pub trait MapOp: Send + Sync {
    /// Operator keyword used in diagnostics.
    fn describe(&self) -> &str;

    fn output_kind(&self) -> OutputKind {
        OutputKind::Raster
    }

    /// Consumes the parsed argument list and returns the sub-expressions the
    /// caller must resolve into upstream inputs.
    fn process_children(&mut self, children: &[ParsedNode]) -> Result<Vec<ParsedNode>>;

    /// Attaches an upstream node. Rejections leave the node unchanged.
    fn add_input(&mut self, input: Input) -> Result<()>;

    fn inputs(&self) -> &[Input];

    /// Artifact names this node's result is tied to, for cache invalidation.
    fn calculate_inputs(&self) -> BTreeSet<String>;

    /// Persisted output name, if one was assigned.
    fn output_name(&self) -> Option<&str>;

    /// Assigns the persisted name this node's output is stored under.
    /// Nodes that only read existing data refuse.
    fn set_output_name(&mut self, name: String) -> Result<()>;

    /// The produced pyramid once built.
    fn output(&self) -> Option<Arc<PyramidDescriptor>>;

    fn state(&self) -> BuildState;

    async fn build(&self, ctx: &BuildContext<'_>, progress: &dyn Progress) -> Result<()>;

    /// Renders this node back into expression syntax given its rendered inputs.
    fn to_expression(&self, inputs: &[String]) -> String {
        format!("{}({})", self.describe(), inputs.join(", "))
    }
}

/// Everything a node needs from its surroundings while building.
pub struct BuildContext<'a> {
    pub graph: &'a ExpressionGraph,
    pub node: NodeId,
    pub driver: &'a dyn JobDriver,
    pub provider: &'a dyn DataProvider,
    pub config: &'a ExecutionConfig,
}

impl<'a> BuildContext<'a> {
    /// Artifact name an input's data lives under: its built output, or else
    /// its persisted name. Inputs with neither have not been built yet.
    pub fn input_output_name(&self, input: NodeId) -> Result<String> {
        let upstream = self.graph.get(input);

        if let Some(output) = upstream.and_then(|node| node.output()) {
            return Ok(output.name.clone());
        }
        if let Some(name) = upstream.and_then(|node| node.output_name()) {
            return Ok(name.to_string());
        }

        Err(MapAlgebraError::UpstreamNotReady {
            node: self.graph.label(self.node),
            input,
        })
    }

    /// Target artifact name for the node being built.
    pub fn output_name(&self) -> String {
        self.graph.output_name(self.node, self.config)
    }
}
