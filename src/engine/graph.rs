use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::ExecutionConfig;
use crate::core::{Input, MapOp, ParsedNode};
use crate::error::{MapAlgebraError, Result};
use crate::ops::{RasterSourceOp, ScalarOp};
use crate::registry::OperatorRegistry;

/// Handle of a node inside an [`ExpressionGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(usize);

impl NodeId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Arena owning every operator node of an evaluation.
///
/// Edges only point at nodes added earlier, so arena order is already a
/// topological order and cycles cannot be expressed.
pub struct ExpressionGraph {
    nodes: Vec<Box<dyn MapOp>>,
}

impl ExpressionGraph {
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    /// Builds a graph from a parsed expression, returning it with the root's id.
    pub fn from_expression(expr: &ParsedNode, registry: &OperatorRegistry) -> Result<(Self, NodeId)> {
        let mut graph = Self::new();
        let root = graph.add_expression(expr, registry)?;
        Ok((graph, root))
    }

    /// Adds a parsed expression to this graph. Nothing is added on error.
    pub fn add_expression(&mut self, expr: &ParsedNode, registry: &OperatorRegistry) -> Result<NodeId> {
        let mark = self.nodes.len();
        let result = self.resolve(expr, registry);
        if result.is_err() {
            self.nodes.truncate(mark);
        }
        result
    }

    fn resolve(&mut self, expr: &ParsedNode, registry: &OperatorRegistry) -> Result<NodeId> {
        match expr {
            ParsedNode::Function { name, children } => {
                let mut op = registry.create(name)?;
                let operands = op.process_children(children)?;

                let mut inputs = Vec::with_capacity(operands.len());
                for operand in &operands {
                    inputs.push(self.resolve(operand, registry)?);
                }

                for id in inputs {
                    let kind = self.nodes[id.0].output_kind();
                    op.add_input(Input { id, kind })?;
                }

                tracing::debug!(operator = op.describe(), expression = %expr, "resolved operator");
                Ok(self.add_node(op))
            }
            ParsedNode::Raster(name) => Ok(self.add_node(Box::new(RasterSourceOp::named(name)))),
            ParsedNode::Number(value) => Ok(self.add_node(Box::new(ScalarOp::new(*value)))),
            ParsedNode::Str(value) => Err(MapAlgebraError::argument(format!(
                "string literal \"{}\" cannot be used as an operand",
                value
            ))),
        }
    }

    pub fn add_node(&mut self, op: Box<dyn MapOp>) -> NodeId {
        self.nodes.push(op);
        NodeId::new(self.nodes.len() - 1)
    }

    /// Attaches `input` as an upstream of `consumer`.
    pub fn connect(&mut self, consumer: NodeId, input: NodeId) -> Result<()> {
        self.check(consumer)?;
        self.check(input)?;

        if input >= consumer {
            return Err(MapAlgebraError::argument(format!(
                "{} must be added before its consumer {}",
                self.label(input),
                self.label(consumer)
            )));
        }

        let kind = self.nodes[input.0].output_kind();
        self.nodes[consumer.0].add_input(Input { id: input, kind })
    }

    pub fn get(&self, id: NodeId) -> Option<&dyn MapOp> {
        self.nodes.get(id.0).map(|node| node.as_ref())
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut (dyn MapOp + 'static)> {
        self.nodes.get_mut(id.0).map(|node| node.as_mut())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len()).map(NodeId)
    }

    /// Diagnostic label such as `kernel#3`.
    pub fn label(&self, id: NodeId) -> String {
        match self.get(id) {
            Some(node) => format!("{}{}", node.describe(), id),
            None => format!("unknown{}", id),
        }
    }

    /// Assigns a persisted artifact name to a node.
    pub fn set_output_name(&mut self, id: NodeId, name: impl Into<String>) -> Result<()> {
        self.check(id)?;
        self.nodes[id.0].set_output_name(name.into())
    }

    /// Assigned output name, or one derived from the node's position.
    pub fn output_name(&self, id: NodeId, config: &ExecutionConfig) -> String {
        match self.get(id) {
            Some(node) => match node.output_name() {
                Some(name) => name.to_string(),
                None => format!("{}/{}-{}", config.output_prefix, node.describe(), id.0),
            },
            None => format!("{}/unknown-{}", config.output_prefix, id.0),
        }
    }

    /// Renders the subtree under `root` back into expression syntax.
    pub fn describe_tree(&self, root: NodeId) -> String {
        match self.get(root) {
            Some(node) => {
                let inputs: Vec<String> = node
                    .inputs()
                    .iter()
                    .map(|input| self.describe_tree(input.id))
                    .collect();
                node.to_expression(&inputs)
            }
            None => format!("<missing {}>", root),
        }
    }

    fn check(&self, id: NodeId) -> Result<()> {
        if id.0 >= self.nodes.len() {
            return Err(MapAlgebraError::argument(format!("no node {} in expression graph", id)));
        }
        Ok(())
    }
}

impl Default for ExpressionGraph {
    fn default() -> Self {
        Self::new()
    }
}
