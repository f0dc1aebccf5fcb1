use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::backend::PyramidDescriptor;
use crate::core::{BuildContext, Input, MapOp, OutputKind, ParsedNode};
use crate::engine::BuildState;
use crate::error::{MapAlgebraError, Result};
use crate::observability::Progress;

/// Numeric constant operand. Produces no raster.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarOp {
    value: f64,
}

impl ScalarOp {
    pub fn new(value: f64) -> Self {
        Self { value }
    }

    pub fn value(&self) -> f64 {
        self.value
    }
}

#[async_trait]
impl MapOp for ScalarOp {
    fn describe(&self) -> &str {
        "scalar"
    }

    fn output_kind(&self) -> OutputKind {
        OutputKind::Scalar
    }

    fn process_children(&mut self, _children: &[ParsedNode]) -> Result<Vec<ParsedNode>> {
        Err(MapAlgebraError::argument("a number literal takes no arguments"))
    }

    fn add_input(&mut self, _input: Input) -> Result<()> {
        Err(MapAlgebraError::argument("a number literal takes no inputs"))
    }

    fn inputs(&self) -> &[Input] {
        &[]
    }

    fn calculate_inputs(&self) -> BTreeSet<String> {
        BTreeSet::new()
    }

    fn output_name(&self) -> Option<&str> {
        None
    }

    fn set_output_name(&mut self, name: String) -> Result<()> {
        Err(MapAlgebraError::argument(format!(
            "a number literal produces no raster to store as '{}'",
            name
        )))
    }

    fn output(&self) -> Option<Arc<PyramidDescriptor>> {
        None
    }

    // Constants need no work.
    fn state(&self) -> BuildState {
        BuildState::Built
    }

    async fn build(&self, _ctx: &BuildContext<'_>, progress: &dyn Progress) -> Result<()> {
        progress.starting();
        progress.complete();
        Ok(())
    }

    fn to_expression(&self, _inputs: &[String]) -> String {
        self.value.to_string()
    }
}
