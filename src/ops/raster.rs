use async_trait::async_trait;
use mapalgebra_macros::MapOperator;
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::backend::{AccessMode, PyramidDescriptor};
use crate::core::operand::{parse_child_string, require_children};
use crate::core::{BuildContext, Input, MapOp, ParsedNode};
use crate::engine::{BuildCell, BuildState};
use crate::error::{MapAlgebraError, Result};
use crate::observability::Progress;

/// Leaf node reading an existing pyramid, written `[name]` or `load("name")`.
#[derive(MapOperator, Debug, Default)]
#[map_op(name = "Load", register = "load", usage = "load(<pyramid name>)")]
pub struct RasterSourceOp {
    name: Option<String>,
    output: BuildCell<PyramidDescriptor>,
}

impl RasterSourceOp {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            output: BuildCell::new(),
        }
    }
}

#[async_trait]
impl MapOp for RasterSourceOp {
    fn describe(&self) -> &str {
        "load"
    }

    fn process_children(&mut self, children: &[ParsedNode]) -> Result<Vec<ParsedNode>> {
        require_children(children, 1, || format!("Usage: {}", Self::USAGE))?;

        if self.name.is_some() {
            return Err(MapAlgebraError::argument("load arguments were already processed"));
        }

        self.name = Some(parse_child_string(&children[0], "pyramid name")?);
        Ok(Vec::new())
    }

    fn add_input(&mut self, _input: Input) -> Result<()> {
        Err(MapAlgebraError::argument("load does not take inputs"))
    }

    fn inputs(&self) -> &[Input] {
        &[]
    }

    fn calculate_inputs(&self) -> BTreeSet<String> {
        self.name.iter().cloned().collect()
    }

    fn output_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn set_output_name(&mut self, name: String) -> Result<()> {
        Err(MapAlgebraError::argument(format!(
            "load reads pyramid '{}' and cannot be stored as '{}'",
            self.name.as_deref().unwrap_or("?"),
            name
        )))
    }

    fn output(&self) -> Option<Arc<PyramidDescriptor>> {
        self.output.get()
    }

    fn state(&self) -> BuildState {
        self.output.state()
    }

    async fn build(&self, ctx: &BuildContext<'_>, progress: &dyn Progress) -> Result<()> {
        progress.starting();

        let name = self
            .name
            .as_deref()
            .ok_or_else(|| MapAlgebraError::NotConfigured("load arguments have not been processed".into()))?;

        self.output
            .get_or_try_build(|| async {
                tracing::debug!(pyramid = name, "resolving raster source");
                Ok::<_, MapAlgebraError>(ctx.provider.resolve(name, AccessMode::Read).await?)
            })
            .await?;

        progress.complete();
        Ok(())
    }

    fn to_expression(&self, _inputs: &[String]) -> String {
        format!("[{}]", self.name.as_deref().unwrap_or("?"))
    }
}
