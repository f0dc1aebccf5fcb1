use async_trait::async_trait;
use mapalgebra_macros::MapOperator;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::backend::{AccessMode, KernelJob, PyramidDescriptor};
use crate::core::operand::{parse_child_f64, parse_child_string, require_children, require_min_children};
use crate::core::{BuildContext, Input, MapOp, OutputKind, ParsedNode};
use crate::engine::{BuildCell, BuildState};
use crate::error::{MapAlgebraError, Result};
use crate::observability::Progress;

const EPSILON: f64 = 1e-8;

/// Convolution kernel applied by the distributed engine, with its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "lowercase")]
pub enum KernelMethod {
    /// `sigma` in meters
    Gaussian { sigma: f64 },
    /// `sigma` in meters
    Laplacian { sigma: f64 },
    Triangular { min: f64, max: f64, mode: f64, bin: f64 },
}

impl KernelMethod {
    pub const GAUSSIAN: &'static str = "gaussian";
    pub const LAPLACIAN: &'static str = "laplacian";
    pub const TRIANGULAR: &'static str = "triangular";

    pub fn name(&self) -> &'static str {
        match self {
            Self::Gaussian { .. } => Self::GAUSSIAN,
            Self::Laplacian { .. } => Self::LAPLACIAN,
            Self::Triangular { .. } => Self::TRIANGULAR,
        }
    }

    pub fn sigma(&self) -> Option<f64> {
        match self {
            Self::Gaussian { sigma } | Self::Laplacian { sigma } => Some(*sigma),
            Self::Triangular { .. } => None,
        }
    }

    /// Arity description for a lower-cased method name.
    fn arity_hint(method: &str) -> Option<&'static str> {
        match method {
            Self::GAUSSIAN | Self::LAPLACIAN => {
                Some("takes two additional arguments (source raster, and sigma in meters)")
            }
            Self::TRIANGULAR => {
                Some("takes five additional arguments (source raster, min, max, mode, and bin)")
            }
            _ => None,
        }
    }

    fn parse(method: &str, children: &[ParsedNode]) -> Result<Self> {
        let arity_error = || {
            format!(
                "{} {}",
                method,
                Self::arity_hint(&method.to_lowercase()).unwrap_or_default()
            )
        };

        match method.to_lowercase().as_str() {
            Self::GAUSSIAN | Self::LAPLACIAN => {
                require_children(children, 3, arity_error)?;
                let sigma = parse_child_f64(&children[2], "sigma")?;
                if !sigma.is_finite() || sigma <= EPSILON {
                    return Err(MapAlgebraError::argument(format!(
                        "sigma must be greater than 0, got {}",
                        sigma
                    )));
                }

                if method.eq_ignore_ascii_case(Self::GAUSSIAN) {
                    Ok(Self::Gaussian { sigma })
                } else {
                    Ok(Self::Laplacian { sigma })
                }
            }
            Self::TRIANGULAR => {
                require_children(children, 6, arity_error)?;
                let min = parse_child_f64(&children[2], "min")?;
                let max = parse_child_f64(&children[3], "max")?;
                let mode = parse_child_f64(&children[4], "mode")?;
                let bin = parse_child_f64(&children[5], "bin")?;

                if ![min, max, mode, bin].iter().all(|v| v.is_finite()) {
                    return Err(MapAlgebraError::argument("triangular parameters must be finite"));
                }
                if !(min <= mode && mode <= max) {
                    return Err(MapAlgebraError::argument(format!(
                        "triangular requires min <= mode <= max, got {}, {}, {}",
                        min, mode, max
                    )));
                }
                if bin <= 0.0 {
                    return Err(MapAlgebraError::argument(format!(
                        "triangular bin must be greater than 0, got {}",
                        bin
                    )));
                }

                Ok(Self::Triangular { min, max, mode, bin })
            }
            _ => Err(MapAlgebraError::argument(format!("unknown kernel method: {}", method))),
        }
    }
}

/// Applies a convolution kernel to a single raster input.
///
/// `kernel("gaussian", [elevation], 2.5)`
#[derive(MapOperator, Debug, Default)]
#[map_op(name = "Kernel", register = "kernel", usage = "kernel(<method>, <raster>, <params ...>)")]
pub struct KernelMapOp {
    method: Option<KernelMethod>,
    inputs: Vec<Input>,
    output_name: Option<String>,
    output: BuildCell<PyramidDescriptor>,
}

impl KernelMapOp {
    pub fn method(&self) -> Option<&KernelMethod> {
        self.method.as_ref()
    }

    fn usage(children: &[ParsedNode]) -> String {
        let hint = match children.first() {
            Some(ParsedNode::Str(method)) => KernelMethod::arity_hint(&method.to_lowercase())
                .map(|hint| format!("; {} {}", method, hint)),
            _ => None,
        };
        format!("{}{}", Self::USAGE, hint.unwrap_or_default())
    }

    async fn submit(&self, ctx: &BuildContext<'_>, method: KernelMethod) -> Result<PyramidDescriptor> {
        let input = self
            .inputs
            .first()
            .ok_or_else(|| MapAlgebraError::NotConfigured("kernel has no raster input attached".into()))?;

        let input_name = ctx.input_output_name(input.id)?;
        let target = ctx.provider.open_output(&ctx.output_name()).await?;

        let job = KernelJob {
            method,
            input: input_name,
            output: target.clone(),
            config: ctx.config.clone(),
        };

        tracing::info!(method = method.name(), input = %job.input, output = %target, "submitting kernel job");
        ctx.driver
            .submit(job)
            .await
            .map_err(|err| MapAlgebraError::from_job(target.clone(), err))?;

        let descriptor = ctx.provider.resolve(&target, AccessMode::Read).await?;
        tracing::info!(output = %descriptor.name, "kernel job complete");
        Ok(descriptor)
    }
}

#[async_trait]
impl MapOp for KernelMapOp {
    fn describe(&self) -> &str {
        "kernel"
    }

    fn process_children(&mut self, children: &[ParsedNode]) -> Result<Vec<ParsedNode>> {
        require_min_children(children, 3, &Self::usage(children))?;

        if self.method.is_some() {
            return Err(MapAlgebraError::argument("kernel arguments were already processed"));
        }

        let method = parse_child_string(&children[0], "method")?;
        self.method = Some(KernelMethod::parse(&method, children)?);

        Ok(vec![children[1].clone()])
    }

    fn add_input(&mut self, input: Input) -> Result<()> {
        if input.kind != OutputKind::Raster {
            return Err(MapAlgebraError::argument("Can only apply kernel to raster inputs"));
        }

        if !self.inputs.is_empty() {
            return Err(MapAlgebraError::argument("Can only run kernel on a single raster input"));
        }

        self.inputs.push(input);
        Ok(())
    }

    fn inputs(&self) -> &[Input] {
        &self.inputs
    }

    fn calculate_inputs(&self) -> BTreeSet<String> {
        self.output_name.iter().cloned().collect()
    }

    fn output_name(&self) -> Option<&str> {
        self.output_name.as_deref()
    }

    fn set_output_name(&mut self, name: String) -> Result<()> {
        self.output_name = Some(name);
        Ok(())
    }

    fn output(&self) -> Option<Arc<PyramidDescriptor>> {
        self.output.get()
    }

    fn state(&self) -> BuildState {
        self.output.state()
    }

    async fn build(&self, ctx: &BuildContext<'_>, progress: &dyn Progress) -> Result<()> {
        progress.starting();

        if let Some(output) = self.output.get() {
            tracing::debug!(output = %output.name, "kernel already built");
            progress.complete();
            return Ok(());
        }

        let method = self
            .method
            .ok_or_else(|| MapAlgebraError::NotConfigured("kernel arguments have not been processed".into()))?;

        self.output.get_or_try_build(|| self.submit(ctx, method)).await?;

        progress.complete();
        Ok(())
    }

    fn to_expression(&self, inputs: &[String]) -> String {
        let input = inputs.first().map(String::as_str).unwrap_or("?");
        match &self.method {
            Some(KernelMethod::Triangular { min, max, mode, bin }) => format!(
                "kernel(\"{}\", {}, {}, {}, {}, {})",
                KernelMethod::TRIANGULAR, input, min, max, mode, bin
            ),
            Some(method) => format!(
                "kernel(\"{}\", {}, {})",
                method.name(),
                input,
                method.sigma().unwrap_or_default()
            ),
            None => format!("kernel({})", input),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::NodeId;

    fn raster_input() -> Input {
        Input {
            id: NodeId::new(0),
            kind: OutputKind::Raster,
        }
    }

    #[test]
    fn test_register_names() {
        assert_eq!(KernelMapOp::register(), &["kernel"]);
    }

    #[test]
    fn test_triangular_parameters() {
        let mut op = KernelMapOp::default();
        let children = vec![
            ParsedNode::string("Triangular"),
            ParsedNode::raster("dem"),
            ParsedNode::Number(0.0),
            ParsedNode::Number(10.0),
            ParsedNode::string("4"),
            ParsedNode::Number(0.5),
        ];

        let remaining = op.process_children(&children).unwrap();
        assert_eq!(remaining, vec![ParsedNode::raster("dem")]);
        assert_eq!(
            op.method(),
            Some(&KernelMethod::Triangular { min: 0.0, max: 10.0, mode: 4.0, bin: 0.5 })
        );
    }

    #[test]
    fn test_triangular_mode_out_of_range() {
        let mut op = KernelMapOp::default();
        let children = vec![
            ParsedNode::string("triangular"),
            ParsedNode::raster("dem"),
            ParsedNode::Number(0.0),
            ParsedNode::Number(10.0),
            ParsedNode::Number(11.0),
            ParsedNode::Number(1.0),
        ];

        let err = op.process_children(&children).unwrap_err();
        assert!(err.to_string().contains("min <= mode <= max"));
        assert!(op.method().is_none());
    }

    #[test]
    fn test_non_positive_sigma_rejected() {
        let mut op = KernelMapOp::default();
        let children = vec![ParsedNode::string("gaussian"), ParsedNode::raster("dem"), ParsedNode::Number(0.0)];
        assert!(matches!(op.process_children(&children), Err(MapAlgebraError::Argument(_))));
    }

    #[test]
    fn test_arguments_processed_once() {
        let mut op = KernelMapOp::default();
        let children = vec![ParsedNode::string("gaussian"), ParsedNode::raster("dem"), ParsedNode::Number(1.0)];
        op.process_children(&children).unwrap();

        let err = op.process_children(&children).unwrap_err();
        assert!(err.to_string().contains("already processed"));
    }

    #[test]
    fn test_calculate_inputs_reports_output_name() {
        let mut op = KernelMapOp::default();
        assert!(op.calculate_inputs().is_empty());

        op.set_output_name("saved/blur".to_string()).unwrap();
        assert_eq!(op.calculate_inputs(), BTreeSet::from(["saved/blur".to_string()]));
        // pure query
        assert_eq!(op.calculate_inputs(), op.calculate_inputs());
    }

    #[test]
    fn test_scalar_input_rejected() {
        let mut op = KernelMapOp::default();
        let scalar = Input {
            id: NodeId::new(0),
            kind: OutputKind::Scalar,
        };

        let err = op.add_input(scalar).unwrap_err();
        assert_eq!(err.to_string(), "Can only apply kernel to raster inputs");
        assert!(op.inputs().is_empty());

        op.add_input(raster_input()).unwrap();
        assert_eq!(op.inputs().len(), 1);
    }
}
