use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;
use tokio::time::sleep;

use crate::backend::{DataProvider, JobDriver, PyramidDescriptor};
use crate::config::ExecutionConfig;
use crate::core::BuildContext;
use crate::engine::{BuildState, ExpressionGraph, NodeId};
use crate::error::{MapAlgebraError, Result};
use crate::observability::{BuildMetrics, MetricsCollector, Progress};
use crate::resilience::RetryPolicy;

/// One evaluation session: walks a graph in dependency order and builds it.
///
/// Sessions may share a graph; each node still submits at most one job.
pub struct Scheduler {
    driver: Arc<dyn JobDriver>,
    provider: Arc<dyn DataProvider>,
    config: ExecutionConfig,
    retry: RetryPolicy,
    metrics: MetricsCollector,
}

impl Scheduler {
    pub fn new(driver: Arc<dyn JobDriver>, provider: Arc<dyn DataProvider>, config: ExecutionConfig) -> Self {
        Self {
            driver,
            provider,
            config,
            retry: RetryPolicy::Never,
            metrics: MetricsCollector::new(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn config(&self) -> &ExecutionConfig {
        &self.config
    }

    pub fn metrics(&self) -> &MetricsCollector {
        &self.metrics
    }

    /// Nodes reachable from `root`, inputs before consumers, shared nodes once.
    pub fn plan(graph: &ExpressionGraph, root: NodeId) -> Result<Vec<NodeId>> {
        if graph.get(root).is_none() {
            return Err(MapAlgebraError::argument(format!("no node {} in expression graph", root)));
        }

        let mut order = Vec::new();
        let mut seen = HashSet::new();
        visit(graph, root, &mut seen, &mut order);
        Ok(order)
    }

    /// Artifact names each planned node depends on.
    pub fn artifact_dependencies(
        graph: &ExpressionGraph,
        root: NodeId,
    ) -> Result<BTreeMap<NodeId, BTreeSet<String>>> {
        Ok(Self::plan(graph, root)?
            .into_iter()
            .filter_map(|id| graph.get(id).map(|node| (id, node.calculate_inputs())))
            .collect())
    }

    /// Builds everything `root` needs, then `root`, and returns its pyramid.
    pub async fn execute(
        &mut self,
        graph: &ExpressionGraph,
        root: NodeId,
        progress: &dyn Progress,
    ) -> Result<Arc<PyramidDescriptor>> {
        let plan = Self::plan(graph, root)?;
        tracing::info!(root = %graph.label(root), nodes = plan.len(), "executing expression");

        for id in plan {
            self.build_node(graph, id, progress).await?;
        }

        graph
            .get(root)
            .and_then(|node| node.output())
            .ok_or_else(|| {
                MapAlgebraError::argument(format!("{} does not produce a raster", graph.label(root)))
            })
    }

    async fn build_node(&mut self, graph: &ExpressionGraph, id: NodeId, progress: &dyn Progress) -> Result<()> {
        let label = graph.label(id);
        let metrics = self.metrics_for(&label);

        let node = graph
            .get(id)
            .ok_or_else(|| MapAlgebraError::argument(format!("no node {} in expression graph", id)))?;

        let ctx = BuildContext {
            graph,
            node: id,
            driver: self.driver.as_ref(),
            provider: self.provider.as_ref(),
            config: &self.config,
        };

        if node.state() == BuildState::Built {
            node.build(&ctx, progress).await?;
            metrics.record_cache_hit();
            tracing::debug!(node = %label, "already built");
            return Ok(());
        }

        let mut attempts = 0;
        loop {
            attempts += 1;
            let start = metrics.start_build();

            let err = match node.build(&ctx, progress).await {
                Ok(()) => {
                    metrics.finish_build(start);
                    return Ok(());
                }
                Err(err) => err,
            };

            if err.is_cancelled() {
                metrics.record_cancelled();
            } else {
                metrics.record_failure();
            }

            match self.retry.delay_before(attempts) {
                Some(delay) if err.is_retryable() => {
                    tracing::warn!(node = %label, attempts, error = %err, "build failed, retrying");
                    metrics.record_retry();
                    sleep(delay).await;
                }
                _ => {
                    tracing::error!(node = %label, attempts, error = %err, "build failed");
                    return Err(err);
                }
            }
        }
    }

    fn metrics_for(&mut self, label: &str) -> Arc<BuildMetrics> {
        if let Some(metrics) = self.metrics.get_node_metrics(label) {
            return metrics;
        }
        let metrics = Arc::new(BuildMetrics::new(label));
        self.metrics.register(label, metrics.clone());
        metrics
    }
}

fn visit(graph: &ExpressionGraph, id: NodeId, seen: &mut HashSet<NodeId>, order: &mut Vec<NodeId>) {
    if !seen.insert(id) {
        return;
    }
    if let Some(node) = graph.get(id) {
        for input in node.inputs() {
            visit(graph, input.id, seen, order);
        }
    }
    order.push(id);
}
