use std::collections::BTreeMap;
use std::sync::Arc;
use super::BuildMetrics;

#[derive(Debug, Clone, PartialEq)]
pub struct MetricsSnapshot {
    pub node_id: String,
    pub builds_completed: u64,
    pub failures: u64,
    pub cancellations: u64,
    pub retries: u64,
    pub cache_hits: u64,
    pub avg_latency_us: u64,
}

#[derive(Clone, Default)]
pub struct MetricsCollector {
    metrics: BTreeMap<String, Arc<BuildMetrics>>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            metrics: BTreeMap::new(),
        }
    }

    pub fn register(&mut self, node_id: impl Into<String>, metrics: Arc<BuildMetrics>) {
        self.metrics.insert(node_id.into(), metrics);
    }

    pub fn snapshot(&self) -> BTreeMap<String, MetricsSnapshot> {
        self.metrics
            .iter()
            .map(|(id, metrics)| {
                (
                    id.clone(),
                    MetricsSnapshot {
                        node_id: metrics.node_id().to_string(),
                        builds_completed: metrics.builds_completed(),
                        failures: metrics.failures(),
                        cancellations: metrics.cancellations(),
                        retries: metrics.retries(),
                        cache_hits: metrics.cache_hits(),
                        avg_latency_us: metrics.avg_latency_us(),
                    },
                )
            })
            .collect()
    }

    pub fn get_node_metrics(&self, node_id: &str) -> Option<Arc<BuildMetrics>> {
        self.metrics.get(node_id).cloned()
    }
}
