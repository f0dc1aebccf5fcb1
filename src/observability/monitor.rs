use super::MetricsCollector;

pub struct BuildMonitor {
    collector: MetricsCollector,
}

impl BuildMonitor {
    pub fn new(collector: MetricsCollector) -> Self {
        Self { collector }
    }

    pub fn generate_report(&self) -> String {
        let snapshot = self.collector.snapshot();

        if snapshot.is_empty() {
            return "No nodes built".to_string();
        }

        let mut report = String::from("=== Build Metrics ===\n");

        for (node_id, metrics) in snapshot.iter() {
            report.push_str(&format!(
                "\n[{}]\n  Builds: {}\n  Failures: {}\n  Cancelled: {}\n  Retries: {}\n  Cache hits: {}\n  Avg Latency: {}μs\n",
                node_id,
                metrics.builds_completed,
                metrics.failures,
                metrics.cancellations,
                metrics.retries,
                metrics.cache_hits,
                metrics.avg_latency_us
            ));
        }

        report
    }

    pub fn collector(&self) -> &MetricsCollector {
        &self.collector
    }
}
