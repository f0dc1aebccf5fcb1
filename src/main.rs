use anyhow::Context;
use mapalgebra::backend::mock::{InMemoryProvider, RecordingJobDriver};
use mapalgebra::backend::PyramidDescriptor;
use mapalgebra::core::ParsedNode;
use mapalgebra::engine::{ExpressionGraph, Scheduler};
use mapalgebra::observability::{BuildMonitor, LoggingProgress};
use mapalgebra::registry::OperatorRegistry;
use mapalgebra::ExecutionConfig;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => ExecutionConfig::load(&path).await?,
        None => ExecutionConfig::default(),
    }
    .with_env_overrides()?;

    let provider = Arc::new(InMemoryProvider::new());
    provider.insert(PyramidDescriptor::new("elevation", 12, 512, 1));
    let driver = Arc::new(RecordingJobDriver::new(provider.clone()));

    // kernel("gaussian", [elevation], 2.5)
    let expression = ParsedNode::function(
        "kernel",
        vec![
            ParsedNode::string("gaussian"),
            ParsedNode::raster("elevation"),
            ParsedNode::string("2.5"),
        ],
    );

    let registry = OperatorRegistry::discover();
    tracing::info!(operators = ?registry.names(), "operators registered");

    let (graph, root) = ExpressionGraph::from_expression(&expression, &registry)
        .context("Failed to resolve expression")?;
    tracing::info!(expression = %graph.describe_tree(root), "expression resolved");

    let mut scheduler = Scheduler::new(driver.clone(), provider.clone(), config);
    let progress = LoggingProgress::new("demo");

    for run in 1..=2 {
        let output = scheduler.execute(&graph, root, &progress).await?;
        tracing::info!(run, output = %output.name, submissions = driver.submission_count(), "evaluation finished");
    }

    println!("{}", BuildMonitor::new(scheduler.metrics().clone()).generate_report());

    Ok(())
}
