use mapalgebra::backend::mock::{InMemoryProvider, RecordingJobDriver};
use mapalgebra::backend::PyramidDescriptor;
use mapalgebra::core::{BuildContext, MapOp, ParsedNode};
use mapalgebra::engine::{BuildState, ExpressionGraph, NodeId};
use mapalgebra::observability::{NoopProgress, Progress};
use mapalgebra::ops::{KernelMapOp, KernelMethod};
use mapalgebra::registry::OperatorRegistry;
use mapalgebra::{ExecutionConfig, MapAlgebraError};
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::time::Duration;
use tokio_test::{assert_err, assert_ok};

struct Fixture {
    provider: Arc<InMemoryProvider>,
    driver: Arc<RecordingJobDriver>,
    config: ExecutionConfig,
    graph: ExpressionGraph,
    source: NodeId,
    kernel: NodeId,
}

impl Fixture {
    fn new(delay: Option<Duration>) -> Self {
        let provider = Arc::new(InMemoryProvider::new());
        provider.insert(PyramidDescriptor::new("elevation", 10, 512, 1));

        let mut driver = RecordingJobDriver::new(provider.clone());
        if let Some(delay) = delay {
            driver = driver.with_delay(delay);
        }

        let expression = ParsedNode::function(
            "kernel",
            vec![
                ParsedNode::string("gaussian"),
                ParsedNode::raster("elevation"),
                ParsedNode::Number(2.5),
            ],
        );
        let (graph, kernel) =
            ExpressionGraph::from_expression(&expression, &OperatorRegistry::discover()).unwrap();
        let source = graph.get(kernel).unwrap().inputs()[0].id;

        Self {
            provider,
            driver: Arc::new(driver),
            config: ExecutionConfig::default(),
            graph,
            source,
            kernel,
        }
    }

    async fn build_with(&self, node: NodeId, progress: &dyn Progress) -> Result<(), MapAlgebraError> {
        let ctx = BuildContext {
            graph: &self.graph,
            node,
            driver: self.driver.as_ref(),
            provider: self.provider.as_ref(),
            config: &self.config,
        };
        self.graph.get(node).unwrap().build(&ctx, progress).await
    }

    async fn build(&self, node: NodeId) -> Result<(), MapAlgebraError> {
        self.build_with(node, &NoopProgress).await
    }
}

#[derive(Default)]
struct CountingProgress {
    started: AtomicUsize,
    completed: AtomicUsize,
}

impl Progress for CountingProgress {
    fn starting(&self) {
        self.started.fetch_add(1, Ordering::SeqCst);
    }

    fn complete(&self) {
        self.completed.fetch_add(1, Ordering::SeqCst);
    }
}

#[tokio::test]
async fn test_build_twice_submits_once() {
    let fixture = Fixture::new(None);
    assert_ok!(fixture.build(fixture.source).await);

    assert_ok!(fixture.build(fixture.kernel).await);
    let first = fixture.graph.get(fixture.kernel).unwrap().output().unwrap();

    assert_ok!(fixture.build(fixture.kernel).await);
    let second = fixture.graph.get(fixture.kernel).unwrap().output().unwrap();

    assert_eq!(fixture.driver.submission_count(), 1);
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(fixture.graph.get(fixture.kernel).unwrap().state(), BuildState::Built);
}

#[tokio::test]
async fn test_job_uses_upstream_name_before_upstream_built() {
    let fixture = Fixture::new(None);
    assert_eq!(fixture.graph.get(fixture.source).unwrap().state(), BuildState::Unbuilt);

    assert_ok!(fixture.build(fixture.kernel).await);

    let jobs = fixture.driver.submissions();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].input, "elevation");
    assert_eq!(jobs[0].output, "mapalgebra/kernel-1");
    assert_eq!(jobs[0].method, KernelMethod::Gaussian { sigma: 2.5 });
    assert_eq!(jobs[0].config, fixture.config);
}

#[tokio::test]
async fn test_output_resolved_through_provider() {
    let fixture = Fixture::new(None);
    assert_ok!(fixture.build(fixture.kernel).await);

    let output = fixture.graph.get(fixture.kernel).unwrap().output().unwrap();
    assert_eq!(output.name, "mapalgebra/kernel-1");
    assert_eq!(output.max_zoom, 10);
    assert!(fixture.provider.contains("mapalgebra/kernel-1"));
}

#[tokio::test]
async fn test_unbuilt_kernel_upstream_fails_loudly() {
    let provider = Arc::new(InMemoryProvider::new());
    provider.insert(PyramidDescriptor::new("elevation", 10, 512, 1));
    let driver = RecordingJobDriver::new(provider.clone());
    let config = ExecutionConfig::default();

    let inner = ParsedNode::function(
        "kernel",
        vec![ParsedNode::string("gaussian"), ParsedNode::raster("elevation"), ParsedNode::Number(1.0)],
    );
    let outer = ParsedNode::function(
        "kernel",
        vec![ParsedNode::string("laplacian"), inner, ParsedNode::Number(1.0)],
    );
    let (graph, root) = ExpressionGraph::from_expression(&outer, &OperatorRegistry::discover()).unwrap();

    let ctx = BuildContext {
        graph: &graph,
        node: root,
        driver: &driver,
        provider: provider.as_ref(),
        config: &config,
    };
    let err = graph.get(root).unwrap().build(&ctx, &NoopProgress).await.unwrap_err();

    assert!(matches!(err, MapAlgebraError::UpstreamNotReady { .. }));
    assert_eq!(err.to_string(), "kernel#2 cannot build: input #1 has not been built");
    assert_eq!(driver.submission_count(), 0);
    assert_eq!(graph.get(root).unwrap().state(), BuildState::Unbuilt);
}

#[tokio::test]
async fn test_failed_job_leaves_node_retryable() {
    let fixture = Fixture::new(None);
    fixture.driver.fail_next("executor lost");

    let err = assert_err!(fixture.build(fixture.kernel).await);
    assert!(matches!(err, MapAlgebraError::JobFailed { ref reason, .. } if reason == "executor lost"));

    let node = fixture.graph.get(fixture.kernel).unwrap();
    assert_eq!(node.state(), BuildState::Unbuilt);
    assert!(node.output().is_none());

    assert_ok!(fixture.build(fixture.kernel).await);
    assert_eq!(fixture.driver.submission_count(), 2);
    assert_eq!(node.state(), BuildState::Built);
}

#[tokio::test]
async fn test_cancelled_job_propagates() {
    let fixture = Fixture::new(None);
    fixture.driver.cancel_next();

    let err = assert_err!(fixture.build(fixture.kernel).await);
    assert!(err.is_cancelled());
    assert_eq!(err.to_string(), "job producing 'mapalgebra/kernel-1' was cancelled");
    assert!(fixture.graph.get(fixture.kernel).unwrap().output().is_none());
}

#[tokio::test]
async fn test_progress_hooks() {
    let fixture = Fixture::new(None);
    let progress = CountingProgress::default();

    assert_ok!(fixture.build_with(fixture.kernel, &progress).await);
    assert_ok!(fixture.build_with(fixture.kernel, &progress).await);

    assert_eq!(progress.started.load(Ordering::SeqCst), 2);
    assert_eq!(progress.completed.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_progress_not_completed_on_failure() {
    let fixture = Fixture::new(None);
    let progress = CountingProgress::default();
    fixture.driver.fail_next("disk full");

    assert_err!(fixture.build_with(fixture.kernel, &progress).await);

    assert_eq!(progress.started.load(Ordering::SeqCst), 1);
    assert_eq!(progress.completed.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_calculate_inputs_before_and_after_naming() {
    let mut fixture = Fixture::new(None);
    let kernel = fixture.kernel;

    assert!(fixture.graph.get(kernel).unwrap().calculate_inputs().is_empty());

    fixture.graph.set_output_name(kernel, "saved/smooth").unwrap();
    let expected = BTreeSet::from(["saved/smooth".to_string()]);
    assert_eq!(fixture.graph.get(kernel).unwrap().calculate_inputs(), expected);

    assert_ok!(fixture.build(kernel).await);
    assert_eq!(fixture.graph.get(kernel).unwrap().calculate_inputs(), expected);
    assert_eq!(fixture.driver.submissions()[0].output, "saved/smooth");
}

#[tokio::test]
async fn test_concurrent_builds_submit_once() {
    let fixture = Arc::new(Fixture::new(Some(Duration::from_millis(50))));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let fixture = fixture.clone();
            tokio::spawn(async move { fixture.build(fixture.kernel).await })
        })
        .collect();

    for handle in handles {
        assert_ok!(handle.await.unwrap());
    }

    assert_eq!(fixture.driver.submission_count(), 1);
}

#[tokio::test]
async fn test_unconfigured_kernel_fails_build() {
    let mut fixture = Fixture::new(None);

    let bare = fixture.graph.add_node(Box::new(KernelMapOp::default()));
    let err = assert_err!(fixture.build(bare).await);
    assert!(matches!(err, MapAlgebraError::NotConfigured(_)));
    assert_eq!(err.to_string(), "kernel arguments have not been processed");

    let mut detached = KernelMapOp::default();
    detached
        .process_children(&[
            ParsedNode::string("gaussian"),
            ParsedNode::raster("elevation"),
            ParsedNode::Number(1.0),
        ])
        .unwrap();
    let detached = fixture.graph.add_node(Box::new(detached));
    let err = assert_err!(fixture.build(detached).await);
    assert!(matches!(err, MapAlgebraError::NotConfigured(_)));
    assert!(!err.is_retryable());

    assert_eq!(fixture.driver.submission_count(), 0);
}
