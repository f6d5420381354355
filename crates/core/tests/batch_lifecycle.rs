//! Batch lifecycle integration tests.
//!
//! These drive the orchestrator with a mock encoder and a recording sink:
//! - Every input gets exactly one outcome
//! - Worker count bounds concurrency but not results
//! - Failures, panics and timeouts stay confined to their file
//! - Cancellation skips tasks that have not started

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use transcoda_core::{
    batch::{expand_inputs, BatchEvent, BatchReport, ChannelSink, ProgressSink},
    testing::{MockBehavior, MockEncoder, RecordingSink},
    BatchConfig, BatchOrchestrator, Bitrate, FailureKind,
};

/// Temp input files plus an output directory.
struct TestHarness {
    _dir: TempDir,
    input_dir: PathBuf,
    output_dir: PathBuf,
}

impl TestHarness {
    fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let input_dir = dir.path().join("in");
        let output_dir = dir.path().join("out");
        std::fs::create_dir(&input_dir).unwrap();
        std::fs::create_dir(&output_dir).unwrap();
        Self {
            _dir: dir,
            input_dir,
            output_dir,
        }
    }

    fn inputs(&self, names: &[&str]) -> Vec<PathBuf> {
        names
            .iter()
            .map(|name| {
                let path = self.input_dir.join(name);
                std::fs::write(&path, b"audio").unwrap();
                path
            })
            .collect()
    }

    async fn run(
        &self,
        config: BatchConfig,
        encoder: &MockEncoder,
        inputs: &[PathBuf],
    ) -> (BatchReport, RecordingSink) {
        let orchestrator = BatchOrchestrator::new(config, encoder.clone());
        let mut sink = RecordingSink::new();
        let report = orchestrator
            .run_batch(inputs, &self.output_dir, &Bitrate::default(), &mut sink)
            .await
            .expect("batch should run");
        (report, sink)
    }
}

/// Successes and (file, message) failures as sets, ignoring completion order.
fn partition(report: &BatchReport) -> (BTreeSet<String>, BTreeSet<(String, String)>) {
    (
        report.successes.iter().cloned().collect(),
        report
            .failures
            .iter()
            .map(|f| (f.file_name.clone(), f.message.clone()))
            .collect(),
    )
}

#[tokio::test]
async fn test_mixed_batch_reports_each_file_once() {
    let harness = TestHarness::new();
    let inputs = harness.inputs(&["a.src", "b.src"]);
    let encoder = MockEncoder::new();
    encoder
        .set_behavior("b.src", MockBehavior::Fail("tool not found".to_string()))
        .await;

    let (report, sink) = harness
        .run(BatchConfig::default().with_max_workers(2), &encoder, &inputs)
        .await;

    assert_eq!(report.total, 2);
    assert_eq!(report.successes, vec!["a.mp3"]);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].file_name, "b.mp3");
    assert_eq!(report.failures[0].message, "tool not found");
    assert_eq!(report.failures[0].kind, FailureKind::Conversion);
    assert!(report.is_complete());
    assert!(!report.cancelled);

    assert_eq!(encoder.call_count().await, 2);
    let outputs: BTreeSet<_> = encoder
        .recorded_tasks()
        .await
        .into_iter()
        .map(|task| task.output_path)
        .collect();
    assert!(outputs.contains(&harness.output_dir.join("a.mp3")));
    assert!(outputs.contains(&harness.output_dir.join("b.mp3")));

    assert_eq!(sink.reports().len(), 1);
    assert_eq!(sink.report(), Some(&report));
}

#[tokio::test]
async fn test_empty_batch_only_completes() {
    let harness = TestHarness::new();
    let encoder = MockEncoder::new();

    let (report, sink) = harness.run(BatchConfig::default(), &encoder, &[]).await;

    assert_eq!(report.total, 0);
    assert!(report.successes.is_empty());
    assert!(report.failures.is_empty());
    assert!(report.all_succeeded());
    assert_eq!(sink.events.len(), 1);
    assert!(matches!(sink.events[0], BatchEvent::BatchComplete { .. }));
    assert_eq!(encoder.call_count().await, 0);
}

#[tokio::test]
async fn test_overall_progress_counts_up_once_per_file() {
    let harness = TestHarness::new();
    let names = ["1.src", "2.src", "3.src", "4.src", "5.src"];
    let inputs = harness.inputs(&names);
    let encoder = MockEncoder::new();
    encoder.set_conversion_delay(Duration::from_millis(5)).await;
    encoder
        .set_behavior("3.src", MockBehavior::Fail("bad".to_string()))
        .await;

    let (report, sink) = harness
        .run(BatchConfig::default().with_max_workers(3), &encoder, &inputs)
        .await;

    let expected: Vec<_> = (1..=names.len()).map(|k| (k, names.len())).collect();
    assert_eq!(sink.overall_progress(), expected);
    assert!(report.is_complete());

    // Completion is the final event.
    assert!(matches!(
        sink.events.last(),
        Some(BatchEvent::BatchComplete { .. })
    ));
}

#[tokio::test]
async fn test_each_file_starts_before_it_finishes() {
    let harness = TestHarness::new();
    let inputs = harness.inputs(&["a.src", "b.src", "c.src"]);
    let encoder = MockEncoder::new();
    encoder.set_conversion_delay(Duration::from_millis(5)).await;

    let (_report, sink) = harness
        .run(BatchConfig::default().with_max_workers(2), &encoder, &inputs)
        .await;

    let started: BTreeSet<_> = sink.started_files().into_iter().collect();
    assert_eq!(started.len(), 3);

    for name in ["a.mp3", "b.mp3", "c.mp3"] {
        let progress: Vec<f32> = sink
            .individual_progress()
            .into_iter()
            .filter(|(file, _)| file == name)
            .map(|(_, percent)| percent)
            .collect();
        assert_eq!(progress, vec![0.0, 100.0], "progress for {}", name);

        let start = sink
            .events
            .iter()
            .position(|e| matches!(e, BatchEvent::TaskStarted { file_name } if file_name == name))
            .unwrap();
        let done = sink
            .events
            .iter()
            .position(|e| {
                matches!(e, BatchEvent::IndividualProgress { file_name, percent }
                    if file_name == name && *percent == 100.0)
            })
            .unwrap();
        assert!(start < done);
    }
}

#[tokio::test]
async fn test_worker_count_changes_concurrency_not_results() {
    let harness = TestHarness::new();
    let names = ["a.src", "b.src", "c.src", "d.src", "e.src", "f.src"];
    let inputs = harness.inputs(&names);

    let mut partitions = Vec::new();
    for workers in [1, 3, names.len() + 4] {
        let encoder = MockEncoder::new();
        encoder.set_conversion_delay(Duration::from_millis(20)).await;
        encoder
            .set_behavior("b.src", MockBehavior::Fail("tool not found".to_string()))
            .await;
        encoder
            .set_behavior("e.src", MockBehavior::Fail("invalid data".to_string()))
            .await;

        let (report, _sink) = harness
            .run(BatchConfig::default().with_max_workers(workers), &encoder, &inputs)
            .await;

        assert!(
            encoder.peak_concurrency() <= workers,
            "peak {} exceeded {} workers",
            encoder.peak_concurrency(),
            workers
        );
        if workers == 1 {
            assert_eq!(encoder.peak_concurrency(), 1);
        }
        partitions.push(partition(&report));
    }

    assert!(partitions.windows(2).all(|pair| pair[0] == pair[1]));
    assert_eq!(partitions[0].0.len(), 4);
    assert_eq!(partitions[0].1.len(), 2);
}

#[tokio::test]
async fn test_rerun_gives_same_partition() {
    let harness = TestHarness::new();
    let inputs = harness.inputs(&["a.src", "b.src", "c.src"]);
    let encoder = MockEncoder::new();
    encoder
        .set_behavior("c.src", MockBehavior::Fail("nope".to_string()))
        .await;
    let config = BatchConfig::default().with_max_workers(2);

    let (first, _) = harness.run(config.clone(), &encoder, &inputs).await;
    let (second, _) = harness.run(config, &encoder, &inputs).await;

    assert_eq!(partition(&first), partition(&second));
    assert_ne!(first.batch_id, second.batch_id);
}

#[tokio::test]
async fn test_panic_is_confined_to_its_file() {
    let harness = TestHarness::new();
    let inputs = harness.inputs(&["a.src", "boom.src", "c.src"]);
    let encoder = MockEncoder::new();
    encoder
        .set_behavior("boom.src", MockBehavior::Panic("decoder exploded".to_string()))
        .await;

    let (report, sink) = harness
        .run(BatchConfig::default().with_max_workers(2), &encoder, &inputs)
        .await;

    assert_eq!(report.successes.len(), 2);
    assert_eq!(report.failures.len(), 1);
    let failure = &report.failures[0];
    assert_eq!(failure.file_name, "boom.mp3");
    assert_eq!(failure.kind, FailureKind::Fault);
    assert!(failure.message.contains("decoder exploded"));
    assert_eq!(sink.overall_progress().last(), Some(&(3, 3)));
}

#[tokio::test]
async fn test_timeout_fails_only_the_stuck_file() {
    let harness = TestHarness::new();
    let inputs = harness.inputs(&["a.src", "stuck.src"]);
    let encoder = MockEncoder::new();
    encoder.set_behavior("stuck.src", MockBehavior::Hang).await;

    let config = BatchConfig::default()
        .with_max_workers(2)
        .with_task_timeout(1);
    let (report, _sink) = harness.run(config, &encoder, &inputs).await;

    assert_eq!(report.successes, vec!["a.mp3"]);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].file_name, "stuck.mp3");
    assert_eq!(report.failures[0].kind, FailureKind::Timeout);
    assert_eq!(encoder.call_count().await, 2);
}

#[tokio::test]
async fn test_bad_inputs_fail_without_encoder_call() {
    let harness = TestHarness::new();
    let mut inputs = harness.inputs(&["ok.src"]);
    inputs.push(harness.input_dir.join("missing.src"));
    inputs.push(harness.input_dir.clone());
    inputs.push(PathBuf::new());

    let encoder = MockEncoder::new();
    let (report, sink) = harness
        .run(BatchConfig::default().with_max_workers(2), &encoder, &inputs)
        .await;

    assert_eq!(report.total, 4);
    assert_eq!(report.successes, vec!["ok.mp3"]);
    assert_eq!(report.failures.len(), 3);
    assert!(report
        .failures
        .iter()
        .all(|failure| failure.kind == FailureKind::Input));
    assert_eq!(encoder.call_count().await, 1);
    assert_eq!(sink.started_files(), vec!["ok.mp3"]);
    assert_eq!(sink.overall_progress().len(), 4);

    // Bad inputs go from pending straight to failed: no start, no 0%.
    let missing: Vec<f32> = sink
        .individual_progress()
        .into_iter()
        .filter(|(name, _)| name == "missing.mp3")
        .map(|(_, percent)| percent)
        .collect();
    assert_eq!(missing, vec![100.0]);
}

#[tokio::test]
async fn test_shared_output_path_fails_later_inputs() {
    let harness = TestHarness::new();
    for sub in ["x", "y"] {
        std::fs::create_dir(harness.input_dir.join(sub)).unwrap();
    }
    let inputs = harness.inputs(&["x/song.opus", "y/song.flac"]);
    let inputs = vec![inputs[0].clone(), inputs[1].clone(), inputs[0].clone()];

    let encoder = MockEncoder::new();
    let (report, sink) = harness
        .run(BatchConfig::default().with_max_workers(3), &encoder, &inputs)
        .await;

    assert!(report.is_complete());
    assert_eq!(report.successes, vec!["song.mp3"]);
    assert_eq!(report.failures.len(), 2);
    for failure in &report.failures {
        assert_eq!(failure.kind, FailureKind::Input);
        assert!(failure
            .message
            .starts_with("Output path already used by another input in this batch"));
    }

    // Only the first input that claimed the path reaches the encoder.
    let tasks = encoder.recorded_tasks().await;
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].input_path, inputs[0]);
    assert_eq!(tasks[0].output_path, harness.output_dir.join("song.mp3"));
    assert_eq!(sink.started_files(), vec!["song.mp3"]);
}

/// Notes when the first overall progress event arrives.
#[derive(Default)]
struct FirstProgressClock {
    first_overall: Option<Instant>,
}

impl ProgressSink for FirstProgressClock {
    fn on_individual_progress(&mut self, _file_name: &str, _percent: f32) {}

    fn on_overall_progress(&mut self, _completed: usize, _total: usize) {
        self.first_overall.get_or_insert_with(Instant::now);
    }

    fn on_batch_complete(&mut self, _report: &BatchReport) {}
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_progress_flows_while_inputs_are_still_checked() {
    let harness = TestHarness::new();
    let names: Vec<String> = (0..2000).map(|i| format!("track{:04}.src", i)).collect();
    let names: Vec<&str> = names.iter().map(String::as_str).collect();
    let inputs = harness.inputs(&names);

    let encoder = MockEncoder::new();
    let orchestrator =
        BatchOrchestrator::new(BatchConfig::default().with_max_workers(4), encoder.clone());
    let mut sink = FirstProgressClock::default();

    let start = Instant::now();
    let report = orchestrator
        .run_batch(&inputs, &harness.output_dir, &Bitrate::default(), &mut sink)
        .await
        .unwrap();
    let elapsed = start.elapsed();

    assert_eq!(report.successes.len(), 2000);
    let first = sink.first_overall.expect("progress was reported") - start;
    assert!(
        first < elapsed / 2,
        "first progress at {:?} of {:?}",
        first,
        elapsed
    );
}

#[tokio::test]
async fn test_cancel_before_run_skips_everything() {
    let harness = TestHarness::new();
    let inputs = harness.inputs(&["a.src", "b.src"]);
    let encoder = MockEncoder::new();

    let orchestrator = BatchOrchestrator::new(BatchConfig::default(), encoder.clone());
    orchestrator.cancel();

    let mut sink = RecordingSink::new();
    let report = orchestrator
        .run_batch(&inputs, &harness.output_dir, &Bitrate::default(), &mut sink)
        .await
        .unwrap();

    assert!(report.cancelled);
    assert!(report.is_complete());
    assert!(report.successes.is_empty());
    assert!(report
        .failures
        .iter()
        .all(|failure| failure.kind == FailureKind::Cancelled));
    assert_eq!(encoder.call_count().await, 0);
    assert!(sink.started_files().is_empty());
}

/// Cancels the batch as soon as the first file starts.
struct CancelOnFirstStart {
    token: CancellationToken,
    inner: RecordingSink,
}

impl ProgressSink for CancelOnFirstStart {
    fn on_task_started(&mut self, file_name: &str) {
        self.token.cancel();
        self.inner.on_task_started(file_name);
    }

    fn on_individual_progress(&mut self, file_name: &str, percent: f32) {
        self.inner.on_individual_progress(file_name, percent);
    }

    fn on_overall_progress(&mut self, completed: usize, total: usize) {
        self.inner.on_overall_progress(completed, total);
    }

    fn on_batch_complete(&mut self, report: &BatchReport) {
        self.inner.on_batch_complete(report);
    }
}

#[tokio::test]
async fn test_cancel_during_run_lets_running_file_finish() {
    let harness = TestHarness::new();
    let inputs = harness.inputs(&["a.src", "b.src", "c.src"]);
    let encoder = MockEncoder::new();
    encoder.set_conversion_delay(Duration::from_millis(100)).await;

    let token = CancellationToken::new();
    let orchestrator = BatchOrchestrator::new(BatchConfig::default().with_max_workers(1), encoder.clone())
        .with_cancellation(token.clone());

    let mut sink = CancelOnFirstStart {
        token,
        inner: RecordingSink::new(),
    };
    let report = orchestrator
        .run_batch(&inputs, &harness.output_dir, &Bitrate::default(), &mut sink)
        .await
        .unwrap();

    assert!(report.cancelled);
    assert!(report.is_complete());
    assert_eq!(report.successes.len(), 1);
    assert_eq!(report.failures.len(), 2);
    assert!(report
        .failures
        .iter()
        .all(|failure| failure.kind == FailureKind::Cancelled));
    assert_eq!(encoder.call_count().await, 1);
    assert_eq!(sink.inner.started_files().len(), 1);
}

#[tokio::test]
async fn test_channel_sink_streams_events() {
    let harness = TestHarness::new();
    let inputs = harness.inputs(&["a.src", "b.src"]);
    let orchestrator =
        BatchOrchestrator::new(BatchConfig::default().with_max_workers(2), MockEncoder::new());

    let (mut sink, mut events) = ChannelSink::channel();
    let collector = tokio::spawn(async move {
        let mut received = Vec::new();
        while let Some(event) = events.recv().await {
            received.push(event);
        }
        received
    });

    let report = orchestrator
        .run_batch(&inputs, &harness.output_dir, &Bitrate::default(), &mut sink)
        .await
        .unwrap();
    drop(sink);

    let received = collector.await.unwrap();
    assert_eq!(
        received.last(),
        Some(&BatchEvent::BatchComplete { report })
    );
    let overall = received
        .iter()
        .filter(|e| matches!(e, BatchEvent::OverallProgress { .. }))
        .count();
    assert_eq!(overall, 2);
}

#[tokio::test]
async fn test_directory_input_expands_before_batch() {
    let harness = TestHarness::new();
    harness.inputs(&["one.opus", "two.opus", "cover.jpg"]);
    let encoder = MockEncoder::new();

    let inputs = expand_inputs(
        &[harness.input_dir.clone()],
        &BatchConfig::default().input_extensions,
    )
    .await
    .unwrap();
    assert_eq!(inputs.len(), 2);

    let (report, _sink) = harness
        .run(BatchConfig::default(), &encoder, &inputs)
        .await;
    let successes: BTreeSet<_> = report.successes.iter().map(String::as_str).collect();
    assert_eq!(successes, BTreeSet::from(["one.mp3", "two.mp3"]));
}
