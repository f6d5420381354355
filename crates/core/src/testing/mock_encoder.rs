//! Mock encoder for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::encoder::{AudioFormat, ConversionTask, Encoder, EncoderError};

/// What the mock does when asked to convert a given input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockBehavior {
    /// Report success.
    Succeed,
    /// Fail with a conversion error carrying this message.
    Fail(String),
    /// Panic with this message.
    Panic(String),
    /// Never finish.
    Hang,
}

/// Mock implementation of the [`Encoder`] trait.
///
/// Behavior is configured per input file name (e.g. `b.src`); unconfigured
/// inputs succeed. Clones share state, so a test can keep a handle while
/// the orchestrator owns another.
///
/// # Example
///
/// ```rust,ignore
/// use transcoda_core::testing::{MockBehavior, MockEncoder};
///
/// let encoder = MockEncoder::new();
/// encoder.set_behavior("b.src", MockBehavior::Fail("tool not found".into())).await;
///
/// // Run a batch with encoder.clone()...
///
/// assert_eq!(encoder.call_count().await, 2);
/// ```
#[derive(Debug, Clone)]
pub struct MockEncoder {
    /// Tasks passed to `convert`, in call order.
    calls: Arc<RwLock<Vec<ConversionTask>>>,
    /// Configured behavior by input file name.
    behaviors: Arc<RwLock<HashMap<String, MockBehavior>>>,
    /// Simulated conversion time.
    delay: Arc<RwLock<Duration>>,
    /// If set, `validate` fails with this message.
    validate_error: Arc<RwLock<Option<String>>>,
    /// Formats reported by `supported_output_formats`.
    formats: Arc<Vec<AudioFormat>>,
    active: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl Default for MockEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl MockEncoder {
    /// Create a mock where every conversion succeeds immediately.
    pub fn new() -> Self {
        Self {
            calls: Arc::new(RwLock::new(Vec::new())),
            behaviors: Arc::new(RwLock::new(HashMap::new())),
            delay: Arc::new(RwLock::new(Duration::ZERO)),
            validate_error: Arc::new(RwLock::new(None)),
            formats: Arc::new(AudioFormat::ALL.to_vec()),
            active: Arc::new(AtomicUsize::new(0)),
            peak: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Restrict the formats the mock claims to produce.
    pub fn with_supported_formats(mut self, formats: &[AudioFormat]) -> Self {
        self.formats = Arc::new(formats.to_vec());
        self
    }

    /// Configure the behavior for one input file name.
    pub async fn set_behavior(&self, input_file_name: impl Into<String>, behavior: MockBehavior) {
        self.behaviors
            .write()
            .await
            .insert(input_file_name.into(), behavior);
    }

    /// Set how long each conversion takes.
    pub async fn set_conversion_delay(&self, delay: Duration) {
        *self.delay.write().await = delay;
    }

    /// Make `validate` fail with the given message.
    pub async fn set_validate_error(&self, message: impl Into<String>) {
        *self.validate_error.write().await = Some(message.into());
    }

    /// Number of `convert` calls so far.
    pub async fn call_count(&self) -> usize {
        self.calls.read().await.len()
    }

    /// Tasks passed to `convert`, in call order.
    pub async fn recorded_tasks(&self) -> Vec<ConversionTask> {
        self.calls.read().await.clone()
    }

    /// Highest number of conversions seen running at once.
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    async fn behavior_for(&self, task: &ConversionTask) -> MockBehavior {
        let name = task
            .input_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        self.behaviors
            .read()
            .await
            .get(&name)
            .cloned()
            .unwrap_or(MockBehavior::Succeed)
    }
}

/// Tracks one running conversion; decrements on drop so panics and
/// cancellations are counted too.
struct ActiveGuard<'a>(&'a AtomicUsize);

impl<'a> ActiveGuard<'a> {
    fn enter(active: &'a AtomicUsize, peak: &AtomicUsize) -> Self {
        let now = active.fetch_add(1, Ordering::SeqCst) + 1;
        peak.fetch_max(now, Ordering::SeqCst);
        Self(active)
    }
}

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Encoder for MockEncoder {
    fn name(&self) -> &str {
        "mock"
    }

    async fn convert(&self, task: &ConversionTask) -> Result<String, EncoderError> {
        let _guard = ActiveGuard::enter(&self.active, &self.peak);
        self.calls.write().await.push(task.clone());

        let behavior = self.behavior_for(task).await;
        let delay = *self.delay.read().await;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        match behavior {
            MockBehavior::Succeed => Ok(format!(
                "Successfully converted '{}' to '{}'",
                task.input_path.display(),
                task.output_path.display()
            )),
            MockBehavior::Fail(message) => Err(EncoderError::conversion_failed(message, Some(1))),
            MockBehavior::Panic(message) => panic!("{}", message),
            MockBehavior::Hang => {
                futures::future::pending::<()>().await;
                unreachable!("pending future never resolves")
            }
        }
    }

    async fn validate(&self) -> Result<(), EncoderError> {
        match self.validate_error.read().await.as_ref() {
            Some(message) => Err(EncoderError::conversion_failed(message.clone(), None)),
            None => Ok(()),
        }
    }

    fn supported_output_formats(&self) -> &[AudioFormat] {
        &self.formats
    }
}
