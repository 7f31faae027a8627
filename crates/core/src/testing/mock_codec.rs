//! Mock codec for testing.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::classify::MediaClass;
use crate::codec::{CodecError, ImageCodec, VideoCodec};

/// A recorded codec call for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecCall {
    /// Which family was asked for.
    pub class: MediaClass,
    /// Bytes handed to the codec.
    pub input: Vec<u8>,
    /// Whether the call succeeded.
    pub success: bool,
}

/// Mock implementation of both codec traits.
///
/// Provides controllable behavior for testing:
/// - Track calls for assertions
/// - Fail specific inputs or the next call
/// - Fail or count initialization
/// - Simulate slow conversions
///
/// Output is the input prefixed with `jpeg:` or `mp4:`.
#[derive(Debug, Clone)]
pub struct MockCodec {
    calls: Arc<RwLock<Vec<CodecCall>>>,
    /// Inputs that always fail to convert.
    failing_inputs: Arc<RwLock<HashSet<Vec<u8>>>>,
    /// If set, the next conversion will fail with this error.
    next_error: Arc<RwLock<Option<CodecError>>>,
    /// If set, the next initialization will fail with this error.
    next_init_error: Arc<RwLock<Option<CodecError>>>,
    initialized: Arc<RwLock<bool>>,
    init_count: Arc<RwLock<usize>>,
    /// Simulated conversion duration in milliseconds.
    conversion_duration_ms: Arc<RwLock<u64>>,
}

impl Default for MockCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCodec {
    /// Create a new mock codec.
    pub fn new() -> Self {
        Self {
            calls: Arc::new(RwLock::new(Vec::new())),
            failing_inputs: Arc::new(RwLock::new(HashSet::new())),
            next_error: Arc::new(RwLock::new(None)),
            next_init_error: Arc::new(RwLock::new(None)),
            initialized: Arc::new(RwLock::new(false)),
            init_count: Arc::new(RwLock::new(0)),
            conversion_duration_ms: Arc::new(RwLock::new(0)),
        }
    }

    /// Get all recorded calls.
    pub async fn calls(&self) -> Vec<CodecCall> {
        self.calls.read().await.clone()
    }

    /// Number of conversions attempted.
    pub async fn call_count(&self) -> usize {
        self.calls.read().await.len()
    }

    /// Number of successful initializations.
    pub async fn init_count(&self) -> usize {
        *self.init_count.read().await
    }

    /// Make every conversion of `input` fail.
    pub async fn fail_on_input(&self, input: &[u8]) {
        self.failing_inputs.write().await.insert(input.to_vec());
    }

    /// Configure the next conversion to fail with the given error.
    pub async fn set_next_error(&self, error: CodecError) {
        *self.next_error.write().await = Some(error);
    }

    /// Configure the next initialization to fail with the given error.
    pub async fn set_next_init_error(&self, error: CodecError) {
        *self.next_init_error.write().await = Some(error);
    }

    /// Set the simulated conversion duration.
    pub async fn set_conversion_duration(&self, duration: Duration) {
        *self.conversion_duration_ms.write().await = duration.as_millis() as u64;
    }

    async fn initialize(&self) -> Result<(), CodecError> {
        let mut initialized = self.initialized.write().await;
        if *initialized {
            return Ok(());
        }
        if let Some(err) = self.next_init_error.write().await.take() {
            return Err(err);
        }
        *initialized = true;
        *self.init_count.write().await += 1;
        Ok(())
    }

    async fn convert(&self, class: MediaClass, input: &[u8]) -> Result<Vec<u8>, CodecError> {
        self.initialize().await?;

        let duration_ms = *self.conversion_duration_ms.read().await;
        if duration_ms > 0 {
            tokio::time::sleep(Duration::from_millis(duration_ms)).await;
        }

        let result = if let Some(err) = self.next_error.write().await.take() {
            Err(err)
        } else if self.failing_inputs.read().await.contains(input) {
            Err(CodecError::Decode {
                reason: "simulated failure".to_string(),
            })
        } else {
            let tag: &[u8] = match class {
                MediaClass::Image => b"jpeg:",
                _ => b"mp4:",
            };
            Ok([tag, input].concat())
        };

        self.calls.write().await.push(CodecCall {
            class,
            input: input.to_vec(),
            success: result.is_ok(),
        });
        result
    }
}

#[async_trait]
impl ImageCodec for MockCodec {
    fn name(&self) -> &str {
        "mock"
    }

    async fn ensure_initialized(&self) -> Result<(), CodecError> {
        self.initialize().await
    }

    async fn convert_image(&self, input: &[u8]) -> Result<Vec<u8>, CodecError> {
        self.convert(MediaClass::Image, input).await
    }
}

#[async_trait]
impl VideoCodec for MockCodec {
    fn name(&self) -> &str {
        "mock"
    }

    async fn ensure_initialized(&self) -> Result<(), CodecError> {
        self.initialize().await
    }

    async fn convert_video(&self, input: &[u8]) -> Result<Vec<u8>, CodecError> {
        self.convert(MediaClass::Video, input).await
    }
}
