/*!
 * Mock backend for testing.
 *
 * Simulates the behaviors the fallback chain has to cope with:
 * - `MockProvider::working()` - Always succeeds with a tagged echo of the text
 * - `MockProvider::replacing(pairs)` - Succeeds by substring replacement
 * - `MockProvider::failing(err)` - Always fails with the given error
 * - `MockProvider::empty()` - Answers with an empty string
 *
 * Clones share the call recorder, so a test can keep one handle and give the
 * other to the service.
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::errors::ProviderError;
use crate::providers::TranslationBackend;
use crate::translation::document::TranslationRequest;

/// Behavior mode for the mock provider
#[derive(Debug, Clone, PartialEq)]
pub enum MockBehavior {
    /// Answers `[EN] <text>` (target language upper-cased)
    Working,
    /// Replaces every `from` with `to` in the text
    Replacing(Vec<(String, String)>),
    /// Always fails with an error
    Failing(ProviderError),
    /// Returns empty response
    Empty,
}

/// Mock provider for testing translation behavior
#[derive(Debug, Clone)]
pub struct MockProvider {
    name: String,
    behavior: MockBehavior,
    /// Fail every whole-document request with a 500
    fail_documents: bool,
    /// Simulated latency per call
    delay: Option<Duration>,
    calls: Arc<Mutex<Vec<TranslationRequest>>>,
    in_flight: Arc<AtomicUsize>,
    peak_in_flight: Arc<AtomicUsize>,
}

impl MockProvider {
    /// Create a new mock provider with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            name: "mock".to_string(),
            behavior,
            fail_documents: false,
            delay: None,
            calls: Arc::new(Mutex::new(Vec::new())),
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    pub fn replacing(pairs: &[(&str, &str)]) -> Self {
        Self::new(MockBehavior::Replacing(
            pairs.iter().map(|(from, to)| (from.to_string(), to.to_string())).collect(),
        ))
    }

    pub fn failing(error: ProviderError) -> Self {
        Self::new(MockBehavior::Failing(error))
    }

    /// Fails like a hosted backend without a credential
    pub fn unauthenticated() -> Self {
        Self::failing(ProviderError::AuthMissing("mock".to_string()))
    }

    pub fn empty() -> Self {
        Self::new(MockBehavior::Empty)
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Reject whole-document requests, forcing the line tier
    pub fn failing_documents(mut self) -> Self {
        self.fail_documents = true;
        self
    }

    /// Sleep before answering
    pub fn with_delay(mut self, delay_ms: u64) -> Self {
        self.delay = Some(Duration::from_millis(delay_ms));
        self
    }

    /// Every request received so far
    pub fn calls(&self) -> Vec<TranslationRequest> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn document_call_count(&self) -> usize {
        self.calls.lock().iter().filter(|r| r.is_document()).count()
    }

    /// Highest number of calls that were running at the same time
    pub fn peak_concurrency(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    fn respond(&self, request: &TranslationRequest) -> Result<String, ProviderError> {
        if self.fail_documents && request.is_document() {
            return Err(ProviderError::UpstreamError {
                status_code: 500,
                body: "document mode disabled".to_string(),
            });
        }

        match &self.behavior {
            MockBehavior::Working => Ok(format!(
                "[{}] {}",
                request.target_language.to_uppercase(),
                request.text
            )),
            MockBehavior::Replacing(pairs) => Ok(pairs
                .iter()
                .fold(request.text.clone(), |text, (from, to)| text.replace(from, to))),
            MockBehavior::Failing(error) => Err(error.clone()),
            MockBehavior::Empty => Ok(String::new()),
        }
    }
}

#[async_trait]
impl TranslationBackend for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn translate(&self, request: &TranslationRequest) -> Result<String, ProviderError> {
        self.calls.lock().push(request.clone());

        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(running, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let result = self.respond(request);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}
