//! Instrumented speech backend for tests.
//!
//! Echoes the request text back as "audio", so assembled output can be
//! compared against the source text. Delays and failures are keyed by the
//! chunk text.

use super::{SpeechRequest, SpeechSynthesizer, SynthesisError, Voice};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Default)]
pub struct MockSynthesizer {
    delay: Duration,
    delays: HashMap<String, Duration>,
    failures: HashSet<String>,
    voices: Mutex<Vec<Voice>>,
    call_count: AtomicUsize,
    in_flight: AtomicUsize,
    high_water: AtomicUsize,
}

impl MockSynthesizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay applied to every call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Delay applied to calls whose text equals `text`, replacing the default.
    pub fn with_delay_for(mut self, text: &str, delay: Duration) -> Self {
        self.delays.insert(text.to_string(), delay);
        self
    }

    /// Fail calls whose text equals `text`.
    pub fn failing_on(mut self, text: &str) -> Self {
        self.failures.insert(text.to_string());
        self
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Most calls ever observed in flight at once.
    pub fn high_water_mark(&self) -> usize {
        self.high_water.load(Ordering::SeqCst)
    }

    pub fn voices(&self) -> Vec<Voice> {
        self.voices.lock().unwrap().clone()
    }
}

#[async_trait]
impl SpeechSynthesizer for MockSynthesizer {
    async fn synthesize(&self, request: &SpeechRequest<'_>) -> Result<Vec<u8>, SynthesisError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.voices.lock().unwrap().push(request.voice);

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.high_water.fetch_max(now, Ordering::SeqCst);

        let delay = self.delays.get(request.text).copied().unwrap_or(self.delay);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failures.contains(request.text) {
            return Err(SynthesisError::Api {
                status: Some(500),
                message: format!("mock failure for {:?}", request.text),
            });
        }

        Ok(request.text.as_bytes().to_vec())
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
