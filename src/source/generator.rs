//! Random word generator
//!
//! Inserts a random dictionary word into the store after a random pause,
//! until cancelled.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use super::store::DocumentStore;
use super::SourceError;

/// Read a word list: one word per line, trimmed, blank lines skipped
pub fn load_words(path: &Path) -> Result<Vec<String>, SourceError> {
    let content = std::fs::read_to_string(path).map_err(|e| SourceError::WordList {
        path: path.to_path_buf(),
        error: e.to_string(),
    })?;

    let words: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect();

    if words.is_empty() {
        return Err(SourceError::EmptyWordList(path.to_path_buf()));
    }
    Ok(words)
}

pub struct WordGenerator {
    store: Arc<DocumentStore>,
    words: Vec<String>,
    max_pause: Duration,
    rng: StdRng,
}

impl WordGenerator {
    pub fn new(
        store: Arc<DocumentStore>,
        words: Vec<String>,
        max_pause: Duration,
    ) -> Result<Self, SourceError> {
        Self::with_rng(store, words, max_pause, StdRng::from_entropy())
    }

    /// Deterministic generator for reproducible runs
    pub fn with_seed(
        store: Arc<DocumentStore>,
        words: Vec<String>,
        max_pause: Duration,
        seed: u64,
    ) -> Result<Self, SourceError> {
        Self::with_rng(store, words, max_pause, StdRng::seed_from_u64(seed))
    }

    fn with_rng(
        store: Arc<DocumentStore>,
        words: Vec<String>,
        max_pause: Duration,
        rng: StdRng,
    ) -> Result<Self, SourceError> {
        if words.is_empty() {
            return Err(SourceError::EmptyWordList(Default::default()));
        }
        Ok(Self {
            store,
            words,
            max_pause,
            rng,
        })
    }

    /// Pick the next word
    pub fn next_word(&mut self) -> &str {
        let index = self.rng.gen_range(0..self.words.len());
        &self.words[index]
    }

    /// Pause before the next insert, uniform in `[0, max_pause)`
    pub fn next_pause(&mut self) -> Duration {
        let max = self.max_pause.as_millis() as u64;
        if max == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(self.rng.gen_range(0..max))
    }

    /// Insert one word now
    pub async fn step(&mut self) {
        let word = self.next_word().to_string();
        let doc = self.store.insert_word(&word).await;
        tracing::info!(word = %doc.word, id = %doc.id, "Inserted word");
    }

    /// Insert words until cancelled
    pub async fn run(mut self, cancel: CancellationToken) {
        tracing::info!(
            words = self.words.len(),
            max_pause_ms = self.max_pause.as_millis() as u64,
            "Word generator started"
        );

        loop {
            self.step().await;

            let pause = self.next_pause();
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(pause) => {}
            }
        }

        let stored = self.store.len().await;
        tracing::info!(stored, "Word generator stopped");
    }
}
