//! In-memory render cache.
//!
//! Provides [`DiagramKey`] for computing content-based hashes and
//! [`RenderCache`] for reusing engine output across identical diagrams.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use sha2::{Digest, Sha256};

/// Parameters that affect rendered output.
#[derive(Debug, Clone, Copy)]
pub struct DiagramKey<'a> {
    /// Trimmed diagram source.
    pub source: &'a str,
    /// Resolved theme preset name ("dark" or "light").
    pub theme: &'a str,
}

impl DiagramKey<'_> {
    /// Compute a content hash for this key.
    ///
    /// # Hash Format
    ///
    /// SHA-256 of `"{theme}:{source}"`, hex-encoded.
    #[must_use]
    pub fn compute_hash(&self) -> String {
        let content = format!("{}:{}", self.theme, self.source);
        let mut hasher = Sha256::new();
        hasher.update(content.as_bytes());
        hex::encode(hasher.finalize())
    }
}

/// Successful engine output keyed by [`DiagramKey`] hash.
///
/// Only successes are stored; a failed diagram is retried on the next render.
#[derive(Debug, Default)]
pub struct RenderCache {
    entries: Mutex<HashMap<String, String>>,
}

impl RenderCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, key: &DiagramKey<'_>) -> Option<String> {
        self.lock().get(&key.compute_hash()).cloned()
    }

    pub fn insert(&self, key: &DiagramKey<'_>, output: String) {
        self.lock().insert(key.compute_hash(), output);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
