// Cross-cycle cache shared by concurrent engine cycles

use crate::normalize::normalize;
use dashmap::DashMap;
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Normalized names and raw source payloads shared between cycles
///
/// Each key has at most one writer: the first value published for a key is
/// the one every later reader sees. Readers never block on writers of other
/// keys.
#[derive(Debug, Default)]
pub struct EngineCache {
    names: DashMap<String, String>,
    payloads: DashMap<String, Arc<str>>,
    name_hits: AtomicU64,
    name_misses: AtomicU64,
}

impl EngineCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalized key for `raw`, computed once per distinct input
    pub fn normalized(&self, raw: &str) -> String {
        if let Some(key) = self.names.get(raw) {
            self.name_hits.fetch_add(1, Ordering::Relaxed);
            return key.clone();
        }
        self.name_misses.fetch_add(1, Ordering::Relaxed);
        self.names.entry(raw.to_string()).or_insert_with(|| normalize(raw)).clone()
    }

    /// Publish a raw payload; returns whichever payload won the key
    pub fn publish_payload(&self, key: &str, payload: impl Into<Arc<str>>) -> Arc<str> {
        self.payloads.entry(key.to_string()).or_insert_with(|| payload.into()).clone()
    }

    /// Publish a file's content under its path plus a digest of that content
    ///
    /// A rewritten file lands under a new key, so a later cycle never reads an
    /// earlier cycle's bytes. Identical content is shared.
    pub fn publish_content(&self, path: &str, content: impl Into<Arc<str>>) -> Arc<str> {
        let content = content.into();
        self.publish_payload(&Self::content_key(path, &content), content)
    }

    /// Cache key for `content` read from `path`
    pub fn content_key(path: &str, content: &str) -> String {
        let digest = Sha256::digest(content.as_bytes());
        let hex: String = digest.iter().take(8).map(|b| format!("{b:02x}")).collect();
        format!("{path}@{hex}")
    }

    pub fn payload(&self, key: &str) -> Option<Arc<str>> {
        self.payloads.get(key).map(|p| Arc::clone(p.value()))
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            names: self.names.len(),
            payloads: self.payloads.len(),
            name_hits: self.name_hits.load(Ordering::Relaxed),
            name_misses: self.name_misses.load(Ordering::Relaxed),
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub names: usize,
    pub payloads: usize,
    pub name_hits: u64,
    pub name_misses: u64,
}
