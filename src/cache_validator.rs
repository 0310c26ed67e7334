//! Integrity checking for cached profile JSON.
//!
//! Profile responses live in an in-memory cache keyed by URN between
//! contacts. Every entry records the URN it was stored under plus a SHA-256
//! checksum over the URN and payload together, so retrieval drops entries
//! that are corrupted, tampered with, or that surface under the wrong key,
//! and the profile is fetched fresh instead of being trusted.

use hex;
use sha2::{Digest, Sha256};

/// A cached payload bound to its cache key by a checksum.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ValidatedCacheEntry {
    /// URN the payload was cached under.
    pub key: String,
    /// The cached payload (profile JSON).
    pub data: String,
    /// SHA-256 over key and payload, hex encoded.
    pub checksum: String,
}

impl ValidatedCacheEntry {
    /// Creates an entry with a checksum covering both key and payload.
    ///
    /// ```
    /// use rust_wfm_linkedin::cache_validator::ValidatedCacheEntry;
    ///
    /// let entry = ValidatedCacheEntry::new("ACoAAA111", r#"{"firstName":"Jane"}"#.to_string());
    /// assert!(entry.is_valid());
    /// ```
    pub fn new(key: impl Into<String>, data: String) -> Self {
        let key = key.into();
        let checksum = Self::compute_checksum(&key, &data);
        Self {
            key,
            data,
            checksum,
        }
    }

    fn compute_checksum(key: &str, data: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(key.as_bytes());
        hasher.update(b"\n");
        hasher.update(data.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// True when the stored checksum still matches the key and payload.
    pub fn is_valid(&self) -> bool {
        Self::compute_checksum(&self.key, &self.data) == self.checksum
    }

    /// Serializes the entry for storage in the cache.
    pub fn serialize(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Deserializes an entry and verifies it belongs under `expected_key`.
    ///
    /// Returns `Some(payload)` only when the entry parses, was stored under
    /// the requested key, and its checksum matches. Anything else is logged
    /// and treated as a cache miss.
    pub fn deserialize_and_validate(serialized: &str, expected_key: &str) -> Option<String> {
        let entry: ValidatedCacheEntry = serde_json::from_str(serialized).ok()?;

        if entry.key != expected_key {
            tracing::warn!(
                "Cache entry stored under '{}' surfaced for '{}', discarding",
                entry.key,
                expected_key
            );
            return None;
        }
        if !entry.is_valid() {
            tracing::warn!(
                "Cache checksum mismatch for '{}' ({} bytes), discarding",
                entry.key,
                entry.data.len()
            );
            return None;
        }
        Some(entry.data)
    }
}
