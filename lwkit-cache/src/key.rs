//! Cache key derivation.
//!
//! A [`CacheKey`] is the sanitized file stem of a cache entry. Keys for
//! reference data are scoped to a credential: the only public constructor
//! for them requires the API URL and token, so listing data fetched with one
//! token can never be served to another.

use sha2::{Digest, Sha256};

use crate::entry::PayloadKind;

/// Stem used when sanitization leaves nothing.
const EMPTY_KEY_STEM: &str = "_";

/// A sanitized cache key.
///
/// Contains only ASCII alphanumerics plus `_`, `-` and `.`, so it is always
/// a safe single path component.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
    stem: String,
}

impl CacheKey {
    /// Derive a key from a caller-supplied logical key.
    ///
    /// Characters outside `[A-Za-z0-9_.-]` are dropped. A key that sanitizes
    /// to nothing, or to only dots, maps to `_`.
    pub fn new(logical: &str) -> Self {
        let stem: String = logical
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
            .collect();
        if stem.chars().all(|c| c == '.') {
            return Self {
                stem: EMPTY_KEY_STEM.to_string(),
            };
        }
        Self { stem }
    }

    /// Key for one kind of reference data fetched with one credential.
    ///
    /// Format: `{kind}_{api_url}_{sha256(token)}`, then sanitized.
    pub fn scoped(kind: PayloadKind, api_url: &str, api_token: &str) -> Self {
        Self::new(&format!(
            "{}_{}_{}",
            kind.as_str(),
            api_url,
            credential_digest(api_token)
        ))
    }

    /// The sanitized stem.
    pub fn as_str(&self) -> &str {
        &self.stem
    }

    /// File name of the entry backing this key.
    pub fn file_name(&self) -> String {
        format!("{}.json", self.stem)
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.stem)
    }
}

/// Full SHA-256 hex digest of a credential.
pub fn credential_digest(api_token: &str) -> String {
    hex::encode(Sha256::digest(api_token.as_bytes()))
}
