use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt;

use crate::process::ReshapeOptions;

/// Hex SHA-256 over the source bytes plus every option that changes the
/// canonical table.
///
/// Only `compute` and `parse` construct one, so the value is always 64 hex digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn compute(source: &[u8], opts: &ReshapeOptions) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(source);
        hasher.update(b"\0row_limit=");
        match opts.row_limit {
            Some(n) => hasher.update(n.to_string().as_bytes()),
            None => hasher.update(b"none"),
        }
        hasher.update(b"\0world_rows=");
        hasher.update(opts.world_rows.as_str().as_bytes());
        hasher.update(b"\0zip_entry=");
        hasher.update(opts.zip_entry.as_deref().unwrap_or("").as_bytes());

        let digest = hasher.finalize();
        Fingerprint(digest.iter().map(|b| format!("{:02x}", b)).collect())
    }

    /// Accept a previously rendered fingerprint, e.g. a snapshot file stem.
    pub fn parse(s: &str) -> Option<Self> {
        (s.len() == 64 && s.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()))
            .then(|| Fingerprint(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 hex digits, for log lines.
    pub fn short(&self) -> &str {
        &self.0[..12]
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
