//! Shared secret for job-to-job calls

use sha2::{Digest, Sha256};

/// Secret presented in the `x-internal-secret` header.
///
/// Only the SHA-256 digest is kept; candidates are compared digest to
/// digest over every byte, so timing does not depend on a matching prefix.
#[derive(Clone)]
pub struct InternalSecret {
    digest: [u8; 32],
}

impl InternalSecret {
    /// `None` for an empty secret, which disables internal calls
    pub fn new(secret: &str) -> Option<Self> {
        if secret.is_empty() {
            return None;
        }
        Some(Self {
            digest: Sha256::digest(secret.as_bytes()).into(),
        })
    }

    pub fn matches(&self, candidate: &str) -> bool {
        let candidate: [u8; 32] = Sha256::digest(candidate.as_bytes()).into();
        self.digest
            .iter()
            .zip(candidate.iter())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }
}

impl std::fmt::Debug for InternalSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("InternalSecret(..)")
    }
}
