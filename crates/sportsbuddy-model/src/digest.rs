use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use sha2::{Digest as Sha2Digest, Sha256};
use uuid::Uuid;

/// Domain separator for secret hashing: `b"sportsbuddy:secret:v1\0"`.
const SECRET_DOMAIN_SEPARATOR: &[u8] = b"sportsbuddy:secret:v1\0";

/// Salted SHA-256 digest of a login secret, base64url without padding.
///
/// Formula: `sha256(domain_separator || salt || secret)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretDigest {
    /// Base64url salt.
    pub salt: String,
    /// Base64url digest.
    #[serde(rename = "b64")]
    pub b64: String,
}

impl SecretDigest {
    /// Hashes `secret` under a fresh random salt.
    pub fn new(secret: &str) -> Self {
        let salt = URL_SAFE_NO_PAD.encode(Uuid::new_v4().as_bytes());
        Self::with_salt(secret, salt)
    }

    /// Hashes `secret` under the given base64url salt.
    pub fn with_salt(secret: &str, salt: impl Into<String>) -> Self {
        let salt = salt.into();
        let mut hasher = Sha256::new();
        hasher.update(SECRET_DOMAIN_SEPARATOR);
        hasher.update(salt.as_bytes());
        hasher.update(secret.as_bytes());
        let b64 = URL_SAFE_NO_PAD.encode(hasher.finalize());
        Self { salt, b64 }
    }

    /// True if `secret` hashes to this digest.
    pub fn verify(&self, secret: &str) -> bool {
        let candidate = Self::with_salt(secret, self.salt.clone());
        let (a, b) = (candidate.b64.as_bytes(), self.b64.as_bytes());
        // constant-time over equal-length digests
        a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_accepts_original_secret() {
        let digest = SecretDigest::new("hunter22");
        assert!(digest.verify("hunter22"));
        assert!(!digest.verify("hunter23"));
        assert_eq!(digest.b64.len(), 43);
    }

    #[test]
    fn salt_changes_digest() {
        let a = SecretDigest::new("same");
        let b = SecretDigest::new("same");
        assert_ne!(a.salt, b.salt);
        assert_ne!(a.b64, b.b64);
    }

    #[test]
    fn with_salt_is_deterministic() {
        let a = SecretDigest::with_salt("pw", "c2FsdA");
        let b = SecretDigest::with_salt("pw", "c2FsdA");
        assert_eq!(a, b);
    }
}
