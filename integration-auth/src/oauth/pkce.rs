//! PKCE (Proof Key for Code Exchange) support for OAuth 2.0.
//!
//! Implements the RFC 7636 `S256` method. The verifier is treated as an opaque
//! URL-safe string from generation until it is sent with the token exchange.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use sha2::{Digest, Sha256};

use super::random_token;

/// Value of the `code_challenge_method` parameter.
pub const CHALLENGE_METHOD: &str = "S256";

/// PKCE code verifier (random string).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PkceVerifier(String);

impl PkceVerifier {
    /// Generate a new random PKCE verifier.
    ///
    /// 32 random bytes, base64url-encoded without padding (43 characters).
    pub fn generate() -> Self {
        Self(random_token())
    }

    /// Wrap a verifier read back from the store.
    pub fn from_string(verifier: String) -> Self {
        Self(verifier)
    }

    /// Get the verifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Generate the corresponding code challenge.
    pub fn challenge(&self) -> PkceChallenge {
        PkceChallenge::from_verifier(self)
    }
}

/// PKCE code challenge (SHA256 hash of verifier).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PkceChallenge(String);

impl PkceChallenge {
    /// Create a code challenge from a verifier.
    ///
    /// base64url(SHA-256(verifier)) without padding.
    pub fn from_verifier(verifier: &PkceVerifier) -> Self {
        let hash = Sha256::digest(verifier.as_str().as_bytes());
        Self(URL_SAFE_NO_PAD.encode(hash))
    }

    /// Get the challenge string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check that `verifier` is the preimage of this challenge.
    pub fn is_satisfied_by(&self, verifier: &PkceVerifier) -> bool {
        Self::from_verifier(verifier) == *self
    }
}
