//! HMAC-SHA256 webhook signature verification.
//!
//! Signatures travel as `sha256=<lower-case hex digest>` and are computed over
//! the raw request body. The presented digest is compared against the
//! computed one in constant time.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Algorithm prefix every accepted signature must carry.
pub const SIGNATURE_PREFIX: &str = "sha256=";

/// Why a request failed the signature gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    /// No signature header, or an empty one.
    #[error("missing signature")]
    Missing,
    /// Signature lacks the `sha256=` prefix.
    #[error("malformed signature")]
    Malformed,
    /// Digest does not match the body.
    #[error("invalid signature")]
    Mismatch,
}

/// Compute the lower-case hex HMAC-SHA256 digest of `body` under `secret`.
pub fn compute_signature(body: &[u8], secret: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC key size is always valid");
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

/// Render the full header value (`sha256=<hex>`) for `body`.
pub fn signature_header_value(body: &[u8], secret: &[u8]) -> String {
    format!("{}{}", SIGNATURE_PREFIX, compute_signature(body, secret))
}

/// Verify a presented `sha256=<hex>` signature against `body`.
///
/// Returns false on mismatch, missing prefix or an empty value. Never errors.
pub fn verify_signature(body: &[u8], presented: &str, secret: &[u8]) -> bool {
    let Some(digest) = presented.strip_prefix(SIGNATURE_PREFIX) else {
        return false;
    };
    if digest.is_empty() {
        return false;
    }

    let expected = compute_signature(body, secret);
    constant_time_compare(digest, &expected)
}

/// Constant-time string comparison to prevent timing attacks
///
/// SECURITY: runs in time independent of how many leading bytes match.
/// Length differences are folded into the same constant-time result.
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    use subtle::ConstantTimeEq;

    let max_len = std::cmp::max(a.len(), b.len());

    // Pad with different bytes so unequal lengths can never compare equal
    let mut a_padded = vec![0u8; max_len];
    let mut b_padded = vec![0xFFu8; max_len];

    a_padded[..a.len()].copy_from_slice(a.as_bytes());
    b_padded[..b.len()].copy_from_slice(b.as_bytes());

    let lengths_equal = a.len().ct_eq(&b.len());
    let contents_equal = a_padded.ct_eq(&b_padded);

    (lengths_equal & contents_equal).into()
}

/// Signature gate holding the shared secret.
#[derive(Clone)]
pub struct SignatureVerifier {
    secret: Vec<u8>,
}

impl SignatureVerifier {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    pub fn verify(&self, body: &[u8], presented: &str) -> bool {
        verify_signature(body, presented, &self.secret)
    }

    /// Like [`verify`](Self::verify) but reports why a request was rejected.
    pub fn check(&self, body: &[u8], presented: Option<&str>) -> Result<(), SignatureError> {
        let presented = match presented {
            Some(value) if !value.is_empty() => value,
            _ => return Err(SignatureError::Missing),
        };

        if !presented.starts_with(SIGNATURE_PREFIX) {
            return Err(SignatureError::Malformed);
        }

        if self.verify(body, presented) {
            Ok(())
        } else {
            Err(SignatureError::Mismatch)
        }
    }

    /// Sign `body` with this verifier's secret.
    pub fn sign(&self, body: &[u8]) -> String {
        signature_header_value(body, &self.secret)
    }
}

impl std::fmt::Debug for SignatureVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignatureVerifier")
            .field("secret", &"<redacted>")
            .finish()
    }
}
