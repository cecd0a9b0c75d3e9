//! Slack request signature verification
//!
//! Slack signs every Events API request with
//! `v0=` + hex(HMAC-SHA256(signing secret, `v0:{timestamp}:{body}`)) in the
//! `X-Slack-Signature` header. Requests whose timestamp is more than five
//! minutes away from the local clock are rejected to block replays.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Replay window in seconds.
const MAX_TIMESTAMP_SKEW_SECS: i64 = 300;

/// Verifies inbound webhook signatures against the signing secret.
#[derive(Clone)]
pub struct SignatureVerifier {
    signing_secret: String,
}

impl SignatureVerifier {
    pub fn new(signing_secret: impl Into<String>) -> Self {
        Self {
            signing_secret: signing_secret.into(),
        }
    }

    /// Verify a request signature
    ///
    /// `timestamp` and `signature` come from the `X-Slack-Request-Timestamp`
    /// and `X-Slack-Signature` headers; `body` is the raw request body. Fails
    /// on missing values, a timestamp outside the replay window, or a
    /// signature mismatch. The comparison is constant-time.
    pub fn verify(&self, body: &[u8], timestamp: &str, signature: &str) -> bool {
        if timestamp.is_empty() || signature.is_empty() {
            return false;
        }

        let Ok(ts) = timestamp.parse::<i64>() else {
            return false;
        };
        let now = chrono::Utc::now().timestamp();
        if (now - ts).abs() > MAX_TIMESTAMP_SKEW_SECS {
            return false;
        }

        let expected = self.sign(timestamp, body);
        expected.as_bytes().ct_eq(signature.as_bytes()).into()
    }

    /// Compute the `v0=` signature for a timestamp/body pair
    pub fn sign(&self, timestamp: &str, body: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(self.signing_secret.as_bytes())
            .expect("HMAC accepts any key length");
        mac.update(format!("v0:{timestamp}:").as_bytes());
        mac.update(body);
        format!("v0={}", hex::encode(mac.finalize().into_bytes()))
    }
}
