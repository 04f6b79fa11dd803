//! Slack request signature verification.
//!
//! Slack signs every webhook with HMAC-SHA256 over `v0:{timestamp}:{body}`
//! using the app's signing secret, and sends the hex digest in the
//! `X-Slack-Signature` header as `v0=<hex>`.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Reject requests whose timestamp is further than this from now, in
/// either direction. Guards against replay of captured requests.
const MAX_CLOCK_SKEW_SECS: i64 = 60 * 5;

pub struct SignatureVerifier {
    signing_secret: String,
}

impl SignatureVerifier {
    pub fn new(signing_secret: impl Into<String>) -> Self {
        Self {
            signing_secret: signing_secret.into(),
        }
    }

    /// Validate a request signature against the raw body and timestamp.
    ///
    /// Uses constant-time comparison to prevent timing attacks.
    pub fn verify(&self, timestamp: &str, body: &[u8], signature: &str) -> bool {
        let Ok(ts) = timestamp.parse::<i64>() else {
            return false;
        };
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);
        if (now - ts).abs() > MAX_CLOCK_SKEW_SECS {
            return false;
        }

        let sig_hex = signature.strip_prefix("v0=").unwrap_or(signature);
        let provided = match hex::decode(sig_hex) {
            Ok(b) => b,
            Err(_) => return false,
        };

        let mut mac = HmacSha256::new_from_slice(self.signing_secret.as_bytes())
            .expect("HMAC accepts any key length");
        mac.update(b"v0:");
        mac.update(timestamp.as_bytes());
        mac.update(b":");
        mac.update(body);
        mac.verify_slice(&provided).is_ok()
    }
}

#[cfg(test)]
pub(crate) fn sign(secret: &str, timestamp: &str, body: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(format!("v0:{timestamp}:").as_bytes());
    mac.update(body);
    format!("v0={}", hex::encode(mac.finalize().into_bytes()))
}
