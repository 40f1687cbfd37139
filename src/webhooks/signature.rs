//! `X-Hub-Signature` verification (HMAC-SHA1 over the raw request body).

use hmac::{Hmac, Mac};
use sha1::Sha1;

use crate::error::WebhookError;

type HmacSha1 = Hmac<Sha1>;

pub const SIGNATURE_HEADER: &str = "X-Hub-Signature";
const PREFIX: &str = "sha1=";

fn mac_for(secret: &str) -> HmacSha1 {
    HmacSha1::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size")
}

/// Compute the header value GitHub would send for `body`.
pub fn sign(secret: &str, body: &[u8]) -> String {
    let mut mac = mac_for(secret);
    mac.update(body);
    format!("{}{}", PREFIX, hex::encode(mac.finalize().into_bytes()))
}

/// Check `signature` against `body`. An empty secret disables verification.
///
/// Must be given the body exactly as received, before any JSON decoding.
pub fn verify(secret: &str, body: &[u8], signature: Option<&str>) -> Result<(), WebhookError> {
    if secret.is_empty() {
        return Ok(());
    }

    let signature = signature.ok_or(WebhookError::MissingSignature)?;
    let hex_sig = signature
        .strip_prefix(PREFIX)
        .ok_or(WebhookError::SignatureMismatch)?;
    let expected = hex::decode(hex_sig).map_err(|_| WebhookError::SignatureMismatch)?;

    let mut mac = mac_for(secret);
    mac.update(body);
    // verify_slice is constant-time and rejects wrong-length tags.
    mac.verify_slice(&expected)
        .map_err(|_| WebhookError::SignatureMismatch)
}
