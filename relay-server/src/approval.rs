//! Signed testimonial approval links.
//!
//! The moderation email carries a link of the form
//! `{base}/testimonials/{id}/approve?sig={hex}` where `sig` is
//! HMAC-SHA256(signing_key, id). Only someone holding the email can approve.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::warn;
use url::Url;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

fn mac_for(signing_key: &str, id: Uuid) -> Option<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(signing_key.as_bytes()).ok()?;
    mac.update(id.to_string().as_bytes());
    Some(mac)
}

/// Hex HMAC-SHA256 signature of a testimonial id.
pub fn sign_approval(signing_key: &str, id: Uuid) -> Option<String> {
    let mac = mac_for(signing_key, id)?;
    Some(hex::encode(mac.finalize().into_bytes()))
}

/// Verify an approval signature in constant time.
pub fn verify_approval(signing_key: &str, id: Uuid, signature: &str) -> bool {
    if signing_key.is_empty() || signature.is_empty() {
        warn!(
            has_signing_key = !signing_key.is_empty(),
            has_signature = !signature.is_empty(),
            "approval_signature_missing_fields"
        );
        return false;
    }

    let Ok(provided) = hex::decode(signature) else {
        warn!(testimonial_id = %id, "approval_signature_not_hex");
        return false;
    };

    let Some(mac) = mac_for(signing_key, id) else {
        warn!("approval_signature_invalid_key");
        return false;
    };

    let valid = mac.verify_slice(&provided).is_ok();
    if !valid {
        warn!(testimonial_id = %id, "approval_signature_mismatch");
    }
    valid
}

/// Build the absolute approval URL for a testimonial.
///
/// Returns `None` if the base URL cannot be parsed.
pub fn approval_url(base_url: &str, signing_key: &str, id: Uuid) -> Option<String> {
    let signature = sign_approval(signing_key, id)?;
    let mut url = match Url::parse(&format!("{base_url}/testimonials/{id}/approve")) {
        Ok(url) => url,
        Err(e) => {
            warn!(base_url = %base_url, error = %e, "approval_url_invalid_base");
            return None;
        }
    };
    url.query_pairs_mut().append_pair("sig", &signature);
    Some(url.into())
}
