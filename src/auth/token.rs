//! Bearer token freshness checks
//!
//! Tokens are decoded without verifying the signature. The backend that
//! issued them is the authority on authenticity; this module only answers
//! whether the embedded `exp` claim has passed. Any decoding problem counts
//! as expired.

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

const LENIENT: GeneralPurposeConfig = GeneralPurposeConfig::new()
    .with_encode_padding(false)
    .with_decode_padding_mode(DecodePaddingMode::Indifferent);

const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, LENIENT);
const STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, LENIENT);

/// Decode the payload segment of a three-part token into its claim map
pub fn decode_claims(token: &str) -> Option<Map<String, Value>> {
    let mut parts = token.split('.');
    let (Some(_header), Some(payload), Some(_signature), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return None;
    };

    let bytes = URL_SAFE_LENIENT
        .decode(payload)
        .or_else(|_| STANDARD_LENIENT.decode(payload))
        .ok()?;

    match serde_json::from_slice::<Value>(&bytes).ok()? {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

/// Read the `exp` claim (seconds since epoch)
pub fn expiry(token: &str) -> Option<f64> {
    decode_claims(token)?.get("exp")?.as_f64()
}

/// Whether the token is expired at `now`, failing closed on malformed input
pub fn is_expired_at(token: &str, now: DateTime<Utc>) -> bool {
    match expiry(token) {
        Some(exp) => now.timestamp_millis() as f64 >= exp * 1000.0,
        None => {
            tracing::debug!("Token could not be decoded, treating as expired");
            true
        }
    }
}

/// Whether the token is expired right now
pub fn is_expired(token: &str) -> bool {
    is_expired_at(token, Utc::now())
}
