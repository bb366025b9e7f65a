//! Inbound webhook signature verification.
//!
//! Ryver signs every webhook delivery with base64(HMAC-SHA256(secret,
//! `<timestamp>:<raw body>`)). Only the exact raw bytes as transmitted may
//! be hashed; re-serializing a parsed body changes the byte sequence and
//! the signature no longer matches, so the transport layer hands the body
//! over untouched.

use {
    base64::{Engine as _, engine::general_purpose::STANDARD as BASE64},
    chrono::{DateTime, Utc},
    hmac::{Hmac, Mac},
    sha2::Sha256,
    thiserror::Error,
};

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the base64 request signature.
pub const SIGNATURE_HEADER: &str = "x-ryv-signature";
/// Header carrying the timestamp that is part of the signed payload.
pub const TIMESTAMP_HEADER: &str = "x-ryv-timestamp";

/// Accepted skew between the request timestamp and the local clock, to
/// absorb clock differences and reject replayed captures.
pub const TIMESTAMP_TOLERANCE_SECS: i64 = 300;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum VerifyError {
    #[error("missing required header '{0}'")]
    MissingHeader(&'static str),
    #[error("timestamp header is not a valid date-time")]
    InvalidTimestamp,
    #[error("timestamp outside the accepted window")]
    TimestampOutOfRange,
    #[error("signature mismatch")]
    BadSignature,
}

/// Verify an inbound webhook request against the shared app secret.
///
/// `signature` and `timestamp` are the raw header values; `body` is the
/// exact request body as transmitted. A `None` secret disables verification
/// entirely; that is the explicit reduced-security opt-out.
pub fn verify(
    signature: Option<&str>,
    timestamp: Option<&str>,
    body: &[u8],
    secret: Option<&str>,
    now: DateTime<Utc>,
) -> Result<(), VerifyError> {
    let Some(secret) = secret else {
        return Ok(());
    };

    let signature = signature.ok_or(VerifyError::MissingHeader(SIGNATURE_HEADER))?;
    let timestamp = timestamp.ok_or(VerifyError::MissingHeader(TIMESTAMP_HEADER))?;

    let ts = DateTime::parse_from_rfc3339(timestamp).map_err(|_| VerifyError::InvalidTimestamp)?;
    if now.signed_duration_since(ts).num_seconds().abs() > TIMESTAMP_TOLERANCE_SECS {
        return Err(VerifyError::TimestampOutOfRange);
    }

    let expected = compute_signature(secret, timestamp, body);
    if !constant_time_eq(&expected, signature) {
        return Err(VerifyError::BadSignature);
    }
    Ok(())
}

/// base64(HMAC-SHA256(secret, `<timestamp>:<body>`)).
pub fn compute_signature(secret: &str, timestamp: &str, body: &[u8]) -> String {
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        // HMAC accepts keys of any length; unreachable in practice.
        Err(_) => return String::new(),
    };
    mac.update(timestamp.as_bytes());
    mac.update(b":");
    mac.update(body);
    BASE64.encode(mac.finalize().into_bytes())
}

/// Constant-time string comparison.
fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes()
        .zip(b.bytes())
        .fold(0, |acc, (x, y)| acc | (x ^ y))
        == 0
}
