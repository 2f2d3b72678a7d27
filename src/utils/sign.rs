//! Digest and signature primitives shared by the vendor transformers.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use md5::Md5;
use sha1::{Digest, Sha1};
use sha2::Sha256;

use crate::error::SmsError;

type HmacSha1 = Hmac<Sha1>;

/// Lowercase hex MD5.
pub fn md5_hex(data: impl AsRef<[u8]>) -> String {
    hex::encode(Md5::digest(data.as_ref()))
}

/// Lowercase hex SHA-1.
pub fn sha1_hex(data: impl AsRef<[u8]>) -> String {
    hex::encode(Sha1::digest(data.as_ref()))
}

/// Lowercase hex SHA-256.
pub fn sha256_hex(data: impl AsRef<[u8]>) -> String {
    hex::encode(Sha256::digest(data.as_ref()))
}

/// Standard base64 of the raw SHA-256 digest.
pub fn sha256_base64(data: impl AsRef<[u8]>) -> String {
    STANDARD.encode(Sha256::digest(data.as_ref()))
}

/// Standard base64 of an HMAC-SHA1 tag.
pub fn hmac_sha1_base64(key: impl AsRef<[u8]>, data: impl AsRef<[u8]>) -> Result<String, SmsError> {
    let mut mac = HmacSha1::new_from_slice(key.as_ref())
        .map_err(|e| SmsError::ConfigurationError(format!("hmac key rejected: {e}")))?;
    mac.update(data.as_ref());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

pub fn base64_encode(data: impl AsRef<[u8]>) -> String {
    STANDARD.encode(data.as_ref())
}

/// RFC 3986 percent-encoding: everything except `A-Z a-z 0-9 - _ . ~`.
///
/// Spaces become `%20`, `*` becomes `%2A`, and `~` is left alone.
pub fn percent_encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}
