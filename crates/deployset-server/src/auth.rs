//! Request identity extraction.
//!
//! The service trusts an upstream proxy to authenticate; the bearer
//! token is parsed without verification, only to read the `username`
//! claim. The identity is opaque and must not be used for
//! authorization decisions.

use axum::http::HeaderMap;
use serde::Deserialize;

pub const UNKNOWN_USER: &str = "UNKNOWN";

const BASE64_URL_ALPHABET: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

#[derive(Debug, Deserialize)]
struct Claims {
    #[serde(default)]
    username: Option<String>,
}

/// Resolves the identity behind a request.
///
/// An `Authorization` header starting with `JWT ` is parsed for a
/// `username` claim; failing that, the `From` header supplies the
/// name; failing that, the identity is `UNKNOWN`.
pub fn identify(headers: &HeaderMap) -> String {
    let claim = headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(|auth| auth.strip_prefix("JWT "))
        .and_then(username_from_token);
    if let Some(username) = claim {
        return username;
    }

    if let Some(from) = headers.get("from").and_then(|value| value.to_str().ok()) {
        if !from.is_empty() {
            return from.to_string();
        }
    }

    UNKNOWN_USER.to_string()
}

fn username_from_token(token: &str) -> Option<String> {
    let mut segments = token.split('.');
    let _header = segments.next()?;
    let payload = segments.next()?;
    let bytes = from_base64_url(payload)?;
    let claims: Claims = serde_json::from_slice(&bytes).ok()?;
    claims.username.filter(|username| !username.is_empty())
}

/// Decodes URL-safe base64 without padding (padding is tolerated).
fn from_base64_url(encoded: &str) -> Option<Vec<u8>> {
    let mut table = [-1i16; 256];
    for (value, &symbol) in BASE64_URL_ALPHABET.iter().enumerate() {
        table[symbol as usize] = value as i16;
    }

    let bytes = encoded.trim_end_matches('=').as_bytes();
    if bytes.len() % 4 == 1 {
        return None;
    }

    let mut out = Vec::with_capacity(bytes.len() * 3 / 4);
    let mut buffer: u32 = 0;
    let mut bits: u8 = 0;
    for &byte in bytes {
        let value = table[byte as usize];
        if value < 0 {
            return None;
        }
        buffer = (buffer << 6) | value as u32;
        bits += 6;
        if bits >= 8 {
            bits -= 8;
            out.push((buffer >> bits) as u8);
        }
    }
    Some(out)
}
