//! Request signing for the Bybit v5 REST API
//!
//! The exchange verifies an HMAC-SHA256 signature over a canonical parameter
//! string: keys sorted byte-wise ascending, joined as `key=value` pairs with
//! `&`, no URL encoding. The canonicalization must match the exchange
//! bit-for-bit or the request is rejected.

use std::collections::BTreeMap;

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Name of the injected signature field
pub const SIGN_FIELD: &str = "sign";

/// Build the canonical string for a parameter map
///
/// `BTreeMap` iteration order is the required byte-wise ascending key sort.
pub fn canonical_string(params: &BTreeMap<String, String>) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

/// Compute the lowercase hex HMAC-SHA256 signature of a parameter map
pub fn sign(params: &BTreeMap<String, String>, secret: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(canonical_string(params).as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Current epoch milliseconds, used as the request timestamp
pub fn timestamp_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Assemble a fully signed parameter map for an authenticated request
///
/// Injects `api_key` and a fresh `timestamp`, signs everything, then attaches
/// the signature as `sign`. The signature never covers itself; a stale `sign`
/// entry passed in by the caller is stripped before canonicalization.
/// Signatures are single-use: the exchange enforces a recv-window around the
/// timestamp, so repeat requests must call this again.
pub fn signed_params(
    business: impl IntoIterator<Item = (String, String)>,
    api_key: &str,
    secret: &str,
) -> BTreeMap<String, String> {
    let mut params: BTreeMap<String, String> = business.into_iter().collect();
    params.remove(SIGN_FIELD);
    params.insert("api_key".to_string(), api_key.to_string());
    params.insert("timestamp".to_string(), timestamp_ms().to_string());

    let signature = sign(&params, secret);
    params.insert(SIGN_FIELD.to_string(), signature);
    params
}
