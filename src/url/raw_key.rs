//! Raw page keys
//!
//! Raw pages are stored under a key derived from their URL. The URL is base64
//! encoded with the URL-safe alphabet so the key never contains `/` or `+`.

use crate::UrlError;
use base64::engine::general_purpose::URL_SAFE;
use base64::Engine as _;

/// Prefix marking a key as an encoded URL
pub const RAW_KEY_PREFIX: &str = "url=";

/// Encodes a URL into a store-safe raw page key
///
/// # Examples
///
/// ```
/// use statute_crawler::url::{raw_key_for_url, url_for_raw_key};
///
/// let key = raw_key_for_url("https://www.revisor.mn.gov/statutes/");
/// assert!(key.starts_with("url="));
/// assert_eq!(url_for_raw_key(&key).unwrap(), "https://www.revisor.mn.gov/statutes/");
/// ```
pub fn raw_key_for_url(url: &str) -> String {
    format!("{}{}", RAW_KEY_PREFIX, URL_SAFE.encode(url.as_bytes()))
}

/// Decodes a raw page key back into the URL it was derived from
///
/// Keys may carry a path prefix (`raw/url=...`); only the last segment is decoded.
pub fn url_for_raw_key(key: &str) -> Result<String, UrlError> {
    let file_name = key.rsplit('/').next().unwrap_or(key);
    let encoded = file_name
        .strip_prefix(RAW_KEY_PREFIX)
        .ok_or_else(|| UrlError::Malformed(format!("missing '{}' prefix: {}", RAW_KEY_PREFIX, key)))?;

    let bytes = URL_SAFE
        .decode(encoded)
        .map_err(|e| UrlError::Malformed(format!("{}: {}", key, e)))?;

    String::from_utf8(bytes).map_err(|e| UrlError::Malformed(format!("{}: {}", key, e)))
}
