use crate::UrlError;
use url::Url;

/// Parses the canonical site origin
///
/// # Arguments
///
/// * `origin` - Absolute origin such as `https://www.revisor.mn.gov`
///
/// # Returns
///
/// * `Ok(Url)` - Parsed origin
/// * `Err(UrlError)` - The origin is not an absolute http(s) URL
pub fn canonical_origin(origin: &str) -> Result<Url, UrlError> {
    let url = Url::parse(origin).map_err(|e| UrlError::Parse(format!("{}: {}", origin, e)))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::Parse(format!(
            "Only HTTP and HTTPS origins are supported, got: {}",
            url.scheme()
        )));
    }
    Ok(url)
}

/// Normalizes a link href into an absolute URL on the canonical origin
///
/// # Normalization Rules
///
/// 1. Scheme-relative (`//host/path`) takes the origin's scheme
/// 2. Root-relative (`/path`) is joined onto the origin
/// 3. Anything else must already be absolute and passes through unchanged
///
/// Surrounding whitespace is trimmed first.
///
/// # Arguments
///
/// * `href` - The link as it appears in the page
/// * `origin` - The canonical site origin
///
/// # Returns
///
/// * `Ok(String)` - Absolute URL
/// * `Err(UrlError)` - The href is empty or cannot be parsed
///
/// # Examples
///
/// ```
/// use statute_crawler::url::{canonical_origin, normalize_url, DEFAULT_ORIGIN};
///
/// let origin = canonical_origin(DEFAULT_ORIGIN).unwrap();
/// let url = normalize_url("/statutes/cite/609", &origin).unwrap();
/// assert_eq!(url, "https://www.revisor.mn.gov/statutes/cite/609");
/// ```
pub fn normalize_url(href: &str, origin: &Url) -> Result<String, UrlError> {
    let href = href.trim();

    if href.is_empty() {
        return Err(UrlError::Parse("empty href".to_string()));
    }

    if href.starts_with("//") {
        return Ok(format!("{}:{}", origin.scheme(), href));
    }

    if href.starts_with('/') {
        return origin
            .join(href)
            .map(|url| url.to_string())
            .map_err(|e| UrlError::Parse(format!("{}: {}", href, e)));
    }

    Url::parse(href).map_err(|e| UrlError::Parse(format!("{}: {}", href, e)))?;
    Ok(href.to_string())
}
