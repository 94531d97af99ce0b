use crate::UrlError;
use url::Url;

/// Query parameters that only track the visitor and never change page content
const TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "fbclid",
    "gclid",
    "mc_eid",
];

/// Normalizes a URL into the canonical form used for fetching and records
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Reject anything that is not http or https
/// 3. Lowercase the host and drop the default port (done by `url` while parsing)
/// 4. Normalize path:
///    - Remove dot segments (. and ..) and repeated slashes
///    - Keep a trailing slash: `/docs/` is the base for its relative links
///    - Empty path becomes /
/// 5. Remove fragment (see [`split_fragment`] to keep it)
/// 6. Remove tracking query parameters and sort the rest
///
/// # Arguments
///
/// * `url_str` - The URL string to normalize
///
/// # Returns
///
/// * `Ok(Url)` - Normalized URL
/// * `Err(UrlError)` - Failed to parse or normalize the URL
///
/// # Examples
///
/// ```
/// use llms_scraper::url::normalize_url;
///
/// let url = normalize_url("https://Docs.Example.COM:443/api//v1/#auth").unwrap();
/// assert_eq!(url.as_str(), "https://docs.example.com/api/v1/");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let (url, _) = split_fragment(url_str)?;
    Ok(url)
}

/// Normalizes a URL and returns its fragment separately
///
/// An empty fragment (`page#`) is treated as no fragment.
///
/// # Examples
///
/// ```
/// use llms_scraper::url::split_fragment;
///
/// let (url, fragment) = split_fragment("https://x.test/doc#sec1").unwrap();
/// assert_eq!(url.as_str(), "https://x.test/doc");
/// assert_eq!(fragment.as_deref(), Some("sec1"));
/// ```
pub fn split_fragment(url_str: &str) -> Result<(Url, Option<String>), UrlError> {
    let mut url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;
    normalize_parsed(&mut url)?;

    let fragment = url
        .fragment()
        .filter(|f| !f.is_empty())
        .map(str::to_string);
    url.set_fragment(None);

    Ok((url, fragment))
}

/// Builds the visited-set key for a URL
///
/// `/docs/` and `/docs` share a key. The fragment is part of the key only when
/// fragment export is enabled, so `doc#a` and `doc` are distinct pages in that
/// mode and the same page otherwise.
pub fn visit_key(url: &Url, fragment: Option<&str>, export_fragments: bool) -> String {
    let path = url.path();
    let key = if path.len() > 1 && path.ends_with('/') {
        let mut folded = url.clone();
        folded.set_path(path.trim_end_matches('/'));
        folded.to_string()
    } else {
        url.to_string()
    };

    match fragment {
        Some(frag) if export_fragments => format!("{}#{}", key, frag),
        _ => key,
    }
}

fn normalize_parsed(url: &mut Url) -> Result<(), UrlError> {
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    match url.host_str() {
        Some(host) if !host.is_empty() => {}
        _ => return Err(UrlError::MissingHost),
    }

    let normalized_path = normalize_path(url.path());
    url.set_path(&normalized_path);

    if url.query().is_some() {
        let params = filter_and_sort_query_params(url);
        if params.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(params);
        }
    }

    Ok(())
}

/// Normalizes a URL path by removing dot segments and empty segments
fn normalize_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                segments.pop();
            }
            _ => segments.push(segment),
        }
    }

    if segments.is_empty() {
        return "/".to_string();
    }

    let mut normalized = format!("/{}", segments.join("/"));
    if path.ends_with('/') {
        normalized.push('/');
    }
    normalized
}

/// Filters out tracking parameters and sorts remaining query parameters
fn filter_and_sort_query_params(url: &Url) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !is_tracking_param(key))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    params.sort();
    params
}

fn is_tracking_param(key: &str) -> bool {
    TRACKING_PARAMS.contains(&key) || key.starts_with("utm_")
}
