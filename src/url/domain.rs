use url::Url;

/// Extracts the lowercase host from a URL
///
/// # Returns
///
/// * `Some(String)` - The lowercase host, without port
/// * `None` - If the URL has no host
///
/// # Examples
///
/// ```
/// use url::Url;
/// use llms_scraper::url::extract_domain;
///
/// let url = Url::parse("https://Docs.Example.com:8443/api").unwrap();
/// assert_eq!(extract_domain(&url), Some("docs.example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str()
        .filter(|h| !h.is_empty())
        .map(|h| h.to_lowercase())
}

/// Origin used to key per-site state such as robots.txt: `scheme://host[:port]`
pub fn origin_key(url: &Url) -> String {
    url.origin().ascii_serialization()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_subdomain_is_not_widened() {
        let url = Url::parse("https://blog.example.com/post").unwrap();
        assert_eq!(extract_domain(&url), Some("blog.example.com".to_string()));
    }

    #[test]
    fn test_extract_with_port() {
        let url = Url::parse("http://127.0.0.1:8080/").unwrap();
        assert_eq!(extract_domain(&url), Some("127.0.0.1".to_string()));
    }

    #[test]
    fn test_origin_key_includes_port() {
        let url = Url::parse("http://127.0.0.1:8080/docs/page").unwrap();
        assert_eq!(origin_key(&url), "http://127.0.0.1:8080");

        let url = Url::parse("https://example.com:443/").unwrap();
        assert_eq!(origin_key(&url), "https://example.com");
    }
}
