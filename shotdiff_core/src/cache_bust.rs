use serde::Serialize;
use std::fmt;

/// Query parameter appended to a URL so browsers refetch changed content
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheBust {
    pub param: String,
    pub token: u64,
}

impl CacheBust {
    pub fn new(param: impl Into<String>, token: u64) -> Self {
        Self {
            param: param.into(),
            token,
        }
    }

    /// Token derived from a BLAKE3 hash of `content`.
    ///
    /// Same bytes always give the same token, so an unchanged file keeps its
    /// URL across runs.
    pub fn for_content(param: impl Into<String>, content: &[u8]) -> Self {
        let hash = blake3::hash(content);
        let mut prefix = [0u8; 8];
        prefix.copy_from_slice(&hash.as_bytes()[..8]);
        Self::new(param, u64::from_le_bytes(prefix))
    }
}

impl fmt::Display for CacheBust {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.param, self.token)
    }
}

/// Append the cache-bust query parameter to `url_path`.
///
/// Without a token the URL is returned unchanged. A `#fragment` stays at the end.
pub fn decorate_with_cache_bust(url_path: &str, bust: Option<&CacheBust>) -> String {
    let Some(bust) = bust else {
        return url_path.to_string();
    };

    let (base, fragment) = match url_path.find('#') {
        Some(idx) => url_path.split_at(idx),
        None => (url_path, ""),
    };
    let separator = if base.contains('?') { '&' } else { '?' };

    format!("{base}{separator}{bust}{fragment}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_without_token_url_is_unchanged() {
        assert_eq!(decorate_with_cache_bust("/diff.txt", None), "/diff.txt");
    }

    #[test]
    fn test_token_is_appended_as_query() {
        let bust = CacheBust::new("bust", 1234);
        assert_eq!(
            decorate_with_cache_bust("/textfile-actual.rst.txt", Some(&bust)),
            "/textfile-actual.rst.txt?bust=1234"
        );
    }

    #[test]
    fn test_existing_query_and_fragment() {
        let bust = CacheBust::new("v", 7);
        assert_eq!(
            decorate_with_cache_bust("/view?file=a.txt#L3", Some(&bust)),
            "/view?file=a.txt&v=7#L3"
        );
    }

    #[test]
    fn test_content_token_is_deterministic() {
        let a = CacheBust::for_content("bust", b"figure:: Actual.png\n");
        let b = CacheBust::for_content("bust", b"figure:: Actual.png\n");
        let c = CacheBust::for_content("bust", b"figure:: Original.png\n");

        assert_eq!(a, b);
        assert_ne!(a.token, c.token);
        assert!(a.to_string().starts_with("bust="));
        assert!(a.to_string()["bust=".len()..].chars().all(|ch| ch.is_ascii_digit()));
    }
}
