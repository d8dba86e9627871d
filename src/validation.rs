//! Validation helpers shared by the allocator, the resolver and the handlers

use url::Url;

pub const MIN_CODE_LENGTH: usize = 3;
pub const MAX_CODE_LENGTH: usize = 50;

/// Checks a short code against `^[A-Za-z0-9_-]{3,50}$`
pub fn is_valid_code(code: &str) -> bool {
    (MIN_CODE_LENGTH..=MAX_CODE_LENGTH).contains(&code.len())
        && code
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

/// Pulls the candidate code out of a user supplied short link.
///
/// `https://sho.rt/my-link` yields `my-link`; a bare `my-link` is returned
/// as is. A trailing slash leaves the input untouched so it fails
/// validation instead of silently picking another segment.
pub fn extract_candidate(short_link: &str) -> &str {
    match short_link.rfind('/') {
        Some(idx) if idx + 1 < short_link.len() => &short_link[idx + 1..],
        _ => short_link,
    }
}

/// Normalizes a destination URL and checks that it is usable.
///
/// Inputs without a scheme get `https://` prepended. The result must parse
/// as an absolute `http`/`https` URL with a host, and is returned in its
/// serialized form: punycode host, percent-encoded path, no control
/// characters. That form is always a valid `Location` header value.
pub fn normalize_url(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    let parsed = Url::parse(&candidate).ok()?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return None;
    }

    Some(parsed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_length_bounds() {
        assert!(!is_valid_code("ab"));
        assert!(is_valid_code("abc"));
        assert!(is_valid_code(&"a".repeat(50)));
        assert!(!is_valid_code(&"a".repeat(51)));
    }

    #[test]
    fn code_alphabet() {
        assert!(is_valid_code("My_link-42"));
        assert!(!is_valid_code("has space"));
        assert!(!is_valid_code("dot.ted"));
        assert!(!is_valid_code("slash/ed"));
        assert!(!is_valid_code("ünï"));
    }

    #[test]
    fn candidate_from_full_link() {
        assert_eq!(extract_candidate("https://sho.rt/my-link"), "my-link");
        assert_eq!(extract_candidate("my-link"), "my-link");
        assert_eq!(extract_candidate("https://sho.rt/"), "https://sho.rt/");
    }

    #[test]
    fn urls_get_a_scheme() {
        assert_eq!(
            normalize_url("example.com/path").as_deref(),
            Some("https://example.com/path")
        );
        assert_eq!(
            normalize_url("  http://example.com ").as_deref(),
            Some("http://example.com/")
        );
    }

    #[test]
    fn urls_are_stored_serialized() {
        assert_eq!(
            normalize_url("https://example.com/a\nb").as_deref(),
            Some("https://example.com/ab")
        );
        assert_eq!(
            normalize_url("https://example.com/a\tb").as_deref(),
            Some("https://example.com/ab")
        );
        assert_eq!(
            normalize_url("https://example.com/a\u{7f}b").as_deref(),
            Some("https://example.com/a%7Fb")
        );
        assert_eq!(
            normalize_url("https://bücher.de/").as_deref(),
            Some("https://xn--bcher-kva.de/")
        );
        assert_eq!(
            normalize_url("https://example.com/café").as_deref(),
            Some("https://example.com/caf%C3%A9")
        );
    }

    #[test]
    fn unusable_urls_are_rejected() {
        assert_eq!(normalize_url(""), None);
        assert_eq!(normalize_url("   "), None);
        assert_eq!(normalize_url("ftp://example.com"), None);
        assert_eq!(normalize_url("https://"), None);
        assert_eq!(normalize_url("not a url"), None);
    }
}
