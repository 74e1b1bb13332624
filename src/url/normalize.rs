use percent_encoding::percent_decode_str;
use url::Url;

/// Schemes of hyperlinks that never point into a directory listing
const IGNORED_SCHEMES: &[&str] = &["javascript:", "mailto:", "tel:", "data:"];

/// Appends a path separator unless the URL already ends with one
///
/// # Examples
///
/// ```
/// use wfind::url::ensure_trailing_slash;
///
/// assert_eq!(ensure_trailing_slash("https://example.org/pub"), "https://example.org/pub/");
/// assert_eq!(ensure_trailing_slash("https://example.org/pub/"), "https://example.org/pub/");
/// ```
pub fn ensure_trailing_slash(url: &str) -> String {
    if url.ends_with('/') {
        url.to_string()
    } else {
        format!("{}/", url)
    }
}

/// Returns false for hrefs that cannot name a listing entry
///
/// Empty hrefs, same-page fragments, query-only links (the column sorting
/// links of many listings) and non-HTTP schemes are skipped.
pub fn is_followable_href(href: &str) -> bool {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') || href.starts_with('?') {
        return false;
    }

    let lower = href.to_ascii_lowercase();
    !IGNORED_SCHEMES.iter().any(|scheme| lower.starts_with(scheme))
}

/// Resolves an href against the URL of the page it was found on
///
/// `./name` and `name` resolve identically. Returns None when the result is
/// not an HTTP(S) URL.
pub fn resolve_href(request_url: &Url, href: &str) -> Option<Url> {
    let mut resolved = request_url.join(href.trim()).ok()?;

    if resolved.scheme() != "http" && resolved.scheme() != "https" {
        return None;
    }

    resolved.set_fragment(None);
    Some(resolved)
}

/// Last segment of a URL path, ignoring trailing separators
///
/// Percent-escapes are decoded, so the name reads the way the listing shows
/// it.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use wfind::url::base_name;
///
/// let dir = Url::parse("https://example.org/pub/docs/").unwrap();
/// assert_eq!(base_name(&dir), "docs");
///
/// let file = Url::parse("https://example.org/pub/my%20file.txt").unwrap();
/// assert_eq!(base_name(&file), "my file.txt");
/// ```
pub fn base_name(url: &Url) -> String {
    last_segment(url.path())
        .map(decode_segment)
        .unwrap_or_else(|| "/".to_string())
}

/// Base name of an href as written in the listing
///
/// Query and fragment are dropped; escapes are decoded like [`base_name`]
/// does, so `my file.txt` and `my%20file.txt` give the same name.
pub fn href_base_name(href: &str) -> String {
    let path = href
        .trim()
        .split(|c: char| c == '?' || c == '#')
        .next()
        .unwrap_or_default();

    last_segment(path)
        .map(decode_segment)
        .unwrap_or_else(|| "/".to_string())
}

fn last_segment(path: &str) -> Option<&str> {
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|name| !name.is_empty())
}

fn decode_segment(segment: &str) -> String {
    percent_decode_str(segment).decode_utf8_lossy().into_owned()
}
