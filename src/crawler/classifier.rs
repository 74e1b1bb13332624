//! Link classification
//!
//! Decides, for each anchor on a listing page, whether it is a match, a
//! directory to descend into, both, or nothing of interest.

use crate::config::{EntryType, Policy};
use crate::url::{base_name, href_base_name, resolve_href};
use url::Url;

/// Marker of a link to the parent directory
const PARENT_DIRECTORY: &str = "../";

/// What an anchor means for the current find job
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Ignored
    NotRelevant,

    /// A file whose base name matches the pattern
    MatchedFile { name: String, url: Url },

    /// A directory whose href matches the pattern; `descend` is set when the
    /// job is recursive
    MatchedDirectory { name: String, url: Url, descend: bool },

    /// A non-matching directory to visit next
    DescendCandidate(Url),
}

impl Classification {
    /// The base name and URL to record, if this is a match
    pub fn matched(&self) -> Option<(&str, &Url)> {
        match self {
            Self::MatchedFile { name, url } | Self::MatchedDirectory { name, url, .. } => {
                Some((name.as_str(), url))
            }
            _ => None,
        }
    }

    /// The URL to visit next, if any
    pub fn descend_url(&self) -> Option<&Url> {
        match self {
            Self::MatchedDirectory {
                url, descend: true, ..
            }
            | Self::DescendCandidate(url) => Some(url),
            _ => None,
        }
    }
}

/// Returns true for hrefs that lead back up the tree
///
/// The root link and anything containing `../` are never followed, which is
/// what keeps a crawl from climbing above its seed.
pub fn is_backward_link(href: &str) -> bool {
    href == "/" || href == ".." || href.contains(PARENT_DIRECTORY)
}

/// Returns true if the href names a directory, i.e. ends with a separator
pub fn is_directory_href(href: &str) -> bool {
    href.len() > 1 && href.ends_with('/')
}

/// Classifies one anchor found on the page at `request_url`
///
/// Files match on the base name of the href, so names the URL would
/// re-encode (spaces, non-ASCII) still match as listed. Directories match on
/// the href as written, so that the sanitized pattern can accept `./name/`
/// renderings; a directory resolving to a seed never matches.
pub fn classify_link(href: &str, request_url: &Url, policy: &Policy) -> Classification {
    let href = href.trim();

    if is_backward_link(href) {
        return Classification::NotRelevant;
    }

    let url = match resolve_href(request_url, href) {
        Some(url) => url,
        None => return Classification::NotRelevant,
    };

    let is_directory = is_directory_href(href);
    let recursive = policy.is_recursive();

    match policy.entry_type() {
        EntryType::File if is_directory => {
            if recursive {
                Classification::DescendCandidate(url)
            } else {
                Classification::NotRelevant
            }
        }
        EntryType::File => {
            let name = href_base_name(href);
            if policy.name_pattern().is_match(&name) {
                Classification::MatchedFile { name, url }
            } else {
                Classification::NotRelevant
            }
        }
        EntryType::Directory if !is_directory => Classification::NotRelevant,
        EntryType::Directory => {
            let matched = policy.name_pattern().is_match(href) && !policy.is_seed(&url);

            if matched {
                Classification::MatchedDirectory {
                    name: base_name(&url),
                    url,
                    descend: recursive,
                }
            } else if recursive {
                Classification::DescendCandidate(url)
            } else {
                Classification::NotRelevant
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PolicyBuilder;

    fn home() -> Url {
        Url::parse("http://example.com/home/").unwrap()
    }

    fn policy(pattern: &str, entry_type: EntryType, recursive: bool) -> Policy {
        PolicyBuilder::new()
            .seed("http://example.com/home")
            .name_pattern(pattern)
            .entry_type(entry_type)
            .recursive(recursive)
            .build()
            .unwrap()
    }

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_backward_links_are_ignored() {
        let policy = policy(".+", EntryType::Directory, true);
        for href in ["/", "../", "..", "foo/../bar/", "../../"] {
            assert_eq!(
                classify_link(href, &home(), &policy),
                Classification::NotRelevant,
                "{}",
                href
            );
        }
    }

    #[test]
    fn test_directory_href_detection() {
        assert!(is_directory_href("foo/"));
        assert!(is_directory_href("./foo/"));
        assert!(!is_directory_href("/"));
        assert!(!is_directory_href("foo"));
    }

    #[test]
    fn test_file_matches_on_base_name() {
        let policy = policy("^hello$", EntryType::File, true);
        assert_eq!(
            classify_link("hello", &home(), &policy),
            Classification::MatchedFile {
                name: "hello".to_string(),
                url: url("http://example.com/home/hello"),
            }
        );
        assert_eq!(
            classify_link("./hello", &home(), &policy),
            Classification::MatchedFile {
                name: "hello".to_string(),
                url: url("http://example.com/home/hello"),
            }
        );
        assert_eq!(
            classify_link("world", &home(), &policy),
            Classification::NotRelevant
        );
    }

    #[test]
    fn test_file_pattern_is_a_search() {
        let policy = policy("ell", EntryType::File, true);
        assert!(classify_link("hello", &home(), &policy).matched().is_some());
    }

    #[test]
    fn test_directories_descend_when_finding_files() {
        let policy = policy("^File$", EntryType::File, true);
        let class = classify_link("foo/", &home(), &policy);
        assert_eq!(
            class,
            Classification::DescendCandidate(url("http://example.com/home/foo/"))
        );
        assert!(class.matched().is_none());
    }

    #[test]
    fn test_non_recursive_never_descends() {
        let files = policy("^File$", EntryType::File, false);
        assert_eq!(
            classify_link("foo/", &home(), &files),
            Classification::NotRelevant
        );

        let dirs = policy("^foo$", EntryType::Directory, false);
        let class = classify_link("foo/", &home(), &dirs);
        assert!(class.matched().is_some());
        assert!(class.descend_url().is_none());
        assert_eq!(
            classify_link("bar/", &home(), &dirs),
            Classification::NotRelevant
        );
    }

    #[test]
    fn test_matched_directory_also_descends() {
        let policy = policy("^Dir$", EntryType::Directory, true);
        let class = classify_link("./Dir/", &url("http://example.com/home/foo/"), &policy);
        assert_eq!(
            class,
            Classification::MatchedDirectory {
                name: "Dir".to_string(),
                url: url("http://example.com/home/foo/Dir/"),
                descend: true,
            }
        );
        assert_eq!(
            class.descend_url(),
            Some(&url("http://example.com/home/foo/Dir/"))
        );
    }

    #[test]
    fn test_files_never_match_directory_jobs() {
        let policy = policy(".+", EntryType::Directory, true);
        assert_eq!(
            classify_link("hello", &home(), &policy),
            Classification::NotRelevant
        );
    }

    #[test]
    fn test_seed_never_matches_as_directory() {
        let policy = policy(".+", EntryType::Directory, true);
        let class = classify_link("http://example.com/home/", &home(), &policy);
        assert_eq!(class, Classification::DescendCandidate(home()));
    }

    #[test]
    fn test_file_names_match_as_listed() {
        let accented = policy(r"^café\.txt$", EntryType::File, true);
        assert_eq!(
            classify_link("café.txt", &home(), &accented),
            Classification::MatchedFile {
                name: "café.txt".to_string(),
                url: url("http://example.com/home/caf%C3%A9.txt"),
            }
        );

        let spaced = policy(r"^my file\.txt$", EntryType::File, true);
        for href in ["my file.txt", "my%20file.txt"] {
            assert_eq!(
                classify_link(href, &home(), &spaced),
                Classification::MatchedFile {
                    name: "my file.txt".to_string(),
                    url: url("http://example.com/home/my%20file.txt"),
                },
                "{}",
                href
            );
        }
    }

    #[test]
    fn test_directory_name_is_decoded() {
        let policy = policy(".+", EntryType::Directory, true);
        let class = classify_link("caf%C3%A9/", &home(), &policy);
        assert_eq!(
            class.matched(),
            Some(("café", &url("http://example.com/home/caf%C3%A9/")))
        );
    }
}
