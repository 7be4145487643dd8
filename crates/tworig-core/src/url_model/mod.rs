//! URL normalization: force the target image host's `name` parameter to `orig`.
//!
//! Everything here is pure and never fails outward: any input that is not a
//! parseable URL on the target host is reported as "no change".

mod query;

use url::Url;

use crate::error::Rejection;
use crate::target::{target, TargetConfig};

pub use query::{first_param_value, upsert_param};

/// Outcome of running a candidate string through the normalizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// The URL was on target and has been rewritten.
    Rewritten(String),
    /// The URL is on target and already carries the desired value.
    AlreadyOriginal,
    /// Not a candidate; left untouched.
    Rejected(Rejection),
}

impl Verdict {
    pub fn into_rewritten(self) -> Option<String> {
        match self {
            Verdict::Rewritten(url) => Some(url),
            Verdict::AlreadyOriginal | Verdict::Rejected(_) => None,
        }
    }

    pub fn is_rewritten(&self) -> bool {
        matches!(self, Verdict::Rewritten(_))
    }
}

/// Rewrites `raw` so its `name` query parameter is `orig`.
///
/// Returns `None` when nothing should change: `raw` is not a URL, is not on
/// `pbs.twimg.com`, or already has `name=orig`. Feeding a returned URL back
/// in always yields `None`.
///
/// # Examples
///
/// - `normalize("https://pbs.twimg.com/media/ABC.jpg")` → `Some("https://pbs.twimg.com/media/ABC.jpg?name=orig")`
/// - `normalize("https://pbs.twimg.com/media/ABC.jpg?format=jpg&name=small")` → `Some("...?format=jpg&name=orig")`
/// - `normalize("https://example.com/media/ABC.jpg?name=small")` → `None`
pub fn normalize(raw: &str) -> Option<String> {
    normalize_with(target(), raw)
}

/// Same as [`normalize`] against an explicit target.
pub fn normalize_with(target: &TargetConfig, raw: &str) -> Option<String> {
    inspect_with(target, raw).into_rewritten()
}

/// Like [`normalize`] but reports why a URL was left alone.
pub fn inspect(raw: &str) -> Verdict {
    inspect_with(target(), raw)
}

pub fn inspect_with(target: &TargetConfig, raw: &str) -> Verdict {
    match parse_on_target(target, raw) {
        Ok(url) => rewrite_parsed(target, url),
        Err(rejection) => {
            tracing::trace!("normalizer skipped {:?}: {}", raw, rejection);
            Verdict::Rejected(rejection)
        }
    }
}

/// Applies the idempotence guard and the upsert to an already-parsed URL.
fn rewrite_parsed(target: &TargetConfig, mut url: Url) -> Verdict {
    if first_param_value(&url, &target.param).as_deref() == Some(target.value.as_str()) {
        return Verdict::AlreadyOriginal;
    }
    let query = upsert_param(url.query(), &target.param, &target.value);
    url.set_query(Some(&query));
    Verdict::Rewritten(url.into())
}

fn parse_on_target(target: &TargetConfig, raw: &str) -> Result<Url, Rejection> {
    if raw.trim().is_empty() {
        return Err(Rejection::Empty);
    }
    // Cheap pre-check before paying for a full parse.
    if !contains_ignore_ascii_case(raw, &target.host) {
        return Err(Rejection::NoTargetMention);
    }
    let url = Url::parse(raw)?;
    check_host(target, url)
}

fn check_host(target: &TargetConfig, url: Url) -> Result<Url, Rejection> {
    match url.host_str() {
        None => Err(Rejection::NoHost),
        Some(host) if target.is_target_host(host) => Ok(url),
        Some(host) => Err(Rejection::OffTarget {
            host: host.to_string(),
        }),
    }
}

fn contains_ignore_ascii_case(haystack: &str, needle: &str) -> bool {
    let needle = needle.as_bytes();
    if needle.is_empty() {
        return true;
    }
    haystack
        .as_bytes()
        .windows(needle.len())
        .any(|w| w.eq_ignore_ascii_case(needle))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_name_when_query_missing() {
        assert_eq!(
            normalize("https://pbs.twimg.com/media/ABC.jpg").as_deref(),
            Some("https://pbs.twimg.com/media/ABC.jpg?name=orig")
        );
    }

    #[test]
    fn overwrites_existing_name_in_place() {
        assert_eq!(
            normalize("https://pbs.twimg.com/media/ABC.jpg?format=jpg&name=small").as_deref(),
            Some("https://pbs.twimg.com/media/ABC.jpg?format=jpg&name=orig")
        );
        assert_eq!(
            normalize("https://pbs.twimg.com/media/ABC?name=900x900&format=png").as_deref(),
            Some("https://pbs.twimg.com/media/ABC?name=orig&format=png")
        );
    }

    #[test]
    fn already_orig_is_no_change() {
        assert_eq!(normalize("https://pbs.twimg.com/media/ABC.jpg?name=orig"), None);
        assert_eq!(
            inspect("https://pbs.twimg.com/media/ABC.jpg?format=jpg&name=orig"),
            Verdict::AlreadyOriginal
        );
    }

    #[test]
    fn wrong_host_is_no_change() {
        assert_eq!(normalize("https://example.com/media/ABC.jpg?name=small"), None);
        assert_eq!(
            inspect("https://example.com/pbs.twimg.com/ABC.jpg"),
            Verdict::Rejected(Rejection::OffTarget {
                host: "example.com".into()
            })
        );
        // Subdomains and lookalikes are not the target.
        assert_eq!(normalize("https://pbs.twimg.com.evil.test/a.jpg"), None);
        assert_eq!(normalize("https://video.twimg.com/a.mp4"), None);
    }

    #[test]
    fn malformed_input_is_no_change() {
        assert_eq!(inspect(""), Verdict::Rejected(Rejection::Empty));
        assert_eq!(inspect("   "), Verdict::Rejected(Rejection::Empty));
        assert_eq!(inspect("not a url"), Verdict::Rejected(Rejection::NoTargetMention));
        assert!(matches!(
            inspect("pbs.twimg.com/media/ABC.jpg"),
            Verdict::Rejected(Rejection::Unparseable(_))
        ));
        assert!(matches!(
            inspect("https://pbs.twimg.com:99999/a.jpg"),
            Verdict::Rejected(Rejection::Unparseable(_))
        ));
        assert_eq!(
            inspect("mailto:someone@pbs.twimg.com"),
            Verdict::Rejected(Rejection::NoHost)
        );
    }

    #[test]
    fn host_case_is_ignored() {
        assert_eq!(
            normalize("https://PBS.TWIMG.COM/media/ABC.jpg?name=small").as_deref(),
            Some("https://pbs.twimg.com/media/ABC.jpg?name=orig")
        );
    }

    #[test]
    fn fragment_and_scheme_survive() {
        assert_eq!(
            normalize("http://pbs.twimg.com/media/ABC.jpg?name=large#frag").as_deref(),
            Some("http://pbs.twimg.com/media/ABC.jpg?name=orig#frag")
        );
    }

    #[test]
    fn duplicate_names_collapse_to_first_position() {
        assert_eq!(
            normalize("https://pbs.twimg.com/m/A?name=small&x=1&name=large").as_deref(),
            Some("https://pbs.twimg.com/m/A?name=orig&x=1")
        );
    }

    #[test]
    fn guard_reads_the_first_name_only() {
        // First occurrence wins, matching URLSearchParams.get.
        assert_eq!(normalize("https://pbs.twimg.com/m/A?name=orig&name=small"), None);
    }

    #[test]
    fn name_inside_another_value_is_not_a_name_param() {
        assert_eq!(
            normalize("https://pbs.twimg.com/m/A?q=name%3Dsmall&name=small").as_deref(),
            Some("https://pbs.twimg.com/m/A?q=name%3Dsmall&name=orig")
        );
        assert_eq!(
            normalize("https://pbs.twimg.com/m/A?tag=name=orig").as_deref(),
            Some("https://pbs.twimg.com/m/A?tag=name=orig&name=orig")
        );
        assert_eq!(
            normalize("https://pbs.twimg.com/m/A?rename=orig").as_deref(),
            Some("https://pbs.twimg.com/m/A?rename=orig&name=orig")
        );
    }

    #[test]
    fn percent_encoded_key_and_value_are_decoded_for_the_guard() {
        assert_eq!(normalize("https://pbs.twimg.com/m/A?%6Eame=%6Frig"), None);
    }

    #[test]
    fn output_is_idempotent() {
        for input in [
            "https://pbs.twimg.com/media/ABC.jpg",
            "https://pbs.twimg.com/media/ABC.jpg?",
            "https://pbs.twimg.com/media/ABC.jpg?format=webp&name=4096x4096",
            "https://pbs.twimg.com/profile_images/1/x_normal.jpg?a=b%20c&&name=",
        ] {
            let once = normalize(input).expect("rewritten");
            assert_eq!(normalize(&once), None, "not idempotent for {input}");
        }
    }

    #[test]
    fn explicit_target() {
        let t = TargetConfig::new("img.example.org", "size", "full");
        assert_eq!(
            normalize_with(&t, "https://img.example.org/a.png?size=thumb").as_deref(),
            Some("https://img.example.org/a.png?size=full")
        );
        assert_eq!(normalize_with(&t, "https://pbs.twimg.com/a.png"), None);
    }
}
