//! Userscript-style page match patterns (`*://x.com/*`).

use thiserror::Error;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("match pattern {0:?} has no scheme separator")]
    MissingScheme(String),
    #[error("match pattern {0:?} has an empty host")]
    EmptyHost(String),
    #[error("match pattern {0:?} has no path")]
    MissingPath(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum HostRule {
    Any,
    Exact(String),
    /// `*.example.com`: the domain itself and any subdomain.
    Suffix(String),
}

/// A parsed `<scheme>://<host><path>` pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchPattern {
    raw: String,
    scheme: String,
    host: HostRule,
    path: String,
}

impl MatchPattern {
    pub fn parse(raw: &str) -> Result<Self, PatternError> {
        let trimmed = raw.trim();
        let (scheme, rest) = trimmed
            .split_once("://")
            .ok_or_else(|| PatternError::MissingScheme(raw.to_string()))?;
        let slash = rest
            .find('/')
            .ok_or_else(|| PatternError::MissingPath(raw.to_string()))?;
        let (host, path) = rest.split_at(slash);
        if host.is_empty() {
            return Err(PatternError::EmptyHost(raw.to_string()));
        }
        let host = if host == "*" {
            HostRule::Any
        } else if let Some(domain) = host.strip_prefix("*.") {
            HostRule::Suffix(domain.to_ascii_lowercase())
        } else {
            HostRule::Exact(host.to_ascii_lowercase())
        };
        Ok(Self {
            raw: trimmed.to_string(),
            scheme: scheme.to_ascii_lowercase(),
            host,
            path: path.to_string(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// True if the page address `href` falls under this pattern.
    pub fn matches(&self, href: &str) -> bool {
        let Ok(url) = Url::parse(href) else {
            return false;
        };
        self.matches_url(&url)
    }

    pub fn matches_url(&self, url: &Url) -> bool {
        let scheme_ok = match self.scheme.as_str() {
            "*" => matches!(url.scheme(), "http" | "https"),
            s => url.scheme() == s,
        };
        if !scheme_ok {
            return false;
        }
        let Some(host) = url.host_str() else {
            return false;
        };
        let host_ok = match &self.host {
            HostRule::Any => true,
            HostRule::Exact(h) => host == h,
            HostRule::Suffix(domain) => {
                host == domain
                    || host
                        .strip_suffix(domain.as_str())
                        .map(|prefix| prefix.ends_with('.'))
                        .unwrap_or(false)
            }
        };
        if !host_ok {
            return false;
        }
        let mut path = url.path().to_string();
        if let Some(q) = url.query() {
            path.push('?');
            path.push_str(q);
        }
        wildcard_match(&self.path, &path)
    }
}

/// Glob match where `*` matches any run of characters (including none).
fn wildcard_match(pattern: &str, text: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let t: Vec<char> = text.chars().collect();
    let (mut pi, mut ti) = (0, 0);
    let mut star: Option<usize> = None;
    let mut resume = 0;
    while ti < t.len() {
        if pi < p.len() && p[pi] == '*' {
            star = Some(pi);
            pi += 1;
            resume = ti;
        } else if pi < p.len() && p[pi] == t[ti] {
            pi += 1;
            ti += 1;
        } else if let Some(s) = star {
            pi = s + 1;
            resume += 1;
            ti = resume;
        } else {
            return false;
        }
    }
    p[pi..].iter().all(|&c| c == '*')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn any_http_scheme() {
        let p = MatchPattern::parse("*://x.com/*").unwrap();
        assert!(p.matches("https://x.com/home"));
        assert!(p.matches("http://x.com/"));
        assert!(p.matches("https://X.com/i/status/1?s=20"));
        assert!(!p.matches("ftp://x.com/file"));
        assert!(!p.matches("https://mobile.x.com/home"));
        assert!(!p.matches("garbage"));
    }

    #[test]
    fn subdomain_wildcard() {
        let p = MatchPattern::parse("https://*.twitter.com/*").unwrap();
        assert!(p.matches("https://twitter.com/a"));
        assert!(p.matches("https://mobile.twitter.com/a"));
        assert!(!p.matches("https://nottwitter.com/a"));
        assert!(!p.matches("http://twitter.com/a"));
    }

    #[test]
    fn path_globs() {
        let p = MatchPattern::parse("*://pbs.twimg.com/media/*").unwrap();
        assert!(p.matches("https://pbs.twimg.com/media/A.jpg?name=small"));
        assert!(!p.matches("https://pbs.twimg.com/profile_images/1/a.jpg"));
        assert!(wildcard_match("/a*b*c", "/axxbyyc"));
        assert!(!wildcard_match("/a*b", "/axxbc"));
        assert!(wildcard_match("*", ""));
    }

    #[test]
    fn parse_errors() {
        assert_eq!(
            MatchPattern::parse("x.com/*"),
            Err(PatternError::MissingScheme("x.com/*".into()))
        );
        assert_eq!(
            MatchPattern::parse("*:///*"),
            Err(PatternError::EmptyHost("*:///*".into()))
        );
        assert_eq!(
            MatchPattern::parse("*://x.com"),
            Err(PatternError::MissingPath("*://x.com".into()))
        );
    }
}
