//! Start-up decision for a page: redirect, observe, or do nothing.
//!
//! `Start → (host == target → Redirected | Stopped)
//!        | (matched page and in-page rewriting on → Observing)
//!        | Inactive`

mod pattern;

pub use pattern::{MatchPattern, PatternError};

use crate::navigation::{self, is_on_target, Location, NavigationOutcome};
use crate::target::{target, TargetConfig};

/// Pages the script runs on by default.
pub const DEFAULT_MATCH_PATTERNS: &[&str] = &[
    "*://twitter.com/*",
    "*://x.com/*",
    "*://mobile.twitter.com/*",
    "*://tweetdeck.twitter.com/*",
    "*://pbs.twimg.com/*",
];

/// Independently toggleable delivery modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Features {
    pub direct_navigation: bool,
    pub in_page_rewriting: bool,
}

impl Default for Features {
    fn default() -> Self {
        Self {
            direct_navigation: true,
            in_page_rewriting: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptState {
    /// The page was an image on the target host and has been replaced.
    Redirected(String),
    /// On the target host with nothing to do (already original, or direct mode off).
    Stopped,
    /// In-page rewriting should be attached for the rest of the page's life.
    Observing,
    /// Page not matched or no applicable mode enabled.
    Inactive,
}

#[derive(Debug, Clone)]
pub struct Script {
    target: TargetConfig,
    features: Features,
    patterns: Vec<MatchPattern>,
}

impl Script {
    pub fn new(features: Features, patterns: Vec<MatchPattern>) -> Self {
        Self {
            target: target().clone(),
            features,
            patterns,
        }
    }

    /// Script with the default match set.
    pub fn with_defaults(features: Features) -> Self {
        let patterns = DEFAULT_MATCH_PATTERNS
            .iter()
            .filter_map(|p| MatchPattern::parse(p).ok())
            .collect();
        Self::new(features, patterns)
    }

    /// Parses a list of pattern strings, failing on the first bad one.
    pub fn from_patterns<S: AsRef<str>>(
        features: Features,
        patterns: &[S],
    ) -> Result<Self, PatternError> {
        let parsed = patterns
            .iter()
            .map(|p| MatchPattern::parse(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(features, parsed))
    }

    pub fn features(&self) -> Features {
        self.features
    }

    pub fn patterns(&self) -> &[MatchPattern] {
        &self.patterns
    }

    pub fn matches(&self, href: &str) -> bool {
        self.patterns.iter().any(|p| p.matches(href))
    }

    /// Runs the start-up decision for the page behind `location`.
    pub fn start<L: Location + ?Sized>(&self, location: &mut L) -> ScriptState {
        let href = location.href();
        if !self.matches(&href) {
            tracing::debug!("page not matched: {}", href);
            return ScriptState::Inactive;
        }

        if is_on_target(&self.target, &href) {
            // In-page rewriting never runs on the image host itself.
            if !self.features.direct_navigation {
                return ScriptState::Stopped;
            }
            return match navigation::apply_with(&self.target, location) {
                NavigationOutcome::Redirected(next) => ScriptState::Redirected(next),
                NavigationOutcome::AlreadyOriginal | NavigationOutcome::OffTarget => {
                    ScriptState::Stopped
                }
            };
        }

        if self.features.in_page_rewriting {
            tracing::info!("in-page rewriting active on {}", href);
            ScriptState::Observing
        } else {
            ScriptState::Inactive
        }
    }
}
