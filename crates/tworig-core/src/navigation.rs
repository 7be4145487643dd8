//! Direct navigation: the page itself is an image on the target host.

use url::Url;

use crate::target::{target, TargetConfig};
use crate::url_model::{inspect_with, Verdict};

/// The active page's address as the host environment exposes it.
pub trait Location {
    /// Current absolute address.
    fn href(&self) -> String;

    /// Replace the current history entry with `url` (never pushes a new entry).
    fn replace(&mut self, url: &str);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationOutcome {
    /// The page address was rewritten and `Location::replace` was called.
    Redirected(String),
    /// On target, nothing to do.
    AlreadyOriginal,
    /// Not on the target host; direct mode does not apply.
    OffTarget,
}

impl NavigationOutcome {
    /// True when the script should stop after this check.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, NavigationOutcome::OffTarget)
    }
}

/// True if `href` is an address on the target host.
pub fn is_on_target(target: &TargetConfig, href: &str) -> bool {
    Url::parse(href)
        .ok()
        .and_then(|u| u.host_str().map(|h| target.is_target_host(h)))
        .unwrap_or(false)
}

/// Runs the redirect check against the global target.
pub fn apply<L: Location + ?Sized>(location: &mut L) -> NavigationOutcome {
    apply_with(target(), location)
}

pub fn apply_with<L: Location + ?Sized>(target: &TargetConfig, location: &mut L) -> NavigationOutcome {
    let href = location.href();
    if !is_on_target(target, &href) {
        return NavigationOutcome::OffTarget;
    }
    match inspect_with(target, &href) {
        Verdict::Rewritten(next) => {
            tracing::info!("redirecting {} -> {}", href, next);
            location.replace(&next);
            NavigationOutcome::Redirected(next)
        }
        Verdict::AlreadyOriginal => NavigationOutcome::AlreadyOriginal,
        Verdict::Rejected(reason) => {
            // Host matched above, so this only happens for odd inputs the
            // pre-check rejects; treat as nothing to do.
            tracing::debug!("direct navigation skipped {}: {}", href, reason);
            NavigationOutcome::OffTarget
        }
    }
}

/// In-memory location that records history replacements.
#[derive(Debug, Clone, Default)]
pub struct RecordedLocation {
    href: String,
    /// Every address passed to `replace`, in order.
    pub replacements: Vec<String>,
}

impl RecordedLocation {
    pub fn new(href: &str) -> Self {
        Self {
            href: href.to_string(),
            replacements: Vec::new(),
        }
    }
}

impl Location for RecordedLocation {
    fn href(&self) -> String {
        self.href.clone()
    }

    fn replace(&mut self, url: &str) {
        self.href = url.to_string();
        self.replacements.push(url.to_string());
    }
}
