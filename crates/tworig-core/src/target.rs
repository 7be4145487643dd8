//! Fixed rewrite target: which host, which query key, which value.

use once_cell::sync::Lazy;

/// CDN host serving Twitter/X media.
pub const TARGET_HOST: &str = "pbs.twimg.com";
/// Query key selecting the served image variant.
pub const TARGET_PARAM: &str = "name";
/// Variant name for the unmodified original upload.
pub const TARGET_VALUE: &str = "orig";

/// Host, key and value the normalizer enforces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetConfig {
    pub host: String,
    pub param: String,
    pub value: String,
}

impl TargetConfig {
    pub fn new(host: &str, param: &str, value: &str) -> Self {
        Self {
            host: host.to_ascii_lowercase(),
            param: param.to_string(),
            value: value.to_string(),
        }
    }

    /// True if `host` is this target's host (hosts from `url::Url` are already lowercase).
    pub fn is_target_host(&self, host: &str) -> bool {
        host.eq_ignore_ascii_case(&self.host)
    }
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self::new(TARGET_HOST, TARGET_PARAM, TARGET_VALUE)
    }
}

static TARGET: Lazy<TargetConfig> = Lazy::new(TargetConfig::default);

/// Process-wide target, initialized once on first use.
pub fn target() -> &'static TargetConfig {
    &TARGET
}
