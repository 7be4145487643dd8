use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::rewriter::RewriteOptions;
use crate::script::{Features, Script, DEFAULT_MATCH_PATTERNS};

fn default_true() -> bool {
    true
}

fn default_match_patterns() -> Vec<String> {
    DEFAULT_MATCH_PATTERNS.iter().map(|p| p.to_string()).collect()
}

/// Global configuration loaded from `~/.config/tworig/config.toml`.
///
/// The rewrite target itself (host, key, value) is fixed at compile time;
/// only the delivery modes are configurable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TworigConfig {
    /// Redirect image pages on the CDN host to their original variant.
    #[serde(default = "default_true")]
    pub direct_navigation: bool,
    /// Rewrite image and link URLs inside matched site pages.
    #[serde(default = "default_true")]
    pub in_page_rewriting: bool,
    /// Rewrite images only once they become visible.
    #[serde(default)]
    pub lazy_images: bool,
    /// Pages the script runs on, userscript `@match` syntax.
    #[serde(default = "default_match_patterns")]
    pub match_patterns: Vec<String>,
    /// Optional attribute toggles; if missing, built-in defaults are used.
    #[serde(default)]
    pub rewrite: Option<RewriteOptions>,
}

impl Default for TworigConfig {
    fn default() -> Self {
        Self {
            direct_navigation: true,
            in_page_rewriting: true,
            lazy_images: false,
            match_patterns: default_match_patterns(),
            rewrite: None,
        }
    }
}

impl TworigConfig {
    pub fn features(&self) -> Features {
        Features {
            direct_navigation: self.direct_navigation,
            in_page_rewriting: self.in_page_rewriting,
        }
    }

    pub fn rewrite_options(&self) -> RewriteOptions {
        self.rewrite.unwrap_or_default()
    }

    /// Builds the start-up script; fails on a malformed match pattern.
    pub fn script(&self) -> Result<Script> {
        Script::from_patterns(self.features(), self.match_patterns.as_slice())
            .context("invalid match_patterns in config")
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("tworig")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<TworigConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = TworigConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from(&path)
}

/// Load configuration from an explicit file.
pub fn load_from(path: &Path) -> Result<TworigConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("read config: {}", path.display()))?;
    let cfg: TworigConfig =
        toml::from_str(&data).with_context(|| format!("parse config: {}", path.display()))?;
    Ok(cfg)
}
