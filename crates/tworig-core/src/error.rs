//! Reasons a candidate URL is left untouched.
//!
//! None of these ever reach a caller of [`crate::url_model::normalize`]; they
//! surface only through [`crate::url_model::inspect`] for diagnostics.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    /// Input was empty or whitespace.
    #[error("empty input")]
    Empty,
    /// Input does not mention the target host at all (cheap pre-check).
    #[error("target host not present in input")]
    NoTargetMention,
    /// Input could not be parsed as an absolute URL.
    #[error("unparseable URL: {0}")]
    Unparseable(#[from] url::ParseError),
    /// URL parsed but has no host (e.g. `data:` or `mailto:`).
    #[error("URL has no host")]
    NoHost,
    /// URL points at some other host.
    #[error("off-target host: {host}")]
    OffTarget { host: String },
}
