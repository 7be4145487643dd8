//! `tworig normalize [URL...]` – rewrite URLs, or stdin lines when none are given.

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tworig_core::url_model;

/// Output line for one input, or `None` when it should be suppressed.
pub(crate) fn render_line(input: &str, changed_only: bool) -> Option<String> {
    match url_model::normalize(input) {
        Some(rewritten) => Some(rewritten),
        None if changed_only => None,
        None => Some(input.to_string()),
    }
}

pub async fn run_normalize(urls: Vec<String>, changed_only: bool) -> Result<()> {
    if !urls.is_empty() {
        for url in &urls {
            if let Some(line) = render_line(url, changed_only) {
                println!("{line}");
            }
        }
        return Ok(());
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut seen = 0usize;
    while let Some(line) = lines.next_line().await? {
        seen += 1;
        if let Some(out) = render_line(line.trim_end_matches('\r'), changed_only) {
            println!("{out}");
        }
    }
    tracing::debug!("normalized {} lines from stdin", seen);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passes_through_or_suppresses_unchanged() {
        assert_eq!(
            render_line("https://pbs.twimg.com/media/A.jpg", false).as_deref(),
            Some("https://pbs.twimg.com/media/A.jpg?name=orig")
        );
        assert_eq!(
            render_line("https://x.com/home", false).as_deref(),
            Some("https://x.com/home")
        );
        assert_eq!(render_line("https://x.com/home", true), None);
    }
}
