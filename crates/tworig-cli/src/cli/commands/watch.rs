//! `tworig watch` – stream page events in, stream rewrites out.

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tworig_core::config::TworigConfig;
use tworig_core::dom::PageSnapshot;
use tworig_core::rewriter::PageRewriter;
use tworig_core::session::{self, PageEvent, Session};

/// Parses one JSON Lines input; blank lines are skipped.
pub(crate) fn parse_event(line: &str) -> Option<Result<PageEvent>> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    Some(serde_json::from_str(line).with_context(|| format!("bad page event: {line}")))
}

pub async fn run_watch(cfg: &TworigConfig, base: &str, lazy_images: bool) -> Result<()> {
    let doc = PageSnapshot {
        url: base.to_string(),
        body: Vec::new(),
    }
    .to_document()?;
    let rewriter = PageRewriter::new(cfg.rewrite_options());
    let session = Session::new(doc, rewriter, lazy_images);

    let (event_tx, event_rx) = mpsc::channel::<PageEvent>(64);
    let (rewrite_tx, mut rewrite_rx) = mpsc::channel(64);

    let reader = async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            // Stop reading as soon as the loop is gone (unload), even if stdin stays open.
            let line = tokio::select! {
                line = lines.next_line() => line?,
                _ = event_tx.closed() => break,
            };
            let Some(line) = line else { break };
            match parse_event(&line) {
                None => continue,
                Some(Ok(event)) => {
                    if event_tx.send(event).await.is_err() {
                        break;
                    }
                }
                Some(Err(err)) => tracing::warn!("{:#}", err),
            }
        }
        Ok::<_, anyhow::Error>(())
    };

    let printer = async move {
        while let Some(rewrite) = rewrite_rx.recv().await {
            println!("{}", serde_json::to_string(&rewrite)?);
        }
        Ok::<_, anyhow::Error>(())
    };

    let (read_result, (_, summary), print_result) =
        tokio::join!(reader, session::run(session, event_rx, rewrite_tx), printer);
    read_result?;
    print_result?;
    eprintln!(
        "{} events, {} rewrites, {} skipped",
        summary.events, summary.rewrites, summary.rejected_events
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_or_skips_lines() {
        assert!(parse_event("   ").is_none());
        assert!(matches!(
            parse_event(r#"{"type":"hover","node":1}"#),
            Some(Ok(PageEvent::Hover { .. }))
        ));
        assert!(matches!(parse_event("{\"type\":\"explode\"}"), Some(Err(_))));
    }
}
