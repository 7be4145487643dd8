//! `tworig rewrite-page <path>` – one full in-page pass over a snapshot.

use anyhow::{Context, Result};
use std::path::Path;
use tworig_core::config::TworigConfig;
use tworig_core::dom::PageSnapshot;
use tworig_core::rewriter::PageRewriter;

pub(crate) fn rewrite_file(
    cfg: &TworigConfig,
    path: &Path,
    base: Option<&str>,
) -> Result<(PageSnapshot, usize)> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("read page snapshot: {}", path.display()))?;
    let mut page: PageSnapshot = serde_json::from_slice(&bytes)
        .with_context(|| format!("parse page snapshot JSON: {}", path.display()))?;
    if let Some(base) = base {
        page.url = base.to_string();
    }

    let mut doc = page.to_document()?;
    let rewriter = PageRewriter::new(cfg.rewrite_options());
    let events = rewriter.scan_document(&mut doc);
    tracing::info!("rewrote {} attributes in {}", events.len(), path.display());
    Ok((PageSnapshot::from_document(&doc), events.len()))
}

pub fn run_rewrite_page(cfg: &TworigConfig, path: &Path, base: Option<&str>) -> Result<()> {
    let (page, _) = rewrite_file(cfg, path, base)?;
    println!("{}", serde_json::to_string_pretty(&page)?);
    Ok(())
}
