//! CLI for tworig.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tworig_core::config::{self, TworigConfig};

use commands::{
    run_check, run_completions, run_man, run_normalize, run_rewrite_page, run_visit, run_watch,
};

/// Top-level CLI for tworig.
#[derive(Debug, Parser)]
#[command(name = "tworig")]
#[command(about = "tworig: force Twitter/X image URLs to the original resolution", long_about = None)]
pub struct Cli {
    /// Config file to use instead of ~/.config/tworig/config.toml.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Rewrite URLs to name=orig. Reads one URL per line from stdin when none are given.
    Normalize {
        /// URLs to rewrite.
        urls: Vec<String>,
        /// Print only URLs that were rewritten.
        #[arg(long)]
        changed_only: bool,
    },

    /// Explain what the normalizer does with a URL.
    Check {
        /// Candidate URL.
        url: String,
    },

    /// Run the page start-up decision (redirect / observe / nothing) for an address.
    Visit {
        /// Page address.
        url: String,
    },

    /// Rewrite every image and link in a page snapshot (JSON) and print the result.
    RewritePage {
        /// Path to the page snapshot.
        path: PathBuf,
        /// Override the page address used to resolve relative URLs.
        #[arg(long, value_name = "URL")]
        base: Option<String>,
    },

    /// Observe a page: read page events (JSON Lines) on stdin, print rewrites as JSON Lines.
    Watch {
        /// Page address the events belong to; relative URLs resolve against it.
        #[arg(long, default_value = "https://x.com/", value_name = "URL")]
        base: String,
        /// Rewrite images only when a `visible` event names them.
        #[arg(long)]
        lazy_images: bool,
    },

    /// Print shell completions.
    Completions {
        /// Target shell.
        shell: clap_complete::Shell,
    },

    /// Print the man page.
    Man,
}

fn load_config(path: Option<&Path>) -> Result<TworigConfig> {
    match path {
        Some(p) => config::load_from(p),
        None => config::load_or_init(),
    }
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = load_config(cli.config.as_deref())?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Normalize { urls, changed_only } => run_normalize(urls, changed_only).await?,
            CliCommand::Check { url } => run_check(&url),
            CliCommand::Visit { url } => run_visit(&cfg, &url)?,
            CliCommand::RewritePage { path, base } => {
                run_rewrite_page(&cfg, &path, base.as_deref())?
            }
            CliCommand::Watch { base, lazy_images } => {
                run_watch(&cfg, &base, lazy_images || cfg.lazy_images).await?
            }
            CliCommand::Completions { shell } => run_completions(shell),
            CliCommand::Man => run_man()?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
