//! CLI command handlers, one per file.

mod check;
mod completions;
mod normalize;
mod rewrite_page;
mod visit;
mod watch;

pub use check::run_check;
pub use completions::{run_completions, run_man};
pub use normalize::run_normalize;
pub use rewrite_page::run_rewrite_page;
pub use visit::run_visit;
pub use watch::run_watch;
