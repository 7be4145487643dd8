//! `tworig check <url>` – show the normalizer's verdict.

use tworig_core::url_model::{self, Verdict};

pub(crate) fn describe(url: &str) -> String {
    match url_model::inspect(url) {
        Verdict::Rewritten(next) => format!("rewrite: {next}"),
        Verdict::AlreadyOriginal => "unchanged: already original".to_string(),
        Verdict::Rejected(reason) => format!("unchanged: {reason}"),
    }
}

pub fn run_check(url: &str) {
    println!("{}", describe(url));
}
