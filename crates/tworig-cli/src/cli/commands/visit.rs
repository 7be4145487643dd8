//! `tworig visit <url>` – what the script does when a page at `url` loads.

use anyhow::Result;
use tworig_core::config::TworigConfig;
use tworig_core::navigation::RecordedLocation;
use tworig_core::script::ScriptState;

pub(crate) fn decide(cfg: &TworigConfig, url: &str) -> Result<ScriptState> {
    let script = cfg.script()?;
    let mut location = RecordedLocation::new(url);
    Ok(script.start(&mut location))
}

pub fn run_visit(cfg: &TworigConfig, url: &str) -> Result<()> {
    match decide(cfg, url)? {
        ScriptState::Redirected(next) => println!("redirect {next}"),
        ScriptState::Stopped => println!("stop"),
        ScriptState::Observing => println!("observe"),
        ScriptState::Inactive => println!("inactive"),
    }
    Ok(())
}
