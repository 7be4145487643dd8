pub mod config;
pub mod logging;

pub mod dom;
pub mod error;
pub mod navigation;
pub mod rewriter;
pub mod script;
pub mod session;
pub mod target;
pub mod url_model;
pub mod watch;
