mod read;
mod readers;
mod watch;

pub use read::cmd_read;
pub use readers::{cmd_atr, cmd_readers};
pub use watch::cmd_watch;

/// Outcome of a one-shot command; the message goes to stderr
pub type CommandResult = Result<(), String>;
