//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//!     SIGHUP → ReloadTrigger::Signal
//!
//! Rule file watcher (config::watcher):
//!     change → ReloadTrigger::FileChanged
//!
//! Reload (reload.rs):
//!     ReloadTrigger → RuleStore::reload on the blocking pool
//!     fatal rule error or aborted task → loop exits with ReloadError
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Drain → RuleStore::destroy → Exit
//! ```

pub mod reload;
pub mod shutdown;
pub mod signals;

pub use reload::{run_reload_loop, ReloadError, ReloadTrigger};
pub use shutdown::{Shutdown, ShutdownReason, ShutdownSignal};
