//! Auto-responder subsystem.
//!
//! # Data Flow
//! ```text
//! Rule file (one `<path regex> "<local file>"` per line)
//!     → parser.rs (line grammar, compile path patterns)
//!     → RuleSet (ordered, immutable)
//!     → store.rs (atomic publish into RuleStore)
//!
//! Per request:
//!     request path
//!     → RuleStore::lookup (one atomic load of the current RuleSet)
//!     → rules.rs (ordered evaluation, first match wins)
//!     → Some(local file pattern) or None
//!
//! On reload (SIGHUP or rule file change):
//!     parser.rs builds a new RuleSet off to the side
//!     → swap into RuleStore
//!     → in-flight lookups finish on the old set
//! ```

pub mod error;
pub mod parser;
pub mod rules;
pub mod store;

pub use error::{RuleError, EX_DATAERR};
pub use rules::{CompileOptions, MatchMode, Rule, RuleSet};
pub use store::{RuleStore, StoreSettings};
