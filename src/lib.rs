//! Rule-based path-to-local-file auto-responder for HTTP proxies.

pub mod autoresp;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use autoresp::{MatchMode, RuleError, RuleSet, RuleStore, StoreSettings};
pub use config::ResponderConfig;
pub use http::{AutoRespondLayer, DecisionServer, LocalSubstitute};
pub use lifecycle::Shutdown;
