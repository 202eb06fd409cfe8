//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ResponderConfig (validated, immutable)
//!
//! Rule file changes:
//!     watcher.rs detects change
//!     → reload request sent over channel
//!     → RuleStore::reload builds and swaps a new RuleSet
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; only the rule file hot-reloads
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, ConfigError};
pub use schema::{
    AutoresponderConfig, ListenerConfig, LogFormat, ObservabilityConfig, ResponderConfig,
    TimeoutConfig,
};
pub use watcher::RulesWatcher;
