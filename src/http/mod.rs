//! HTTP integration subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request
//!     → layer.rs (AutoRespondLayer: lookup on the request path)
//!     → LocalSubstitute extension attached when a rule matches
//!     → downstream pipeline decides how to use it
//!
//! Decision service (server.rs):
//!     any path → 200 + x-autoresponder-target, or 404
//! ```
//!
//! # Design Decisions
//! - The layer never reads or serves the local file
//! - Lookups are synchronous and lock-free, so the layer adds no await point

pub mod layer;
pub mod server;

pub use layer::{AutoRespond, AutoRespondLayer, LocalSubstitute};
pub use server::{DecisionServer, X_AUTORESPONDER_TARGET};
