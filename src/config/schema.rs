//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the
//! auto-responder. All types derive Serde traits for deserialization
//! from config files, and every field has a default.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::autoresp::MatchMode;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ResponderConfig {
    /// Rule file and matching behavior.
    pub autoresponder: AutoresponderConfig,

    /// Listener for the decision service.
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Auto-responder rule settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AutoresponderConfig {
    /// Path to the rule file. Absent disables auto-response.
    pub rules_path: Option<PathBuf>,

    /// Rule evaluation policy.
    pub match_mode: MatchMode,

    /// Compile path patterns case-insensitively.
    pub case_insensitive: bool,

    /// Reload when the rule file changes on disk.
    pub watch: bool,

    /// Poll interval for the file watcher, in seconds.
    pub watch_poll_secs: u64,
}

impl Default for AutoresponderConfig {
    fn default() -> Self {
        Self {
            rules_path: None,
            match_mode: MatchMode::AllRules,
            case_insensitive: true,
            watch: false,
            watch_poll_secs: 2,
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "127.0.0.1:8089").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8089".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout in seconds.
    pub request_secs: u64,

    /// Grace period for in-flight requests on shutdown, in seconds.
    pub shutdown_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 5,
            shutdown_secs: 10,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
