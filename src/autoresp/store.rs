//! Rule store lifecycle.
//!
//! # Responsibilities
//! - Load the rule file into an immutable `RuleSet`
//! - Publish, replace and discard the set while lookups run
//! - Answer path lookups from the current snapshot
//!
//! # Design Decisions
//! - The current set lives behind `ArcSwapOption`: lookups are a single
//!   atomic load, reload swaps one pointer after the new set is fully built
//! - Writers (init, reload, destroy) are serialized by a mutex
//! - `None` means uninitialized; `Some` with zero rules is a loaded empty file

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use arc_swap::ArcSwapOption;

use crate::autoresp::error::RuleError;
use crate::autoresp::parser::load_rules;
use crate::autoresp::rules::{CompileOptions, MatchMode, RuleSet};
use crate::config::AutoresponderConfig;
use crate::observability::metrics;

/// Settings a store is constructed with.
#[derive(Debug, Clone, Default)]
pub struct StoreSettings {
    /// Rule file; `None` disables auto-response.
    pub rules_path: Option<PathBuf>,
    pub match_mode: MatchMode,
    pub compile: CompileOptions,
}

impl From<&AutoresponderConfig> for StoreSettings {
    fn from(config: &AutoresponderConfig) -> Self {
        Self {
            rules_path: config.rules_path.clone(),
            match_mode: config.match_mode,
            compile: CompileOptions {
                case_insensitive: config.case_insensitive,
            },
        }
    }
}

/// Owner of the active rule set.
///
/// Shared via `Arc` between the request path and the reload triggers.
#[derive(Debug)]
pub struct RuleStore {
    settings: StoreSettings,
    current: ArcSwapOption<RuleSet>,
    write_lock: Mutex<()>,
}

impl RuleStore {
    /// Create an empty, uninitialized store.
    pub fn new(settings: StoreSettings) -> Self {
        Self {
            settings,
            current: ArcSwapOption::empty(),
            write_lock: Mutex::new(()),
        }
    }

    /// Create a store with a rule file and default options.
    pub fn with_rules_path(path: impl Into<PathBuf>) -> Self {
        Self::new(StoreSettings {
            rules_path: Some(path.into()),
            ..StoreSettings::default()
        })
    }

    /// A store with no rule file. Every lookup misses.
    pub fn disabled() -> Self {
        Self::new(StoreSettings::default())
    }

    pub fn source(&self) -> Option<&Path> {
        self.settings.rules_path.as_deref()
    }

    pub fn match_mode(&self) -> MatchMode {
        self.settings.match_mode
    }

    pub fn is_initialized(&self) -> bool {
        self.current.load().is_some()
    }

    /// Number of rules in the current set (0 when uninitialized).
    pub fn rule_count(&self) -> usize {
        (*self.current.load()).as_ref().map_or(0, |set| set.len())
    }

    /// The current rule set, if one is loaded.
    pub fn snapshot(&self) -> Option<Arc<RuleSet>> {
        self.current.load_full()
    }

    /// Load the rule file.
    ///
    /// A no-op when already initialized or when no rule file is
    /// configured. A file that cannot be opened leaves the store
    /// uninitialized and is not an error.
    pub fn init(&self) -> Result<(), RuleError> {
        let _guard = self.lock_writers();
        tracing::info!("init auto responder rule list");

        if self.is_initialized() {
            tracing::info!("autoresponder rule list was already active");
            return Ok(());
        }

        self.load_locked()
    }

    /// Discard the current set. A no-op when uninitialized.
    pub fn destroy(&self) {
        let _guard = self.lock_writers();
        if let Some(old) = self.current.swap(None) {
            tracing::debug!(rules = old.len(), "autoresponder rule list destroyed");
            metrics::record_rule_count(0);
        }
    }

    /// Rebuild the set from the rule file.
    ///
    /// The new set replaces the old one only once it is fully parsed. If
    /// the file cannot be opened the old set is dropped and the store is
    /// left uninitialized. On a fatal parse error the old set stays
    /// published and the error is returned.
    pub fn reload(&self) -> Result<(), RuleError> {
        if self.settings.rules_path.is_none() {
            return Ok(());
        }

        let _guard = self.lock_writers();
        tracing::info!("Re-reading autoresponder rules file");

        let result = self.load_locked();
        metrics::record_reload(if result.is_ok() { "ok" } else { "error" });
        result
    }

    /// Local file pattern of the rule that applies to `path`.
    pub fn lookup(&self, path: &str) -> Option<Arc<str>> {
        let current = self.current.load();
        let target = (*current)
            .as_ref()
            .and_then(|set| set.find(path, self.settings.match_mode))
            .map(|rule| Arc::clone(rule.local_file_pattern()));

        metrics::record_lookup(target.is_some());
        target
    }

    fn load_locked(&self) -> Result<(), RuleError> {
        let Some(path) = self.settings.rules_path.as_deref() else {
            tracing::debug!("no autoresponder rules file configured");
            return Ok(());
        };

        match load_rules(path, self.settings.compile)? {
            Some(set) => {
                tracing::info!(path = %path.display(), rules = set.len(), "autoresponder rules loaded");
                metrics::record_rule_count(set.len());
                self.current.store(Some(Arc::new(set)));
            }
            None => {
                if self.current.swap(None).is_some() {
                    metrics::record_rule_count(0);
                }
            }
        }
        Ok(())
    }

    fn lock_writers(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for RuleStore {
    fn default() -> Self {
        Self::disabled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn rules_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_end_to_end_lookup() {
        let file = rules_file("^/status$  \"/var/www/status.html\"\n");
        let store = RuleStore::with_rules_path(file.path());
        store.init().unwrap();

        assert_eq!(store.lookup("/status").as_deref(), Some("/var/www/status.html"));
        assert_eq!(store.lookup("/other"), None);
    }

    #[test]
    fn test_uninitialized_store_misses() {
        let file = rules_file("^/status$  \"/var/www/status.html\"\n");
        let store = RuleStore::with_rules_path(file.path());
        assert!(!store.is_initialized());
        assert_eq!(store.lookup("/status"), None);
    }

    #[test]
    fn test_disabled_store() {
        let store = RuleStore::disabled();
        store.init().unwrap();
        store.reload().unwrap();
        assert!(!store.is_initialized());
        assert_eq!(store.lookup("/anything"), None);
    }

    #[test]
    fn test_missing_file_leaves_store_uninitialized() {
        let store = RuleStore::with_rules_path("/no/such/dir/rules.txt");
        store.init().unwrap();
        assert!(!store.is_initialized());
        assert_eq!(store.lookup("/status"), None);
    }

    #[test]
    fn test_init_twice_is_noop() {
        let mut file = rules_file("^/a$ \"/A\"\n");
        let store = RuleStore::with_rules_path(file.path());
        store.init().unwrap();

        writeln!(file, "^/b$ \"/B\"").unwrap();
        file.flush().unwrap();
        store.init().unwrap();

        assert_eq!(store.rule_count(), 1);
        assert_eq!(store.lookup("/b"), None);
    }

    #[test]
    fn test_destroy_twice_is_safe() {
        let file = rules_file("^/a$ \"/A\"\n");
        let store = RuleStore::with_rules_path(file.path());
        store.init().unwrap();

        store.destroy();
        store.destroy();
        assert!(!store.is_initialized());
        assert_eq!(store.rule_count(), 0);
        assert_eq!(store.lookup("/a"), None);

        // A destroyed store can be loaded again.
        store.init().unwrap();
        assert_eq!(store.lookup("/a").as_deref(), Some("/A"));
    }

    #[test]
    fn test_empty_file_initializes_with_no_rules() {
        let file = rules_file("# nothing here\n\n");
        let store = RuleStore::with_rules_path(file.path());
        store.init().unwrap();
        assert!(store.is_initialized());
        assert_eq!(store.rule_count(), 0);
        assert_eq!(store.lookup("/"), None);
    }

    #[test]
    fn test_first_rule_only_mode() {
        let file = rules_file("^/a$ \"/A\"\n^/b$ \"/B\"\n");
        let store = RuleStore::new(StoreSettings {
            rules_path: Some(file.path().to_path_buf()),
            match_mode: MatchMode::FirstRuleOnly,
            ..StoreSettings::default()
        });
        store.init().unwrap();

        assert_eq!(store.lookup("/a").as_deref(), Some("/A"));
        assert_eq!(store.lookup("/b"), None);
    }

    #[test]
    fn test_all_rules_mode_reaches_second_rule() {
        let file = rules_file("^/a$ \"/A\"\n^/b$ \"/B\"\n");
        let store = RuleStore::with_rules_path(file.path());
        store.init().unwrap();
        assert_eq!(store.lookup("/b").as_deref(), Some("/B"));
    }

    #[test]
    fn test_bad_pattern_on_init_publishes_nothing() {
        let file = rules_file("^/a$ \"/A\"\n^/(b \"/B\"\n");
        let store = RuleStore::with_rules_path(file.path());
        assert!(matches!(store.init(), Err(RuleError::InvalidPattern { .. })));
        assert!(!store.is_initialized());
    }
}
