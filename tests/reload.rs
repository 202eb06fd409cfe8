//! Rule store reload behavior.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use autoresponder::autoresp::{RuleError, RuleStore};

mod common;

use common::RulesFixture;

#[test]
fn test_reload_replaces_not_merges() {
    let rules = RulesFixture::new(
        "^/status$  \"/var/www/status.html\"\n\
         ^/health.* \"/var/www/health.html\"\n",
    );
    let store = RuleStore::with_rules_path(rules.path());
    store.init().unwrap();
    assert_eq!(store.rule_count(), 2);

    rules.replace("^/maintenance$ \"/var/www/maintenance.html\"\n");
    store.reload().unwrap();

    assert_eq!(store.rule_count(), 1);
    assert_eq!(
        store.lookup("/maintenance").as_deref(),
        Some("/var/www/maintenance.html")
    );
    assert_eq!(store.lookup("/status"), None);
    assert_eq!(store.lookup("/health/live"), None);
}

#[test]
fn test_reload_without_prior_init() {
    let rules = RulesFixture::new("^/a$ \"/A\"\n");
    let store = RuleStore::with_rules_path(rules.path());

    store.reload().unwrap();
    assert!(store.is_initialized());
    assert_eq!(store.lookup("/a").as_deref(), Some("/A"));
}

#[test]
fn test_reload_after_file_removed_disables() {
    let rules = RulesFixture::new("^/a$ \"/A\"\n");
    let store = RuleStore::with_rules_path(rules.path());
    store.init().unwrap();

    rules.remove();
    store.reload().unwrap();

    assert!(!store.is_initialized());
    assert_eq!(store.lookup("/a"), None);
}

#[test]
fn test_reload_picks_up_file_that_appears_later() {
    let rules = RulesFixture::new("");
    rules.remove();
    let store = RuleStore::with_rules_path(rules.path());

    store.init().unwrap();
    assert!(!store.is_initialized());

    rules.replace("^/late$ \"/late.html\"\n");
    store.reload().unwrap();
    assert_eq!(store.lookup("/late").as_deref(), Some("/late.html"));
}

#[test]
fn test_bad_pattern_on_reload_keeps_previous_set() {
    let rules = RulesFixture::new("^/a$ \"/A\"\n");
    let store = RuleStore::with_rules_path(rules.path());
    store.init().unwrap();

    rules.replace("^/b$ \"/B\"\n^/[unclosed \"/C\"\n");
    let err = store.reload().unwrap_err();

    assert!(matches!(err, RuleError::InvalidPattern { line: 2, .. }));
    assert_eq!(err.exit_code(), 65);
    assert_eq!(store.lookup("/a").as_deref(), Some("/A"));
    assert_eq!(store.lookup("/b"), None);
}

#[test]
fn test_snapshot_survives_reload() {
    let rules = RulesFixture::new("^/a$ \"/A\"\n");
    let store = RuleStore::with_rules_path(rules.path());
    store.init().unwrap();

    let before = store.snapshot().unwrap();
    rules.replace("^/b$ \"/B\"\n");
    store.reload().unwrap();
    store.destroy();

    assert_eq!(before.len(), 1);
    assert_eq!(before.iter().next().unwrap().path_pattern(), "^/a$");
    assert!(store.snapshot().is_none());
}

#[test]
fn test_concurrent_lookups_see_complete_sets() {
    // Set A maps every /x path to "a", set B maps every /x path to "b".
    // Each set has several rules; a lookup must never mix the two.
    let set_a = "^/x/1$ \"a\"\n^/x/2$ \"a\"\n^/x/3$ \"a\"\n";
    let set_b = "^/x/1$ \"b\"\n^/x/2$ \"b\"\n^/x/3$ \"b\"\n";

    let rules = RulesFixture::new(set_a);
    let store = Arc::new(RuleStore::with_rules_path(rules.path()));
    store.init().unwrap();

    let stop = Arc::new(AtomicBool::new(false));
    let readers: Vec<_> = (0..4)
        .map(|_| {
            let store = store.clone();
            let stop = stop.clone();
            thread::spawn(move || {
                let mut lookups = 0u64;
                loop {
                    let snapshot = store.snapshot().expect("store stays initialized");
                    let targets: Vec<_> = snapshot
                        .iter()
                        .map(|r| r.local_file_pattern().to_string())
                        .collect();
                    assert_eq!(targets.len(), 3);
                    assert!(targets.iter().all(|t| t == &targets[0]));

                    let hit = store.lookup("/x/3").expect("every set maps /x/3");
                    assert!(&*hit == "a" || &*hit == "b");
                    lookups += 1;
                    if stop.load(Ordering::Relaxed) {
                        break lookups;
                    }
                }
            })
        })
        .collect();

    for i in 0..50 {
        rules.replace(if i % 2 == 0 { set_b } else { set_a });
        store.reload().unwrap();
    }
    stop.store(true, Ordering::Relaxed);

    for reader in readers {
        assert!(reader.join().unwrap() > 0);
    }
}
