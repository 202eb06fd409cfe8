//! Compiled rules and rule evaluation.
//!
//! # Responsibilities
//! - Hold a path pattern together with its compiled regex
//! - Keep rules in file order (first defined wins)
//! - Evaluate a request path against the ordered set
//!
//! # Design Decisions
//! - A `RuleSet` is immutable once built; reload builds a new one
//! - Search semantics, not full-string matching: anchoring is up to the rule author
//! - Local file patterns are opaque and never interpreted here

use std::sync::Arc;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

/// How a path is evaluated against the ordered rule set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Walk every rule in order and return the first match.
    #[default]
    AllRules,
    /// Only the first rule is ever evaluated. Kept for parity with
    /// deployments that depend on the historical behavior.
    FirstRuleOnly,
}

/// Options applied when compiling path patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompileOptions {
    pub case_insensitive: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            case_insensitive: true,
        }
    }
}

impl CompileOptions {
    /// Compile a pattern with these options.
    ///
    /// `^` and `$` also match at embedded newlines.
    pub fn compile(&self, pattern: &str) -> Result<Regex, regex::Error> {
        RegexBuilder::new(pattern)
            .case_insensitive(self.case_insensitive)
            .multi_line(true)
            .build()
    }
}

/// A single path pattern → local file pattern mapping.
#[derive(Debug, Clone)]
pub struct Rule {
    path_pattern: String,
    local_file_pattern: Arc<str>,
    regex: Regex,
}

impl Rule {
    /// Compile `path_pattern` and build a rule.
    pub fn new(
        path_pattern: impl Into<String>,
        local_file_pattern: impl Into<Arc<str>>,
        options: CompileOptions,
    ) -> Result<Self, regex::Error> {
        let path_pattern = path_pattern.into();
        let regex = options.compile(&path_pattern)?;
        Ok(Self {
            path_pattern,
            local_file_pattern: local_file_pattern.into(),
            regex,
        })
    }

    pub fn path_pattern(&self) -> &str {
        &self.path_pattern
    }

    pub fn local_file_pattern(&self) -> &Arc<str> {
        &self.local_file_pattern
    }

    /// Returns true if the compiled pattern matches anywhere in `path`.
    pub fn matches(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }
}

/// Ordered collection of rules, in rule-file order.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule. Later rules have lower priority.
    pub fn push(&mut self, rule: Rule) {
        self.rules.push(rule);
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    /// Find the rule that applies to `path` under `mode`.
    pub fn find(&self, path: &str, mode: MatchMode) -> Option<&Rule> {
        match mode {
            MatchMode::AllRules => self.rules.iter().find(|rule| rule.matches(path)),
            MatchMode::FirstRuleOnly => self.rules.first().filter(|rule| rule.matches(path)),
        }
    }
}

impl FromIterator<Rule> for RuleSet {
    fn from_iter<I: IntoIterator<Item = Rule>>(iter: I) -> Self {
        Self {
            rules: iter.into_iter().collect(),
        }
    }
}
