//! Object key to invalidation path translation
//!
//! Turns keys from change notifications into CDN path patterns, either 1:1
//! (direct mode) or through an ordered table of regex mapping rules.

use crate::models::{InvalidationMode, MappingRule};
use regex::Regex;
use std::collections::BTreeSet;
use tracing::{info, warn};

/// Prefix `path` with exactly one `/`.
pub fn normalize_path(path: &str) -> String {
    format!("/{}", path.trim_start_matches('/'))
}

/// A mapping rule with its pattern compiled for whole-key matching.
#[derive(Debug)]
struct CompiledRule {
    source_pattern: String,
    /// `None` when the pattern failed to compile; the rule never matches.
    matcher: Option<Regex>,
    invalidation_paths: Vec<String>,
}

impl CompiledRule {
    fn compile(rule: &MappingRule) -> Self {
        let matcher = match Regex::new(&format!("^(?:{})$", rule.source_pattern)) {
            Ok(regex) => Some(regex),
            Err(e) => {
                warn!(
                    "Invalid regex pattern '{}', rule will never match: {}",
                    rule.source_pattern, e
                );
                None
            }
        };

        Self {
            source_pattern: rule.source_pattern.clone(),
            matcher,
            invalidation_paths: rule
                .invalidation_paths
                .iter()
                .map(|p| normalize_path(p))
                .collect(),
        }
    }

    fn matches(&self, key: &str) -> bool {
        self.matcher.as_ref().is_some_and(|m| m.is_match(key))
    }
}

#[derive(Debug)]
enum Policy {
    Direct,
    Custom(Vec<CompiledRule>),
}

/// Translates object keys according to the configured [`InvalidationMode`].
#[derive(Debug)]
pub struct PathTranslator {
    policy: Policy,
}

impl PathTranslator {
    pub fn new(mode: &InvalidationMode) -> Self {
        let policy = match mode {
            InvalidationMode::Direct => Policy::Direct,
            InvalidationMode::Custom(rules) => {
                Policy::Custom(rules.iter().map(CompiledRule::compile).collect())
            }
        };
        Self { policy }
    }

    /// Paths to invalidate for one key. Empty when no custom rule matches.
    pub fn translate(&self, key: &str) -> Vec<String> {
        match &self.policy {
            Policy::Direct => vec![normalize_path(key)],
            Policy::Custom(rules) => match rules.iter().find(|rule| rule.matches(key)) {
                Some(rule) => {
                    info!(
                        "Path '{}' matched pattern '{}', adding: {:?}",
                        key, rule.source_pattern, rule.invalidation_paths
                    );
                    rule.invalidation_paths.clone()
                }
                None => {
                    info!("No mapping found for path: {}", key);
                    Vec::new()
                }
            },
        }
    }

    /// Union of the translations of every key in the batch.
    pub fn translate_all(&self, keys: &[String]) -> BTreeSet<String> {
        keys.iter().flat_map(|key| self.translate(key)).collect()
    }
}
