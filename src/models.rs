//! Data models and structures
//!
//! Defines the inbound queue batch, the object-store change notification
//! carried in each message body, the partial-failure response, and the
//! process-wide configuration.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A batch of queue messages delivered in one invocation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchEvent {
    #[serde(rename = "Records", default)]
    pub records: Vec<QueueMessage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueMessage {
    pub message_id: String,
    /// Not used for acknowledgement; the queue redelivers by `message_id`.
    /// Kept so events round-trip unchanged.
    #[serde(default)]
    pub receipt_handle: String,
    /// Raw body as delivered. Anything other than a JSON string is rejected
    /// per message, not while reading the batch.
    #[serde(default)]
    pub body: Option<Value>,
}

impl QueueMessage {
    pub fn new(message_id: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            message_id: message_id.into(),
            receipt_handle: String::new(),
            body: Some(Value::String(body.into())),
        }
    }
}

/// One entry of the `Records` array inside an object-store notification.
///
/// Entries without an `s3` entity (for example other event sources fanned
/// into the same queue) carry no key and are skipped.
#[derive(Debug, Clone, Deserialize)]
pub struct ChangeRecord {
    #[serde(default)]
    pub s3: Option<S3Entity>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct S3Entity {
    pub object: S3Object,
}

#[derive(Debug, Clone, Deserialize)]
pub struct S3Object {
    pub key: String,
}

/// Partial batch failure report understood by the queue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResponse {
    pub batch_item_failures: Vec<BatchItemFailure>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchItemFailure {
    pub item_identifier: String,
}

impl BatchResponse {
    pub fn from_failures(message_ids: Vec<String>) -> Self {
        Self {
            batch_item_failures: message_ids
                .into_iter()
                .map(|item_identifier| BatchItemFailure { item_identifier })
                .collect(),
        }
    }

    pub fn failed_ids(&self) -> Vec<&str> {
        self.batch_item_failures
            .iter()
            .map(|f| f.item_identifier.as_str())
            .collect()
    }

    pub fn is_success(&self) -> bool {
        self.batch_item_failures.is_empty()
    }
}

/// Maps object keys matching `source_pattern` to a fixed list of paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingRule {
    #[serde(default)]
    pub source_pattern: String,
    #[serde(default)]
    pub invalidation_paths: Vec<String>,
}

impl MappingRule {
    pub fn new(source_pattern: &str, invalidation_paths: &[&str]) -> Self {
        Self {
            source_pattern: source_pattern.to_string(),
            invalidation_paths: invalidation_paths.iter().map(|p| p.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidationMode {
    /// Invalidate each changed key as-is.
    Direct,
    /// Translate keys through ordered mapping rules, first match wins.
    Custom(Vec<MappingRule>),
}

impl InvalidationMode {
    pub fn name(&self) -> &'static str {
        match self {
            InvalidationMode::Direct => "direct",
            InvalidationMode::Custom(_) => "custom",
        }
    }
}

// Configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub distribution_id: String,
    pub mode: InvalidationMode,
    pub dry_run: bool,
}

impl Config {
    pub fn new(distribution_id: impl Into<String>, mode: InvalidationMode) -> Self {
        Self {
            distribution_id: distribution_id.into(),
            mode,
            dry_run: false,
        }
    }

    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Build a config from any variable source.
    pub fn from_vars<F>(var: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let distribution_id = var("CLOUDFRONT_DISTRIBUTION_ID")
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| Error::Config("CLOUDFRONT_DISTRIBUTION_ID not set".to_string()))?;

        let mappings: Vec<MappingRule> = match var("PATH_MAPPINGS") {
            Some(raw) if !raw.trim().is_empty() => serde_json::from_str(&raw)
                .map_err(|e| Error::Config(format!("PATH_MAPPINGS is not valid JSON: {}", e)))?,
            _ => Vec::new(),
        };

        let mode = match var("INVALIDATION_MODE")
            .map(|m| m.trim().to_lowercase())
            .as_deref()
        {
            None | Some("") | Some("direct") => InvalidationMode::Direct,
            Some("custom") => InvalidationMode::Custom(mappings),
            Some(other) => {
                return Err(Error::Config(format!(
                    "INVALIDATION_MODE must be 'direct' or 'custom', got '{}'",
                    other
                )))
            }
        };

        let dry_run = var("DRY_RUN")
            .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Ok(Self {
            distribution_id,
            mode,
            dry_run,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_config_defaults_to_direct_mode() {
        let config = Config::from_vars(vars(&[("CLOUDFRONT_DISTRIBUTION_ID", "E123")])).unwrap();
        assert_eq!(config.distribution_id, "E123");
        assert_eq!(config.mode, InvalidationMode::Direct);
        assert!(!config.dry_run);
    }

    #[test]
    fn test_config_requires_distribution_id() {
        let err = Config::from_vars(vars(&[])).unwrap_err();
        assert!(err.to_string().contains("CLOUDFRONT_DISTRIBUTION_ID"));

        let err = Config::from_vars(vars(&[("CLOUDFRONT_DISTRIBUTION_ID", "  ")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_config_custom_mode_loads_rules_in_order() {
        let config = Config::from_vars(vars(&[
            ("CLOUDFRONT_DISTRIBUTION_ID", "E123"),
            ("INVALIDATION_MODE", "Custom"),
            (
                "PATH_MAPPINGS",
                r#"[{"source_pattern": "^assets/.*", "invalidation_paths": ["/assets/*"]},
                    {"source_pattern": ".*\\.html", "invalidation_paths": ["/index.html", "/"]}]"#,
            ),
        ]))
        .unwrap();

        match config.mode {
            InvalidationMode::Custom(rules) => {
                assert_eq!(rules.len(), 2);
                assert_eq!(rules[0], MappingRule::new("^assets/.*", &["/assets/*"]));
                assert_eq!(rules[1].invalidation_paths, vec!["/index.html", "/"]);
            }
            other => panic!("expected custom mode, got {:?}", other),
        }
    }

    #[test]
    fn test_config_rejects_unknown_mode() {
        let err = Config::from_vars(vars(&[
            ("CLOUDFRONT_DISTRIBUTION_ID", "E123"),
            ("INVALIDATION_MODE", "regex"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("'regex'"));
    }

    #[test]
    fn test_config_rejects_malformed_mappings() {
        let err = Config::from_vars(vars(&[
            ("CLOUDFRONT_DISTRIBUTION_ID", "E123"),
            ("INVALIDATION_MODE", "custom"),
            ("PATH_MAPPINGS", "{not json"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("PATH_MAPPINGS"));
    }

    #[test]
    fn test_config_dry_run_flag() {
        let config = Config::from_vars(vars(&[
            ("CLOUDFRONT_DISTRIBUTION_ID", "E123"),
            ("DRY_RUN", "true"),
        ]))
        .unwrap();
        assert!(config.dry_run);
    }

    #[test]
    fn test_batch_event_deserialization() {
        let json = r#"{"Records": [
            {"messageId": "m-1", "receiptHandle": "rh-1", "body": "{}", "eventSource": "aws:sqs"}
        ]}"#;
        let event: BatchEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.records.len(), 1);
        assert_eq!(event.records[0].message_id, "m-1");
        assert_eq!(event.records[0].receipt_handle, "rh-1");
    }

    #[test]
    fn test_batch_event_accepts_non_string_bodies() {
        let json = r#"{"Records": [
            {"messageId": "m-1", "body": "{}"},
            {"messageId": "m-2", "body": null},
            {"messageId": "m-3", "body": {"Records": []}},
            {"messageId": "m-4"}
        ]}"#;
        let event: BatchEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.records.len(), 4);
        assert_eq!(event.records[0].body, Some(Value::String("{}".to_string())));
        assert_eq!(event.records[1].body, None);
        assert!(event.records[2].body.as_ref().is_some_and(Value::is_object));
        assert_eq!(event.records[3].body, None);
    }

    #[test]
    fn test_batch_response_serialization() {
        let response = BatchResponse::from_failures(vec!["m-2".to_string()]);
        let json = serde_json::to_string(&response).unwrap();
        assert_eq!(json, r#"{"batchItemFailures":[{"itemIdentifier":"m-2"}]}"#);
        assert!(!response.is_success());
        assert!(BatchResponse::default().is_success());
    }
}
