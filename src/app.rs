//! Batch orchestration: parse, translate, optimize, submit, report.

use crate::cdn::{CloudFrontClient, InvalidationService, MockInvalidationClient};
use crate::models::{BatchEvent, BatchResponse, ChangeRecord, Config, QueueMessage};
use crate::optimize::optimize;
use crate::submitter::Submitter;
use crate::translate::PathTranslator;
use crate::{Error, Result};
use serde_json::Value;
use tracing::{debug, error, info, warn};

/// Handles one queue batch end to end and reports which messages to redeliver.
pub struct App {
    translator: PathTranslator,
    submitter: Submitter,
}

/// Object keys named by the change notification in `message`'s body.
///
/// A body without a `Records` array is a valid message with no keys.
pub fn extract_keys(message: &QueueMessage) -> Result<Vec<String>> {
    let malformed = |reason: String| Error::MalformedMessage {
        message_id: message.message_id.clone(),
        reason,
    };

    let raw = match &message.body {
        Some(Value::String(raw)) => raw,
        Some(other) => {
            return Err(malformed(format!(
                "body must be a JSON string, got {}",
                other
            )))
        }
        None => return Err(malformed("body is missing".to_string())),
    };

    let body: Value = serde_json::from_str(raw).map_err(|e| malformed(e.to_string()))?;

    let Some(records) = body.get("Records") else {
        return Ok(Vec::new());
    };

    let records: Vec<ChangeRecord> =
        serde_json::from_value(records.clone()).map_err(|e| malformed(e.to_string()))?;

    Ok(records
        .into_iter()
        .filter_map(|record| record.s3)
        .map(|s3| s3.object.key)
        .collect())
}

fn push_unique(ids: &mut Vec<String>, id: &str) {
    if !ids.iter().any(|existing| existing == id) {
        ids.push(id.to_string());
    }
}

impl App {
    /// Build an app around an injected invalidation service.
    pub fn with_service(config: &Config, service: Box<dyn InvalidationService>) -> Self {
        info!(
            "Invalidation mode: {} (distribution: {})",
            config.mode.name(),
            config.distribution_id
        );

        Self {
            translator: PathTranslator::new(&config.mode),
            submitter: Submitter::new(service, config.distribution_id.clone()),
        }
    }

    /// Build an app that talks to CloudFront, or only logs when `dry_run` is set.
    pub async fn new(config: &Config) -> Self {
        let service: Box<dyn InvalidationService> = if config.dry_run {
            info!("DRY_RUN enabled, invalidations will be logged, not sent");
            Box::new(MockInvalidationClient::new())
        } else {
            Box::new(CloudFrontClient::new().await)
        };

        Self::with_service(config, service)
    }

    /// Process one batch. Never fails: every problem ends up in the report.
    pub async fn handle_batch(&self, event: &BatchEvent) -> BatchResponse {
        info!("Processing {} queue messages", event.records.len());

        let mut failed: Vec<String> = Vec::new();
        let mut parsed: Vec<&str> = Vec::new();
        let mut keys: Vec<String> = Vec::new();

        for message in &event.records {
            match extract_keys(message) {
                Ok(found) => {
                    for key in &found {
                        debug!("Collected object key: {}", key);
                    }
                    keys.extend(found);
                    parsed.push(&message.message_id);
                }
                Err(e) => {
                    warn!("Error parsing message: {}", e);
                    push_unique(&mut failed, &message.message_id);
                }
            }
        }

        if keys.is_empty() {
            info!("No valid object keys found in batch");
            return BatchResponse::from_failures(failed);
        }

        let translated = self.translator.translate_all(&keys);
        let paths = optimize(&translated);

        if paths.is_empty() {
            info!("No invalidation paths generated");
            return BatchResponse::from_failures(failed);
        }

        if let Err(e) = self.submitter.submit(&paths).await {
            error!("Invalidation failed, returning batch for redelivery: {}", e);
            for id in parsed {
                push_unique(&mut failed, id);
            }
        }

        BatchResponse::from_failures(failed)
    }
}
