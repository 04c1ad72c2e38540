//! Invalidation submission with bounded retry
//!
//! Sends the whole batch as a single CreateInvalidation call. Permission
//! failures are terminal; every other failure is retried with exponential
//! backoff (2s, then 4s) up to [`MAX_ATTEMPTS`] calls in total.

use crate::cdn::{InvalidationRequest, InvalidationService};
use crate::error::ProviderError;
use crate::optimize::UNIVERSAL_WILDCARD;
use crate::Result;
use chrono::Utc;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio_retry::strategy::ExponentialBackoff;
use tokio_retry::RetryIf;
use tracing::{error, info, warn};

/// CloudFront's per-request path quota.
pub const MAX_PATHS_PER_REQUEST: usize = 3000;

pub const MAX_ATTEMPTS: usize = 3;

/// Delay before retry `n` (starting at 1) is `2^n` seconds.
pub fn backoff_schedule() -> impl Iterator<Item = Duration> {
    ExponentialBackoff::from_millis(2)
        .factor(1000)
        .take(MAX_ATTEMPTS - 1)
}

pub struct Submitter {
    service: Box<dyn InvalidationService>,
    distribution_id: String,
}

impl Submitter {
    pub fn new(service: Box<dyn InvalidationService>, distribution_id: String) -> Self {
        Self {
            service,
            distribution_id,
        }
    }

    /// Build the request for `paths`, falling back to `/*` above the quota.
    ///
    /// The caller reference has one-second resolution, so two submissions for
    /// the same distribution within one second share a token.
    pub fn build_request(&self, paths: &BTreeSet<String>) -> InvalidationRequest {
        let paths = if paths.len() > MAX_PATHS_PER_REQUEST {
            warn!(
                "{} paths exceeds limit of {}, using wildcard {}",
                paths.len(),
                MAX_PATHS_PER_REQUEST,
                UNIVERSAL_WILDCARD
            );
            vec![UNIVERSAL_WILDCARD.to_string()]
        } else {
            paths.iter().cloned().collect()
        };

        InvalidationRequest {
            distribution_id: self.distribution_id.clone(),
            paths,
            caller_reference: format!("invalidation-{}", Utc::now().timestamp()),
        }
    }

    /// Submit `paths` and return the invalidation id.
    pub async fn submit(&self, paths: &BTreeSet<String>) -> Result<String> {
        let request = &self.build_request(paths);
        let attempts = &AtomicUsize::new(0);

        let strategy = backoff_schedule().map(|delay| {
            info!("Sleeping {} seconds before retry...", delay.as_secs());
            delay
        });

        let result = RetryIf::spawn(
            strategy,
            move || async move {
                let attempt = attempts.fetch_add(1, Ordering::SeqCst) + 1;
                self.service
                    .create_invalidation(request)
                    .await
                    .inspect_err(|e| log_failure(e, attempt))
            },
            |e: &ProviderError| e.is_retryable(),
        )
        .await;

        match result {
            Ok(invalidation_id) => {
                info!(
                    "Successfully created invalidation {} with {} paths",
                    invalidation_id,
                    request.paths.len()
                );
                info!("Invalidated paths: {:?}", request.paths);
                Ok(invalidation_id)
            }
            Err(e) => {
                if e.is_retryable() {
                    error!(
                        "Failed to create invalidation after {} attempts",
                        attempts.load(Ordering::SeqCst)
                    );
                }
                Err(e.into())
            }
        }
    }
}

fn log_failure(error: &ProviderError, attempt: usize) {
    match error {
        ProviderError::TooManyInvalidations(_) => warn!(
            "Too many invalidations in progress, attempt {}/{}",
            attempt, MAX_ATTEMPTS
        ),
        ProviderError::AccessDenied(message) => {
            error!("Access denied to create invalidation: {}", message)
        }
        ProviderError::Service { code, message } => warn!(
            "CloudFront error: {} - {} (attempt {}/{})",
            code, message, attempt, MAX_ATTEMPTS
        ),
        ProviderError::Unexpected(message) => warn!(
            "Unexpected error creating invalidation: {} (attempt {}/{})",
            message, attempt, MAX_ATTEMPTS
        ),
    }
}
