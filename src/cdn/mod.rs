//! CDN integration for cache invalidation
//!
//! Submits invalidation batches to CloudFront. The [`InvalidationService`]
//! seam lets the submitter run against a scripted mock in tests and dry runs.

pub mod client;
pub mod mock;

pub use client::CloudFrontClient;
pub use mock::MockInvalidationClient;

use crate::error::ProviderError;
use async_trait::async_trait;

/// One CreateInvalidation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidationRequest {
    pub distribution_id: String,
    pub paths: Vec<String>,
    /// Uniqueness token the provider uses to detect duplicate submissions.
    pub caller_reference: String,
}

#[async_trait]
pub trait InvalidationService: Send + Sync {
    /// Returns the provider's invalidation id on success.
    async fn create_invalidation(
        &self,
        request: &InvalidationRequest,
    ) -> Result<String, ProviderError>;
}
