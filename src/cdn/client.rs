use super::{InvalidationRequest, InvalidationService};
use crate::error::ProviderError;
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_cloudfront::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_cloudfront::operation::create_invalidation::CreateInvalidationError;
use aws_sdk_cloudfront::types::{InvalidationBatch, Paths};
use aws_sdk_cloudfront::Client as CloudFrontSdkClient;

pub struct CloudFrontClient {
    client: CloudFrontSdkClient,
}

impl CloudFrontClient {
    /// Build a client from the ambient AWS credential chain.
    pub async fn new() -> Self {
        let config = aws_config::defaults(BehaviorVersion::latest()).load().await;
        Self::from_client(CloudFrontSdkClient::new(&config))
    }

    pub fn from_client(client: CloudFrontSdkClient) -> Self {
        Self { client }
    }
}

fn classify(err: SdkError<CreateInvalidationError>) -> ProviderError {
    match err.code() {
        Some(code) => ProviderError::from_code(code, err.message().unwrap_or_default()),
        None => ProviderError::Unexpected(DisplayErrorContext(&err).to_string()),
    }
}

#[async_trait]
impl InvalidationService for CloudFrontClient {
    async fn create_invalidation(
        &self,
        request: &InvalidationRequest,
    ) -> Result<String, ProviderError> {
        let paths = Paths::builder()
            .quantity(request.paths.len() as i32)
            .set_items(Some(request.paths.clone()))
            .build()
            .map_err(|e| ProviderError::Unexpected(format!("Failed to build paths: {}", e)))?;

        let batch = InvalidationBatch::builder()
            .paths(paths)
            .caller_reference(&request.caller_reference)
            .build()
            .map_err(|e| {
                ProviderError::Unexpected(format!("Failed to build invalidation batch: {}", e))
            })?;

        let output = self
            .client
            .create_invalidation()
            .distribution_id(&request.distribution_id)
            .invalidation_batch(batch)
            .send()
            .await
            .map_err(classify)?;

        output
            .invalidation()
            .map(|invalidation| invalidation.id().to_string())
            .ok_or_else(|| {
                ProviderError::Unexpected("Response did not include an invalidation".to_string())
            })
    }
}
