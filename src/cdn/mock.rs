use super::{InvalidationRequest, InvalidationService};
use crate::error::ProviderError;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::time::Instant;
use tracing::info;

/// Scripted provider that records every request it receives.
///
/// Outcomes are consumed in order; once the script runs out every call
/// succeeds with a generated invalidation id.
#[derive(Clone)]
pub struct MockInvalidationClient {
    outcomes: Arc<Mutex<VecDeque<Result<String, ProviderError>>>>,
    requests: Arc<Mutex<Vec<InvalidationRequest>>>,
    call_times: Arc<Mutex<Vec<Instant>>>,
}

impl MockInvalidationClient {
    pub fn new() -> Self {
        Self {
            outcomes: Arc::new(Mutex::new(VecDeque::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
            call_times: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_success(self, invalidation_id: &str) -> Self {
        self.outcomes
            .lock()
            .unwrap()
            .push_back(Ok(invalidation_id.to_string()));
        self
    }

    pub fn with_error(self, error: ProviderError) -> Self {
        self.outcomes.lock().unwrap().push_back(Err(error));
        self
    }

    pub fn get_call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn get_requests(&self) -> Vec<InvalidationRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Gaps between consecutive calls.
    pub fn get_call_intervals(&self) -> Vec<std::time::Duration> {
        let times = self.call_times.lock().unwrap();
        times.windows(2).map(|w| w[1] - w[0]).collect()
    }
}

impl Default for MockInvalidationClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InvalidationService for MockInvalidationClient {
    async fn create_invalidation(
        &self,
        request: &InvalidationRequest,
    ) -> Result<String, ProviderError> {
        self.call_times.lock().unwrap().push(Instant::now());
        let call_number = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request.clone());
            requests.len()
        };

        info!(
            "[mock] CreateInvalidation on {} with {} paths",
            request.distribution_id,
            request.paths.len()
        );

        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(format!("MOCK-{}", call_number)))
    }
}
