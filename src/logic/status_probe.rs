use std::sync::Arc;
use std::time::Duration;

use super::compute_client::{within_deadline, ComputeClient, Endpoint};
use super::retry::RetryPolicy;
use crate::config::ComputeConfig;
use crate::model::{ComputeStatus, StatusReport};

/// Best-effort reachability check of the compute service. Never fails:
/// every error is folded into the reported status.
pub struct StatusProbe {
    client: Arc<dyn ComputeClient>,
    policy: RetryPolicy,
    timeout: Duration,
}

impl StatusProbe {
    pub fn new(client: Arc<dyn ComputeClient>, config: &ComputeConfig) -> Self {
        Self {
            client,
            policy: RetryPolicy::for_probe(config),
            timeout: config.status_timeout(),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub async fn check(&self) -> StatusReport {
        let (health, version) = tokio::join!(
            self.endpoint_ok(Endpoint::Health),
            self.endpoint_ok(Endpoint::Version)
        );
        let passed = [health, version].iter().filter(|ok| **ok).count();
        StatusReport::new(ComputeStatus::from_checks(passed, 2))
    }

    async fn endpoint_ok(&self, endpoint: Endpoint) -> bool {
        let client = &self.client;
        let timeout = self.timeout;
        let result = self
            .policy
            .run("compute probe", move |_| {
                within_deadline(timeout, client.get(endpoint, timeout))
            })
            .await;
        match result {
            Ok(()) => true,
            Err(e) => {
                log::debug!("Compute {:?} probe failed: {}", endpoint, e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::mock_compute::{MockComputeClient, MockReply};
    use serde_json::Value;

    fn probe(mock: Arc<MockComputeClient>) -> StatusProbe {
        let config = ComputeConfig {
            status_timeout_secs: 1,
            ..ComputeConfig::default()
        };
        StatusProbe::new(mock, &config).with_policy(RetryPolicy {
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(1),
            ..RetryPolicy::for_probe(&config)
        })
    }

    fn ok() -> MockReply {
        MockReply::Json(Value::Null)
    }

    #[tokio::test]
    async fn test_all_endpoints_up() {
        let mock = Arc::new(MockComputeClient::new(ok()).with_probes(ok(), ok()));
        let report = probe(mock).check().await;
        assert_eq!(report.compute, ComputeStatus::Up);
        assert!(report.ok);
    }

    #[tokio::test]
    async fn test_one_endpoint_failing_is_partial() {
        let mock = Arc::new(MockComputeClient::new(ok()).with_probes(ok(), MockReply::Rejected(404)));
        let report = probe(mock).check().await;
        assert_eq!(report.compute, ComputeStatus::Partial);
        assert!(!report.ok);
    }

    #[tokio::test]
    async fn test_unreachable_is_down_after_retries() {
        let mock = Arc::new(
            MockComputeClient::new(ok()).with_probes(MockReply::Unreachable, MockReply::Unreachable),
        );
        let report = probe(mock.clone()).check().await;
        assert_eq!(report.compute, ComputeStatus::Down);
        // Three attempts for each of the two endpoints
        assert_eq!(mock.call_count(Endpoint::Health), 3);
        assert_eq!(mock.call_count(Endpoint::Version), 3);
    }

    #[tokio::test]
    async fn test_hanging_probe_is_down() {
        let mock = Arc::new(MockComputeClient::new(ok()).with_probes(MockReply::Hang, MockReply::Hang));
        let report = probe(mock).check().await;
        assert_eq!(report.compute, ComputeStatus::Down);
    }
}
