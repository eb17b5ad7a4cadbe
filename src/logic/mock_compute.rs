use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::VecDeque;
use std::time::Duration;

use super::compute_client::{ComputeClient, Endpoint};
use crate::error::AppError;
use crate::model::SolvePayload;

/// What a scripted compute service answers with
#[derive(Debug, Clone)]
pub enum MockReply {
    Json(Value),
    Unreachable,
    Rejected(u16),
    /// Never answers; only the caller's deadline ends the call
    Hang,
}

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub endpoint: Endpoint,
    pub payload: Option<SolvePayload>,
}

/// A scripted compute service for tests. POST replies are consumed in order,
/// the last one repeating; every call is recorded.
pub struct MockComputeClient {
    post_replies: Mutex<VecDeque<MockReply>>,
    last_post: Mutex<MockReply>,
    health: MockReply,
    version: MockReply,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockComputeClient {
    pub fn new(reply: MockReply) -> Self {
        Self::with_sequence(vec![reply])
    }

    pub fn with_sequence(replies: Vec<MockReply>) -> Self {
        let last = replies
            .last()
            .cloned()
            .unwrap_or(MockReply::Json(Value::Null));
        Self {
            post_replies: Mutex::new(replies.into()),
            last_post: Mutex::new(last),
            health: MockReply::Json(Value::Null),
            version: MockReply::Json(Value::Null),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_probes(mut self, health: MockReply, version: MockReply) -> Self {
        self.health = health;
        self.version = version;
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self, endpoint: Endpoint) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| call.endpoint == endpoint)
            .count()
    }

    fn next_post(&self) -> MockReply {
        match self.post_replies.lock().pop_front() {
            Some(reply) => {
                *self.last_post.lock() = reply.clone();
                reply
            }
            None => self.last_post.lock().clone(),
        }
    }
}

async fn answer(reply: MockReply) -> Result<Value, AppError> {
    match reply {
        MockReply::Json(value) => Ok(value),
        MockReply::Unreachable => Err(AppError::UpstreamUnreachable(
            "connection refused".to_string(),
        )),
        MockReply::Rejected(status) => Err(AppError::rejected(status, "scripted rejection")),
        MockReply::Hang => std::future::pending().await,
    }
}

#[async_trait]
impl ComputeClient for MockComputeClient {
    async fn post(
        &self,
        endpoint: Endpoint,
        payload: &SolvePayload,
        _timeout: Duration,
    ) -> Result<Value, AppError> {
        self.calls.lock().push(RecordedCall {
            endpoint,
            payload: Some(payload.clone()),
        });
        let reply = self.next_post();
        answer(reply).await
    }

    async fn get(&self, endpoint: Endpoint, _timeout: Duration) -> Result<(), AppError> {
        self.calls.lock().push(RecordedCall {
            endpoint,
            payload: None,
        });
        let reply = match endpoint {
            Endpoint::Version => self.version.clone(),
            _ => self.health.clone(),
        };
        answer(reply).await.map(|_| ())
    }
}
