use base64::Engine;
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

use super::compute_client::{within_deadline, ComputeClient, Endpoint};
use super::input_tree::build_input_tree;
use super::retry::RetryPolicy;
use crate::config::{AppConfig, DefinitionTransport};
use crate::error::AppError;
use crate::model::{DefinitionRecord, DefinitionSource, SolveInputs, SolvePayload, WireInputTree};
use crate::store::{DefinitionStore, SolveCache, SolveCacheKey};

/// Result of a solve, possibly served from the cache
#[derive(Debug, Clone)]
pub struct SolveOutcome {
    pub definition: DefinitionRecord,
    pub result: Arc<Value>,
    pub cached: bool,
}

/// Resolves definitions and forwards solve requests to the compute service
pub struct SolveForwarder<S: DefinitionStore> {
    store: Arc<S>,
    client: Arc<dyn ComputeClient>,
    cache: Option<SolveCache>,
    policy: RetryPolicy,
    timeout: Duration,
    transport: DefinitionTransport,
    public_url: String,
}

impl<S: DefinitionStore> SolveForwarder<S> {
    pub fn new(
        store: Arc<S>,
        client: Arc<dyn ComputeClient>,
        cache: Option<SolveCache>,
        config: &AppConfig,
    ) -> Self {
        Self {
            store,
            client,
            cache,
            policy: RetryPolicy::for_solve(&config.compute),
            timeout: config.compute.solve_timeout(),
            transport: config.compute.transport,
            public_url: config.public_url(),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn cache(&self) -> Option<&SolveCache> {
        self.cache.as_ref()
    }

    /// Solve a definition with the given inputs. The reference is resolved
    /// first, so an unknown definition never reaches the compute service.
    pub async fn solve(&self, reference: &str, inputs: &SolveInputs) -> Result<SolveOutcome, AppError> {
        let record = self.store.resolve(reference).await?;
        let source = self.store.load(&record).await?;

        let key = SolveCacheKey {
            definition_id: record.id.clone(),
            content_hash: source.content_hash.clone(),
            inputs: inputs.canonical()?,
        };
        if let Some(result) = self.cache.as_ref().and_then(|cache| cache.get(&key)) {
            log::debug!("Cache hit for {}", record.id);
            return Ok(SolveOutcome {
                definition: record,
                result,
                cached: true,
            });
        }

        let payload = self.payload(&source, build_input_tree(inputs))?;
        let request_id = Uuid::new_v4();
        log::info!(
            "Solving {} with {} input(s) [{}]",
            record.id,
            inputs.len(),
            request_id
        );

        let started = Instant::now();
        let result = self.call(Endpoint::Solve, &payload, request_id).await;
        let result = match result {
            Ok(value) => Arc::new(value),
            Err(e) => {
                log::error!("Solve of {} failed [{}]: {}", record.id, request_id, e);
                return Err(e);
            }
        };
        log::info!(
            "Solved {} in {} ms [{}]",
            record.id,
            started.elapsed().as_millis(),
            request_id
        );

        if let Some(cache) = &self.cache {
            cache.put(key, Arc::clone(&result));
        }
        Ok(SolveOutcome {
            definition: record,
            result,
            cached: false,
        })
    }

    /// Ask the compute service to describe a definition's inputs and outputs
    pub async fn io(&self, reference: &str) -> Result<Value, AppError> {
        let record = self.store.resolve(reference).await?;
        let source = self.store.load(&record).await?;
        let payload = self.payload(&source, Vec::new())?;
        let request_id = Uuid::new_v4();
        log::info!("Describing {} [{}]", record.id, request_id);
        self.call(Endpoint::Io, &payload, request_id).await
    }

    async fn call(
        &self,
        endpoint: Endpoint,
        payload: &SolvePayload,
        request_id: Uuid,
    ) -> Result<Value, AppError> {
        let client = &self.client;
        let timeout = self.timeout;
        self.policy
            .run("compute request", |attempt| async move {
                log::debug!("{:?} attempt {} [{}]", endpoint, attempt, request_id);
                within_deadline(timeout, client.post(endpoint, payload, timeout)).await
            })
            .await
    }

    fn payload(&self, source: &DefinitionSource, values: WireInputTree) -> Result<SolvePayload, AppError> {
        match self.transport {
            DefinitionTransport::Inline => Ok(SolvePayload {
                algo: Some(base64::engine::general_purpose::STANDARD.encode(&source.bytes)),
                pointer: None,
                values,
            }),
            DefinitionTransport::Pointer => Ok(SolvePayload {
                algo: None,
                pointer: Some(definition_url(&self.public_url, &source.record.id)?),
                values,
            }),
        }
    }
}

/// URL under which this server serves a definition's raw bytes
pub fn definition_url(public_url: &str, id: &str) -> Result<String, AppError> {
    let mut url = reqwest::Url::parse(public_url)
        .map_err(|e| AppError::Internal(format!("invalid public url '{}': {}", public_url, e)))?;
    url.path_segments_mut()
        .map_err(|_| AppError::Internal(format!("public url '{}' cannot be a base", public_url)))?
        .pop_if_empty()
        .push("definition")
        .extend(id.split('/'));
    Ok(url.to_string())
}
