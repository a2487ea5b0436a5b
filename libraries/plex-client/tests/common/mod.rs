//! Shared helpers for client tests.

#![allow(dead_code)]

use async_trait::async_trait;
use plex_client::{ApiRequest, ApiResponse, ClientConfig, PlexClient, Transport, TransportError};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

type Outcome = Result<ApiResponse, TransportError>;

/// Transport that replays scripted outcomes and records every request.
///
/// Scripted outcomes are consumed in order; once exhausted, `fallback`
/// answers every further request.
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Outcome>>,
    fallback: Outcome,
    requests: Mutex<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    pub fn new(script: Vec<Outcome>, fallback: Outcome) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            fallback,
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Every request fails the same way.
    pub fn always(outcome: Outcome) -> Arc<Self> {
        Self::new(Vec::new(), outcome)
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn paths(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.path).collect()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        self.requests.lock().unwrap().push(request.clone());
        let next = self.script.lock().unwrap().pop_front();
        next.unwrap_or_else(|| self.fallback.clone())
    }
}

pub const DELAY: Duration = Duration::from_millis(2000);

pub fn config(attempts: u32) -> ClientConfig {
    ClientConfig::new("http://plex.local:32400", "test-token")
        .with_retry_attempts(attempts)
        .with_retry_delay(DELAY)
}

pub fn client(transport: &Arc<ScriptedTransport>, attempts: u32) -> PlexClient {
    PlexClient::with_transport(config(attempts), transport.clone()).unwrap()
}

pub fn refused() -> Outcome {
    Err(TransportError::refused("tcp connect error: Connection refused"))
}

pub fn ok_json(value: serde_json::Value) -> Outcome {
    Ok(ApiResponse::json_body(&value))
}

pub fn metadata(items: serde_json::Value) -> serde_json::Value {
    serde_json::json!({ "MediaContainer": { "Metadata": items } })
}
