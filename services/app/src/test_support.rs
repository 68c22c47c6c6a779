//! services/app/src/test_support.rs
//!
//! A recording fake of the `HttpTransport` port, plus fixtures shared by the
//! unit tests.

use crate::adapters::MemorySessionStore;
use crate::gateway::ApiGateway;
use async_trait::async_trait;
use empathy_core::domain::Session;
use empathy_core::ports::{ApiRequest, ApiResponse, HttpTransport, PortError, PortResult};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

/// Responds per path from a queue. The last queued response for a path is
/// repeated once the queue drains; unknown paths answer 404.
#[derive(Default)]
pub struct FakeTransport {
    routes: Mutex<HashMap<String, VecDeque<PortResult<ApiResponse>>>>,
    calls: Mutex<Vec<ApiRequest>>,
    gates: Mutex<HashMap<String, Arc<Semaphore>>>,
}

/// Holds requests to one path open until released, one request per release.
pub struct Gate(Arc<Semaphore>);

impl Gate {
    pub fn release(&self) {
        self.0.add_permits(1);
    }
}

impl FakeTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, path: &str, status: u16, body: Value) {
        self.push(path, Ok(ApiResponse::new(status, body)));
    }

    pub fn fail(&self, path: &str, error: PortError) {
        self.push(path, Err(error));
    }

    fn push(&self, path: &str, outcome: PortResult<ApiResponse>) {
        self.routes
            .lock()
            .unwrap()
            .entry(path.to_string())
            .or_default()
            .push_back(outcome);
    }

    /// Requests to `path` are recorded at once but answered only on release.
    pub fn hold(&self, path: &str) -> Gate {
        let gate = Arc::new(Semaphore::new(0));
        self.gates
            .lock()
            .unwrap()
            .insert(path.to_string(), Arc::clone(&gate));
        Gate(gate)
    }

    /// Resolves once a request to `path` has been sent.
    pub async fn sent(&self, path: &str) {
        while self.calls_to(path) == 0 {
            tokio::task::yield_now().await;
        }
    }

    pub fn calls(&self) -> Vec<ApiRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls_to(&self, path: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.path == path)
            .count()
    }
}

#[async_trait]
impl HttpTransport for FakeTransport {
    async fn send(&self, request: ApiRequest) -> PortResult<ApiResponse> {
        let path = request.path.clone();
        self.calls.lock().unwrap().push(request);
        let gate = self.gates.lock().unwrap().get(&path).cloned();
        if let Some(gate) = gate {
            gate.acquire().await.unwrap().forget();
        }
        let mut routes = self.routes.lock().unwrap();
        match routes.get_mut(&path) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) if !queue.is_empty() => queue[0].clone(),
            _ => Ok(ApiResponse::new(404, Value::Null)),
        }
    }
}

pub fn signed_in() -> Session {
    Session {
        token: Some("T".to_string()),
        user_id: Some(1),
        first_name: "A".to_string(),
        last_name: "B".to_string(),
    }
}

pub fn gateway_with(transport: &Arc<FakeTransport>, session: Option<Session>) -> ApiGateway {
    let store = match session {
        Some(session) => MemorySessionStore::with_session(session),
        None => MemorySessionStore::new(),
    };
    ApiGateway::new(transport.clone(), Arc::new(store))
}
