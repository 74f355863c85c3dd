#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use serde_json::Value;
use tempfile::TempDir;

use quizdesk::api::Client;
use quizdesk::api::endpoints::Endpoints;
use quizdesk::api::transport::{ApiRequest, ApiResponse, Transport};
use quizdesk::auth::AuthManager;
use quizdesk::error::{ClientError, ClientResult};
use quizdesk::store::json_store::JsonStore;
use quizdesk::store::schema::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};

pub const BASE: &str = "http://test.local/api/v1";

#[derive(Default)]
struct Script {
    responses: VecDeque<ClientResult<ApiResponse>>,
    requests: Vec<ApiRequest>,
}

/// Transport that replays queued responses in order and records every
/// request it was asked to send. Clones share the same script.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    script: Rc<RefCell<Script>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, response: ApiResponse) -> &Self {
        self.script.borrow_mut().responses.push_back(Ok(response));
        self
    }

    pub fn push_json(&self, status: u16, body: Value) -> &Self {
        self.push(json_response(status, body))
    }

    pub fn push_error(&self, err: ClientError) -> &Self {
        self.script.borrow_mut().responses.push_back(Err(err));
        self
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.script.borrow().requests.clone()
    }

    pub fn request_count(&self) -> usize {
        self.script.borrow().requests.len()
    }

    pub fn last_request(&self) -> Option<ApiRequest> {
        self.script.borrow().requests.last().cloned()
    }

    pub fn unused(&self) -> usize {
        self.script.borrow().responses.len()
    }
}

impl Transport for ScriptedTransport {
    fn send(&self, request: &ApiRequest) -> ClientResult<ApiResponse> {
        let mut script = self.script.borrow_mut();
        script.requests.push(request.clone());
        script
            .responses
            .pop_front()
            .unwrap_or_else(|| Err(ClientError::Network(format!("unscripted {}", request.url))))
    }
}

pub fn json_response(status: u16, body: Value) -> ApiResponse {
    ApiResponse::new(status, Some("application/json"), body.to_string())
}

pub fn url(path: &str) -> String {
    format!("{BASE}/{path}")
}

pub fn temp_store() -> (TempDir, JsonStore) {
    let dir = TempDir::new().unwrap();
    let store = JsonStore::new(dir.path()).unwrap();
    (dir, store)
}

pub fn seed_tokens(store: &JsonStore, access: &str, refresh: &str) {
    store.set(ACCESS_TOKEN_KEY, &access.to_string()).unwrap();
    store.set(REFRESH_TOKEN_KEY, &refresh.to_string()).unwrap();
}

pub fn auth_manager(transport: &ScriptedTransport, store: &JsonStore) -> AuthManager {
    AuthManager::new(
        Box::new(transport.clone()),
        Endpoints::new(BASE),
        store.clone(),
    )
}

pub fn client(transport: &ScriptedTransport, store: &JsonStore) -> Client {
    Client::new(auth_manager(transport, store))
}
