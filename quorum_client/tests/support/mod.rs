#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use quorum_client::{FullNodeClient, Method, Request, Response, Transport, TransportError};
use serde_json::{json, Value};

/// In-memory node. Each route answers from a queue; the last queued answer
/// repeats. Unknown routes answer 404.
#[derive(Default)]
pub struct MockTransport {
    routes: Mutex<HashMap<(Method, String), VecDeque<Response>>>,
    log: Mutex<Vec<Request>>,
}

impl MockTransport {
    pub fn on(&self, method: Method, path: &str, body: Value) -> &Self {
        self.on_status(method, path, 200, body)
    }

    pub fn on_status(&self, method: Method, path: &str, status: u16, body: Value) -> &Self {
        self.routes
            .lock()
            .unwrap()
            .entry((method, path.to_string()))
            .or_default()
            .push_back(Response { status, body });
        self
    }

    pub fn requests(&self) -> Vec<Request> {
        self.log.lock().unwrap().clone()
    }

    pub fn sent(&self, method: Method, path: &str) -> Vec<Request> {
        self.requests()
            .into_iter()
            .filter(|request| request.method == method && request.path == path)
            .collect()
    }

    pub fn body_of(&self, method: Method, path: &str) -> Value {
        let sent = self.sent(method, path);
        assert_eq!(sent.len(), 1, "expected one {method} {path}, got {sent:?}");
        sent[0].body.clone().unwrap_or(Value::Null)
    }
}

impl Transport for MockTransport {
    fn execute(&self, request: &Request) -> Result<Response, TransportError> {
        self.log.lock().unwrap().push(request.clone());
        let mut routes = self.routes.lock().unwrap();
        let key = (request.method, request.path.clone());
        let response = match routes.get_mut(&key) {
            Some(queue) if queue.len() > 1 => queue.pop_front(),
            Some(queue) => queue.front().cloned(),
            None => None,
        };
        Ok(response.unwrap_or(Response {
            status: 404,
            body: json!({ "error": format!("no route for {} {}", request.method, request.path) }),
        }))
    }
}

pub fn client() -> FullNodeClient<MockTransport> {
    FullNodeClient::with_transport(MockTransport::default())
}

pub fn node(client: &FullNodeClient<MockTransport>) -> &MockTransport {
    client.transport()
}

/// Answers the joined-groups listing with `ids`.
pub fn joined(client: &FullNodeClient<MockTransport>, ids: &[&str]) {
    let groups: Vec<Value> = ids.iter().map(|id| json!({ "group_id": id })).collect();
    node(client).on(Method::Get, "/api/v1/groups", json!({ "groups": groups }));
}

pub fn group_keys(client: &FullNodeClient<MockTransport>, group_id: &str, user: &str, owner: &str) {
    node(client).on(
        Method::Get,
        &format!("/api/v1/group/{group_id}"),
        json!({ "group_id": group_id, "user_pubkey": user, "owner_pubkey": owner }),
    );
}

/// A joined group whose caller is also its owner.
pub fn owned_group(client: &FullNodeClient<MockTransport>, group_id: &str) {
    joined(client, &[group_id]);
    group_keys(client, group_id, "OWNER", "OWNER");
}
