#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};

use deep_research::{Credential, GeminiClient};
use serde_json::{json, Value};
use wiremock::{MockServer, Request, Respond, ResponseTemplate};

pub const TEST_API_KEY: &str = "test_api_key";

pub fn client_for(server: &MockServer) -> GeminiClient {
    GeminiClient::new_with_url(&Credential::new(TEST_API_KEY), &server.uri()).unwrap()
}

pub fn in_progress(id: &str) -> Value {
    json!({ "id": id, "status": "in_progress" })
}

pub fn completed(id: &str, texts: &[&str]) -> Value {
    let outputs: Vec<Value> = texts
        .iter()
        .map(|text| json!({ "type": "text", "text": text }))
        .collect();
    json!({ "id": id, "status": "completed", "outputs": outputs })
}

/// Replays a fixed sequence of bodies, repeating the last one once exhausted.
pub struct SequenceResponder {
    bodies: Vec<Value>,
    calls: AtomicUsize,
}

impl SequenceResponder {
    pub fn new(bodies: Vec<Value>) -> Self {
        Self {
            bodies,
            calls: AtomicUsize::new(0),
        }
    }
}

impl Respond for SequenceResponder {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let count = self.calls.fetch_add(1, Ordering::SeqCst);
        let body = self
            .bodies
            .get(count)
            .or_else(|| self.bodies.last())
            .cloned()
            .unwrap_or(Value::Null);
        ResponseTemplate::new(200).set_body_json(body)
    }
}
