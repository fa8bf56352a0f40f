//! Test doubles and wire fixtures
//!
//! [`MockApi`] implements the same [`Api`] capability interface as the
//! production transport: canned responses are queued per route, every call
//! is recorded, and an optional delay simulates slow responses for
//! interleaving tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::Value;

use crate::transport::{Api, MultipartForm};
use crate::Result;

/// A recorded request issued against the mock
#[derive(Debug, Clone)]
pub(crate) struct RecordedCall {
    pub method: &'static str,
    pub path: String,
    pub body: Option<Value>,
    pub form: Option<MultipartForm>,
}

impl RecordedCall {
    pub fn route(&self) -> String {
        format!("{} {}", self.method, self.path)
    }
}

#[derive(Default)]
struct Inner {
    routes: Mutex<HashMap<String, VecDeque<Result<Value>>>>,
    calls: Mutex<Vec<RecordedCall>>,
    delay: Mutex<Option<Duration>>,
}

/// In-process transport double
#[derive(Clone, Default)]
pub(crate) struct MockApi {
    inner: Arc<Inner>,
}

impl MockApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response for a `"<METHOD> <path>"` route
    pub fn expect(&self, route: &str, response: Result<Value>) {
        self.inner
            .routes
            .lock()
            .unwrap()
            .entry(route.to_string())
            .or_default()
            .push_back(response);
    }

    /// Delay every subsequent response by the given duration
    pub fn set_delay(&self, delay: Duration) {
        *self.inner.delay.lock().unwrap() = Some(delay);
    }

    /// Remove the response delay
    pub fn clear_delay(&self) {
        *self.inner.delay.lock().unwrap() = None;
    }

    /// All recorded calls, in arrival order
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.inner.calls.lock().unwrap().clone()
    }

    /// Total number of requests issued
    pub fn call_count(&self) -> usize {
        self.inner.calls.lock().unwrap().len()
    }

    /// Number of requests issued against a `"<METHOD> <path>"` route
    pub fn calls_to(&self, route: &str) -> usize {
        self.inner
            .calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.route() == route)
            .count()
    }

    async fn respond(
        &self,
        method: &'static str,
        path: &str,
        body: Option<Value>,
        form: Option<MultipartForm>,
    ) -> Result<Value> {
        self.inner.calls.lock().unwrap().push(RecordedCall {
            method,
            path: path.to_string(),
            body,
            form,
        });

        let delay = *self.inner.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let key = format!("{} {}", method, path);
        let mut routes = self.inner.routes.lock().unwrap();
        routes
            .get_mut(&key)
            .and_then(|queue| queue.pop_front())
            .unwrap_or_else(|| panic!("no mock response queued for {}", key))
    }
}

impl Api for MockApi {
    async fn get(&self, path: &str) -> Result<Value> {
        self.respond("GET", path, None, None).await
    }

    async fn post_json(&self, path: &str, body: Option<Value>) -> Result<Value> {
        self.respond("POST", path, body, None).await
    }

    async fn patch_json(&self, path: &str, body: Value) -> Result<Value> {
        self.respond("PATCH", path, Some(body), None).await
    }

    async fn upload(&self, path: &str, form: MultipartForm) -> Result<Value> {
        self.respond("POST", path, None, Some(form)).await
    }
}

/// Wire-format JSON fixtures shared across tests
pub(crate) mod fixtures {
    use serde_json::{json, Value};

    pub fn conversation(id: &str, timestamp: &str, unread_count: u32) -> Value {
        json!({
            "id": id,
            "participantId": format!("u_{}", id),
            "participant": format!("User {}", id),
            "lastMessage": "see you tomorrow",
            "timestamp": timestamp,
            "unreadCount": unread_count,
        })
    }

    pub fn message(id: &str, conversation_id: &str, sender_id: &str, timestamp: &str) -> Value {
        json!({
            "id": id,
            "conversationId": conversation_id,
            "text": format!("message {}", id),
            "sender": "Alice",
            "senderId": sender_id,
            "timestamp": timestamp,
        })
    }

    pub fn message_page(messages: Vec<Value>) -> Value {
        let total = messages.len();
        json!({
            "data": messages,
            "total": total,
            "page": 1,
            "limit": 50,
            "hasMore": false,
        })
    }

    pub fn dispute(id: &str, order_id: &str, status: &str) -> Value {
        json!({
            "id": id,
            "orderId": order_id,
            "orderNumber": format!("ORD-{}", order_id),
            "product": "Ceramic vase",
            "seller": "Casa Blanca",
            "amount": "45.00",
            "status": status,
            "reason": "damaged_product",
            "description": "the vase arrived cracked along the base",
            "createdAt": "2024-03-01T10:00:00Z",
            "updatedAt": "2024-03-01T10:00:00Z",
            "evidence": [],
            "timeline": [
                {
                    "id": format!("t_{}", id),
                    "type": "created",
                    "description": "dispute opened",
                    "timestamp": "2024-03-01T10:00:00Z",
                    "actor": "Buyer",
                }
            ],
        })
    }
}
