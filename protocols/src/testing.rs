//! Scripted in-memory clients for exercising probe logic without hardware.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::{ManagementClient, Response, WsmanError};

#[derive(Debug, Clone)]
enum Reply {
    Body(String),
    Unreachable,
}

/// A [`ManagementClient`] that replays scripted responses.
///
/// Replies are keyed by operation plus the trailing segment of the resource
/// URI (or the method name for invokes). Each key holds a queue, so repeated
/// polls of the same resource can observe a status sequence. A key with no
/// reply left behaves like an unreachable endpoint.
pub struct ScriptedClient {
    endpoint: String,
    replies: Mutex<HashMap<String, VecDeque<Reply>>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedClient {
    pub fn new(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            replies: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn on_identify(self, body: &str) -> Self {
        self.push("identify", Reply::Body(body.to_string()));
        self
    }

    /// `resource` is the class name, e.g. `DCIM_CPUView`.
    pub fn on_enumerate(self, resource: &str, body: &str) -> Self {
        self.push(&format!("enumerate {resource}"), Reply::Body(body.to_string()));
        self
    }

    pub fn on_get(self, resource: &str, body: &str) -> Self {
        self.push(&format!("get {resource}"), Reply::Body(body.to_string()));
        self
    }

    pub fn on_invoke(self, method: &str, body: &str) -> Self {
        self.push(&format!("invoke {method}"), Reply::Body(body.to_string()));
        self
    }

    /// Queues a transport failure for one enumerate of `resource`.
    pub fn fail_enumerate(self, resource: &str) -> Self {
        self.push(&format!("enumerate {resource}"), Reply::Unreachable);
        self
    }

    pub fn fail_get(self, resource: &str) -> Self {
        self.push(&format!("get {resource}"), Reply::Unreachable);
        self
    }

    /// Every operation serviced so far, in order, as `"op resource"` keys.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn push(&self, key: &str, reply: Reply) {
        self.replies
            .lock()
            .unwrap()
            .entry(key.to_string())
            .or_default()
            .push_back(reply);
    }

    fn pop(&self, key: &str) -> Result<Response, WsmanError> {
        self.calls.lock().unwrap().push(key.to_string());
        let reply = self
            .replies
            .lock()
            .unwrap()
            .get_mut(key)
            .and_then(VecDeque::pop_front);
        match reply {
            Some(Reply::Body(body)) => Ok(Response::new(body)),
            Some(Reply::Unreachable) | None => {
                Err(WsmanError::Unreachable(self.endpoint.clone()))
            }
        }
    }
}

fn leaf(resource: &str) -> &str {
    resource.rsplit('/').next().unwrap_or(resource)
}

#[async_trait]
impl ManagementClient for ScriptedClient {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn identify(&self) -> Result<Response, WsmanError> {
        self.pop("identify")
    }

    async fn enumerate(
        &self,
        resource: &str,
        _selectors: &[(&str, &str)],
    ) -> Result<Response, WsmanError> {
        self.pop(&format!("enumerate {}", leaf(resource)))
    }

    async fn get(
        &self,
        resource: &str,
        _selectors: &[(&str, &str)],
    ) -> Result<Response, WsmanError> {
        self.pop(&format!("get {}", leaf(resource)))
    }

    async fn invoke(
        &self,
        _resource: &str,
        method: &str,
        _selectors: &[(&str, &str)],
        _params: &[(&str, &str)],
    ) -> Result<Response, WsmanError> {
        self.pop(&format!("invoke {method}"))
    }
}
