//! Scripted in-process gateway.
//!
//! Used by tests and by offline demos (`--offline` on the CLI). Replies are consumed in order;
//! once the script runs out the default reply is used for every further call.

use crate::{GatewayError, GatewayRequest, GatewayResult, LlmGateway};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

/// One scripted outcome.
#[derive(Debug, Clone, PartialEq)]
pub enum StubReply {
    /// Succeed with this text.
    Text(String),
    /// Fail as if no credential were configured.
    MissingCredential,
    /// Fail as if the provider answered with a non-success status.
    Status(u16, String),
}

impl StubReply {
    fn into_result(self) -> GatewayResult<String> {
        match self {
            StubReply::Text(text) => Ok(text),
            StubReply::MissingCredential => Err(GatewayError::MissingCredential),
            StubReply::Status(status, body) => Err(GatewayError::Status { status, body }),
        }
    }
}

#[derive(Debug)]
pub struct StubGateway {
    script: Mutex<VecDeque<StubReply>>,
    default_reply: StubReply,
    requests: Mutex<Vec<GatewayRequest>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl StubGateway {
    /// Answer every call with `default_reply` after the scripted replies are used up.
    pub fn new(script: Vec<StubReply>, default_reply: StubReply) -> Self {
        Self {
            script: Mutex::new(script.into()),
            default_reply,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Always answer with `text`.
    pub fn replying(text: impl Into<String>) -> Self {
        Self::new(Vec::new(), StubReply::Text(text.into()))
    }

    /// Always fail with a 503 from the "provider".
    pub fn always_failing() -> Self {
        Self::new(
            Vec::new(),
            StubReply::Status(503, "service unavailable".into()),
        )
    }

    /// Every request received so far, oldest first.
    pub fn requests(&self) -> Vec<GatewayRequest> {
        lock(&self.requests).clone()
    }
}

#[async_trait]
impl LlmGateway for StubGateway {
    async fn generate(&self, request: GatewayRequest) -> GatewayResult<String> {
        lock(&self.requests).push(request);
        let reply = lock(&self.script)
            .pop_front()
            .unwrap_or_else(|| self.default_reply.clone());
        reply.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn replays_script_then_default() {
        let stub = StubGateway::new(
            vec![
                StubReply::Text("first".into()),
                StubReply::MissingCredential,
            ],
            StubReply::Text("again".into()),
        );

        let req = || GatewayRequest::new("sys", "user");
        assert_eq!(stub.generate(req()).await.unwrap(), "first");
        assert!(matches!(
            stub.generate(req()).await,
            Err(GatewayError::MissingCredential)
        ));
        assert_eq!(stub.generate(req()).await.unwrap(), "again");
        assert_eq!(stub.generate(req()).await.unwrap(), "again");
        assert_eq!(stub.requests().len(), 4);
    }
}
