use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

use super::base::AgentApi;
use crate::errors::DispatchResult;
use crate::models::AgentResult;

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub query: String,
    pub credential: Option<String>,
}

struct Reply {
    result: DispatchResult<AgentResult>,
    gate: Option<Arc<Notify>>,
}

/// An agent that answers from a script keyed by query, for testing the dispatcher.
///
/// A gated reply is held back until its `Notify` is triggered, which lets a test
/// decide the order in which overlapping submissions complete.
#[derive(Default)]
pub struct MockAgentApi {
    replies: Mutex<HashMap<String, Reply>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockAgentApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply<S: Into<String>>(self, query: S, result: DispatchResult<AgentResult>) -> Self {
        self.replies
            .lock()
            .unwrap()
            .insert(query.into(), Reply { result, gate: None });
        self
    }

    pub fn reply_gated<S: Into<String>>(
        self,
        query: S,
        result: DispatchResult<AgentResult>,
        gate: Arc<Notify>,
    ) -> Self {
        self.replies.lock().unwrap().insert(
            query.into(),
            Reply {
                result,
                gate: Some(gate),
            },
        );
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl AgentApi for MockAgentApi {
    async fn invoke(&self, query: &str, credential: Option<&str>) -> DispatchResult<AgentResult> {
        self.calls.lock().unwrap().push(RecordedCall {
            query: query.to_string(),
            credential: credential.map(String::from),
        });

        let (result, gate) = match self.replies.lock().unwrap().get(query) {
            Some(reply) => (reply.result.clone(), reply.gate.clone()),
            None => (Ok(AgentResult::default()), None),
        };

        if let Some(gate) = gate {
            gate.notified().await;
        }
        result
    }
}
