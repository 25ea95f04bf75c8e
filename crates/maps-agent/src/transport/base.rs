use async_trait::async_trait;

use crate::errors::DispatchResult;
use crate::models::AgentResult;

/// A remote agent that answers a single query.
///
/// Implementations issue exactly one request per call and report failures
/// through the dispatch error taxonomy; they never retry.
#[async_trait]
pub trait AgentApi: Send + Sync {
    async fn invoke(&self, query: &str, credential: Option<&str>) -> DispatchResult<AgentResult>;
}
