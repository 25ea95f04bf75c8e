use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

use crate::config::Settings;
use crate::errors::{ConfigError, DispatchError, DispatchResult};
use crate::models::AgentResult;
use crate::session::Session;
use crate::transport::{AgentApi, HttpAgentClient};
use crate::view::ContentKinds;

/// Where the dispatcher is in the lifecycle of the latest submission.
///
/// Every non-idle state carries the sequence number of the submission it
/// belongs to. States are only ever replaced wholesale.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchState {
    Idle,
    Submitting { seq: u64, query: String },
    Success { seq: u64, result: AgentResult },
    Failed { seq: u64, error: DispatchError },
}

impl DispatchState {
    pub fn seq(&self) -> Option<u64> {
        match self {
            DispatchState::Idle => None,
            DispatchState::Submitting { seq, .. }
            | DispatchState::Success { seq, .. }
            | DispatchState::Failed { seq, .. } => Some(*seq),
        }
    }

    pub fn is_submitting(&self) -> bool {
        matches!(self, DispatchState::Submitting { .. })
    }
}

/// What a single `submit` call reports back to its caller.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success(AgentResult),
    Failed(DispatchError),
    /// A newer submission (or a reset) started before this one completed, so
    /// its result was discarded without touching state.
    Superseded,
}

impl Outcome {
    pub fn into_result(self) -> Option<DispatchResult<AgentResult>> {
        match self {
            Outcome::Success(result) => Some(Ok(result)),
            Outcome::Failed(error) => Some(Err(error)),
            Outcome::Superseded => None,
        }
    }
}

/// Turns one user query into one normalized result or error.
///
/// Overlapping submissions are resolved last-submission-wins: each submission
/// takes the next sequence number, and a completion is applied only if its
/// number is still the latest. The superseded request itself is left to finish.
pub struct Dispatcher {
    api: Arc<dyn AgentApi>,
    require_credential: bool,
    latest: AtomicU64,
    state: watch::Sender<DispatchState>,
}

impl Dispatcher {
    pub fn new(api: Arc<dyn AgentApi>, require_credential: bool) -> Self {
        let (state, _) = watch::channel(DispatchState::Idle);
        Self {
            api,
            require_credential,
            latest: AtomicU64::new(0),
            state,
        }
    }

    /// Build a dispatcher backed by the HTTP agent client.
    pub fn from_settings(settings: &Settings) -> Result<Self, ConfigError> {
        settings.validate()?;
        let client = HttpAgentClient::new(settings)?;
        Ok(Self::new(Arc::new(client), settings.require_credential))
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> DispatchState {
        self.state.borrow().clone()
    }

    /// Receive every state replacement, for renderers.
    pub fn subscribe(&self) -> watch::Receiver<DispatchState> {
        self.state.subscribe()
    }

    pub async fn submit(&self, query: &str, session: &Session) -> Outcome {
        let seq = self.begin(query);

        let result = match self.prepare(query, session) {
            Ok((query, credential)) => {
                tracing::debug!(seq, authenticated = credential.is_some(), "dispatching query");
                self.api.invoke(query, credential).await
            }
            Err(error) => Err(error),
        };

        self.complete(seq, result)
    }

    /// Return to idle. Anything still in flight is superseded.
    pub fn reset(&self) {
        self.state.send_modify(|state| {
            self.latest.fetch_add(1, Ordering::SeqCst);
            *state = DispatchState::Idle;
        });
    }

    fn prepare<'a>(
        &self,
        query: &'a str,
        session: &'a Session,
    ) -> DispatchResult<(&'a str, Option<&'a str>)> {
        let query = query.trim();
        if query.is_empty() {
            return Err(DispatchError::Validation(
                "Please enter a query.".to_string(),
            ));
        }
        let credential = session.resolve(self.require_credential)?;
        Ok((query, credential))
    }

    // The sequence number is taken under the state lock so that it is ordered
    // with every completion check.
    fn begin(&self, query: &str) -> u64 {
        let mut seq = 0;
        self.state.send_modify(|state| {
            seq = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
            *state = DispatchState::Submitting {
                seq,
                query: query.to_string(),
            };
        });
        seq
    }

    fn complete(&self, seq: u64, result: DispatchResult<AgentResult>) -> Outcome {
        let (next, outcome) = match result {
            Ok(result) => (
                DispatchState::Success {
                    seq,
                    result: result.clone(),
                },
                Outcome::Success(result),
            ),
            Err(error) => (
                DispatchState::Failed {
                    seq,
                    error: error.clone(),
                },
                Outcome::Failed(error),
            ),
        };

        let applied = self.state.send_if_modified(|state| {
            if self.latest.load(Ordering::SeqCst) != seq {
                return false;
            }
            *state = next;
            true
        });

        if !applied {
            tracing::debug!(seq, "discarding superseded result");
            return Outcome::Superseded;
        }

        match &outcome {
            Outcome::Success(result) => {
                tracing::info!(seq, content = %ContentKinds::of(result), "submission succeeded");
            }
            Outcome::Failed(error) => {
                tracing::warn!(seq, kind = error.kind(), error = %error, "submission failed");
            }
            Outcome::Superseded => {}
        }
        outcome
    }
}
