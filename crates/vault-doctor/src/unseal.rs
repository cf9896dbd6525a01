//! Interactive quorum unseal.
//!
//! The coordinator is a small state machine:
//!
//! ```text
//! Idle -> AwaitingConfirmation -> AwaitingKey (loop) -> Done | Aborted
//! ```
//!
//! Operator interaction goes through [`UnsealPrompt`], so the procedure runs
//! the same against a terminal or a scripted test double. Keys are submitted
//! one at a time and are never logged or kept after submission.

use std::io;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::client::{lenient, ClientError, ClusterClient, UNSEAL_PATH};
use crate::config::Session;
use crate::health::{self, HealthProbe};

/// Pause between the last unseal round and the health re-probe.
pub const SETTLE_INTERVAL: Duration = Duration::from_millis(500);

/// Operator-facing progress notices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnsealNotice {
    /// A share was accepted but the quorum is not reached yet.
    Partial,
    /// The node reported `sealed=false`.
    Unsealed,
    /// The procedure stopped on an error.
    Failed(String),
}

impl std::fmt::Display for UnsealNotice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Partial => write!(f, "Partial unseal, more keys required..."),
            Self::Unsealed => write!(f, "Vault successfully unsealed!"),
            Self::Failed(e) => write!(f, "Unseal attempt failed: {}", e),
        }
    }
}

/// Source of operator answers.
pub trait UnsealPrompt {
    /// Ask whether to unseal now. Only an affirmative answer proceeds.
    fn confirm(&mut self) -> io::Result<bool>;

    /// Read the next key share without echoing it. `None` or a blank string
    /// ends the loop.
    fn next_key(&mut self) -> io::Result<Option<String>>;

    fn notify(&mut self, notice: &UnsealNotice);
}

/// `y` or `yes`, case-insensitive.
pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/// Errors that abort the key loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnsealError {
    Transport(ClientError),
    /// Non-2xx reply, with the server's error messages joined.
    Http(u16, String),
    Decode(String),
    Prompt(String),
}

impl std::fmt::Display for UnsealError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(e) => write!(f, "{}", e),
            Self::Http(status, msg) if msg.is_empty() => {
                write!(f, "unseal rejected: HTTP {}", status)
            }
            Self::Http(status, msg) => write!(f, "unseal rejected: HTTP {}: {}", status, msg),
            Self::Decode(e) => write!(f, "unseal response invalid: {}", e),
            Self::Prompt(e) => write!(f, "reading input: {}", e),
        }
    }
}

impl std::error::Error for UnsealError {}

/// One submitted share and the sealed flag the node reported back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnsealRound {
    /// 1-based submission number.
    pub attempt: usize,
    pub sealed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnsealState {
    Idle,
    AwaitingConfirmation,
    AwaitingKey,
    /// Loop ended normally; `unsealed` is false when the operator stopped
    /// before the quorum was reached.
    Done { unsealed: bool },
    /// Declined (no error) or stopped on an error.
    Aborted(Option<UnsealError>),
}

impl UnsealState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done { .. } | Self::Aborted(_))
    }
}

/// Final state of a procedure, plus the fresh health probe when the key loop
/// ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsealOutcome {
    pub state: UnsealState,
    pub rounds: Vec<UnsealRound>,
    /// Health after the settle pause. `None` when the re-probe itself
    /// failed.
    pub reprobe: Option<HealthProbe>,
}

impl UnsealOutcome {
    /// Health of a node that came back unsealed, if it did.
    pub fn unsealed_health(&self) -> Option<&HealthProbe> {
        self.reprobe
            .as_ref()
            .filter(|p| p.health.as_ref().is_some_and(|h| !h.is_sealed()))
    }
}

#[derive(Deserialize)]
struct UnsealResponse {
    sealed: bool,
}

#[derive(Default, Deserialize)]
struct ErrorResponse {
    #[serde(default, deserialize_with = "lenient::field")]
    errors: Vec<String>,
}

pub struct UnsealCoordinator<'a, C: ClusterClient + ?Sized> {
    client: &'a C,
    session: &'a Session,
    settle: Duration,
    state: UnsealState,
    rounds: Vec<UnsealRound>,
}

impl<'a, C: ClusterClient + ?Sized> UnsealCoordinator<'a, C> {
    pub fn new(client: &'a C, session: &'a Session) -> Self {
        Self {
            client,
            session,
            settle: SETTLE_INTERVAL,
            state: UnsealState::Idle,
            rounds: Vec::new(),
        }
    }

    /// Override the settle pause.
    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    pub fn state(&self) -> &UnsealState {
        &self.state
    }

    /// Advance one transition.
    pub async fn step(&mut self, prompt: &mut dyn UnsealPrompt) {
        let next = match self.state {
            UnsealState::Idle => UnsealState::AwaitingConfirmation,
            UnsealState::AwaitingConfirmation => match prompt.confirm() {
                Ok(true) => UnsealState::AwaitingKey,
                Ok(false) => {
                    info!("operator declined unseal");
                    UnsealState::Aborted(None)
                }
                Err(e) => UnsealState::Aborted(Some(UnsealError::Prompt(e.to_string()))),
            },
            UnsealState::AwaitingKey => self.key_round(prompt).await,
            UnsealState::Done { .. } | UnsealState::Aborted(_) => return,
        };
        self.state = next;
    }

    async fn key_round(&mut self, prompt: &mut dyn UnsealPrompt) -> UnsealState {
        let key = match prompt.next_key() {
            Ok(Some(key)) => key,
            Ok(None) => return UnsealState::Done { unsealed: false },
            Err(e) => return UnsealState::Aborted(Some(UnsealError::Prompt(e.to_string()))),
        };
        let key = key.trim();
        if key.is_empty() {
            debug!(rounds = self.rounds.len(), "operator ended key entry");
            return UnsealState::Done { unsealed: false };
        }

        let attempt = self.rounds.len() + 1;
        match self.submit(key).await {
            Ok(sealed) => {
                self.rounds.push(UnsealRound { attempt, sealed });
                if sealed {
                    info!(attempt, "unseal share accepted, quorum not reached");
                    prompt.notify(&UnsealNotice::Partial);
                    UnsealState::AwaitingKey
                } else {
                    info!(attempt, "node unsealed");
                    prompt.notify(&UnsealNotice::Unsealed);
                    UnsealState::Done { unsealed: true }
                }
            }
            Err(e) => {
                warn!(attempt, error = %e, "unseal submission failed");
                UnsealState::Aborted(Some(e))
            }
        }
    }

    async fn submit(&self, key: &str) -> Result<bool, UnsealError> {
        let body = serde_json::json!({ "key": key });
        let response = self
            .client
            .post(self.session, UNSEAL_PATH, &body)
            .await
            .map_err(UnsealError::Transport)?;
        if !response.is_success() {
            let ErrorResponse { errors } = response.json_or_default();
            return Err(UnsealError::Http(response.status, errors.join("; ")));
        }
        let decoded: UnsealResponse =
            response.json().map_err(|e| UnsealError::Decode(e.to_string()))?;
        Ok(decoded.sealed)
    }

    /// Drive the machine to a terminal state, then settle and re-probe once.
    /// The re-probe also runs after a declined prompt.
    pub async fn run(mut self, prompt: &mut dyn UnsealPrompt) -> UnsealOutcome {
        while !self.state.is_terminal() {
            self.step(prompt).await;
        }

        if let UnsealState::Aborted(Some(e)) = &self.state {
            prompt.notify(&UnsealNotice::Failed(e.to_string()));
        }

        tokio::time::sleep(self.settle).await;
        let reprobe = health::probe(self.client, self.session).await.ok();

        UnsealOutcome { state: self.state, rounds: self.rounds, reprobe }
    }
}
