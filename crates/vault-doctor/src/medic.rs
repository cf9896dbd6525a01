//! One full diagnostic run: base checks, optional unseal, extended
//! diagnostics, advisories. Produces a [`Report`]; rendering is left to the
//! caller.

use std::time::Duration;

use tracing::{debug, info};

use crate::client::ClusterClient;
use crate::config::Config;
use crate::diagnostics::{run_diagnostics, Diagnostics};
use crate::engine::run_base;
use crate::hints::collect_hints;
use crate::report::{OutputMode, Report};
use crate::unseal::{UnsealCoordinator, UnsealPrompt, SETTLE_INTERVAL};

/// Per-run inputs that are not connection settings.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub version: String,
    /// Unix seconds stamped on the report.
    pub timestamp: i64,
    /// Pause before re-probing after an unseal attempt.
    pub settle: Duration,
    /// Output contract the report is destined for. Decides whether the
    /// operator may be prompted.
    pub output: OutputMode,
}

impl RunSettings {
    pub fn new(version: impl Into<String>, timestamp: i64) -> Self {
        Self {
            version: version.into(),
            timestamp,
            settle: SETTLE_INTERVAL,
            output: OutputMode::Pretty,
        }
    }

    pub fn with_output(mut self, output: OutputMode) -> Self {
        self.output = output;
        self
    }
}

/// Run the pipeline against `client`.
///
/// A sealed node is offered an interactive unseal through `prompt` only when
/// the output mode is interactive; structured and quiet runs never ask.
pub async fn run<C: ClusterClient + ?Sized>(
    client: &C,
    config: &Config,
    settings: &RunSettings,
    prompt: Option<&mut dyn UnsealPrompt>,
) -> Report {
    let base = run_base(client, config).await;
    let mut status = base.status;
    let mut health = base.health.clone();
    let mut diagnostics = Diagnostics::default();

    if let (Some(session), Some(h)) = (&base.session, &base.health) {
        if !h.is_sealed() {
            diagnostics = run_diagnostics(client, session, h).await;
        } else if let Some(prompt) = prompt.filter(|_| settings.output.is_interactive()) {
            let outcome = UnsealCoordinator::new(client, session)
                .with_settle(settings.settle)
                .run(prompt)
                .await;
            debug!(state = ?outcome.state, rounds = outcome.rounds.len(), "unseal finished");
            if let Some(probe) = outcome.unsealed_health() {
                status = probe.status;
                health = probe.health.clone();
                if let Some(fresh) = &probe.health {
                    diagnostics = run_diagnostics(client, session, fresh).await;
                }
            }
        }
    }

    let hints = collect_hints(health.as_ref(), status);
    let report = Report {
        version: settings.version.clone(),
        timestamp: settings.timestamp,
        status,
        health,
        checks: base.checks,
        diagnostics: diagnostics.entries,
        summary: diagnostics.summary,
        hints,
    };
    info!(
        mode = %report.mode(),
        failures = report.failures(),
        diagnostics = report.diagnostics.len(),
        "medic run complete"
    );
    report
}
