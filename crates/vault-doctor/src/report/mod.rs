//! Final report and its three output contracts.
//!
//! A [`Report`] is assembled once per run and handed to exactly one
//! renderer, picked by [`OutputMode::select`].

use std::io::{self, Write};

use crate::checks::CheckList;
use crate::diagnostics::{DiagnosticsSummary, DIAG_LEADER_ADDRESS, DIAG_LEADER_SELF};
use crate::health::HealthStatus;
use crate::mode::Mode;

pub mod pretty;
pub mod structured;
pub mod style;

pub use pretty::{banner, name_col_width, normalize_version, PrettyOptions};
pub use structured::StructuredRecord;
pub use style::Palette;

/// Line printed in quiet mode when any check failed.
pub const QUIET_FAILURE_LINE: &str = "medic: checks failed";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Structured,
    Quiet,
    Pretty,
}

impl OutputMode {
    /// Structured wins over quiet, quiet over pretty.
    pub const fn select(json: bool, quiet: bool) -> Self {
        if json {
            Self::Structured
        } else if quiet {
            Self::Quiet
        } else {
            Self::Pretty
        }
    }

    /// Only pretty output may stop and ask the operator for input.
    pub const fn is_interactive(self) -> bool {
        matches!(self, Self::Pretty)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub version: String,
    /// Unix seconds, supplied by the caller.
    pub timestamp: i64,
    /// Health status code, 0 when none was received.
    pub status: u16,
    pub health: Option<HealthStatus>,
    pub checks: CheckList,
    pub diagnostics: CheckList,
    pub summary: DiagnosticsSummary,
    pub hints: Vec<String>,
}

impl Report {
    pub fn mode(&self) -> Mode {
        Mode::from_status(self.status)
    }

    /// Failed base checks. Diagnostics never count.
    pub fn failures(&self) -> usize {
        self.checks.failures()
    }

    pub fn exit_code(&self) -> i32 {
        if self.failures() > 0 {
            1
        } else {
            0
        }
    }

    pub fn cluster_name(&self) -> &str {
        self.health.as_ref().map(|h| h.cluster_name.as_str()).unwrap_or_default()
    }

    pub fn leader_address(&self) -> Option<&str> {
        self.diagnostics.find(DIAG_LEADER_ADDRESS).map(|c| c.detail.as_str())
    }

    pub fn leader_is_self(&self) -> Option<bool> {
        self.diagnostics.find(DIAG_LEADER_SELF).map(|c| c.detail == "true")
    }

    /// Render the report in `mode`.
    pub fn render<W: Write>(
        &self,
        mode: OutputMode,
        options: &PrettyOptions,
        out: &mut W,
    ) -> io::Result<()> {
        match mode {
            OutputMode::Structured => structured::write(self, out),
            OutputMode::Quiet => {
                if self.failures() > 0 {
                    writeln!(out, "{}", QUIET_FAILURE_LINE)?;
                }
                Ok(())
            }
            OutputMode::Pretty => pretty::write(self, options, out),
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::checks::Check;
    use crate::diagnostics::{SealSummary, TokenSummary};

    pub(crate) fn active_report() -> Report {
        let health = HealthStatus {
            initialized: Some(true),
            sealed: Some(false),
            standby: Some(false),
            cluster_name: "vault-cluster-1".into(),
            ..Default::default()
        };
        Report {
            version: "1.2.3".into(),
            timestamp: 1_700_000_000,
            status: 200,
            health: Some(health),
            checks: [
                Check::pass("VAULT_ADDR present", "https://vault:8200"),
                Check::pass("API reachability", "active (HTTP 200)"),
                Check::pass("Initialized", "true"),
            ]
            .into_iter()
            .collect(),
            diagnostics: [
                Check::pass(DIAG_LEADER_ADDRESS, "https://vault:8200"),
                Check::pass(DIAG_LEADER_SELF, "true"),
                Check::pass("Seal type", "shamir (threshold 3/5, progress 0)"),
            ]
            .into_iter()
            .collect(),
            summary: DiagnosticsSummary {
                seal: Some(SealSummary {
                    seal_type: "shamir".into(),
                    threshold: Some("3/5".into()),
                    progress: Some(0),
                }),
                token: Some(TokenSummary { ttl: "1h".into(), renewable: true, orphan: false }),
            },
            hints: Vec::new(),
        }
    }

    pub(crate) fn missing_addr_report() -> Report {
        Report {
            version: "dev".into(),
            timestamp: 1_700_000_000,
            status: 0,
            health: None,
            checks: [Check::fail("VAULT_ADDR present", "not set")].into_iter().collect(),
            diagnostics: CheckList::new(),
            summary: DiagnosticsSummary::default(),
            hints: Vec::new(),
        }
    }
}
