//! Node mode classification from the health endpoint's HTTP status code.

use std::fmt;

/// Operational mode of a node, derived solely from the `/v1/sys/health`
/// status code. Every code maps to exactly one mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Active,
    Standby,
    DrSecondary,
    PerfStandby,
    StandbyHaUnhealthy,
    NotInitialized,
    Sealed,
    Removed,
    Unknown,
}

impl Mode {
    /// Classify a status code. `0` means no response was received.
    pub const fn from_status(code: u16) -> Self {
        match code {
            200 => Self::Active,
            429 => Self::Standby,
            472 => Self::DrSecondary,
            473 => Self::PerfStandby,
            474 => Self::StandbyHaUnhealthy,
            501 => Self::NotInitialized,
            503 => Self::Sealed,
            530 => Self::Removed,
            _ => Self::Unknown,
        }
    }

    pub const fn label(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Standby => "standby",
            Self::DrSecondary => "dr-secondary",
            Self::PerfStandby => "perf-standby",
            Self::StandbyHaUnhealthy => "standby (ha-unhealthy)",
            Self::NotInitialized => "not-initialized",
            Self::Sealed => "sealed",
            Self::Removed => "removed",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
