//! Base check sequence.
//!
//! Runs the setup and health checks in a fixed order. The first three steps
//! (address, auth, health probe) can fail terminally; in that case the
//! outcome carries only the checks accumulated so far.

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::auth::approle_login;
use crate::checks::{Check, CheckList};
use crate::client::{lenient, ClusterClient, LICENSE_STATUS_PATH};
use crate::config::{Config, Session};
use crate::diagnostics::FORBIDDEN_DETAIL;
use crate::health::{self, is_enterprise_version, HealthStatus};
use crate::mode::Mode;

pub const CHECK_ADDR: &str = "VAULT_ADDR present";
pub const CHECK_TOKEN: &str = "VAULT_TOKEN present";
pub const CHECK_APPROLE: &str = "AppRole login";
pub const CHECK_AUTH_CONFIG: &str = "Auth configuration";
pub const CHECK_REACHABILITY: &str = "API reachability";
pub const CHECK_PAYLOAD: &str = "Health payload";
pub const CHECK_INITIALIZED: &str = "Initialized";
pub const CHECK_SEALED: &str = "Sealed";
pub const CHECK_STANDBY: &str = "Standby mode";
pub const CHECK_CLUSTER_NAME: &str = "Cluster name";
pub const CHECK_SERVER_TIME: &str = "Server time";
pub const CHECK_VERSION: &str = "Vault version";
pub const CHECK_LICENSE_STATUS: &str = "License status";
pub const CHECK_LICENSE_STATE: &str = "License state";

/// Result of the base sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseOutcome {
    pub checks: CheckList,
    /// Health status code, 0 when no response was received.
    pub status: u16,
    pub health: Option<HealthStatus>,
    /// Authenticated request context; `None` when setup stopped before auth
    /// resolved.
    pub session: Option<Session>,
}

impl BaseOutcome {
    fn stopped(checks: CheckList, session: Option<Session>) -> Self {
        Self { checks, status: 0, health: None, session }
    }

    pub fn mode(&self) -> Mode {
        Mode::from_status(self.status)
    }
}

/// Run the base sequence against `client`.
pub async fn run_base<C: ClusterClient + ?Sized>(client: &C, config: &Config) -> BaseOutcome {
    let mut checks = CheckList::new();

    if config.addr.is_empty() {
        checks.push(Check::fail(CHECK_ADDR, "not set"));
        warn!("no cluster address configured");
        return BaseOutcome::stopped(checks, None);
    }
    checks.push(Check::pass(CHECK_ADDR, config.addr.clone()));

    let session = if !config.token.is_empty() {
        checks.push(Check::pass(CHECK_TOKEN, "token provided"));
        config.session(config.token.clone())
    } else if config.has_approle() {
        let anonymous = config.session("");
        match approle_login(client, &anonymous, &config.role_id, &config.secret_id).await {
            Ok(token) => {
                checks.push(Check::pass(CHECK_APPROLE, "received client token"));
                config.session(token)
            }
            Err(e) => {
                checks.push(Check::fail(CHECK_APPROLE, e.to_string()));
                return BaseOutcome::stopped(checks, None);
            }
        }
    } else {
        checks.push(Check::fail(
            CHECK_AUTH_CONFIG,
            "provide VAULT_TOKEN or VAULT_ROLE_ID + VAULT_SECRET_ID",
        ));
        return BaseOutcome::stopped(checks, None);
    };

    let probe = match health::probe(client, &session).await {
        Ok(probe) => probe,
        Err(e) => {
            checks.push(Check::fail(CHECK_REACHABILITY, e.to_string()));
            return BaseOutcome::stopped(checks, Some(session));
        }
    };

    let mode = Mode::from_status(probe.status);
    info!(addr = %session.addr, %mode, status = probe.status, "node reachable");
    checks.push(Check::pass(CHECK_REACHABILITY, format!("{} (HTTP {})", mode, probe.status)));

    match &probe.health {
        Some(h) => {
            push_health_checks(&mut checks, h);
            push_version_checks(&mut checks, client, &session, h).await;
        }
        None => checks.push(Check::fail(CHECK_PAYLOAD, "no JSON body returned")),
    }

    BaseOutcome { checks, status: probe.status, health: probe.health, session: Some(session) }
}

fn push_health_checks(checks: &mut CheckList, h: &HealthStatus) {
    if let Some(initialized) = h.initialized {
        checks.push(Check::new(CHECK_INITIALIZED, initialized, initialized.to_string()));
    }
    if let Some(sealed) = h.sealed {
        checks.push(Check::new(CHECK_SEALED, !sealed, format!("sealed={}", sealed)));
    }
    if let Some(standby) = h.standby {
        checks.push(Check::new(CHECK_STANDBY, !standby, format!("standby={}", standby)));
    }
    if !h.cluster_name.is_empty() {
        checks.push(Check::pass(CHECK_CLUSTER_NAME, h.cluster_name.clone()));
    }
    if h.server_time_utc != 0 {
        checks.push(Check::pass(CHECK_SERVER_TIME, h.server_time_utc.to_string()));
    }
}

async fn push_version_checks<C: ClusterClient + ?Sized>(
    checks: &mut CheckList,
    client: &C,
    session: &Session,
    h: &HealthStatus,
) {
    if !is_enterprise_version(&h.version) {
        checks.push(Check::pass(CHECK_VERSION, h.version.clone()));
        return;
    }

    checks.push(Check::pass(CHECK_VERSION, format!("{} (enterprise detected)", h.version)));
    checks.push(license_check(client, session).await);
}

#[derive(Debug, Default, Deserialize)]
struct LicenseResponse {
    #[serde(default, deserialize_with = "lenient::field")]
    data: LicenseData,
}

#[derive(Debug, Default, Deserialize)]
struct LicenseData {
    #[serde(default, deserialize_with = "lenient::field")]
    autoloaded: Option<LicenseDetails>,
    #[serde(flatten)]
    details: LicenseDetails,
}

#[derive(Debug, Default, Deserialize)]
struct LicenseDetails {
    #[serde(default, deserialize_with = "lenient::field")]
    state: String,
    #[serde(default, deserialize_with = "lenient::field")]
    expiration_time: String,
    #[serde(default, deserialize_with = "lenient::field")]
    features: Vec<String>,
}

impl LicenseDetails {
    fn is_empty(&self) -> bool {
        self.state.trim().is_empty()
            && self.expiration_time.trim().is_empty()
            && self.features.is_empty()
    }

    fn describe(&self) -> String {
        let mut parts = Vec::new();
        if !self.state.trim().is_empty() {
            parts.push(self.state.trim().to_string());
        }
        if !self.expiration_time.trim().is_empty() {
            parts.push(format!("expires {}", self.expiration_time.trim()));
        }
        if !self.features.is_empty() {
            parts.push(format!("features: {}", self.features.join(", ")));
        }
        parts.join("; ")
    }
}

async fn license_check<C: ClusterClient + ?Sized>(client: &C, session: &Session) -> Check {
    let response = match client.get(session, LICENSE_STATUS_PATH).await {
        Ok(r) => r,
        Err(e) => return Check::fail(CHECK_LICENSE_STATUS, format!("error: {}", e)),
    };
    debug!(status = response.status, "license status fetched");

    match response.status {
        403 => Check::fail(CHECK_LICENSE_STATUS, FORBIDDEN_DETAIL),
        404 => Check::fail(
            CHECK_LICENSE_STATUS,
            "not available (endpoint disabled or OSS-like behavior)",
        ),
        200 => {
            let LicenseResponse { data } = response.json_or_default();
            let details = data.autoloaded.unwrap_or(data.details);
            if details.is_empty() {
                Check::pass(CHECK_LICENSE_STATUS, "available, no details reported")
            } else {
                Check::pass(CHECK_LICENSE_STATE, details.describe())
            }
        }
        other => Check::fail(CHECK_LICENSE_STATUS, format!("unexpected HTTP {}", other)),
    }
}
