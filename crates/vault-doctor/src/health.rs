//! Health endpoint probe and payload.
//!
//! `/v1/sys/health` answers with a meaningful status code even when the node
//! is sealed or a standby, so any received response counts as a successful
//! probe. Only a transport failure is an error.

use serde::Deserialize;
use tracing::{debug, warn};

use crate::client::{lenient, ClientError, ClusterClient, HEALTH_PATH};
use crate::config::Session;

/// Decoded health payload. Every field is optional: a missing or mistyped
/// field resolves to its default and the matching check is simply omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct HealthStatus {
    #[serde(default, deserialize_with = "lenient::field")]
    pub initialized: Option<bool>,
    #[serde(default, deserialize_with = "lenient::field")]
    pub sealed: Option<bool>,
    #[serde(default, deserialize_with = "lenient::field")]
    pub standby: Option<bool>,
    #[serde(default, deserialize_with = "lenient::field")]
    pub performance_standby: Option<bool>,
    #[serde(default, deserialize_with = "lenient::field")]
    pub cluster_name: String,
    #[serde(default, deserialize_with = "lenient::field")]
    pub server_time_utc: i64,
    #[serde(default, deserialize_with = "lenient::field")]
    pub version: String,
    #[serde(default, deserialize_with = "lenient::field")]
    pub enterprise: bool,

    #[serde(default, deserialize_with = "lenient::field")]
    pub replication_dr_mode: String,
    #[serde(default, deserialize_with = "lenient::field")]
    pub replication_performance_mode: String,

    #[serde(default, deserialize_with = "lenient::field")]
    pub ha_connection_healthy: Option<bool>,
    #[serde(default, deserialize_with = "lenient::field")]
    pub removed_from_cluster: Option<bool>,
    #[serde(default, deserialize_with = "lenient::field")]
    pub echo_duration_ms: Option<i64>,

    // Older servers nest the replication modes.
    #[serde(default, rename = "replication_dr", deserialize_with = "lenient::field")]
    pub replication_dr_legacy: Option<ReplicationMode>,
    #[serde(default, rename = "replication_performance", deserialize_with = "lenient::field")]
    pub replication_perf_legacy: Option<ReplicationMode>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ReplicationMode {
    #[serde(default, deserialize_with = "lenient::field")]
    pub mode: String,
}

impl HealthStatus {
    /// Decode a response body. Returns `None` when the body is not a JSON
    /// object at all.
    pub fn from_body(body: &[u8]) -> Option<Self> {
        match serde_json::from_slice::<serde_json::Value>(body) {
            Ok(value @ serde_json::Value::Object(_)) => {
                Some(Self::deserialize(value).unwrap_or_default())
            }
            _ => None,
        }
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed == Some(true)
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized == Some(true)
    }

    pub fn is_standby(&self) -> bool {
        self.standby == Some(true)
    }

    /// Initialized, unsealed, and not a standby.
    pub fn is_active_leader(&self) -> bool {
        self.is_initialized() && !self.is_sealed() && !self.is_standby()
    }
}

/// Enterprise builds carry a `+ent` marker in their version string.
///
/// This is the only place the marker is interpreted; the health payload
/// exposes no stronger signal today.
pub fn is_enterprise_version(version: &str) -> bool {
    version.contains("+ent")
}

/// Outcome of a health probe that reached the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthProbe {
    pub status: u16,
    pub health: Option<HealthStatus>,
}

/// Issue one GET against the health endpoint.
///
/// Any response, 2xx or not, is decoded best-effort. The error case is a
/// transport failure, for which the caller should assume status 0 and no
/// payload.
pub async fn probe<C: ClusterClient + ?Sized>(
    client: &C,
    session: &Session,
) -> Result<HealthProbe, ClientError> {
    let response = client.get(session, HEALTH_PATH).await.map_err(|e| {
        warn!(addr = %session.addr, error = %e, "health probe failed");
        e
    })?;

    let health = HealthStatus::from_body(&response.body);
    debug!(
        status = response.status,
        decoded = health.is_some(),
        sealed = ?health.as_ref().and_then(|h| h.sealed),
        "health probe complete"
    );
    Ok(HealthProbe { status: response.status, health })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::client::testutil::ScriptedClient;

    #[test]
    fn full_payload_decodes() {
        let body = json!({
            "initialized": true,
            "sealed": false,
            "standby": false,
            "performance_standby": false,
            "replication_dr_mode": "disabled",
            "replication_performance_mode": "primary",
            "server_time_utc": 1_700_000_000,
            "version": "1.15.2+ent",
            "enterprise": true,
            "cluster_name": "vault-cluster-1",
            "echo_duration_ms": 2,
            "clock_skew_ms": 0,
            "ha_connection_healthy": true,
        })
        .to_string();

        let health = HealthStatus::from_body(body.as_bytes()).unwrap();
        assert_eq!(health.initialized, Some(true));
        assert_eq!(health.sealed, Some(false));
        assert_eq!(health.replication_performance_mode, "primary");
        assert_eq!(health.server_time_utc, 1_700_000_000);
        assert_eq!(health.echo_duration_ms, Some(2));
        assert!(health.enterprise);
        assert!(health.is_active_leader());
    }

    #[test]
    fn mistyped_fields_default_without_losing_siblings() {
        let body = br#"{"initialized": "yes", "sealed": true,
            "server_time_utc": "soon", "cluster_name": 7}"#;
        let health = HealthStatus::from_body(body).unwrap();
        assert_eq!(health.initialized, None);
        assert_eq!(health.sealed, Some(true));
        assert_eq!(health.server_time_utc, 0);
        assert_eq!(health.cluster_name, "");
    }

    #[test]
    fn legacy_nested_replication() {
        let body =
            br#"{"replication_dr": {"mode": "secondary"}, "replication_performance": "bogus"}"#;
        let health = HealthStatus::from_body(body).unwrap();
        assert_eq!(health.replication_dr_legacy.map(|r| r.mode), Some("secondary".to_string()));
        assert_eq!(health.replication_perf_legacy, None);
    }

    #[test]
    fn non_object_bodies_yield_no_payload() {
        assert_eq!(HealthStatus::from_body(b""), None);
        assert_eq!(HealthStatus::from_body(b"<html>"), None);
        assert_eq!(HealthStatus::from_body(b"[1,2]"), None);
        assert_eq!(HealthStatus::from_body(b"{}"), Some(HealthStatus::default()));
    }

    #[test]
    fn enterprise_marker() {
        assert!(is_enterprise_version("1.15.2+ent"));
        assert!(is_enterprise_version("1.15.2+ent.hsm"));
        assert!(!is_enterprise_version("1.15.2"));
        assert!(!is_enterprise_version(""));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn probe_keeps_non_2xx_status() {
        let sealed = json!({"initialized": true, "sealed": true});
        let client = ScriptedClient::new().on_get(HEALTH_PATH, 503, sealed);
        let result = probe(&client, &Session::default()).await.unwrap();
        assert_eq!(result.status, 503);
        assert!(result.health.unwrap().is_sealed());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn probe_transport_error() {
        let client = ScriptedClient::new().on_get_err(HEALTH_PATH, "connection refused");
        let err = probe(&client, &Session::default()).await.unwrap_err();
        assert_eq!(err.to_string(), "connection refused");
    }
}
