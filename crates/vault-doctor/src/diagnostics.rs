//! Extended diagnostics for unsealed nodes.
//!
//! Each endpoint is queried independently: a forbidden response becomes a
//! single soft entry, any other failure a single failed entry, and neither
//! stops the remaining calls. Values the structured report needs (seal and
//! token details) come back in [`DiagnosticsSummary`] next to the entries.

use std::collections::BTreeMap;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::checks::{Check, CheckList};
use crate::client::{
    lenient, ApiResponse, ClientError, ClusterClient, AUTH_PATH, LEADER_PATH, MOUNTS_PATH,
    SEAL_STATUS_PATH, TOKEN_LOOKUP_SELF_PATH,
};
use crate::config::Session;
use crate::health::HealthStatus;

pub const DIAG_VERSION: &str = "Vault version";
pub const DIAG_LATENCY: &str = "Health latency";
pub const DIAG_HA_LINK: &str = "HA link healthy";
pub const DIAG_REMOVED: &str = "Removed from cluster";
pub const DIAG_DR_MODE: &str = "DR mode";
pub const DIAG_PERF_MODE: &str = "Performance mode";
pub const DIAG_LEADER_ADDRESS: &str = "Leader address";
pub const DIAG_LEADER_SELF: &str = "Leader is self";
pub const DIAG_LEADER_INFO: &str = "Leader info";
pub const DIAG_SEAL_TYPE: &str = "Seal type";
pub const DIAG_SEAL_STATUS: &str = "Seal status";
pub const DIAG_SECRET_ENGINES: &str = "Secret engines";
pub const DIAG_KV_ENGINES: &str = "KV engines";
pub const DIAG_AUTH_METHODS: &str = "Auth methods";
pub const DIAG_TOKEN_POLICIES: &str = "Token policies";
pub const DIAG_TOKEN_TTL: &str = "Token TTL";

pub const FORBIDDEN_DETAIL: &str = "forbidden (insufficient perms)";

/// Rendered TTL for tokens that never expire.
pub const INFINITE_TTL: &str = "∞";

/// Seal configuration lifted into the structured report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SealSummary {
    pub seal_type: String,
    /// `"t/n"`; `None` for auto-unseal.
    pub threshold: Option<String>,
    /// `None` for auto-unseal.
    pub progress: Option<u32>,
}

/// Token attributes lifted into the structured report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenSummary {
    /// Rendered TTL, `"infinite"` for non-expiring tokens.
    pub ttl: String,
    pub renewable: bool,
    pub orphan: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiagnosticsSummary {
    pub seal: Option<SealSummary>,
    pub token: Option<TokenSummary>,
}

/// Entries plus the summary, returned together from one diagnostics run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    pub entries: CheckList,
    pub summary: DiagnosticsSummary,
}

/// Classified response of an optional endpoint.
enum Fetched<T> {
    Ok(T),
    Forbidden,
    Failed(String),
}

async fn fetch<C, T>(client: &C, session: &Session, path: &str, ok: &[u16]) -> Fetched<T>
where
    C: ClusterClient + ?Sized,
    T: for<'de> Deserialize<'de> + Default,
{
    let response: Result<ApiResponse, ClientError> = client.get(session, path).await;
    match response {
        Ok(r) if ok.contains(&r.status) => Fetched::Ok(r.json_or_default()),
        Ok(r) if r.status == 403 => {
            debug!(path, "diagnostic endpoint forbidden");
            Fetched::Forbidden
        }
        Ok(r) => {
            warn!(path, status = r.status, "unexpected diagnostic response");
            Fetched::Failed(format!("unexpected HTTP {}", r.status))
        }
        Err(e) => {
            warn!(path, error = %e, "diagnostic request failed");
            Fetched::Failed(format!("error: {}", e))
        }
    }
}

/// Run every extended diagnostic against an unsealed node.
pub async fn run_diagnostics<C: ClusterClient + ?Sized>(
    client: &C,
    session: &Session,
    health: &HealthStatus,
) -> Diagnostics {
    let mut entries = CheckList::new();
    let mut summary = DiagnosticsSummary::default();

    push_health_markers(&mut entries, health);
    leadership(client, session, health, &mut entries).await;
    summary.seal = seal_configuration(client, session, &mut entries).await;
    secret_engines(client, session, &mut entries).await;
    auth_methods(client, session, &mut entries).await;
    summary.token = token_introspection(client, session, &mut entries).await;

    debug!(entries = entries.len(), "diagnostics complete");
    Diagnostics { entries, summary }
}

fn push_health_markers(entries: &mut CheckList, h: &HealthStatus) {
    if !h.version.is_empty() {
        let detail =
            if h.enterprise { format!("{} (ent)", h.version) } else { h.version.clone() };
        entries.push(Check::pass(DIAG_VERSION, detail));
    }
    if let Some(ms) = h.echo_duration_ms {
        entries.push(Check::pass(DIAG_LATENCY, format!("{}ms", ms)));
    }
    if let (Some(healthy), true) = (h.ha_connection_healthy, h.is_standby()) {
        entries.push(Check::new(DIAG_HA_LINK, healthy, healthy.to_string()));
    }
    if h.removed_from_cluster == Some(true) {
        entries.push(Check::fail(DIAG_REMOVED, "true"));
    }
    if !h.replication_dr_mode.is_empty() && h.replication_dr_mode != "disabled" {
        entries.push(Check::pass(DIAG_DR_MODE, h.replication_dr_mode.clone()));
    }
    if !h.replication_performance_mode.is_empty() && h.replication_performance_mode != "disabled"
    {
        entries.push(Check::pass(DIAG_PERF_MODE, h.replication_performance_mode.clone()));
    }
    if let Some(legacy) = h.replication_dr_legacy.as_ref().filter(|r| !r.mode.is_empty()) {
        entries.push(Check::pass(DIAG_DR_MODE, legacy.mode.clone()));
    }
    if let Some(legacy) = h.replication_perf_legacy.as_ref().filter(|r| !r.mode.is_empty()) {
        entries.push(Check::pass(DIAG_PERF_MODE, legacy.mode.clone()));
    }
}

// ── Leadership ───────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
struct LeaderResponse {
    #[serde(default, deserialize_with = "lenient::field")]
    is_self: Option<bool>,
    #[serde(default, rename = "leader_address", deserialize_with = "lenient::field")]
    leader: String,
}

/// Case-insensitive, trailing-slash-insensitive address equality. Empty
/// addresses never match.
pub fn same_address(a: &str, b: &str) -> bool {
    let norm = |s: &str| s.trim().to_ascii_lowercase().trim_end_matches('/').to_string();
    let (a, b) = (norm(a), norm(b));
    !a.is_empty() && a == b
}

/// Decide whether the probed node is the leader.
///
/// Priority: the response's explicit flag, then the node's own health
/// (initialized, unsealed, not standby), then address equality or an empty
/// leader address.
pub fn leader_is_self(
    explicit: Option<bool>,
    health: &HealthStatus,
    leader: &str,
    configured: &str,
) -> bool {
    if let Some(flag) = explicit {
        return flag;
    }
    if health.is_active_leader() {
        return true;
    }
    leader.trim().is_empty() || same_address(leader, configured)
}

async fn leadership<C: ClusterClient + ?Sized>(
    client: &C,
    session: &Session,
    health: &HealthStatus,
    entries: &mut CheckList,
) {
    match fetch::<_, LeaderResponse>(client, session, LEADER_PATH, &[200]).await {
        Fetched::Ok(lr) => {
            let addr = match lr.leader.trim() {
                "" => session.addr.clone(),
                a => a.to_string(),
            };
            entries.push(Check::pass(DIAG_LEADER_ADDRESS, addr));
            let is_self = leader_is_self(lr.is_self, health, &lr.leader, &session.addr);
            entries.push(Check::pass(DIAG_LEADER_SELF, is_self.to_string()));
        }
        Fetched::Forbidden => entries.push(Check::pass(DIAG_LEADER_INFO, FORBIDDEN_DETAIL)),
        Fetched::Failed(detail) => entries.push(Check::fail(DIAG_LEADER_INFO, detail)),
    }
}

// ── Seal configuration ───────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
struct SealStatusResponse {
    #[serde(default, rename = "type", deserialize_with = "lenient::field")]
    seal_type: String,
    #[serde(default, rename = "t", deserialize_with = "lenient::field")]
    threshold: u32,
    #[serde(default, rename = "n", deserialize_with = "lenient::field")]
    shares: u32,
    #[serde(default, deserialize_with = "lenient::field")]
    progress: u32,
}

async fn seal_configuration<C: ClusterClient + ?Sized>(
    client: &C,
    session: &Session,
    entries: &mut CheckList,
) -> Option<SealSummary> {
    match fetch::<_, SealStatusResponse>(client, session, SEAL_STATUS_PATH, &[200]).await {
        Fetched::Ok(ss) => {
            let summary = if ss.threshold == 0 && ss.shares == 0 {
                entries.push(Check::pass(DIAG_SEAL_TYPE, ss.seal_type.clone()));
                SealSummary { seal_type: ss.seal_type, threshold: None, progress: None }
            } else {
                let threshold = format!("{}/{}", ss.threshold, ss.shares);
                entries.push(Check::pass(
                    DIAG_SEAL_TYPE,
                    format!("{} (threshold {}, progress {})", ss.seal_type, threshold, ss.progress),
                ));
                SealSummary {
                    seal_type: ss.seal_type,
                    threshold: Some(threshold),
                    progress: Some(ss.progress),
                }
            };
            Some(summary)
        }
        Fetched::Forbidden => {
            entries.push(Check::pass(DIAG_SEAL_STATUS, FORBIDDEN_DETAIL));
            None
        }
        Fetched::Failed(detail) => {
            entries.push(Check::fail(DIAG_SEAL_STATUS, detail));
            None
        }
    }
}

// ── Secret engines and auth methods ──────────────────────────

#[derive(Debug, Default, Deserialize)]
struct MountTable {
    #[serde(default, deserialize_with = "lenient::field")]
    data: BTreeMap<String, MountEntry>,
}

#[derive(Debug, Default, Deserialize)]
struct MountEntry {
    #[serde(default, rename = "type", deserialize_with = "lenient::field")]
    mount_type: String,
    #[serde(default, deserialize_with = "lenient::field")]
    options: Option<BTreeMap<String, serde_json::Value>>,
}

impl MountEntry {
    fn is_kv(&self) -> bool {
        matches!(self.mount_type.as_str(), "kv" | "generic")
    }

    /// The version option may arrive as `"2"` or `2`.
    fn is_kv_v2(&self) -> bool {
        let version = self.options.as_ref().and_then(|o| o.get("version"));
        match version {
            Some(serde_json::Value::String(s)) => s == "2",
            Some(serde_json::Value::Number(n)) => n.to_string() == "2",
            _ => false,
        }
    }
}

/// Counts for a mount table: (total, kv total, kv v2). The root path `""`
/// is not a mount.
fn count_mounts(table: &MountTable) -> (usize, usize, usize) {
    let mounts = table.data.iter().filter(|(path, _)| !path.is_empty()).map(|(_, m)| m);
    mounts.fold((0, 0, 0), |(total, kv, v2), m| {
        (total + 1, kv + usize::from(m.is_kv()), v2 + usize::from(m.is_kv() && m.is_kv_v2()))
    })
}

async fn secret_engines<C: ClusterClient + ?Sized>(
    client: &C,
    session: &Session,
    entries: &mut CheckList,
) {
    match fetch::<_, MountTable>(client, session, MOUNTS_PATH, &[200, 204]).await {
        Fetched::Ok(table) => {
            let (total, kv, v2) = count_mounts(&table);
            entries.push(Check::pass(DIAG_SECRET_ENGINES, total.to_string()));
            entries.push(Check::pass(
                DIAG_KV_ENGINES,
                format!("total={} (v2={}, v1={})", kv, v2, kv - v2),
            ));
        }
        Fetched::Forbidden => entries.push(Check::pass(DIAG_SECRET_ENGINES, FORBIDDEN_DETAIL)),
        Fetched::Failed(detail) => entries.push(Check::fail(DIAG_SECRET_ENGINES, detail)),
    }
}

async fn auth_methods<C: ClusterClient + ?Sized>(
    client: &C,
    session: &Session,
    entries: &mut CheckList,
) {
    match fetch::<_, MountTable>(client, session, AUTH_PATH, &[200]).await {
        Fetched::Ok(table) => {
            let count = table.data.keys().filter(|p| !p.is_empty()).count();
            entries.push(Check::pass(DIAG_AUTH_METHODS, count.to_string()));
        }
        Fetched::Forbidden => entries.push(Check::pass(DIAG_AUTH_METHODS, FORBIDDEN_DETAIL)),
        Fetched::Failed(detail) => entries.push(Check::fail(DIAG_AUTH_METHODS, detail)),
    }
}

// ── Token introspection ──────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
struct TokenLookup {
    #[serde(default, deserialize_with = "lenient::field")]
    data: TokenData,
}

#[derive(Debug, Default, Deserialize)]
struct TokenData {
    #[serde(default, deserialize_with = "lenient::field")]
    policies: Vec<String>,
    #[serde(default, deserialize_with = "lenient::field")]
    ttl: i64,
    #[serde(default, deserialize_with = "lenient::field")]
    renewable: bool,
    #[serde(default, deserialize_with = "lenient::field")]
    orphan: bool,
}

/// Render a TTL in seconds using the largest whole unit that divides it.
pub fn human_ttl(secs: i64) -> String {
    if secs <= 0 {
        INFINITE_TTL.to_string()
    } else if secs % 3600 == 0 {
        format!("{}h", secs / 3600)
    } else if secs % 60 == 0 {
        format!("{}m", secs / 60)
    } else {
        format!("{}s", secs)
    }
}

async fn token_introspection<C: ClusterClient + ?Sized>(
    client: &C,
    session: &Session,
    entries: &mut CheckList,
) -> Option<TokenSummary> {
    let lookup = fetch::<_, TokenLookup>(client, session, TOKEN_LOOKUP_SELF_PATH, &[200]).await;
    let data = match lookup {
        Fetched::Ok(lookup) => lookup.data,
        Fetched::Forbidden => {
            entries.push(Check::pass(DIAG_TOKEN_POLICIES, FORBIDDEN_DETAIL));
            return None;
        }
        Fetched::Failed(detail) => {
            entries.push(Check::fail(DIAG_TOKEN_POLICIES, detail));
            return None;
        }
    };

    entries.push(Check::pass(DIAG_TOKEN_POLICIES, data.policies.join(",")));

    let rendered = human_ttl(data.ttl);
    let mut detail =
        format!("{} (renewable={}, orphan={})", rendered, data.renewable, data.orphan);
    if data.ttl <= 0 {
        detail.push_str(", non-expiring");
    }
    entries.push(Check::pass(DIAG_TOKEN_TTL, detail));

    Some(TokenSummary {
        ttl: if data.ttl <= 0 { "infinite".to_string() } else { rendered },
        renewable: data.renewable,
        orphan: data.orphan,
    })
}
