//! Operator advisories derived from the node's mode and health payload.

use crate::health::HealthStatus;
use crate::mode::Mode;

fn mode_hint(mode: Mode) -> Option<&'static str> {
    let hint = match mode {
        Mode::NotInitialized => {
            "Vault not initialized. Run 'vault operator init' or use automation to initialize."
        }
        Mode::Sealed => "Node is sealed. Unseal it, or ensure auto-unseal is configured.",
        Mode::Standby => "Standby node. Route clients/LB to the active leader for writes.",
        Mode::DrSecondary => "DR secondary detected. This node will not serve writes.",
        Mode::PerfStandby => "Performance standby detected. Reads OK; route writes to active.",
        Mode::StandbyHaUnhealthy => {
            "Standby cannot reach active (HA unhealthy). Check cluster connectivity."
        }
        Mode::Removed => {
            "Node removed from HA cluster. Rejoin or point clients to another member."
        }
        Mode::Active | Mode::Unknown => return None,
    };
    Some(hint)
}

/// Collect advisories for a health status code and optional payload.
///
/// The mode advisory comes first, then one per payload flag. Overlapping
/// advisories are kept.
pub fn collect_hints(health: Option<&HealthStatus>, status: u16) -> Vec<String> {
    let mut hints: Vec<String> =
        mode_hint(Mode::from_status(status)).into_iter().map(String::from).collect();

    let Some(h) = health else {
        return hints;
    };
    if h.standby == Some(true) {
        hints.push("You are hitting a standby node.".to_string());
    }
    if h.ha_connection_healthy == Some(false) {
        hints.push("HA connection is not healthy; check leader/LB/network.".to_string());
    }
    if h.performance_standby == Some(true) {
        hints.push(
            "Performance standby: consider routing reads appropriately, writes to active."
                .to_string(),
        );
    }
    if h.removed_from_cluster == Some(true) {
        hints.push("This node reports 'removed_from_cluster=true'.".to_string());
    }
    hints
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_node_has_no_hints() {
        let h = HealthStatus {
            standby: Some(false),
            ha_connection_healthy: Some(true),
            ..Default::default()
        };
        assert!(collect_hints(Some(&h), 200).is_empty());
        assert!(collect_hints(None, 200).is_empty());
    }

    #[test]
    fn one_hint_per_classified_status() {
        for status in [501, 503, 429, 472, 473, 474, 530] {
            assert_eq!(collect_hints(None, status).len(), 1, "status {status}");
        }
        assert!(collect_hints(None, 0).is_empty());
        assert!(collect_hints(None, 418).is_empty());
    }

    #[test]
    fn sealed_hint_text() {
        assert_eq!(
            collect_hints(None, 503),
            ["Node is sealed. Unseal it, or ensure auto-unseal is configured."]
        );
    }

    #[test]
    fn payload_hints_stack_after_mode_hint() {
        let h = HealthStatus {
            standby: Some(true),
            ha_connection_healthy: Some(false),
            ..Default::default()
        };
        assert_eq!(
            collect_hints(Some(&h), 474),
            [
                "Standby cannot reach active (HA unhealthy). Check cluster connectivity.",
                "You are hitting a standby node.",
                "HA connection is not healthy; check leader/LB/network.",
            ]
        );
    }

    #[test]
    fn removed_and_perf_standby_flags() {
        let h = HealthStatus {
            performance_standby: Some(true),
            removed_from_cluster: Some(true),
            ..Default::default()
        };
        let hints = collect_hints(Some(&h), 530);
        assert_eq!(hints.len(), 3);
        assert_eq!(hints[2], "This node reports 'removed_from_cluster=true'.");
    }
}
