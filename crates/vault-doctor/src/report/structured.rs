//! Machine-readable record, emitted once per run whatever the outcome.

use std::io::{self, Write};

use serde::Serialize;

use super::Report;
use crate::checks::CheckList;

#[derive(Debug, Serialize)]
pub struct StructuredRecord<'a> {
    pub version: &'a str,
    pub timestamp: i64,
    pub mode: &'static str,
    #[serde(skip_serializing_if = "is_zero")]
    pub http_status: u16,
    #[serde(skip_serializing_if = "str::is_empty")]
    pub cluster_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leader_address: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leader_is_self: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seal_type: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seal_threshold: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seal_progress: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_ttl: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_renewable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_orphan: Option<bool>,
    pub checks: &'a CheckList,
    #[serde(skip_serializing_if = "CheckList::is_empty")]
    pub diagnostics: &'a CheckList,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    pub hints: &'a [String],
    pub failures: usize,
}

fn is_zero(v: &u16) -> bool {
    *v == 0
}

impl<'a> From<&'a Report> for StructuredRecord<'a> {
    fn from(r: &'a Report) -> Self {
        let seal = r.summary.seal.as_ref();
        let token = r.summary.token.as_ref();
        Self {
            version: &r.version,
            timestamp: r.timestamp,
            mode: r.mode().label(),
            http_status: r.status,
            cluster_name: r.cluster_name(),
            leader_address: r.leader_address().filter(|a| !a.is_empty()),
            leader_is_self: r.leader_is_self(),
            seal_type: seal.map(|s| s.seal_type.as_str()).filter(|t| !t.is_empty()),
            seal_threshold: seal.and_then(|s| s.threshold.as_deref()),
            seal_progress: seal.and_then(|s| s.progress),
            token_ttl: token.map(|t| t.ttl.as_str()),
            token_renewable: token.map(|t| t.renewable),
            token_orphan: token.map(|t| t.orphan),
            checks: &r.checks,
            diagnostics: &r.diagnostics,
            hints: &r.hints,
            failures: r.failures(),
        }
    }
}

/// Write the record as two-space indented JSON followed by a newline.
pub fn write<W: Write>(report: &Report, out: &mut W) -> io::Result<()> {
    let record = StructuredRecord::from(report);
    serde_json::to_writer_pretty(&mut *out, &record)?;
    writeln!(out)
}
