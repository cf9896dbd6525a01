//! Human-oriented terminal rendering.

use std::io::{self, Write};

use super::style::Palette;
use super::Report;
use crate::checks::CheckList;

const MIN_NAME_WIDTH: usize = 22;
const MAX_NAME_WIDTH: usize = 40;
const NARROW_NAME_WIDTH: usize = 18;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrettyOptions {
    pub palette: Palette,
    pub term_width: usize,
}

impl PrettyOptions {
    pub const fn new(palette: Palette, term_width: usize) -> Self {
        Self { palette, term_width }
    }

    pub const fn plain(term_width: usize) -> Self {
        Self::new(Palette::plain(), term_width)
    }
}

/// Build version for display: `dev` for empty or placeholder values, and
/// otherwise the version without any leading `v`.
pub fn normalize_version(raw: &str) -> String {
    let v = raw.trim();
    match v {
        "" | "dev" | "v" => "dev".to_string(),
        _ => v.trim_start_matches('v').to_string(),
    }
}

pub fn banner(version: &str, palette: &Palette) -> String {
    let v = match normalize_version(version).as_str() {
        "dev" => "dev".to_string(),
        n => format!("v{n}"),
    };
    format!("{} {}  {}", palette.green("🩺 vault_doctor"), palette.yellow("medic"), v)
}

/// Width of the name column for `checks` on a terminal `term_width` wide.
pub fn name_col_width(checks: &CheckList, term_width: usize) -> usize {
    let longest = checks.iter().map(|c| c.name.chars().count()).max().unwrap_or(0);
    let width = longest.clamp(MIN_NAME_WIDTH, MAX_NAME_WIDTH);
    if (width + 2) as isize > term_width as isize - 24 {
        (term_width as isize - 26).max(NARROW_NAME_WIDTH as isize) as usize
    } else {
        width
    }
}

fn pad(name: &str, width: usize) -> String {
    format!("{name:<width$}")
}

pub fn summary_line(failures: usize) -> String {
    if failures == 0 {
        "Medic finished: all checks passed ✔".to_string()
    } else {
        format!("Medic finished: {failures} check(s) failed ❌")
    }
}

/// Everything after the banner: mode line, checks, summary, advisories
/// and diagnostics.
pub fn write<W: Write>(report: &Report, options: &PrettyOptions, out: &mut W) -> io::Result<()> {
    let palette = &options.palette;

    if report.status != 0 {
        writeln!(out, "{} {} (HTTP {})", palette.yellow("ℹ Mode"), report.mode(), report.status)?;
    }

    let width = name_col_width(&report.checks, options.term_width);
    for check in &report.checks {
        let mark = if check.ok { palette.green("✅") } else { palette.red("❌") };
        let name = pad(&check.name, width);
        if check.detail.is_empty() {
            writeln!(out, "{} {}", mark, name.trim_end())?;
        } else {
            writeln!(out, "{} {}  {}", mark, name, check.detail)?;
        }
    }

    let failures = report.failures();
    writeln!(out)?;
    let summary = summary_line(failures);
    let summary = if failures > 0 { palette.red(&summary) } else { palette.green(&summary) };
    writeln!(out, "{}", summary)?;

    if !report.hints.is_empty() {
        writeln!(out)?;
        writeln!(out, "{}", palette.yellow("Next actions"))?;
        for hint in &report.hints {
            writeln!(out, "  • {}", hint)?;
        }
    }

    if !report.diagnostics.is_empty() {
        writeln!(out)?;
        writeln!(out, "{}", palette.yellow("Diagnostics"))?;
        let width = name_col_width(&report.diagnostics, options.term_width);
        for diag in &report.diagnostics {
            writeln!(out, "{} {}  {}", palette.green("•"), pad(&diag.name, width), diag.detail)?;
        }
    }
    Ok(())
}
