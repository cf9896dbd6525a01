//! Command-line surface.
//!
//! The first argument selects the command. Anything unrecognised prints the
//! help text rather than an error; `medic` flags are parsed with clap.

use clap::Parser;
use tracing::Level;

use crate::config::ConnectionArgs;
use crate::report::normalize_version;

/// Version reported by `-V` and the banner. A build may inject its own
/// value through `VAULT_DOCTOR_BUILD_VERSION`.
pub fn build_version() -> &'static str {
    option_env!("VAULT_DOCTOR_BUILD_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"))
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "vault_doctor medic",
    about = "Diagnose a single cluster node",
    disable_version_flag = true
)]
pub struct MedicArgs {
    /// Output machine-readable JSON (no banner, no prompts)
    #[arg(long)]
    pub json: bool,

    /// Suppress pretty output and prompts (exit code reflects status)
    #[arg(long)]
    pub quiet: bool,

    /// Disable ANSI colors (NO_COLOR=1 also works)
    #[arg(long = "no-color")]
    pub no_color: bool,

    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Log level
    #[arg(long, env = "VAULT_DOCTOR_LOG_LEVEL", default_value_t = Level::WARN)]
    pub log_level: Level,

    /// Log format (text|json)
    #[arg(long, env = "VAULT_DOCTOR_LOG_FORMAT", default_value = "text")]
    pub log_format: String,
}

#[derive(Debug, Clone)]
pub enum Command {
    Help,
    Version,
    Medic(Box<MedicArgs>),
    /// Shell name as given, `None` when missing.
    Completion(Option<String>),
}

/// Parse the full argument list, program name included.
pub fn parse<I, T>(args: I) -> Result<Command, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<String>,
{
    let mut args = args.into_iter().map(Into::into).skip(1);
    let Some(first) = args.next() else {
        return Ok(Command::Help);
    };
    let command = match first.as_str() {
        "-h" | "--help" | "help" => Command::Help,
        "-V" | "--version" => Command::Version,
        "medic" => {
            let rest = std::iter::once("vault_doctor medic".to_string()).chain(args);
            Command::Medic(Box::new(MedicArgs::try_parse_from(rest)?))
        }
        "completion" => Command::Completion(args.next()),
        _ => Command::Help,
    };
    Ok(command)
}

/// `-V` output: the normalised version without a leading `v`.
pub fn version_line(version: &str) -> String {
    normalize_version(version)
}

pub fn help_text(version: &str) -> String {
    format!(
        "vault_doctor

Usage:
  vault_doctor medic [--json] [--quiet] [--no-color] [connection flags]
  vault_doctor completion <bash|zsh|fish>
  vault_doctor -V|--version
  vault_doctor -h|--help

Version:
  {}

Flags (medic):
  --json         Output machine-readable JSON (no banner, no prompts).
  --quiet        Suppress pretty output and prompts (exit code reflects status).
  --no-color     Disable ANSI colors (NO_COLOR=1 also works).
  --log-level    Diagnostic log level on stderr (default warn).
  --log-format   Diagnostic log format, text|json.

Environment variables (read directly and via .env if present):
  VAULT_ADDR               https://<host>:8200
  VAULT_TOKEN              <token>
  VAULT_ROLE_ID            <role_id>
  VAULT_SECRET_ID          <secret_id>
  VAULT_NAMESPACE          <namespace>
  VAULT_SKIP_VERIFY        true|false
  NO_COLOR                 any non-empty value disables colors
  COLUMNS                  terminal width override
  VAULT_DOCTOR_LOG_LEVEL   error|warn|info|debug|trace
  VAULT_DOCTOR_LOG_FORMAT  text|json
",
        normalize_version(version)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(args: &[&str]) -> Command {
        parse(args.iter().copied()).unwrap()
    }

    #[test]
    fn no_args_and_unknown_input_print_help() {
        assert!(matches!(parse_ok(&["vault_doctor"]), Command::Help));
        assert!(matches!(parse_ok(&["vault_doctor", "frobnicate"]), Command::Help));
        assert!(matches!(parse_ok(&["vault_doctor", "--bogus"]), Command::Help));
        assert!(matches!(parse_ok(&["vault_doctor", "help"]), Command::Help));
        assert!(matches!(parse_ok(&["vault_doctor", "-h"]), Command::Help));
    }

    #[test]
    fn version_flags() {
        assert!(matches!(parse_ok(&["vault_doctor", "-V"]), Command::Version));
        assert!(matches!(parse_ok(&["vault_doctor", "--version"]), Command::Version));
        assert_eq!(version_line("v0.3.1"), "0.3.1");
        assert_eq!(version_line(""), "dev");
    }

    #[test]
    fn medic_flags() {
        let argv = [
            "vault_doctor", "medic", "--json", "--quiet", "--no-color", "--addr", "https://v:8200",
        ];
        let Command::Medic(args) = parse_ok(&argv) else {
            panic!("expected medic");
        };
        assert!(args.json && args.quiet && args.no_color);
        assert_eq!(args.connection.addr.as_deref(), Some("https://v:8200"));
        assert_eq!(args.log_format, "text");
    }

    #[test]
    fn medic_rejects_unknown_flags() {
        assert!(parse(["vault_doctor", "medic", "--nope"]).is_err());
    }

    #[test]
    fn completion_shell_is_optional() {
        assert!(matches!(parse_ok(&["vault_doctor", "completion"]), Command::Completion(None)));
        assert!(matches!(
            parse_ok(&["vault_doctor", "completion", "zsh"]),
            Command::Completion(Some(s)) if s == "zsh"
        ));
    }

    #[test]
    fn help_lists_environment() {
        let help = help_text("1.0.0");
        assert!(help.contains("VAULT_SKIP_VERIFY"));
        assert!(help.contains("Version:\n  1.0.0\n"));
    }
}
