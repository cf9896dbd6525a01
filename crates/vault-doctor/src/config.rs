//! Connection configuration.
//!
//! Settings come from flags with environment fallbacks (`VAULT_ADDR`,
//! `VAULT_TOKEN`, ...). A `.env` file in the working directory is loaded
//! first; variables already present in the environment always win.

use std::path::Path;

use clap::Args;
use tracing::debug;

/// Connection flags shared by commands that talk to the cluster.
#[derive(Args, Debug, Clone, Default)]
#[command(next_help_heading = "Connection")]
pub struct ConnectionArgs {
    /// Cluster address, e.g. https://vault.example.com:8200
    #[arg(long = "addr", env = "VAULT_ADDR")]
    pub addr: Option<String>,

    /// Client token
    #[arg(long = "token", env = "VAULT_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// AppRole role id (used when no token is set)
    #[arg(long = "role-id", env = "VAULT_ROLE_ID")]
    pub role_id: Option<String>,

    /// AppRole secret id (used when no token is set)
    #[arg(long = "secret-id", env = "VAULT_SECRET_ID", hide_env_values = true)]
    pub secret_id: Option<String>,

    /// Namespace sent with every request
    #[arg(long = "namespace", env = "VAULT_NAMESPACE")]
    pub namespace: Option<String>,

    /// Skip TLS certificate verification (true|false)
    #[arg(long = "skip-verify", env = "VAULT_SKIP_VERIFY", value_name = "BOOL")]
    pub skip_verify: Option<String>,
}

/// Immutable configuration for a single run. Empty strings mean "not set".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub addr: String,
    pub token: String,
    pub role_id: String,
    pub secret_id: String,
    pub namespace: String,
    pub skip_verify: bool,
}

impl Config {
    pub fn has_approle(&self) -> bool {
        !self.role_id.is_empty() && !self.secret_id.is_empty()
    }

    /// Request context carrying the given token.
    pub fn session(&self, token: impl Into<String>) -> Session {
        Session {
            addr: self.addr.clone(),
            token: token.into(),
            namespace: self.namespace.clone(),
        }
    }
}

impl From<ConnectionArgs> for Config {
    fn from(args: ConnectionArgs) -> Self {
        let clean = |v: Option<String>| v.map(|s| s.trim().to_string()).unwrap_or_default();
        Self {
            addr: clean(args.addr),
            token: clean(args.token),
            role_id: clean(args.role_id),
            secret_id: clean(args.secret_id),
            namespace: clean(args.namespace),
            skip_verify: args.skip_verify.as_deref().is_some_and(parse_truthy),
        }
    }
}

/// Per-request context: where to send requests and which headers to attach.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub addr: String,
    pub token: String,
    pub namespace: String,
}

impl Session {
    /// Full URL for an API path, tolerating a trailing slash on the address.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.addr.trim_end_matches('/'), path)
    }
}

/// Only a case-insensitive `true` enables a boolean setting.
pub fn parse_truthy(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("true")
}

/// Load `KEY=VALUE` pairs from a dotenv file without overriding variables
/// that are already set. A missing or unreadable file is not an error, and
/// malformed lines are skipped without affecting the lines after them.
pub fn load_dotenv(path: impl AsRef<Path>) {
    let path = path.as_ref();
    let lines = match dotenvy::from_path_iter(path) {
        Ok(lines) => lines,
        Err(e) if e.not_found() => return,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "ignoring unreadable dotenv file");
            return;
        }
    };

    let mut loaded = 0usize;
    for line in lines {
        let (key, value) = match line {
            Ok(pair) => pair,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "skipping malformed dotenv line");
                continue;
            }
        };
        let key = key.trim_start_matches('\u{feff}');
        if std::env::var_os(key).is_none() {
            std::env::set_var(key, value);
            loaded += 1;
        }
    }
    debug!(path = %path.display(), loaded, "loaded dotenv file");
}
