//! Cluster API client abstraction.
//!
//! The engines only ever talk to the cluster through [`ClusterClient`], which
//! lets tests swap in scripted responses. [`http::HttpClusterClient`] is the
//! reqwest-backed implementation used by the binary.

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::config::Session;

pub mod http;

pub use http::HttpClusterClient;

pub const HEALTH_PATH: &str = "/v1/sys/health";
pub const LEADER_PATH: &str = "/v1/sys/leader";
pub const SEAL_STATUS_PATH: &str = "/v1/sys/seal-status";
pub const MOUNTS_PATH: &str = "/v1/sys/mounts";
pub const AUTH_PATH: &str = "/v1/sys/auth";
pub const TOKEN_LOOKUP_SELF_PATH: &str = "/v1/auth/token/lookup-self";
pub const APPROLE_LOGIN_PATH: &str = "/v1/auth/approle/login";
pub const UNSEAL_PATH: &str = "/v1/sys/unseal";
pub const LICENSE_STATUS_PATH: &str = "/v1/sys/license/status";

/// A received HTTP response: status code plus raw body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self { status, body: body.into() }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Strict decode, used on write paths where a bad body must surface.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    /// Lenient decode for read paths: anything that does not parse becomes
    /// the type's default.
    pub fn json_or_default<T: DeserializeOwned + Default>(&self) -> T {
        serde_json::from_slice(&self.body).unwrap_or_default()
    }
}

/// Errors raised below the HTTP status layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// Connection refused, TLS failure, timeout, ...
    Transport(String),
    /// The request could not be built (bad address, bad body)
    Request(String),
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(e) => write!(f, "{}", e),
            Self::Request(e) => write!(f, "invalid request: {}", e),
        }
    }
}

impl std::error::Error for ClientError {}

/// Authenticated request/response access to one cluster node.
///
/// One attempt per call, no retries. Implementations apply their own
/// client-wide timeout.
#[async_trait]
pub trait ClusterClient: Send + Sync {
    async fn get(&self, session: &Session, path: &str) -> Result<ApiResponse, ClientError>;

    async fn post(
        &self,
        session: &Session,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<ApiResponse, ClientError>;
}

/// Serde helpers that never fail a whole payload because of one field.
pub(crate) mod lenient {
    use serde::{de::DeserializeOwned, Deserialize, Deserializer};

    /// Decode a field, falling back to its default on a type mismatch.
    pub(crate) fn field<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned + Default,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(T::deserialize(value).unwrap_or_default())
    }
}

#[cfg(test)]
pub(crate) mod testutil {
    //! Scripted client double shared by the engine tests.

    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;

    use super::*;

    /// Response script keyed by `METHOD path`. Each key holds a queue; the
    /// last queued reply is repeated once the queue drains to one entry.
    #[derive(Default)]
    pub(crate) struct ScriptedClient {
        replies: Mutex<HashMap<String, VecDeque<Result<ApiResponse, ClientError>>>>,
        calls: Mutex<Vec<(String, Option<serde_json::Value>)>>,
    }

    impl ScriptedClient {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        pub(crate) fn on_get(self, path: &str, status: u16, body: serde_json::Value) -> Self {
            self.push(format!("GET {path}"), Ok(ApiResponse::new(status, body.to_string())))
        }

        pub(crate) fn on_get_raw(self, path: &str, status: u16, body: &str) -> Self {
            self.push(format!("GET {path}"), Ok(ApiResponse::new(status, body)))
        }

        pub(crate) fn on_get_err(self, path: &str, err: &str) -> Self {
            self.push(format!("GET {path}"), Err(ClientError::Transport(err.to_string())))
        }

        pub(crate) fn on_post(self, path: &str, status: u16, body: serde_json::Value) -> Self {
            self.push(format!("POST {path}"), Ok(ApiResponse::new(status, body.to_string())))
        }

        pub(crate) fn on_post_raw(self, path: &str, status: u16, body: &str) -> Self {
            self.push(format!("POST {path}"), Ok(ApiResponse::new(status, body)))
        }

        pub(crate) fn on_post_err(self, path: &str, err: &str) -> Self {
            self.push(format!("POST {path}"), Err(ClientError::Transport(err.to_string())))
        }

        fn push(self, key: String, reply: Result<ApiResponse, ClientError>) -> Self {
            self.replies.lock().unwrap().entry(key).or_default().push_back(reply);
            self
        }

        /// All calls made so far, as `METHOD path`.
        pub(crate) fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().iter().map(|(k, _)| k.clone()).collect()
        }

        pub(crate) fn count(&self, key: &str) -> usize {
            self.calls.lock().unwrap().iter().filter(|(k, _)| k == key).count()
        }

        pub(crate) fn bodies(&self, key: &str) -> Vec<serde_json::Value> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .filter(|(k, _)| k == key)
                .filter_map(|(_, b)| b.clone())
                .collect()
        }

        fn reply(
            &self,
            key: String,
            body: Option<serde_json::Value>,
        ) -> Result<ApiResponse, ClientError> {
            self.calls.lock().unwrap().push((key.clone(), body));
            let mut replies = self.replies.lock().unwrap();
            match replies.get_mut(&key) {
                Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
                Some(queue) if !queue.is_empty() => queue[0].clone(),
                _ => Ok(ApiResponse::new(404, "")),
            }
        }
    }

    #[async_trait]
    impl ClusterClient for ScriptedClient {
        async fn get(&self, _session: &Session, path: &str) -> Result<ApiResponse, ClientError> {
            self.reply(format!("GET {path}"), None)
        }

        async fn post(
            &self,
            _session: &Session,
            path: &str,
            body: &serde_json::Value,
        ) -> Result<ApiResponse, ClientError> {
            self.reply(format!("POST {path}"), Some(body.clone()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, serde::Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "lenient::field")]
        flag: Option<bool>,
        #[serde(default, deserialize_with = "lenient::field")]
        name: String,
    }

    #[test]
    fn lenient_field_defaults_on_mismatch_only() {
        let resp = ApiResponse::new(200, r#"{"flag": "nope", "name": "ok"}"#);
        let probe: Probe = resp.json_or_default();
        assert_eq!(probe.flag, None);
        assert_eq!(probe.name, "ok");
    }

    #[test]
    fn json_or_default_swallows_garbage() {
        let resp = ApiResponse::new(500, "<html>");
        let probe: Probe = resp.json_or_default();
        assert_eq!(probe.flag, None);
        assert!(resp.json::<Probe>().is_err());
    }

    #[test]
    fn success_range() {
        assert!(ApiResponse::new(204, "").is_success());
        assert!(!ApiResponse::new(429, "").is_success());
    }

    #[test]
    fn client_error_display() {
        let err = ClientError::Transport("connection refused".to_string());
        assert_eq!(err.to_string(), "connection refused");
        let err = ClientError::Request("bad url".to_string());
        assert_eq!(err.to_string(), "invalid request: bad url");
    }
}
