use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use tracing::debug;

use super::{ApiResponse, ClientError, ClusterClient};
use crate::config::Session;

/// Client-wide timeout applied to every call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const TOKEN_HEADER: &str = "X-Vault-Token";
const NAMESPACE_HEADER: &str = "X-Vault-Namespace";

/// reqwest-backed [`ClusterClient`].
#[derive(Clone, Debug)]
pub struct HttpClusterClient {
    client: Client,
}

impl HttpClusterClient {
    pub fn new(skip_verify: bool) -> Result<Self, ClientError> {
        Self::with_timeout(skip_verify, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(skip_verify: bool, timeout: Duration) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(skip_verify)
            .build()
            .map_err(|e| ClientError::Request(e.to_string()))?;
        Ok(Self { client })
    }

    fn with_headers(builder: RequestBuilder, session: &Session) -> RequestBuilder {
        let mut builder = builder;
        if !session.token.is_empty() {
            builder = builder.header(TOKEN_HEADER, &session.token);
        }
        if !session.namespace.is_empty() {
            builder = builder.header(NAMESPACE_HEADER, &session.namespace);
        }
        builder
    }

    async fn send(&self, builder: RequestBuilder, path: &str) -> Result<ApiResponse, ClientError> {
        let response = builder.send().await.map_err(|e| ClientError::Transport(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?
            .to_vec();
        debug!(path, status, bytes = body.len(), "response received");
        Ok(ApiResponse { status, body })
    }
}

#[async_trait]
impl ClusterClient for HttpClusterClient {
    async fn get(&self, session: &Session, path: &str) -> Result<ApiResponse, ClientError> {
        let builder = Self::with_headers(self.client.get(session.url(path)), session);
        self.send(builder, path).await
    }

    async fn post(
        &self,
        session: &Session,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<ApiResponse, ClientError> {
        let builder = Self::with_headers(self.client.post(session.url(path)), session).json(body);
        self.send(builder, path).await
    }
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;

    use axum::{
        http::{HeaderMap, StatusCode},
        routing::{get, post},
        Json, Router,
    };

    use super::*;

    async fn echo_headers(headers: HeaderMap) -> (StatusCode, Json<serde_json::Value>) {
        let read = |name: &str| {
            headers.get(name).and_then(|v| v.to_str().ok()).unwrap_or_default().to_string()
        };
        (
            StatusCode::from_u16(473).unwrap(),
            Json(serde_json::json!({
                "token": read(TOKEN_HEADER),
                "namespace": read(NAMESPACE_HEADER),
            })),
        )
    }

    async fn echo_body(Json(body): Json<serde_json::Value>) -> Json<serde_json::Value> {
        Json(body)
    }

    /// Start a mock API on an OS-assigned port.
    async fn start_server() -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let app = Router::new()
                .route("/v1/sys/health", get(echo_headers))
                .route("/v1/sys/unseal", post(echo_body));
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    #[tokio::test]
    async fn get_sends_auth_headers_and_keeps_non_2xx_status() {
        let addr = start_server().await;
        let client = HttpClusterClient::new(false).unwrap();
        let session = Session {
            addr: format!("http://{addr}/"),
            token: "s.abc".to_string(),
            namespace: "team-a".to_string(),
        };

        let resp = client.get(&session, "/v1/sys/health").await.unwrap();

        assert_eq!(resp.status, 473);
        let body: serde_json::Value = resp.json().unwrap();
        assert_eq!(body["token"], "s.abc");
        assert_eq!(body["namespace"], "team-a");
    }

    #[tokio::test]
    async fn empty_token_and_namespace_are_not_sent() {
        let addr = start_server().await;
        let client = HttpClusterClient::new(false).unwrap();
        let session = Session { addr: format!("http://{addr}"), ..Default::default() };

        let body: serde_json::Value =
            client.get(&session, "/v1/sys/health").await.unwrap().json().unwrap();

        assert_eq!(body["token"], "");
        assert_eq!(body["namespace"], "");
    }

    #[tokio::test]
    async fn post_sends_json_body() {
        let addr = start_server().await;
        let client = HttpClusterClient::new(false).unwrap();
        let session = Session { addr: format!("http://{addr}"), ..Default::default() };

        let resp = client
            .post(&session, "/v1/sys/unseal", &serde_json::json!({"key": "k1"}))
            .await
            .unwrap();

        assert_eq!(resp.status, 200);
        assert_eq!(resp.json::<serde_json::Value>().unwrap()["key"], "k1");
    }

    #[tokio::test]
    async fn unreachable_address_is_a_transport_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = HttpClusterClient::with_timeout(false, Duration::from_millis(500)).unwrap();
        let session = Session { addr: format!("http://{addr}"), ..Default::default() };

        let err = client.get(&session, "/v1/sys/health").await.unwrap_err();
        assert!(matches!(err, ClientError::Transport(_)));
    }
}
