//! AppRole credential exchange.

use serde::Deserialize;
use tracing::{debug, warn};

use crate::client::{ClientError, ClusterClient, APPROLE_LOGIN_PATH};
use crate::config::Session;

#[derive(Deserialize)]
struct LoginResponse {
    auth: Option<LoginAuth>,
}

#[derive(Deserialize)]
struct LoginAuth {
    #[serde(default)]
    client_token: String,
}

/// Errors from the AppRole login call. All of them are terminal for a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginError {
    /// The request never got a response
    Transport(ClientError),
    /// Non-2xx response
    Http(u16),
    /// Body could not be decoded
    Decode(String),
    /// Decoded, but no client token in `auth.client_token`
    MissingToken,
}

impl std::fmt::Display for LoginError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(e) => write!(f, "{}", e),
            Self::Http(status) => write!(f, "approle login failed: HTTP {}", status),
            Self::Decode(e) => write!(f, "approle login response invalid: {}", e),
            Self::MissingToken => write!(f, "approle login response missing client_token"),
        }
    }
}

impl std::error::Error for LoginError {}

/// Exchange a role id and secret id for a client token.
pub async fn approle_login<C: ClusterClient + ?Sized>(
    client: &C,
    session: &Session,
    role_id: &str,
    secret_id: &str,
) -> Result<String, LoginError> {
    let body = serde_json::json!({ "role_id": role_id, "secret_id": secret_id });
    let response = client
        .post(session, APPROLE_LOGIN_PATH, &body)
        .await
        .map_err(LoginError::Transport)?;

    if !response.is_success() {
        warn!(status = response.status, "approle login rejected");
        return Err(LoginError::Http(response.status));
    }

    let decoded: LoginResponse =
        response.json().map_err(|e| LoginError::Decode(e.to_string()))?;
    match decoded.auth {
        Some(auth) if !auth.client_token.is_empty() => {
            debug!("approle login succeeded");
            Ok(auth.client_token)
        }
        _ => Err(LoginError::MissingToken),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::client::testutil::ScriptedClient;

    async fn login(client: &ScriptedClient) -> Result<String, LoginError> {
        approle_login(client, &Session::default(), "role", "secret").await
    }

    #[tokio::test(flavor = "current_thread")]
    async fn returns_client_token_and_sends_credentials() {
        let client = ScriptedClient::new().on_post(
            APPROLE_LOGIN_PATH,
            200,
            json!({"auth": {"client_token": "s.fresh"}}),
        );

        assert_eq!(login(&client).await.unwrap(), "s.fresh");
        assert_eq!(
            client.bodies(&format!("POST {APPROLE_LOGIN_PATH}")),
            vec![json!({"role_id": "role", "secret_id": "secret"})]
        );
    }

    #[tokio::test(flavor = "current_thread")]
    async fn non_2xx_is_rejected() {
        let client = ScriptedClient::new().on_post(APPROLE_LOGIN_PATH, 400, json!({"errors": []}));
        let err = login(&client).await.unwrap_err();
        assert_eq!(err, LoginError::Http(400));
        assert_eq!(err.to_string(), "approle login failed: HTTP 400");
    }

    #[tokio::test(flavor = "current_thread")]
    async fn missing_token_is_rejected() {
        let client = ScriptedClient::new().on_post(APPROLE_LOGIN_PATH, 200, json!({"auth": null}));
        assert_eq!(login(&client).await.unwrap_err(), LoginError::MissingToken);

        let client = ScriptedClient::new().on_post(
            APPROLE_LOGIN_PATH,
            200,
            json!({"auth": {"client_token": ""}}),
        );
        assert_eq!(login(&client).await.unwrap_err(), LoginError::MissingToken);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn undecodable_body_surfaces() {
        let client = ScriptedClient::new().on_post_raw(APPROLE_LOGIN_PATH, 200, "not json");
        assert!(matches!(login(&client).await.unwrap_err(), LoginError::Decode(_)));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn transport_error_surfaces() {
        let client = ScriptedClient::new().on_post_err(APPROLE_LOGIN_PATH, "tls handshake eof");
        let err = login(&client).await.unwrap_err();
        assert_eq!(err.to_string(), "tls handshake eof");
    }
}
