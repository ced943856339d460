// Device API authentication
//
// OAuth2 password grant against `{base_path}/oauth2/token`. The bearer
// token is acquired lazily by the first fetch and replaced only after the
// device rejects it with a 401.

use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use tracing::debug;

use crate::client::DeviceClient;
use crate::error::AuthError;
use crate::models::OAuthToken;

/// Login credentials for one PDU.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<SecretString>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl DeviceClient {
    /// Request a new bearer token.
    ///
    /// `POST {base_path}/oauth2/token` with
    /// `{"username", "password", "grant_type": "password", "scope": "GUIAccess"}`.
    ///
    /// Any held token is dropped first, so on failure the client ends up
    /// with no token at all.
    pub async fn authenticate(&self) -> Result<(), AuthError> {
        self.clear_token();

        let url = self.token_url().clone();
        debug!("requesting token at {url}");

        let body = json!({
            "username": self.credentials().username,
            "password": self.credentials().password.expose_secret(),
            "grant_type": "password",
            "scope": "GUIAccess",
        });

        let resp = self
            .http()
            .post(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&body)
            .send()
            .await
            .map_err(AuthError::Transport)?;

        let status = resp.status();
        if status != reqwest::StatusCode::OK {
            let body = resp.text().await.unwrap_or_default();
            debug!(status = status.as_u16(), body = %preview(&body), "token request rejected");
            return Err(AuthError::Rejected {
                status: status.as_u16(),
            });
        }

        let raw = resp.bytes().await.map_err(AuthError::Transport)?;
        let token: OAuthToken =
            serde_json::from_slice(&raw).map_err(|e| AuthError::MalformedResponse {
                message: e.to_string(),
            })?;

        if token.access_token.is_empty() {
            return Err(AuthError::EmptyToken);
        }

        debug!(token_type = %token.token_type, "token acquired");
        self.set_token(SecretString::from(token.access_token));
        Ok(())
    }
}

/// First 200 bytes of a response body, for log lines.
pub(crate) fn preview(body: &str) -> &str {
    let mut end = body.len().min(200);
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}
