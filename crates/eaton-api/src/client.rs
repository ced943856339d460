// Device API HTTP client
//
// Wraps `reqwest::Client` with device URL construction and the bearer
// token lifecycle. One client serves one scrape; the token never outlives it.
// Login lives in `auth.rs`, collection traversal in `collection.rs`.

use std::sync::{PoisonError, RwLock};

use bytes::Bytes;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use crate::auth::{Credentials, preview};
use crate::error::Error;
use crate::transport::TransportConfig;
use crate::{DEFAULT_BASE_PATH, TOKEN_PATH};

/// Raw HTTP client for one PDU's REST API.
///
/// `fetch` returns undecoded bodies; callers pick the shape with
/// [`decode`] or the collection helpers.
pub struct DeviceClient {
    http: reqwest::Client,
    base_url: Url,
    token_url: Url,
    credentials: Credentials,
    /// Bearer token. Absent until the first fetch, cleared on 401.
    token: RwLock<Option<SecretString>>,
}

impl DeviceClient {
    /// Create a client from a `TransportConfig`.
    ///
    /// `base_url` is the device root (e.g. `https://10.0.0.5`); `base_path`
    /// is the REST root the token endpoint hangs off.
    pub fn new(
        base_url: Url,
        base_path: &str,
        credentials: Credentials,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Self::with_client(http, base_url, base_path, credentials)
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(
        http: reqwest::Client,
        base_url: Url,
        base_path: &str,
        credentials: Credentials,
    ) -> Result<Self, Error> {
        let base_path = base_path.trim_end_matches('/');
        let token_url = join(&base_url, &format!("{base_path}{TOKEN_PATH}"))?;
        Ok(Self {
            http,
            base_url,
            token_url,
            credentials,
            token: RwLock::new(None),
        })
    }

    /// Shorthand for [`with_client`](Self::with_client) using the default REST root.
    pub fn with_default_base_path(
        http: reqwest::Client,
        base_url: Url,
        credentials: Credentials,
    ) -> Result<Self, Error> {
        Self::with_client(http, base_url, DEFAULT_BASE_PATH, credentials)
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn token_url(&self) -> &Url {
        &self.token_url
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    // ── Token management ─────────────────────────────────────────────

    /// Whether a bearer token is currently held.
    pub fn has_token(&self) -> bool {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    pub(crate) fn set_token(&self, token: SecretString) {
        trace!("storing bearer token");
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = Some(token);
    }

    pub(crate) fn clear_token(&self) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    fn current_token(&self) -> Option<SecretString> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    // ── Requests ─────────────────────────────────────────────────────

    /// Authenticated GET of `{base_url}{path}`, returning the raw body.
    ///
    /// Logs in first if no token is held. A 401 triggers exactly one
    /// re-login and one retry; a second 401 is final. Any other non-200
    /// status is an [`Error::Status`].
    pub async fn fetch(&self, path: &str) -> Result<Bytes, Error> {
        let url = join(&self.base_url, path)?;

        if !self.has_token() {
            self.authenticate().await?;
        }

        let mut resp = self.send_get(&url).await?;

        if resp.status() == StatusCode::UNAUTHORIZED {
            debug!(path, "token rejected, re-authenticating");
            self.authenticate().await?;
            resp = self.send_get(&url).await?;
            if resp.status() == StatusCode::UNAUTHORIZED {
                self.clear_token();
                return Err(Error::Unauthorized { path: path.into() });
            }
        }

        let status = resp.status();
        if status != StatusCode::OK {
            let body = resp.text().await.unwrap_or_default();
            debug!(path, status = status.as_u16(), body = %preview(&body), "fetch failed");
            return Err(Error::Status {
                status: status.as_u16(),
                path: path.into(),
            });
        }

        let body = resp.bytes().await.map_err(Error::Transport)?;
        trace!(path, bytes = body.len(), "fetched");
        Ok(body)
    }

    /// Fetch `path` and decode it as `T`.
    pub async fn fetch_as<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let body = self.fetch(path).await?;
        decode(path, &body)
    }

    async fn send_get(&self, url: &Url) -> Result<reqwest::Response, Error> {
        debug!("GET {url}");

        let mut builder = self
            .http
            .get(url.clone())
            .header(reqwest::header::ACCEPT, "application/json");
        if let Some(token) = self.current_token() {
            builder = builder.bearer_auth(token.expose_secret());
        }

        builder.send().await.map_err(Error::Transport)
    }
}

/// Decode a fetched body, keeping a preview of it on failure.
pub fn decode<T: DeserializeOwned>(path: &str, body: &[u8]) -> Result<T, Error> {
    serde_json::from_slice(body).map_err(|e| {
        let text = String::from_utf8_lossy(body).into_owned();
        Error::Deserialization {
            path: path.into(),
            message: format!("{e} (body preview: {:?})", preview(&text)),
            body: text,
        }
    })
}

/// Resolve a device path against the device root. Paths from the device
/// are absolute; a missing leading slash is tolerated.
fn join(base_url: &Url, path: &str) -> Result<Url, Error> {
    let base = base_url.as_str().trim_end_matches('/');
    if path.starts_with('/') {
        Ok(Url::parse(&format!("{base}{path}"))?)
    } else {
        Ok(Url::parse(&format!("{base}/{path}"))?)
    }
}
