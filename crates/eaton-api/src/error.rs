use thiserror::Error;

/// Why a token request failed.
///
/// Every variant leaves the client without a token; the next fetch
/// starts a fresh login.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The token endpoint answered with something other than 200.
    #[error("token request rejected (HTTP {status})")]
    Rejected { status: u16 },

    /// 200, but the body was not a token response.
    #[error("malformed token response: {message}")]
    MalformedResponse { message: String },

    /// 200 with a token response whose `access_token` is empty.
    #[error("token response carried an empty access_token")]
    EmptyToken,

    /// The token request never got an HTTP response.
    #[error("token request failed: {0}")]
    Transport(#[source] reqwest::Error),
}

/// Top-level error type for the `eaton-api` crate.
///
/// Covers every way a device fetch can fail: authentication, transport,
/// unexpected HTTP status, and decoding of the returned document.
/// `eaton-core` treats all of them as a failed scrape.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Login failed before or during a fetch.
    #[error("authentication failed: {0}")]
    Auth(#[from] AuthError),

    /// The resource still answered 401 after a fresh token.
    #[error("unauthorized fetching {path} after re-authentication")]
    Unauthorized { path: String },

    // ── Transport ───────────────────────────────────────────────────
    /// Any non-200, non-401 response.
    #[error("device API call to {path} failed with HTTP status {status}")]
    Status { status: u16, path: String },

    /// HTTP transport error (connection refused, timeout, truncated body).
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The HTTP client could not be built.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("failed to decode {path}: {message}")]
    Deserialization {
        path: String,
        message: String,
        body: String,
    },
}

impl Error {
    /// Returns `true` if the failure came from the login flow or a
    /// persistent 401.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Auth(_) | Self::Unauthorized { .. })
    }

    /// Returns `true` if the device answered but the document did not
    /// have the expected shape.
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Deserialization { .. })
    }

    /// HTTP status reported by the device, if the failure carries one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Auth(AuthError::Rejected { status }) | Self::Status { status, .. } => {
                Some(*status)
            }
            Self::Unauthorized { .. } => Some(401),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder_error() -> reqwest::Error {
        reqwest::Client::new()
            .get("not a url")
            .build()
            .expect_err("relative URL must not build")
    }

    #[test]
    fn status_is_reported_per_variant() {
        assert_eq!(Error::Auth(AuthError::Rejected { status: 403 }).status(), Some(403));
        assert_eq!(Error::Auth(AuthError::EmptyToken).status(), None);
        assert_eq!(
            Error::Status {
                status: 503,
                path: "/rest/x".into()
            }
            .status(),
            Some(503)
        );
        assert_eq!(
            Error::Unauthorized {
                path: "/rest/x".into()
            }
            .status(),
            Some(401)
        );
        assert_eq!(Error::Transport(builder_error()).status(), None);
        assert_eq!(Error::Tls("no roots".into()).status(), None);
    }

    #[test]
    fn classification_helpers() {
        assert!(Error::Auth(AuthError::EmptyToken).is_auth_failure());
        assert!(Error::Unauthorized { path: "/x".into() }.is_auth_failure());
        assert!(!Error::Status { status: 404, path: "/x".into() }.is_auth_failure());
        assert!(
            Error::Deserialization {
                path: "/x".into(),
                message: "eof".into(),
                body: String::new(),
            }
            .is_decode()
        );
    }
}
