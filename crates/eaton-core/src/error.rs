// ── Scrape error types ──
//
// Everything that can end a scrape early. Request problems (bad target,
// bad module) are the scraper's fault and map to 400; anything that goes
// wrong talking to the device maps to 500.

use thiserror::Error;

use eaton_config::ConfigError;

#[derive(Debug, Error)]
pub enum ScrapeError {
    // ── Request errors ───────────────────────────────────────────────
    #[error("target parameter is missing")]
    MissingTarget,

    #[error("unknown module {module:?}")]
    UnknownModule { module: String },

    #[error("failed to resolve target {target:?}: {source}")]
    Target {
        target: String,
        #[source]
        source: ConfigError,
    },

    // ── Device errors ────────────────────────────────────────────────
    #[error("failed to fetch eaton endpoint: {0}")]
    Api(#[from] eaton_api::Error),

    #[error("metric registry error: {0}")]
    Metrics(#[from] prometheus::Error),
}

impl ScrapeError {
    /// HTTP status the scrape endpoint answers with.
    pub fn status_code(&self) -> u16 {
        if self.is_client_error() { 400 } else { 500 }
    }

    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::MissingTarget | Self::UnknownModule { .. } | Self::Target { .. }
        )
    }

    /// Message sent back to the scraper. Device-side details stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            Self::MissingTarget => "Target parameter is missing".into(),
            Self::UnknownModule { module } => format!("Unknown module {module:?}"),
            Self::Target { target, .. } => format!("Failed to connect to target {target:?}"),
            Self::Api(_) | Self::Metrics(_) => "Failed to fetch eaton endpoint".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_errors_are_400() {
        assert_eq!(ScrapeError::MissingTarget.status_code(), 400);
        assert_eq!(
            ScrapeError::UnknownModule {
                module: "outlet".into()
            }
            .status_code(),
            400
        );
        assert_eq!(
            ScrapeError::Target {
                target: "pdu9".into(),
                source: ConfigError::TargetNotFound {
                    target: "pdu9".into()
                },
            }
            .status_code(),
            400
        );
    }

    #[test]
    fn device_errors_are_500() {
        let err = ScrapeError::from(eaton_api::Error::Status {
            status: 503,
            path: "/rest/mbdetnrs/2.0/powerDistributions/1".into(),
        });
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.public_message(), "Failed to fetch eaton endpoint");
    }

    #[test]
    fn unknown_module_message_names_the_module() {
        let err = ScrapeError::UnknownModule {
            module: "outlet".into(),
        };
        assert_eq!(err.public_message(), r#"Unknown module "outlet""#);
    }
}
