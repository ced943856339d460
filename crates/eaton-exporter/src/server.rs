// HTTP surface
//
// `/` landing page, `/eaton` scrape endpoint, `/metrics` self-metrics.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Query, State};
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tracing::{debug, error};

use eaton_core::{ScrapeError, ScrapeParams, Scraper};

use crate::telemetry::Telemetry;

/// Prometheus text exposition format, version 0.0.4.
pub const EXPOSITION_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

const LANDING_PAGE: &str = r#"<html>
<head><title>Eaton PDU Exporter</title></head>
<body>
<h1>Eaton PDU Exporter</h1>
<form action="/eaton">
<label>Target:</label> <input type="text" name="target" placeholder="pdu1">
<label>Modules:</label> <input type="text" name="module" placeholder="input,branch">
<input type="submit" value="Submit">
</form>
<p><a href="/metrics">Exporter metrics</a></p>
</body>
</html>
"#;

#[derive(Clone)]
pub struct AppState {
    pub scraper: Scraper,
    pub telemetry: Arc<Telemetry>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(landing))
        .route("/eaton", get(scrape))
        .route("/metrics", get(self_metrics))
        .with_state(state)
}

async fn landing() -> Html<&'static str> {
    Html(LANDING_PAGE)
}

async fn scrape(State(state): State<AppState>, Query(params): Query<ScrapeParams>) -> Response {
    let started = Instant::now();
    let result = state.scraper.scrape(&params).await;
    state.telemetry.observe(&result, started.elapsed());

    match result {
        Ok(body) => exposition(body),
        Err(err) => {
            error!(
                target_name = params.target.as_deref().unwrap_or_default(),
                module = params.module.as_deref().unwrap_or_default(),
                error = %err,
                "scrape failed"
            );
            scrape_error(&err)
        }
    }
}

async fn self_metrics(State(state): State<AppState>) -> Response {
    match state.telemetry.render() {
        Ok(body) => exposition(body),
        Err(err) => {
            error!(error = %err, "failed to render self-metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

fn exposition(body: String) -> Response {
    ([(header::CONTENT_TYPE, EXPOSITION_CONTENT_TYPE)], body).into_response()
}

fn scrape_error(err: &ScrapeError) -> Response {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    debug!(status = status.as_u16(), "answering scrape with error");
    (status, err.public_message()).into_response()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeMap;

    use axum::body::to_bytes;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use eaton_config::{Config, ConfigStore, Connection};

    use super::*;

    fn state_with(config: Config) -> AppState {
        AppState {
            scraper: Scraper::new(Arc::new(ConfigStore::from_config(config))),
            telemetry: Arc::new(Telemetry::new().unwrap()),
        }
    }

    async fn body_of(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn get_scrape(state: &AppState, target: Option<&str>, module: Option<&str>) -> Response {
        let params = ScrapeParams {
            target: target.map(str::to_owned),
            module: module.map(str::to_owned),
        };
        scrape(State(state.clone()), Query(params)).await
    }

    #[tokio::test]
    async fn landing_page_links_endpoints() {
        let Html(page) = landing().await;
        assert!(page.contains(r#"action="/eaton""#));
        assert!(page.contains(r#"href="/metrics""#));
    }

    #[tokio::test]
    async fn request_errors_are_400_with_message() {
        let state = state_with(Config::default());

        let response = get_scrape(&state, None, None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_of(response).await, "Target parameter is missing");

        let response = get_scrape(&state, Some("pdu1"), Some("outlet")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_of(response).await, r#"Unknown module "outlet""#);

        let response = get_scrape(&state, Some("pdu1"), None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_of(response).await, r#"Failed to connect to target "pdu1""#);

        let metrics = body_of(self_metrics(State(state)).await).await;
        assert!(
            metrics.contains(r#"eaton_exporter_scrapes_total{result="client_error"} 3"#),
            "{metrics}"
        );
    }

    #[tokio::test]
    async fn device_failure_is_500() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let state = state_with(config_for(&server));
        let response = get_scrape(&state, Some("pdu1"), Some("input")).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_of(response).await, "Failed to fetch eaton endpoint");
    }

    #[tokio::test]
    async fn successful_scrape_is_exposition() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/mbdetnrs/2.0/oauth2/token"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "token_type": "bearer", "access_token": "t" })),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/mbdetnrs/2.0/powerDistributions/1/inputs/1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "measures": { "activePower": 450.2 },
                "status": { "operating": "on", "health": "ok" }
            })))
            .mount(&server)
            .await;

        let state = state_with(config_for(&server));
        let response = get_scrape(&state, Some("pdu1"), None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE].to_str().unwrap(),
            EXPOSITION_CONTENT_TYPE
        );
        let body = body_of(response).await;
        assert!(body.contains("eaton_pdu_active_power 450.2"), "{body}");
        assert!(body.contains(r#"eaton_pdu_input_status{operating="on"} 1"#), "{body}");
    }

    fn config_for(server: &MockServer) -> Config {
        Config {
            sections: BTreeMap::from([(
                "connection:pdu1".to_string(),
                Connection {
                    host: Some(server.address().to_string()),
                    username: Some("admin".into()),
                    password: Some("secret".into()),
                    scheme: Some("http".into()),
                },
            )]),
            ..Config::default()
        }
    }
}
