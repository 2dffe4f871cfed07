use std::future::Future;

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::domain::{PredictionRequest, PredictionResult};
use crate::config::PredictionConfig;

/// Outbound seam to the salary model so the form can be exercised without a network.
pub trait PredictionService: Send + Sync {
    fn predict(
        &self,
        request: PredictionRequest,
    ) -> impl Future<Output = Result<PredictionResult, PredictionError>> + Send;
}

/// Failure modes of a single prediction call.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PredictionError {
    #[error("prediction request failed: {0}")]
    Transport(String),
    #[error("prediction service returned status {status}")]
    Server { status: u16, detail: Option<String> },
    #[error("prediction response could not be read: {0}")]
    MalformedResponse(String),
}

impl PredictionError {
    /// Message shown in the form's error banner.
    pub fn user_message(&self) -> String {
        match self {
            PredictionError::Server {
                detail: Some(detail),
                ..
            } => detail.clone(),
            PredictionError::Server {
                status,
                detail: None,
            } => format!("request failed with status {status}"),
            other => other.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: String,
}

/// Extracts the `detail` string from an error body, if the body is JSON and has one.
pub fn parse_error_detail(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .map(|parsed| parsed.detail)
}

/// reqwest-backed client for `POST {base_url}/predict`.
#[derive(Debug, Clone)]
pub struct HttpPredictionClient {
    client: Client,
    endpoint: String,
    log_requests: bool,
}

impl HttpPredictionClient {
    pub fn new(config: &PredictionConfig) -> Result<Self, reqwest::Error> {
        // No timeout: a hung upstream keeps the form loading.
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/predict", config.base_url.trim_end_matches('/')),
            log_requests: config.log_requests,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl PredictionService for HttpPredictionClient {
    async fn predict(
        &self,
        request: PredictionRequest,
    ) -> Result<PredictionResult, PredictionError> {
        if self.log_requests {
            info!(endpoint = %self.endpoint, ?request, "sending prediction request");
        } else {
            debug!(endpoint = %self.endpoint, ?request, "sending prediction request");
        }

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|err| {
                warn!(error = %err, "prediction request did not complete");
                PredictionError::Transport(err.to_string())
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|err| err.to_string());

        if self.log_requests {
            info!(status = status.as_u16(), "prediction response received");
        } else {
            debug!(status = status.as_u16(), "prediction response received");
        }

        interpret_response(status, body)
    }
}

/// Maps a status and the (possibly unreadable) body to the call's result.
pub(crate) fn interpret_response(
    status: StatusCode,
    body: Result<String, String>,
) -> Result<PredictionResult, PredictionError> {
    if !status.is_success() {
        return Err(PredictionError::Server {
            status: status.as_u16(),
            detail: body.ok().as_deref().and_then(parse_error_detail),
        });
    }

    let body = body.map_err(PredictionError::Transport)?;
    serde_json::from_str::<PredictionResult>(&body)
        .map_err(|err| PredictionError::MalformedResponse(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EndpointSource;

    #[test]
    fn detail_is_surfaced_verbatim() {
        let err = PredictionError::Server {
            status: 503,
            detail: parse_error_detail(r#"{"detail":"model unavailable"}"#),
        };
        assert_eq!(err.user_message(), "model unavailable");
    }

    #[test]
    fn unparsable_error_body_falls_back_to_status() {
        assert_eq!(parse_error_detail("<html>Bad Gateway</html>"), None);
        assert_eq!(parse_error_detail(r#"{"detail":[{"loc":["body"]}]}"#), None);

        let err = PredictionError::Server {
            status: 502,
            detail: None,
        };
        assert_eq!(err.user_message(), "request failed with status 502");
    }

    #[test]
    fn unreadable_error_body_still_reports_status() {
        let err = interpret_response(
            StatusCode::BAD_GATEWAY,
            Err("connection reset by peer".to_string()),
        )
        .expect_err("non-2xx is an error");
        assert_eq!(
            err,
            PredictionError::Server {
                status: 502,
                detail: None,
            }
        );
        assert_eq!(err.user_message(), "request failed with status 502");
    }

    #[test]
    fn unreadable_success_body_is_a_transport_failure() {
        let err = interpret_response(StatusCode::OK, Err("connection reset by peer".to_string()))
            .expect_err("body never arrived");
        assert_eq!(
            err,
            PredictionError::Transport("connection reset by peer".to_string())
        );
    }

    #[test]
    fn endpoint_joins_base_url_without_double_slash() {
        let config = PredictionConfig {
            base_url: "http://localhost:8000/".to_string(),
            source: EndpointSource::Environment,
            log_requests: false,
        };
        let client = HttpPredictionClient::new(&config).expect("client builds");
        assert_eq!(client.endpoint(), "http://localhost:8000/predict");
    }
}
