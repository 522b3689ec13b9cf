//! Companion app prediction route.
//!
//! `POST` forwards a drug pair to the prediction backend and relays its answer;
//! `GET` describes the endpoint.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, error};
use url::Url;

use crate::config::{AppConfig, ConfigResult};
use crate::interactions::find_known_interactions;

/// Prediction backend errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("Backend unreachable: {0}")]
    Transport(String),
}

/// Body of a prediction request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictRequest {
    #[serde(default)]
    pub drug1_name: Option<String>,
    #[serde(default)]
    pub drug2_name: Option<String>,
}

impl PredictRequest {
    pub fn new(drug1: &str, drug2: &str) -> Self {
        Self {
            drug1_name: Some(drug1.to_owned()),
            drug2_name: Some(drug2.to_owned()),
        }
    }

    fn names(&self) -> Option<(&str, &str)> {
        let a = self.drug1_name.as_deref().filter(|s| !s.is_empty())?;
        let b = self.drug2_name.as_deref().filter(|s| !s.is_empty())?;
        Some((a, b))
    }
}

/// Raw HTTP reply from the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendReply {
    pub status: u16,
    pub status_text: String,
    pub body: String,
}

impl BackendReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// External prediction service reached at `endpoint`.
#[allow(async_fn_in_trait)]
pub trait PredictionBackend {
    async fn predict(
        &self,
        endpoint: &Url,
        request: &PredictRequest,
    ) -> Result<BackendReply, BackendError>;
}

impl<B: PredictionBackend> PredictionBackend for &B {
    async fn predict(
        &self,
        endpoint: &Url,
        request: &PredictRequest,
    ) -> Result<BackendReply, BackendError> {
        (**self).predict(endpoint, request).await
    }
}

/// Status and JSON body returned to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    fn json(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    fn internal_error(details: impl std::fmt::Display) -> Self {
        Self::json(
            500,
            json!({"error": "Internal Server Error", "details": details.to_string()}),
        )
    }
}

/// The `/api/predict` route bound to a backend endpoint.
pub struct PredictionRoute<B> {
    endpoint: Url,
    backend: B,
}

impl<B: PredictionBackend> PredictionRoute<B> {
    pub fn new(endpoint: Url, backend: B) -> Self {
        Self { endpoint, backend }
    }

    pub fn from_config(config: &AppConfig, backend: B) -> ConfigResult<Self> {
        Ok(Self::new(config.prediction_endpoint()?, backend))
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Handle a `POST` with a raw JSON body.
    pub async fn handle(&self, raw_body: &str) -> ApiResponse {
        let request: PredictRequest = match serde_json::from_str(raw_body) {
            Ok(request) => request,
            Err(e) => {
                error!(error = %e, "Could not parse prediction request");
                return ApiResponse::internal_error(e);
            }
        };

        let Some((drug1, drug2)) = request.names() else {
            return ApiResponse::json(400, json!({"error": "Both drug names are required"}));
        };
        debug!(drug1, drug2, endpoint = %self.endpoint, "Forwarding prediction request");

        let reply = match self.backend.predict(&self.endpoint, &request).await {
            Ok(reply) => reply,
            Err(e) => {
                error!(error = %e, "Prediction backend failed");
                return ApiResponse::internal_error(e);
            }
        };

        let body: Value = match serde_json::from_str(&reply.body) {
            Ok(body) => body,
            Err(e) => {
                error!(status = reply.status, error = %e, "Unreadable backend reply");
                return ApiResponse::internal_error(e);
            }
        };

        if reply.is_success() {
            return ApiResponse::json(200, body);
        }

        let message = body
            .get("error")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
            .unwrap_or_else(|| format!("Python API error: {}", reply.status_text));
        ApiResponse::json(reply.status, json!({"error": message}))
    }
}

/// Body of a `GET`.
pub fn api_description() -> Value {
    json!({
        "message": "Drug Interaction Prediction API",
        "version": "1.0.0",
        "endpoints": {
            "predict": {
                "method": "POST",
                "description": "Predict drug interactions",
                "parameters": {
                    "drug1": "string - First drug name",
                    "drug2": "string - Second drug name"
                }
            }
        }
    })
}

/// Answers from the built-in known-interaction table.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReferenceBackend;

impl PredictionBackend for ReferenceBackend {
    async fn predict(
        &self,
        _endpoint: &Url,
        request: &PredictRequest,
    ) -> Result<BackendReply, BackendError> {
        let (drug1, drug2) = request.names().unwrap_or_default();
        let found = find_known_interactions(drug1, drug2);
        let body = json!({
            "drug1": drug1,
            "drug2": drug2,
            "interactions": found,
        });
        Ok(BackendReply {
            status: 200,
            status_text: "OK".to_string(),
            body: body.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use std::cell::RefCell;

    struct Canned {
        reply: Result<BackendReply, BackendError>,
        endpoints: RefCell<Vec<String>>,
    }

    impl Canned {
        fn new(reply: Result<BackendReply, BackendError>) -> Self {
            Self {
                reply,
                endpoints: RefCell::new(Vec::new()),
            }
        }
    }

    impl PredictionBackend for Canned {
        async fn predict(
            &self,
            endpoint: &Url,
            _request: &PredictRequest,
        ) -> Result<BackendReply, BackendError> {
            self.endpoints.borrow_mut().push(endpoint.to_string());
            self.reply.clone()
        }
    }

    fn reply(status: u16, status_text: &str, body: &str) -> Canned {
        Canned::new(Ok(BackendReply {
            status,
            status_text: status_text.to_string(),
            body: body.to_string(),
        }))
    }

    fn route<B: PredictionBackend>(backend: B) -> PredictionRoute<B> {
        PredictionRoute::from_config(&AppConfig::default(), backend).unwrap()
    }

    const PAIR: &str = r#"{"drug1_name":"warfarin","drug2_name":"aspirin"}"#;

    #[test]
    fn test_missing_name_is_bad_request() {
        let backend = reply(200, "OK", "{}");
        for body in [r#"{"drug1_name":"warfarin"}"#, r#"{"drug1_name":"","drug2_name":"x"}"#, "{}"] {
            let response = block_on(route(&backend).handle(body));
            assert_eq!(response.status, 400);
            assert_eq!(response.body, json!({"error": "Both drug names are required"}));
        }
    }

    #[test]
    fn test_configured_endpoint_reaches_backend() {
        let mut config = AppConfig::default();
        config.prediction_url = "http://predict.internal:9000/v2/predict".into();
        let backend = reply(200, "OK", "{}");

        let route = PredictionRoute::from_config(&config, &backend).unwrap();
        block_on(route.handle(PAIR));

        assert_eq!(*backend.endpoints.borrow(), vec!["http://predict.internal:9000/v2/predict"]);
    }

    #[test]
    fn test_missing_names_never_reach_backend() {
        let backend = reply(200, "OK", "{}");
        block_on(route(&backend).handle("{}"));
        assert!(backend.endpoints.borrow().is_empty());
    }

    #[test]
    fn test_invalid_endpoint_is_config_error() {
        let mut config = AppConfig::default();
        config.prediction_url = "not a url".into();
        assert!(PredictionRoute::from_config(&config, ReferenceBackend).is_err());
    }

    #[test]
    fn test_success_is_relayed() {
        let backend = reply(200, "OK", r#"{"final_verdict":"moderate"}"#);
        let response = block_on(route(&backend).handle(PAIR));
        assert_eq!(response.status, 200);
        assert_eq!(response.body, json!({"final_verdict": "moderate"}));
    }

    #[test]
    fn test_backend_error_field_forwarded() {
        let backend = reply(422, "Unprocessable Entity", r#"{"error":"Unknown drug: foobarin"}"#);
        let response = block_on(route(&backend).handle(PAIR));
        assert_eq!(response.status, 422);
        assert_eq!(response.body, json!({"error": "Unknown drug: foobarin"}));
    }

    #[test]
    fn test_backend_error_without_field_uses_status_text() {
        let backend = reply(503, "Service Unavailable", r#"{"detail":"down"}"#);
        let response = block_on(route(&backend).handle(PAIR));
        assert_eq!(response.status, 503);
        assert_eq!(response.body, json!({"error": "Python API error: Service Unavailable"}));
    }

    #[test]
    fn test_transport_failure_is_internal_error() {
        let backend = Canned::new(Err(BackendError::Transport("connection refused".into())));
        let response = block_on(route(&backend).handle(PAIR));
        assert_eq!(response.status, 500);
        assert_eq!(response.body["error"], "Internal Server Error");
        assert_eq!(response.body["details"], "Backend unreachable: connection refused");
    }

    #[test]
    fn test_unparseable_bodies_are_internal_errors() {
        let backend = reply(502, "Bad Gateway", "<html>oops</html>");
        assert_eq!(block_on(route(&backend).handle(PAIR)).status, 500);
        assert_eq!(block_on(route(&backend).handle("not json")).status, 500);
    }

    #[test]
    fn test_api_description() {
        let description = api_description();
        assert_eq!(description["version"], "1.0.0");
        assert_eq!(description["endpoints"]["predict"]["method"], "POST");
    }

    #[test]
    fn test_reference_backend() {
        let response = block_on(route(ReferenceBackend).handle(PAIR));
        assert_eq!(response.status, 200);
        let interactions = response.body["interactions"].as_array().unwrap();
        assert_eq!(interactions.len(), 1);
        assert_eq!(interactions[0]["severity"], "High");
        assert_eq!(interactions[0]["id"], "known-0");
    }
}
