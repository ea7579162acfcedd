//! `HttpClient` backed by a short-lived `reqwest::Client` per call.

use std::collections::HashMap;

use async_trait::async_trait;
use saga_core::{HttpClient, HttpResponse, Result, SagaError};
use serde_json::Value;

/// Concrete HTTP transport for `api` steps and rollbacks.
///
/// A fresh [`reqwest::Client`] is built per request rather than held
/// across the execution's lifetime, matching the per-step `httpx.AsyncClient`
/// scope the original executor used.
#[derive(Debug, Default, Clone)]
pub struct ReqwestHttpClient;

impl ReqwestHttpClient {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn request(
        &self,
        method: &str,
        url: &str,
        headers: HashMap<String, String>,
        body: Option<Value>,
    ) -> Result<HttpResponse> {
        let client = reqwest::Client::new();
        let method = reqwest::Method::from_bytes(method.as_bytes())
            .map_err(|e| SagaError::StepTransport(format!("invalid HTTP method '{}': {}", method, e)))?;

        let mut builder = client.request(method, url);
        for (name, value) in &headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = &body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| SagaError::StepTransport(e.to_string()))?;

        let status = response.status().as_u16();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| SagaError::StepTransport(e.to_string()))?;

        let body = if bytes.is_empty() {
            Value::Object(Default::default())
        } else {
            serde_json::from_slice(&bytes)
                .map_err(|e| SagaError::StepTransport(format!("non-JSON response body: {}", e)))?
        };

        Ok(HttpResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn posts_json_body_and_decodes_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v"))
            .and(body_json(json!({"id": "O1"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .mount(&server)
            .await;

        let client = ReqwestHttpClient::new();
        let response = client
            .request(
                "POST",
                &format!("{}/v", server.uri()),
                HashMap::new(),
                Some(json!({"id": "O1"})),
            )
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.body, json!({"ok": true}));
    }

    #[tokio::test]
    async fn empty_body_decodes_as_empty_object() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/a/X"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let client = ReqwestHttpClient::new();
        let response = client
            .request("DELETE", &format!("{}/a/X", server.uri()), HashMap::new(), None)
            .await
            .unwrap();

        assert_eq!(response.status, 204);
        assert_eq!(response.body, json!({}));
    }

    #[tokio::test]
    async fn non_json_response_is_a_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/broken"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = ReqwestHttpClient::new();
        let err = client
            .request("GET", &format!("{}/broken", server.uri()), HashMap::new(), None)
            .await
            .unwrap_err();

        assert!(matches!(err, SagaError::StepTransport(_)));
    }
}
