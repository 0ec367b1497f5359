//! The remote read/write contract and its HTTP implementation.
//!
//! A [`Transport`] exposes `get`/`post`/`put`/`delete` against a resource
//! path and returns the `data` field of the response envelope. Failures
//! arrive as [`Error`] values with the kind already assigned, so nothing
//! downstream inspects message text. The trait is object-safe via boxed
//! futures; tests and local development inject the in-memory implementation
//! from [`super::mock`].

use futures::future::BoxFuture;
use reqwest::Method;
use serde_json::Value;
use std::collections::HashMap;
use url::Url;

use crate::config::ApiConfig;
use crate::error::{Error, Result};

use super::api_types::{ApiEnvelope, ApiErrorBody};

/// Remote read/write contract for the admin REST API.
pub trait Transport: Send + Sync {
  fn get(&self, path: &str) -> BoxFuture<'_, Result<Value>>;
  fn post(&self, path: &str, body: Value) -> BoxFuture<'_, Result<Value>>;
  fn put(&self, path: &str, body: Value) -> BoxFuture<'_, Result<Value>>;
  fn delete(&self, path: &str) -> BoxFuture<'_, Result<Value>>;
}

/// HTTP transport over reqwest.
pub struct HttpTransport {
  client: reqwest::Client,
  base: Url,
  token: Option<String>,
}

impl HttpTransport {
  pub fn new(config: &ApiConfig, token: Option<String>) -> Result<Self> {
    // Url::join replaces the last segment unless the base ends with '/'
    let mut base_url = config.base_url.clone();
    if !base_url.ends_with('/') {
      base_url.push('/');
    }
    let base = Url::parse(&base_url)
      .map_err(|e| Error::Config(format!("invalid api base url {}: {}", config.base_url, e)))?;

    let client = reqwest::Client::builder()
      .timeout(std::time::Duration::from_secs(config.timeout_secs))
      .build()
      .map_err(|e| Error::Config(format!("failed to build http client: {}", e)))?;

    Ok(Self {
      client,
      base,
      token,
    })
  }

  async fn request(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value> {
    let url = self
      .base
      .join(path.trim_start_matches('/'))
      .map_err(|e| Error::Config(format!("invalid request path {}: {}", path, e)))?;

    let mut request = self.client.request(method, url);
    if let Some(token) = &self.token {
      request = request.bearer_auth(token);
    }
    if let Some(body) = body {
      request = request.json(&body);
    }

    let response = request.send().await?;
    let status = response.status();

    if !status.is_success() {
      let text = response.text().await.unwrap_or_default();
      return Err(error_from_response(status.as_u16(), &text));
    }

    let envelope: ApiEnvelope = response.json().await?;
    Ok(envelope.data)
  }
}

/// Translate a failed response into an error with its kind assigned.
fn error_from_response(status: u16, body: &str) -> Error {
  let canonical = || {
    reqwest::StatusCode::from_u16(status)
      .ok()
      .and_then(|s| s.canonical_reason())
      .unwrap_or("request failed")
      .to_string()
  };

  match serde_json::from_str::<ApiErrorBody>(body) {
    Ok(parsed) => {
      let message = if parsed.message.is_empty() {
        canonical()
      } else {
        parsed.message
      };
      Error::from_status(status, message, parsed.errors.unwrap_or_default())
    }
    Err(_) => {
      let message = if body.trim().is_empty() {
        canonical()
      } else {
        body.trim().to_string()
      };
      Error::from_status(status, message, HashMap::new())
    }
  }
}

impl Transport for HttpTransport {
  fn get(&self, path: &str) -> BoxFuture<'_, Result<Value>> {
    let path = path.to_string();
    Box::pin(async move { self.request(Method::GET, &path, None).await })
  }

  fn post(&self, path: &str, body: Value) -> BoxFuture<'_, Result<Value>> {
    let path = path.to_string();
    Box::pin(async move { self.request(Method::POST, &path, Some(body)).await })
  }

  fn put(&self, path: &str, body: Value) -> BoxFuture<'_, Result<Value>> {
    let path = path.to_string();
    Box::pin(async move { self.request(Method::PUT, &path, Some(body)).await })
  }

  fn delete(&self, path: &str) -> BoxFuture<'_, Result<Value>> {
    let path = path.to_string();
    Box::pin(async move { self.request(Method::DELETE, &path, None).await })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::error::ErrorKind;
  use serde_json::json;
  use wiremock::matchers::{header, method, path};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  fn transport(server: &MockServer, token: Option<&str>) -> HttpTransport {
    HttpTransport::new(
      &ApiConfig {
        base_url: server.uri(),
        timeout_secs: 5,
      },
      token.map(String::from),
    )
    .expect("transport")
  }

  #[tokio::test]
  async fn test_get_unwraps_data_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/profile"))
      .respond_with(
        ResponseTemplate::new(200).set_body_json(json!({ "data": { "id": "adm-1" } })),
      )
      .mount(&server)
      .await;

    let value = transport(&server, None).get("profile").await.unwrap();
    assert_eq!(value, json!({ "id": "adm-1" }));
  }

  #[tokio::test]
  async fn test_bearer_token_is_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/profile"))
      .and(header("authorization", "Bearer sesame"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": null })))
      .mount(&server)
      .await;

    let value = transport(&server, Some("sesame")).get("profile").await.unwrap();
    assert_eq!(value, Value::Null);
  }

  #[tokio::test]
  async fn test_401_maps_to_authorization() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/profile"))
      .respond_with(
        ResponseTemplate::new(401).set_body_json(json!({ "message": "token expired" })),
      )
      .mount(&server)
      .await;

    let err = transport(&server, None).get("profile").await.unwrap_err();
    assert_eq!(
      err,
      Error::Authorization {
        message: "token expired".to_string()
      }
    );
    assert_eq!(
      err.user_message(),
      "Your session has expired. Please sign in again."
    );
  }

  #[tokio::test]
  async fn test_404_with_empty_body_uses_canonical_reason() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/orders/o-404"))
      .respond_with(ResponseTemplate::new(404))
      .mount(&server)
      .await;

    let err = transport(&server, None).get("orders/o-404").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
  }

  #[tokio::test]
  async fn test_422_carries_field_errors() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
      .and(path("/profile"))
      .respond_with(ResponseTemplate::new(422).set_body_json(json!({
        "message": "invalid input",
        "errors": { "name": ["must not be empty"] }
      })))
      .mount(&server)
      .await;

    let err = transport(&server, None)
      .put("profile", json!({ "name": "" }))
      .await
      .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Validation);
    let fields = err.validation_fields().expect("fields");
    assert_eq!(fields["name"], vec!["must not be empty".to_string()]);
  }

  #[tokio::test]
  async fn test_500_plain_text_body_maps_to_server() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/orders"))
      .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
      .mount(&server)
      .await;

    let err = transport(&server, None).get("orders").await.unwrap_err();
    assert_eq!(
      err,
      Error::Server {
        status: 500,
        message: "boom".to_string()
      }
    );
  }

  #[tokio::test]
  async fn test_connection_failure_maps_to_network() {
    // Nothing listens on this port
    let transport = HttpTransport::new(
      &ApiConfig {
        base_url: "http://127.0.0.1:1/api".to_string(),
        timeout_secs: 1,
      },
      None,
    )
    .unwrap();

    let err = transport.get("profile").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Network);
  }

  #[tokio::test]
  async fn test_base_url_join_preserves_path_prefix() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/api/v1/categories"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
      .mount(&server)
      .await;

    let transport = HttpTransport::new(
      &ApiConfig {
        base_url: format!("{}/api/v1", server.uri()),
        timeout_secs: 5,
      },
      None,
    )
    .unwrap();

    let value = transport.get("categories").await.unwrap();
    assert_eq!(value, json!([]));
  }
}
