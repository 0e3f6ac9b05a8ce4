use crate::catalog::api_types::{decode, ApiSpecsResponse, ApiStatusResponse};
use crate::catalog::error::FetchError;
use crate::catalog::source::{SpecSource, StatusSource};
use crate::catalog::types::{Attributes, StatusEntry};
use crate::config::Config;
use color_eyre::{eyre::eyre, Result};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// HTTP client for the catalog's status and spec endpoints.
#[derive(Clone)]
pub struct CatalogClient {
  http: reqwest::Client,
  base: Url,
}

impl CatalogClient {
  pub fn new(config: &Config) -> Result<Self> {
    let url = config
      .catalog_url()
      .ok_or_else(|| eyre!("Catalog URL not configured. Set catalog.url or CATALOG_ENRICH_URL."))?;

    let mut base =
      Url::parse(url).map_err(|e| eyre!("Invalid catalog URL {}: {}", url, e))?;
    // Endpoint paths are joined relative to the base
    if !base.path().ends_with('/') {
      let path = format!("{}/", base.path());
      base.set_path(&path);
    }

    let http = reqwest::Client::builder()
      .timeout(Duration::from_millis(config.catalog.request_timeout_ms))
      .gzip(true)
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self { http, base })
  }

  /// Build `{base}/{endpoint}?{param}=a,b,c`.
  fn endpoint(&self, endpoint: &str, param: &str, keys: &[String]) -> Result<Url, FetchError> {
    let mut url = self
      .base
      .join(endpoint)
      .map_err(|e| FetchError::Transport(e.to_string()))?;
    url.query_pairs_mut().append_pair(param, &keys.join(","));
    Ok(url)
  }

  async fn get_body(&self, url: Url) -> Result<Vec<u8>, FetchError> {
    debug!(url = %url, "catalog request");
    let response = self.http.get(url).send().await?;

    let status = response.status();
    if !status.is_success() {
      return Err(FetchError::Status(status.as_u16()));
    }

    Ok(response.bytes().await?.to_vec())
  }

  /// Fetch supplemental specs for the given handles.
  pub async fn get_specs(&self, handles: &[String]) -> Result<HashMap<String, Attributes>, FetchError> {
    let url = self.endpoint("specs", "handles", handles)?;
    let body = self.get_body(url).await?;
    decode::<ApiSpecsResponse>(&body)?.into_specs()
  }

  /// Fetch current statuses for the given item ids.
  pub async fn get_statuses(
    &self,
    ids: &[String],
  ) -> Result<HashMap<String, StatusEntry>, FetchError> {
    let url = self.endpoint("status", "ids", ids)?;
    let body = self.get_body(url).await?;
    decode::<ApiStatusResponse>(&body)?.into_statuses()
  }
}

impl SpecSource for CatalogClient {
  fn fetch_specs<'a>(
    &'a self,
    handles: &'a [String],
  ) -> BoxFuture<'a, Result<HashMap<String, Attributes>, FetchError>> {
    self.get_specs(handles).boxed()
  }
}

impl StatusSource for CatalogClient {
  fn fetch_statuses<'a>(
    &'a self,
    ids: &'a [String],
  ) -> BoxFuture<'a, Result<HashMap<String, StatusEntry>, FetchError>> {
    self.get_statuses(ids).boxed()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;
  use wiremock::matchers::{method, path, query_param};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  fn client(url: &str) -> CatalogClient {
    let mut config = Config::default();
    config.catalog.url = Some(url.to_string());
    CatalogClient::new(&config).unwrap()
  }

  #[test]
  fn test_endpoint_joins_under_base_path() {
    let client = client("https://shop.example.com/api");
    let url = client
      .endpoint("specs", "handles", &["a".to_string(), "b".to_string()])
      .unwrap();
    assert_eq!(url.path(), "/api/specs");
    let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
    assert_eq!(pairs, vec![("handles".to_string(), "a,b".to_string())]);
  }

  #[test]
  fn test_missing_url_is_an_error() {
    let config = Config::default();
    assert!(CatalogClient::new(&config).is_err());
  }

  fn keys(raw: &[&str]) -> Vec<String> {
    raw.iter().map(|s| s.to_string()).collect()
  }

  #[tokio::test]
  async fn test_specs_request_sends_joined_handles() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/api/specs"))
      .and(query_param("handles", "a,b"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "ok": true,
        "specs": { "a": { "year": "2563", "fuel_type": "Diesel" } }
      })))
      .expect(1)
      .mount(&server)
      .await;

    let client = client(&format!("{}/api", server.uri()));
    let specs = client.fetch_specs(&keys(&["a", "b"])).await.unwrap();
    assert_eq!(specs.len(), 1);
    assert_eq!(specs["a"].text("year").as_deref(), Some("2563"));
  }

  #[tokio::test]
  async fn test_statuses_request_sends_joined_ids() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/status"))
      .and(query_param("ids", "1,2"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "ok": true,
        "statuses": { "1": { "status": "sold", "updatedAt": "2024-05-01T00:00:00Z" } }
      })))
      .expect(1)
      .mount(&server)
      .await;

    let client = client(&server.uri());
    let statuses = client.fetch_statuses(&keys(&["1", "2"])).await.unwrap();
    assert_eq!(statuses["1"].status, "sold");
    assert!(!statuses.contains_key("2"));
  }

  #[tokio::test]
  async fn test_error_status_is_classified() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/specs"))
      .respond_with(ResponseTemplate::new(503))
      .mount(&server)
      .await;

    let client = client(&server.uri());
    let err = client.get_specs(&keys(&["a"])).await.unwrap_err();
    assert!(matches!(err, FetchError::Status(503)));
  }

  #[tokio::test]
  async fn test_non_json_body_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/status"))
      .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
      .mount(&server)
      .await;

    let client = client(&server.uri());
    let err = client.get_statuses(&keys(&["1"])).await.unwrap_err();
    assert!(matches!(err, FetchError::Malformed(_)));
  }

  #[tokio::test]
  async fn test_not_ok_envelope_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/specs"))
      .respond_with(
        ResponseTemplate::new(200).set_body_json(json!({ "ok": false, "specs": {} })),
      )
      .mount(&server)
      .await;

    let client = client(&server.uri());
    let err = client.get_specs(&keys(&["a"])).await.unwrap_err();
    assert!(matches!(err, FetchError::Malformed(_)));
  }
}
