use std::time::Duration;

use reqwest::blocking::{Client, Response};
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};
use url::Url;

use super::endpoints::Endpoints;
use super::error::{ApiError, Result};
use crate::config::Config;
use crate::data::export::ExportPlan;
use crate::data::loader;
use crate::data::model::{ColumnMetadata, DatasetId, DatasetSummary, Row, SearchHit};

/// User agent string for API requests.
const USER_AGENT_VALUE: &str = concat!("datadock/", env!("CARGO_PKG_VERSION"));

/// Blocking client for the public DataDock endpoints.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct DataDockClient {
    http: Client,
    endpoints: Endpoints,
}

impl DataDockClient {
    pub fn new(config: &Config) -> Result<Self> {
        let endpoints = Endpoints::new(&config.api_url)
            .map_err(|e| ApiError::Network(format!("invalid API URL '{}': {e}", config.api_url)))?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));

        let http = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| ApiError::Network(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { http, endpoints })
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Lists the datasets published on the public catalogue.
    pub fn list_datasets(&self) -> Result<Vec<DatasetSummary>> {
        let body = self.get_text(self.endpoints.datasets().map_err(invalid_url)?)?;
        Ok(loader::decode_datasets(&body)?)
    }

    /// Fetches column metadata for a dataset.
    pub fn fetch_metadata(&self, id: DatasetId) -> Result<Vec<ColumnMetadata>> {
        let body = self.get_text(self.endpoints.metadata(id).map_err(invalid_url)?)?;
        Ok(loader::decode_metadata(&body)?)
    }

    /// Fetches the preview rows of a dataset.
    pub fn fetch_rows(&self, id: DatasetId) -> Result<Vec<Row>> {
        let body = self.get_text(self.endpoints.data(id).map_err(invalid_url)?)?;
        Ok(loader::decode_rows(&body)?)
    }

    /// Searches every public dataset for `query`.
    pub fn search(&self, query: &str) -> Result<Vec<SearchHit>> {
        let body = self.get_text(self.endpoints.search(query).map_err(invalid_url)?)?;
        Ok(loader::decode_search(&body)?)
    }

    /// Downloads an export and returns the file contents.
    pub fn download(&self, plan: &ExportPlan) -> Result<Vec<u8>> {
        log::info!(
            "Downloading {} ({} columns) from {}",
            plan.suggested_filename,
            plan.request.columns.len(),
            plan.url
        );
        let response = self.send(plan.url.clone())?;
        let bytes = response.bytes()?;
        log::info!("Downloaded {} bytes for {}", bytes.len(), plan.suggested_filename);
        Ok(bytes.to_vec())
    }

    fn get_text(&self, url: Url) -> Result<String> {
        log::debug!("GET {url}");
        Ok(self.send(url)?.text()?)
    }

    fn send(&self, url: Url) -> Result<Response> {
        let response = self.http.get(url.clone()).send()?;
        let status = response.status();
        if !status.is_success() {
            log::warn!("GET {url} returned {status}");
            return Err(ApiError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response)
    }
}

fn invalid_url(err: url::ParseError) -> ApiError {
    ApiError::Network(format!("invalid request URL: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_from_default_config() {
        let client = DataDockClient::new(&Config::default()).unwrap();
        assert_eq!(
            client.endpoints().datasets().unwrap().as_str(),
            "http://localhost:8000/api/data-import/public-datasets/"
        );
    }

    #[test]
    fn rejects_malformed_api_url() {
        let config = Config {
            api_url: "localhost without scheme".into(),
            ..Config::default()
        };
        assert!(matches!(
            DataDockClient::new(&config),
            Err(ApiError::Network(_))
        ));
    }
}
