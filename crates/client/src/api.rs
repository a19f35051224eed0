//! REST client for the data-modeling service.
//!
//! Wraps the service's HTTP endpoints (table catalog, query execution,
//! dashboard persistence) using [`reqwest`]. Responses use the
//! `{ "data": ... }` envelope.

use std::time::Duration;

use chartboard_core::columns::TableSchema;
use chartboard_core::types::{DbId, Row};
use serde::{Deserialize, Serialize};

use crate::collaborators::{
    DashboardRecord, DashboardStore, QueryExecutor, SaveDashboard, TableCatalog,
};
use crate::config::ClientConfig;

/// HTTP client for one data-modeling service.
#[derive(Clone)]
pub struct DataModelApi {
    client: reqwest::Client,
    api_url: String,
    token: Option<String>,
}

/// Errors from the REST API layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout, bad body).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service returned a non-2xx status code.
    #[error("Data model API error ({status}): {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },
}

/// Standard `{ "data": T }` response envelope.
#[derive(Debug, Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    query: &'a str,
}

#[derive(Debug, Deserialize)]
struct CreatedDashboard {
    id: DbId,
}

impl DataModelApi {
    /// Create a client for the service at `api_url`, e.g. `http://host:8080/api/v1`.
    pub fn new(api_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), api_url)
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, api_url: impl Into<String>) -> Self {
        Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            token: None,
        }
    }

    /// Build a client from configuration, applying the request timeout and
    /// bearer token.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        let api = Self::with_client(client, config.api_url.clone());
        Ok(match &config.api_token {
            Some(token) => api.with_token(token.clone()),
            None => api,
        })
    }

    /// Attach a bearer token to every request.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    // ---- private helpers ----

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let builder = self
            .client
            .request(method, format!("{}{}", self.api_url, path));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or an [`ApiError::Status`]
    /// containing the status and body text on failure.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful enveloped JSON response into the expected type.
    async fn parse_data<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<DataEnvelope<T>>().await?.data)
    }
}

impl TableCatalog for DataModelApi {
    /// `GET /projects/{project_id}/tables`
    async fn list_tables(&self, project_id: DbId) -> Result<Vec<TableSchema>, ApiError> {
        let response = self
            .request(
                reqwest::Method::GET,
                &format!("/projects/{project_id}/tables"),
            )
            .send()
            .await?;
        Self::parse_data(response).await
    }
}

impl QueryExecutor for DataModelApi {
    /// `POST /data-model/query`
    async fn execute_query(&self, sql: &str) -> Result<Vec<Row>, ApiError> {
        let response = self
            .request(reqwest::Method::POST, "/data-model/query")
            .json(&QueryRequest { query: sql })
            .send()
            .await?;
        Self::parse_data(response).await
    }
}

impl DashboardStore for DataModelApi {
    /// `POST /dashboards`
    async fn create_dashboard(&self, request: &SaveDashboard) -> Result<DbId, ApiError> {
        let response = self
            .request(reqwest::Method::POST, "/dashboards")
            .json(request)
            .send()
            .await?;
        let created: CreatedDashboard = Self::parse_data(response).await?;
        Ok(created.id)
    }

    /// `PUT /dashboards/{id}`
    async fn update_dashboard(&self, id: DbId, request: &SaveDashboard) -> Result<(), ApiError> {
        let response = self
            .request(reqwest::Method::PUT, &format!("/dashboards/{id}"))
            .json(request)
            .send()
            .await?;
        Self::ensure_success(response).await?;
        Ok(())
    }

    /// `GET /dashboards/{id}`
    async fn get_dashboard(&self, id: DbId) -> Result<DashboardRecord, ApiError> {
        let response = self
            .request(reqwest::Method::GET, &format!("/dashboards/{id}"))
            .send()
            .await?;
        Self::parse_data(response).await
    }
}
