//! Authenticated HTTP client for the Dynatrace API

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;
use url::Url;

use super::types::{
    ApiErrorEnvelope, DashboardCreated, EntitiesResponse, Entity, EntityTypesResponse,
};
use super::{async_trait, WorkloadApi};
use crate::dashboard::Dashboard;
use crate::error::{MetricsError, Result};
use crate::models::{DeploymentEntity, HeapScope, MetricRange, TimeRange};

pub(crate) const ENTITIES_PATH: &str = "/api/v2/entities";
pub(crate) const METRICS_QUERY_PATH: &str = "/api/v2/metrics/query";
pub(crate) const ENTITY_TYPES_PATH: &str = "/api/v2/entityTypes";
pub(crate) const DASHBOARDS_PATH: &str = "/api/config/v1/dashboards";

/// User agent for API requests
const USER_AGENT: &str = concat!("dtm/", env!("CARGO_PKG_VERSION"));

/// Authorization scheme placed in front of the token
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuthScheme {
    /// `Authorization: Api-Token <token>`
    #[default]
    ApiToken,
    /// `Authorization: Bearer <token>`
    Bearer,
}

impl AuthScheme {
    fn prefix(self) -> &'static str {
        match self {
            AuthScheme::ApiToken => "Api-Token",
            AuthScheme::Bearer => "Bearer",
        }
    }
}

/// Connection settings for the API client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Environment URL, e.g. `https://abc12345.live.dynatrace.com`
    pub base_url: String,
    pub api_token: String,
    pub auth_scheme: AuthScheme,
    /// Request timeout
    pub timeout: Duration,
}

impl ClientConfig {
    /// Validate and normalise the URL and token
    pub fn new(base_url: &str, api_token: &str) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/');
        if base_url.is_empty() {
            return Err(MetricsError::Configuration(
                "Dynatrace URL is not set (DYNATRACE_URL)".to_string(),
            ));
        }
        if api_token.trim().is_empty() {
            return Err(MetricsError::Configuration(
                "Dynatrace API token is not set (DYNATRACE_API_TOKEN)".to_string(),
            ));
        }

        let parsed = Url::parse(base_url)
            .map_err(|e| MetricsError::Configuration(format!("Invalid Dynatrace URL '{}': {}", base_url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(MetricsError::Configuration(format!(
                "Dynatrace URL must use http or https, got '{}'",
                parsed.scheme()
            )));
        }

        Ok(Self {
            base_url: base_url.to_string(),
            api_token: api_token.trim().to_string(),
            auth_scheme: AuthScheme::default(),
            timeout: Duration::from_secs(30),
        })
    }

    pub fn with_auth_scheme(mut self, scheme: AuthScheme) -> Self {
        self.auth_scheme = scheme;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// API client for the Dynatrace environment
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let mut authorization =
            HeaderValue::from_str(&format!("{} {}", config.auth_scheme.prefix(), config.api_token))
                .map_err(|_| {
                    MetricsError::Configuration("API token contains invalid characters".to_string())
                })?;
        authorization.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, authorization);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()
            .map_err(|e| MetricsError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    /// The environment URL requests are sent to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Make a GET request
    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, ?query, "GET");

        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|source| MetricsError::Transport {
                endpoint: path.to_string(),
                source,
            })?;

        Self::handle_response(path, response).await
    }

    /// Make a POST request with JSON body
    pub(crate) async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "POST");

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|source| MetricsError::Transport {
                endpoint: path.to_string(),
                source,
            })?;

        Self::handle_response(path, response).await
    }

    async fn handle_response<T: DeserializeOwned>(path: &str, response: reqwest::Response) -> Result<T> {
        let status = response.status();
        debug!(endpoint = path, status = status.as_u16(), "Response received");

        if status.is_success() {
            let body = response.text().await.map_err(|source| MetricsError::Transport {
                endpoint: path.to_string(),
                source,
            })?;
            return serde_json::from_str(&body).map_err(|e| MetricsError::Parse {
                endpoint: path.to_string(),
                message: e.to_string(),
            });
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorEnvelope>(&body)
            .ok()
            .and_then(|e| e.error)
            .and_then(|e| e.message)
            .unwrap_or(body);

        Err(MetricsError::from_status(status.as_u16(), path, message))
    }

    /// One page of entities matching a selector
    pub async fn entities_page(
        &self,
        selector: &str,
        fields: Option<&str>,
        page_size: u32,
    ) -> Result<EntitiesResponse> {
        let mut query = vec![
            ("entitySelector", selector.to_string()),
            ("pageSize", page_size.to_string()),
        ];
        if let Some(fields) = fields {
            query.push(("fields", fields.to_string()));
        }
        self.get(ENTITIES_PATH, &query).await
    }

    /// All entities matching a selector, following `nextPageKey`
    pub async fn list_entities(&self, selector: &str, fields: Option<&str>) -> Result<Vec<Entity>> {
        let mut page = self.entities_page(selector, fields, 500).await?;
        let mut entities = std::mem::take(&mut page.entities);

        while let Some(key) = page.next_page_key.take() {
            debug!(selector, fetched = entities.len(), "Fetching next entity page");
            page = self.get(ENTITIES_PATH, &[("nextPageKey", key)]).await?;
            entities.append(&mut page.entities);
        }

        Ok(entities)
    }

    /// Number of entities matching a selector
    pub async fn count_entities(&self, selector: &str) -> Result<u64> {
        let page = self.entities_page(selector, None, 500).await?;
        Ok(page.total_count.unwrap_or(page.entities.len() as u64))
    }

    /// Names of all entity types known to the environment
    pub async fn entity_types(&self) -> Result<Vec<String>> {
        let mut page: EntityTypesResponse = self
            .get(ENTITY_TYPES_PATH, &[("pageSize", "500".to_string())])
            .await?;
        let mut names: Vec<String> = page.types.iter().map(|t| t.type_name().to_string()).collect();

        while let Some(key) = page.next_page_key.take() {
            page = self.get(ENTITY_TYPES_PATH, &[("nextPageKey", key)]).await?;
            names.extend(page.types.iter().map(|t| t.type_name().to_string()));
        }

        Ok(names)
    }

    /// Create a dashboard
    pub async fn create_dashboard(&self, dashboard: &Dashboard) -> Result<DashboardCreated> {
        self.post(DASHBOARDS_PATH, dashboard).await
    }

    /// Browser link to a dashboard
    pub fn dashboard_url(&self, dashboard_id: &str) -> String {
        format!("{}/#dashboard;id={}", self.base_url, dashboard_id)
    }
}

#[async_trait]
impl WorkloadApi for ApiClient {
    async fn list_deployments(&self, cluster: &str, namespace: &str) -> Result<Vec<DeploymentEntity>> {
        ApiClient::list_deployments(self, cluster, namespace).await
    }

    async fn pod_count(&self, deployment: &DeploymentEntity) -> Result<u64> {
        ApiClient::pod_count(self, deployment).await
    }

    async fn query_metric(&self, metric_key: &str, entity_id: &str, range: &TimeRange) -> Result<MetricRange> {
        ApiClient::query_metric(self, metric_key, entity_id, range).await
    }

    async fn resolve_heap_scope(&self, deployment: &DeploymentEntity) -> Result<Option<HeapScope>> {
        ApiClient::resolve_heap_scope(self, deployment).await
    }

    async fn query_heap(&self, scope: &HeapScope, range: &TimeRange) -> Result<MetricRange> {
        ApiClient::query_heap(self, scope, range).await
    }
}
