//! Hosted table store client
//!
//! Speaks the PostgREST dialect used by hosted Postgres services: rows live
//! under `/rest/v1/<table>`, filters go in the query string (`id=eq.<uuid>`)
//! and `Prefer: return=representation` makes writes echo the stored rows.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::Deserialize;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::StoreConfig;
use crate::error::{Result, TriageError};
use crate::metrics::{MetricsCollector, MetricsTimer};
use crate::models::{Ticket, TicketUpdate};
use crate::schema::tickets;
use crate::store::{StoreProvider, TicketStore};
use crate::validation::InputValidator;

type CredentialLookup = dyn Fn(&str) -> Option<String> + Send + Sync;

/// Error body returned by the hosted store
#[derive(Debug, Deserialize)]
struct StoreErrorBody {
    message: String,
    #[serde(default)]
    code: Option<String>,
}

/// Gateway for one set of credentials
pub struct RestTicketStore {
    client: Client,
    endpoint: Url,
    headers: HeaderMap,
    metrics: MetricsCollector,
}

impl RestTicketStore {
    /// Create a gateway for `table` on the store at `base_url`
    pub fn new(client: Client, base_url: &str, service_key: &str, table: &str) -> Result<Self> {
        InputValidator::validate_table_name(table)?;

        let base = base_url.trim().trim_end_matches('/');
        let endpoint = Url::parse(&format!("{base}/rest/v1/{table}"))
            .map_err(|e| TriageError::Configuration(format!("invalid store URL {base_url:?}: {e}")))?;

        let key = HeaderValue::from_str(service_key.trim())
            .map_err(|_| TriageError::Configuration("service key is not a valid header value".to_string()))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", service_key.trim()))
            .map_err(|_| TriageError::Configuration("service key is not a valid header value".to_string()))?;

        let mut headers = HeaderMap::new();
        headers.insert("apikey", key);
        headers.insert(AUTHORIZATION, bearer);

        Ok(Self {
            client,
            endpoint,
            headers,
            metrics: MetricsCollector::default(),
        })
    }

    /// Full URL of the table endpoint
    #[must_use]
    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn request(&self, method: reqwest::Method) -> RequestBuilder {
        self.client
            .request(method, self.endpoint.clone())
            .headers(self.headers.clone())
    }

    async fn send(&self, operation: &'static str, request: RequestBuilder) -> Result<Vec<Ticket>> {
        let timer = MetricsTimer::new(self.metrics, operation);
        let result = match request.send().await {
            Ok(response) => Self::rows(response).await,
            Err(e) => Err(e.into()),
        };
        timer.finish(result.is_ok());
        result
    }

    async fn rows(response: Response) -> Result<Vec<Ticket>> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<Vec<Ticket>>().await?);
        }

        let body = response.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<StoreErrorBody>(&body) {
            Ok(StoreErrorBody { message, code: Some(code) }) => format!("{message} (code {code})"),
            Ok(StoreErrorBody { message, code: None }) => message,
            Err(_) if body.is_empty() => status.to_string(),
            Err(_) => body,
        };
        warn!(%status, "Table store request failed: {}", message);
        Err(TriageError::DataStore(message))
    }
}

#[async_trait]
impl TicketStore for RestTicketStore {
    async fn insert_ticket(&self, ticket: Ticket) -> Result<Ticket> {
        let request = self
            .request(reqwest::Method::POST)
            .header("Prefer", "return=representation")
            .json(&ticket);

        self.send("insert", request)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| TriageError::DataStore("insert returned no row".to_string()))
    }

    async fn recent_tickets(&self, limit: usize) -> Result<Vec<Ticket>> {
        let request = self.request(reqwest::Method::GET).query(&[
            ("select", "*".to_string()),
            ("order", format!("{}.desc", tickets::UPDATED_AT)),
            ("limit", limit.to_string()),
        ]);

        self.send("select", request).await
    }

    async fn find_ticket(&self, id: Uuid) -> Result<Option<Ticket>> {
        let request = self
            .request(reqwest::Method::GET)
            .query(&[("select", "*".to_string()), (tickets::ID, format!("eq.{id}"))]);

        Ok(self.send("select", request).await?.into_iter().next())
    }

    async fn update_ticket(&self, id: Uuid, update: TicketUpdate) -> Result<Option<Ticket>> {
        let request = self
            .request(reqwest::Method::PATCH)
            .query(&[(tickets::ID, format!("eq.{id}"))])
            .header("Prefer", "return=representation")
            .json(&update);

        Ok(self.send("update", request).await?.into_iter().next())
    }
}

/// Builds a [`RestTicketStore`] per request from environment credentials
pub struct RestStoreProvider {
    client: Client,
    table: String,
    // primary name first, then fallbacks
    url_envs: Vec<String>,
    service_key_env: String,
    lookup: Arc<CredentialLookup>,
}

impl RestStoreProvider {
    /// Create a provider from the `store` configuration section
    pub fn from_config(config: &StoreConfig) -> Result<Self> {
        InputValidator::validate_table_name(&config.table)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| TriageError::Configuration(format!("cannot build HTTP client: {e}")))?;

        Ok(Self {
            client,
            table: config.table.clone(),
            url_envs: std::iter::once(&config.url_env)
                .chain(&config.url_env_fallbacks)
                .cloned()
                .collect(),
            service_key_env: config.service_key_env.clone(),
            lookup: Arc::new(|name| std::env::var(name).ok()),
        })
    }

    /// Replace the environment lookup, e.g. with a fixed map in tests
    #[must_use]
    pub fn with_lookup<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.lookup = Arc::new(lookup);
        self
    }

    fn credential(&self, name: &str) -> Option<String> {
        (self.lookup)(name).filter(|value| !value.trim().is_empty())
    }

    /// First store URL set among the configured variable names
    fn store_url(&self) -> Option<String> {
        self.url_envs.iter().find_map(|name| self.credential(name))
    }

    fn missing_credentials(&self) -> TriageError {
        let urls = match self.url_envs.as_slice() {
            [only] => only.clone(),
            names => format!("either {}", names.join(" or ")),
        };
        TriageError::Configuration(format!(
            "Missing store environment variables. Define {} and {urls}.",
            self.service_key_env
        ))
    }
}

impl StoreProvider for RestStoreProvider {
    fn connect(&self) -> Result<Arc<dyn TicketStore>> {
        let (Some(url), Some(key)) = (self.store_url(), self.credential(&self.service_key_env)) else {
            return Err(self.missing_credentials());
        };

        let store = RestTicketStore::new(self.client.clone(), &url, &key, &self.table)?;
        debug!(endpoint = %store.endpoint(), "Connected to table store");
        Ok(Arc::new(store))
    }
}
