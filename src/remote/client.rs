//! REST client for the hosted template table
//!
//! Talks to a PostgREST endpoint (as exposed by Supabase) with the project's
//! static key. Three calls are needed: list, upsert with `name` as the
//! conflict target, and delete by id.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use tracing::{debug, error, info};

use crate::config::RemoteSettings;
use crate::error::{DockyardError, DockyardResult};

use super::dto::ServiceTemplateDto;

/// Column used as the upsert conflict target
pub const CONFLICT_TARGET: &str = "name";

/// Operations the sync layer needs from the remote store
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Every row of the table
    async fn list(&self) -> DockyardResult<Vec<ServiceTemplateDto>>;

    /// Insert rows, merging into existing rows with the same name
    async fn upsert(&self, rows: &[ServiceTemplateDto]) -> DockyardResult<()>;

    /// Delete the row with the given server id
    async fn delete(&self, remote_id: i64) -> DockyardResult<()>;
}

/// PostgREST client for one table
pub struct SupabaseClient {
    http: Client,
    endpoint: Url,
    api_key: String,
}

impl SupabaseClient {
    /// Build a client from settings
    pub fn new(settings: &RemoteSettings) -> DockyardResult<Self> {
        if !settings.is_configured() {
            return Err(DockyardError::Config(
                "Remote store is not configured (set remote.url and remote.api_key)".into(),
            ));
        }

        let endpoint = table_endpoint(&settings.url, &settings.table)?;
        let http = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs.max(1)))
            .user_agent(concat!("dockyard/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            endpoint,
            api_key: settings.api_key.clone(),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }
}

/// `{base}/rest/v1/{table}`
pub fn table_endpoint(base_url: &str, table: &str) -> DockyardResult<Url> {
    let base = base_url.trim().trim_end_matches('/');
    let table = table.trim();
    if table.is_empty() {
        return Err(DockyardError::Config("Remote table name cannot be empty".into()));
    }

    let url = format!("{}/rest/v1/{}", base, table);
    Url::parse(&url)
        .map_err(|e| DockyardError::Config(format!("Invalid remote URL '{}': {}", base_url, e)))
}

/// Turn a non-success response into `RemoteStatus`
async fn check_status(response: Response, action: &str) -> DockyardResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    error!(status = status.as_u16(), %body, "Remote {} failed", action);
    Err(DockyardError::RemoteStatus {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl RemoteStore for SupabaseClient {
    async fn list(&self) -> DockyardResult<Vec<ServiceTemplateDto>> {
        debug!(url = %self.endpoint, "Listing remote templates");

        let response = self
            .authorized(self.http.get(self.endpoint.clone()))
            .query(&[("select", "*"), ("order", "id.asc")])
            .send()
            .await?;

        let rows: Vec<ServiceTemplateDto> = check_status(response, "list")
            .await?
            .json()
            .await
            .map_err(|e| DockyardError::Remote(format!("Failed to decode remote rows: {}", e)))?;

        info!(count = rows.len(), "Fetched remote templates");
        Ok(rows)
    }

    async fn upsert(&self, rows: &[ServiceTemplateDto]) -> DockyardResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        debug!(count = rows.len(), "Upserting remote templates");

        let response = self
            .authorized(self.http.post(self.endpoint.clone()))
            .query(&[("on_conflict", CONFLICT_TARGET)])
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(rows)
            .send()
            .await?;

        check_status(response, "upsert").await?;
        info!(count = rows.len(), "Upserted remote templates");
        Ok(())
    }

    async fn delete(&self, remote_id: i64) -> DockyardResult<()> {
        let filter = format!("eq.{}", remote_id);
        let response = self
            .authorized(self.http.delete(self.endpoint.clone()))
            .query(&[("id", filter.as_str())])
            .send()
            .await?;

        check_status(response, "delete").await?;
        info!(remote_id, "Deleted remote template");
        Ok(())
    }
}
