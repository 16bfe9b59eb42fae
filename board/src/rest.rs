//! REST client for a hosted PostgREST-style backend.
//!
//! DESIGN
//! ======
//! One `RestStore` implements every collaborator trait: table rows under
//! `/rest/v1`, the signed-in user under `/auth/v1/user`, and image objects
//! under `/storage/v1/object`. Every request carries the project `apikey`
//! header and a bearer token (the user's access token when present, the
//! API key otherwise).
//!
//! URL building and response parsing are plain functions so they can be
//! tested without a network.

#[cfg(test)]
#[path = "rest_test.rs"]
mod rest_test;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use reqwest::{Method, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::ApiConfig;
use crate::store::{
    ComponentRecord, ComponentStore, DashboardResolver, ImageFetcher, ImageFile, ImageUploader, NewComponent,
    StoreError,
};

const COMPONENTS_TABLE: &str = "dashboard_components";
const DASHBOARDS_TABLE: &str = "dashboards";
const DEFAULT_DASHBOARD_TITLE: &str = "My Dashboard";
const DEFAULT_DASHBOARD_DESCRIPTION: &str = "My personal dashboard";
const REQUEST_TIMEOUT_SECS: u64 = 30;
const CONNECT_TIMEOUT_SECS: u64 = 10;

pub struct RestStore {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    access_token: Option<String>,
    bucket: String,
}

impl RestStore {
    /// Build a client for the configured backend.
    ///
    /// # Errors
    ///
    /// Returns `Http` if the HTTP client cannot be constructed.
    pub fn new(config: &ApiConfig) -> Result<Self, StoreError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            api_key: config.api_key.clone(),
            access_token: config.access_token.clone(),
            bucket: config.image_bucket.clone(),
        })
    }

    /// Title of a dashboard, for naming exports.
    ///
    /// # Errors
    ///
    /// `EmptyResponse` when no such dashboard is visible, otherwise request failures.
    pub async fn dashboard_title(&self, dashboard_id: Uuid) -> Result<String, StoreError> {
        let url = table_url(&self.base_url, DASHBOARDS_TABLE, &[("select", "id,title".into()), ("id", eq(dashboard_id))]);
        let text = send(self.request(Method::GET, &url)).await?;
        let row: DashboardRow = first_row(&text)?;
        Ok(row.title.unwrap_or_else(|| DEFAULT_DASHBOARD_TITLE.to_owned()))
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let token = self.access_token.as_deref().unwrap_or(&self.api_key);
        self.http.request(method, url).header("apikey", &self.api_key).bearer_auth(token)
    }

    async fn patch_component(&self, id: Uuid, body: Value) -> Result<(), StoreError> {
        self.patch_components(("id", eq(id)), body).await
    }

    /// PATCH every component row matching `filter`, stamping `updated_at`.
    async fn patch_components(&self, filter: (&str, String), mut body: Value) -> Result<(), StoreError> {
        if let Value::Object(map) = &mut body {
            map.insert("updated_at".into(), Value::String(now_rfc3339()?));
        }
        let url = table_url(&self.base_url, COMPONENTS_TABLE, &[filter]);
        send(self.request(Method::PATCH, &url).json(&body)).await?;
        Ok(())
    }
}

#[async_trait]
impl ComponentStore for RestStore {
    async fn fetch_components(&self, dashboard_id: Uuid) -> Result<Vec<ComponentRecord>, StoreError> {
        let url = table_url(&self.base_url, COMPONENTS_TABLE, &[("select", "*".into()), ("dashboard_id", eq(dashboard_id))]);
        let text = send(self.request(Method::GET, &url)).await?;
        let rows: Vec<ComponentRecord> = parse_rows(&text)?;
        debug!(%dashboard_id, count = rows.len(), "fetched components");
        Ok(rows)
    }

    async fn insert_component(&self, component: NewComponent) -> Result<ComponentRecord, StoreError> {
        let url = table_url(&self.base_url, COMPONENTS_TABLE, &[]);
        let request =
            self.request(Method::POST, &url).header("Prefer", "return=representation").json(&[&component]);
        let text = send(request).await?;
        first_row(&text)
    }

    async fn update_position(&self, id: Uuid, x: f64, y: f64) -> Result<(), StoreError> {
        self.patch_component(id, json!({ "position_x": x, "position_y": y })).await
    }

    async fn update_size(&self, id: Uuid, width: f64, height: f64) -> Result<(), StoreError> {
        self.patch_component(id, json!({ "width": width, "height": height })).await
    }

    async fn update_content(&self, id: Uuid, content: &str) -> Result<(), StoreError> {
        self.patch_component(id, json!({ "content": content })).await
    }

    async fn update_style(&self, id: Uuid, style: Value) -> Result<(), StoreError> {
        self.patch_component(id, json!({ "style": style })).await
    }

    async fn delete_component(&self, id: Uuid) -> Result<(), StoreError> {
        let url = table_url(&self.base_url, COMPONENTS_TABLE, &[("id", eq(id))]);
        send(self.request(Method::DELETE, &url)).await?;
        Ok(())
    }

    async fn delete_all_for_dashboard(&self, dashboard_id: Uuid) -> Result<(), StoreError> {
        let url = table_url(&self.base_url, COMPONENTS_TABLE, &[("dashboard_id", eq(dashboard_id))]);
        send(self.request(Method::DELETE, &url)).await?;
        Ok(())
    }

    async fn touch_dashboard(&self, dashboard_id: Uuid) -> Result<(), StoreError> {
        self.patch_components(("dashboard_id", eq(dashboard_id)), json!({})).await?;
        debug!(%dashboard_id, "dashboard components touched");
        Ok(())
    }
}

#[async_trait]
impl DashboardResolver for RestStore {
    async fn current_user(&self) -> Result<Uuid, StoreError> {
        let Some(token) = self.access_token.as_deref() else {
            return Err(StoreError::NotAuthenticated);
        };
        let url = format!("{}/auth/v1/user", self.base_url);
        let request = self.http.get(url).header("apikey", &self.api_key).bearer_auth(token);
        match send(request).await {
            Ok(text) => parse_user_id(&text),
            Err(StoreError::Status { status: 401 | 403, .. }) => Err(StoreError::NotAuthenticated),
            Err(e) => Err(e),
        }
    }

    async fn get_or_create_dashboard(&self) -> Result<Uuid, StoreError> {
        let owner_id = self.current_user().await?;

        let url = table_url(
            &self.base_url,
            DASHBOARDS_TABLE,
            &[("select", "id".into()), ("owner_id", eq(owner_id)), ("limit", "1".into())],
        );
        let text = send(self.request(Method::GET, &url)).await?;
        let existing: Vec<DashboardRow> = parse_rows(&text)?;
        if let Some(row) = existing.first() {
            return Ok(row.id);
        }

        let url = table_url(&self.base_url, DASHBOARDS_TABLE, &[]);
        let body = json!([{
            "title": DEFAULT_DASHBOARD_TITLE,
            "description": DEFAULT_DASHBOARD_DESCRIPTION,
            "is_public": false,
            "owner_id": owner_id,
        }]);
        let request = self.request(Method::POST, &url).header("Prefer", "return=representation").json(&body);
        let created: DashboardRow = first_row(&send(request).await?)?;
        info!(dashboard_id = %created.id, %owner_id, "created default dashboard");
        Ok(created.id)
    }
}

#[async_trait]
impl ImageUploader for RestStore {
    async fn upload_image(&self, file: &ImageFile) -> Result<String, StoreError> {
        let path = format!("{}.{}", Uuid::new_v4(), file.extension());
        let url = format!("{}/storage/v1/object/{}/{}", self.base_url, self.bucket, path);
        let content_type = file.content_type.as_deref().unwrap_or("application/octet-stream");
        let content_type =
            HeaderValue::from_str(content_type).map_err(|e| StoreError::Backend(format!("bad content type: {e}")))?;
        let request = self.request(Method::POST, &url).header(CONTENT_TYPE, content_type).body(file.bytes.clone());
        send(request).await?;
        debug!(path = %path, bytes = file.bytes.len(), "image uploaded");
        Ok(public_object_url(&self.base_url, &self.bucket, &path))
    }
}

#[async_trait]
impl ImageFetcher for RestStore {
    async fn fetch_image(&self, url: &str) -> Result<Vec<u8>, StoreError> {
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await?;
            return Err(StoreError::Status { status: status.as_u16(), body });
        }
        Ok(response.bytes().await?.to_vec())
    }
}

// =============================================================================
// WIRE HELPERS
// =============================================================================

#[derive(Debug, Deserialize)]
struct DashboardRow {
    id: Uuid,
    #[serde(default)]
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UserRow {
    id: Uuid,
}

/// Send a request and return the body of a successful response.
async fn send(request: RequestBuilder) -> Result<String, StoreError> {
    let response = request.send().await?;
    let status = response.status();
    let text = response.text().await?;
    if !status.is_success() {
        return Err(StoreError::Status { status: status.as_u16(), body: text });
    }
    Ok(text)
}

/// PostgREST equality filter value.
fn eq(id: Uuid) -> String {
    format!("eq.{id}")
}

/// URL of a table endpoint with query parameters appended in order.
fn table_url(base_url: &str, table: &str, params: &[(&str, String)]) -> String {
    let mut url = format!("{base_url}/rest/v1/{table}");
    for (i, (key, value)) in params.iter().enumerate() {
        url.push(if i == 0 { '?' } else { '&' });
        url.push_str(key);
        url.push('=');
        url.push_str(value);
    }
    url
}

/// Public URL for an object in a public bucket.
fn public_object_url(base_url: &str, bucket: &str, path: &str) -> String {
    format!("{base_url}/storage/v1/object/public/{bucket}/{path}")
}

fn parse_rows<T: DeserializeOwned>(text: &str) -> Result<Vec<T>, StoreError> {
    Ok(serde_json::from_str(text)?)
}

fn first_row<T: DeserializeOwned>(text: &str) -> Result<T, StoreError> {
    parse_rows(text)?.into_iter().next().ok_or(StoreError::EmptyResponse)
}

fn parse_user_id(text: &str) -> Result<Uuid, StoreError> {
    let user: UserRow = serde_json::from_str(text)?;
    Ok(user.id)
}

fn now_rfc3339() -> Result<String, StoreError> {
    Ok(OffsetDateTime::now_utc().format(&Rfc3339)?)
}
