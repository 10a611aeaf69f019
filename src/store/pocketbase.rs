//! PocketBase REST client
//!
//! Covers the endpoints the CRM uses:
//! - `GET  /api/health`
//! - `POST /api/collections/{c}/auth-with-password`
//! - list / view / create / update / delete on `/api/collections/{c}/records`
//!
//! API: https://pocketbase.io/docs/api-records/

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

use super::{ListQuery, RecordStore};
use crate::error::{CrmError, Result};

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8090";

/// Page size for full-list fetches (PocketBase maximum is 1000).
const PER_PAGE: usize = 500;

/// Collections tried in order by [`PocketBaseClient::auth_with_password`].
const AUTH_COLLECTIONS: [&str; 2] = ["users", "_superusers"];

/// Trim a trailing slash and add `http://` when no scheme is given.
pub fn normalize_base_url(raw: &str) -> String {
    let trimmed = raw.trim();
    let trimmed = if trimmed.is_empty() {
        DEFAULT_BASE_URL
    } else {
        trimmed
    };
    let without_slash = trimmed.strip_suffix('/').unwrap_or(trimmed);

    let lower = without_slash.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        without_slash.to_string()
    } else {
        format!("http://{}", without_slash)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    page: usize,
    #[serde(default)]
    total_pages: Option<usize>,
    #[serde(default)]
    items: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct AuthResponse {
    token: String,
    #[serde(default)]
    record: Value,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    message: String,
    #[serde(default)]
    data: Value,
}

/// Explicitly constructed store client; clone it or pass it by reference.
#[derive(Debug, Clone)]
pub struct PocketBaseClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
    auth_record: Option<Value>,
}

impl PocketBaseClient {
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_timeout(base_url, Duration::from_secs(30))
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: normalize_base_url(base_url),
            token: None,
            auth_record: None,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// The record returned by the last successful authentication.
    pub fn auth_record(&self) -> Option<&Value> {
        self.auth_record.as_ref()
    }

    pub fn clear_auth(&mut self) {
        self.token = None;
        self.auth_record = None;
    }

    /// Reachability check before asking for credentials.
    pub async fn health(&self) -> Result<()> {
        let url = format!("{}/api/health", self.base_url);
        let response = self.http.get(&url).send().await?;
        check_status(response).await.map(|_| ())
    }

    /// Log in as a regular user, falling back to a superuser account.
    pub async fn auth_with_password(&mut self, identity: &str, password: &str) -> Result<()> {
        let body = serde_json::json!({ "identity": identity, "password": password });
        let mut last_error = None;

        for collection in AUTH_COLLECTIONS {
            let url = format!(
                "{}/api/collections/{}/auth-with-password",
                self.base_url, collection
            );
            log::debug!("Authenticating {} against {}", identity, collection);

            let result = match self.http.post(&url).json(&body).send().await {
                Ok(response) => check_status(response).await,
                Err(e) => Err(e.into()),
            };

            match result {
                Ok(response) => {
                    let auth: AuthResponse = response.json().await?;
                    self.token = Some(auth.token);
                    self.auth_record = Some(auth.record);
                    log::info!("Authenticated as {} ({})", identity, collection);
                    return Ok(());
                }
                Err(e) => {
                    log::debug!("Authentication via {} failed: {}", collection, e);
                    last_error = Some(e);
                }
            }
        }

        Err(CrmError::Auth(
            last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "no auth collection accepted the credentials".to_string()),
        ))
    }

    fn records_url(&self, collection: &str) -> String {
        format!(
            "{}/api/collections/{}/records",
            self.base_url,
            urlencoding::encode(collection)
        )
    }

    fn record_url(&self, collection: &str, id: &str) -> String {
        format!("{}/{}", self.records_url(collection), urlencoding::encode(id))
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let builder = self.http.request(method, url);
        match &self.token {
            // PocketBase takes the bare token, no "Bearer" prefix.
            Some(token) => builder.header(reqwest::header::AUTHORIZATION, token),
            None => builder,
        }
    }

    async fn fetch_page(
        &self,
        collection: &str,
        query: &ListQuery,
        page: usize,
    ) -> Result<ListResponse> {
        let mut params: Vec<(&str, String)> = vec![
            ("page", page.to_string()),
            ("perPage", PER_PAGE.to_string()),
        ];
        if let Some(filter) = &query.filter {
            params.push(("filter", filter.clone()));
        }
        if let Some(sort) = &query.sort {
            params.push(("sort", sort.clone()));
        }
        if let Some(expand) = &query.expand {
            params.push(("expand", expand.clone()));
        }
        if let Some(fields) = &query.fields {
            params.push(("fields", fields.clone()));
        }

        let response = self
            .request(Method::GET, &self.records_url(collection))
            .query(&params)
            .send()
            .await?;
        let response = check_status(response).await?;
        Ok(response.json().await?)
    }
}

#[async_trait]
impl RecordStore for PocketBaseClient {
    async fn list(&self, collection: &str, query: &ListQuery) -> Result<Vec<Value>> {
        let mut items = Vec::new();
        let mut page = 1;

        loop {
            let response = self.fetch_page(collection, query, page).await?;
            let received = response.items.len();
            items.extend(response.items);

            let last_page = match response.total_pages {
                Some(total) => response.page.max(page) >= total,
                None => received < PER_PAGE,
            };
            if last_page || received == 0 {
                break;
            }
            page += 1;
        }

        log::debug!("Fetched {} records from {}", items.len(), collection);
        Ok(items)
    }

    async fn get_one(&self, collection: &str, id: &str) -> Result<Value> {
        let response = self
            .request(Method::GET, &self.record_url(collection, id))
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(CrmError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            });
        }
        let response = check_status(response).await?;
        Ok(response.json().await?)
    }

    async fn create(&self, collection: &str, body: &Value) -> Result<Value> {
        let response = self
            .request(Method::POST, &self.records_url(collection))
            .json(body)
            .send()
            .await?;
        let response = check_status(response).await?;
        Ok(response.json().await?)
    }

    async fn update(&self, collection: &str, id: &str, body: &Value) -> Result<Value> {
        let response = self
            .request(Method::PATCH, &self.record_url(collection, id))
            .json(body)
            .send()
            .await?;
        let response = check_status(response).await?;
        Ok(response.json().await?)
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<()> {
        let response = self
            .request(Method::DELETE, &self.record_url(collection, id))
            .send()
            .await?;
        check_status(response).await.map(|_| ())
    }
}

/// Turn a non-success response into [`CrmError::Store`] with the store's message.
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = store_error_message(&body);
    log::warn!("Record store error {}: {}", status, message);

    Err(CrmError::Store {
        status: status.as_u16(),
        message,
    })
}

/// Extract `message` plus per-field validation codes from an error body.
fn store_error_message(body: &str) -> String {
    let Ok(error) = serde_json::from_str::<ErrorResponse>(body) else {
        return body.trim().to_string();
    };

    let mut message = error.message;
    if let Some(fields) = error.data.as_object() {
        let details: Vec<String> = fields
            .iter()
            .map(|(field, detail)| {
                let code = detail
                    .get("message")
                    .or_else(|| detail.get("code"))
                    .and_then(|v| v.as_str())
                    .unwrap_or("invalid");
                format!("{}: {}", field, code)
            })
            .collect();
        if !details.is_empty() {
            message = format!("{} ({})", message, details.join(", "));
        }
    }
    message
}
