//! Record-store boundary.
//!
//! The CRM keeps its data in a hosted PocketBase instance. Everything in this
//! crate talks to it through [`RecordStore`], so the importer and the reports
//! can run against [`InMemoryStore`] in tests and dry runs.

mod memory;
mod pocketbase;

pub use memory::InMemoryStore;
pub use pocketbase::{normalize_base_url, PocketBaseClient, DEFAULT_BASE_URL};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::{CrmError, Result};

/// Collection names used by the CRM.
pub mod collections {
    pub const CUSTOMERS: &str = "asiakkaat";
    pub const PROJECTS: &str = "projektit";
    pub const ACTIVITIES: &str = "aktiviteetit";
    pub const REMINDERS: &str = "muistutukset";
    pub const EMAIL_TEMPLATES: &str = "sahkopostimallit";
}

/// Options for listing a collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    /// Store filter expression, e.g. `asiakas="abc" && tehty=false`.
    pub filter: Option<String>,
    /// Comma-separated sort fields, `-` prefix for descending.
    pub sort: Option<String>,
    /// Relations to expand, e.g. `asiakas`.
    pub expand: Option<String>,
    /// Restrict returned fields, e.g. `id,name`.
    pub fields: Option<String>,
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }

    pub fn expand(mut self, expand: impl Into<String>) -> Self {
        self.expand = Some(expand.into());
        self
    }

    pub fn fields(mut self, fields: impl Into<String>) -> Self {
        self.fields = Some(fields.into());
        self
    }

    /// Filter on a relation/text field equal to `value`.
    pub fn field_equals(field: &str, value: &str) -> Self {
        Self::new().filter(format!("{}=\"{}\"", field, value.replace('"', "\\\"")))
    }
}

/// Schemaless CRUD over named collections.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Every record of the collection matching the query.
    async fn list(&self, collection: &str, query: &ListQuery) -> Result<Vec<Value>>;

    async fn get_one(&self, collection: &str, id: &str) -> Result<Value>;

    /// Create a record; the store assigns `id`, `created` and `updated`.
    async fn create(&self, collection: &str, body: &Value) -> Result<Value>;

    /// Patch the given fields of an existing record.
    async fn update(&self, collection: &str, id: &str, body: &Value) -> Result<Value>;

    async fn delete(&self, collection: &str, id: &str) -> Result<()>;
}

pub async fn list_records<T, S>(store: &S, collection: &str, query: &ListQuery) -> Result<Vec<T>>
where
    T: DeserializeOwned,
    S: RecordStore + ?Sized,
{
    store
        .list(collection, query)
        .await?
        .into_iter()
        .map(|v| serde_json::from_value(v).map_err(CrmError::from))
        .collect()
}

pub async fn get_record<T, S>(store: &S, collection: &str, id: &str) -> Result<T>
where
    T: DeserializeOwned,
    S: RecordStore + ?Sized,
{
    let value = store.get_one(collection, id).await?;
    Ok(serde_json::from_value(value)?)
}

pub async fn create_record<T, B, S>(store: &S, collection: &str, body: &B) -> Result<T>
where
    T: DeserializeOwned,
    B: Serialize + ?Sized,
    S: RecordStore + ?Sized,
{
    let body = serde_json::to_value(body)?;
    let value = store.create(collection, &body).await?;
    Ok(serde_json::from_value(value)?)
}

pub async fn update_record<T, B, S>(store: &S, collection: &str, id: &str, body: &B) -> Result<T>
where
    T: DeserializeOwned,
    B: Serialize + ?Sized,
    S: RecordStore + ?Sized,
{
    let body = serde_json::to_value(body)?;
    let value = store.update(collection, id, &body).await?;
    Ok(serde_json::from_value(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_equals_escapes_quotes() {
        let query = ListQuery::field_equals("asiakas", "ab\"c");
        assert_eq!(query.filter.as_deref(), Some("asiakas=\"ab\\\"c\""));
    }

    #[test]
    fn test_builder() {
        let query = ListQuery::new().sort("-created").expand("asiakas").fields("id,name");
        assert_eq!(query.sort.as_deref(), Some("-created"));
        assert_eq!(query.expand.as_deref(), Some("asiakas"));
        assert_eq!(query.fields.as_deref(), Some("id,name"));
        assert_eq!(query.filter, None);
    }
}
