//! Records kept in the CRM collections and the payloads used to create them.

mod status;
pub mod timestamp;

pub use status::{ActivityType, CustomerStatus, LeadSource, ProjectStatus, Segment};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::str::FromStr;

/// Placeholder substituted with the customer's name when a template is rendered.
pub const CUSTOMER_PLACEHOLDER: &str = "[CUSTOMER]";

/// Placeholder used by templates written with the Finnish UI.
pub const LEGACY_CUSTOMER_PLACEHOLDER: &str = "[ASIAKAS]";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default, deserialize_with = "label_or_default")]
    pub status: CustomerStatus,
    #[serde(
        rename = "segmentti",
        default,
        deserialize_with = "lenient_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub segment: Option<Segment>,
    #[serde(
        rename = "lahde",
        default,
        deserialize_with = "lenient_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub source: Option<LeadSource>,
    #[serde(rename = "kaupunki", default, deserialize_with = "empty_as_none")]
    pub city: Option<String>,
    #[serde(rename = "toimiala", default, deserialize_with = "empty_as_none")]
    pub industry: Option<String>,
    #[serde(default, with = "timestamp")]
    pub created: DateTime<Utc>,
    #[serde(default, with = "timestamp")]
    pub updated: DateTime<Utc>,
}

/// Creation payload for the customers collection.
///
/// Everything except `name` and `status` is free text here: imported values
/// are passed through verbatim and the store decides whether to accept them.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct NewCustomer {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub status: CustomerStatus,
    #[serde(rename = "segmentti", skip_serializing_if = "Option::is_none")]
    pub segment: Option<String>,
    #[serde(rename = "lahde", skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(rename = "kaupunki", skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(rename = "toimiala", skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(rename = "hinta", default, deserialize_with = "non_negative_price")]
    pub price: f64,
    #[serde(default, with = "timestamp::option")]
    pub deadline: Option<DateTime<Utc>>,
    #[serde(rename = "asiakas")]
    pub customer: String,
    #[serde(default, deserialize_with = "label_or_default")]
    pub status: ProjectStatus,
    #[serde(default, with = "timestamp")]
    pub created: DateTime<Utc>,
    #[serde(default, with = "timestamp")]
    pub updated: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expand: Option<ProjectExpand>,
}

impl Project {
    /// Name of the expanded customer relation, if the list was fetched with `expand=asiakas`.
    pub fn customer_name(&self) -> Option<&str> {
        self.expand
            .as_ref()
            .and_then(|e| e.customer.as_ref())
            .map(|c| c.name.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ProjectExpand {
    #[serde(rename = "asiakas", default, skip_serializing_if = "Option::is_none")]
    pub customer: Option<Customer>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewProject {
    pub name: String,
    #[serde(rename = "hinta")]
    pub price: f64,
    #[serde(with = "timestamp::option")]
    pub deadline: Option<DateTime<Utc>>,
    #[serde(rename = "asiakas")]
    pub customer: String,
    pub status: ProjectStatus,
}

impl NewProject {
    /// Negative prices are clamped to zero.
    pub fn new(name: impl Into<String>, price: f64, customer: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            price: price.max(0.0),
            deadline: None,
            customer: customer.into(),
            status: ProjectStatus::New,
        }
    }

    pub fn with_deadline(mut self, deadline: DateTime<Utc>) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_status(mut self, status: ProjectStatus) -> Self {
        self.status = status;
        self
    }
}

/// Entry in a customer's activity log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: String,
    #[serde(rename = "asiakas")]
    pub customer: String,
    #[serde(rename = "tyyppi")]
    pub kind: ActivityType,
    #[serde(rename = "kuvaus", default)]
    pub description: String,
    #[serde(rename = "paivamaara", default, with = "timestamp::option")]
    pub date: Option<DateTime<Utc>>,
    #[serde(default, with = "timestamp")]
    pub created: DateTime<Utc>,
    #[serde(default, with = "timestamp")]
    pub updated: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewActivity {
    #[serde(rename = "asiakas")]
    pub customer: String,
    #[serde(rename = "tyyppi")]
    pub kind: ActivityType,
    #[serde(rename = "kuvaus")]
    pub description: String,
    #[serde(rename = "paivamaara", with = "timestamp::option")]
    pub date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reminder {
    pub id: String,
    #[serde(rename = "asiakas")]
    pub customer: String,
    #[serde(rename = "teksti", default)]
    pub text: String,
    #[serde(rename = "paivamaara", default, with = "timestamp::option")]
    pub date: Option<DateTime<Utc>>,
    #[serde(rename = "tehty", default)]
    pub done: bool,
    #[serde(default, with = "timestamp")]
    pub created: DateTime<Utc>,
    #[serde(default, with = "timestamp")]
    pub updated: DateTime<Utc>,
}

impl Reminder {
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        !self.done && self.date.is_some_and(|d| d < now)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewReminder {
    #[serde(rename = "asiakas")]
    pub customer: String,
    #[serde(rename = "teksti")]
    pub text: String,
    #[serde(rename = "paivamaara", with = "timestamp::option")]
    pub date: Option<DateTime<Utc>>,
    #[serde(rename = "tehty")]
    pub done: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailTemplate {
    pub id: String,
    #[serde(rename = "nimi")]
    pub name: String,
    #[serde(rename = "aihe", default)]
    pub subject: String,
    #[serde(rename = "sisalto", default)]
    pub body: String,
    #[serde(default, with = "timestamp")]
    pub created: DateTime<Utc>,
    #[serde(default, with = "timestamp")]
    pub updated: DateTime<Utc>,
}

impl EmailTemplate {
    /// Body with every customer placeholder replaced by `customer_name`.
    pub fn render(&self, customer_name: &str) -> String {
        render_placeholders(&self.body, customer_name)
    }

    pub fn render_subject(&self, customer_name: &str) -> String {
        render_placeholders(&self.subject, customer_name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewEmailTemplate {
    #[serde(rename = "nimi")]
    pub name: String,
    #[serde(rename = "aihe")]
    pub subject: String,
    #[serde(rename = "sisalto")]
    pub body: String,
}

fn render_placeholders(text: &str, customer_name: &str) -> String {
    text.replace(CUSTOMER_PLACEHOLDER, customer_name)
        .replace(LEGACY_CUSTOMER_PLACEHOLDER, customer_name)
}

// ============================================================================
// Deserialization helpers
// ============================================================================

/// Optional label field: empty strings and unknown labels both become `None`.
fn lenient_option<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|s| {
        let s = s.trim();
        if s.is_empty() {
            None
        } else {
            s.parse().ok()
        }
    }))
}

/// Empty or unknown status labels fall back to the default status.
fn label_or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr + Default,
{
    Ok(lenient_option(deserializer)?.unwrap_or_default())
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.filter(|s| !s.trim().is_empty()))
}

fn non_negative_price<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<f64> = Option::deserialize(deserializer)?;
    Ok(raw.unwrap_or(0.0).max(0.0))
}
