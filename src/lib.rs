//! Lead management for a small sales team backed by a PocketBase instance.
//!
//! - [`csv_import`]: bulk creation of customers from spreadsheet exports
//! - [`store`]: record-store client and an in-memory stand-in
//! - [`records`]: per-customer projects, activities, reminders and templates
//! - [`reports`]: dashboard KPIs and board groupings
//! - [`config`]: connection settings

pub mod config;
pub mod csv_import;
pub mod error;
pub mod models;
pub mod records;
pub mod reports;
pub mod store;

pub use config::CrmConfig;
pub use error::{CrmError, Result};
