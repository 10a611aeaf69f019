//! Process-local record store.
//!
//! Backs the tests and `import_leads --dry-run`. Understands the subset of
//! the PocketBase query syntax the CRM uses: `a="x" && b=false` filters,
//! `-created,name` sorts, single-level `expand` and `fields`.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::sync::Mutex;

use super::{collections, ListQuery, RecordStore};
use crate::error::{CrmError, Result};
use crate::models::timestamp;

type RejectFn = Box<dyn Fn(&str, &Value) -> bool + Send + Sync>;

pub struct InMemoryStore {
    records: Mutex<HashMap<String, Vec<Value>>>,
    relations: HashMap<String, String>,
    reject: Option<RejectFn>,
    create_calls: AtomicUsize,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InMemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryStore")
            .field("relations", &self.relations)
            .field("create_calls", &self.create_calls())
            .finish_non_exhaustive()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        let mut relations = HashMap::new();
        relations.insert("asiakas".to_string(), collections::CUSTOMERS.to_string());

        Self {
            records: Mutex::new(HashMap::new()),
            relations,
            reject: None,
            create_calls: AtomicUsize::new(0),
        }
    }

    /// Reject every creation for which `predicate(collection, body)` is true,
    /// the way a store rejects invalid field values.
    pub fn rejecting<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&str, &Value) -> bool + Send + Sync + 'static,
    {
        self.reject = Some(Box::new(predicate));
        self
    }

    /// Insert a record as-is (fixtures). Missing `id` is generated.
    pub fn seed(&self, collection: &str, mut record: Value) -> Value {
        if let Some(obj) = record.as_object_mut() {
            obj.entry("id").or_insert_with(|| Value::String(new_id()));
        }
        self.lock()
            .entry(collection.to_string())
            .or_default()
            .push(record.clone());
        record
    }

    /// Number of `create` calls received, accepted or not.
    pub fn create_calls(&self) -> usize {
        self.create_calls.load(AtomicOrdering::SeqCst)
    }

    pub fn len(&self, collection: &str) -> usize {
        self.lock().get(collection).map(Vec::len).unwrap_or(0)
    }

    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<Value>>> {
        // A poisoned lock only means a test panicked mid-write; the data is still usable.
        self.records.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn expand_record(
        &self,
        all: &HashMap<String, Vec<Value>>,
        record: &mut Value,
        expand: &str,
    ) {
        let mut expanded = Map::new();
        for field in expand.split(',').map(str::trim).filter(|f| !f.is_empty()) {
            let Some(target) = self.relations.get(field) else {
                continue;
            };
            let Some(id) = record.get(field).and_then(Value::as_str) else {
                continue;
            };
            if let Some(related) = all
                .get(target)
                .and_then(|items| items.iter().find(|r| r.get("id").and_then(Value::as_str) == Some(id)))
            {
                expanded.insert(field.to_string(), related.clone());
            }
        }
        if !expanded.is_empty() {
            if let Some(obj) = record.as_object_mut() {
                obj.insert("expand".to_string(), Value::Object(expanded));
            }
        }
    }
}

#[async_trait]
impl RecordStore for InMemoryStore {
    async fn list(&self, collection: &str, query: &ListQuery) -> Result<Vec<Value>> {
        let all = self.lock();
        let conditions = match &query.filter {
            Some(filter) => parse_filter(filter)?,
            None => Vec::new(),
        };

        let mut items: Vec<Value> = all
            .get(collection)
            .map(|records| {
                records
                    .iter()
                    .filter(|r| conditions.iter().all(|c| c.matches(r)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        if let Some(sort) = &query.sort {
            sort_records(&mut items, sort);
        }
        if let Some(expand) = &query.expand {
            for item in items.iter_mut() {
                self.expand_record(&all, item, expand);
            }
        }
        if let Some(fields) = &query.fields {
            let keep: Vec<&str> = fields.split(',').map(str::trim).collect();
            for item in items.iter_mut() {
                if let Some(obj) = item.as_object_mut() {
                    obj.retain(|k, _| keep.contains(&k.as_str()));
                }
            }
        }

        Ok(items)
    }

    async fn get_one(&self, collection: &str, id: &str) -> Result<Value> {
        self.lock()
            .get(collection)
            .and_then(|records| records.iter().find(|r| record_id(r) == Some(id)))
            .cloned()
            .ok_or_else(|| CrmError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })
    }

    async fn create(&self, collection: &str, body: &Value) -> Result<Value> {
        self.create_calls.fetch_add(1, AtomicOrdering::SeqCst);

        let Some(fields) = body.as_object() else {
            return Err(CrmError::Store {
                status: 400,
                message: "body must be a JSON object".to_string(),
            });
        };
        if let Some(reject) = &self.reject {
            if reject(collection, body) {
                return Err(CrmError::Store {
                    status: 400,
                    message: "Failed to create record.".to_string(),
                });
            }
        }

        let now = timestamp::format(&Utc::now());
        let mut record = fields.clone();
        record.insert("id".to_string(), Value::String(new_id()));
        record.insert("collectionName".to_string(), Value::String(collection.to_string()));
        record.insert("created".to_string(), Value::String(now.clone()));
        record.insert("updated".to_string(), Value::String(now));

        let record = Value::Object(record);
        self.lock()
            .entry(collection.to_string())
            .or_default()
            .push(record.clone());
        Ok(record)
    }

    async fn update(&self, collection: &str, id: &str, body: &Value) -> Result<Value> {
        let mut all = self.lock();
        let record = all
            .get_mut(collection)
            .and_then(|records| records.iter_mut().find(|r| record_id(r) == Some(id)))
            .ok_or_else(|| CrmError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;

        if let (Some(target), Some(patch)) = (record.as_object_mut(), body.as_object()) {
            for (key, value) in patch {
                if key != "id" {
                    target.insert(key.clone(), value.clone());
                }
            }
            target.insert(
                "updated".to_string(),
                Value::String(timestamp::format(&Utc::now())),
            );
        }
        Ok(record.clone())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<()> {
        let mut all = self.lock();
        let records = all.get_mut(collection).ok_or_else(|| CrmError::NotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        })?;
        let before = records.len();
        records.retain(|r| record_id(r) != Some(id));
        if records.len() == before {
            return Err(CrmError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            });
        }
        Ok(())
    }
}

fn new_id() -> String {
    // PocketBase ids are 15 lowercase alphanumerics.
    uuid::Uuid::new_v4().simple().to_string()[..15].to_string()
}

fn record_id(record: &Value) -> Option<&str> {
    record.get("id").and_then(Value::as_str)
}

#[derive(Debug, Clone, PartialEq)]
struct Condition {
    field: String,
    negated: bool,
    value: Value,
}

impl Condition {
    fn matches(&self, record: &Value) -> bool {
        let actual = record.get(&self.field).unwrap_or(&Value::Null);
        let equal = match (&self.value, actual) {
            // Missing bool fields read as false, like in PocketBase.
            (Value::Bool(false), Value::Null) => true,
            (Value::String(s), Value::Null) => s.is_empty(),
            (expected, actual) => expected == actual,
        };
        equal != self.negated
    }
}

/// Byte offset of the first `pat` that is not inside a quoted value.
fn find_unquoted(s: &str, pat: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (i, c) in s.char_indices() {
        match quote {
            Some(_) if escaped => escaped = false,
            Some(_) if c == '\\' => escaped = true,
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '"' || c == '\'' => quote = Some(c),
            None if s[i..].starts_with(pat) => return Some(i),
            None => {}
        }
    }
    None
}

fn split_unquoted<'a>(s: &'a str, pat: &str) -> Vec<&'a str> {
    let mut parts = Vec::new();
    let mut rest = s;
    while let Some(i) = find_unquoted(rest, pat) {
        parts.push(&rest[..i]);
        rest = &rest[i + pat.len()..];
    }
    parts.push(rest);
    parts
}

fn parse_filter(filter: &str) -> Result<Vec<Condition>> {
    split_unquoted(filter, "&&")
        .into_iter()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            let (field, negated, raw) = match (find_unquoted(part, "!="), find_unquoted(part, "=")) {
                (Some(ne), Some(eq)) if ne < eq => (&part[..ne], true, &part[ne + 2..]),
                (_, Some(eq)) => (&part[..eq], false, &part[eq + 1..]),
                _ => return Err(CrmError::invalid("filter", part)),
            };

            let raw = raw.trim();
            let value = match raw {
                "true" => Value::Bool(true),
                "false" => Value::Bool(false),
                _ if raw.len() >= 2
                    && ((raw.starts_with('"') && raw.ends_with('"'))
                        || (raw.starts_with('\'') && raw.ends_with('\''))) =>
                {
                    Value::String(raw[1..raw.len() - 1].replace("\\\"", "\""))
                }
                _ => match (raw.parse::<i64>(), raw.parse::<f64>()) {
                    (Ok(n), _) => serde_json::json!(n),
                    (_, Ok(n)) => serde_json::json!(n),
                    _ => return Err(CrmError::invalid("filter value", raw)),
                },
            };

            Ok(Condition {
                field: field.trim().to_string(),
                negated,
                value,
            })
        })
        .collect()
}

fn sort_records(items: &mut [Value], sort: &str) {
    let keys: Vec<(&str, bool)> = sort
        .split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(|k| match k.strip_prefix('-') {
            Some(field) => (field, true),
            None => (k.strip_prefix('+').unwrap_or(k), false),
        })
        .collect();

    items.sort_by(|a, b| {
        for (field, descending) in &keys {
            let ord = compare_values(a.get(*field), b.get(*field));
            let ord = if *descending { ord.reverse() } else { ord };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    });
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (None, Some(_)) | (Some(Value::Null), Some(_)) => Ordering::Less,
        (Some(_), None) | (Some(_), Some(Value::Null)) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}
