//! Server entity model.
//!
//! A server document is `{ "_id", "name", "metrics", "logs" }` plus any other
//! top-level fields the caller supplied, kept verbatim. `metrics` maps a
//! resource name (`cpu_usage`, `memory_usage`, ...) to an integer usage
//! percentage. Every stored server carries a metrics map, possibly empty; a
//! missing resource reads as usage 0.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::{Result, ServWatchError};

pub const CPU_USAGE: &str = "cpu_usage";
pub const MEMORY_USAGE: &str = "memory_usage";

pub const USAGE_MIN: i64 = 0;
pub const USAGE_MAX: i64 = 100;

/// Name given to documents inserted without one.
pub const UNNAMED: &str = "Unnamed";

/// Key of the store-assigned identifier in a server document.
pub const ID_FIELD: &str = "_id";

/// Update keys of the form `metrics.<resource>` set one resource.
pub const METRIC_PATH_PREFIX: &str = "metrics.";

/// Clamp a usage value into `[USAGE_MIN, USAGE_MAX]`.
pub fn clamp_usage(v: i64) -> i64 {
    v.clamp(USAGE_MIN, USAGE_MAX)
}

/// Opaque server identifier, assigned by the store at insert time.
///
/// Rendered as 32 lowercase hex digits. Parsing is the only way to turn
/// untrusted input into an id, so handlers never see malformed ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ServerId(Uuid);

impl ServerId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Validate a caller-supplied id.
    pub fn parse(raw: &str) -> Result<Self> {
        Uuid::try_parse(raw)
            .map(Self)
            .map_err(|_| ServWatchError::InvalidId(raw.to_string()))
    }
}

impl fmt::Display for ServerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

impl FromStr for ServerId {
    type Err = ServWatchError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ServerId {
    type Error = ServWatchError;

    fn try_from(s: String) -> Result<Self> {
        Self::parse(&s)
    }
}

impl From<ServerId> for String {
    fn from(id: ServerId) -> Self {
        id.to_string()
    }
}

/// Resource name -> usage percentage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metrics(BTreeMap<String, i64>);

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, resource: &str) -> Option<i64> {
        self.0.get(resource).copied()
    }

    /// Usage for `resource`, 0 when absent.
    pub fn usage(&self, resource: &str) -> i64 {
        self.get(resource).unwrap_or(0)
    }

    pub fn cpu_usage(&self) -> i64 {
        self.usage(CPU_USAGE)
    }

    pub fn memory_usage(&self) -> i64 {
        self.usage(MEMORY_USAGE)
    }

    /// Set one resource; returns true if the stored value changed.
    pub fn set(&mut self, resource: impl Into<String>, value: i64) -> bool {
        self.0.insert(resource.into(), value) != Some(value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, i64)> for Metrics {
    fn from_iter<I: IntoIterator<Item = (K, i64)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// Stored server document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Server {
    #[serde(rename = "_id")]
    pub id: ServerId,
    pub name: String,
    #[serde(default)]
    pub metrics: Metrics,
    /// Append-only log entries; opaque to servwatch.
    #[serde(default)]
    pub logs: Vec<Value>,
    /// Caller-supplied fields servwatch does not interpret.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Caller-supplied document for insert. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewServer {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub metrics: Option<Metrics>,
    #[serde(default)]
    pub logs: Option<Vec<Value>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NewServer {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// A caller-supplied `_id` is discarded; the store's id wins.
    pub fn into_server(self, id: ServerId) -> Server {
        let mut extra = self.extra;
        extra.remove(ID_FIELD);
        Server {
            id,
            name: self.name.unwrap_or_else(|| UNNAMED.to_string()),
            metrics: self.metrics.unwrap_or_default(),
            logs: self.logs.unwrap_or_default(),
            extra,
        }
    }
}

/// Partial update of one server.
///
/// Top-level fields replace the stored value wholesale. `metric_fields`
/// overwrite individual resources and leave the rest of the map untouched;
/// they are applied after a `metrics` replacement. On the wire they are
/// written as `"metrics.<resource>": <int>` keys. Any other key lands in
/// `extra` and is set verbatim on the document. `_id` cannot be updated.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(try_from = "RawServerUpdate")]
pub struct ServerUpdate {
    pub name: Option<String>,
    pub metrics: Option<Metrics>,
    pub logs: Option<Vec<Value>>,
    pub metric_fields: BTreeMap<String, i64>,
    pub extra: Map<String, Value>,
}

#[derive(Deserialize)]
struct RawServerUpdate {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    metrics: Option<Metrics>,
    #[serde(default)]
    logs: Option<Vec<Value>>,
    #[serde(flatten)]
    rest: Map<String, Value>,
}

impl TryFrom<RawServerUpdate> for ServerUpdate {
    type Error = ServWatchError;

    fn try_from(raw: RawServerUpdate) -> Result<Self> {
        let mut update = ServerUpdate {
            name: raw.name,
            metrics: raw.metrics,
            logs: raw.logs,
            ..ServerUpdate::default()
        };

        for (key, value) in raw.rest {
            if key == ID_FIELD {
                return Err(ServWatchError::BadRequest("_id cannot be updated".into()));
            }
            match key.strip_prefix(METRIC_PATH_PREFIX) {
                Some(resource) if !resource.is_empty() => {
                    let v = value
                        .as_i64()
                        .ok_or_else(|| ServWatchError::BadRequest(format!("{key} must be an integer")))?;
                    update.metric_fields.insert(resource.to_string(), v);
                }
                Some(_) => {
                    return Err(ServWatchError::BadRequest(format!("{key} names no resource")));
                }
                None => {
                    update.extra.insert(key, value);
                }
            }
        }
        Ok(update)
    }
}

impl ServerUpdate {
    /// Overwrite a single metric resource.
    pub fn metric(mut self, resource: impl Into<String>, value: i64) -> Self {
        self.metric_fields.insert(resource.into(), value);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.metrics.is_none()
            && self.logs.is_none()
            && self.metric_fields.is_empty()
            && self.extra.is_empty()
    }

    /// Apply to `server`; returns true if any stored field changed.
    pub fn apply(&self, server: &mut Server) -> bool {
        let mut changed = false;
        if let Some(name) = &self.name {
            if server.name != *name {
                server.name = name.clone();
                changed = true;
            }
        }
        if let Some(metrics) = &self.metrics {
            if server.metrics != *metrics {
                server.metrics = metrics.clone();
                changed = true;
            }
        }
        if let Some(logs) = &self.logs {
            if server.logs != *logs {
                server.logs = logs.clone();
                changed = true;
            }
        }
        for (resource, value) in &self.metric_fields {
            changed |= server.metrics.set(resource.clone(), *value);
        }
        for (key, value) in &self.extra {
            if server.extra.get(key) != Some(value) {
                server.extra.insert(key.clone(), value.clone());
                changed = true;
            }
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn id_roundtrips_through_display() {
        let id = ServerId::generate();
        let parsed = ServerId::parse(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn malformed_id_is_rejected() {
        let err = ServerId::parse("not-an-id").unwrap_err();
        assert_eq!(err.client_code().as_str(), "INVALID_ID");
    }

    #[test]
    fn missing_metric_reads_as_zero() {
        let m = Metrics::new();
        assert_eq!(m.cpu_usage(), 0);
    }

    #[test]
    fn metric_fields_leave_other_resources_alone() {
        let mut s = NewServer::named("a")
            .with_metrics([("cpu_usage", 10), ("disk_usage", 33)].into_iter().collect())
            .into_server(ServerId::generate());

        let changed = ServerUpdate::default()
            .metric(CPU_USAGE, 90)
            .metric(MEMORY_USAGE, 5)
            .apply(&mut s);

        assert!(changed);
        assert_eq!(s.metrics.cpu_usage(), 90);
        assert_eq!(s.metrics.memory_usage(), 5);
        assert_eq!(s.metrics.get("disk_usage"), Some(33));
    }

    #[test]
    fn identical_update_reports_no_change() {
        let mut s = NewServer::named("a").into_server(ServerId::generate());
        let upd = ServerUpdate {
            name: Some("a".into()),
            ..ServerUpdate::default()
        };
        assert!(!upd.apply(&mut s));
    }

    #[test]
    fn dotted_keys_become_metric_fields() {
        let upd: ServerUpdate = serde_json::from_value(serde_json::json!({
            "metrics.cpu_usage": 90,
            "status": "maintenance"
        }))
        .unwrap();

        assert!(!upd.is_empty());
        assert_eq!(upd.metric_fields.get(CPU_USAGE), Some(&90));
        assert_eq!(upd.extra["status"], "maintenance");
        assert!(upd.metrics.is_none());
    }

    #[test]
    fn empty_body_is_an_empty_update() {
        let upd: ServerUpdate = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(upd.is_empty());
    }

    #[test]
    fn update_rejects_id_and_non_integer_metric() {
        let id = serde_json::from_value::<ServerUpdate>(serde_json::json!({ "_id": "x" }));
        assert!(id.is_err());

        let bad = serde_json::from_value::<ServerUpdate>(serde_json::json!({ "metrics.cpu_usage": "high" }));
        assert!(bad.is_err());
    }

    #[test]
    fn unknown_fields_survive_insert_and_update() {
        let doc: NewServer = serde_json::from_value(serde_json::json!({
            "_id": "caller-chosen",
            "name": "A",
            "ip": "10.0.0.1",
            "metrics": { "cpu_usage": 45, "memory_usage": 70 }
        }))
        .unwrap();
        let mut s = doc.into_server(ServerId::generate());
        assert_eq!(s.metrics.len(), 2);
        assert_eq!(s.extra["ip"], "10.0.0.1");
        assert!(!s.extra.contains_key(ID_FIELD));

        let mut upd = ServerUpdate::default();
        upd.extra.insert("ip".into(), "10.0.0.1".into());
        assert!(!upd.apply(&mut s));

        upd.extra.insert("status".into(), "maintenance".into());
        assert!(upd.apply(&mut s));

        let v = serde_json::to_value(&s).unwrap();
        assert_eq!(v["status"], "maintenance");
        assert_eq!(v["ip"], "10.0.0.1");
        assert_eq!(v["_id"].as_str().unwrap(), s.id.to_string());
    }

    #[test]
    fn server_serializes_with_underscore_id() {
        let s = NewServer::named("Server A").into_server(ServerId::generate());
        let v = serde_json::to_value(&s).unwrap();
        assert_eq!(v["_id"].as_str().unwrap(), s.id.to_string());
        assert!(v["metrics"].as_object().unwrap().is_empty());
        assert!(v["logs"].as_array().unwrap().is_empty());
    }
}
