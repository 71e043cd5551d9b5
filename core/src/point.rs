//! The measurement record exchanged with the host

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One timestamped, tagged measurement flowing through the stream.
///
/// Everything except the three field maps is identity context: the agent
/// copies it from input to output untouched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Point {
    /// Timestamp in the host's native unit (nanoseconds for Kapacitor)
    pub time: i64,
    pub name: String,
    pub database: String,
    pub retention_policy: String,
    pub group: String,
    pub dimensions: Vec<String>,
    pub by_name: bool,
    pub tags: BTreeMap<String, String>,
    pub fields_double: BTreeMap<String, f64>,
    pub fields_int: BTreeMap<String, i64>,
    pub fields_string: BTreeMap<String, String>,
}

impl Point {
    pub fn new(time: i64) -> Self {
        Self {
            time,
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn with_int_field(mut self, key: impl Into<String>, value: i64) -> Self {
        self.fields_int.insert(key.into(), value);
        self
    }

    pub fn with_string_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields_string.insert(key.into(), value.into());
        self
    }

    pub fn with_double_field(mut self, key: impl Into<String>, value: f64) -> Self {
        self.fields_double.insert(key.into(), value);
        self
    }

    /// Integer field value, or 0 when the host did not send it
    pub fn int_field(&self, key: &str) -> i64 {
        self.fields_int.get(key).copied().unwrap_or_default()
    }

    /// A point with this point's identity context and no fields
    pub fn derive_empty(&self) -> Self {
        Self {
            time: self.time,
            name: self.name.clone(),
            database: self.database.clone(),
            retention_policy: self.retention_policy.clone(),
            group: self.group.clone(),
            dimensions: self.dimensions.clone(),
            by_name: self.by_name,
            tags: self.tags.clone(),
            fields_double: BTreeMap::new(),
            fields_int: BTreeMap::new(),
            fields_string: BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_int_field_reads_zero() {
        let point = Point::new(1).with_int_field("cpu.value", 250);
        assert_eq!(point.int_field("cpu.value"), 250);
        assert_eq!(point.int_field("memory.value"), 0);
    }

    #[test]
    fn test_derive_empty_keeps_identity() {
        let mut point = Point::new(1_700_000_000_000_000_000)
            .with_name("kube_pod")
            .with_tag("namespace", "billing")
            .with_int_field("cpu.value", 10)
            .with_string_field("phase", "Running")
            .with_double_field("ratio", 0.5);
        point.database = "k8s".to_string();
        point.retention_policy = "autogen".to_string();
        point.group = "namespace=billing".to_string();
        point.dimensions = vec!["namespace".to_string()];
        point.by_name = true;

        let empty = point.derive_empty();
        assert_eq!(empty.time, point.time);
        assert_eq!(empty.name, "kube_pod");
        assert_eq!(empty.database, "k8s");
        assert_eq!(empty.retention_policy, "autogen");
        assert_eq!(empty.group, "namespace=billing");
        assert_eq!(empty.dimensions, vec!["namespace".to_string()]);
        assert!(empty.by_name);
        assert_eq!(empty.tags, point.tags);
        assert!(empty.fields_int.is_empty());
        assert!(empty.fields_string.is_empty());
        assert!(empty.fields_double.is_empty());
    }

    #[test]
    fn test_deserialize_sparse_point() {
        let point: Point = serde_json::from_str(
            r#"{"time": 42, "tags": {"pod": "api-0"}, "fields_int": {"uptime.value": 9}}"#,
        )
        .unwrap();

        assert_eq!(point.time, 42);
        assert_eq!(point.tags.get("pod").map(String::as_str), Some("api-0"));
        assert_eq!(point.int_field("uptime.value"), 9);
        assert!(point.name.is_empty());
        assert!(point.fields_double.is_empty());
    }
}
