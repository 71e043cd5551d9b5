//! Messages exchanged between the host pipeline and the agent
//!
//! Both directions are internally tagged by `type` so a single JSON object
//! is a complete frame:
//!
//! ```text
//! {"type":"init","options":[{"name":"total_cpu","values":[{"type":"int","value":4000}]}]}
//! {"type":"init","success":true,"error":""}
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::point::Point;

/// Shape of the data flowing on an edge of the host pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeType {
    Stream,
    Batch,
}

/// Type tag of an option value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    Bool,
    Int,
    Double,
    String,
    Duration,
}

impl std::fmt::Display for ValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ValueType::Bool => "bool",
            ValueType::Int => "int",
            ValueType::Double => "double",
            ValueType::String => "string",
            ValueType::Duration => "duration",
        };
        f.write_str(name)
    }
}

/// A single typed option value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum OptionValue {
    Bool(bool),
    Int(i64),
    Double(f64),
    String(String),
    /// Nanoseconds
    Duration(i64),
}

impl OptionValue {
    pub fn value_type(&self) -> ValueType {
        match self {
            OptionValue::Bool(_) => ValueType::Bool,
            OptionValue::Int(_) => ValueType::Int,
            OptionValue::Double(_) => ValueType::Double,
            OptionValue::String(_) => ValueType::String,
            OptionValue::Duration(_) => ValueType::Duration,
        }
    }
}

/// A named option supplied at initialization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionEntry {
    pub name: String,
    #[serde(default)]
    pub values: Vec<OptionValue>,
}

impl OptionEntry {
    pub fn new(name: impl Into<String>, values: Vec<OptionValue>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    pub fn single(name: impl Into<String>, value: OptionValue) -> Self {
        Self::new(name, vec![value])
    }
}

/// Declares which value types an option accepts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionInfo {
    pub value_types: Vec<ValueType>,
}

/// Messages sent by the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    Info,
    Init {
        #[serde(default)]
        options: Vec<OptionEntry>,
    },
    Keepalive {
        #[serde(default)]
        time: i64,
    },
    Snapshot,
    Restore {
        #[serde(default)]
        snapshot: Vec<u8>,
    },
    BeginBatch {
        #[serde(default)]
        name: String,
        #[serde(default)]
        group: String,
    },
    Point {
        point: Point,
    },
    EndBatch {
        #[serde(default)]
        name: String,
        #[serde(default)]
        group: String,
    },
    Stop,
}

impl Request {
    /// Short name used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            Request::Info => "info",
            Request::Init { .. } => "init",
            Request::Keepalive { .. } => "keepalive",
            Request::Snapshot => "snapshot",
            Request::Restore { .. } => "restore",
            Request::BeginBatch { .. } => "begin_batch",
            Request::Point { .. } => "point",
            Request::EndBatch { .. } => "end_batch",
            Request::Stop => "stop",
        }
    }
}

/// Messages sent to the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    Info {
        wants: EdgeType,
        provides: EdgeType,
        options: BTreeMap<String, OptionInfo>,
    },
    Init {
        success: bool,
        error: String,
    },
    Keepalive {
        time: i64,
    },
    Snapshot {
        snapshot: Vec<u8>,
    },
    Restore {
        success: bool,
        error: String,
    },
    Point {
        point: Point,
    },
    Error {
        error: String,
    },
}

impl Response {
    pub fn error(message: impl Into<String>) -> Self {
        Response::Error {
            error: message.into(),
        }
    }

    /// Short name used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            Response::Info { .. } => "info",
            Response::Init { .. } => "init",
            Response::Keepalive { .. } => "keepalive",
            Response::Snapshot { .. } => "snapshot",
            Response::Restore { .. } => "restore",
            Response::Point { .. } => "point",
            Response::Error { .. } => "error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_init_request() {
        let raw = r#"{"type":"init","options":[
            {"name":"hourly_cost","values":[{"type":"double","value":10.5}]},
            {"name":"total_cpu","values":[{"type":"int","value":4000}]}
        ]}"#;
        let request: Request = serde_json::from_str(raw).unwrap();

        match request {
            Request::Init { options } => {
                assert_eq!(options.len(), 2);
                assert_eq!(options[0].name, "hourly_cost");
                assert_eq!(options[0].values, vec![OptionValue::Double(10.5)]);
                assert_eq!(options[1].values[0].value_type(), ValueType::Int);
            }
            other => panic!("expected init, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_bare_control_requests() {
        let info: Request = serde_json::from_str(r#"{"type":"info"}"#).unwrap();
        assert_eq!(info, Request::Info);

        let stop: Request = serde_json::from_str(r#"{"type":"stop"}"#).unwrap();
        assert_eq!(stop.kind(), "stop");

        let begin: Request =
            serde_json::from_str(r#"{"type":"begin_batch","name":"cpu"}"#).unwrap();
        assert_eq!(begin.kind(), "begin_batch");

        let end: Request = serde_json::from_str(r#"{"type":"end_batch"}"#).unwrap();
        assert_eq!(end.kind(), "end_batch");
    }

    #[test]
    fn test_unknown_request_type_is_rejected() {
        let result = serde_json::from_str::<Request>(r#"{"type":"flush"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_encode_responses_are_tagged() {
        let init = serde_json::to_value(Response::Init {
            success: false,
            error: " must supply".to_string(),
        })
        .unwrap();
        assert_eq!(
            init,
            serde_json::json!({"type": "init", "success": false, "error": " must supply"})
        );

        let error = serde_json::to_value(Response::error("batching not supported")).unwrap();
        assert_eq!(
            error,
            serde_json::json!({"type": "error", "error": "batching not supported"})
        );

        let snapshot = serde_json::to_value(Response::Snapshot { snapshot: vec![] }).unwrap();
        assert_eq!(snapshot, serde_json::json!({"type": "snapshot", "snapshot": []}));
    }

    #[test]
    fn test_value_type_display() {
        assert_eq!(ValueType::Double.to_string(), "double");
        assert_eq!(OptionValue::Duration(5).value_type().to_string(), "duration");
    }
}
