//! Message shapes exchanged with the query worker
//!
//! Request:  `{ "id": 7, "type": "query", "payload": { "sql": ..., "params": [...] } }`
//! Response: `{ "id": 7, "result": { "columns": [...], "values": [[...]] } }`
//!       or  `{ "id": 7, "error": { "kind": "failed", "message": ... } }`
//!
//! The channels move these values as plain Rust data. The serde derives only
//! fix the JSON form shown above, which the tests check.

use rusqlite::types::{ToSql, ToSqlOutput, Value, ValueRef};
use serde::{Deserialize, Serialize};

use crate::error::LexiconError;

/// Correlation id type
pub type RequestId = u64;

/// A positional query parameter or result cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl Scalar {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Scalar::Integer(i) => Some(*i),
            _ => None,
        }
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::Text(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Scalar::Text(s)
    }
}

impl From<i64> for Scalar {
    fn from(i: i64) -> Self {
        Scalar::Integer(i)
    }
}

impl From<ValueRef<'_>> for Scalar {
    fn from(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => Scalar::Null,
            ValueRef::Integer(i) => Scalar::Integer(i),
            ValueRef::Real(f) => Scalar::Real(f),
            ValueRef::Text(t) => Scalar::Text(String::from_utf8_lossy(t).into_owned()),
            ValueRef::Blob(b) => Scalar::Blob(b.to_vec()),
        }
    }
}

impl ToSql for Scalar {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Scalar::Null => ToSqlOutput::Owned(Value::Null),
            Scalar::Integer(i) => ToSqlOutput::Owned(Value::Integer(*i)),
            Scalar::Real(f) => ToSqlOutput::Owned(Value::Real(*f)),
            Scalar::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            Scalar::Blob(b) => ToSqlOutput::Borrowed(ValueRef::Blob(b)),
        })
    }
}

/// Columnar result of one query; only produced when at least one row matched
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawResultSet {
    pub columns: Vec<String>,
    pub values: Vec<Vec<Scalar>>,
}

/// Request body, tagged by `type`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "lowercase")]
pub enum RequestKind {
    Init {
        #[serde(rename = "dbBytes")]
        dataset: Vec<u8>,
    },
    Query {
        sql: String,
        #[serde(default)]
        params: Vec<Scalar>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerRequest {
    pub id: RequestId,
    #[serde(flatten)]
    pub kind: RequestKind,
}

/// Why the worker could not serve a request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum WorkerFault {
    Uninitialized,
    AlreadyInitialized,
    Failed(String),
}

impl From<WorkerFault> for LexiconError {
    fn from(fault: WorkerFault) -> Self {
        match fault {
            WorkerFault::Uninitialized => LexiconError::Uninitialized,
            WorkerFault::AlreadyInitialized => {
                LexiconError::Worker("dataset already loaded in worker".to_string())
            }
            WorkerFault::Failed(message) => LexiconError::Worker(message),
        }
    }
}

impl From<rusqlite::Error> for WorkerFault {
    fn from(err: rusqlite::Error) -> Self {
        WorkerFault::Failed(err.to_string())
    }
}

impl From<std::io::Error> for WorkerFault {
    fn from(err: std::io::Error) -> Self {
        WorkerFault::Failed(err.to_string())
    }
}

/// `init` always succeeds with `Result(None)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Result(Option<RawResultSet>),
    Error(WorkerFault),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerResponse {
    pub id: RequestId,
    #[serde(flatten)]
    pub outcome: Outcome,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_request_shape() {
        let request = WorkerRequest {
            id: 3,
            kind: RequestKind::Query {
                sql: "SELECT form FROM words WHERE form = ?1".to_string(),
                params: vec![Scalar::from("куќа")],
            },
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({
                "id": 3,
                "type": "query",
                "payload": {
                    "sql": "SELECT form FROM words WHERE form = ?1",
                    "params": ["куќа"]
                }
            })
        );
    }

    #[test]
    fn test_response_shapes() {
        let ok = WorkerResponse {
            id: 1,
            outcome: Outcome::Result(None),
        };
        assert_eq!(serde_json::to_value(&ok).unwrap(), json!({"id": 1, "result": null}));

        let err = WorkerResponse {
            id: 2,
            outcome: Outcome::Error(WorkerFault::Failed("no such table: words".to_string())),
        };
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            json!({"id": 2, "error": {"kind": "failed", "message": "no such table: words"}})
        );
    }

    #[test]
    fn test_response_parses_back() {
        let raw = json!({
            "id": 9,
            "result": {"columns": ["cnt"], "values": [[42]]}
        });
        let response: WorkerResponse = serde_json::from_value(raw).unwrap();
        assert_eq!(response.id, 9);
        match response.outcome {
            Outcome::Result(Some(rows)) => {
                assert_eq!(rows.columns, vec!["cnt"]);
                assert_eq!(rows.values[0][0], Scalar::Integer(42));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_fault_maps_to_error() {
        assert_eq!(
            LexiconError::from(WorkerFault::Uninitialized),
            LexiconError::Uninitialized
        );
    }
}
