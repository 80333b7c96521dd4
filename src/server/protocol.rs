//! Line-delimited JSON-RPC 2.0 envelopes

use rmcp::model::{ErrorCode, ErrorData};
use serde::Serialize;
use serde_json::Value;

pub const JSONRPC_VERSION: &str = "2.0";

/// A decoded request line
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    /// Echoed back verbatim; absent ids answer as `null`
    pub id: Value,
    /// `None` when missing or not a string
    pub method: Option<String>,
    pub params: Value,
}

impl Request {
    /// Accept any JSON object; only a non-object is rejected
    pub fn from_value(value: Value) -> Result<Self, ErrorData> {
        let Value::Object(mut obj) = value else {
            return Err(internal_error("request must be a JSON object"));
        };
        Ok(Self {
            id: obj.remove("id").unwrap_or(Value::Null),
            method: obj
                .remove("method")
                .and_then(|m| m.as_str().map(str::to_string)),
            params: obj.remove("params").unwrap_or(Value::Null),
        })
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Body {
    Result(Value),
    Error(ErrorData),
}

/// One response line
#[derive(Debug, Clone, Serialize)]
pub struct Response {
    pub jsonrpc: &'static str,
    pub id: Value,
    #[serde(flatten)]
    pub body: Body,
}

impl Response {
    pub fn result(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            body: Body::Result(result),
        }
    }

    pub fn error(id: Value, error: ErrorData) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            body: Body::Error(error),
        }
    }
}

pub fn parse_error() -> ErrorData {
    ErrorData::new(ErrorCode::PARSE_ERROR, "Parse error", None)
}

pub fn method_not_found() -> ErrorData {
    ErrorData::new(ErrorCode::METHOD_NOT_FOUND, "Method not found", None)
}

pub fn internal_error(message: impl std::fmt::Display) -> ErrorData {
    ErrorData::new(
        ErrorCode::INTERNAL_ERROR,
        format!("Internal error: {}", message),
        None,
    )
}
