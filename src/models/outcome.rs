use serde::Serialize;
use serde_json::Value;

use crate::error::ChartError;

/// Diagnostic details attached to a failed operation
#[derive(Debug, Clone, Serialize)]
pub struct DebugInfo {
    pub error_message: String,
    pub error_type: String,
    pub stack_trace: String,
}

/// Uniform `{success, data}` / `{success:false, error, debug_info}` result of a tool
#[derive(Debug, Clone, Serialize)]
pub struct Outcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug_info: Option<DebugInfo>,
}

impl Outcome {
    pub fn ok(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            debug_info: None,
        }
    }

    pub fn failure(error: &ChartError) -> Self {
        let mut message = error.to_string();
        if message.trim().is_empty() {
            message = "unknown error".to_string();
        }
        Self {
            success: false,
            data: None,
            error: Some(message.clone()),
            debug_info: Some(DebugInfo {
                error_message: message,
                error_type: error.kind().to_string(),
                stack_trace: error.trace(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_shape() {
        let value = serde_json::to_value(Outcome::ok(json!({"x": 1}))).unwrap();
        assert_eq!(value, json!({"success": true, "data": {"x": 1}}));
    }

    #[test]
    fn test_failure_shape() {
        let err = ChartError::InvalidTimezone("Mars/Olympus".to_string());
        let value = serde_json::to_value(Outcome::failure(&err)).unwrap();
        assert_eq!(value["success"], json!(false));
        assert_eq!(value["error"], json!("invalid timezone 'Mars/Olympus'"));
        assert_eq!(value["debug_info"]["error_type"], json!("InvalidTimezone"));
        assert!(value.get("data").is_none());
    }

    #[test]
    fn test_empty_message_falls_back() {
        let err = ChartError::Panic(String::new());
        let outcome = Outcome::failure(&err);
        assert_eq!(outcome.error.as_deref(), Some("unknown error"));
    }
}
