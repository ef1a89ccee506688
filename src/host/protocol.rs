//! JSON-RPC 2.0 protocol types for panel <-> host communication

use serde::{Deserialize, Serialize};

/// JSON-RPC 2.0 Request
#[derive(Debug, Serialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
}

impl JsonRpcRequest {
    pub fn new(id: u64, method: &'static str, params: Option<serde_json::Value>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            method,
            params,
        }
    }
}

/// JSON-RPC 2.0 Response
#[derive(Debug, Deserialize)]
pub struct JsonRpcResponse {
    #[allow(dead_code)]
    pub jsonrpc: String,
    pub id: u64,
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<JsonRpcError>,
}

/// JSON-RPC 2.0 Error
#[derive(Debug, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(default)]
    #[allow(dead_code)]
    pub data: Option<serde_json::Value>,
}

// Request parameter types

#[derive(Debug, Serialize)]
pub struct SetLanguageParams<'a> {
    pub code: &'a str,
}

#[derive(Debug, Serialize)]
pub struct AddTimerParams<'a> {
    pub key: &'a str,
    pub interval: &'a str,
}

#[derive(Debug, Serialize)]
pub struct TimerKeyParams<'a> {
    pub key: &'a str,
}

/// Error codes the host uses
pub mod error_codes {
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const TIMER_NOT_FOUND: i32 = -32001;
    pub const DUPLICATE_KEY: i32 = -32002;
    pub const HOST_FAILURE: i32 = -32000;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_omits_missing_params() {
        let request = JsonRpcRequest::new(7, "get_timers", None);
        let json = serde_json::to_string(&request).unwrap();
        assert_eq!(json, r#"{"jsonrpc":"2.0","id":7,"method":"get_timers"}"#);
    }

    #[test]
    fn test_request_with_params() {
        let params = serde_json::to_value(AddTimerParams { key: "f5", interval: "1000" }).unwrap();
        let request = JsonRpcRequest::new(1, "add_timer", Some(params));
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["params"]["key"], "f5");
        assert_eq!(value["params"]["interval"], "1000");
    }

    #[test]
    fn test_error_response_parses() {
        let response: JsonRpcResponse = serde_json::from_str(
            r#"{"jsonrpc":"2.0","id":3,"error":{"code":-32001,"message":"no such timer"}}"#,
        )
        .unwrap();
        assert!(response.result.is_none());
        let error = response.error.unwrap();
        assert_eq!(error.code, error_codes::TIMER_NOT_FOUND);
        assert_eq!(error.message, "no such timer");
    }
}
