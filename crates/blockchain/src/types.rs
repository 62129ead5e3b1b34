use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `balanceOf(address)` function selector.
pub const BALANCE_OF_SELECTOR: &str = "0x70a08231";

/// A single JSON-RPC 2.0 call inside a batch
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: &'static str,
    pub params: Value,
}

/// Error object returned by a node for one call
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
}

/// One entry of a batch response
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcResponse {
    #[serde(default)]
    pub id: Value,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    /// Numeric id, accepting both `7` and `"7"` as some nodes echo ids as strings.
    pub fn numeric_id(&self) -> Option<u64> {
        match &self.id {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }
}

/// Calldata for `balanceOf(owner)`: selector plus the owner left-padded to 32 bytes.
pub fn balance_of_calldata(owner: &str) -> String {
    let owner = owner.trim_start_matches("0x").trim_start_matches("0X");
    format!("{}{:0>64}", BALANCE_OF_SELECTOR, owner.to_lowercase())
}
