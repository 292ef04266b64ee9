//! REST response envelope shared by every exchange endpoint.

use serde::{Deserialize, Deserializer};

/// Application-level success code.
pub const SUCCESS_CODE: &str = "0";

/// `{code, msg, data}` envelope returned by the exchange.
///
/// `data` is left optional so a missing payload is reported by the caller
/// as a malformed response rather than a serde error deep in the body.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    #[serde(deserialize_with = "code_as_string")]
    pub code: String,
    #[serde(default)]
    pub msg: String,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn is_success(&self) -> bool {
        self.code == SUCCESS_CODE
    }
}

/// Accept the code as either a JSON string or a number.
pub(crate) fn code_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "code must be a string or number, got {other}"
        ))),
    }
}

/// Same as [`code_as_string`] for optional per-item codes.
pub fn optional_code_as_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    match value {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) => Ok(Some(s)),
        Some(serde_json::Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "code must be a string or number, got {other}"
        ))),
    }
}
