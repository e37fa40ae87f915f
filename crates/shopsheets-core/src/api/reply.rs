//! Reply shapes returned by the Apps Script handlers.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::ApiError;

/// `{success, message|error, ...}` plus whatever fields the script echoes
/// back (`combinedId`, `masterOrderId`, `row`, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScriptReply {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ScriptReply {
    /// Scripts that omit `success` are treated as successful.
    pub fn is_success(&self) -> bool {
        self.success != Some(false)
    }

    pub fn failure_message(&self) -> String {
        self.error
            .clone()
            .or_else(|| self.message.clone())
            .unwrap_or_else(|| "Unknown error".to_string())
    }

    pub fn into_result(self) -> Result<Self, ApiError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(ApiError::Rejected(self.failure_message()))
        }
    }

    pub fn extra_str(&self, key: &str) -> Option<&str> {
        self.extra.get(key).and_then(|v| v.as_str())
    }
}

/// Result of a save whose reply may not be readable JSON.
#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    /// The script answered with a success reply.
    Saved(ScriptReply),
    /// HTTP status was OK but the body was not JSON; the row is assumed written.
    AssumedSaved { raw: String },
    /// The script reported its own JSON parse failure after writing the row.
    LikelySaved { error: String },
}

impl SaveOutcome {
    pub fn reply(&self) -> Option<&ScriptReply> {
        match self {
            SaveOutcome::Saved(reply) => Some(reply),
            _ => None,
        }
    }

    pub fn message(&self) -> String {
        match self {
            SaveOutcome::Saved(reply) => reply
                .message
                .clone()
                .unwrap_or_else(|| "Saved successfully".to_string()),
            SaveOutcome::AssumedSaved { .. } => {
                "Saved (server returned a non-JSON reply)".to_string()
            }
            SaveOutcome::LikelySaved { .. } => {
                "Likely saved, but the server returned a parse error. Please verify the sheet."
                    .to_string()
            }
        }
    }
}

/// List replies come either wrapped or as a bare array.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ListReply<T> {
    Bare(Vec<T>),
    Wrapped {
        #[serde(default)]
        success: Option<bool>,
        #[serde(default = "Vec::new")]
        data: Vec<T>,
        #[serde(default)]
        error: Option<String>,
        #[serde(default)]
        message: Option<String>,
    },
}

impl<T: DeserializeOwned> ListReply<T> {
    pub fn into_items(self) -> Result<Vec<T>, ApiError> {
        match self {
            ListReply::Bare(items) => Ok(items),
            ListReply::Wrapped { success: Some(false), error, message, .. } => Err(
                ApiError::Rejected(error.or(message).unwrap_or_else(|| "Unknown error".to_string())),
            ),
            ListReply::Wrapped { data, .. } => Ok(data),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_keeps_echo_fields() {
        let json = r#"{"success": true, "combinedId": "C-CMB1", "row": 12, "message": "ok"}"#;
        let reply: ScriptReply = serde_json::from_str(json).unwrap();
        assert!(reply.is_success());
        assert_eq!(reply.extra_str("combinedId"), Some("C-CMB1"));
        assert_eq!(reply.extra.get("row").and_then(|v| v.as_u64()), Some(12));
    }

    #[test]
    fn test_failed_reply_prefers_error_text() {
        let reply: ScriptReply =
            serde_json::from_str(r#"{"success": false, "error": "Customer name is required", "message": "Please provide"}"#)
                .unwrap();
        let err = reply.into_result().unwrap_err();
        assert!(matches!(err, ApiError::Rejected(m) if m == "Customer name is required"));

        let bare: ScriptReply = serde_json::from_str(r#"{"success": false}"#).unwrap();
        assert_eq!(bare.failure_message(), "Unknown error");
    }

    #[test]
    fn test_list_reply_shapes() {
        let bare: ListReply<String> = serde_json::from_str(r#"["Asha", "Ravi"]"#).unwrap();
        assert_eq!(bare.into_items().unwrap(), vec!["Asha", "Ravi"]);

        let wrapped: ListReply<String> =
            serde_json::from_str(r#"{"success": true, "data": ["Asha"]}"#).unwrap();
        assert_eq!(wrapped.into_items().unwrap(), vec!["Asha"]);

        let failed: ListReply<String> =
            serde_json::from_str(r#"{"success": false, "error": "Sheet missing"}"#).unwrap();
        assert!(failed.into_items().is_err());
    }
}
