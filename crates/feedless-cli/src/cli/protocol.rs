use feedless_core::constants::RESPONSE_SCHEMA_VERSION;
use feedless_core::{QueryError, QueryResult};
use serde::{Deserialize, Serialize};

pub const BAD_REQUEST: &str = "bad_request";

/// Versioned envelope for every HTTP and CLI response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse {
    pub schema_version: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub code: String,
    pub message: String,
}

impl ApiResponse {
    pub fn success(data: serde_json::Value) -> Self {
        Self {
            schema_version: RESPONSE_SCHEMA_VERSION,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(code: &str, message: &str) -> Self {
        Self {
            schema_version: RESPONSE_SCHEMA_VERSION,
            data: None,
            error: Some(ErrorInfo {
                code: code.to_string(),
                message: message.to_string(),
            }),
        }
    }

    pub fn bad_request(message: &str) -> Self {
        Self::error(BAD_REQUEST, message)
    }

    pub fn from_error(err: &QueryError) -> Self {
        Self::error(err.code(), &err.to_string())
    }

    pub fn from_result<T: Serialize>(result: QueryResult<T>) -> Self {
        match result.and_then(|data| serde_json::to_value(data).map_err(QueryError::from)) {
            Ok(data) => Self::success(data),
            Err(err) => Self::from_error(&err),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    pub fn error_code(&self) -> Option<&str> {
        self.error.as_ref().map(|e| e.code.as_str())
    }
}
