use serde::{Deserialize, Serialize};

/// Response envelope returned by every API endpoint.
///
/// Failures are reported in-band with `status: false` rather than through
/// the HTTP status code, so the UI can always render `message`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Status {
    pub status: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl Status {
    pub fn success(message: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            status: true,
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            status: false,
            message: message.into(),
            data: None,
        }
    }

    /// Success carrying any serializable payload; a payload that cannot be
    /// serialized turns the envelope into a failure.
    pub fn with_data<T: Serialize>(message: impl Into<String>, data: &T) -> Self {
        match serde_json::to_value(data) {
            Ok(value) => Self::success(message, value),
            Err(e) => Self::failure(format!("Error occurred while encoding response: {e}")),
        }
    }
}

/// Health check payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn failure_omits_data() {
        let value = serde_json::to_value(Status::failure("nope")).unwrap();
        assert_eq!(value, json!({"status": false, "message": "nope"}));
    }

    #[test]
    fn with_data_wraps_payload() {
        let status = Status::with_data("ok", &vec![1, 2, 3]);
        assert!(status.status);
        assert_eq!(status.data, Some(json!([1, 2, 3])));
    }
}
