use serde::{Deserialize, Serialize};

/// `{statusCode, body}` returned by both functions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: String,
}

impl InvocationResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status_code: 200,
            body: body.into(),
        }
    }

    pub fn error(body: impl Into<String>) -> Self {
        Self {
            status_code: 500,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_with_status_code_field() {
        let json = serde_json::to_value(InvocationResponse::ok("done")).unwrap();
        assert_eq!(json, serde_json::json!({"statusCode": 200, "body": "done"}));
    }

    #[test]
    fn test_error_is_not_success() {
        let response = InvocationResponse::error("Log format error");
        assert_eq!(response.status_code, 500);
        assert!(!response.is_success());
    }
}
