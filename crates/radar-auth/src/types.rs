//! Wire types for the auth endpoint group
//!
//! Field names follow the backend's camelCase JSON contracts.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
}

/// Response shape shared by login, register and refresh. Refresh may omit
/// the user; the cookie-only deployment omits the access token entirely.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub access_token: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub device_id: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub device_id: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest<'a> {
    pub device_id: &'a str,
}

/// Error body returned by the backend. Older endpoints use `error`, newer
/// ones `message`; both are accepted.
#[derive(Debug, Default, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ApiErrorBody {
    pub fn server_message(&self) -> Option<&str> {
        self.message.as_deref().or(self.error.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_response_parses_camel_case() {
        let full: AuthResponse = serde_json::from_str(
            r#"{"user":{"id":"u1","email":"a@b.c","name":"Ada"},"accessToken":"tok"}"#,
        )
        .unwrap();
        assert_eq!(full.user.unwrap().name, "Ada");
        assert_eq!(full.access_token.as_deref(), Some("tok"));

        let cookie_only: AuthResponse =
            serde_json::from_str(r#"{"user":{"id":"u1","email":"a@b.c","name":"Ada"}}"#).unwrap();
        assert!(cookie_only.access_token.is_none());

        let empty: AuthResponse = serde_json::from_str("{}").unwrap();
        assert!(empty.user.is_none());
        assert!(empty.access_token.is_none());
    }

    #[test]
    fn test_login_request_serializes_device_id() {
        let body = serde_json::to_value(LoginRequest {
            email: "a@b.c",
            password: "secret",
            device_id: "device-1",
        })
        .unwrap();
        assert_eq!(body["deviceId"], "device-1");
    }

    #[test]
    fn test_error_body_prefers_message() {
        let both: ApiErrorBody =
            serde_json::from_str(r#"{"error":"Invalid credentials","message":"Bad login"}"#)
                .unwrap();
        assert_eq!(both.server_message(), Some("Bad login"));

        let legacy: ApiErrorBody = serde_json::from_str(r#"{"error":"Invalid credentials"}"#).unwrap();
        assert_eq!(legacy.server_message(), Some("Invalid credentials"));

        let empty: ApiErrorBody = serde_json::from_str("{}").unwrap();
        assert_eq!(empty.server_message(), None);
    }
}
