use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Login credentials. Only ever sent, never stored.
#[derive(Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Requested role; the backend defaults to CUSTOMER.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("email", &self.email)
            .field("full_name", &self.full_name)
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}

/// Response of login and registration.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user_id: i64,
    pub email: String,
    pub full_name: String,
    #[serde(default)]
    pub roles: BTreeSet<String>,
}

/// Response of the refresh exchange. The backend may or may not rotate
/// the refresh token.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_auth_response() {
        let json = r#"{"accessToken":"a","refreshToken":"r","userId":3,"email":"x@y.z","fullName":"X Y","roles":["ROLE_CUSTOMER"]}"#;
        let auth: AuthResponse = serde_json::from_str(json).unwrap();
        assert_eq!(auth.user_id, 3);
        assert!(auth.roles.contains("ROLE_CUSTOMER"));
    }

    #[test]
    fn test_refresh_response_without_rotation() {
        let resp: RefreshResponse = serde_json::from_str(r#"{"accessToken":"new"}"#).unwrap();
        assert_eq!(resp.access_token, "new");
        assert!(resp.refresh_token.is_none());
    }

    #[test]
    fn test_debug_redacts_password() {
        let creds = Credentials {
            email: "a@b.c".to_string(),
            password: "hunter2".to_string(),
        };
        assert!(!format!("{:?}", creds).contains("hunter2"));
    }
}
