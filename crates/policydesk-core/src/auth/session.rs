use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::AuthResponse;

/// Prefix some backend builds put in front of role names.
const ROLE_PREFIX: &str = "ROLE_";

/// Permission tier governing which views a user may open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Role {
    Customer,
    Agent,
    Admin,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Customer, Role::Agent, Role::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "CUSTOMER",
            Role::Agent => "AGENT",
            Role::Admin => "ADMIN",
        }
    }

    /// Whether a role string from the backend denotes this role.
    pub fn matches(&self, raw: &str) -> bool {
        role_matches(raw, self.as_str())
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        let bare = upper.strip_prefix(ROLE_PREFIX).unwrap_or(&upper);
        Role::ALL
            .into_iter()
            .find(|r| r.as_str() == bare)
            .ok_or_else(|| format!("unknown role: {}", s))
    }
}

/// Check a stored role string against a wanted role name.
///
/// The backend emits both `ADMIN` and `ROLE_ADMIN`, so a match is the exact
/// string, the prefixed wanted name, or the stored string with its prefix
/// stripped.
pub fn role_matches(raw: &str, wanted: &str) -> bool {
    raw == wanted
        || raw.strip_prefix(ROLE_PREFIX) == Some(wanted)
        || wanted.strip_prefix(ROLE_PREFIX) == Some(raw)
}

/// Identity half of the session, stored as one serialized blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdentity {
    pub id: i64,
    pub email: String,
    pub full_name: String,
    #[serde(default)]
    pub roles: BTreeSet<String>,
}

impl UserIdentity {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| role_matches(r, role))
    }

    /// Roles this user holds, ignoring strings the client does not know.
    pub fn known_roles(&self) -> BTreeSet<Role> {
        self.roles.iter().filter_map(|r| r.parse().ok()).collect()
    }
}

/// A signed-in user: both tokens plus identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub user: UserIdentity,
}

impl From<AuthResponse> for Session {
    fn from(auth: AuthResponse) -> Self {
        Self {
            access_token: auth.access_token,
            refresh_token: auth.refresh_token,
            user: UserIdentity {
                id: auth.user_id,
                email: auth.email,
                full_name: auth.full_name,
                roles: auth.roles,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_with(roles: &[&str]) -> UserIdentity {
        UserIdentity {
            id: 7,
            email: "pat@example.com".to_string(),
            full_name: "Pat Doe".to_string(),
            roles: roles.iter().map(|r| r.to_string()).collect(),
        }
    }

    #[test]
    fn test_role_matches_both_conventions() {
        assert!(role_matches("ADMIN", "ADMIN"));
        assert!(role_matches("ROLE_ADMIN", "ADMIN"));
        assert!(role_matches("ADMIN", "ROLE_ADMIN"));
        assert!(!role_matches("AGENT", "ADMIN"));
        assert!(!role_matches("ROLE_AGENT", "ADMIN"));
        assert!(!role_matches("ADMINISTRATOR", "ADMIN"));
    }

    #[test]
    fn test_has_role() {
        assert!(user_with(&["ROLE_ADMIN"]).has_role("ADMIN"));
        assert!(user_with(&["ADMIN", "AGENT"]).has_role("AGENT"));
        assert!(!user_with(&["CUSTOMER"]).has_role("ADMIN"));
        assert!(!user_with(&[]).has_role("CUSTOMER"));
    }

    #[test]
    fn test_role_from_str() {
        assert_eq!("ROLE_AGENT".parse::<Role>(), Ok(Role::Agent));
        assert_eq!("customer".parse::<Role>(), Ok(Role::Customer));
        assert!("SUPERVISOR".parse::<Role>().is_err());
    }

    #[test]
    fn test_known_roles_skips_unknown() {
        let user = user_with(&["ROLE_ADMIN", "AUDITOR", "CUSTOMER"]);
        let roles: Vec<Role> = user.known_roles().into_iter().collect();
        assert_eq!(roles, vec![Role::Customer, Role::Admin]);
    }

    #[test]
    fn test_identity_blob_format() {
        let json = serde_json::to_value(user_with(&["CUSTOMER"])).unwrap();
        assert_eq!(json["fullName"], "Pat Doe");
        assert_eq!(json["roles"][0], "CUSTOMER");
    }
}
