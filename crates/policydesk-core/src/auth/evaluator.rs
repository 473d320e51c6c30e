//! Synchronous answers about the stored session.
//!
//! The evaluator never talks to the network. An expired access token is
//! reported as unauthenticated even when the refresh token is still good;
//! refreshing is the request pipeline's job and only happens after a call
//! is rejected.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use super::claims::decode_claims;
use super::session::{Role, UserIdentity};
use super::store::TokenStore;
use crate::routes::View;

#[derive(Clone)]
pub struct SessionEvaluator {
    store: Arc<TokenStore>,
}

impl SessionEvaluator {
    pub fn new(store: Arc<TokenStore>) -> Self {
        Self { store }
    }

    pub fn is_authenticated(&self) -> bool {
        self.is_authenticated_at(Utc::now())
    }

    /// A session is present and its access token expires after `now`.
    pub fn is_authenticated_at(&self, now: DateTime<Utc>) -> bool {
        let Some(session) = self.store.read() else {
            return false;
        };
        match decode_claims(&session.access_token) {
            Ok(claims) => claims.is_live_at(now),
            Err(e) => {
                debug!(error = %e, "Stored access token could not be decoded");
                false
            }
        }
    }

    /// Role check accepting both `ADMIN` and `ROLE_ADMIN` conventions.
    pub fn has_role(&self, role: &str) -> bool {
        self.store
            .user()
            .map(|user| user.has_role(role))
            .unwrap_or(false)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Admin.as_str())
    }

    pub fn is_agent(&self) -> bool {
        self.has_role(Role::Agent.as_str())
    }

    pub fn is_customer(&self) -> bool {
        self.has_role(Role::Customer.as_str())
    }

    pub fn user(&self) -> Option<UserIdentity> {
        self.store.user()
    }

    /// Dashboard for the generic `/dashboard` route: admin, then agent, then customer.
    pub fn default_dashboard(&self) -> View {
        if self.is_admin() {
            View::AdminDashboard
        } else if self.is_agent() {
            View::AgentDashboard
        } else {
            View::CustomerDashboard
        }
    }
}
