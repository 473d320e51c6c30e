//! Route table and role-gated route guard.
//!
//! The guard decides, before a protected view is shown, whether to admit it
//! or redirect:
//!
//! 1. not authenticated: redirect to `/login`
//! 2. admin required but not admin: redirect to `/dashboard`
//! 3. agent required but not agent: redirect to `/dashboard`
//! 4. otherwise admit
//!
//! The admin and agent checks are independent. An admin opening an
//! agent-only route is redirected like anyone else without the agent role.

use std::fmt;
use std::sync::Arc;

use tracing::info;

use crate::auth::SessionEvaluator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Root,
    Landing,
    Login,
    Register,
    ForgotPassword,
    ResetPassword,
    VerifyEmail,
    Dashboard,
    Appointments,
    BookAppointment,
    Agents,
    AiAssistant,
    AgentDashboard,
    AdminDashboard,
}

/// Role requirements of a protected route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Requirement {
    pub require_admin: bool,
    pub require_agent: bool,
}

impl Requirement {
    pub const AUTHENTICATED: Requirement = Requirement {
        require_admin: false,
        require_agent: false,
    };
    pub const ADMIN: Requirement = Requirement {
        require_admin: true,
        require_agent: false,
    };
    pub const AGENT: Requirement = Requirement {
        require_admin: false,
        require_agent: true,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    Protected(Requirement),
}

impl Route {
    pub const ALL: [Route; 14] = [
        Route::Root,
        Route::Landing,
        Route::Login,
        Route::Register,
        Route::ForgotPassword,
        Route::ResetPassword,
        Route::VerifyEmail,
        Route::Dashboard,
        Route::Appointments,
        Route::BookAppointment,
        Route::Agents,
        Route::AiAssistant,
        Route::AgentDashboard,
        Route::AdminDashboard,
    ];

    pub fn path(&self) -> &'static str {
        match self {
            Route::Root => "/",
            Route::Landing => "/landing",
            Route::Login => "/login",
            Route::Register => "/register",
            Route::ForgotPassword => "/forgot-password",
            Route::ResetPassword => "/reset-password",
            Route::VerifyEmail => "/verify-email",
            Route::Dashboard => "/dashboard",
            Route::Appointments => "/appointments",
            Route::BookAppointment => "/book-appointment",
            Route::Agents => "/agents",
            Route::AiAssistant => "/ai-assistant",
            Route::AgentDashboard => "/agent-dashboard",
            Route::AdminDashboard => "/admin-dashboard",
        }
    }

    /// Match a path, ignoring any query string and trailing slash.
    pub fn from_path(path: &str) -> Option<Route> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let trimmed = path.trim_end_matches('/');
        let normalized = if trimmed.is_empty() { "/" } else { trimmed };
        Route::ALL.into_iter().find(|r| r.path() == normalized)
    }

    pub fn access(&self) -> Access {
        match self {
            Route::Root
            | Route::Landing
            | Route::Login
            | Route::Register
            | Route::ForgotPassword
            | Route::ResetPassword
            | Route::VerifyEmail => Access::Public,
            Route::Dashboard
            | Route::Appointments
            | Route::BookAppointment
            | Route::Agents
            | Route::AiAssistant => Access::Protected(Requirement::AUTHENTICATED),
            Route::AgentDashboard => Access::Protected(Requirement::AGENT),
            Route::AdminDashboard => Access::Protected(Requirement::ADMIN),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// What ends up on screen once a route is admitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Landing,
    Login,
    Register,
    ForgotPassword,
    ResetPassword,
    VerifyEmail,
    CustomerDashboard,
    AgentDashboard,
    AdminDashboard,
    Appointments,
    BookAppointment,
    Agents,
    AiAssistant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Admit(View),
    Redirect(Route),
}

/// Performs client-side navigation.
pub trait Navigator: Send + Sync {
    fn navigate(&self, to: Route);
}

#[derive(Clone)]
pub struct RouteGuard {
    evaluator: SessionEvaluator,
    navigator: Option<Arc<dyn Navigator>>,
}

impl RouteGuard {
    pub fn new(evaluator: SessionEvaluator, navigator: Option<Arc<dyn Navigator>>) -> Self {
        Self {
            evaluator,
            navigator,
        }
    }

    /// Apply the guard contract. `Err` carries the redirect target.
    pub fn check(&self, requirement: Requirement) -> Result<(), Route> {
        if !self.evaluator.is_authenticated() {
            info!("User not authenticated, redirecting to login");
            return Err(Route::Login);
        }
        if requirement.require_admin && !self.evaluator.is_admin() {
            info!("Admin required but user is not admin, redirecting to dashboard");
            return Err(Route::Dashboard);
        }
        if requirement.require_agent && !self.evaluator.is_agent() {
            info!("Agent required but user is not agent, redirecting to dashboard");
            return Err(Route::Dashboard);
        }
        Ok(())
    }

    /// Decide what `route` shows without navigating.
    pub fn resolve(&self, route: Route) -> GuardDecision {
        if let Access::Protected(requirement) = route.access() {
            if let Err(target) = self.check(requirement) {
                return GuardDecision::Redirect(target);
            }
        }

        let view = match route {
            Route::Root => {
                if self.evaluator.is_authenticated() {
                    return GuardDecision::Redirect(Route::Dashboard);
                }
                View::Landing
            }
            Route::Landing => View::Landing,
            Route::Login => View::Login,
            Route::Register => View::Register,
            Route::ForgotPassword => View::ForgotPassword,
            Route::ResetPassword => View::ResetPassword,
            Route::VerifyEmail => View::VerifyEmail,
            Route::Dashboard => self.evaluator.default_dashboard(),
            Route::Appointments => View::Appointments,
            Route::BookAppointment => View::BookAppointment,
            Route::Agents => View::Agents,
            Route::AiAssistant => View::AiAssistant,
            Route::AgentDashboard => View::AgentDashboard,
            Route::AdminDashboard => View::AdminDashboard,
        };
        GuardDecision::Admit(view)
    }

    /// Resolve `route` and hand any redirect to the navigator.
    pub fn navigate_to(&self, route: Route) -> GuardDecision {
        let decision = self.resolve(route);
        if let (GuardDecision::Redirect(target), Some(navigator)) = (decision, &self.navigator) {
            navigator.navigate(target);
        }
        decision
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::sync::Mutex;

    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
    use chrono::{Duration, Utc};

    use super::*;
    use crate::auth::{Session, TokenStore, UserIdentity};

    #[derive(Default)]
    struct RecordingNavigator {
        visited: Mutex<Vec<Route>>,
    }

    impl Navigator for RecordingNavigator {
        fn navigate(&self, to: Route) {
            self.visited.lock().unwrap().push(to);
        }
    }

    fn token(offset: Duration) -> String {
        let exp = (Utc::now() + offset).timestamp();
        format!(
            "{}.{}.sig",
            URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256"}"#),
            URL_SAFE_NO_PAD.encode(format!(r#"{{"exp":{}}}"#, exp))
        )
    }

    fn guard_for(session: Option<(Duration, &[&str])>) -> RouteGuard {
        let store = Arc::new(TokenStore::in_memory());
        if let Some((offset, roles)) = session {
            store.save(&Session {
                access_token: token(offset),
                refresh_token: "r".to_string(),
                user: UserIdentity {
                    id: 9,
                    email: "g@example.com".to_string(),
                    full_name: "G".to_string(),
                    roles: roles.iter().map(|r| r.to_string()).collect::<BTreeSet<_>>(),
                },
            });
        }
        RouteGuard::new(SessionEvaluator::new(store), None)
    }

    fn live(roles: &[&str]) -> RouteGuard {
        guard_for(Some((Duration::hours(1), roles)))
    }

    #[test]
    fn test_unauthenticated_admin_route_goes_to_login() {
        let guard = guard_for(None);
        assert_eq!(guard.check(Requirement::ADMIN), Err(Route::Login));
        assert_eq!(
            guard.resolve(Route::AdminDashboard),
            GuardDecision::Redirect(Route::Login)
        );
    }

    #[test]
    fn test_expired_session_goes_to_login() {
        let roles: &[&str] = &["ADMIN"];
        let guard = guard_for(Some((Duration::hours(-1), roles)));
        assert_eq!(
            guard.resolve(Route::Appointments),
            GuardDecision::Redirect(Route::Login)
        );
    }

    #[test]
    fn test_agent_on_admin_route_goes_to_dashboard() {
        assert_eq!(
            live(&["AGENT"]).resolve(Route::AdminDashboard),
            GuardDecision::Redirect(Route::Dashboard)
        );
    }

    #[test]
    fn test_admin_is_not_implicitly_agent() {
        assert_eq!(
            live(&["ADMIN"]).resolve(Route::AgentDashboard),
            GuardDecision::Redirect(Route::Dashboard)
        );
        assert_eq!(
            live(&["ROLE_AGENT"]).resolve(Route::AgentDashboard),
            GuardDecision::Admit(View::AgentDashboard)
        );
    }

    #[test]
    fn test_dashboard_precedence() {
        assert_eq!(
            live(&["ADMIN", "AGENT"]).resolve(Route::Dashboard),
            GuardDecision::Admit(View::AdminDashboard)
        );
        assert_eq!(
            live(&["AGENT", "CUSTOMER"]).resolve(Route::Dashboard),
            GuardDecision::Admit(View::AgentDashboard)
        );
        assert_eq!(
            live(&["CUSTOMER"]).resolve(Route::Dashboard),
            GuardDecision::Admit(View::CustomerDashboard)
        );
    }

    #[test]
    fn test_root_and_public_routes() {
        assert_eq!(
            guard_for(None).resolve(Route::Root),
            GuardDecision::Admit(View::Landing)
        );
        assert_eq!(
            live(&["CUSTOMER"]).resolve(Route::Root),
            GuardDecision::Redirect(Route::Dashboard)
        );
        assert_eq!(
            guard_for(None).resolve(Route::ResetPassword),
            GuardDecision::Admit(View::ResetPassword)
        );
    }

    #[test]
    fn test_navigate_to_calls_navigator_on_redirect_only() {
        let navigator = Arc::new(RecordingNavigator::default());
        let guard = RouteGuard::new(
            guard_for(None).evaluator.clone(),
            Some(navigator.clone() as Arc<dyn Navigator>),
        );
        guard.navigate_to(Route::Login);
        guard.navigate_to(Route::Agents);
        assert_eq!(*navigator.visited.lock().unwrap(), vec![Route::Login]);
    }

    #[test]
    fn test_from_path() {
        assert_eq!(Route::from_path("/"), Some(Route::Root));
        assert_eq!(Route::from_path(""), Some(Route::Root));
        assert_eq!(Route::from_path("/agents/"), Some(Route::Agents));
        assert_eq!(
            Route::from_path("/reset-password?token=abc"),
            Some(Route::ResetPassword)
        );
        assert_eq!(Route::from_path("/nowhere"), None);
        for route in Route::ALL {
            assert_eq!(Route::from_path(route.path()), Some(route));
        }
    }
}
