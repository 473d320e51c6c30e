//! API client for the appointment platform backend.
//!
//! `ApiClient` is the request pipeline: it attaches the stored access token
//! to each call, and when the backend answers 401 it obtains a fresh token
//! and replays the call exactly once. Token refreshes are single-flight:
//! the first 401 starts the exchange and every other 401 that arrives while
//! it runs awaits the same exchange and receives the same outcome.
//!
//! If the exchange fails, the session is cleared, the navigator (if any) is
//! sent to the login route, and every waiting caller gets
//! `ApiError::SessionTerminated`.

use std::sync::{Arc, Mutex, MutexGuard};

use futures::future::{BoxFuture, FutureExt, Shared};
use reqwest::StatusCode;
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info, warn};

use super::transport::{ApiRequest, HttpTransport, RawResponse, Transport};
use super::ApiError;
use crate::auth::{Session, TokenStore};
use crate::config::Config;
use crate::models::{AuthResponse, Credentials, RefreshResponse, RegisterRequest};
use crate::routes::{Navigator, Route};

// ============================================================================
// Constants
// ============================================================================

const LOGIN_PATH: &str = "/auth/login";
const REGISTER_PATH: &str = "/auth/register";
const REFRESH_PATH: &str = "/auth/refresh";
const LOGOUT_PATH: &str = "/auth/logout";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshTokenBody<'a> {
    refresh_token: &'a str,
}

#[derive(Debug, Clone)]
enum RefreshOutcome {
    Refreshed(String),
    Denied(String),
}

type RefreshHandle = Shared<BoxFuture<'static, RefreshOutcome>>;

enum FreshToken {
    /// A refresh already finished since the failed call was sent.
    Current(String),
    Pending(RefreshHandle),
}

struct Inner {
    transport: Arc<dyn Transport>,
    store: Arc<TokenStore>,
    navigator: Option<Arc<dyn Navigator>>,
    /// The in-flight refresh exchange, if any.
    refresh: Mutex<Option<RefreshHandle>>,
}

/// Request pipeline. Clone is cheap; clones share the store and the
/// in-flight refresh.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<Inner>,
}

impl ApiClient {
    pub fn new(
        transport: Arc<dyn Transport>,
        store: Arc<TokenStore>,
        navigator: Option<Arc<dyn Navigator>>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                transport,
                store,
                navigator,
                refresh: Mutex::new(None),
            }),
        }
    }

    /// Pipeline over HTTP using the configured base URL and timeout.
    pub fn from_config(
        config: &Config,
        store: Arc<TokenStore>,
        navigator: Option<Arc<dyn Navigator>>,
    ) -> Result<Self, ApiError> {
        let transport = HttpTransport::new(config.api_url.clone(), config.request_timeout())?;
        Ok(Self::new(Arc::new(transport), store, navigator))
    }

    pub fn store(&self) -> &Arc<TokenStore> {
        &self.inner.store
    }

    // ===== Pipeline =====

    /// Send a request, refreshing and replaying once on 401.
    pub async fn execute(&self, request: &ApiRequest) -> Result<RawResponse, ApiError> {
        let mut bearer = if request.public {
            None
        } else {
            self.inner.store.access_token()
        };
        let mut retried = false;

        loop {
            if bearer.is_some() {
                debug!(method = %request.method, path = %request.path, retried, "Sending with bearer token");
            }
            let response = self.inner.transport.send(request, bearer.as_deref()).await?;

            if response.status != StatusCode::UNAUTHORIZED || request.public {
                return Self::check_response(response);
            }
            if retried {
                warn!(path = %request.path, "Request rejected again after token refresh");
                return Self::check_response(response);
            }

            retried = true;
            debug!(path = %request.path, "Request unauthorized, obtaining fresh token");
            bearer = Some(self.fresh_token(bearer.as_deref()).await?);
        }
    }

    /// Send a request and parse its JSON body.
    pub async fn call<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        let response = self.execute(&request).await?;
        serde_json::from_str(&response.body).map_err(|e| {
            ApiError::InvalidResponse(format!(
                "Failed to parse JSON response from {}: {}",
                request.path, e
            ))
        })
    }

    /// Send a request whose response body is irrelevant.
    pub async fn call_empty(&self, request: ApiRequest) -> Result<(), ApiError> {
        self.execute(&request).await.map(|_| ())
    }

    /// Exchange the refresh token now, joining a refresh already in flight.
    pub async fn refresh_session(&self) -> Result<(), ApiError> {
        let current = self.inner.store.access_token();
        self.fresh_token(current.as_deref()).await.map(|_| ())
    }

    fn check_response(response: RawResponse) -> Result<RawResponse, ApiError> {
        if response.status.is_success() {
            Ok(response)
        } else {
            Err(ApiError::from_status(response.status, &response.body))
        }
    }

    /// A token to replay with, given the token the failed call carried.
    async fn fresh_token(&self, attached: Option<&str>) -> Result<String, ApiError> {
        let handle = match self.inner.begin_refresh(attached) {
            FreshToken::Current(token) => {
                debug!("Token already rotated, replaying without a new exchange");
                return Ok(token);
            }
            FreshToken::Pending(handle) => handle,
        };

        match handle.await {
            RefreshOutcome::Refreshed(token) => Ok(token),
            RefreshOutcome::Denied(reason) => Err(ApiError::SessionTerminated(reason)),
        }
    }

    // ===== Auth Endpoints =====

    /// Log in and store the resulting session.
    pub async fn login(&self, credentials: &Credentials) -> Result<Session, ApiError> {
        let request = ApiRequest::post(LOGIN_PATH).public().json(credentials)?;
        let auth: AuthResponse = self.call(request).await?;
        let session = Session::from(auth);
        self.inner.store.save(&session);
        info!(user_id = session.user.id, "Logged in");
        Ok(session)
    }

    /// Create an account. The session is not stored; the user verifies
    /// their email and then logs in.
    pub async fn register(&self, registration: &RegisterRequest) -> Result<AuthResponse, ApiError> {
        let request = ApiRequest::post(REGISTER_PATH).public().json(registration)?;
        let auth: AuthResponse = self.call(request).await?;
        info!(user_id = auth.user_id, "Registered");
        Ok(auth)
    }

    /// Revoke the refresh token and clear the local session. The local
    /// session is cleared even when the backend call fails.
    pub async fn logout(&self) -> Result<(), ApiError> {
        let outcome = match self.inner.store.refresh_token() {
            Some(refresh_token) => self.revoke(&refresh_token).await,
            None => Ok(()),
        };
        self.inner.store.clear();
        match outcome {
            Ok(()) => info!("Logged out"),
            Err(ref e) => warn!(error = %e, "Backend logout failed, local session cleared"),
        }
        outcome
    }

    async fn revoke(&self, refresh_token: &str) -> Result<(), ApiError> {
        let request = ApiRequest::post(LOGOUT_PATH)
            .public()
            .json(&RefreshTokenBody { refresh_token })?;
        self.call_empty(request).await
    }

    pub async fn forgot_password(&self, email: &str) -> Result<(), ApiError> {
        let request = ApiRequest::post("/auth/forgot-password")
            .public()
            .json(&serde_json::json!({ "email": email }))?;
        self.call_empty(request).await
    }

    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), ApiError> {
        let request = ApiRequest::post("/auth/reset-password")
            .public()
            .json(&serde_json::json!({ "token": token, "newPassword": new_password }))?;
        self.call_empty(request).await
    }

    pub async fn verify_email(&self, token: &str) -> Result<(), ApiError> {
        let request = ApiRequest::get("/auth/verify-email")
            .query("token", token)
            .public();
        self.call_empty(request).await
    }

    pub async fn resend_verification(&self, email: &str) -> Result<(), ApiError> {
        let request = ApiRequest::post("/auth/resend-verification")
            .public()
            .json(&serde_json::json!({ "email": email }))?;
        self.call_empty(request).await
    }
}

impl Inner {
    fn refresh_slot(&self) -> MutexGuard<'_, Option<RefreshHandle>> {
        self.refresh.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Join the in-flight refresh, skip it if the token already changed,
    /// or start a new one. Runs entirely under the slot lock.
    fn begin_refresh(self: &Arc<Self>, attached: Option<&str>) -> FreshToken {
        let mut slot = self.refresh_slot();
        if let Some(handle) = slot.as_ref() {
            debug!("Joining in-flight token refresh");
            return FreshToken::Pending(handle.clone());
        }

        // A finished refresh updates the store before it empties the slot,
        // so a token newer than the one we sent is visible here.
        if let Some(current) = self.store.access_token() {
            if attached != Some(current.as_str()) {
                return FreshToken::Current(current);
            }
        }

        let handle = Arc::clone(self).run_refresh().boxed().shared();
        *slot = Some(handle.clone());
        FreshToken::Pending(handle)
    }

    async fn run_refresh(self: Arc<Self>) -> RefreshOutcome {
        let outcome = self.exchange().await;
        if let RefreshOutcome::Denied(ref reason) = outcome {
            warn!(reason = %reason, "Token refresh failed, terminating session");
            self.store.clear();
            if let Some(ref navigator) = self.navigator {
                navigator.navigate(Route::Login);
            }
        }
        *self.refresh_slot() = None;
        outcome
    }

    async fn exchange(&self) -> RefreshOutcome {
        let Some(refresh_token) = self.store.refresh_token() else {
            return RefreshOutcome::Denied("no refresh token stored".to_string());
        };

        let request = match ApiRequest::post(REFRESH_PATH).public().json(&RefreshTokenBody {
            refresh_token: &refresh_token,
        }) {
            Ok(request) => request,
            Err(e) => return RefreshOutcome::Denied(e.to_string()),
        };

        info!("Exchanging refresh token");
        let response = match self.transport.send(&request, None).await {
            Ok(response) => response,
            Err(e) => return RefreshOutcome::Denied(format!("refresh request failed: {}", e)),
        };
        if !response.status.is_success() {
            let error = ApiError::from_status(response.status, &response.body);
            return RefreshOutcome::Denied(format!("refresh rejected: {}", error));
        }

        let tokens: RefreshResponse = match serde_json::from_str(&response.body) {
            Ok(tokens) => tokens,
            Err(e) => {
                return RefreshOutcome::Denied(format!("invalid refresh response: {}", e))
            }
        };
        if !self
            .store
            .update_tokens(&tokens.access_token, tokens.refresh_token.as_deref())
        {
            return RefreshOutcome::Denied("session was cleared during refresh".to_string());
        }

        info!(rotated = tokens.refresh_token.is_some(), "Access token refreshed");
        RefreshOutcome::Refreshed(tokens.access_token)
    }
}
