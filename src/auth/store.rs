//! Client-side auth store
//!
//! Holds the authenticated user snapshot and performs credentialed calls
//! against the gateway's relay endpoints. Every operation reports its outcome
//! through a [`Notifier`] and returns the error so callers can map it onto a
//! form (see [`crate::auth::models::FormErrors`]).

use reqwest::StatusCode;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::RwLock;
use url::Url;

use crate::auth::gate::{HOME_PATH, LOGIN_PATH};
use crate::auth::models::{
    AuthResponse, ContentItem, ContentQuery, ErrorDetail, ProfileUpdate, SignupRequest, User,
};
use crate::auth::session::Session;
use crate::error::{Error, Result};

pub const VERIFY_EMAIL_PATH: &str = "/verify-email";

/// Where the UI should go next
pub trait Navigator: Send + Sync {
    fn push(&self, path: &str);

    /// Navigate without keeping the current location in history
    fn replace(&self, path: &str) {
        self.push(path)
    }
}

/// User-facing notifications
pub trait Notifier: Send + Sync {
    fn success(&self, message: &str);
    fn error(&self, message: &str);
}

/// Navigator that only records the target in the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn push(&self, path: &str) {
        tracing::debug!(path = %path, "Navigate");
    }
}

/// Notifier that writes to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn success(&self, message: &str) {
        tracing::info!("{}", message);
    }

    fn error(&self, message: &str) {
        tracing::warn!("{}", message);
    }
}

/// Snapshot exposed to the view layer
#[derive(Debug, Clone, PartialEq)]
pub struct AuthState {
    pub user: Option<User>,
    pub loading: bool,
}

impl Default for AuthState {
    fn default() -> Self {
        Self {
            user: None,
            loading: true,
        }
    }
}

pub struct AuthStore {
    http: reqwest::Client,
    base: Url,
    session: Session,
    state: RwLock<AuthState>,
    navigator: Arc<dyn Navigator>,
    notifier: Arc<dyn Notifier>,
}

impl AuthStore {
    /// Store talking to the relay endpoints under `gateway_url`
    pub fn new(gateway_url: &str, session: Session) -> Result<Self> {
        Ok(Self {
            http: reqwest::Client::new(),
            base: Url::parse(gateway_url)?,
            session,
            state: RwLock::new(AuthState::default()),
            navigator: Arc::new(LogNavigator),
            notifier: Arc::new(LogNotifier),
        })
    }

    pub fn with_navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = navigator;
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub async fn state(&self) -> AuthState {
        self.state.read().await.clone()
    }

    pub async fn user(&self) -> Option<User> {
        self.state.read().await.user.clone()
    }

    pub async fn is_loading(&self) -> bool {
        self.state.read().await.loading
    }

    async fn set_user(&self, user: Option<User>) {
        self.state.write().await.user = user;
    }

    fn url(&self, path: &str) -> Result<Url> {
        endpoint(&self.base, path, None)
    }

    fn bearer(&self) -> Result<String> {
        self.session.token()?.ok_or(Error::NotAuthenticated)
    }

    /// Surface the outcome to the user and hand the result back
    fn report<T>(&self, result: Result<T>, success: &str, failure: Option<&str>) -> Result<T> {
        match &result {
            Ok(_) => self.notifier.success(success),
            Err(e) => match failure {
                Some(message) => self.notifier.error(message),
                None => self.notifier.error(&e.to_string()),
            },
        }
        result
    }

    /// Restore the user from a stored token; any failure signs the session out
    pub async fn init(&self) -> Option<User> {
        let user = match self.session.token() {
            Ok(Some(token)) => match self.fetch_profile(&token).await {
                Ok(user) => Some(user),
                Err(e) => {
                    tracing::warn!(error = %e, "Auth check failed, clearing session");
                    if let Err(e) = self.session.clear() {
                        tracing::warn!(error = %e, "Failed to clear session");
                    }
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read stored token");
                None
            }
        };

        let mut state = self.state.write().await;
        state.user = user.clone();
        state.loading = false;
        user
    }

    /// Exchange a token for the profile it belongs to
    pub async fn fetch_profile(&self, token: &str) -> Result<User> {
        let response = self
            .http
            .get(self.url("/api/auth/me")?)
            .bearer_auth(token)
            .send()
            .await?;
        let body = expect_success(response, "Authentication failed").await?;
        Ok(serde_json::from_value(body)?)
    }

    pub async fn signup(&self, request: &SignupRequest) -> Result<AuthResponse> {
        let result = self.do_signup(request).await;
        self.report(
            result,
            "Signup successful! Please verify your email.",
            Some("Signup failed. Please check the form for errors."),
        )
    }

    async fn do_signup(&self, request: &SignupRequest) -> Result<AuthResponse> {
        let body = self.post_json("/api/auth/signup", request, "Signup failed").await?;
        let auth: AuthResponse = serde_json::from_value(body)?;

        if let Some(token) = auth.access_token.as_deref() {
            self.session.set(token)?;
        }
        self.set_user(auth.user.clone()).await;
        self.navigator.push(VERIFY_EMAIL_PATH);
        Ok(auth)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse> {
        let result = self.do_login(email, password).await;
        self.report(
            result,
            "Login successful!",
            Some("Login failed. Please check your credentials."),
        )
    }

    async fn do_login(&self, email: &str, password: &str) -> Result<AuthResponse> {
        let response = self
            .http
            .post(self.url("/api/auth/login")?)
            .form(&[("username", email), ("password", password)])
            .send()
            .await?;
        let body = expect_success(response, "Login failed").await?;
        let auth: AuthResponse = serde_json::from_value(body)?;

        let token = auth
            .access_token
            .as_deref()
            .ok_or_else(|| Error::Other("Login response did not include an access token".into()))?;
        self.session.set(token)?;
        self.set_user(auth.user.clone()).await;
        self.navigator.push(HOME_PATH);
        Ok(auth)
    }

    /// Best-effort backend logout, then always clear the session
    pub async fn logout(&self) -> Result<()> {
        let mut clean = true;

        match self.session.token() {
            Ok(Some(token)) => {
                let sent = match self.url("/api/auth/logout") {
                    Ok(url) => self.http.post(url).bearer_auth(token).send().await.map_err(Error::from),
                    Err(e) => Err(e),
                };
                match sent {
                    Ok(response) => {
                        tracing::debug!(status = %response.status(), "Backend logout")
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Backend logout failed");
                        clean = false;
                    }
                }
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read stored token");
                clean = false;
            }
        }

        let cleared = self.session.clear();
        if let Err(e) = &cleared {
            tracing::warn!(error = %e, "Failed to clear session");
            clean = false;
        }

        self.navigator.replace(LOGIN_PATH);
        self.set_user(None).await;

        if clean {
            self.notifier.success("Logged out successfully");
        } else {
            self.notifier.error("Logged out with some errors");
        }
        cleared
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<User> {
        let result = self.do_update_profile(update).await;
        self.report(result, "Profile updated successfully", None)
    }

    async fn do_update_profile(&self, update: &ProfileUpdate) -> Result<User> {
        let response = self
            .http
            .put(self.url("/api/auth/me")?)
            .bearer_auth(self.bearer()?)
            .json(update)
            .send()
            .await?;
        let body = expect_success(response, "Failed to update profile").await?;
        let user: User = serde_json::from_value(body)?;
        self.set_user(Some(user.clone())).await;
        Ok(user)
    }

    pub async fn delete_account(&self) -> Result<()> {
        let result = self.do_delete_account().await;
        self.report(result, "Account deleted successfully", None)
    }

    async fn do_delete_account(&self) -> Result<()> {
        let response = self
            .http
            .delete(self.url("/api/auth/me")?)
            .bearer_auth(self.bearer()?)
            .send()
            .await?;
        expect_success(response, "Failed to delete account").await?;

        self.set_user(None).await;
        self.session.clear()?;
        self.navigator.push(LOGIN_PATH);
        Ok(())
    }

    pub async fn forgot_password(&self, email: &str) -> Result<Value> {
        let result = self
            .post_json("/api/auth/forgot-password", &json!({ "email": email }), "Request failed")
            .await;
        self.report(
            result,
            "Reset email sent successfully",
            Some("Failed to send reset email. Please try again."),
        )
    }

    pub async fn reset_password(&self, otp: &str, password: &str) -> Result<Value> {
        let result = self
            .post_json(
                "/api/auth/reset-password",
                &json!({ "otp": otp, "password": password }),
                "Request failed",
            )
            .await;
        self.report(
            result,
            "Password reset successfully",
            Some("Failed to reset password. Please try again."),
        )
    }

    pub async fn verify_email(&self, token: &str) -> Result<Value> {
        let result = self
            .post_json("/api/auth/verify-email", &json!({ "token": token }), "Verification failed")
            .await;
        if result.is_ok() {
            self.navigator.push(LOGIN_PATH);
        }
        self.report(result, "Email verified successfully", None)
    }

    pub async fn resend_verification(&self, email: &str) -> Result<Value> {
        let result = self
            .post_json(
                "/api/auth/resend-verification",
                &json!({ "email": email }),
                "Failed to resend verification email",
            )
            .await;
        self.report(result, "Verification email sent", None)
    }

    /// One page of the content history
    pub async fn list_content(&self, query: &ContentQuery) -> Result<Vec<ContentItem>> {
        let result = self.do_list_content(query).await;
        match result {
            Ok(items) => Ok(items),
            Err(e) => {
                self.notifier.error("Failed to load content history");
                Err(e)
            }
        }
    }

    async fn do_list_content(&self, query: &ContentQuery) -> Result<Vec<ContentItem>> {
        let mut url = self.url("/api/content")?;
        url.set_query(Some(&query.to_query_string()));

        let response = self
            .http
            .get(url)
            .bearer_auth(self.bearer()?)
            .send()
            .await?;
        let body = expect_success(response, "Failed to fetch content").await?;
        Ok(serde_json::from_value(body)?)
    }

    pub async fn delete_content(&self, id: &str) -> Result<()> {
        let result = self.do_delete_content(id).await;
        self.report(
            result,
            "Content deleted successfully",
            Some("Failed to delete content"),
        )
    }

    async fn do_delete_content(&self, id: &str) -> Result<()> {
        let response = self
            .http
            .delete(endpoint(&self.base, "/api/content", Some(id))?)
            .bearer_auth(self.bearer()?)
            .send()
            .await?;
        expect_success(response, "Failed to delete content").await?;
        Ok(())
    }

    async fn post_json<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        fallback: &str,
    ) -> Result<Value> {
        let response = self.http.post(self.url(path)?).json(body).send().await?;
        expect_success(response, fallback).await
    }
}

/// Append `path` below whatever prefix `base` already carries, plus `item` as
/// one escaped segment
pub(crate) fn endpoint(base: &Url, path: &str, item: Option<&str>) -> Result<Url> {
    let mut url = base.clone();
    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|_| Error::Config(format!("Base URL cannot carry a path: {}", base)))?;
        segments
            .pop_if_empty()
            .extend(path.split('/').filter(|s| !s.is_empty()));
        if let Some(item) = item {
            segments.push(item);
        }
    }
    Ok(url)
}

/// Parse the body, turning a non-success status into [`Error::Backend`]
pub(crate) async fn expect_success(response: reqwest::Response, fallback: &str) -> Result<Value> {
    if !response.status().is_success() {
        return Err(failure_from(response, fallback).await);
    }

    let bytes = response.bytes().await?;
    if bytes.is_empty() {
        Ok(Value::Null)
    } else {
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Decode the error body of a non-success response
pub(crate) async fn failure_from(response: reqwest::Response, fallback: &str) -> Error {
    let status = response.status();
    match response.bytes().await {
        Ok(bytes) => {
            let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
            backend_error(status, &body, fallback)
        }
        Err(e) => e.into(),
    }
}

fn backend_error(status: StatusCode, body: &Value, fallback: &str) -> Error {
    Error::Backend {
        status: status.as_u16(),
        detail: ErrorDetail::from_body(body, fallback),
    }
}
