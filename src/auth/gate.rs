//! Auth gate for navigational requests
//!
//! Runs once per page request, before the page is served. The decision is a
//! pure function of the request path and the session cookie.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::auth::cookie::{get_cookie, SessionCookie, TOKEN_COOKIE};
use crate::auth::token;

/// Auth-flow pages; everything else is protected
pub const PUBLIC_PATHS: &[&str] = &[
    "/login",
    "/signup",
    "/verify-email",
    "/forgot-password",
    "/reset-password",
];

/// Prefixes the gate never evaluates
pub const EXCLUDED_PREFIXES: &[&str] = &[
    "api",
    "_next/static",
    "_next/image",
    "images",
    "favicon.ico",
    "manifest.json",
    "robots.txt",
    "sitemap.xml",
];

pub const LOGIN_PATH: &str = "/login";
pub const HOME_PATH: &str = "/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathClass {
    Public,
    Protected,
}

/// Outcome of evaluating one request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Allow,
    /// Authenticated user on an auth-flow page
    RedirectHome,
    /// Missing or stale session on a protected page; the cookie is cleared
    RedirectLogin,
}

/// Classify a path by prefix against [`PUBLIC_PATHS`]
pub fn classify(path: &str) -> PathClass {
    if PUBLIC_PATHS.iter().any(|p| path.starts_with(p)) {
        PathClass::Public
    } else {
        PathClass::Protected
    }
}

/// Whether the path is an API route or a static asset
pub fn is_excluded(path: &str) -> bool {
    let rest = path.strip_prefix('/').unwrap_or(path);
    EXCLUDED_PREFIXES.iter().any(|p| rest.starts_with(p))
}

/// Decide what happens to a request for `path` carrying `token`
pub fn evaluate(path: &str, token: Option<&str>, now: DateTime<Utc>) -> GateDecision {
    let valid = token
        .filter(|t| !t.is_empty())
        .is_some_and(|t| !token::is_expired_at(t, now));

    match (classify(path), valid) {
        (PathClass::Public, true) => GateDecision::RedirectHome,
        (PathClass::Public, false) => GateDecision::Allow,
        (PathClass::Protected, true) => GateDecision::Allow,
        (PathClass::Protected, false) => GateDecision::RedirectLogin,
    }
}

/// Gate settings shared with the middleware
#[derive(Debug, Clone)]
pub struct Gate {
    cookie_name: Arc<str>,
}

impl Gate {
    pub fn new(cookie_name: &str) -> Self {
        Self {
            cookie_name: Arc::from(cookie_name),
        }
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// Build the response for a redirect decision
    pub fn respond(&self, decision: GateDecision) -> Option<Response> {
        match decision {
            GateDecision::Allow => None,
            GateDecision::RedirectHome => Some(Redirect::temporary(HOME_PATH).into_response()),
            GateDecision::RedirectLogin => {
                let mut response = Redirect::temporary(LOGIN_PATH).into_response();
                if let Some(value) = SessionCookie::removal(self.cookie_name()).to_header_value() {
                    response.headers_mut().append(header::SET_COOKIE, value);
                }
                Some(response)
            }
        }
    }
}

impl Default for Gate {
    fn default() -> Self {
        Self::new(TOKEN_COOKIE)
    }
}

/// Middleware applied in front of page handlers
pub async fn auth_gate(State(gate): State<Gate>, req: Request, next: Next) -> Response {
    let path = req.uri().path();
    if is_excluded(path) {
        return next.run(req).await;
    }

    let decision = evaluate(path, get_cookie(req.headers(), gate.cookie_name()), Utc::now());
    match gate.respond(decision) {
        Some(response) => {
            tracing::debug!(path = %path, ?decision, "Auth gate redirect");
            response
        }
        None => next.run(req).await,
    }
}
