//! Relay route handlers
//!
//! Each handler maps one same-origin endpoint onto a backend path and turns
//! any forwarding failure into a 500 with a JSON `error` body.

use axum::{
    body::Bytes,
    extract::{Path, RawQuery, State},
    http::{header, HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde::Serialize;
use serde_json::{json, Value};

use super::relay::{OutboundBody, RelayResponse};
use super::server::SharedState;
use crate::auth::cookie::SessionCookie;
use crate::error::Result;

const GENERIC_FAILURE: &str = "Failed to fetch from backend";

/// Route whose successful POST mints the session cookie
const LOGIN_ROUTE: &str = "login";

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

pub async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}

/// Bytes escaped inside one path segment
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Re-escape decoded wildcard segments so `?` and `#` stay in the path
fn join_segments(prefix: &str, rest: &str) -> String {
    rest.split('/')
        .filter(|s| !s.is_empty())
        .fold(prefix.to_string(), |mut path, segment| {
            path.push('/');
            path.extend(utf8_percent_encode(segment, SEGMENT));
            path
        })
}

fn auth_path(route: &str) -> String {
    join_segments("/api/auth", route)
}

fn content_path(rest: Option<&str>) -> String {
    join_segments("/api/content", rest.unwrap_or(""))
}

fn mirror(response: RelayResponse) -> Response {
    (response.status, Json(response.body)).into_response()
}

fn failure(message: String) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": message })),
    )
        .into_response()
}

/// Mirror a relay result; `detailed` includes the transport error in the body
fn reflect(result: Result<RelayResponse>, url: &str, detailed: Option<&str>) -> Response {
    match result {
        Ok(response) => mirror(response),
        Err(e) => {
            tracing::warn!(url = %url, error = %e, "Backend relay failed");
            match detailed {
                Some(prefix) => failure(format!("{}: {}", prefix, e)),
                None => failure(GENERIC_FAILURE.to_string()),
            }
        }
    }
}

// Auth routes

pub async fn auth_get(
    State(state): State<SharedState>,
    Path(route): Path<String>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> Response {
    let path = auth_path(&route);
    let result = state
        .relay
        .forward(Method::GET, &path, query.as_deref(), &headers, OutboundBody::Empty)
        .await;
    reflect(result, &path, None)
}

pub async fn auth_post(
    State(state): State<SharedState>,
    Path(route): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = auth_path(&route);
    let response = match post_to_backend(&state, &path, &headers, body).await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(url = %path, error = %e, "Backend relay failed");
            return failure(format!("Backend fetch error: {}", e));
        }
    };

    let cookie = if route.trim_matches('/') == LOGIN_ROUTE && response.status.is_success() {
        response.access_token().map(|token| {
            SessionCookie::new(state.config.cookie.name.as_str(), token)
                .secure(state.config.secure_cookies())
                .max_age(state.config.cookie.max_age_secs)
        })
    } else {
        None
    };

    let mut reply = mirror(response);
    if let Some(value) = cookie.and_then(|c| c.to_header_value()) {
        tracing::info!("Login succeeded, session cookie issued");
        reply.headers_mut().append(header::SET_COOKIE, value);
    }
    reply
}

pub async fn auth_put(
    State(state): State<SharedState>,
    Path(route): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = auth_path(&route);
    let result = put_to_backend(&state, &path, &headers, body).await;
    reflect(result, &path, None)
}

async fn post_to_backend(
    state: &SharedState,
    path: &str,
    headers: &HeaderMap,
    body: Bytes,
) -> Result<RelayResponse> {
    let body = OutboundBody::from_inbound(headers, body)?;
    state
        .relay
        .forward(Method::POST, path, None, headers, body)
        .await
}

/// PUT always goes out as JSON
async fn put_to_backend(
    state: &SharedState,
    path: &str,
    headers: &HeaderMap,
    body: Bytes,
) -> Result<RelayResponse> {
    let value: Value = serde_json::from_slice(&body)?;
    state
        .relay
        .forward(Method::PUT, path, None, headers, OutboundBody::Json(value))
        .await
}

pub async fn auth_delete(
    State(state): State<SharedState>,
    Path(route): Path<String>,
    headers: HeaderMap,
) -> Response {
    let path = auth_path(&route);
    let result = state
        .relay
        .forward(Method::DELETE, &path, None, &headers, OutboundBody::Empty)
        .await;
    reflect(result, &path, None)
}

// Content routes

pub async fn content_get(
    State(state): State<SharedState>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> Response {
    forward_content_get(&state, None, query, headers).await
}

pub async fn content_delete(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    forward_content_delete(&state, None, headers).await
}

pub async fn content_item_get(
    State(state): State<SharedState>,
    Path(rest): Path<String>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> Response {
    forward_content_get(&state, Some(&rest), query, headers).await
}

pub async fn content_item_delete(
    State(state): State<SharedState>,
    Path(rest): Path<String>,
    headers: HeaderMap,
) -> Response {
    forward_content_delete(&state, Some(&rest), headers).await
}

async fn forward_content_get(
    state: &SharedState,
    rest: Option<&str>,
    query: Option<String>,
    headers: HeaderMap,
) -> Response {
    let path = content_path(rest);
    let result = state
        .relay
        .forward(Method::GET, &path, query.as_deref(), &headers, OutboundBody::Empty)
        .await;
    reflect(result, &path, Some(GENERIC_FAILURE))
}

async fn forward_content_delete(
    state: &SharedState,
    rest: Option<&str>,
    headers: HeaderMap,
) -> Response {
    let path = content_path(rest);
    let result = state
        .relay
        .forward(Method::DELETE, &path, None, &headers, OutboundBody::Empty)
        .await;
    reflect(result, &path, None)
}
