//! Shared fixtures: a scripted backend and a gateway relaying to it

#![allow(dead_code)]

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{header, HeaderMap, Method, Request, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json, Router,
};
use jsonwebtoken::{encode, EncodingKey, Header};
use relaygate::api::{create_router, AppState};
use relaygate::auth::is_expired;
use relaygate::config::Config;
use serde_json::{json, Value};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

pub const PASSWORD: &str = "correct horse";
pub const TAKEN_EMAIL: &str = "taken@example.com";
const SECRET: &[u8] = b"test-secret";

/// HS256 token expiring `offset_secs` from now
pub fn mint_token(offset_secs: i64) -> String {
    let exp = chrono::Utc::now().timestamp() + offset_secs;
    encode(
        &Header::default(),
        &json!({ "sub": "42", "exp": exp }),
        &EncodingKey::from_secret(SECRET),
    )
    .unwrap()
}

pub fn user_json() -> Value {
    json!({ "id": 42, "name": "Ada", "email": "ada@example.com", "is_verified": true })
}

/// One request as the backend saw it
#[derive(Debug, Clone)]
pub struct Seen {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

#[derive(Clone)]
pub struct Backend {
    pub url: String,
    seen: Arc<Mutex<Vec<Seen>>>,
}

impl Backend {
    pub fn requests(&self) -> Vec<Seen> {
        self.seen.lock().unwrap().clone()
    }

    pub fn hits(&self, method: &Method, path: &str) -> usize {
        self.requests()
            .iter()
            .filter(|s| &s.method == method && s.path == path)
            .count()
    }
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

fn detail(status: StatusCode, detail: Value) -> Response {
    (status, Json(json!({ "detail": detail }))).into_response()
}

async fn script(
    State(seen): State<Arc<Mutex<Vec<Seen>>>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri.path().to_string();
    seen.lock().unwrap().push(Seen {
        method: method.clone(),
        path: path.clone(),
        query: uri.query().map(str::to_string),
        headers: headers.clone(),
        body: body.clone(),
    });

    let authorized = bearer(&headers).is_some_and(|t| !is_expired(t));

    match (method.as_str(), path.as_str()) {
        ("POST", "/api/auth/login") => {
            let password = url::form_urlencoded::parse(&body)
                .find(|(k, _)| k == "password")
                .map(|(_, v)| v.into_owned());
            if password.as_deref() == Some(PASSWORD) {
                Json(json!({
                    "access_token": mint_token(3600),
                    "token_type": "bearer",
                    "user": user_json(),
                }))
                .into_response()
            } else {
                detail(StatusCode::UNAUTHORIZED, json!("Incorrect email or password"))
            }
        }
        ("POST", "/api/auth/signup") => {
            let request: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
            if request["email"] == TAKEN_EMAIL {
                detail(
                    StatusCode::UNPROCESSABLE_ENTITY,
                    json!([
                        { "loc": ["body", "email"], "msg": "Email already registered" },
                        { "loc": ["body", "password"], "msg": "Password too short" },
                    ]),
                )
            } else {
                Json(json!({ "access_token": mint_token(3600), "user": user_json() })).into_response()
            }
        }
        ("POST", "/api/auth/logout") => Json(json!({ "message": "Logged out" })).into_response(),
        ("GET", "/api/auth/me") if authorized => Json(user_json()).into_response(),
        ("PUT", "/api/auth/me") if authorized => {
            let mut user = user_json();
            if let (Some(user), Ok(Value::Object(update))) =
                (user.as_object_mut(), serde_json::from_slice::<Value>(&body))
            {
                user.extend(update);
            }
            Json(user).into_response()
        }
        ("DELETE", "/api/auth/me") if authorized => StatusCode::NO_CONTENT.into_response(),
        (_, "/api/auth/me") => detail(
            StatusCode::UNAUTHORIZED,
            json!("Could not validate credentials"),
        ),
        (_, p) if p.ends_with("/missing") => detail(StatusCode::NOT_FOUND, json!("Not found")),
        (_, p) if p.ends_with("/html") => (
            [(header::CONTENT_TYPE, "text/html")],
            "<html><body>oops</body></html>",
        )
            .into_response(),
        _ => Json(json!({
            "method": method.as_str(),
            "path": path,
            "query": uri.query(),
            "host": headers.get(header::HOST).and_then(|v| v.to_str().ok()),
            "authorization": headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()),
            "content_type": headers.get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok()),
            "body": String::from_utf8_lossy(&body),
        }))
        .into_response(),
    }
}

/// Start the scripted backend on an ephemeral port
pub async fn spawn_backend() -> Backend {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new().fallback(script).with_state(seen.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    Backend {
        url: format!("http://{}", addr),
        seen,
    }
}

/// Development config relaying to `backend_url` and serving pages from `static_dir`
pub fn gateway_config(backend_url: &str, static_dir: &Path) -> Config {
    let mut config = Config::default();
    config.environment = "development".to_string();
    config.backend.url = backend_url.to_string();
    config.backend.timeout_secs = 5;
    config.server.static_dir = static_dir.to_path_buf();
    config.cookie.secure = None;
    config
}

pub fn gateway(config: Config) -> Router {
    create_router(Arc::new(AppState::new(config).unwrap()))
}

/// Serve the gateway on an ephemeral port and return its base URL
pub async fn spawn_gateway(config: Config) -> String {
    let app = gateway(config);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Static pages the gate sits in front of
pub fn pages() -> tempfile::TempDir {
    let dir = tempfile::TempDir::new().unwrap();
    for page in ["index.html", "dashboard", "history", "login", "signup", "favicon.ico"] {
        std::fs::write(dir.path().join(page), page).unwrap();
    }
    dir
}

pub fn request(method: Method, uri: &str) -> axum::http::request::Builder {
    Request::builder().method(method).uri(uri)
}

pub fn empty(builder: axum::http::request::Builder) -> Request<Body> {
    builder.body(Body::empty()).unwrap()
}

pub async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
