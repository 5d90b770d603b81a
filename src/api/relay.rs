//! Request relay to the backend
//!
//! Rewrites an inbound request onto the configured backend origin and
//! reflects the backend's status and JSON body. Callers decide how a failed
//! forward is reported; nothing here panics on backend misbehaviour.

use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode};
use bytes::Bytes;
use serde_json::Value;
use std::time::Duration;
use url::Url;

use crate::error::{Error, Result};

pub const JSON_CONTENT_TYPE: &str = "application/json";
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Body sent to the backend
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundBody {
    Empty,
    Json(Value),
    /// Already-encoded `application/x-www-form-urlencoded` pairs
    Form(String),
    /// Inbound bytes passed through with the inbound content type
    Raw(Bytes),
}

impl OutboundBody {
    /// Choose the encoding from the inbound `content-type`
    pub fn from_inbound(headers: &HeaderMap, body: Bytes) -> Result<Self> {
        let content_type = headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");

        if content_type.contains(JSON_CONTENT_TYPE) {
            Ok(OutboundBody::Json(serde_json::from_slice(&body)?))
        } else if content_type.contains(FORM_CONTENT_TYPE) {
            let encoded = url::form_urlencoded::Serializer::new(String::new())
                .extend_pairs(url::form_urlencoded::parse(&body))
                .finish();
            Ok(OutboundBody::Form(encoded))
        } else {
            Ok(OutboundBody::Raw(body))
        }
    }

    /// Content type forced onto the outbound request, if any
    pub fn content_type(&self) -> Option<&'static str> {
        match self {
            OutboundBody::Json(_) => Some(JSON_CONTENT_TYPE),
            OutboundBody::Form(_) => Some(FORM_CONTENT_TYPE),
            OutboundBody::Empty | OutboundBody::Raw(_) => None,
        }
    }

    fn into_bytes(self) -> Result<Option<Bytes>> {
        Ok(match self {
            OutboundBody::Empty => None,
            OutboundBody::Json(value) => Some(Bytes::from(serde_json::to_vec(&value)?)),
            OutboundBody::Form(encoded) => Some(Bytes::from(encoded)),
            OutboundBody::Raw(bytes) => Some(bytes),
        })
    }
}

/// Backend status and JSON body, reflected back to the caller
#[derive(Debug, Clone, PartialEq)]
pub struct RelayResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl RelayResponse {
    /// Non-empty `access_token` string in the body
    pub fn access_token(&self) -> Option<&str> {
        self.body
            .get("access_token")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
    }
}

/// Forwarder bound to one backend origin
#[derive(Debug, Clone)]
pub struct Relay {
    client: reqwest::Client,
    backend: Url,
    host: HeaderValue,
}

impl Relay {
    pub fn new(backend_url: &str, timeout: Duration) -> Result<Self> {
        let backend = Url::parse(backend_url)?;
        let authority = match (backend.host_str(), backend.port()) {
            (Some(host), Some(port)) => format!("{}:{}", host, port),
            (Some(host), None) => host.to_string(),
            (None, _) => {
                return Err(Error::Config(format!(
                    "Backend URL has no host: {}",
                    backend_url
                )))
            }
        };
        let host = HeaderValue::from_str(&authority)
            .map_err(|e| Error::Config(format!("Invalid backend host: {}", e)))?;

        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            backend,
            host,
        })
    }

    pub fn backend(&self) -> &Url {
        &self.backend
    }

    /// Full backend URL for `path`, with the query string forwarded verbatim
    pub fn target(&self, path: &str, query: Option<&str>) -> String {
        let base = self.backend.as_str().trim_end_matches('/');
        match query.filter(|q| !q.is_empty()) {
            Some(query) => format!("{}{}?{}", base, path, query),
            None => format!("{}{}", base, path),
        }
    }

    /// Copy inbound headers, pointing `host` at the backend
    pub fn outbound_headers(&self, inbound: &HeaderMap) -> HeaderMap {
        let mut headers = inbound.clone();
        // Inbound framing does not survive re-encoding the body
        for name in [
            header::CONTENT_LENGTH,
            header::TRANSFER_ENCODING,
            header::CONNECTION,
            header::ACCEPT_ENCODING,
        ] {
            headers.remove(name);
        }
        headers.insert(header::HOST, self.host.clone());
        headers
    }

    /// Forward one request and collect the backend's JSON reply
    pub async fn forward(
        &self,
        method: Method,
        path: &str,
        query: Option<&str>,
        inbound: &HeaderMap,
        body: OutboundBody,
    ) -> Result<RelayResponse> {
        let url = self.target(path, query);
        let mut headers = self.outbound_headers(inbound);
        if let Some(content_type) = body.content_type() {
            headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
        }

        tracing::debug!(method = %method, url = %url, "Relaying request");

        let mut request = self.client.request(method, &url).headers(headers);
        if let Some(bytes) = body.into_bytes()? {
            request = request.body(bytes);
        }

        let response = request.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)?
        };

        Ok(RelayResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn relay() -> Relay {
        Relay::new("http://backend.internal:8000", Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_target_with_and_without_query() {
        let relay = relay();
        assert_eq!(
            relay.target("/api/content", Some("content_type=PDF&limit=10&offset=0")),
            "http://backend.internal:8000/api/content?content_type=PDF&limit=10&offset=0"
        );
        assert_eq!(
            relay.target("/api/auth/me", None),
            "http://backend.internal:8000/api/auth/me"
        );
        assert_eq!(
            relay.target("/api/auth/me", Some("")),
            "http://backend.internal:8000/api/auth/me"
        );
    }

    #[test]
    fn test_outbound_headers_rewrite_host() {
        let mut inbound = HeaderMap::new();
        inbound.insert(header::HOST, HeaderValue::from_static("localhost:3000"));
        inbound.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer X"));
        inbound.insert(header::CONTENT_LENGTH, HeaderValue::from_static("12"));

        let headers = relay().outbound_headers(&inbound);
        assert_eq!(headers[header::HOST], "backend.internal:8000");
        assert_eq!(headers[header::AUTHORIZATION], "Bearer X");
        assert!(headers.get(header::CONTENT_LENGTH).is_none());
    }

    #[test]
    fn test_host_without_port() {
        let relay = Relay::new("https://api.example.com", Duration::from_secs(5)).unwrap();
        let headers = relay.outbound_headers(&HeaderMap::new());
        assert_eq!(headers[header::HOST], "api.example.com");
    }

    #[test]
    fn test_body_strategy_json() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json; charset=utf-8"),
        );
        let body = OutboundBody::from_inbound(&headers, Bytes::from(r#"{"email":"a@b.c"}"#)).unwrap();
        assert_eq!(body, OutboundBody::Json(json!({"email": "a@b.c"})));
        assert_eq!(body.content_type(), Some(JSON_CONTENT_TYPE));
    }

    #[test]
    fn test_body_strategy_invalid_json_fails() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        assert!(OutboundBody::from_inbound(&headers, Bytes::from("{not json")).is_err());
    }

    #[test]
    fn test_body_strategy_form() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/x-www-form-urlencoded"),
        );
        let body = OutboundBody::from_inbound(
            &headers,
            Bytes::from("username=ada%40example.com&password=p+w"),
        )
        .unwrap();
        assert_eq!(
            body,
            OutboundBody::Form("username=ada%40example.com&password=p+w".to_string())
        );
    }

    #[test]
    fn test_body_strategy_raw_fallback() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("multipart/form-data; boundary=xyz"),
        );
        let body = OutboundBody::from_inbound(&headers, Bytes::from("--xyz--")).unwrap();
        assert_eq!(body, OutboundBody::Raw(Bytes::from("--xyz--")));
        assert_eq!(body.content_type(), None);

        let body = OutboundBody::from_inbound(&HeaderMap::new(), Bytes::from("plain")).unwrap();
        assert_eq!(body, OutboundBody::Raw(Bytes::from("plain")));
    }

    #[test]
    fn test_access_token_requires_non_empty_string() {
        let response = RelayResponse {
            status: StatusCode::OK,
            body: json!({"access_token": ""}),
        };
        assert_eq!(response.access_token(), None);

        let response = RelayResponse {
            status: StatusCode::OK,
            body: json!({"access_token": "abc"}),
        };
        assert_eq!(response.access_token(), Some("abc"));
    }
}
