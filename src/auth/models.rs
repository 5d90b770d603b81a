//! Wire models shared by the gateway and the session client

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Authenticated user snapshot as returned by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    /// Any additional profile fields, kept untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {}",
            other
        ))),
    }
}

/// Body of a successful login or signup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub user: Option<User>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

/// Partial profile update; absent fields are left alone by the backend
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// Filter for the content history listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentQuery {
    /// `None` lists every content type
    pub content_type: Option<String>,
    pub limit: u32,
    pub offset: u32,
}

impl Default for ContentQuery {
    fn default() -> Self {
        Self {
            content_type: None,
            limit: 10,
            offset: 0,
        }
    }
}

impl ContentQuery {
    /// Query for page `page` of `limit` items
    pub fn page(content_type: Option<String>, page: u32, limit: u32) -> Self {
        Self {
            content_type,
            limit,
            offset: page * limit,
        }
    }

    pub fn to_query_string(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .append_pair("content_type", self.content_type.as_deref().unwrap_or(""))
            .append_pair("limit", &self.limit.to_string())
            .append_pair("offset", &self.offset.to_string())
            .finish()
    }
}

/// One generated item in the content history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentItem {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(rename = "type", default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(rename = "fileUrl", default)]
    pub file_url: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// One entry of a validation error list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldError {
    #[serde(default)]
    pub loc: Vec<Value>,
    pub msg: String,
}

impl FieldError {
    /// Form field the error belongs to (`loc[1]`), if any
    pub fn field(&self) -> Option<String> {
        match self.loc.get(1)? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// Backend error body `detail`, either a message or a list of field errors
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorDetail {
    Message(String),
    Fields(Vec<FieldError>),
}

impl ErrorDetail {
    /// Decode the error shape from a backend JSON body
    pub fn from_body(body: &Value, fallback: &str) -> Self {
        match body.get("detail") {
            Some(Value::String(msg)) => ErrorDetail::Message(msg.clone()),
            Some(Value::Array(entries)) => {
                let fields = entries
                    .iter()
                    .filter_map(|e| serde_json::from_value::<FieldError>(e.clone()).ok())
                    .collect::<Vec<_>>();
                if fields.is_empty() {
                    ErrorDetail::Message(fallback.to_string())
                } else {
                    ErrorDetail::Fields(fields)
                }
            }
            _ => match body.get("error").and_then(Value::as_str) {
                Some(msg) => ErrorDetail::Message(msg.to_string()),
                None => ErrorDetail::Message(fallback.to_string()),
            },
        }
    }
}

impl fmt::Display for ErrorDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorDetail::Message(msg) => f.write_str(msg),
            ErrorDetail::Fields(fields) => {
                let msgs = fields.iter().map(|e| e.msg.as_str()).collect::<Vec<_>>();
                f.write_str(&msgs.join("; "))
            }
        }
    }
}

/// Errors split into per-field messages and one general form message
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormErrors {
    pub fields: BTreeMap<String, String>,
    pub general: Option<String>,
}

impl FormErrors {
    pub fn from_detail(detail: &ErrorDetail) -> Self {
        let mut errors = FormErrors::default();
        match detail {
            ErrorDetail::Message(msg) => errors.general = Some(msg.clone()),
            ErrorDetail::Fields(entries) => {
                for entry in entries {
                    match entry.field() {
                        Some(field) => {
                            errors.fields.insert(field, entry.msg.clone());
                        }
                        // Last unattached message wins
                        None => errors.general = Some(entry.msg.clone()),
                    }
                }
            }
        }
        errors
    }

    /// Map any error surfaced by the session client onto a form
    pub fn from_error(err: &crate::error::Error) -> Self {
        match err {
            crate::error::Error::Backend { detail, .. } => Self::from_detail(detail),
            other => FormErrors {
                fields: BTreeMap::new(),
                general: Some(other.to_string()),
            },
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.general.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_user_accepts_numeric_id_and_keeps_extra_fields() {
        let user: User = serde_json::from_value(json!({
            "id": 42,
            "name": "Ada",
            "email": "ada@example.com",
            "is_verified": true
        }))
        .unwrap();
        assert_eq!(user.id, "42");
        assert_eq!(user.extra.get("is_verified"), Some(&json!(true)));
    }

    #[test]
    fn test_detail_string() {
        let detail = ErrorDetail::from_body(&json!({"detail": "Email taken"}), "fallback");
        assert_eq!(detail, ErrorDetail::Message("Email taken".to_string()));
        assert_eq!(detail.to_string(), "Email taken");
    }

    #[test]
    fn test_detail_missing_uses_error_then_fallback() {
        let detail = ErrorDetail::from_body(&json!({"error": "Backend fetch error"}), "x");
        assert_eq!(detail.to_string(), "Backend fetch error");
        let detail = ErrorDetail::from_body(&json!({}), "Failed to update profile");
        assert_eq!(detail.to_string(), "Failed to update profile");
    }

    #[test]
    fn test_form_errors_from_validation_list() {
        let detail = ErrorDetail::from_body(
            &json!({"detail": [
                {"loc": ["body", "email"], "msg": "invalid email"},
                {"loc": ["body", "password"], "msg": "too short"},
                {"loc": ["body"], "msg": "passwords do not match"}
            ]}),
            "fallback",
        );
        let errors = FormErrors::from_detail(&detail);
        assert_eq!(errors.fields.get("email").map(String::as_str), Some("invalid email"));
        assert_eq!(errors.fields.get("password").map(String::as_str), Some("too short"));
        assert_eq!(errors.general.as_deref(), Some("passwords do not match"));
    }

    #[test]
    fn test_form_errors_from_non_backend_error() {
        let errors = FormErrors::from_error(&crate::error::Error::NotAuthenticated);
        assert!(errors.fields.is_empty());
        assert_eq!(errors.general.as_deref(), Some("Not authenticated"));
    }

    #[test]
    fn test_content_query_string() {
        let query = ContentQuery::page(Some("PDF".to_string()), 2, 10);
        assert_eq!(query.to_query_string(), "content_type=PDF&limit=10&offset=20");
        assert_eq!(
            ContentQuery::default().to_query_string(),
            "content_type=&limit=10&offset=0"
        );
    }
}
