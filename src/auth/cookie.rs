//! Cookie parsing and `Set-Cookie` rendering

use axum::http::{header, HeaderMap, HeaderValue};

/// Name of the session cookie
pub const TOKEN_COOKIE: &str = "token";

/// Extract a cookie value from the Cookie header.
pub fn get_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|part| part.trim().split_once('='))
        .find(|(key, _)| key.trim() == name)
        .map(|(_, value)| value.trim())
}

/// Attributes of a session cookie being set or cleared
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCookie {
    pub name: String,
    pub value: String,
    pub http_only: bool,
    pub secure: bool,
    /// `None` renders a browser-session cookie
    pub max_age: Option<i64>,
}

impl SessionCookie {
    /// A `path=/; SameSite=Lax` cookie carrying `value`
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            http_only: true,
            secure: false,
            max_age: None,
        }
    }

    /// Cookie that removes `name` from the browser
    pub fn removal(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: String::new(),
            http_only: true,
            secure: false,
            max_age: Some(0),
        }
    }

    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }

    pub fn max_age(mut self, secs: i64) -> Self {
        self.max_age = Some(secs);
        self
    }

    pub fn is_removal(&self) -> bool {
        self.max_age == Some(0)
    }

    /// Render as a `Set-Cookie` header value
    pub fn render(&self) -> String {
        let mut out = format!("{}={}; Path=/", self.name, self.value);
        if let Some(max_age) = self.max_age {
            out.push_str(&format!("; Max-Age={}", max_age));
            if max_age <= 0 {
                out.push_str("; Expires=Thu, 01 Jan 1970 00:00:00 GMT");
            }
        }
        if self.http_only {
            out.push_str("; HttpOnly");
        }
        if self.secure {
            out.push_str("; Secure");
        }
        out.push_str("; SameSite=Lax");
        out
    }

    pub fn to_header_value(&self) -> Option<HeaderValue> {
        HeaderValue::from_str(&self.render()).ok()
    }

    /// Parse a rendered `Set-Cookie` line back into its attributes
    pub fn parse(line: &str) -> Option<Self> {
        let mut parts = line.split(';');
        let (name, value) = parts.next()?.trim().split_once('=')?;
        let mut cookie = SessionCookie::new(name.trim(), value.trim()).http_only(false);

        for attr in parts {
            let attr = attr.trim();
            let (key, val) = attr.split_once('=').unwrap_or((attr, ""));
            match key.to_ascii_lowercase().as_str() {
                "httponly" => cookie.http_only = true,
                "secure" => cookie.secure = true,
                "max-age" => cookie.max_age = val.trim().parse().ok(),
                _ => {}
            }
        }
        Some(cookie)
    }
}
