//! Session gating, token freshness and the client-side auth store

pub mod cookie;
pub mod gate;
pub mod models;
pub mod session;
pub mod store;
pub mod token;

pub use cookie::{get_cookie, SessionCookie, TOKEN_COOKIE};
pub use gate::{auth_gate, classify, evaluate, Gate, GateDecision, PathClass};
pub use models::{
    AuthResponse, ContentItem, ContentQuery, ErrorDetail, FieldError, FormErrors, ProfileUpdate,
    SignupRequest, User,
};
pub use session::{
    CookieJar, FileCookieJar, FileStorage, MemoryCookieJar, MemoryStorage, Session, TokenStorage,
};
pub use store::{AuthState, AuthStore, LogNavigator, LogNotifier, Navigator, Notifier};
pub use token::{decode_claims, expiry, is_expired, is_expired_at};
