//! relaygate - auth-gating gateway and session client
//!
//! The gateway gates page navigation on the `token` cookie and relays
//! `/api/auth/*` and `/api/content` to the backend. The session client
//! ([`auth::AuthStore`]) drives the same endpoints from the other side.

pub mod api;
pub mod auth;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;

pub use config::Config;
pub use error::Error;
