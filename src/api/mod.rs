//! HTTP gateway: auth gate, backend relay and static pages

pub mod relay;
pub mod routes;
pub mod server;

pub use relay::{OutboundBody, Relay, RelayResponse};
pub use server::*;
