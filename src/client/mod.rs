//! Direct backend API client

pub mod api;

pub use api::{ApiClient, Upload};
