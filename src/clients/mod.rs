//! Outbound clients for external services.
//!
//! - **ghl**: GoHighLevel REST API client used by every tool provider

pub mod ghl;

pub use ghl::{ApiError, GhlApiClient};
