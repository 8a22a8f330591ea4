//! HTTP access to the DataDock public data endpoints.
//!
//! All calls are blocking and meant to run on worker threads; see
//! [`crate::state`] for how results flow back to the UI.

mod client;
mod endpoints;
mod error;

pub use client::DataDockClient;
pub use endpoints::Endpoints;
pub use error::{ApiError, Result};
