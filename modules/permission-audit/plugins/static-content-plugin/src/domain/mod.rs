//! Domain layer for the static content plugin.

pub mod client;
pub mod service;

pub use service::{RemoteRequest, Service};
