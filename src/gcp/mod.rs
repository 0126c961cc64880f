//! GCP API plumbing
//!
//! - [`auth`] - Application Default Credentials with token caching, and
//!   project/location discovery from the gcloud configuration
//! - [`http`] - single-request HTTP wrapper that maps statuses to errors
//! - [`client`] - authenticated client with request retries

pub mod auth;
pub mod client;
pub mod http;
