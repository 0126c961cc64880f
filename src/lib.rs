//! Declarative client for Google Cloud Dataplex lakes, zones and assets,
//! plus a typed client for the IBM storage-as-a-service API.
//!
//! - [`dcl`] - reconciliation machinery: canonicalize, diff, plan, poll
//! - [`gcp`] - authenticated HTTP access to Google APIs
//! - [`dataplex`] - the Lake, Zone and Asset resources and their [`dataplex::Client`]
//! - [`sdsaas`] - the sdsaas v1 API

pub mod dataplex;
pub mod dcl;
pub mod gcp;
pub mod sdsaas;
