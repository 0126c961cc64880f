//! Client for the IBM storage-as-a-service (sdsaas) API

pub mod auth;
pub mod core;
pub mod error;
pub mod models;
pub mod v1;

pub use auth::{Authenticator, IamAuthenticator};
pub use core::DetailedResponse;
pub use error::{Result, SdsError};
pub use models::*;
pub use v1::*;
