//! Declarative reconciliation machinery shared by all resources
//!
//! - [`enums`] - string enums with allow-list validation
//! - [`flatten`] - JSON body <-> typed field conversions
//! - [`canonicalize`] - equivalence predicates used before diffing
//! - [`diff`] - field diffs, update masks and operation grouping
//! - [`url`] - `{{param}}` URL templates and query strings
//! - [`operation`] - long-running operation polling
//! - [`retry`] - request retry with backoff
//! - [`options`] - apply options (state hints, lifecycle guards)
//! - [`validate`] - required-field checks
//! - [`config`] - client configuration
//! - [`error`] - the error type

pub mod canonicalize;
pub mod config;
pub mod diff;
pub mod enums;
pub mod error;
pub mod flatten;
pub mod operation;
pub mod options;
pub mod retry;
pub mod url;
pub mod validate;

pub use config::{ClientConfig, RetryConfig};
pub use diff::{FieldDiff, Remediation};
pub use error::{DclError, Result};
pub use options::{ApplyOption, LifecycleParam};
