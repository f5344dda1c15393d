//! Shared error taxonomy, configuration and telemetry bootstrap used by every
//! `burrow-*` crate.

pub mod arn;
pub mod config;
pub mod error;
pub mod telemetry;

pub use config::Config;
pub use error::ErrorKind;
