//! Process-wide logging setup for the storefront binaries.

pub mod tracing;

pub use crate::tracing::{LogFormat, init, init_with};
