//! HTTP API: routing and request/response mapping over the storefront.

pub mod app;
pub mod middleware;
