//! Client Module
//!
//! Outbound HTTP to the providers.

pub mod http;

pub use http::HttpClient;
