//! HTTP plumbing shared by the Google gateways.

pub mod client;

pub use client::{ensure_success, read_json, HttpClient, HttpClientBuilder};
