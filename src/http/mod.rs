//! HTTP client module
//!
//! Every HubSpot request goes through [`HttpClient`]: base URL joining,
//! authentication, client-side rate limiting and retries with backoff.
//!
//! # Features
//!
//! - **Automatic Retries**: 429, 5xx, timeouts and connect errors
//! - **Rate Limiting**: Token bucket rate limiter using governor
//! - **Token Recovery**: a 401 under OAuth2 forces one token refresh

mod client;
mod rate_limit;

pub use client::{HttpClient, HttpClientConfig, HttpClientConfigBuilder, RequestConfig};
pub use rate_limit::{RateLimiter, RateLimiterConfig};
