//! Authentication module
//!
//! Supports: static Bearer token (private apps) and the OAuth2 refresh-token
//! flow used by public apps.
//!
//! One `Authenticator` is built per run and shared behind an `Arc` by every
//! request, including the concurrent association batches. Refreshed tokens
//! are cached until shortly before they expire.

mod authenticator;
mod types;

pub use authenticator::Authenticator;
pub use types::{AuthConfig, CachedToken};
