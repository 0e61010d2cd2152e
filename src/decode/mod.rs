//! Response decoder module
//!
//! Extracts records from decoded JSON response bodies with a configured
//! records path. Dot paths (`results`, `$.results[*]`, `$[*]`) are resolved
//! directly; anything more elaborate is handed to `jsonpath-rust`.

mod json;

pub use json::{value_at_path, JsonDecoder};

#[cfg(test)]
mod tests;
