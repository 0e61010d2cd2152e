//! Partition routing module
//!
//! Supports: static value lists and parent stream records.
//!
//! # Overview
//!
//! A partitioned stream runs its page loop once per partition, with the
//! partition's values available to path templates and added fields:
//! - `properties` fans out over the CRM object types
//! - `form_submissions` fans out over the ids of the `forms` stream

mod routers;
mod types;

pub use routers::{ListRouter, ParentRouter};
pub use types::{PartitionConfig, PartitionRouter, PartitionValue};

#[cfg(test)]
mod tests;
