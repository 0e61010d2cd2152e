//! State management module
//!
//! Handles bookmark tracking and persistence so that later runs only pull
//! records changed since the previous one.
//!
//! # Overview
//!
//! The state module provides:
//! - `State` - Singer-style bookmarks per stream and partition
//! - `StateManager` - shared in-run state with file persistence
//! - `BookmarkTracker` - running maximum of a replication key
//! - `convert_date_to_epoch` - ISO-8601 / epoch normalization

mod bookmark;
mod manager;
mod types;

pub use bookmark::{convert_date_to_epoch, Bookmark, BookmarkTracker};
pub use manager::StateManager;
pub use types::{PartitionState, State, StreamState};
