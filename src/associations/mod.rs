//! Association enrichment
//!
//! Deals carry the ids of their contacts and companies. Those come from the
//! association batch endpoint: the parent ids of a page are split into
//! bounded batches, fetched with limited concurrency and merged back onto
//! the records before they are emitted.

mod fetcher;

pub use fetcher::{
    apply_associations, parse_batch_response, AssociationFetcher, AssociationMap,
    AssociationSettings, AssociationSpec, DEFAULT_BATCH_SIZE,
};
