//! Checkpoint services.

mod store;

pub use store::{
    CHECKPOINT_SCAN_LIMIT, CheckpointStore, CheckpointStoreError, CheckpointStoreResult,
    DEFAULT_KEEP_LATEST,
};
