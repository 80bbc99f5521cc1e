//! Error types for the entity store.
//!
//! Lost claims and empty reads are *not* errors -- they surface as
//! `Option`/`Vec` results. [`StoreError`] covers only genuine record
//! encoding failures, which callers treat as a skippable unit of work.

/// Errors that can occur in the entity store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// An entity could not be encoded for storage.
    #[error("failed to encode record: {0}")]
    Encode(#[source] serde_json::Error),

    /// A stored record could not be decoded back into its entity type.
    #[error("corrupt record {key}: {source}")]
    Corrupt {
        /// The key of the record that failed to decode.
        key: String,
        /// The underlying decode error.
        #[source]
        source: serde_json::Error,
    },
}
