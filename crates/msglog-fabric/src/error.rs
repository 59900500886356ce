/// Errors produced by the push fabric.
///
/// Per-subscriber delivery failures are never reported; they only prune or
/// skip that subscriber.
#[derive(Debug, thiserror::Error)]
pub enum FabricError {
    /// The message could not be encoded into its wire form.
    #[error("encoding error: {0}")]
    Encoding(String),
}

/// Convenience alias used throughout the fabric crate.
pub type Result<T> = std::result::Result<T, FabricError>;
