//! Different implementations of a common async API for use in torlib
//!
//! Currently only tokio is provided.

#[cfg(feature = "tokio")]
pub(crate) mod tokio;
