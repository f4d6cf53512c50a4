//! Type definitions for prestatrack

mod draft;
mod error;
mod money;
mod transaction;

pub use draft::*;
pub use error::*;
pub use money::{deserialize_lenient, deserialize_lenient_or_zero, Money};
pub use transaction::*;

/// Catalog cache loading warning types
#[derive(Debug, Clone, PartialEq)]
pub enum CacheWarning {
    /// Fetch failed, an expired cache was used instead
    Stale(String),
    /// Cache file was corrupted (invalid JSON)
    Corrupted(String),
}

impl CacheWarning {
    pub fn message(&self) -> &str {
        match self {
            Self::Stale(msg) | Self::Corrupted(msg) => msg,
        }
    }
}
