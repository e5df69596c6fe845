//! Playback side: the in-memory interaction store

mod store;

pub use store::Records;

/// Playback statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayStats {
    /// Entries served
    pub served: usize,
    /// Lookups that failed
    pub misses: usize,
    /// Entries not yet served
    pub remaining: usize,
}
