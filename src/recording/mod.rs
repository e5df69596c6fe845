//! Recording side: captured entries, asset names and the session context

mod entry;
mod names;
mod session;

pub use entry::RecordEntry;
pub use names::Names;
pub use session::Session;

/// Attempts at generating an asset name not yet issued to the same test
pub const ASSET_NAME_ATTEMPTS: usize = 100;
