//! On-disk form of a recorded session
//!
//! Records live in a zip archive with one JSON member per session
//! (`{session}.json`, a JSON array of [`RecordEntry`](crate::recording::RecordEntry)).
//! Asset names live in a flat JSON object of test name to name list.

mod archive;
mod names_file;

pub use archive::{read_archive, write_archive, ArchiveMember};
pub use names_file::{read_names, write_names};

use std::path::Path;

use crate::{RecorderError, Result};

/// Extension of session members inside the records archive
pub const MEMBER_EXTENSION: &str = "json";

/// Archive member name for a session
#[must_use]
pub fn member_name(session_name: &str) -> String {
    format!("{session_name}.{MEMBER_EXTENSION}")
}

/// Fail with [`RecorderError::FileNotFound`] if `path` does not exist
///
/// # Errors
///
/// Returns error if the file is missing
pub fn require_file(path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(RecorderError::FileNotFound(path.display().to_string()))
    }
}
