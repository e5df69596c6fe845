//! Asset names file

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use tracing::debug;

use super::require_file;
use crate::{RecorderError, Result};

/// Write a session's test name to asset names mapping into the names file
///
/// Tests already in an existing file that this session did not touch are
/// kept; tests it did touch are replaced with its names.
///
/// # Errors
///
/// Returns error if an existing file cannot be read or the new one cannot be written
pub fn write_names(path: &Path, names: &BTreeMap<String, Vec<String>>) -> Result<()> {
    let mut merged = if path.is_file() {
        read_names(path)?
    } else {
        BTreeMap::new()
    };
    let kept = merged.keys().filter(|test| !names.contains_key(*test)).count();
    merged.extend(names.iter().map(|(test, list)| (test.clone(), list.clone())));

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let tmp_path = path.with_extension("json.tmp");
    {
        let mut writer = BufWriter::new(File::create(&tmp_path)?);
        serde_json::to_writer_pretty(&mut writer, &merged)?;
        writer.flush()?;
    }
    fs::rename(&tmp_path, path)?;

    debug!(
        "Wrote names for {} tests to {} (kept {} from other sessions)",
        names.len(),
        path.display(),
        kept
    );

    Ok(())
}

/// Read the test name to asset names mapping
///
/// # Errors
///
/// Returns error if the file is missing or is not a JSON object of string lists
pub fn read_names(path: &Path) -> Result<BTreeMap<String, Vec<String>>> {
    require_file(path)?;

    serde_json::from_reader(BufReader::new(File::open(path)?)).map_err(|e| {
        RecorderError::InvalidFormat(format!("Invalid names file {}: {e}", path.display()))
    })
}
