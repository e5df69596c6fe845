//! Records archive reader and writer

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use super::{member_name, require_file, MEMBER_EXTENSION};
use crate::recording::RecordEntry;
use crate::{RecorderError, Result};

/// One session's records as stored in the archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveMember {
    /// Member file name, e.g. `default.json`
    pub name: String,
    /// Entries in recording order
    pub entries: Vec<RecordEntry>,
}

/// Write a session's records into the archive at `path`
///
/// Members belonging to other sessions in an existing archive are kept.
/// The archive is written beside `path` and renamed into place.
///
/// # Errors
///
/// Returns error if the existing archive cannot be read or the new one cannot be written
pub fn write_archive(path: &Path, session_name: &str, entries: &[RecordEntry]) -> Result<()> {
    let own_member = member_name(session_name);

    let mut kept = Vec::new();
    if path.is_file() {
        let mut archive = ZipArchive::new(BufReader::new(File::open(path)?))?;
        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            if file.is_dir() || file.name() == own_member {
                continue;
            }
            let mut data = Vec::new();
            file.read_to_end(&mut data)?;
            kept.push((file.name().to_string(), data));
        }
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let tmp_path = path.with_extension("zip.tmp");
    {
        let options =
            SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        let mut writer = ZipWriter::new(BufWriter::new(File::create(&tmp_path)?));

        for (name, data) in &kept {
            writer.start_file(name.as_str(), options)?;
            writer.write_all(data)?;
        }

        writer.start_file(own_member.as_str(), options)?;
        serde_json::to_writer_pretty(&mut writer, entries)?;

        writer.finish()?.flush()?;
    }
    fs::rename(&tmp_path, path)?;

    debug!(
        "Wrote {} entries to {} (kept {} other members)",
        entries.len(),
        path.display(),
        kept.len()
    );

    Ok(())
}

/// Read every session member of the archive at `path`
///
/// # Errors
///
/// Returns error if the archive is missing, is not a zip file, or holds invalid JSON
pub fn read_archive(path: &Path) -> Result<Vec<ArchiveMember>> {
    require_file(path)?;

    let mut archive = ZipArchive::new(BufReader::new(File::open(path)?))?;
    let mut members = Vec::with_capacity(archive.len());

    for i in 0..archive.len() {
        let file = archive.by_index(i)?;
        if file.is_dir() {
            continue;
        }

        let name = file.name().to_string();
        let is_json = Path::new(&name)
            .extension()
            .is_some_and(|ext| ext == MEMBER_EXTENSION);
        if !is_json {
            debug!("Skipping non-JSON archive member {name}");
            continue;
        }

        let entries: Vec<RecordEntry> = serde_json::from_reader(file).map_err(|e| {
            RecorderError::InvalidFormat(format!("Archive member '{name}' is not a record list: {e}"))
        })?;

        members.push(ArchiveMember { name, entries });
    }

    Ok(members)
}
