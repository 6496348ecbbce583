//! Archive packaging
//!
//! Wraps the compiled executable in a single-entry deflate zip held entirely
//! in memory. The entry name follows Lambda's executable-discovery
//! convention: `bootstrap` for arm64, `main` otherwise. The entry carries
//! unix permission bits so the extracted file is runnable; without them the
//! deploy succeeds but every invocation fails.

use camino::Utf8Path;
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::config::Architecture;
use crate::{Error, Result};

/// Permission bits recorded on the single archive entry
const ENTRY_MODE: u32 = 0o777;

/// Package a compiled executable into an in-memory zip archive.
pub fn package_binary(binary_path: &Utf8Path, architecture: Architecture) -> Result<Vec<u8>> {
    let contents = std::fs::read(binary_path).map_err(|e| {
        Error::archive(
            format!("Failed to read compiled binary {}: {}", binary_path, e),
            "The build stage should have produced this file",
        )
    })?;

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(ENTRY_MODE);

    writer
        .start_file(architecture.entry_name(), options)
        .map_err(|e| {
            Error::archive(
                format!("Failed to start archive entry: {}", e),
                "This is an unexpected internal error",
            )
        })?;
    writer.write_all(&contents)?;

    // finish() writes the central directory; reading the buffer before that
    // would yield a truncated archive
    let cursor = writer.finish().map_err(|e| {
        Error::archive(
            format!("Failed to finalize archive: {}", e),
            "This is an unexpected internal error",
        )
    })?;

    Ok(cursor.into_inner())
}
