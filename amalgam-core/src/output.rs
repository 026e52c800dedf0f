//! Output helpers: the merged header and traversal reports.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;

use crate::amalgamate::VisitedDocument;
use crate::error::{AmalgamError, Result};

/// Write `text` to `path` all-or-nothing.
///
/// The content lands in a temporary file beside `path` and is renamed over it
/// once fully written, so a failed run never leaves a truncated header behind.
pub fn write_atomic(path: &Path, text: &str) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(|err| AmalgamError::io(dir, err))?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(|err| AmalgamError::io(dir, err))?;
    tmp.write_all(text.as_bytes())
        .and_then(|()| tmp.as_file().sync_all())
        .map_err(|err| AmalgamError::io(tmp.path(), err))?;
    tmp.persist(path)
        .map_err(|err| AmalgamError::io(path, err.error))?;
    Ok(())
}

/// Write the traversal as a prettified JSON array.
pub fn write_json_pretty(docs: &[VisitedDocument], mut w: impl Write) -> io::Result<()> {
    let json = serde_json::to_string_pretty(docs)?;
    w.write_all(json.as_bytes())?;
    w.write_all(b"\n")?;
    Ok(())
}

/// Write the traversal as newline-delimited JSON (NDJSON).
pub fn write_ndjson(docs: &[VisitedDocument], mut w: impl Write) -> io::Result<()> {
    for doc in docs {
        let line = serde_json::to_string(doc)?;
        w.write_all(line.as_bytes())?;
        w.write_all(b"\n")?;
    }
    Ok(())
}
