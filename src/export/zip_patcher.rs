//! Replace one entry of a ZIP archive.
//!
//! Other entries go through `raw_copy_file`, so they keep their compressed
//! bytes and their order.

use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::{OverlapFixError, Result};

/// Copy `original`, writing `contents` in place of the entry named `part`.
pub(crate) fn replace_part(original: &[u8], part: &str, contents: &[u8]) -> Result<Vec<u8>> {
    let mut archive = ZipArchive::new(Cursor::new(original))?;
    let mut writer = ZipWriter::new(Cursor::new(Vec::with_capacity(original.len())));
    let mut replaced = false;

    for i in 0..archive.len() {
        let entry = archive.by_index_raw(i)?;
        if entry.name() == part {
            let name = entry.name().to_string();
            let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
            writer.start_file(name, options)?;
            writer.write_all(contents)?;
            replaced = true;
        } else {
            writer.raw_copy_file(entry)?;
        }
    }

    if !replaced {
        return Err(OverlapFixError::Parse(format!("archive has no part named {part}")));
    }
    Ok(writer.finish()?.into_inner())
}
