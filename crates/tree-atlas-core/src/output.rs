//! Writing the atlas image and its description to disk.
//!
//! Both artifacts are staged in temporary files next to their targets and
//! only renamed into place once everything was encoded and written, so a
//! failed run leaves no half-written output behind.

use crate::config::DescriptionFormat;
use crate::error::{AtlasError, Result};
use crate::export::to_json;
use crate::export_xml::to_xml;
use crate::model::AtlasDescription;
use crate::pipeline::PackOutput;
use image::{ImageFormat, RgbaImage};
use std::fs;
use std::io::{Cursor, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{info, instrument, warn};

/// Render the description in the requested wire syntax.
pub fn render_description(desc: &AtlasDescription, format: DescriptionFormat) -> Result<String> {
    match format {
        DescriptionFormat::Xml => Ok(to_xml(desc)),
        DescriptionFormat::Json => serde_json::to_string_pretty(&to_json(desc))
            .map_err(|e| AtlasError::Encode(e.to_string())),
    }
}

/// Encode the canvas as PNG.
pub fn encode_png(rgba: &RgbaImage) -> Result<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    rgba.write_to(&mut buf, ImageFormat::Png)?;
    Ok(buf.into_inner())
}

fn stage(bytes: &[u8], target: &Path) -> Result<NamedTempFile> {
    let dir = match target.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    Ok(tmp)
}

/// Write `bytes` to `path` through a temporary file in the same directory.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    stage(bytes, path)?.persist(path)?;
    Ok(())
}

#[instrument(skip_all, fields(atlas = %atlas_path.display(), description = %description_path.display()))]
/// Write the atlas PNG and the description document.
///
/// Both files are fully staged before either is renamed into place. If the
/// description cannot be finalized after the atlas was, the atlas is removed
/// again. A description left over from an earlier run at the same path is not
/// touched in that case.
pub fn write_outputs(
    out: &PackOutput,
    atlas_path: &Path,
    description_path: &Path,
    format: DescriptionFormat,
) -> Result<()> {
    let png = encode_png(&out.rgba)?;
    let text = render_description(&out.description, format)?;

    let atlas_tmp = stage(&png, atlas_path)?;
    let description_tmp = stage(text.as_bytes(), description_path)?;

    atlas_tmp.persist(atlas_path)?;
    if let Err(e) = description_tmp.persist(description_path) {
        if let Err(cleanup) = fs::remove_file(atlas_path) {
            warn!(path = %atlas_path.display(), error = %cleanup, "failed to remove atlas after error");
        }
        return Err(e.into());
    }
    info!(placed = out.description.summary.count, "atlas written");
    Ok(())
}
