//! Result persistence.

use crate::error::{IngestError, IngestResult};
use docsum_core::AnalysisResult;
use std::io::Write;
use std::path::Path;
use tracing::debug;

/// Write `result` as pretty JSON to `path`.
///
/// The file is written to a temporary sibling and renamed into place, so a
/// crash never leaves a partial output behind.
pub fn write_result(path: &Path, result: &AnalysisResult) -> IngestResult<()> {
    let json = result.to_json_pretty()?;
    let output_error = |source: std::io::Error| IngestError::Output {
        path: path.to_path_buf(),
        source,
    };

    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent).map_err(output_error)?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent).map_err(output_error)?;
    tmp.write_all(json.as_bytes()).map_err(output_error)?;
    tmp.write_all(b"\n").map_err(output_error)?;
    tmp.as_file().sync_all().map_err(output_error)?;
    tmp.persist(path).map_err(|e| output_error(e.error))?;

    debug!("Wrote {}", path.display());
    Ok(())
}
