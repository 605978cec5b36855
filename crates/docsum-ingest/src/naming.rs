//! Output file naming.

use std::path::{Path, PathBuf};

/// Suffix appended to the full input file name.
pub const OUTPUT_SUFFIX: &str = ".summary.json";

/// Where the analysis for `relative` (a path under the input folder) is written.
///
/// The full file name is kept, extension included, so `a.html` and `a.pdf`
/// never collide, and subfolders are mirrored under `output_dir`.
pub fn output_path_for(output_dir: &Path, relative: &Path) -> PathBuf {
    let file_name = relative
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "document".to_string());

    let parent = relative.parent().unwrap_or_else(|| Path::new(""));
    output_dir
        .join(parent)
        .join(format!("{}{}", file_name, OUTPUT_SUFFIX))
}
