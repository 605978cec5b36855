//! Input folder validation and document enumeration.

use crate::error::{IngestError, IngestResult};
use docsum_config::{Config, ConfigError, ConfigResult};
use docsum_core::Document;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::{DirEntry, WalkDir};

/// Enumerates documents in the input folder.
#[derive(Debug, Clone)]
pub struct Loader {
    input_dir: PathBuf,
    output_dir: PathBuf,
    recursive: bool,
    ignore_patterns: Vec<glob::Pattern>,
}

impl Loader {
    /// Validate the folders named in the configuration.
    pub fn from_config(config: &Config) -> ConfigResult<Self> {
        Self::new(
            config.directories.input_dir(),
            config.directories.output_dir(),
            config.directories.recursive,
            &config.directories.ignore_patterns,
        )
    }

    /// Validate folders and compile ignore patterns.
    ///
    /// The output folder is created when missing and checked for writability.
    pub fn new(
        input_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        recursive: bool,
        ignore_patterns: &[String],
    ) -> ConfigResult<Self> {
        let input_dir = input_dir.into();
        let output_dir = output_dir.into();

        if !input_dir.exists() {
            return Err(ConfigError::InputDirMissing(input_dir));
        }
        if !input_dir.is_dir() {
            return Err(ConfigError::InputNotDirectory(input_dir));
        }

        ensure_writable(&output_dir)?;

        let ignore_patterns = ignore_patterns
            .iter()
            .map(|p| {
                glob::Pattern::new(p)
                    .map_err(|e| ConfigError::Invalid(format!("bad ignore pattern '{}': {}", p, e)))
            })
            .collect::<ConfigResult<Vec<_>>>()?;

        info!("Input directory: {}", input_dir.display());
        info!("Output directory: {}", output_dir.display());

        Ok(Self {
            input_dir,
            output_dir,
            recursive,
            ignore_patterns,
        })
    }

    pub fn input_dir(&self) -> &Path {
        &self.input_dir
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Start a fresh, single-pass enumeration.
    pub fn documents(&self) -> Documents {
        let max_depth = if self.recursive { usize::MAX } else { 1 };
        let output_canonical = self.output_dir.canonicalize().ok();

        let filter: Box<dyn FnMut(&DirEntry) -> bool + Send> = Box::new(move |entry| {
            if entry.depth() == 0 {
                return true;
            }
            if is_hidden(entry) {
                return false;
            }
            // Never descend into the output folder when it sits inside the input folder.
            if entry.file_type().is_dir() {
                if let (Some(out), Ok(dir)) = (&output_canonical, entry.path().canonicalize()) {
                    return &dir != out;
                }
            }
            true
        });

        let walker = WalkDir::new(&self.input_dir)
            .min_depth(0)
            .max_depth(max_depth)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(filter);

        Documents {
            walker,
            input_dir: self.input_dir.clone(),
            ignore_patterns: self.ignore_patterns.clone(),
        }
    }
}

/// A file found in the input folder, not yet read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentEntry {
    pub path: PathBuf,
    /// Path relative to the input folder.
    pub relative_path: PathBuf,
}

impl DocumentEntry {
    pub fn display_name(&self) -> String {
        self.relative_path.to_string_lossy().to_string()
    }

    /// Read the file on the current thread.
    pub fn read(self) -> IngestResult<Document> {
        match std::fs::read(&self.path) {
            Ok(bytes) => Ok(self.into_document(bytes)),
            Err(source) => Err(IngestError::Read {
                path: self.path,
                source,
            }),
        }
    }

    /// Read the file without blocking the async runtime.
    pub async fn load(self) -> IngestResult<Document> {
        debug!("Loading {}", self.path.display());
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(self.into_document(bytes)),
            Err(source) => Err(IngestError::Read {
                path: self.path,
                source,
            }),
        }
    }

    fn into_document(self, bytes: Vec<u8>) -> Document {
        Document::new(self.path, self.relative_path, bytes)
    }
}

/// Lazy iterator over the input folder. Yields entries without reading them.
pub struct Documents {
    walker: walkdir::FilterEntry<walkdir::IntoIter, Box<dyn FnMut(&DirEntry) -> bool + Send>>,
    input_dir: PathBuf,
    ignore_patterns: Vec<glob::Pattern>,
}

impl Documents {
    fn is_ignored(&self, file_name: &str) -> bool {
        self.ignore_patterns.iter().any(|p| p.matches(file_name))
    }
}

impl Iterator for Documents {
    type Item = IngestResult<DocumentEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.walker.next()? {
                Ok(entry) => entry,
                Err(err) => {
                    let path = err
                        .path()
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| self.input_dir.clone());
                    return Some(Err(IngestError::Read {
                        path,
                        source: err.into(),
                    }));
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let file_name = entry.file_name().to_string_lossy();
            if self.is_ignored(&file_name) {
                debug!("Ignoring {}", entry.path().display());
                continue;
            }

            let path = entry.path().to_path_buf();
            let relative_path = path
                .strip_prefix(&self.input_dir)
                .map(Path::to_path_buf)
                .unwrap_or_else(|_| PathBuf::from(entry.file_name()));

            return Some(Ok(DocumentEntry {
                path,
                relative_path,
            }));
        }
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|n| n.starts_with('.'))
        .unwrap_or(false)
}

fn ensure_writable(dir: &Path) -> ConfigResult<()> {
    let not_writable = |reason: String| ConfigError::OutputNotWritable {
        path: dir.to_path_buf(),
        reason,
    };

    if dir.exists() && !dir.is_dir() {
        return Err(not_writable("not a directory".to_string()));
    }
    std::fs::create_dir_all(dir).map_err(|e| not_writable(e.to_string()))?;
    tempfile::NamedTempFile::new_in(dir).map_err(|e| not_writable(e.to_string()))?;
    Ok(())
}
