//! Corpus loading: walk a directory tree and read matching files as UTF-8.
//!
//! Files are returned in lexicographic path order so repeated runs over the
//! same tree see the same sequence. Symlinks are followed; a link cycle is an
//! ingestion error. Undecodable or unreadable files fail the
//! whole load; the caller decides whether that aborts startup.

use globset::{Glob, GlobMatcher};
use std::fs;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::types::RawDocument;

pub const DEFAULT_PATTERN: &str = "*.md";

pub struct DocumentLoader {
    matcher: GlobMatcher,
}

impl DocumentLoader {
    /// `pattern` is a glob matched against each file name (not the full path).
    pub fn new(pattern: &str) -> Result<Self> {
        let glob = Glob::new(pattern)
            .map_err(|e| Error::Config(format!("invalid file pattern '{pattern}': {e}")))?;
        Ok(Self { matcher: glob.compile_matcher() })
    }

    pub fn load(&self, root: &Path) -> Result<Vec<RawDocument>> {
        if !root.is_dir() {
            return Err(Error::Ingestion {
                path: root.to_path_buf(),
                message: "corpus root is not a directory".to_string(),
            });
        }
        self.list_files(root)?
            .iter()
            .map(|path| read_document(root, path))
            .collect()
    }

    fn list_files(&self, root: &Path) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in WalkDir::new(root).follow_links(true) {
            let entry = entry.map_err(|e| Error::Ingestion {
                path: e.path().map_or_else(|| root.to_path_buf(), Path::to_path_buf),
                message: e.to_string(),
            })?;
            if entry.file_type().is_file() && self.matcher.is_match(entry.file_name()) {
                files.push(entry.into_path());
            }
        }
        files.sort();
        Ok(files)
    }
}

/// Load every `*.md` file under `root`.
pub fn load_markdown(root: &Path) -> Result<Vec<RawDocument>> {
    DocumentLoader::new(DEFAULT_PATTERN)?.load(root)
}

fn read_document(root: &Path, path: &Path) -> Result<RawDocument> {
    let bytes = fs::read(path).map_err(|e| Error::Ingestion {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let text = String::from_utf8(bytes).map_err(|e| Error::Ingestion {
        path: path.to_path_buf(),
        message: format!("not valid UTF-8: {e}"),
    })?;
    Ok(RawDocument { text, source: source_id(root, path) })
}

/// Path of `path` relative to `root`, joined with `/` on every platform.
fn source_id(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
