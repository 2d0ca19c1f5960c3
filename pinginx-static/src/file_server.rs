//! File server implementation

use crate::mime::guess_mime_type;
use bytes::Bytes;
use pinginx_core::error::Result;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

/// File served for a directory request
pub const DIRECTORY_INDEX: &str = "index.html";

/// Static file server rooted at one directory
#[derive(Debug, Clone)]
pub struct FileServer {
    root: PathBuf,
}

/// A file read from disk
#[derive(Debug)]
pub struct ServedFile {
    pub content: Bytes,
    pub mime_type: String,
    pub path: PathBuf,
    pub last_modified: Option<String>,
}

impl FileServer {
    /// Create a file server for a directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a request path below the root, e.g. `/static/app.js` under
    /// `/srv/www` to `/srv/www/static/app.js`.
    pub fn resolve(&self, path: &str) -> PathBuf {
        clean_join(&self.root, path)
    }

    /// Read the file at `path`. Directories serve their `index.html`.
    ///
    /// Returns `Ok(None)` when there is nothing to serve.
    pub async fn serve(&self, path: &str) -> Result<Option<ServedFile>> {
        let mut file_path = self.resolve(path);
        tracing::debug!("📁 Serving request: {} -> {:?}", path, file_path);

        let metadata = match tokio::fs::metadata(&file_path).await {
            Ok(m) => m,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let metadata = if metadata.is_dir() {
            file_path.push(DIRECTORY_INDEX);
            match tokio::fs::metadata(&file_path).await {
                Ok(m) if m.is_file() => m,
                _ => return Ok(None),
            }
        } else {
            metadata
        };

        let last_modified = metadata.modified().ok().map(httpdate::fmt_http_date);
        let content = tokio::fs::read(&file_path).await?;

        Ok(Some(ServedFile {
            content: Bytes::from(content),
            mime_type: guess_mime_type(&file_path).to_string(),
            path: file_path,
            last_modified,
        }))
    }
}

/// Join `path` below `base` after lexically cleaning it.
///
/// `.` and empty segments are dropped and `..` never climbs above `base`.
pub fn clean_join(base: &Path, path: &str) -> PathBuf {
    let mut cleaned = PathBuf::new();
    for component in Path::new(path).components() {
        match component {
            Component::Normal(segment) => cleaned.push(segment),
            Component::ParentDir => {
                cleaned.pop();
            }
            Component::RootDir | Component::CurDir | Component::Prefix(_) => {}
        }
    }
    base.join(cleaned)
}
