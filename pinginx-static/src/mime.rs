//! MIME type handling

use std::path::Path;

/// Get MIME type for a file path
pub fn guess_mime_type(path: impl AsRef<Path>) -> &'static str {
    mime_guess::from_path(path)
        .first_raw()
        .unwrap_or("application/octet-stream")
}
