//! Pinginx Static File Server Module
//!
//! - Path resolution that never leaves the configured root
//! - MIME type detection
//! - Directory index files
//! - The built-in welcome page

mod file_server;
mod mime;
mod welcome;

pub use file_server::{DIRECTORY_INDEX, FileServer, ServedFile, clean_join};
pub use mime::guess_mime_type;
pub use welcome::{WELCOME_CONTENT_TYPE, WELCOME_PAGE};
