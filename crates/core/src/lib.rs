//! pdfmend - page-tree indexing and RC4 security handling for in-place PDF
//! editing.

pub mod codec;
pub mod config;
pub mod document;
pub mod error;
pub mod model;
pub mod parser;

// Re-export codec modules for convenience
pub use codec::arcfour;
pub use codec::hex;
pub use codec::literal;

// Re-export document modules for convenience
pub use document::catalog;
pub use document::security;
pub use document::store;

pub use config::SecurityConfig;
pub use error::{PdfError, Result};
