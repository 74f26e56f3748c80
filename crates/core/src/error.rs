//! Error types for pdfmend.

use thiserror::Error;

/// Primary error type for page-tree and security handler operations.
#[derive(Error, Debug)]
pub enum PdfError {
    #[error("catalog has no /Pages reference")]
    MissingPagesReference,

    #[error("unresolved indirect object {objid} {genno} R")]
    UnresolvedIndirectObject { objid: u32, genno: u32 },

    #[error("malformed page tree at object {objid}: {reason}")]
    MalformedPageTree { objid: u32, reason: String },

    #[error("page {page} out of range (document has {count} pages)")]
    OutOfRange { page: usize, count: usize },

    #[error("malformed encryption entry /{key}: {reason}")]
    MalformedEncryptionDict { key: &'static str, reason: String },

    #[error("unknown escape sequence at position {pos}: byte {byte:#04x}")]
    UnknownEscapeSequence { pos: usize, byte: u8 },

    #[error("PDF object not found: {0}")]
    ObjectNotFound(u32),

    #[error("key not found: {0}")]
    KeyError(String),

    #[error("type error: expected {expected}, got {got}")]
    TypeError {
        expected: &'static str,
        got: &'static str,
    },

    #[error("invalid token at position {pos}: {msg}")]
    TokenError { pos: usize, msg: String },

    #[error("PDF syntax error: {0}")]
    SyntaxError(String),

    #[error("unexpected end of input")]
    UnexpectedEof,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type alias for PdfError.
pub type Result<T> = std::result::Result<T, PdfError>;
