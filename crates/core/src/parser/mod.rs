//! PDF syntax parsing.
//!
//! - `lexer`: tokenizer and raw-value dictionary reader

pub mod lexer;

// Re-export main types for convenience
pub use lexer::{Lexer, Token};
