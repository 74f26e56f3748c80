//! Byte-level codecs used by the security handler.
//!
//! This module contains:
//! - `arcfour`: RC4 stream cipher
//! - `hex`: PDF hex string decode/encode
//! - `literal`: PDF literal string escape/unescape

pub mod arcfour;
pub mod hex;
pub mod literal;

// Re-export main functions for convenience
pub use self::arcfour::Arcfour;
pub use self::hex::{hex_decode, hex_encode};
pub use self::literal::{escape_literal, unescape_literal, unescape_literal_strict};
