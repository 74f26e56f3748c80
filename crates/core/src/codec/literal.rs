//! PDF literal string (`(...)`) escaping.
//!
//! Encrypted string payloads travel through the file as literal strings, so
//! the security handler unescapes before decrypting and escapes after
//! encrypting. Only decode -> encode -> decode is guaranteed to be the
//! identity; several escape spellings decode to the same byte.

use crate::error::{PdfError, Result};
use tracing::warn;

/// Unescape a literal string into raw bytes.
///
/// An enclosing `(` `)` pair is optional. Unknown escape sequences keep the
/// escaped character and log a warning.
pub fn unescape_literal(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    let ok: Result<()> = unescape_into(data, &mut out, |pos, byte| {
        warn!(pos, byte, "unknown escape sequence in literal string");
        Ok(())
    });
    debug_assert!(ok.is_ok());
    out
}

/// Unescape a literal string, failing on the first unknown escape sequence.
pub fn unescape_literal_strict(data: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(data.len());
    unescape_into(data, &mut out, |pos, byte| {
        Err(PdfError::UnknownEscapeSequence { pos, byte })
    })?;
    Ok(out)
}

/// Escape raw bytes as a parenthesized literal string.
pub fn escape_literal(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() + data.len() / 4 + 2);
    out.push(b'(');
    for &byte in data {
        match byte {
            0x00 => out.extend_from_slice(b"\\000"),
            0x07 => out.extend_from_slice(b"\\a"),
            0x08 => out.extend_from_slice(b"\\b"),
            b'\t' => out.extend_from_slice(b"\\t"),
            b'\n' => out.extend_from_slice(b"\\n"),
            0x0c => out.extend_from_slice(b"\\f"),
            b'\r' => out.extend_from_slice(b"\\r"),
            b'\\' | b'(' | b')' => {
                out.push(b'\\');
                out.push(byte);
            }
            _ => out.push(byte),
        }
    }
    out.push(b')');
    out
}

/// Strip one enclosing parenthesis pair, if present.
pub(crate) fn strip_parens(data: &[u8]) -> &[u8] {
    match data {
        [b'(', inner @ .., b')'] => inner,
        _ => data,
    }
}

fn unescape_into<F>(data: &[u8], out: &mut Vec<u8>, mut on_unknown: F) -> Result<()>
where
    F: FnMut(usize, u8) -> Result<()>,
{
    let body = strip_parens(data);
    let offset = if body.len() == data.len() { 0 } else { 1 };
    let mut pos = 0;

    while pos < body.len() {
        let byte = body[pos];
        pos += 1;
        if byte != b'\\' {
            out.push(byte);
            continue;
        }

        let Some(&esc) = body.get(pos) else {
            // Trailing backslash has nothing to escape.
            break;
        };
        pos += 1;
        match esc {
            b'n' => out.push(b'\n'),
            b'r' => out.push(b'\r'),
            b't' => out.push(b'\t'),
            b'b' => out.push(0x08),
            b'f' => out.push(0x0c),
            b'a' => out.push(0x07),
            b'v' => out.push(0x0b),
            b'\\' | b'(' | b')' => out.push(esc),
            b'\r' => {
                // Line continuation, CRLF counts as one end of line.
                if body.get(pos) == Some(&b'\n') {
                    pos += 1;
                }
            }
            b'\n' => {}
            b'0'..=b'7' => {
                let mut octal = u32::from(esc - b'0');
                for _ in 0..2 {
                    match body.get(pos) {
                        Some(&d @ b'0'..=b'7') => {
                            octal = octal * 8 + u32::from(d - b'0');
                            pos += 1;
                        }
                        _ => break,
                    }
                }
                out.push((octal & 0xff) as u8);
            }
            other => {
                on_unknown(offset + pos - 1, other)?;
                out.push(other);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unescape_octal_lengths() {
        assert_eq!(unescape_literal(b"(\\0\\12\\101)"), vec![0x00, 0x0a, b'A']);
        // A fourth digit is an ordinary character.
        assert_eq!(unescape_literal(b"(\\0001)"), vec![0x00, b'1']);
    }

    #[test]
    fn test_unescape_octal_overflow_wraps() {
        assert_eq!(unescape_literal(b"\\777"), vec![0xff]);
    }

    #[test]
    fn test_unescape_trailing_backslash() {
        assert_eq!(unescape_literal(b"ab\\"), b"ab");
    }

    #[test]
    fn test_strict_reports_position() {
        let err = unescape_literal_strict(b"(ab\\qc)").unwrap_err();
        match err {
            PdfError::UnknownEscapeSequence { pos, byte } => {
                assert_eq!(pos, 4);
                assert_eq!(byte, b'q');
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_strip_parens() {
        assert_eq!(strip_parens(b"(x)"), b"x");
        assert_eq!(strip_parens(b"x)"), b"x)");
        assert_eq!(strip_parens(b"()"), b"");
        assert_eq!(strip_parens(b"("), b"(");
    }
}
