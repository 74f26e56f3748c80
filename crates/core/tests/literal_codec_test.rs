//! Literal and hex string codec tests.

use pdfmend_core::PdfError;
use pdfmend_core::hex::{hex_decode, hex_encode};
use pdfmend_core::literal::{escape_literal, unescape_literal, unescape_literal_strict};

#[test]
fn test_unescape_simple_escapes() {
    let out = unescape_literal(b"(a\\(b\\)c\\n)");
    assert_eq!(out, b"a(b)c\n");
    assert_eq!(out.len(), 6);
}

#[test]
fn test_unescape_named_escapes() {
    assert_eq!(
        unescape_literal(b"\\n\\r\\t\\b\\f\\a\\v\\\\"),
        vec![b'\n', b'\r', b'\t', 0x08, 0x0c, 0x07, 0x0b, b'\\']
    );
}

#[test]
fn test_unescape_without_parens() {
    assert_eq!(unescape_literal(b"plain"), b"plain");
    assert_eq!(unescape_literal(b""), b"");
    assert_eq!(unescape_literal(b"()"), b"");
}

#[test]
fn test_unescape_line_continuation() {
    assert_eq!(unescape_literal(b"(ab\\\ncd)"), b"abcd");
    assert_eq!(unescape_literal(b"(ab\\\r\ncd)"), b"abcd");
    assert_eq!(unescape_literal(b"(ab\\\rcd)"), b"abcd");
}

#[test]
fn test_unescape_unknown_escape_keeps_char() {
    assert_eq!(unescape_literal(b"(\\q)"), b"q");
}

#[test]
fn test_strict_rejects_unknown_escape() {
    assert!(matches!(
        unescape_literal_strict(b"\\z"),
        Err(PdfError::UnknownEscapeSequence { pos: 1, byte: b'z' })
    ));
    assert_eq!(unescape_literal_strict(b"(\\101)").unwrap(), b"A");
}

#[test]
fn test_escape_special_bytes() {
    assert_eq!(escape_literal(b"a(b)c\\"), b"(a\\(b\\)c\\\\)");
    assert_eq!(escape_literal(&[0x00]), b"(\\000)");
    assert_eq!(escape_literal(b"\n\r\t"), b"(\\n\\r\\t)");
    assert_eq!(escape_literal(&[0x0b]), vec![b'(', 0x0b, b')']);
    assert_eq!(escape_literal(b""), b"()");
}

#[test]
fn test_escape_then_unescape_all_bytes() {
    let raw: Vec<u8> = (0..=255u8).collect();
    assert_eq!(unescape_literal(&escape_literal(&raw)), raw);
    assert_eq!(unescape_literal_strict(&escape_literal(&raw)).unwrap(), raw);
}

#[test]
fn test_decode_encode_decode_is_stable() {
    let literal = b"(\\101\\0\\q x\\\ny)";
    let once = unescape_literal(literal);
    let twice = unescape_literal(&escape_literal(&once));
    assert_eq!(once, twice);
}

#[test]
fn test_hex_decode() {
    assert_eq!(hex_decode(b"<48656C6C6F>"), b"Hello");
    assert_eq!(hex_decode(b"48656c6c6f"), b"Hello");
    // Odd trailing nibble is dropped.
    assert_eq!(hex_decode(b"<414>"), b"A");
    // Decoding stops at the first non-hex byte.
    assert_eq!(hex_decode(b"<41 42>"), b"A");
    assert!(hex_decode(b"<>").is_empty());
}

#[test]
fn test_hex_encode() {
    assert_eq!(hex_encode(b"\x00\xff"), b"<00ff>");
    assert_eq!(hex_decode(&hex_encode(b"round")), b"round");
}
