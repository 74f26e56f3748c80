//! PDF hex string (`<...>`) codec.

/// Decode the digits of a hex string.
///
/// Leading non-hex bytes (such as `<` or an enclosing `[`) are skipped; digit
/// pairs are then consumed up to the first non-hex byte. A dangling final
/// nibble is dropped rather than reported.
pub fn hex_decode(data: &[u8]) -> Vec<u8> {
    let start = data
        .iter()
        .position(|b| b.is_ascii_hexdigit())
        .unwrap_or(data.len());
    let digits = &data[start..];
    let run = digits
        .iter()
        .position(|b| !b.is_ascii_hexdigit())
        .unwrap_or(digits.len());

    digits[..run]
        .chunks_exact(2)
        .map(|pair| (hex_nibble(pair[0]) << 4) | hex_nibble(pair[1]))
        .collect()
}

/// Encode bytes as a PDF hex string, two lowercase digits per byte.
pub fn hex_encode(data: &[u8]) -> Vec<u8> {
    const DIGITS: &[u8; 16] = b"0123456789abcdef";

    let mut out = Vec::with_capacity(data.len() * 2 + 2);
    out.push(b'<');
    for &byte in data {
        out.push(DIGITS[(byte >> 4) as usize]);
        out.push(DIGITS[(byte & 0x0f) as usize]);
    }
    out.push(b'>');
    out
}

fn hex_nibble(byte: u8) -> u8 {
    match byte {
        b'0'..=b'9' => byte - b'0',
        b'a'..=b'f' => byte - b'a' + 10,
        b'A'..=b'F' => byte - b'A' + 10,
        _ => 0,
    }
}
