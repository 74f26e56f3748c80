//! Tokenizer for PDF dictionary syntax.
//!
//! The lexer never decodes string bodies; literal and hex strings are handed
//! out as raw slices so callers can keep the exact bytes of the file and
//! decode them with [`crate::codec`] only when needed.

use crate::error::{PdfError, Result};
use crate::model::objects::{PDFDict, PDFObjRef};

/// Nesting limit for arrays and dictionaries inside one value.
pub const MAX_NESTING_DEPTH: usize = 256;

/// A single token borrowed from the input.
#[derive(Debug, Clone, PartialEq)]
pub enum Token<'a> {
    Int(i64),
    Real(f64),
    /// Name without the leading `/`, `#xx` escapes decoded.
    Name(String),
    /// Literal string including its parentheses.
    Literal(&'a [u8]),
    /// Hex string including its angle brackets.
    Hex(&'a [u8]),
    /// Bare keyword such as `R`, `true`, `null` or `obj`.
    Keyword(&'a [u8]),
    ArrayStart,
    ArrayEnd,
    DictStart,
    DictEnd,
}

impl Token<'_> {
    /// Short type name for error messages.
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Int(_) => "int",
            Self::Real(_) => "real",
            Self::Name(_) => "name",
            Self::Literal(_) | Self::Hex(_) => "string",
            Self::Keyword(_) => "keyword",
            Self::ArrayStart | Self::ArrayEnd => "array",
            Self::DictStart | Self::DictEnd => "dict",
        }
    }
}

/// Tokenizer over a borrowed byte slice.
pub struct Lexer<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Current position in the input.
    pub fn tell(&self) -> usize {
        self.pos
    }

    /// Set the current position.
    pub fn set_pos(&mut self, pos: usize) {
        self.pos = pos.min(self.data.len());
    }

    fn peek(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.data.get(self.pos + offset).copied()
    }

    pub(crate) fn is_whitespace(b: u8) -> bool {
        matches!(b, b' ' | b'\t' | b'\r' | b'\n' | b'\x00' | b'\x0c')
    }

    fn is_delimiter(b: u8) -> bool {
        matches!(
            b,
            b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%'
        )
    }

    fn is_regular(b: u8) -> bool {
        !Self::is_whitespace(b) && !Self::is_delimiter(b)
    }

    /// Skip whitespace and comments.
    pub fn skip_whitespace(&mut self) {
        while let Some(b) = self.peek() {
            if b == b'%' {
                while let Some(c) = self.peek() {
                    if c == b'\r' || c == b'\n' {
                        break;
                    }
                    self.pos += 1;
                }
                continue;
            }
            if !Self::is_whitespace(b) {
                return;
            }
            self.pos += 1;
        }
    }

    /// Read the next token, or `None` at end of input.
    pub fn next_token(&mut self) -> Option<Result<Token<'a>>> {
        self.skip_whitespace();
        let b = self.peek()?;
        let token = match b {
            b'/' => Ok(self.parse_name()),
            b'(' => self.parse_literal_string(),
            b'<' if self.peek_at(1) == Some(b'<') => {
                self.pos += 2;
                Ok(Token::DictStart)
            }
            b'<' => self.parse_hex_string(),
            b'>' if self.peek_at(1) == Some(b'>') => {
                self.pos += 2;
                Ok(Token::DictEnd)
            }
            b'[' => {
                self.pos += 1;
                Ok(Token::ArrayStart)
            }
            b']' => {
                self.pos += 1;
                Ok(Token::ArrayEnd)
            }
            b'+' | b'-' | b'.' | b'0'..=b'9' => self.parse_number(),
            _ if Self::is_regular(b) => Ok(self.parse_keyword()),
            _ => {
                self.pos += 1;
                Err(PdfError::TokenError {
                    pos: self.pos - 1,
                    msg: format!("unexpected byte {b:#04x}"),
                })
            }
        };
        Some(token)
    }

    /// Read the next token, treating end of input as an error.
    pub fn expect_token(&mut self) -> Result<Token<'a>> {
        self.next_token().unwrap_or(Err(PdfError::UnexpectedEof))
    }

    fn parse_name(&mut self) -> Token<'a> {
        self.pos += 1; // Skip '/'
        let mut name = Vec::new();

        while let Some(b) = self.peek() {
            if !Self::is_regular(b) {
                break;
            }
            if b == b'#' {
                let hi = self.peek_at(1).and_then(hex_value);
                let lo = self.peek_at(2).and_then(hex_value);
                if let (Some(hi), Some(lo)) = (hi, lo) {
                    name.push((hi << 4) | lo);
                    self.pos += 3;
                    continue;
                }
            }
            name.push(b);
            self.pos += 1;
        }

        Token::Name(name_from_bytes(&name))
    }

    fn parse_number(&mut self) -> Result<Token<'a>> {
        let start = self.pos;
        let mut has_dot = false;

        if matches!(self.peek(), Some(b'+' | b'-')) {
            self.pos += 1;
        }
        while let Some(b) = self.peek() {
            if b.is_ascii_digit() {
                self.pos += 1;
            } else if b == b'.' && !has_dot {
                has_dot = true;
                self.pos += 1;
            } else {
                break;
            }
        }

        // Input is ASCII by construction of the loop above.
        let s = std::str::from_utf8(&self.data[start..self.pos]).unwrap_or_default();
        if has_dot {
            s.parse::<f64>()
                .map(Token::Real)
                .map_err(|_| PdfError::TokenError {
                    pos: start,
                    msg: format!("invalid real: {s}"),
                })
        } else {
            s.parse::<i64>()
                .map(Token::Int)
                .map_err(|_| PdfError::TokenError {
                    pos: start,
                    msg: format!("invalid int: {s}"),
                })
        }
    }

    fn parse_literal_string(&mut self) -> Result<Token<'a>> {
        let start = self.pos;
        self.pos += 1; // Skip '('
        let mut depth = 1;

        while depth > 0 {
            match self.peek() {
                Some(b'(') => depth += 1,
                Some(b')') => depth -= 1,
                Some(b'\\') => self.pos += 1,
                Some(_) => {}
                None => return Err(PdfError::UnexpectedEof),
            }
            self.pos += 1;
        }

        Ok(Token::Literal(&self.data[start..self.pos]))
    }

    fn parse_hex_string(&mut self) -> Result<Token<'a>> {
        let start = self.pos;
        let end = self.data[start..]
            .iter()
            .position(|&b| b == b'>')
            .ok_or(PdfError::UnexpectedEof)?;
        self.pos = start + end + 1;
        Ok(Token::Hex(&self.data[start..self.pos]))
    }

    fn parse_keyword(&mut self) -> Token<'a> {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if !Self::is_regular(b) {
                break;
            }
            self.pos += 1;
        }
        Token::Keyword(&self.data[start..self.pos])
    }

    /// Skip one complete value and return its raw bytes.
    ///
    /// An `n g R` triple counts as one value. Arrays and dictionaries nested
    /// deeper than [`MAX_NESTING_DEPTH`] are rejected.
    pub fn read_value(&mut self) -> Result<&'a [u8]> {
        self.skip_whitespace();
        let start = self.pos;
        match self.expect_token()? {
            Token::ArrayStart => self.skip_nested(Token::ArrayEnd)?,
            Token::DictStart => self.skip_nested(Token::DictEnd)?,
            Token::Int(_) => {
                let after_first = self.pos;
                if !self.try_ref_tail() {
                    self.pos = after_first;
                }
            }
            Token::ArrayEnd | Token::DictEnd => {
                return Err(PdfError::TokenError {
                    pos: start,
                    msg: "unbalanced closing delimiter".into(),
                });
            }
            _ => {}
        }
        Ok(&self.data[start..self.pos])
    }

    /// After an integer, consume `g R` if it follows.
    fn try_ref_tail(&mut self) -> bool {
        matches!(self.next_token(), Some(Ok(Token::Int(_))))
            && matches!(self.next_token(), Some(Ok(Token::Keyword(b"R"))))
    }

    /// Skip past the delimiter matching an already consumed opener.
    fn skip_nested(&mut self, close: Token<'static>) -> Result<()> {
        let mut pending = vec![close];
        while let Some(close) = pending.last().cloned() {
            self.skip_whitespace();
            let pos = self.pos;
            let token = self.expect_token()?;
            if token == close {
                pending.pop();
                continue;
            }
            let opened = match token {
                Token::ArrayStart => Token::ArrayEnd,
                Token::DictStart => Token::DictEnd,
                Token::ArrayEnd | Token::DictEnd => {
                    return Err(PdfError::TokenError {
                        pos,
                        msg: "mismatched closing delimiter".into(),
                    });
                }
                _ => continue,
            };
            if pending.len() >= MAX_NESTING_DEPTH {
                return Err(PdfError::TokenError {
                    pos,
                    msg: format!(
                        "arrays and dictionaries nested deeper than {MAX_NESTING_DEPTH}"
                    ),
                });
            }
            pending.push(opened);
        }
        Ok(())
    }

    /// Parse a `<< ... >>` dictionary starting at the current position.
    ///
    /// Values are stored as raw syntax. Duplicate keys keep the first value.
    pub fn parse_dict(&mut self) -> Result<PDFDict> {
        self.skip_whitespace();
        let start = self.pos;
        match self.expect_token()? {
            Token::DictStart => {}
            other => {
                return Err(PdfError::TokenError {
                    pos: start,
                    msg: format!("expected dictionary, got {}", other.type_name()),
                });
            }
        }

        let mut dict = PDFDict::new();
        loop {
            self.skip_whitespace();
            let pos = self.pos;
            match self.expect_token()? {
                Token::DictEnd => return Ok(dict),
                Token::Name(key) => {
                    let raw = self.read_value()?;
                    dict.insert(key, raw);
                }
                other => {
                    return Err(PdfError::TokenError {
                        pos,
                        msg: format!("expected name key, got {}", other.type_name()),
                    });
                }
            }
        }
    }

    /// Parse an `n g R` reference at the current position.
    pub fn parse_ref(&mut self) -> Result<PDFObjRef> {
        self.skip_whitespace();
        let pos = self.pos;
        let objid = self.expect_token()?;
        let genno = self.expect_token()?;
        let keyword = self.expect_token()?;
        match (objid, genno, keyword) {
            (Token::Int(objid), Token::Int(genno), Token::Keyword(b"R")) => {
                let objid = u32::try_from(objid).map_err(|_| PdfError::TokenError {
                    pos,
                    msg: format!("object id out of range: {objid}"),
                })?;
                let genno = u32::try_from(genno).map_err(|_| PdfError::TokenError {
                    pos,
                    msg: format!("generation out of range: {genno}"),
                })?;
                Ok(PDFObjRef::new(objid, genno))
            }
            (first, _, _) => Err(PdfError::TypeError {
                expected: "ref",
                got: first.type_name(),
            }),
        }
    }
}

fn hex_value(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

pub(crate) fn name_from_bytes(bytes: &[u8]) -> String {
    let mut name = String::with_capacity(bytes.len());
    for &b in bytes {
        name.push(char::from(b));
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(data: &[u8]) -> Vec<Token<'_>> {
        let mut lexer = Lexer::new(data);
        std::iter::from_fn(|| lexer.next_token())
            .collect::<Result<Vec<_>>>()
            .unwrap()
    }

    #[test]
    fn test_tokens_basic() {
        assert_eq!(
            tokens(b"/Type /Pages 12 -3.5 true"),
            vec![
                Token::Name("Type".into()),
                Token::Name("Pages".into()),
                Token::Int(12),
                Token::Real(-3.5),
                Token::Keyword(b"true"),
            ]
        );
    }

    #[test]
    fn test_name_hex_escape() {
        assert_eq!(tokens(b"/A#20B"), vec![Token::Name("A B".into())]);
    }

    #[test]
    fn test_literal_string_nesting_and_escapes() {
        let data = b"(a(b)c\\)) 1";
        assert_eq!(
            tokens(data),
            vec![Token::Literal(b"(a(b)c\\))"), Token::Int(1)]
        );
    }

    #[test]
    fn test_comment_skipped() {
        assert_eq!(tokens(b"% note\n42"), vec![Token::Int(42)]);
    }

    #[test]
    fn test_read_value_ref_and_array() {
        let mut lexer = Lexer::new(b" 3 0 R [1 [2] <<>>] 7 8");
        assert_eq!(lexer.read_value().unwrap(), b"3 0 R");
        assert_eq!(lexer.read_value().unwrap(), b"[1 [2] <<>>]");
        assert_eq!(lexer.read_value().unwrap(), b"7");
        assert_eq!(lexer.read_value().unwrap(), b"8");
    }

    #[test]
    fn test_read_value_nesting_limit() {
        let mut deep = b"<< /A ".to_vec();
        deep.extend(std::iter::repeat_n(b'[', 200_000));
        deep.extend(std::iter::repeat_n(b']', 200_000));
        deep.extend_from_slice(b" >>");
        assert!(matches!(
            PDFDict::parse(&deep),
            Err(PdfError::TokenError { .. })
        ));

        let mut shallow = b"<< /A ".to_vec();
        shallow.extend(std::iter::repeat_n(b'[', MAX_NESTING_DEPTH));
        shallow.extend(std::iter::repeat_n(b']', MAX_NESTING_DEPTH));
        shallow.extend_from_slice(b" /B 1 >>");
        let dict = PDFDict::parse(&shallow).unwrap();
        assert_eq!(dict.get_int("B").unwrap(), 1);
    }

    #[test]
    fn test_read_value_mismatched_close() {
        let mut lexer = Lexer::new(b"[1 << /K 2 ] >>");
        assert!(matches!(
            lexer.read_value(),
            Err(PdfError::TokenError { .. })
        ));
    }

    #[test]
    fn test_unterminated_literal() {
        let mut lexer = Lexer::new(b"(abc");
        assert!(matches!(
            lexer.next_token(),
            Some(Err(PdfError::UnexpectedEof))
        ));
    }
}
