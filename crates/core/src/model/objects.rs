//! PDF object references and the raw-syntax dictionary view.
//!
//! Dictionaries keep each value as the exact bytes found in the file. Typed
//! accessors tokenize a value only when it is read, so an edited document can
//! be written back with every untouched entry byte-for-byte intact.

use crate::codec::{hex_decode, unescape_literal};
use crate::error::{PdfError, Result};
use crate::parser::lexer::{Lexer, Token};
use indexmap::IndexMap;
use indexmap::map::Entry;
use std::fmt;

/// PDF indirect object reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PDFObjRef {
    /// Object ID
    pub objid: u32,
    /// Generation number
    pub genno: u32,
}

impl PDFObjRef {
    /// Create a new object reference.
    pub const fn new(objid: u32, genno: u32) -> Self {
        Self { objid, genno }
    }
}

impl fmt::Display for PDFObjRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} R", self.objid, self.genno)
    }
}

/// Ordered PDF dictionary with raw-syntax values.
///
/// Keys are names without the leading `/`. Insertion order is preserved and
/// the first occurrence of a duplicated key wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PDFDict {
    entries: IndexMap<String, Vec<u8>>,
}

impl PDFDict {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `<< ... >>` syntax.
    pub fn parse(data: &[u8]) -> Result<Self> {
        Lexer::new(data).parse_dict()
    }

    /// Add an entry unless the key is already present.
    ///
    /// Returns `false` when an earlier value shadows this one.
    pub fn insert(&mut self, key: impl Into<String>, raw: impl AsRef<[u8]>) -> bool {
        match self.entries.entry(key.into()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(trim(raw.as_ref()).to_vec());
                true
            }
        }
    }

    /// Replace (or append) an entry, keeping its original position.
    pub fn set(&mut self, key: impl Into<String>, raw: impl AsRef<[u8]>) {
        self.entries
            .insert(key.into(), trim(raw.as_ref()).to_vec());
    }

    /// Raw syntax of a value.
    pub fn get(&self, key: &str) -> Option<&[u8]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.entries
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    fn require(&self, key: &str) -> Result<&[u8]> {
        self.get(key)
            .ok_or_else(|| PdfError::KeyError(key.to_string()))
    }

    fn first_token(&self, key: &str) -> Result<Token<'_>> {
        Lexer::new(self.require(key)?).expect_token()
    }

    /// Get as integer
    pub fn get_int(&self, key: &str) -> Result<i64> {
        let raw = self.require(key)?;
        let mut lexer = Lexer::new(raw);
        match lexer.expect_token()? {
            Token::Int(n) => {
                if lexer.next_token().is_some() {
                    // `n g R` and other compound values are not integers.
                    return Err(PdfError::TypeError {
                        expected: "int",
                        got: "ref",
                    });
                }
                Ok(n)
            }
            other => Err(PdfError::TypeError {
                expected: "int",
                got: other.type_name(),
            }),
        }
    }

    /// Get as name string
    pub fn get_name(&self, key: &str) -> Result<String> {
        match self.first_token(key)? {
            Token::Name(name) => Ok(name),
            other => Err(PdfError::TypeError {
                expected: "name",
                got: other.type_name(),
            }),
        }
    }

    /// Get as boolean
    pub fn get_bool(&self, key: &str) -> Result<bool> {
        match self.first_token(key)? {
            Token::Keyword(b"true") => Ok(true),
            Token::Keyword(b"false") => Ok(false),
            other => Err(PdfError::TypeError {
                expected: "bool",
                got: other.type_name(),
            }),
        }
    }

    /// Get as decoded byte string.
    ///
    /// Accepts literal or hex syntax. For an array (such as the trailer `ID`)
    /// the first element is used.
    pub fn get_bytes(&self, key: &str) -> Result<Vec<u8>> {
        let mut lexer = Lexer::new(self.require(key)?);
        let mut token = lexer.expect_token()?;
        if token == Token::ArrayStart {
            token = lexer.expect_token()?;
        }
        match token {
            Token::Literal(raw) => Ok(unescape_literal(raw)),
            Token::Hex(raw) => Ok(hex_decode(raw)),
            other => Err(PdfError::TypeError {
                expected: "string",
                got: other.type_name(),
            }),
        }
    }

    /// Get as indirect reference.
    pub fn get_ref(&self, key: &str) -> Result<PDFObjRef> {
        Lexer::new(self.require(key)?).parse_ref()
    }

    /// Get as an array of indirect references.
    pub fn get_refs(&self, key: &str) -> Result<Vec<PDFObjRef>> {
        let mut lexer = Lexer::new(self.require(key)?);
        match lexer.expect_token()? {
            Token::ArrayStart => {}
            other => {
                return Err(PdfError::TypeError {
                    expected: "array",
                    got: other.type_name(),
                });
            }
        }

        let mut refs = Vec::new();
        loop {
            lexer.skip_whitespace();
            let pos = lexer.tell();
            if lexer.expect_token()? == Token::ArrayEnd {
                return Ok(refs);
            }
            lexer.set_pos(pos);
            refs.push(lexer.parse_ref()?);
        }
    }
}

impl fmt::Display for PDFDict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<<")?;
        for (key, raw) in self.iter() {
            write!(f, " /{key} {}", String::from_utf8_lossy(raw))?;
        }
        write!(f, " >>")
    }
}

fn trim(raw: &[u8]) -> &[u8] {
    let start = raw
        .iter()
        .position(|&b| !Lexer::is_whitespace(b))
        .unwrap_or(raw.len());
    let end = raw
        .iter()
        .rposition(|&b| !Lexer::is_whitespace(b))
        .map_or(start, |i| i + 1);
    &raw[start..end]
}
