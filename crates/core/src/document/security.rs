//! PDF Standard Security Handler (RC4).
//!
//! Covers V=1/2 (and the RC4 flavour of V=4) with revisions 2-4. Keys are
//! derived with MD5; strings and streams are encrypted with RC4 under a
//! per-object key.

use crate::codec::arcfour::Arcfour;
use crate::codec::literal::{escape_literal, strip_parens, unescape_literal};
use crate::config::SecurityConfig;
use crate::error::{PdfError, Result};
use crate::model::objects::PDFDict;
use once_cell::sync::OnceCell;
use tracing::debug;

/// Padding string appended to passwords before hashing (Algorithm 2).
pub const PASSWORD_PADDING: [u8; 32] = [
    0x28, 0xBF, 0x4E, 0x5E, 0x4E, 0x75, 0x8A, 0x41, 0x64, 0x00, 0x4E, 0x56, 0xFF, 0xFA, 0x01, 0x08,
    0x2E, 0x2E, 0x00, 0xB6, 0xD0, 0x68, 0x3E, 0x80, 0x2F, 0x0C, 0xA9, 0xFE, 0x64, 0x53, 0x69, 0x7A,
];

/// Trait for PDF security handlers.
///
/// Encryption and decryption are the same keystream XOR, so implementors only
/// provide [`PDFSecurityHandler::convert`].
pub trait PDFSecurityHandler: Send + Sync {
    /// Encrypt or decrypt `data` in place for object `objid`/`genno`.
    fn convert(&self, objid: u32, genno: u32, data: &mut [u8]);

    /// Encrypt raw bytes and return them as a literal string.
    ///
    /// One enclosing pair of parentheses around `raw` is dropped first.
    fn encrypt(&self, objid: u32, genno: u32, raw: &[u8]) -> Vec<u8> {
        let mut buf = strip_parens(raw).to_vec();
        self.convert(objid, genno, &mut buf);
        escape_literal(&buf)
    }

    /// Unescape a literal string and decrypt it.
    fn decrypt(&self, objid: u32, genno: u32, literal: &[u8]) -> Vec<u8> {
        let mut buf = unescape_literal(literal);
        self.convert(objid, genno, &mut buf);
        buf
    }

    /// [`PDFSecurityHandler::decrypt`] into the caller's buffer.
    ///
    /// Returns the decoded length.
    fn decrypt_in_place(&self, objid: u32, genno: u32, buf: &mut Vec<u8>) -> usize {
        *buf = unescape_literal(buf);
        self.convert(objid, genno, buf);
        buf.len()
    }
}

/// Permission flags (the `P` entry).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Permissions(pub u32);

impl Permissions {
    const fn bit(self, n: u32) -> bool {
        self.0 & (1 << (n - 1)) != 0
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn can_print(self) -> bool {
        self.bit(3)
    }

    pub const fn can_modify(self) -> bool {
        self.bit(4)
    }

    pub const fn can_copy(self) -> bool {
        self.bit(5)
    }

    pub const fn can_annotate(self) -> bool {
        self.bit(6)
    }

    pub const fn can_fill_forms(self) -> bool {
        self.bit(9)
    }

    pub const fn can_extract_for_accessibility(self) -> bool {
        self.bit(10)
    }

    pub const fn can_assemble(self) -> bool {
        self.bit(11)
    }

    pub const fn can_print_high_quality(self) -> bool {
        self.bit(12)
    }
}

/// PDF Standard Security Handler with RC4 encryption.
///
/// Supports:
/// - V=1, R=2: 40-bit RC4
/// - V=2, R=3: variable-length RC4 (40 to 128 bits)
/// - R=4 with RC4 crypt filters, including `EncryptMetadata false`
#[derive(Debug)]
pub struct StandardSecurityHandler {
    filter: String,
    sub_filter: String,
    /// Algorithm version (0 normalized to 1).
    v: i64,
    /// Key length in bits, in [40, 128] and a multiple of 8.
    length: usize,
    /// Revision number.
    r: i64,
    /// Owner password hash (O value).
    o: Vec<u8>,
    /// User password hash (U value).
    u: Vec<u8>,
    /// Permission flags (P value).
    p: u32,
    /// First element of the trailer ID.
    identifier: Vec<u8>,
    encrypt_metadata: bool,
    password: Vec<u8>,
    /// Computed on first use.
    file_key: OnceCell<Vec<u8>>,
}

impl StandardSecurityHandler {
    /// Build a handler with an empty user password.
    ///
    /// Missing or unparseable entries fall back to defaults; the handler is
    /// always built, but a damaged dictionary yields a key that decrypts to
    /// garbage.
    pub fn from_trailer_and_encrypt_dict(trailer: &PDFDict, encrypt: &PDFDict) -> Self {
        Self::build(trailer, encrypt, Vec::new())
    }

    /// Build a handler with a password and, optionally, strict validation.
    pub fn with_config(
        trailer: &PDFDict,
        encrypt: &PDFDict,
        config: &SecurityConfig,
    ) -> Result<Self> {
        if config.strict {
            validate(trailer, encrypt)?;
        }
        Ok(Self::build(trailer, encrypt, config.password.clone()))
    }

    fn build(trailer: &PDFDict, encrypt: &PDFDict, password: Vec<u8>) -> Self {
        let identifier = lenient(trailer.get_bytes("ID"), "ID").unwrap_or_default();
        let filter = lenient(encrypt.get_name("Filter"), "Filter").unwrap_or_default();
        let sub_filter = lenient(encrypt.get_name("SubFilter"), "SubFilter").unwrap_or_default();
        let v = match lenient(encrypt.get_int("V"), "V").unwrap_or(0) {
            0 => 1,
            v => v,
        };
        let length = normalize_length(lenient(encrypt.get_int("Length"), "Length").unwrap_or(40));
        let r = lenient(encrypt.get_int("R"), "R").unwrap_or(0);
        let o = lenient(encrypt.get_bytes("O"), "O").unwrap_or_default();
        let u = lenient(encrypt.get_bytes("U"), "U").unwrap_or_default();
        // P is signed in the file; keep the bit pattern.
        let p = lenient(encrypt.get_int("P"), "P").unwrap_or(0) as u32;
        let encrypt_metadata = !matches!(encrypt.get_bool("EncryptMetadata"), Ok(false));

        Self {
            filter,
            sub_filter,
            v,
            length,
            r,
            o,
            u,
            p,
            identifier,
            encrypt_metadata,
            password,
            file_key: OnceCell::new(),
        }
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn sub_filter(&self) -> &str {
        &self.sub_filter
    }

    pub fn version(&self) -> i64 {
        self.v
    }

    pub fn revision(&self) -> i64 {
        self.r
    }

    /// Key length in bits.
    pub fn key_length(&self) -> usize {
        self.length
    }

    pub fn identifier(&self) -> &[u8] {
        &self.identifier
    }

    pub fn encrypt_metadata(&self) -> bool {
        self.encrypt_metadata
    }

    pub fn permissions(&self) -> Permissions {
        Permissions(self.p)
    }

    fn key_bytes(&self) -> usize {
        self.length / 8
    }

    /// The document file key, derived on first use.
    pub fn file_key(&self) -> &[u8] {
        self.file_key.get_or_init(|| self.compute_file_key(&self.password))
    }

    /// Compute the file key for a user password (Algorithm 2).
    fn compute_file_key(&self, password: &[u8]) -> Vec<u8> {
        let n = self.key_bytes();

        let mut context = md5::Context::new();
        context.consume(pad_password(password));
        context.consume(&self.o);
        context.consume(self.p.to_le_bytes());
        context.consume(&self.identifier);
        if self.r > 3 && !self.encrypt_metadata {
            context.consume([0xff; 4]);
        }
        let mut digest = context.finalize().0;

        if self.r > 2 {
            for _ in 0..50 {
                digest = md5::compute(&digest[..n]).0;
            }
        }

        digest[..n].to_vec()
    }

    /// Derive the RC4 key for one object (Algorithm 1).
    pub fn object_key(&self, objid: u32, genno: u32) -> Vec<u8> {
        let file_key = self.file_key();
        let mut material = Vec::with_capacity(file_key.len() + 5);
        material.extend_from_slice(file_key);
        material.extend_from_slice(&objid.to_le_bytes()[..3]);
        material.extend_from_slice(&genno.to_le_bytes()[..2]);

        let digest = md5::compute(&material);
        let key_len = (self.key_bytes() + 5).min(16);
        digest.0[..key_len].to_vec()
    }

    /// Compute the U value for a file key (Algorithms 4 and 5).
    fn compute_u_value(&self, key: &[u8]) -> Vec<u8> {
        if self.r == 2 {
            return Arcfour::new(key).process(&PASSWORD_PADDING);
        }

        let mut context = md5::Context::new();
        context.consume(PASSWORD_PADDING);
        context.consume(&self.identifier);
        let hash = context.finalize();

        let mut result = hash.0.to_vec();
        Arcfour::new(key).process_in_place(&mut result);
        for i in 1..20u8 {
            let xor_key: Vec<u8> = key.iter().map(|b| b ^ i).collect();
            Arcfour::new(&xor_key).process_in_place(&mut result);
        }
        result
    }

    fn matches_u_value(&self, key: &[u8]) -> bool {
        let computed = self.compute_u_value(key);
        if self.r == 2 {
            computed == self.u
        } else {
            self.u.len() >= 16 && computed[..16] == self.u[..16]
        }
    }

    /// Check the configured password against the U entry (Algorithm 6).
    pub fn verify_user_password(&self) -> bool {
        self.matches_u_value(self.file_key())
    }

    /// Recover the user password from the owner password (Algorithm 7).
    ///
    /// Returns `None` when `owner_password` is wrong.
    pub fn recover_user_password(&self, owner_password: &[u8]) -> Option<Vec<u8>> {
        let n = self.key_bytes();
        let mut hash = md5::compute(pad_password(owner_password)).0;
        if self.r >= 3 {
            for _ in 0..50 {
                hash = md5::compute(hash).0;
            }
        }
        let key = &hash[..n];

        let mut user_password = self.o.clone();
        if self.r == 2 {
            Arcfour::new(key).process_in_place(&mut user_password);
        } else {
            for i in (0..20u8).rev() {
                let xor_key: Vec<u8> = key.iter().map(|b| b ^ i).collect();
                Arcfour::new(&xor_key).process_in_place(&mut user_password);
            }
        }

        let file_key = self.compute_file_key(&user_password);
        if !self.matches_u_value(&file_key) {
            return None;
        }
        Some(unpad_password(&user_password).to_vec())
    }
}

impl PDFSecurityHandler for StandardSecurityHandler {
    fn convert(&self, objid: u32, genno: u32, data: &mut [u8]) {
        let key = self.object_key(objid, genno);
        Arcfour::new(&key).process_in_place(data);
    }
}

/// Create a security handler from the trailer and its /Encrypt dictionary.
///
/// Returns `Ok(None)` for an empty dictionary, meaning the document is not
/// encrypted.
pub fn create_security_handler(
    trailer: &PDFDict,
    encrypt: &PDFDict,
    config: &SecurityConfig,
) -> Result<Option<Box<dyn PDFSecurityHandler>>> {
    if encrypt.is_empty() {
        return Ok(None);
    }
    let handler = StandardSecurityHandler::with_config(trailer, encrypt, config)?;
    Ok(Some(Box::new(handler)))
}

/// Pad or truncate a password to 32 bytes.
fn pad_password(password: &[u8]) -> [u8; 32] {
    let mut padded = [0u8; 32];
    let len = password.len().min(32);
    padded[..len].copy_from_slice(&password[..len]);
    padded[len..].copy_from_slice(&PASSWORD_PADDING[..32 - len]);
    padded
}

/// Strip the padding that [`pad_password`] appended.
fn unpad_password(padded: &[u8]) -> &[u8] {
    let cut = (0..=padded.len())
        .find(|&k| {
            let tail = &padded[k..];
            tail.len() <= 32 && tail == &PASSWORD_PADDING[..tail.len()]
        })
        .unwrap_or(padded.len());
    &padded[..cut]
}

/// Clamp to [40, 128] bits and round down to whole bytes.
fn normalize_length(bits: i64) -> usize {
    let bits = bits.clamp(40, 128) as usize;
    bits - bits % 8
}

fn lenient<T>(value: Result<T>, key: &str) -> Option<T> {
    match value {
        Ok(v) => Some(v),
        Err(err) => {
            debug!(key, %err, "encryption entry unavailable, using default");
            None
        }
    }
}

fn validate(trailer: &PDFDict, encrypt: &PDFDict) -> Result<()> {
    fn malformed(key: &'static str, reason: impl ToString) -> PdfError {
        PdfError::MalformedEncryptionDict {
            key,
            reason: reason.to_string(),
        }
    }

    let filter = encrypt.get_name("Filter").map_err(|e| malformed("Filter", e))?;
    if filter != "Standard" {
        return Err(malformed(
            "Filter",
            format!("unsupported security handler /{filter}"),
        ));
    }

    let r = encrypt.get_int("R").map_err(|e| malformed("R", e))?;
    if !(2..=4).contains(&r) {
        return Err(malformed("R", format!("unsupported revision {r}")));
    }

    for key in ["O", "U"] {
        let value = encrypt.get_bytes(key).map_err(|e| malformed(key, e))?;
        if value.len() < 32 {
            return Err(malformed(
                key,
                format!("expected 32 bytes, got {}", value.len()),
            ));
        }
    }

    encrypt.get_int("P").map_err(|e| malformed("P", e))?;

    if encrypt.contains_key("Length") {
        let length = encrypt.get_int("Length").map_err(|e| malformed("Length", e))?;
        if !(40..=128).contains(&length) || length % 8 != 0 {
            return Err(malformed(
                "Length",
                format!("key length {length} is not a multiple of 8 in 40..=128"),
            ));
        }
    }

    trailer.get_bytes("ID").map_err(|e| malformed("ID", e))?;
    Ok(())
}
