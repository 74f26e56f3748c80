//! Object resolution.
//!
//! [`ObjectResolver`] is the seam between the page-tree walk and whatever
//! parser produced the document's objects. [`ObjectStore`] is a simple
//! in-memory implementation that can also be filled by scanning an
//! uncompressed PDF for `N G obj << ... >>` definitions.

use crate::error::{PdfError, Result};
use crate::model::objects::{PDFDict, PDFObjRef};
use crate::parser::lexer::Lexer;
use indexmap::IndexMap;
use regex::bytes::Regex;
use tracing::debug;

/// Resolves indirect references to dictionary objects.
pub trait ObjectResolver {
    /// Look up an object; fails with [`PdfError::ObjectNotFound`] if absent.
    fn resolve(&self, objref: PDFObjRef) -> Result<PDFDict>;
}

impl<T: ObjectResolver + ?Sized> ObjectResolver for &T {
    fn resolve(&self, objref: PDFObjRef) -> Result<PDFDict> {
        (**self).resolve(objref)
    }
}

/// In-memory object table plus the document trailer.
#[derive(Debug, Default, Clone)]
pub struct ObjectStore {
    objects: IndexMap<u32, (u32, PDFDict)>,
    trailer: PDFDict,
}

impl ObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an object definition.
    pub fn insert(&mut self, objref: PDFObjRef, dict: PDFDict) {
        self.objects.insert(objref.objid, (objref.genno, dict));
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn trailer(&self) -> &PDFDict {
        &self.trailer
    }

    pub fn set_trailer(&mut self, trailer: PDFDict) {
        self.trailer = trailer;
    }

    /// Build a store by scanning raw PDF bytes.
    ///
    /// Only objects whose body is a dictionary are kept. Later definitions of
    /// the same object id replace earlier ones, and later trailers override
    /// earlier trailer entries, which matches incremental updates. Files that
    /// use a cross-reference stream instead of a `trailer` keyword take their
    /// trailer from the last `/Type /XRef` object.
    pub fn scan(data: &[u8]) -> Result<Self> {
        let header = Regex::new(r"(\d+)\s+(\d+)\s+obj\b")
            .map_err(|e| PdfError::SyntaxError(e.to_string()))?;
        let trailer_kw =
            Regex::new(r"\btrailer\b").map_err(|e| PdfError::SyntaxError(e.to_string()))?;

        let mut store = Self::new();
        let mut xref_stream_trailer = None;

        for cap in header.captures_iter(data) {
            let (Some(objid), Some(genno)) = (parse_u32(&cap[1]), parse_u32(&cap[2])) else {
                continue;
            };
            let Some(body) = cap.get(0).map(|m| m.end()) else {
                continue;
            };

            let mut lexer = Lexer::new(&data[body..]);
            lexer.skip_whitespace();
            if !data[body + lexer.tell()..].starts_with(b"<<") {
                continue;
            }
            match lexer.parse_dict() {
                Ok(dict) => {
                    if dict.get_name("Type").is_ok_and(|t| t == "XRef") {
                        xref_stream_trailer = Some(dict.clone());
                    }
                    store.insert(PDFObjRef::new(objid, genno), dict);
                }
                Err(err) => debug!(objid, genno, %err, "skipping unparseable object"),
            }
        }

        let mut found_trailer = false;
        for m in trailer_kw.find_iter(data) {
            match Lexer::new(&data[m.end()..]).parse_dict() {
                Ok(dict) => {
                    for (key, raw) in dict.iter() {
                        store.trailer.set(key, raw);
                    }
                    found_trailer = true;
                }
                Err(err) => debug!(offset = m.start(), %err, "skipping unparseable trailer"),
            }
        }
        if !found_trailer {
            if let Some(dict) = xref_stream_trailer {
                store.trailer = dict;
            }
        }

        debug!(objects = store.len(), "scanned object definitions");
        Ok(store)
    }

    /// The document catalog named by the trailer's `Root`.
    pub fn catalog(&self) -> Result<PDFDict> {
        let root = self.trailer.get_ref("Root")?;
        self.resolve(root)
    }

    /// The encryption dictionary, inline or referenced from the trailer.
    pub fn encrypt_dict(&self) -> Result<Option<PDFDict>> {
        let Some(raw) = self.trailer.get("Encrypt") else {
            return Ok(None);
        };
        if raw.starts_with(b"<<") {
            return PDFDict::parse(raw).map(Some);
        }
        let objref = self.trailer.get_ref("Encrypt")?;
        self.resolve(objref).map(Some)
    }
}

impl ObjectResolver for ObjectStore {
    fn resolve(&self, objref: PDFObjRef) -> Result<PDFDict> {
        match self.objects.get(&objref.objid) {
            Some((genno, dict)) if *genno == objref.genno => Ok(dict.clone()),
            _ => Err(PdfError::ObjectNotFound(objref.objid)),
        }
    }
}

fn parse_u32(digits: &[u8]) -> Option<u32> {
    std::str::from_utf8(digits).ok()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SMALL_PDF: &[u8] = b"%PDF-1.4\n\
1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n\
2 0 obj\n<< /Type /Pages /Count 1 /Kids [3 0 R] >>\nendobj\n\
3 0 obj\n<< /Type /Page /Parent 2 0 R >>\nendobj\n\
4 0 obj\n(not a dictionary)\nendobj\n\
trailer\n<< /Size 5 /Root 1 0 R >>\n%%EOF\n";

    #[test]
    fn test_scan_collects_dict_objects() {
        let store = ObjectStore::scan(SMALL_PDF).unwrap();
        assert_eq!(store.len(), 3);
        assert_eq!(store.trailer().get_int("Size").unwrap(), 5);
        let catalog = store.catalog().unwrap();
        assert_eq!(catalog.get_name("Type").unwrap(), "Catalog");
    }

    #[test]
    fn test_resolve_checks_generation() {
        let store = ObjectStore::scan(SMALL_PDF).unwrap();
        assert!(store.resolve(PDFObjRef::new(2, 0)).is_ok());
        assert!(matches!(
            store.resolve(PDFObjRef::new(2, 1)),
            Err(PdfError::ObjectNotFound(2))
        ));
    }

    #[test]
    fn test_scan_skips_overly_nested_object() {
        let mut pdf = b"%PDF-1.4\n1 0 obj\n<< /Type /Catalog /X ".to_vec();
        pdf.extend(std::iter::repeat_n(b'[', 100_000));
        pdf.extend(std::iter::repeat_n(b']', 100_000));
        pdf.extend_from_slice(b" >>\nendobj\n2 0 obj\n<< /Type /Pages /Count 1 >>\nendobj\n");

        let store = ObjectStore::scan(&pdf).unwrap();
        assert_eq!(store.len(), 1);
        assert!(store.resolve(PDFObjRef::new(1, 0)).is_err());
        assert!(store.resolve(PDFObjRef::new(2, 0)).is_ok());
    }

    #[test]
    fn test_no_encrypt_dict() {
        let store = ObjectStore::scan(SMALL_PDF).unwrap();
        assert!(store.encrypt_dict().unwrap().is_none());
    }
}
