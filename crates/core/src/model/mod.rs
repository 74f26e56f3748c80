//! PDF data model.
//!
//! - `objects`: indirect references and the ordered raw-syntax dictionary

pub mod objects;

pub use objects::{PDFDict, PDFObjRef};
