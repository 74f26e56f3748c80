//! PDF document structure: page tree, object resolution and security.
//!
//! This module contains:
//! - `catalog` - page tree resolution and the flat page index
//! - `security` - standard security handler (RC4/MD5)
//! - `store` - object resolver trait and in-memory object store

pub mod catalog;
pub mod security;
pub mod store;

// Re-export main types for convenience
pub use catalog::{Catalog, PageTreeNode};
pub use security::{
    PASSWORD_PADDING, PDFSecurityHandler, Permissions, StandardSecurityHandler,
    create_security_handler,
};
pub use store::{ObjectResolver, ObjectStore};
