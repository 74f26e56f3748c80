//! Page tree resolution.
//!
//! Expands the `Pages` graph under a document catalog into an owned tree and
//! a flat, page-number-indexed view of it. The flat index is always derived
//! from the tree: inserting a page edits the tree and rebuilds the index, so
//! the two cannot drift apart.

use super::store::ObjectResolver;
use crate::error::{PdfError, Result};
use crate::model::objects::{PDFDict, PDFObjRef};
use std::collections::HashSet;
use tracing::{debug, warn};

/// Nesting limit for `Pages` nodes; deeper trees are rejected.
pub const MAX_TREE_DEPTH: usize = 256;

/// A node of the page tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageTreeNode {
    /// A page object.
    Leaf(PDFObjRef),
    /// A `Pages` node and its kids, in document order.
    Collection(Vec<PageTreeNode>),
}

impl PageTreeNode {
    /// Number of pages below (or at) this node.
    pub fn leaf_count(&self) -> usize {
        match self {
            Self::Leaf(_) => 1,
            Self::Collection(kids) => kids.iter().map(Self::leaf_count).sum(),
        }
    }

    /// Pages in depth-first, left-to-right order.
    pub fn leaves(&self) -> Vec<PDFObjRef> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves(&self, out: &mut Vec<PDFObjRef>) {
        match self {
            Self::Leaf(objref) => out.push(*objref),
            Self::Collection(kids) => {
                for kid in kids {
                    kid.collect_leaves(out);
                }
            }
        }
    }
}

/// Page tree plus its flat page index.
#[derive(Debug, Clone)]
pub struct Catalog {
    root: PageTreeNode,
    index: Vec<PDFObjRef>,
}

impl Catalog {
    /// Resolve the page tree referenced by a catalog dictionary's `Pages`.
    pub fn from_root<R: ObjectResolver + ?Sized>(resolver: &R, catalog: &PDFDict) -> Result<Self> {
        let pages = catalog
            .get_ref("Pages")
            .map_err(|_| PdfError::MissingPagesReference)?;

        let mut walker = TreeWalker {
            resolver,
            visited: HashSet::new(),
            ancestors: HashSet::new(),
            index: Vec::new(),
        };
        let root = walker.expand(pages, 0)?;
        debug!(pages = walker.index.len(), "resolved page tree");

        Ok(Self {
            root,
            index: walker.index,
        })
    }

    /// Build a catalog from an already assembled tree.
    pub fn from_tree(root: PageTreeNode) -> Self {
        let index = root.leaves();
        Self { root, index }
    }

    /// Number of pages.
    pub fn page_count(&self) -> usize {
        self.index.len()
    }

    /// Object id of a 1-based page number.
    pub fn objid_for_page(&self, page: usize) -> Result<u32> {
        self.page_ref(page).map(|objref| objref.objid)
    }

    /// Object reference of a 1-based page number.
    pub fn page_ref(&self, page: usize) -> Result<PDFObjRef> {
        page.checked_sub(1)
            .and_then(|i| self.index.get(i))
            .copied()
            .ok_or(PdfError::OutOfRange {
                page,
                count: self.page_count(),
            })
    }

    /// Object ids of all pages in order.
    pub fn page_ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.index.iter().map(|objref| objref.objid)
    }

    /// Object references of all pages in order.
    pub fn page_refs(&self) -> &[PDFObjRef] {
        &self.index
    }

    pub fn tree(&self) -> &PageTreeNode {
        &self.root
    }

    /// Insert a page so that it becomes page `page`; later pages move up by
    /// one. `page == page_count() + 1` appends.
    pub fn insert_page(&mut self, page: usize, objid: u32) -> Result<()> {
        self.insert_page_ref(page, PDFObjRef::new(objid, 0))
    }

    /// [`Catalog::insert_page`] with an explicit generation number.
    pub fn insert_page_ref(&mut self, page: usize, objref: PDFObjRef) -> Result<()> {
        let count = self.page_count();
        if page == 0 || page > count + 1 {
            return Err(PdfError::OutOfRange { page, count });
        }

        if let PageTreeNode::Leaf(only) = self.root {
            self.root = PageTreeNode::Collection(vec![PageTreeNode::Leaf(only)]);
        }
        if let PageTreeNode::Collection(kids) = &mut self.root {
            insert_leaf(kids, page - 1, objref);
        }
        self.index = self.root.leaves();
        Ok(())
    }
}

/// Place `leaf` so it becomes leaf number `position` (0-based) of `kids`.
///
/// The leaf joins the collection that holds the page it displaces, or the
/// collection holding the last page when appending.
fn insert_leaf(kids: &mut Vec<PageTreeNode>, position: usize, leaf: PDFObjRef) {
    let counts: Vec<usize> = kids.iter().map(PageTreeNode::leaf_count).collect();
    let total: usize = counts.iter().sum();
    let mut remaining = position;

    for (i, &n) in counts.iter().enumerate() {
        let appends_here = position == total && n > 0 && remaining == n;
        if remaining < n || appends_here {
            if matches!(kids[i], PageTreeNode::Leaf(_)) {
                kids.insert(i + usize::from(appends_here), PageTreeNode::Leaf(leaf));
            } else if let PageTreeNode::Collection(grandkids) = &mut kids[i] {
                insert_leaf(grandkids, remaining, leaf);
            }
            return;
        }
        remaining -= n;
    }

    kids.push(PageTreeNode::Leaf(leaf));
}

struct TreeWalker<'r, R: ?Sized> {
    resolver: &'r R,
    /// Every `Pages` node expanded so far.
    visited: HashSet<u32>,
    /// `Pages` nodes on the current path from the root.
    ancestors: HashSet<u32>,
    index: Vec<PDFObjRef>,
}

impl<R: ObjectResolver + ?Sized> TreeWalker<'_, R> {
    fn resolve(&self, objref: PDFObjRef) -> Result<PDFDict> {
        self.resolver.resolve(objref).map_err(|err| match err {
            PdfError::ObjectNotFound(_) => PdfError::UnresolvedIndirectObject {
                objid: objref.objid,
                genno: objref.genno,
            },
            other => other,
        })
    }

    fn expand(&mut self, objref: PDFObjRef, depth: usize) -> Result<PageTreeNode> {
        let dict = self.resolve(objref)?;
        let is_pages = dict.get_name("Type").is_ok_and(|t| t == "Pages");
        if !is_pages {
            self.index.push(objref);
            return Ok(PageTreeNode::Leaf(objref));
        }

        let malformed = |reason: String| PdfError::MalformedPageTree {
            objid: objref.objid,
            reason,
        };

        if depth >= MAX_TREE_DEPTH {
            return Err(malformed(format!(
                "Pages nodes nested deeper than {MAX_TREE_DEPTH}"
            )));
        }
        if self.ancestors.contains(&objref.objid) {
            return Err(malformed("Pages node is its own ancestor (cycle)".into()));
        }
        if !self.visited.insert(objref.objid) {
            return Err(malformed("Pages node shared by more than one parent".into()));
        }

        let count = match dict.get_int("Count") {
            Ok(n) if n > 0 => n,
            Ok(n) => return Err(malformed(format!("/Count must be positive, got {n}"))),
            Err(err) => return Err(malformed(format!("/Count: {err}"))),
        };
        let kids = dict
            .get_refs("Kids")
            .map_err(|err| malformed(format!("/Kids: {err}")))?;

        let first_leaf = self.index.len();
        let mut children = Vec::with_capacity(kids.len());
        self.ancestors.insert(objref.objid);
        for kid in kids {
            children.push(self.expand(kid, depth + 1)?);
        }
        self.ancestors.remove(&objref.objid);

        let found = self.index.len() - first_leaf;
        if usize::try_from(count).ok() != Some(found) {
            warn!(
                objid = objref.objid,
                count, found, "page tree /Count does not match pages found"
            );
        }

        Ok(PageTreeNode::Collection(children))
    }
}
