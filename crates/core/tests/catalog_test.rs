//! Page tree resolution and insertion tests.

use pdfmend_core::PdfError;
use pdfmend_core::catalog::{Catalog, PageTreeNode};
use pdfmend_core::model::{PDFDict, PDFObjRef};
use pdfmend_core::store::ObjectStore;

fn dict(raw: &str) -> PDFDict {
    PDFDict::parse(raw.as_bytes()).unwrap()
}

fn store_with(objects: &[(u32, &str)]) -> ObjectStore {
    let mut store = ObjectStore::new();
    for &(objid, raw) in objects {
        store.insert(PDFObjRef::new(objid, 0), dict(raw));
    }
    store
}

fn catalog_for(store: &ObjectStore) -> pdfmend_core::Result<Catalog> {
    Catalog::from_root(store, &dict("<< /Type /Catalog /Pages 1 0 R >>"))
}

fn page_ids(catalog: &Catalog) -> Vec<u32> {
    catalog.page_ids().collect()
}

fn two_page_store() -> ObjectStore {
    store_with(&[
        (1, "<< /Type /Pages /Count 2 /Kids [2 0 R 3 0 R] >>"),
        (2, "<< /Type /Page /Parent 1 0 R >>"),
        (3, "<< /Type /Page /Parent 1 0 R >>"),
    ])
}

fn nested_store() -> ObjectStore {
    store_with(&[
        (1, "<< /Type /Pages /Count 4 /Kids [2 0 R 5 0 R] >>"),
        (2, "<< /Type /Pages /Count 2 /Kids [3 0 R 4 0 R] >>"),
        (3, "<< /Type /Page >>"),
        (4, "<< /Type /Page >>"),
        (5, "<< /Type /Pages /Count 2 /Kids [6 0 R 7 0 R] >>"),
        (6, "<< /Type /Page >>"),
        (7, "<< /Type /Page >>"),
    ])
}

#[test]
fn test_flat_tree() {
    let catalog = catalog_for(&two_page_store()).unwrap();
    assert_eq!(catalog.page_count(), 2);
    assert_eq!(catalog.objid_for_page(1).unwrap(), 2);
    assert_eq!(catalog.objid_for_page(2).unwrap(), 3);
}

#[test]
fn test_nested_tree_order() {
    let catalog = catalog_for(&nested_store()).unwrap();
    assert_eq!(page_ids(&catalog), [3, 4, 6, 7]);
    assert_eq!(catalog.tree().leaf_count(), 4);
    assert_eq!(catalog.page_ref(3).unwrap(), PDFObjRef::new(6, 0));
}

#[test]
fn test_page_lookup_out_of_range() {
    let catalog = catalog_for(&two_page_store()).unwrap();
    assert!(matches!(
        catalog.objid_for_page(0),
        Err(PdfError::OutOfRange { page: 0, count: 2 })
    ));
    assert!(matches!(
        catalog.objid_for_page(3),
        Err(PdfError::OutOfRange { page: 3, count: 2 })
    ));
}

#[test]
fn test_missing_pages_reference() {
    let store = two_page_store();
    let err = Catalog::from_root(&store, &dict("<< /Type /Catalog >>")).unwrap_err();
    assert!(matches!(err, PdfError::MissingPagesReference));
}

#[test]
fn test_unresolved_kid() {
    let store = store_with(&[
        (1, "<< /Type /Pages /Count 2 /Kids [2 0 R 9 0 R] >>"),
        (2, "<< /Type /Page >>"),
    ]);
    let err = catalog_for(&store).unwrap_err();
    assert!(matches!(
        err,
        PdfError::UnresolvedIndirectObject { objid: 9, genno: 0 }
    ));
}

#[test]
fn test_cycle_is_rejected() {
    let store = store_with(&[
        (1, "<< /Type /Pages /Count 1 /Kids [2 0 R] >>"),
        (2, "<< /Type /Pages /Count 1 /Kids [1 0 R] >>"),
    ]);
    match catalog_for(&store).unwrap_err() {
        PdfError::MalformedPageTree { objid, reason } => {
            assert_eq!(objid, 1);
            assert!(reason.contains("cycle"), "{reason}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_shared_pages_node_is_not_called_a_cycle() {
    let store = store_with(&[
        (1, "<< /Type /Pages /Count 2 /Kids [2 0 R 2 0 R] >>"),
        (2, "<< /Type /Pages /Count 1 /Kids [3 0 R] >>"),
        (3, "<< /Type /Page >>"),
    ]);
    match catalog_for(&store).unwrap_err() {
        PdfError::MalformedPageTree { objid, reason } => {
            assert_eq!(objid, 2);
            assert!(reason.contains("more than one parent"), "{reason}");
            assert!(!reason.contains("cycle"), "{reason}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_non_reference_kid_is_rejected() {
    let store = store_with(&[
        (1, "<< /Type /Pages /Count 2 /Kids [2 0 R /Foo] >>"),
        (2, "<< /Type /Page >>"),
    ]);
    let err = catalog_for(&store).unwrap_err();
    assert!(matches!(err, PdfError::MalformedPageTree { objid: 1, .. }));
}

#[test]
fn test_zero_or_missing_count_is_rejected() {
    let zero = store_with(&[(1, "<< /Type /Pages /Count 0 /Kids [] >>")]);
    assert!(matches!(
        catalog_for(&zero),
        Err(PdfError::MalformedPageTree { .. })
    ));

    let missing = store_with(&[
        (1, "<< /Type /Pages /Kids [2 0 R] >>"),
        (2, "<< /Type /Page >>"),
    ]);
    assert!(matches!(
        catalog_for(&missing),
        Err(PdfError::MalformedPageTree { .. })
    ));
}

#[test]
fn test_count_mismatch_is_tolerated() {
    let store = store_with(&[
        (1, "<< /Type /Pages /Count 5 /Kids [2 0 R] >>"),
        (2, "<< /Type /Page >>"),
    ]);
    let catalog = catalog_for(&store).unwrap();
    assert_eq!(page_ids(&catalog), [2]);
}

#[test]
fn test_non_pages_root_is_single_page() {
    let store = store_with(&[(1, "<< /Type /Page >>")]);
    let catalog = catalog_for(&store).unwrap();
    assert_eq!(page_ids(&catalog), [1]);
    assert_eq!(catalog.tree(), &PageTreeNode::Leaf(PDFObjRef::new(1, 0)));
}

#[test]
fn test_insert_first_middle_last() {
    let mut catalog = catalog_for(&two_page_store()).unwrap();
    catalog.insert_page(1, 10).unwrap();
    assert_eq!(page_ids(&catalog), [10, 2, 3]);
    catalog.insert_page(3, 11).unwrap();
    assert_eq!(page_ids(&catalog), [10, 2, 11, 3]);
    catalog.insert_page(5, 12).unwrap();
    assert_eq!(page_ids(&catalog), [10, 2, 11, 3, 12]);
    assert_eq!(catalog.page_count(), 5);
}

#[test]
fn test_insert_out_of_range() {
    let mut catalog = catalog_for(&two_page_store()).unwrap();
    assert!(matches!(
        catalog.insert_page(0, 10),
        Err(PdfError::OutOfRange { page: 0, count: 2 })
    ));
    assert!(matches!(
        catalog.insert_page(4, 10),
        Err(PdfError::OutOfRange { page: 4, count: 2 })
    ));
    assert_eq!(page_ids(&catalog), [2, 3]);
}

#[test]
fn test_insert_keeps_tree_and_index_in_sync() {
    let mut catalog = catalog_for(&nested_store()).unwrap();
    for (page, objid) in [(3, 20), (1, 21), (7, 22), (4, 23)] {
        catalog.insert_page(page, objid).unwrap();
        assert_eq!(catalog.objid_for_page(page).unwrap(), objid);
        assert_eq!(catalog.tree().leaves(), catalog.page_refs());
    }
    assert_eq!(page_ids(&catalog), [21, 3, 4, 23, 20, 6, 7, 22]);
}

#[test]
fn test_insert_shifts_later_pages() {
    let mut catalog = catalog_for(&nested_store()).unwrap();
    let before = page_ids(&catalog);
    catalog.insert_page(2, 30).unwrap();
    let after = page_ids(&catalog);
    assert_eq!(after[..1], before[..1]);
    assert_eq!(after[2..], before[1..]);
}

#[test]
fn test_scanned_document() {
    let pdf = b"%PDF-1.4\n\
1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n\
2 0 obj\n<< /Type /Pages /Count 2 /Kids [3 0 R 4 0 R] >>\nendobj\n\
3 0 obj\n<< /Type /Page /Parent 2 0 R >>\nendobj\n\
4 0 obj\n<< /Type /Page /Parent 2 0 R >>\nendobj\n\
trailer\n<< /Size 5 /Root 1 0 R >>\n%%EOF\n";
    let store = ObjectStore::scan(pdf).unwrap();
    let root = store.catalog().unwrap();
    let catalog = Catalog::from_root(&store, &root).unwrap();
    assert_eq!(page_ids(&catalog), [3, 4]);
}
