use super::*;

fn sample() -> (Document, NodeRef) {
    let doc = Document::parse(
        r#"<!DOCTYPE html><html><head></head><body id="root"><div id="a" class="x y"><p>hi</p></div></body></html>"#,
    );
    let body = doc.get_element_by_id("root").unwrap();
    (doc, body)
}

// =============================================================
// Navigation
// =============================================================

#[test]
fn document_element_is_html() {
    let (doc, _) = sample();
    let html = doc.document_element().unwrap();
    assert_eq!(doc.tag(html), Some("html"));
}

#[test]
fn get_element_by_id_finds_nested() {
    let (doc, body) = sample();
    let div = doc.get_element_by_id("a").unwrap();
    assert_eq!(doc.parent(div), Some(body));
    assert_eq!(doc.class_list(div), vec!["x".to_owned(), "y".to_owned()]);
}

#[test]
fn descendants_are_in_document_order() {
    let (doc, body) = sample();
    let tags: Vec<_> = doc
        .descendants(body)
        .into_iter()
        .filter_map(|n| doc.tag(n).map(str::to_owned))
        .collect();
    assert_eq!(tags, vec!["div", "p"]);
}

// =============================================================
// Liveness
// =============================================================

#[test]
fn replaced_children_become_stale() {
    let (mut doc, body) = sample();
    let div = doc.get_element_by_id("a").unwrap();
    doc.set_inner_html(body, "<span>new</span>").unwrap();

    assert!(!doc.is_alive(div));
    assert_eq!(doc.tag(div), None);
    assert_eq!(doc.set_attr(div, "id", "z"), Err(DomError::Stale));
}

#[test]
fn reused_slot_does_not_revive_old_reference() {
    let (mut doc, body) = sample();
    let div = doc.get_element_by_id("a").unwrap();
    doc.set_inner_html(body, "").unwrap();
    // New nodes land in the freed slots with a bumped generation.
    doc.set_inner_html(body, r#"<div id="a"></div><p></p><i></i>"#).unwrap();
    let fresh = doc.get_element_by_id("a").unwrap();

    assert!(!doc.is_alive(div));
    assert!(doc.is_alive(fresh));
    assert_ne!(div, fresh);
}

#[test]
fn detached_node_is_alive_but_not_attached() {
    let mut doc = Document::new();
    let el = doc.create_element("div");
    assert!(doc.is_alive(el));
    assert!(!doc.is_attached(el));
    doc.append_child(doc.root(), el).unwrap();
    assert!(doc.is_attached(el));
}

#[test]
fn append_child_rejects_cycles() {
    let mut doc = Document::new();
    let outer = doc.create_element("div");
    let inner = doc.create_element("span");
    doc.append_child(outer, inner).unwrap();
    assert_eq!(doc.append_child(inner, outer), Err(DomError::Hierarchy));
    assert_eq!(doc.append_child(outer, outer), Err(DomError::Hierarchy));
}

#[test]
fn append_child_moves_between_parents() {
    let mut doc = Document::new();
    let a = doc.create_element("a");
    let b = doc.create_element("b");
    let c = doc.create_element("c");
    doc.append_child(a, c).unwrap();
    doc.append_child(b, c).unwrap();
    assert!(doc.children(a).is_empty());
    assert_eq!(doc.children(b), vec![c]);
}

#[test]
fn remove_frees_subtree() {
    let (mut doc, _) = sample();
    let before = doc.live_count();
    let div = doc.get_element_by_id("a").unwrap();
    doc.remove(div).unwrap();
    // div, p, and the text node
    assert_eq!(doc.live_count(), before - 3);
    assert_eq!(doc.remove(div), Err(DomError::Stale));
}

// =============================================================
// Content
// =============================================================

#[test]
fn set_text_content_escapes_markup() {
    let (mut doc, _) = sample();
    let div = doc.get_element_by_id("a").unwrap();
    doc.set_text_content(div, "a < b & c").unwrap();
    assert_eq!(doc.inner_html(div), "a &lt; b &amp; c");
}

#[test]
fn set_inner_html_on_text_node_is_rejected() {
    let mut doc = Document::new();
    let text = doc.create_text("hi");
    assert_eq!(doc.set_inner_html(text, "<b></b>"), Err(DomError::NotElement));
}

#[test]
fn clone_subtree_is_independent() {
    let (mut doc, _) = sample();
    let html = doc.document_element().unwrap();
    let copy = doc.clone_subtree(html).unwrap();
    let div = doc.get_element_by_id("a").unwrap();
    doc.set_attr(div, "data-x", "1").unwrap();

    let copy_root = copy.document_element().unwrap();
    assert!(!copy.outer_html(copy_root).contains("data-x"));
    assert!(doc.outer_html(html).contains("data-x"));
}

// =============================================================
// Style and classes
// =============================================================

#[test]
fn style_property_round_trip() {
    let (mut doc, _) = sample();
    let div = doc.get_element_by_id("a").unwrap();
    doc.set_style_property(div, "outline", "2px solid red").unwrap();
    assert_eq!(doc.style_property(div, "outline").as_deref(), Some("2px solid red"));
    doc.set_style_property(div, "outline", "").unwrap();
    assert_eq!(doc.attr(div, "style"), None);
}

#[test]
fn empty_class_list_removes_attribute() {
    let (mut doc, _) = sample();
    let div = doc.get_element_by_id("a").unwrap();
    doc.set_class_list(div, &[]).unwrap();
    assert_eq!(doc.attr(div, "class"), None);
}
