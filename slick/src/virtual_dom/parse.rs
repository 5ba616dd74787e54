//! Markup import through html5ever.

use html5ever::tendril::TendrilSink;
use html5ever::{ParseOpts, parse_document};
use indextree::{Arena, NodeId};
use markup5ever_rcdom::{Handle, NodeData, RcDom};

use super::VNode;

/// Top-level children of `<head>` and `<body>`, imported but not yet attached.
#[derive(Default)]
pub(super) struct Sections {
    pub(super) head: Vec<NodeId>,
    pub(super) body: Vec<NodeId>,
}

/// Parse `html` and import its head and body children into `arena`.
///
/// The import has to finish while the parsed DOM is alive: dropping an `RcDom` empties
/// the children of every node it owns.
pub(super) fn document(arena: &mut Arena<VNode>, html: &str) -> Sections {
    let dom = parse_document(RcDom::default(), ParseOpts::default()).one(html);

    let mut sections = Sections::default();
    let Some(root) = child_element(&dom.document, "html") else {
        return sections;
    };

    if let Some(head) = child_element(&root, "head") {
        sections.head = import_children(arena, &head);
    }
    if let Some(body) = child_element(&root, "body") {
        sections.body = import_children(arena, &body);
    }
    sections
}

/// Parse markup destined for `<head>`.
///
/// Elements the parser refuses to keep in the head (anything after a non-head element)
/// are returned after the head elements, so nothing is dropped.
pub(super) fn head_fragment(arena: &mut Arena<VNode>, markup: &str) -> Vec<NodeId> {
    let Sections { mut head, body } = document(arena, markup);
    head.extend(body);
    head
}

/// Parse markup destined for an element inside `<body>`.
pub(super) fn body_fragment(arena: &mut Arena<VNode>, markup: &str) -> Vec<NodeId> {
    document(arena, &format!("<body>{markup}")).body
}

fn import_children(arena: &mut Arena<VNode>, parent: &Handle) -> Vec<NodeId> {
    parent
        .children
        .borrow()
        .iter()
        .filter_map(|child| import(arena, child))
        .collect()
}

/// Copy `handle` and its descendants into `arena`.
///
/// Whitespace-only text, comments, doctypes and processing instructions are skipped.
fn import(arena: &mut Arena<VNode>, handle: &Handle) -> Option<NodeId> {
    let node = match &handle.data {
        NodeData::Text { contents } => {
            let text = contents.borrow().to_string();
            if text.trim().is_empty() {
                return None;
            }
            return Some(arena.new_node(VNode::Text(text)));
        }
        NodeData::Element { name, attrs, .. } => arena.new_node(VNode::Element {
            tag: name.local.to_string(),
            attrs: attrs
                .borrow()
                .iter()
                .map(|attr| (attr.name.local.to_string(), attr.value.to_string()))
                .collect(),
        }),
        NodeData::Document
        | NodeData::Doctype { .. }
        | NodeData::Comment { .. }
        | NodeData::ProcessingInstruction { .. } => return None,
    };

    for child in handle.children.borrow().iter() {
        if let Some(child) = import(arena, child) {
            node.append(child, arena);
        }
    }
    Some(node)
}

fn child_element(parent: &Handle, tag: &str) -> Option<Handle> {
    parent
        .children
        .borrow()
        .iter()
        .find(|child| matches!(&child.data, NodeData::Element { name, .. } if &*name.local == tag))
        .cloned()
}
