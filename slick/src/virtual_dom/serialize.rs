use indextree::{Arena, NodeId};

use super::VNode;

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

pub(super) fn inner_html(arena: &Arena<VNode>, id: NodeId) -> String {
    let mut out = String::new();
    for child in id.children(arena) {
        write_node(arena, child, false, &mut out);
    }
    out
}

pub(super) fn outer_html(arena: &Arena<VNode>, id: NodeId) -> String {
    let mut out = String::new();
    write_node(arena, id, false, &mut out);
    out
}

fn write_node(arena: &Arena<VNode>, id: NodeId, raw: bool, out: &mut String) {
    let Some(node) = arena.get(id) else {
        return;
    };

    match node.get() {
        VNode::Text(text) if raw => out.push_str(text),
        VNode::Text(text) => escape(text, false, out),
        VNode::Element { tag, attrs } => {
            out.push('<');
            out.push_str(tag);
            for (name, value) in attrs {
                out.push(' ');
                out.push_str(name);
                out.push_str("=\"");
                escape(value, true, out);
                out.push('"');
            }
            out.push('>');

            if VOID_ELEMENTS.contains(&tag.as_str()) {
                return;
            }

            let raw = RAW_TEXT_ELEMENTS.contains(&tag.as_str());
            for child in id.children(arena) {
                write_node(arena, child, raw, out);
            }

            out.push_str("</");
            out.push_str(tag);
            out.push('>');
        }
    }
}

fn escape(text: &str, attribute: bool, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' if attribute => out.push_str("&quot;"),
            '<' if !attribute => out.push_str("&lt;"),
            '>' if !attribute => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
}
