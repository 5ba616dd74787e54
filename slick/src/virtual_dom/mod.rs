//! In-memory document for headless embedding and native tests.
//!
//! The tree lives in an [`indextree`] arena. Listeners are keyed by node identity, so a
//! listener dies with the node it was bound to and a replaced region never leaks
//! handlers. Resource loads resolve immediately unless their URL was registered with
//! [`VirtualDocument::stall`] or [`VirtualDocument::fail`].

mod parse;
mod serialize;

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use futures_util::FutureExt;
use futures_util::future::{self, LocalBoxFuture};
use indextree::{Arena, NodeId};

use crate::bridge::{FormBody, FormMethod, FormSubmission, LinkClick, Trigger};
use crate::config::HeadMarker;
use crate::platform::{Document, Listener, ResourceSpec};
use crate::range::{Landmark, owned_range};
use crate::{DocumentLayout, Region, ResourceKind, Result, Scope, SlickError};

/// A node of the virtual tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VNode {
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
    },
    Text(String),
}

impl VNode {
    fn element(tag: &str, attrs: &[(&str, &str)]) -> Self {
        VNode::Element {
            tag: tag.to_owned(),
            attrs: attrs
                .iter()
                .map(|(name, value)| ((*name).to_owned(), (*value).to_owned()))
                .collect(),
        }
    }

    pub fn tag(&self) -> Option<&str> {
        match self {
            VNode::Element { tag, .. } => Some(tag),
            VNode::Text(_) => None,
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        match self {
            VNode::Element { attrs, .. } => attrs
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, value)| value.as_str()),
            VNode::Text(_) => None,
        }
    }

    fn set_attr(&mut self, name: &str, value: &str) {
        if let VNode::Element { attrs, .. } = self {
            match attrs.iter_mut().find(|(key, _)| key.eq_ignore_ascii_case(name)) {
                Some((_, current)) => value.clone_into(current),
                None => attrs.push((name.to_owned(), value.to_owned())),
            }
        }
    }

    fn is(&self, tag: &str) -> bool {
        self.tag().is_some_and(|own| own.eq_ignore_ascii_case(tag))
    }
}

/// Where the last scroll request went.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScrollTarget {
    Top,
    Fragment(String),
}

#[derive(Default)]
struct Behaviour {
    stalled: Vec<String>,
    failing: Vec<String>,
}

impl Behaviour {
    fn load(&self, url: &str) -> LocalBoxFuture<'static, Result<()>> {
        if self.stalled.iter().any(|prefix| url.starts_with(prefix.as_str())) {
            future::pending::<Result<()>>().boxed_local()
        } else if self.failing.iter().any(|prefix| url.starts_with(prefix.as_str())) {
            future::ready(Err(SlickError::Resource { url: url.to_owned() })).boxed_local()
        } else {
            future::ready(Ok(())).boxed_local()
        }
    }
}

struct Tree {
    arena: Arena<VNode>,
    head: NodeId,
    body: NodeId,
    /// Static head children of the parsed document; statics inserted later are managed.
    fences: HashSet<NodeId>,
    listeners: HashMap<NodeId, Listener>,
    behaviour: Behaviour,
    loads: Vec<ResourceSpec>,
    scroll: Option<ScrollTarget>,
}

impl Tree {
    fn data(&self, id: NodeId) -> Option<&VNode> {
        self.arena.get(id).map(|node| node.get())
    }

    fn append_nodes(&mut self, parent: NodeId, nodes: &[NodeId]) {
        for node in nodes {
            parent.append(*node, &mut self.arena);
        }
    }

    fn insert_nodes(&mut self, parent: NodeId, before: Option<NodeId>, nodes: &[NodeId]) {
        match before {
            Some(anchor) => {
                for node in nodes {
                    anchor.insert_before(*node, &mut self.arena);
                }
            }
            None => self.append_nodes(parent, nodes),
        }
    }

    /// Remove `id` with its subtree, dropping every listener bound inside it.
    fn remove(&mut self, id: NodeId) {
        if id.is_removed(&self.arena) {
            return;
        }
        for node in id.descendants(&self.arena).collect::<Vec<_>>() {
            self.listeners.remove(&node);
        }
        id.remove_subtree(&mut self.arena);
    }

    fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.head
            .descendants(&self.arena)
            .chain(self.body.descendants(&self.arena))
            .find(|node| self.data(*node).and_then(|data| data.attr("id")) == Some(id))
    }

    fn classify(&self, id: NodeId, marker: HeadMarker) -> Landmark {
        self.data(id)
            .and_then(|node| {
                let tag = node.tag()?;
                Some(Landmark::classify(tag, |name| node.attr(name), marker))
            })
            .unwrap_or(Landmark::Managed)
    }

    fn landmarks(&self, marker: HeadMarker) -> (Vec<NodeId>, Vec<Landmark>) {
        let children: Vec<NodeId> = self.head.children(&self.arena).collect();
        let landmarks = children
            .iter()
            .map(|id| {
                let landmark = self.classify(*id, marker);
                if self.fences.contains(id) {
                    landmark
                } else {
                    landmark.inserted()
                }
            })
            .collect();

        (children, landmarks)
    }

    /// The head marker that fences the page range, i.e. the first one after the title.
    fn marker(&self, marker: HeadMarker) -> Option<NodeId> {
        let (children, landmarks) = self.landmarks(marker);
        let title = landmarks.iter().position(|landmark| *landmark == Landmark::Title)?;

        landmarks[title..]
            .iter()
            .position(|landmark| *landmark == Landmark::Marker)
            .map(|offset| children[title + offset])
    }

    /// The icon link that tracks the page favicon: the first one after the title.
    fn favicon(&self) -> Option<NodeId> {
        self.head
            .children(&self.arena)
            .skip_while(|id| !self.data(*id).is_some_and(|node| node.is("title")))
            .find(|id| {
                self.data(*id).is_some_and(|node| {
                    node.tag()
                        .is_some_and(|tag| HeadMarker::Favicon.matches(tag, |name| node.attr(name)))
                })
            })
    }

    fn text_content(&self, id: NodeId) -> String {
        id.descendants(&self.arena)
            .filter_map(|node| match self.data(node) {
                Some(VNode::Text(text)) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    fn link_click(&self, id: NodeId) -> Option<LinkClick> {
        let node = self.data(id)?;

        Some(LinkClick {
            href: node.attr("href")?.to_owned(),
            target: node.attr("target").map(str::to_owned),
            button: 0,
            modifier: false,
            download: node.attr("download").is_some(),
        })
    }

    fn form_submission(&self, form: NodeId) -> Option<FormSubmission> {
        let node = self.data(form)?;
        let mut submission = FormSubmission {
            method: FormMethod::parse(node.attr("method").unwrap_or_default()),
            action: node.attr("action").unwrap_or_default().to_owned(),
            body: FormBody::default(),
        };

        for id in form.descendants(&self.arena) {
            let Some(control) = self.data(id) else {
                continue;
            };
            let Some(name) = control.attr("name") else {
                continue;
            };
            if control.attr("disabled").is_some() {
                continue;
            }

            let value = if control.is("input") {
                let kind = control.attr("type").unwrap_or("text").to_ascii_lowercase();
                match kind.as_str() {
                    // No file is ever chosen here.
                    "file" => String::new(),
                    "submit" | "button" | "reset" | "image" => continue,
                    "checkbox" | "radio" if control.attr("checked").is_none() => continue,
                    "checkbox" | "radio" => control.attr("value").unwrap_or("on").to_owned(),
                    _ => control.attr("value").unwrap_or_default().to_owned(),
                }
            } else if control.is("textarea") {
                self.text_content(id)
            } else if control.is("select") {
                let options: Vec<NodeId> = id
                    .descendants(&self.arena)
                    .filter(|option| self.data(*option).is_some_and(|data| data.is("option")))
                    .collect();
                let chosen = options
                    .iter()
                    .find(|option| {
                        self.data(**option)
                            .is_some_and(|data| data.attr("selected").is_some())
                    })
                    .or_else(|| options.first());

                match chosen {
                    Some(option) => match self.data(*option).and_then(|data| data.attr("value")) {
                        Some(value) => value.to_owned(),
                        None => self.text_content(*option),
                    },
                    None => continue,
                }
            } else {
                continue;
            };

            submission.body.fields.push((name.to_owned(), value));
        }

        Some(submission)
    }
}

/// A parsed HTML document with the [`Document`] operations applied in memory.
pub struct VirtualDocument {
    tree: RefCell<Tree>,
    layout: DocumentLayout,
}

impl VirtualDocument {
    /// Parse a full server-rendered document.
    pub fn parse(html: &str, layout: DocumentLayout) -> Self {
        let mut arena = Arena::new();
        let root = arena.new_node(VNode::element("html", &[]));
        let head = root.append_value(VNode::element("head", &[]), &mut arena);
        let body = root.append_value(VNode::element("body", &[]), &mut arena);

        let mut tree = Tree {
            arena,
            head,
            body,
            fences: HashSet::new(),
            listeners: HashMap::new(),
            behaviour: Behaviour::default(),
            loads: Vec::new(),
            scroll: None,
        };

        let sections = parse::document(&mut tree.arena, html);
        tree.append_nodes(head, &sections.head);
        tree.append_nodes(body, &sections.body);
        tree.fences = head
            .children(&tree.arena)
            .filter(|id| tree.classify(*id, layout.marker) == Landmark::Static)
            .collect();

        Self {
            tree: RefCell::new(tree),
            layout,
        }
    }

    pub fn layout(&self) -> &DocumentLayout {
        &self.layout
    }

    pub fn title(&self) -> Option<String> {
        let tree = self.tree.borrow();
        let title = tree
            .head
            .children(&tree.arena)
            .find(|id| tree.data(*id).is_some_and(|node| node.is("title")))?;

        Some(tree.text_content(title))
    }

    pub fn favicon(&self) -> Option<String> {
        let tree = self.tree.borrow();
        let favicon = tree.favicon()?;
        Some(tree.data(favicon)?.attr("href").unwrap_or_default().to_owned())
    }

    pub fn head_html(&self) -> String {
        let tree = self.tree.borrow();
        serialize::inner_html(&tree.arena, tree.head)
    }

    pub fn body_html(&self) -> String {
        let tree = self.tree.borrow();
        serialize::inner_html(&tree.arena, tree.body)
    }

    /// Outer markup of every head child, one entry per child.
    pub fn head_children(&self) -> Vec<String> {
        let tree = self.tree.borrow();
        tree.head
            .children(&tree.arena)
            .map(|id| serialize::outer_html(&tree.arena, id))
            .collect()
    }

    pub fn inner_html(&self, id: &str) -> Option<String> {
        let tree = self.tree.borrow();
        let node = tree.element_by_id(id)?;
        Some(serialize::inner_html(&tree.arena, node))
    }

    /// Identity of the element with `id`. Stays the same until the element is replaced.
    pub fn node_by_id(&self, id: &str) -> Option<NodeId> {
        self.tree.borrow().element_by_id(id)
    }

    /// Number of live elements with an interception listener.
    pub fn listener_count(&self) -> usize {
        self.tree.borrow().listeners.len()
    }

    pub fn last_scroll(&self) -> Option<ScrollTarget> {
        self.tree.borrow().scroll.clone()
    }

    /// Every resource load requested so far, in order.
    pub fn loads(&self) -> Vec<ResourceSpec> {
        self.tree.borrow().loads.clone()
    }

    /// URLs of the loaded resources of `kind` currently tagged with `region`.
    pub fn resource_urls(&self, kind: ResourceKind, region: Region) -> Vec<String> {
        let attribute = match kind {
            ResourceKind::Style => "href",
            ResourceKind::Script => "src",
        };
        let tree = self.tree.borrow();

        self.resources(kind, region)
            .into_iter()
            .filter_map(|id| tree.data(id)?.attr(attribute).map(str::to_owned))
            .collect()
    }

    /// Loads of URLs starting with `prefix` never settle.
    pub fn stall(&self, prefix: &str) {
        self.tree.borrow_mut().behaviour.stalled.push(prefix.to_owned());
    }

    /// Loads of URLs starting with `prefix` fail.
    pub fn fail(&self, prefix: &str) {
        self.tree.borrow_mut().behaviour.failing.push(prefix.to_owned());
    }

    /// Click the first link with this exact `href`.
    ///
    /// Returns `None` when there is no such link or it has no listener, otherwise
    /// whether the listener prevented the default action.
    pub fn click(&self, href: &str) -> Option<bool> {
        let (listener, click) = {
            let tree = self.tree.borrow();
            let link = tree.body.descendants(&tree.arena).find(|id| {
                tree.data(*id)
                    .is_some_and(|node| node.is("a") && node.attr("href") == Some(href))
            })?;
            (tree.listeners.get(&link)?.clone(), tree.link_click(link)?)
        };

        Some(listener(Trigger::Click(click)))
    }

    /// Submit the form with this `id`. Same return value as [`VirtualDocument::click`].
    pub fn submit(&self, form_id: &str) -> Option<bool> {
        let (listener, submission) = {
            let tree = self.tree.borrow();
            let form = tree.element_by_id(form_id)?;
            (tree.listeners.get(&form)?.clone(), tree.form_submission(form)?)
        };

        Some(listener(Trigger::Submit(submission)))
    }

    fn container(&self, region: Region) -> &str {
        match region {
            Region::Template => &self.layout.root_id,
            Region::Page => &self.layout.page_id,
        }
    }
}

impl Document for VirtualDocument {
    type Resource = NodeId;

    fn set_title(&self, title: &str) -> Result<()> {
        let mut tree = self.tree.borrow_mut();
        let tree = &mut *tree;
        let node = tree
            .head
            .children(&tree.arena)
            .find(|id| tree.data(*id).is_some_and(|node| node.is("title")))
            .ok_or(SlickError::MissingMarker("title"))?;

        for child in node.children(&tree.arena).collect::<Vec<_>>() {
            tree.remove(child);
        }
        let text = tree.arena.new_node(VNode::Text(title.to_owned()));
        node.append(text, &mut tree.arena);
        Ok(())
    }

    fn set_favicon(&self, href: &str) -> Result<()> {
        let mut tree = self.tree.borrow_mut();
        let tree = &mut *tree;
        let favicon = tree.favicon();

        if let Some(node) = favicon.and_then(|id| tree.arena.get_mut(id)) {
            node.get_mut().set_attr("href", href);
        }
        Ok(())
    }

    fn replace_head(&self, region: Region, markup: &str) -> Result<()> {
        let mut tree = self.tree.borrow_mut();
        let tree = &mut *tree;

        let (children, landmarks) = tree.landmarks(self.layout.marker);
        let range = owned_range(&landmarks, region)?;
        let anchor = children.get(range.end).copied();

        for id in &children[range] {
            tree.remove(*id);
        }

        let head = tree.head;
        let nodes = parse::head_fragment(&mut tree.arena, markup);
        tree.insert_nodes(head, anchor, &nodes);
        Ok(())
    }

    fn replace_body(&self, region: Region, markup: &str) -> Result<()> {
        let container_id = self.container(region);
        let mut tree = self.tree.borrow_mut();
        let tree = &mut *tree;
        let container = tree
            .element_by_id(container_id)
            .ok_or_else(|| SlickError::Dom(format!("no element with id `{container_id}`")))?;

        for child in container.children(&tree.arena).collect::<Vec<_>>() {
            tree.remove(child);
        }
        let nodes = parse::body_fragment(&mut tree.arena, markup);
        tree.append_nodes(container, &nodes);
        Ok(())
    }

    fn resources(&self, kind: ResourceKind, region: Region) -> Vec<NodeId> {
        let tree = self.tree.borrow();
        let (parent, tag) = match kind {
            ResourceKind::Style => (tree.head, "link"),
            ResourceKind::Script => (tree.body, "script"),
        };

        parent
            .children(&tree.arena)
            .filter(|id| {
                tree.data(*id).is_some_and(|node| {
                    node.is(tag)
                        && node.attr(&self.layout.region_attribute) == Some(region.as_str())
                })
            })
            .collect()
    }

    fn remove_resource(&self, resource: &NodeId) {
        self.tree.borrow_mut().remove(*resource);
    }

    fn load_resource(&self, spec: ResourceSpec) -> LocalBoxFuture<'static, Result<()>> {
        let mut tree = self.tree.borrow_mut();
        let tree = &mut *tree;
        let region_attribute = self.layout.region_attribute.as_str();

        match spec.kind {
            ResourceKind::Style => {
                let Some(marker) = tree.marker(self.layout.marker) else {
                    return future::ready(Err(SlickError::MissingMarker("head"))).boxed_local();
                };
                let link = tree.arena.new_node(VNode::element(
                    "link",
                    &[
                        ("rel", "stylesheet"),
                        ("href", spec.url.as_str()),
                        (region_attribute, spec.region.as_str()),
                    ],
                ));
                marker.insert_before(link, &mut tree.arena);
            }
            ResourceKind::Script => {
                let mut attrs = vec![("src", spec.url.as_str())];
                if let Some(kind) = &spec.script_type {
                    attrs.push(("type", kind.as_str()));
                }
                attrs.push((region_attribute, spec.region.as_str()));

                let body = tree.body;
                body.append_value(VNode::element("script", &attrs), &mut tree.arena);
            }
        }

        let load = tree.behaviour.load(&spec.url);
        tree.loads.push(spec);
        load
    }

    fn scroll_to_fragment(&self, fragment: &str) -> bool {
        let mut tree = self.tree.borrow_mut();
        if tree.element_by_id(fragment).is_none() {
            return false;
        }

        tree.scroll = Some(ScrollTarget::Fragment(fragment.to_owned()));
        true
    }

    fn scroll_to_top(&self) {
        self.tree.borrow_mut().scroll = Some(ScrollTarget::Top);
    }

    fn attach(&self, scope: Scope, listener: &Listener) -> usize {
        let mut tree = self.tree.borrow_mut();
        let root = match scope {
            Scope::Document => Some(tree.body),
            Scope::Page => tree.element_by_id(&self.layout.page_id),
        };
        let Some(root) = root else {
            return 0;
        };

        let targets: Vec<NodeId> = root
            .descendants(&tree.arena)
            .filter(|id| {
                !tree.listeners.contains_key(id)
                    && tree.data(*id).is_some_and(|node| {
                        (node.is("a") && node.attr("href").is_some()) || node.is("form")
                    })
            })
            .collect();

        for id in &targets {
            tree.listeners.insert(*id, listener.clone());
        }
        targets.len()
    }
}

impl std::fmt::Debug for VirtualDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tree = self.tree.borrow();
        f.debug_struct("VirtualDocument")
            .field("nodes", &tree.arena.iter().count())
            .field("listeners", &tree.listeners.len())
            .field("layout", &self.layout)
            .finish()
    }
}
