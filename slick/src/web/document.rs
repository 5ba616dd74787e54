use std::cell::RefCell;
use std::fmt;

use futures_util::FutureExt;
use futures_util::future::{self, LocalBoxFuture};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    Element, Event, HtmlAnchorElement, HtmlFormElement, MouseEvent, ScrollBehavior,
    ScrollIntoViewOptions,
};

use super::describe;
use crate::bridge::{FormBody, FormMethod, FormSubmission, LinkClick, Trigger};
use crate::config::HeadMarker;
use crate::platform::{Document, Listener, ResourceSpec};
use crate::range::{Landmark, owned_range};
use crate::{DocumentLayout, Region, ResourceKind, Result, Scope, SlickError};

/// Property set on elements that already carry an interception listener.
const BOUND_PROPERTY: &str = "__slick";

type EventClosure = Closure<dyn FnMut(Event)>;

type Extract = Box<dyn Fn(&Event) -> Option<Trigger>>;

/// Listener closures grouped by the region that owns their element.
///
/// Replacing a region releases its closures; the elements they were bound to are gone.
#[derive(Default)]
struct Bindings {
    template: Vec<EventClosure>,
    page: Vec<EventClosure>,
    /// Elements outside the template root, e.g. a server-rendered footer.
    persistent: Vec<EventClosure>,
}

/// The live `window.document`.
pub struct WebDocument {
    document: web_sys::Document,
    layout: DocumentLayout,
    bindings: RefCell<Bindings>,
    /// Static head children of the server-rendered document.
    fences: Vec<Element>,
}

impl WebDocument {
    pub(crate) fn new(document: web_sys::Document, layout: DocumentLayout) -> Self {
        let fences = document
            .head()
            .map(|head| children(&head))
            .unwrap_or_default()
            .into_iter()
            .filter(|element| classify(element, layout.marker) == Landmark::Static)
            .collect();

        Self {
            document,
            layout,
            bindings: RefCell::new(Bindings::default()),
            fences,
        }
    }

    fn head(&self) -> Result<Element> {
        self.document
            .head()
            .map(Element::from)
            .ok_or(SlickError::MissingMarker("head"))
    }

    fn body(&self) -> Result<Element> {
        self.document
            .body()
            .map(Element::from)
            .ok_or_else(|| SlickError::Dom("document has no body".to_owned()))
    }

    fn container(&self, region: Region) -> Result<Element> {
        let id = match region {
            Region::Template => &self.layout.root_id,
            Region::Page => &self.layout.page_id,
        };

        self.document
            .get_element_by_id(id)
            .ok_or_else(|| SlickError::Dom(format!("no element with id `{id}`")))
    }

    /// Head children paired with their landmark role.
    fn landmarks(&self) -> Result<(Vec<Element>, Vec<Landmark>)> {
        let elements = children(&self.head()?);

        let landmarks = elements
            .iter()
            .map(|element| {
                let landmark = classify(element, self.layout.marker);
                let rendered = self
                    .fences
                    .iter()
                    .any(|fence| fence.is_same_node(Some::<&web_sys::Node>(element)));
                if rendered {
                    landmark
                } else {
                    landmark.inserted()
                }
            })
            .collect();

        Ok((elements, landmarks))
    }

    fn marker(&self) -> Result<Element> {
        let (elements, landmarks) = self.landmarks()?;
        let title = landmarks
            .iter()
            .position(|landmark| *landmark == Landmark::Title)
            .ok_or(SlickError::MissingMarker("title"))?;

        landmarks[title..]
            .iter()
            .position(|landmark| *landmark == Landmark::Marker)
            .map(|offset| elements[title + offset].clone())
            .ok_or(SlickError::MissingMarker("head"))
    }

    fn bind(&self, element: &Element, listener: &Listener) -> Option<EventClosure> {
        let bound = js_sys::Reflect::get(element, &JsValue::from_str(BOUND_PROPERTY))
            .is_ok_and(|value| value.is_truthy());
        if bound {
            return None;
        }

        let (event, trigger): (&str, Extract) =
            if let Some(anchor) = element.dyn_ref::<HtmlAnchorElement>() {
                let anchor = anchor.clone();
                ("click", Box::new(move |event: &Event| link_click(&anchor, event)) as Extract)
            } else if let Some(form) = element.dyn_ref::<HtmlFormElement>() {
                let form = form.clone();
                ("submit", Box::new(move |_: &Event| form_submission(&form)) as Extract)
            } else {
                return None;
            };

        let listener = listener.clone();
        let closure = EventClosure::new(move |event: Event| {
            let Some(trigger) = trigger(&event) else {
                return;
            };
            if listener(trigger) {
                event.prevent_default();
            }
        });

        element
            .add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())
            .ok()?;
        js_sys::Reflect::set(element, &JsValue::from_str(BOUND_PROPERTY), &JsValue::TRUE).ok()?;
        Some(closure)
    }
}

impl Document for WebDocument {
    type Resource = Element;

    fn set_title(&self, title: &str) -> Result<()> {
        let element = self
            .head()?
            .query_selector("title")
            .ok()
            .flatten()
            .ok_or(SlickError::MissingMarker("title"))?;

        element.set_text_content(Some(title));
        Ok(())
    }

    fn set_favicon(&self, href: &str) -> Result<()> {
        // Template head markup may carry icons of its own; only the one after the
        // title tracks the page.
        let favicon = children(&self.head()?)
            .into_iter()
            .skip_while(|element| !element.tag_name().eq_ignore_ascii_case("title"))
            .find(|element| {
                let attrs = attributes(element);
                HeadMarker::Favicon.matches(&element.tag_name(), |name| lookup(&attrs, name))
            });

        if let Some(favicon) = favicon {
            favicon
                .set_attribute("href", href)
                .map_err(|error| SlickError::Dom(describe(&error)))?;
        }
        Ok(())
    }

    fn replace_head(&self, region: Region, markup: &str) -> Result<()> {
        let (elements, landmarks) = self.landmarks()?;
        let range = owned_range(&landmarks, region)?;
        let anchor = elements.get(range.end).cloned();

        for element in &elements[range] {
            element.remove();
        }

        match anchor {
            Some(anchor) => anchor.insert_adjacent_html("beforebegin", markup),
            None => self.head()?.insert_adjacent_html("beforeend", markup),
        }
        .map_err(|error| SlickError::Markup(describe(&error)))
    }

    fn replace_body(&self, region: Region, markup: &str) -> Result<()> {
        let container = self.container(region)?;

        {
            let mut bindings = self.bindings.borrow_mut();
            bindings.page.clear();
            if region == Region::Template {
                bindings.template.clear();
            }
        }

        container.set_inner_html(markup);
        Ok(())
    }

    fn resources(&self, kind: ResourceKind, region: Region) -> Vec<Element> {
        let tag = match kind {
            ResourceKind::Style => "link",
            ResourceKind::Script => "script",
        };
        let selector = format!(
            "{tag}[{attribute}=\"{region}\"]",
            attribute = self.layout.region_attribute,
        );

        self.document
            .document_element()
            .map(|root| select_all(&root, &selector))
            .unwrap_or_default()
    }

    fn remove_resource(&self, resource: &Element) {
        resource.remove();
    }

    fn load_resource(&self, spec: ResourceSpec) -> LocalBoxFuture<'static, Result<()>> {
        let inserted = match spec.kind {
            ResourceKind::Style => self.insert_style(&spec),
            ResourceKind::Script => self.insert_script(&spec),
        };

        match inserted {
            Ok(promise) => {
                let url = spec.url;
                async move {
                    JsFuture::from(promise)
                        .await
                        .map(|_| ())
                        .map_err(|_| SlickError::Resource { url })
                }
                .boxed_local()
            }
            Err(error) => future::ready(Err(error)).boxed_local(),
        }
    }

    fn scroll_to_fragment(&self, fragment: &str) -> bool {
        let Some(element) = self.document.get_element_by_id(fragment) else {
            return false;
        };

        let options = ScrollIntoViewOptions::new();
        options.set_behavior(ScrollBehavior::Smooth);
        element.scroll_into_view_with_scroll_into_view_options(&options);
        true
    }

    fn scroll_to_top(&self) {
        if let Some(window) = web_sys::window() {
            window.scroll_to_with_x_and_y(0.0, 0.0);
        }
    }

    fn attach(&self, scope: Scope, listener: &Listener) -> usize {
        let root = match scope {
            Scope::Document => self.body().ok(),
            Scope::Page => self.container(Region::Page).ok(),
        };
        let Some(root) = root else {
            return 0;
        };

        let template = self.container(Region::Template).ok();
        let page = self.container(Region::Page).ok();
        let contains = |container: &Option<Element>, element: &Element| {
            container
                .as_ref()
                .is_some_and(|container| container.contains(Some::<&web_sys::Node>(element)))
        };

        let mut bound = 0;
        for element in select_all(&root, "a[href], form") {
            let Some(closure) = self.bind(&element, listener) else {
                continue;
            };

            let mut bindings = self.bindings.borrow_mut();
            if contains(&page, &element) {
                bindings.page.push(closure);
            } else if contains(&template, &element) {
                bindings.template.push(closure);
            } else {
                bindings.persistent.push(closure);
            }
            bound += 1;
        }
        bound
    }
}

impl WebDocument {
    fn create(&self, tag: &str, attrs: &[(&str, &str)]) -> Result<Element> {
        let element = self
            .document
            .create_element(tag)
            .map_err(|error| SlickError::Dom(describe(&error)))?;

        for (name, value) in attrs {
            element
                .set_attribute(name, value)
                .map_err(|error| SlickError::Dom(describe(&error)))?;
        }
        Ok(element)
    }

    fn insert_style(&self, spec: &ResourceSpec) -> Result<js_sys::Promise> {
        let link = self.create(
            "link",
            &[
                ("rel", "stylesheet"),
                (self.layout.region_attribute.as_str(), spec.region.as_str()),
            ],
        )?;
        let promise = settled(&link);

        // `href` last so the listeners are in place before the request starts.
        link.set_attribute("href", &spec.url)
            .map_err(|error| SlickError::Dom(describe(&error)))?;
        self.marker()?
            .insert_adjacent_element("beforebegin", &link)
            .map_err(|error| SlickError::Dom(describe(&error)))?;

        Ok(promise)
    }

    fn insert_script(&self, spec: &ResourceSpec) -> Result<js_sys::Promise> {
        let mut attrs = vec![(self.layout.region_attribute.as_str(), spec.region.as_str())];
        if let Some(kind) = &spec.script_type {
            attrs.push(("type", kind.as_str()));
        }

        let script = self.create("script", &attrs)?;
        let promise = settled(&script);

        script
            .set_attribute("src", &spec.url)
            .map_err(|error| SlickError::Dom(describe(&error)))?;
        self.body()?
            .append_child(&script)
            .map_err(|error| SlickError::Dom(describe(&error)))?;

        Ok(promise)
    }
}

impl fmt::Debug for WebDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bindings = self.bindings.borrow();
        f.debug_struct("WebDocument")
            .field("layout", &self.layout)
            .field("template_listeners", &bindings.template.len())
            .field("page_listeners", &bindings.page.len())
            .field("persistent_listeners", &bindings.persistent.len())
            .finish()
    }
}

/// Promise that resolves on the element's `load` event and rejects on `error`.
fn settled(element: &Element) -> js_sys::Promise {
    js_sys::Promise::new(&mut |resolve, reject| {
        let on_load = Closure::once_into_js(move |_: Event| {
            let _ = resolve.call0(&JsValue::UNDEFINED);
        });
        let on_error = Closure::once_into_js(move |event: Event| {
            let _ = reject.call1(&JsValue::UNDEFINED, &event);
        });

        let _ = element.add_event_listener_with_callback("load", on_load.unchecked_ref());
        let _ = element.add_event_listener_with_callback("error", on_error.unchecked_ref());
    })
}

fn select_all(root: &Element, selector: &str) -> Vec<Element> {
    let Ok(nodes) = root.query_selector_all(selector) else {
        return Vec::new();
    };

    (0..nodes.length())
        .filter_map(|index| nodes.item(index))
        .filter_map(|node| node.dyn_into::<Element>().ok())
        .collect()
}

fn children(parent: &Element) -> Vec<Element> {
    let children = parent.children();
    (0..children.length())
        .filter_map(|index| children.item(index))
        .collect()
}

fn classify(element: &Element, marker: HeadMarker) -> Landmark {
    let attrs = attributes(element);
    Landmark::classify(&element.tag_name(), |name| lookup(&attrs, name), marker)
}

fn attributes(element: &Element) -> Vec<(String, String)> {
    element
        .get_attribute_names()
        .iter()
        .filter_map(|name| name.as_string())
        .filter_map(|name| {
            let value = element.get_attribute(&name)?;
            Some((name, value))
        })
        .collect()
}

fn lookup<'a>(attrs: &'a [(String, String)], name: &str) -> Option<&'a str> {
    attrs
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

fn link_click(anchor: &HtmlAnchorElement, event: &Event) -> Option<Trigger> {
    let mouse = event.dyn_ref::<MouseEvent>()?;

    Some(Trigger::Click(LinkClick {
        href: anchor.href(),
        target: Some(anchor.target()).filter(|target| !target.is_empty()),
        button: mouse.button(),
        modifier: mouse.ctrl_key() || mouse.meta_key() || mouse.shift_key() || mouse.alt_key(),
        download: anchor.has_attribute("download"),
    }))
}

fn form_submission(form: &HtmlFormElement) -> Option<Trigger> {
    let data = web_sys::FormData::new_with_form(form).ok()?;
    let mut fields = Vec::new();

    for entry in js_sys::try_iter(&data).ok()??.flatten() {
        let entry: js_sys::Array = entry.unchecked_into();
        let (Some(name), value) = (entry.get(0).as_string(), entry.get(1)) else {
            continue;
        };
        // File entries travel in `data`; a query string only gets the file name.
        let value = value
            .as_string()
            .or_else(|| value.dyn_ref::<web_sys::File>().map(web_sys::File::name))
            .unwrap_or_default();
        fields.push((name, value));
    }

    Some(Trigger::Submit(FormSubmission {
        method: FormMethod::parse(&form.method()),
        action: form.action(),
        body: FormBody {
            fields,
            data: Some(data),
        },
    }))
}
