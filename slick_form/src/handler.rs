use std::fmt;
use std::rc::Rc;

use futures_util::future::LocalBoxFuture;
use serde_json::{Map, Value};
use tracing::warn;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::{
    Element, Event, EventTarget, HtmlFormElement, HtmlInputElement, HtmlOptionElement,
    HtmlSelectElement, HtmlTextAreaElement,
};

use crate::field::{Control, Field, Transform, serialize};
use crate::input::{NumberRules, normalize_email};

/// Receives the serialized form on submit.
pub type SubmitHandler = Rc<dyn Fn(Map<String, Value>) -> LocalBoxFuture<'static, ()>>;

type Listener = (EventTarget, &'static str, Closure<dyn FnMut(Event)>);

/// Submit and input handling bound to one form.
///
/// Listeners are removed when the handler is dropped.
pub struct FormHandler {
    form: HtmlFormElement,
    listeners: Vec<Listener>,
}

impl FormHandler {
    pub fn attach(form: HtmlFormElement, on_submit: SubmitHandler) -> Result<Self, JsValue> {
        let mut handler = Self {
            form: form.clone(),
            listeners: Vec::new(),
        };

        let elements = form.elements();
        for input in (0..elements.length())
            .filter_map(|index| elements.item(index))
            .filter_map(|element| element.dyn_into::<HtmlInputElement>().ok())
        {
            match input.type_().as_str() {
                "number" => handler.watch_number(&input)?,
                "email" => {
                    let target = input.clone();
                    handler.listen(&input, "input", move |_| {
                        target.set_value(&normalize_email(&target.value()));
                    })?;
                }
                _ => {}
            }
        }

        let submitted = form.clone();
        handler.listen(&form, "submit", move |event| {
            event.prevent_default();
            let form = &submitted;

            let data = serialize(&read_fields(form));
            let lock = SubmitLock::engage(form);
            let pending = on_submit(data);

            spawn_local(async move {
                pending.await;
                drop(lock);
            });
        })?;

        Ok(handler)
    }

    /// The form's current values.
    pub fn data(&self) -> Map<String, Value> {
        serialize(&read_fields(&self.form))
    }

    fn watch_number(&mut self, input: &HtmlInputElement) -> Result<(), JsValue> {
        let target = input.clone();
        self.listen(input, "input", move |_| {
            let cleaned = number_rules(&target).sanitize(&target.value());
            target.set_value(&cleaned);
        })?;

        let target = input.clone();
        self.listen(input, "change", move |_| {
            if let Some(settled) = number_rules(&target).settle(&target.value()) {
                target.set_value(&settled);
            }
        })
    }

    fn listen(
        &mut self,
        target: &EventTarget,
        event: &'static str,
        callback: impl FnMut(Event) + 'static,
    ) -> Result<(), JsValue> {
        let closure = Closure::<dyn FnMut(Event)>::new(callback);
        target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())?;
        self.listeners.push((target.clone(), event, closure));
        Ok(())
    }
}

impl Drop for FormHandler {
    fn drop(&mut self) {
        for (target, event, closure) in &self.listeners {
            if let Err(error) =
                target.remove_event_listener_with_callback(event, closure.as_ref().unchecked_ref())
            {
                warn!("could not remove {event} listener: {error:?}");
            }
        }
    }
}

impl fmt::Debug for FormHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormHandler")
            .field("form", &self.form.id())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

/// Keeps the submit button disabled while alive.
struct SubmitLock {
    button: Option<Element>,
}

impl SubmitLock {
    fn engage(form: &HtmlFormElement) -> Self {
        // A button that was already disabled is left as it was.
        let button = form
            .query_selector("*[type=\"submit\"]")
            .ok()
            .flatten()
            .filter(|button| !button.has_attribute("disabled"));

        if let Some(button) = &button {
            if let Err(error) = button.set_attribute("disabled", "") {
                warn!("could not disable submit button: {error:?}");
            }
        }

        Self { button }
    }
}

impl Drop for SubmitLock {
    fn drop(&mut self) {
        if let Some(button) = &self.button {
            if let Err(error) = button.remove_attribute("disabled") {
                warn!("could not re-enable submit button: {error:?}");
            }
        }
    }
}

fn number_rules(input: &HtmlInputElement) -> NumberRules {
    NumberRules::from_attributes(
        input.has_attribute("data-integer-only"),
        &input.min(),
        &input.max(),
        &input.step(),
    )
}

fn read_fields(form: &HtmlFormElement) -> Vec<Field> {
    let elements = form.elements();
    (0..elements.length())
        .filter_map(|index| elements.item(index))
        .filter_map(|element| read_field(&element))
        .collect()
}

fn read_field(element: &Element) -> Option<Field> {
    let transform = Transform::from_attribute(element.get_attribute("data-transform").as_deref());

    if let Some(input) = element.dyn_ref::<HtmlInputElement>() {
        let control = match input.type_().as_str() {
            // Buttons carry no data.
            "submit" | "button" | "reset" | "image" => return None,
            "checkbox" => Control::Checkbox(input.checked()),
            "number" | "range" => Control::Number(input.value()),
            "radio" => Control::Radio {
                checked: input.checked(),
                value: input.value(),
            },
            "file" => Control::File(file_names(input)),
            _ => Control::Text {
                value: input.value(),
                transform,
            },
        };

        return Some(Field {
            name: input.name(),
            disabled: input.disabled(),
            control,
        });
    }

    if let Some(select) = element.dyn_ref::<HtmlSelectElement>() {
        let options = select.selected_options();
        let selected = (0..options.length())
            .filter_map(|index| options.item(index))
            .filter_map(|option| option.dyn_into::<HtmlOptionElement>().ok())
            .map(|option| option.value())
            .collect();

        return Some(Field {
            name: select.name(),
            disabled: select.disabled(),
            control: Control::Select {
                multiple: select.multiple(),
                selected,
            },
        });
    }

    element
        .dyn_ref::<HtmlTextAreaElement>()
        .map(|textarea| Field {
            name: textarea.name(),
            disabled: textarea.disabled(),
            control: Control::Text {
                value: textarea.value(),
                transform,
            },
        })
}

fn file_names(input: &HtmlInputElement) -> Vec<String> {
    input
        .files()
        .map(|files| {
            (0..files.length())
                .filter_map(|index| files.get(index))
                .map(|file| file.name())
                .collect()
        })
        .unwrap_or_default()
}
