//! `web_sys` backend driving the real browser.

mod document;
mod entry;

use std::rc::Rc;

use futures_util::FutureExt;
use futures_util::future::LocalBoxFuture;
use slick_protocol::EncodedRequest;
use tracing::warn;
use url::Url;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{FormData, Headers, Request, RequestInit, RequestRedirect, Response, Window};

use crate::bridge::FormBody;
use crate::platform::{Browser, FetchedPage};
use crate::{DocumentLayout, Result, SlickError};

pub use document::WebDocument;
pub use entry::{add_onload_listener, initialize, redirect};

/// The browser window.
#[derive(Debug)]
pub struct WebBrowser {
    window: Window,
    document: WebDocument,
}

impl WebBrowser {
    pub fn new(layout: DocumentLayout) -> Result<Self> {
        let window = web_sys::window().ok_or_else(|| SlickError::Dom("no global window".to_owned()))?;
        let document = window
            .document()
            .ok_or_else(|| SlickError::Dom("no document".to_owned()))?;

        Ok(Self {
            document: WebDocument::new(document, layout),
            window,
        })
    }
}

impl Browser for WebBrowser {
    type Document = WebDocument;

    fn document(&self) -> &WebDocument {
        &self.document
    }

    fn location(&self) -> Result<Url> {
        let href = self
            .window
            .location()
            .href()
            .map_err(|error| SlickError::Dom(describe(&error)))?;

        Ok(Url::parse(&href)?)
    }

    fn push_state(&self, url: &str) -> Result<()> {
        self.window
            .history()
            .and_then(|history| history.push_state_with_url(&JsValue::NULL, "", Some(url)))
            .map_err(|error| SlickError::History(describe(&error)))
    }

    fn replace_state(&self, url: &str) -> Result<()> {
        self.window
            .history()
            .and_then(|history| history.replace_state_with_url(&JsValue::NULL, "", Some(url)))
            .map_err(|error| SlickError::History(describe(&error)))
    }

    fn fetch_navigation(&self, request: EncodedRequest) -> LocalBoxFuture<'static, Result<FetchedPage>> {
        let window = self.window.clone();

        async move {
            let url = request.url.clone();
            let transport = |error: JsValue| SlickError::Transport {
                url: url.clone(),
                reason: describe(&error),
            };

            let init = RequestInit::new();
            init.set_method(request.method);

            let headers = Headers::new().map_err(transport)?;
            for (name, value) in &request.headers {
                headers.set(name, value).map_err(transport)?;
            }
            init.set_headers(&headers);

            if let Some(body) = &request.body {
                init.set_body(&JsValue::from_str(body));
            }

            let request = Request::new_with_str_and_init(&url, &init).map_err(transport)?;
            let response: Response = JsFuture::from(window.fetch_with_request(&request))
                .await
                .and_then(|value| value.dyn_into())
                .map_err(transport)?;

            if !response.ok() {
                return Err(SlickError::Transport {
                    url: url.clone(),
                    reason: format!("HTTP {}", response.status()),
                });
            }

            let body = JsFuture::from(response.text().map_err(transport)?)
                .await
                .map_err(transport)?
                .as_string()
                .unwrap_or_default();

            Ok(FetchedPage {
                body,
                redirected: response.redirected().then(|| response.url()),
            })
        }
        .boxed_local()
    }

    fn submit_form(
        &self,
        action: &str,
        body: FormBody,
    ) -> LocalBoxFuture<'static, Result<Option<String>>> {
        let window = self.window.clone();
        let action = action.to_owned();

        async move {
            let transport = |error: JsValue| SlickError::Transport {
                url: action.clone(),
                reason: describe(&error),
            };

            // The live form's own entries keep their files.
            let data = match body.data {
                Some(data) => data,
                None => {
                    let data = FormData::new().map_err(transport)?;
                    for (name, value) in &body.fields {
                        data.append_with_str(name, value).map_err(transport)?;
                    }
                    data
                }
            };

            let init = RequestInit::new();
            init.set_method("POST");
            init.set_redirect(RequestRedirect::Manual);
            init.set_body(&data);

            let response: Response = JsFuture::from(window.fetch_with_str_and_init(&action, &init))
                .await
                .and_then(|value| value.dyn_into())
                .map_err(transport)?;

            response.headers().get("Location").map_err(transport)
        }
        .boxed_local()
    }

    fn spawn(&self, task: LocalBoxFuture<'static, ()>) {
        wasm_bindgen_futures::spawn_local(task);
    }

    fn delay(&self, millis: u32) -> LocalBoxFuture<'static, ()> {
        let window = self.window.clone();
        let timeout = i32::try_from(millis).unwrap_or(i32::MAX);
        let promise = js_sys::Promise::new(&mut |resolve, _reject| {
            if window
                .set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, timeout)
                .is_err()
            {
                warn!(millis, "setTimeout failed, resolving immediately");
                let _ = resolve.call0(&JsValue::UNDEFINED);
            }
        });

        async move {
            let _ = JsFuture::from(promise).await;
        }
        .boxed_local()
    }

    fn now_millis(&self) -> u64 {
        js_sys::Date::now() as u64
    }

    fn on_history_change(&self, handler: Rc<dyn Fn()>) -> Result<()> {
        let callback = Closure::<dyn FnMut(web_sys::PopStateEvent)>::new(move |_| handler());

        self.window
            .add_event_listener_with_callback("popstate", callback.as_ref().unchecked_ref())
            .map_err(|error| SlickError::Dom(describe(&error)))?;
        // Lives as long as the page.
        callback.forget();
        Ok(())
    }
}

/// Best-effort message for a thrown JS value.
pub(crate) fn describe(value: &JsValue) -> String {
    if let Some(error) = value.dyn_ref::<js_sys::Error>() {
        return String::from(error.message());
    }

    value
        .as_string()
        .or_else(|| js_sys::JSON::stringify(value).ok()?.as_string())
        .unwrap_or_else(|| format!("{value:?}"))
}

impl From<SlickError> for JsValue {
    fn from(error: SlickError) -> Self {
        js_sys::Error::new(&error.to_string()).into()
    }
}
