//! JavaScript entry points.

use std::cell::OnceCell;
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

use super::{WebBrowser, describe};
use crate::session::{HistoryUpdate, Outcome, RedirectOptions, Slick};
use crate::{SlickConfig, SlickError};

/// Global object a page may set before calling [`initialize`].
const CONFIG_GLOBAL: &str = "SLICK_CONFIG";

thread_local! {
    static SESSION: OnceCell<Rc<Slick<WebBrowser>>> = const { OnceCell::new() };
}

fn session() -> Result<Rc<Slick<WebBrowser>>, JsValue> {
    SESSION
        .with(|session| session.get().cloned())
        .ok_or_else(|| js_sys::Error::new("slick is not initialized").into())
}

/// Read `window.SLICK_CONFIG`, if the page set one.
fn global_config() -> Result<Option<SlickConfig>, SlickError> {
    let Some(window) = web_sys::window() else {
        return Ok(None);
    };
    let Ok(value) = js_sys::Reflect::get(&window, &JsValue::from_str(CONFIG_GLOBAL)) else {
        return Ok(None);
    };
    if value.is_undefined() || value.is_null() {
        return Ok(None);
    }

    let json = js_sys::JSON::stringify(&value)
        .map_err(|error| SlickError::Dom(describe(&error)))?
        .as_string()
        .unwrap_or_default();

    Ok(Some(SlickConfig::from_json(&json)?))
}

#[cfg(feature = "wasm")]
fn install_diagnostics() {
    #[cfg(target_arch = "wasm32")]
    {
        console_error_panic_hook::set_once();
        tracing_wasm::set_as_global_default();
    }
}

#[cfg(not(feature = "wasm"))]
fn install_diagnostics() {}

/// Start the session for the server-rendered `template`.
///
/// Binds link and form interception and back/forward handling. Calling it again is a
/// no-op.
#[wasm_bindgen]
pub fn initialize(template: &str) -> Result<(), JsValue> {
    if SESSION.with(|session| session.get().is_some()) {
        return Ok(());
    }

    install_diagnostics();

    let mut config = global_config()?.unwrap_or_default();
    if !template.is_empty() {
        template.clone_into(&mut config.template);
    }

    let browser = WebBrowser::new(config.layout.clone())?;
    let slick = Slick::start(browser, config)?;
    SESSION.with(|session| {
        session.get_or_init(|| slick);
    });
    Ok(())
}

/// Navigate to `url`. Resolves to `true` once the new page is displayed, `false` if the
/// call was dropped because another navigation was in flight.
#[wasm_bindgen]
pub async fn redirect(
    url: String,
    reload: Option<bool>,
    scroll_to_top: Option<bool>,
) -> Result<bool, JsValue> {
    let options = RedirectOptions {
        reload: reload.unwrap_or(false),
        scroll_to_top: scroll_to_top.unwrap_or(true),
        history: HistoryUpdate::Push,
    };

    let outcome = session()?.redirect_with(&url, options).await?;
    Ok(matches!(outcome, Outcome::Completed { .. }))
}

/// Run `callback` after every completed navigation. A returned promise is awaited.
#[wasm_bindgen]
pub fn add_onload_listener(callback: js_sys::Function) -> Result<(), JsValue> {
    session()?.hooks().add(move || {
        let returned = callback.call0(&JsValue::UNDEFINED);
        async move {
            let result = match returned {
                Ok(value) => match value.dyn_into::<js_sys::Promise>() {
                    Ok(promise) => JsFuture::from(promise).await.map(|_| ()),
                    Err(_) => Ok(()),
                },
                Err(error) => Err(error),
            };

            if let Err(error) = result {
                tracing::warn!(error = %describe(&error), "onload listener failed");
            }
        }
    });
    Ok(())
}
