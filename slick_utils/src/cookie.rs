//! `document.cookie` access.
//!
//! Values are percent-encoded on the way in and decoded on the way out. Cookies are
//! written for the whole site (`path=/`), `secure` and `SameSite=Lax`.

use chrono::{DateTime, Duration, Utc};
use tracing::warn;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::HtmlDocument;

/// Lifetime of a cookie written with [`CookieJar::set`].
pub const DEFAULT_DAYS: u32 = 365;

const EXPIRED: &str = "Thu, 01 Jan 1970 00:00:01 GMT";

/// Value of cookie `name` in a `document.cookie` string.
pub fn find(cookies: &str, name: &str) -> Option<String> {
    cookies
        .split(';')
        .map(str::trim)
        .filter_map(|entry| entry.split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| match urlencoding::decode(value) {
            Ok(decoded) => decoded.into_owned(),
            Err(_) => value.to_owned(),
        })
}

/// The `document.cookie` assignment that stores `value` until `expires`.
pub fn assignment(name: &str, value: &str, expires: DateTime<Utc>) -> String {
    format!(
        "{name}={}; expires={}; path=/; secure; SameSite=Lax;",
        urlencoding::encode(value),
        http_date(expires)
    )
}

/// The `document.cookie` assignment that deletes `name`.
pub fn removal(name: &str) -> String {
    format!("{name}=; expires={EXPIRED}; path=/;")
}

pub fn expiry(now: DateTime<Utc>, days: u32) -> DateTime<Utc> {
    now + Duration::days(i64::from(days))
}

fn http_date(at: DateTime<Utc>) -> String {
    at.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Cookies of the current document.
#[derive(Debug, Clone)]
pub struct CookieJar {
    document: HtmlDocument,
}

impl CookieJar {
    /// The jar of the window's document, if there is one.
    pub fn current() -> Option<Self> {
        let document = web_sys::window()?.document()?;
        document.dyn_into::<HtmlDocument>().ok().map(Self::new)
    }

    pub fn new(document: HtmlDocument) -> Self {
        Self { document }
    }

    pub fn get(&self, name: &str) -> Option<String> {
        match self.document.cookie() {
            Ok(cookies) => find(&cookies, name),
            Err(error) => {
                warn!("cookies are not readable: {error:?}");
                None
            }
        }
    }

    pub fn set(&self, name: &str, value: &str) -> Result<(), JsValue> {
        self.set_for_days(name, value, DEFAULT_DAYS)
    }

    pub fn set_for_days(&self, name: &str, value: &str, days: u32) -> Result<(), JsValue> {
        let expires = expiry(Utc::now(), days);
        self.document.set_cookie(&assignment(name, value, expires))
    }

    pub fn delete(&self, name: &str) -> Result<(), JsValue> {
        self.document.set_cookie(&removal(name))
    }
}
