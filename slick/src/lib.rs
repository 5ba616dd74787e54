#![allow(missing_docs)]
//! Soft navigation for server-rendered sites.
//!
//! Same-origin link clicks and form submissions are intercepted, the target is
//! requested as a JSON navigation response, and only the parts of the document that
//! changed are transplanted: the page region on every navigation, the template region
//! only when the server reports a different template. Stylesheets and scripts are
//! loaded per region and removed with it.
//!
//! The engine is written against the [`Browser`] and [`Document`] traits. [`web`]
//! drives the real browser through `web_sys`; `virtual_dom` keeps an in-memory tree for
//! headless use.

pub mod bridge;
pub mod config;
mod error;
pub mod hooks;
pub mod loader;
pub mod patcher;
pub mod platform;
pub mod range;
mod region;
pub mod session;
#[cfg(not(target_arch = "wasm32"))]
pub mod virtual_dom;
pub mod web;

pub use js_sys;
pub use slick_protocol as protocol;
pub use url;
pub use wasm_bindgen;
pub use web_sys;

pub use bridge::{FormBody, FormMethod, FormSubmission, Intercept, LinkClick, Trigger, classify};
pub use config::{DocumentLayout, HeadMarker, SlickConfig};
pub use error::{Result, SlickError};
pub use hooks::{Hook, Hooks};
pub use platform::{Browser, Document, FetchedPage, Listener, ResourceSpec};
pub use region::{Region, ResourceKind, Scope};
pub use session::{HistoryUpdate, NavigationState, Outcome, RedirectOptions, Slick};
