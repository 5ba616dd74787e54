//! Seams between the navigation engine and the environment it drives.
//!
//! [`Browser`] covers the window: location, history, network, timers and task
//! spawning. [`Document`] covers the live tree the patcher mutates. Both run on a
//! single thread, so futures are `!Send`.

use std::rc::Rc;

use futures_util::future::LocalBoxFuture;
use slick_protocol::EncodedRequest;
use url::Url;

use crate::bridge::{FormBody, Trigger};
use crate::{Region, ResourceKind, Result, Scope};

/// Called synchronously from an event handler. Returns `true` when the event's
/// default action must be prevented.
pub type Listener = Rc<dyn Fn(Trigger) -> bool>;

/// Body of a navigation response, plus the final URL when the request was redirected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    pub body: String,
    pub redirected: Option<String>,
}

/// One stylesheet or script to insert and wait for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceSpec {
    pub kind: ResourceKind,
    pub url: String,
    pub region: Region,
    /// `type` attribute for scripts.
    pub script_type: Option<String>,
}

pub trait Document {
    /// Handle to a loaded stylesheet or script element.
    type Resource;

    fn set_title(&self, title: &str) -> Result<()>;

    fn set_favicon(&self, href: &str) -> Result<()>;

    /// Replace the head children owned by `region` with `markup`.
    fn replace_head(&self, region: Region, markup: &str) -> Result<()>;

    /// Replace the content of the region's container with `markup`.
    fn replace_body(&self, region: Region, markup: &str) -> Result<()>;

    /// Loaded resources of `kind` tagged with `region`.
    fn resources(&self, kind: ResourceKind, region: Region) -> Vec<Self::Resource>;

    fn remove_resource(&self, resource: &Self::Resource);

    /// Insert a tagged resource element. The future resolves once it has loaded.
    fn load_resource(&self, spec: ResourceSpec) -> LocalBoxFuture<'static, Result<()>>;

    /// Smooth-scroll to the element with id `fragment`. Returns `false` if there is none.
    fn scroll_to_fragment(&self, fragment: &str) -> bool;

    fn scroll_to_top(&self);

    /// Bind `listener` to links and forms in `scope` that have no listener yet.
    /// Returns how many elements were bound.
    fn attach(&self, scope: Scope, listener: &Listener) -> usize;
}

pub trait Browser: 'static {
    type Document: Document;

    fn document(&self) -> &Self::Document;

    fn location(&self) -> Result<Url>;

    /// Add a history entry for `url` without loading it.
    fn push_state(&self, url: &str) -> Result<()>;

    /// Rewrite the current history entry to `url` without loading it.
    fn replace_state(&self, url: &str) -> Result<()>;

    fn fetch_navigation(&self, request: EncodedRequest)
    -> LocalBoxFuture<'static, Result<FetchedPage>>;

    /// POST `body` to `action` without following redirects. Resolves to the
    /// response's `Location` header, if any.
    fn submit_form(
        &self,
        action: &str,
        body: FormBody,
    ) -> LocalBoxFuture<'static, Result<Option<String>>>;

    fn spawn(&self, task: LocalBoxFuture<'static, ()>);

    fn delay(&self, millis: u32) -> LocalBoxFuture<'static, ()>;

    fn now_millis(&self) -> u64;

    /// Register `handler` for back/forward navigation.
    fn on_history_change(&self, handler: Rc<dyn Fn()>) -> Result<()>;
}
