use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use slick_protocol::{NavigationRequest, NavigationResponse, path_of};
use tracing::{debug, info};
use url::Url;

use crate::hooks::Hooks;
use crate::patcher::Patcher;
use crate::platform::{Browser, Document};
use crate::{Region, Result, Scope, SlickConfig};

/// How a navigation records itself in the session history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HistoryUpdate {
    /// Add a new entry (link clicks, form submissions, programmatic redirects).
    #[default]
    Push,
    /// Rewrite the current entry (back/forward, where the browser already moved).
    Replace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RedirectOptions {
    /// Ask the server for a fresh template even if the mounted one matches.
    pub reload: bool,
    /// Scroll to the top when the target has no fragment to scroll to.
    pub scroll_to_top: bool,
    pub history: HistoryUpdate,
}

impl Default for RedirectOptions {
    fn default() -> Self {
        Self {
            reload: false,
            scroll_to_top: true,
            history: HistoryUpdate::Push,
        }
    }
}

/// Result of a navigation attempt that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The document now shows `url` (path, query and fragment).
    Completed { url: String },
    /// Another navigation was in flight; nothing happened.
    Dropped,
    /// A form was posted and the server named no page to go to.
    Stayed,
}

/// Snapshot of the session's mutable state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationState {
    pub current_template: String,
    pub in_flight: bool,
    /// History and interception handlers are bound.
    pub initialized: bool,
}

/// Single-flight flag. Only one guard can exist at a time.
#[derive(Debug, Default)]
pub(crate) struct InFlight(Cell<bool>);

pub(crate) struct InFlightGuard<'a>(&'a Cell<bool>);

impl InFlight {
    pub(crate) fn acquire(&self) -> Option<InFlightGuard<'_>> {
        if self.0.replace(true) {
            None
        } else {
            Some(InFlightGuard(&self.0))
        }
    }

    pub(crate) fn get(&self) -> bool {
        self.0.get()
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// A navigation session: one per page load.
///
/// Owns the mounted template identity, the single-flight guard and the lifecycle
/// hooks. Created with [`Slick::start`], which also binds back/forward handling and
/// link/form interception for the whole document.
pub struct Slick<B: Browser> {
    pub(crate) browser: B,
    pub(crate) config: SlickConfig,
    template: RefCell<String>,
    pub(crate) in_flight: InFlight,
    initialized: Cell<bool>,
    hooks: Hooks,
    pub(crate) this: Weak<Self>,
}

impl<B: Browser> Slick<B> {
    pub fn start(browser: B, config: SlickConfig) -> Result<Rc<Self>> {
        let slick = Rc::new_cyclic(|this| Self {
            template: RefCell::new(config.template.clone()),
            browser,
            config,
            in_flight: InFlight::default(),
            initialized: Cell::new(false),
            hooks: Hooks::new(),
            this: this.clone(),
        });

        slick.listen_history()?;
        slick.attach_interception(Scope::Document);
        slick.initialized.set(true);

        info!(template = %slick.config.template, "slick session started");
        Ok(slick)
    }

    pub fn browser(&self) -> &B {
        &self.browser
    }

    pub fn config(&self) -> &SlickConfig {
        &self.config
    }

    pub fn hooks(&self) -> &Hooks {
        &self.hooks
    }

    pub fn state(&self) -> NavigationState {
        NavigationState {
            current_template: self.template.borrow().clone(),
            in_flight: self.in_flight.get(),
            initialized: self.initialized.get(),
        }
    }

    /// Navigate to `url` with default options.
    pub async fn redirect(&self, url: &str) -> Result<Outcome> {
        self.redirect_with(url, RedirectOptions::default()).await
    }

    /// Navigate to `url`.
    ///
    /// Returns [`Outcome::Dropped`] without side effects if a navigation is already in
    /// flight. The response is parsed before the document is touched, so transport
    /// and parse failures leave the current page displayed.
    pub async fn redirect_with(&self, url: &str, options: RedirectOptions) -> Result<Outcome> {
        let Some(_guard) = self.in_flight.acquire() else {
            debug!(url, "navigation in flight, dropping");
            return Ok(Outcome::Dropped);
        };

        let known = (!options.reload).then(|| self.template.borrow().clone());
        let request = NavigationRequest::new(url, known.as_deref())
            .encode(self.config.transport, &self.config.template_header);

        let fetched = self.browser.fetch_navigation(request).await?;
        let response = NavigationResponse::from_json(&fetched.body)?;

        let target = self
            .browser
            .location()?
            .join(fetched.redirected.as_deref().unwrap_or(url))?;
        match options.history {
            HistoryUpdate::Push => self.browser.push_state(target.as_str())?,
            HistoryUpdate::Replace => self.browser.replace_state(target.as_str())?,
        }

        let document = self.browser.document();
        document.set_title(&response.title)?;
        document.set_favicon(&response.favicon)?;

        let patcher = Patcher::new(&self.browser, &self.config);

        if let Some(template) = &response.template {
            patcher
                .swap_region(Region::Template, &template.region)
                .await?;
            *self.template.borrow_mut() = template.name.clone();
            self.attach_interception(Scope::Document);
        }

        patcher.swap_region(Region::Page, &response.page).await?;
        self.attach_interception(Scope::Page);

        self.restore_scroll(&target, options.scroll_to_top);
        self.hooks.run().await;

        let path = path_of(&target);
        info!(
            url = %path,
            template = %self.template.borrow(),
            template_swapped = response.template.is_some(),
            "navigation completed"
        );

        Ok(Outcome::Completed { url: path })
    }

    fn restore_scroll(&self, target: &Url, scroll_to_top: bool) {
        let document = self.browser.document();

        match target.fragment().filter(|fragment| !fragment.is_empty()) {
            Some(fragment) if document.scroll_to_fragment(fragment) => {}
            _ if scroll_to_top => document.scroll_to_top(),
            _ => {}
        }
    }
}

impl<B: Browser> fmt::Debug for Slick<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slick")
            .field("template", &self.template.borrow())
            .field("in_flight", &self.in_flight.get())
            .field("hooks", &self.hooks)
            .finish_non_exhaustive()
    }
}
