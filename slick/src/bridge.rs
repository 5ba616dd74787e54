//! Link and form interception, plus back/forward handling.
//!
//! Deciding whether an event is intercepted is pure ([`classify`]); the session turns
//! the decision into a navigation on a spawned task.

use std::rc::Rc;

use futures_util::FutureExt;
use slick_protocol::{path_of, same_origin};
use tracing::{debug, error, warn};
use url::Url;

use crate::platform::{Browser, Document, Listener};
use crate::session::{HistoryUpdate, Outcome, RedirectOptions, Slick};
use crate::{Result, Scope};

/// A user action on an interceptable element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    Click(LinkClick),
    Submit(FormSubmission),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkClick {
    /// `href` as written or resolved; relative values resolve against the location.
    pub href: String,
    pub target: Option<String>,
    /// `MouseEvent.button`; `0` is the primary button.
    pub button: i16,
    /// Any of ctrl, meta, shift or alt was held.
    pub modifier: bool,
    pub download: bool,
}

impl LinkClick {
    /// A plain primary-button click on `href`.
    pub fn plain(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            target: None,
            button: 0,
            modifier: false,
            download: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMethod {
    Get,
    Post,
    /// `dialog` or anything unrecognised.
    Other,
}

impl FormMethod {
    pub fn parse(method: &str) -> Self {
        if method.eq_ignore_ascii_case("get") || method.is_empty() {
            FormMethod::Get
        } else if method.eq_ignore_ascii_case("post") {
            FormMethod::Post
        } else {
            FormMethod::Other
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormSubmission {
    pub method: FormMethod,
    /// `action` as written or resolved; empty means the current location.
    pub action: String,
    pub body: FormBody,
}

/// The entries a form submits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormBody {
    /// Entries in document order, file inputs reduced to the file name.
    pub fields: Vec<(String, String)>,
    /// The form's own entries, files included, when read from a live form.
    pub data: Option<web_sys::FormData>,
}

impl FormBody {
    pub fn from_fields(fields: Vec<(String, String)>) -> Self {
        Self { fields, data: None }
    }
}

/// What to do with a [`Trigger`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intercept {
    /// Let the browser handle the event.
    Native,
    /// Navigate to this path, query and fragment.
    Navigate(String),
    /// Post the body to `action` and follow the returned location, if any.
    Post { action: String, body: FormBody },
}

/// Decide whether `trigger` is handled by the session, relative to `location`.
pub fn classify(trigger: Trigger, location: &Url) -> Intercept {
    match trigger {
        Trigger::Click(click) => classify_click(&click, location),
        Trigger::Submit(submission) => classify_submit(submission, location),
    }
}

fn classify_click(click: &LinkClick, location: &Url) -> Intercept {
    if click.button != 0 || click.modifier || click.download {
        return Intercept::Native;
    }

    let target = click.target.as_deref().unwrap_or_default();
    if !target.is_empty() && !target.eq_ignore_ascii_case("_self") {
        return Intercept::Native;
    }

    match location.join(&click.href) {
        Ok(url) if same_origin(&url, location) => Intercept::Navigate(path_of(&url)),
        _ => Intercept::Native,
    }
}

fn classify_submit(submission: FormSubmission, location: &Url) -> Intercept {
    let Ok(mut action) = location.join(&submission.action) else {
        return Intercept::Native;
    };
    if !same_origin(&action, location) {
        return Intercept::Native;
    }

    match submission.method {
        FormMethod::Get => {
            action.set_query(None);
            if !submission.body.fields.is_empty() {
                action.query_pairs_mut().extend_pairs(&submission.body.fields);
            }
            Intercept::Navigate(path_of(&action))
        }
        FormMethod::Post => Intercept::Post {
            action: path_of(&action),
            body: submission.body,
        },
        FormMethod::Other => Intercept::Native,
    }
}

impl<B: Browser> Slick<B> {
    /// Bind interception to links and forms in `scope` that are not bound yet.
    pub fn attach_interception(&self, scope: Scope) -> usize {
        let bound = self.browser.document().attach(scope, &self.listener());
        debug!(?scope, bound, "interception attached");
        bound
    }

    fn listener(&self) -> Listener {
        let session = self.this.clone();

        Rc::new(move |trigger| {
            let Some(slick) = session.upgrade() else {
                return false;
            };

            let location = match slick.browser.location() {
                Ok(location) => location,
                Err(error) => {
                    warn!(%error, "no location, leaving event to the browser");
                    return false;
                }
            };

            let intercept = classify(trigger, &location);
            if intercept == Intercept::Native {
                return false;
            }

            let task = slick.clone();
            slick.browser.spawn(
                async move {
                    if let Err(error) = task.follow(intercept).await {
                        error!(%error, "intercepted navigation failed");
                    }
                }
                .boxed_local(),
            );

            true
        })
    }

    /// Carry out an intercepted action.
    pub async fn follow(&self, intercept: Intercept) -> Result<Outcome> {
        match intercept {
            Intercept::Native => Ok(Outcome::Stayed),
            Intercept::Navigate(url) => self.redirect(&url).await,
            Intercept::Post { action, body } => self.submit(&action, body).await,
        }
    }

    /// Post a form without following redirects, then navigate to the returned location.
    ///
    /// The single-flight guard is held for the POST itself, so a second submit while
    /// the first is pending is dropped rather than sent twice.
    pub async fn submit(&self, action: &str, body: FormBody) -> Result<Outcome> {
        let location = {
            let Some(_guard) = self.in_flight.acquire() else {
                debug!(action, "navigation in flight, dropping form submission");
                return Ok(Outcome::Dropped);
            };

            self.browser.submit_form(action, body).await?
        };

        match location {
            Some(location) => self.redirect(&location).await,
            None => Ok(Outcome::Stayed),
        }
    }

    /// Navigate to the entry the browser moved to on back/forward.
    pub async fn restore(&self) -> Result<Outcome> {
        let target = path_of(&self.browser.location()?);
        let options = RedirectOptions {
            reload: false,
            scroll_to_top: self.config.history_scroll_to_top,
            history: HistoryUpdate::Replace,
        };

        self.redirect_with(&target, options).await
    }

    pub(crate) fn listen_history(&self) -> Result<()> {
        let session = self.this.clone();

        self.browser.on_history_change(Rc::new(move || {
            let Some(slick) = session.upgrade() else {
                return;
            };

            let task = slick.clone();
            slick.browser.spawn(
                async move {
                    if let Err(error) = task.restore().await {
                        error!(%error, "history navigation failed");
                    }
                }
                .boxed_local(),
            );
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location() -> Url {
        Url::parse("https://example.com/blog?page=2").unwrap()
    }

    fn click(href: &str) -> Trigger {
        Trigger::Click(LinkClick::plain(href))
    }

    fn submit(method: FormMethod, action: &str, fields: &[(&str, &str)]) -> Trigger {
        Trigger::Submit(FormSubmission {
            method,
            action: action.to_owned(),
            body: FormBody::from_fields(
                fields
                    .iter()
                    .map(|(name, value)| ((*name).to_owned(), (*value).to_owned()))
                    .collect(),
            ),
        })
    }

    #[test]
    fn test_plain_same_origin_links_are_intercepted() {
        assert_eq!(
            classify(click("/about#contact"), &location()),
            Intercept::Navigate("/about#contact".to_owned())
        );
        assert_eq!(
            classify(click("https://example.com/a?b=c"), &location()),
            Intercept::Navigate("/a?b=c".to_owned())
        );
        assert_eq!(
            classify(click("post-1"), &location()),
            Intercept::Navigate("/post-1".to_owned())
        );

        let mut same_tab = LinkClick::plain("/x");
        same_tab.target = Some("_SELF".to_owned());
        assert_eq!(
            classify(Trigger::Click(same_tab), &location()),
            Intercept::Navigate("/x".to_owned())
        );
    }

    #[test]
    fn test_other_links_are_left_to_the_browser() {
        assert_eq!(classify(click("https://other.com/"), &location()), Intercept::Native);
        assert_eq!(classify(click("mailto:a@b.c"), &location()), Intercept::Native);
        assert_eq!(classify(click("http://example.com/"), &location()), Intercept::Native);

        let mut new_tab = LinkClick::plain("/x");
        new_tab.target = Some("_blank".to_owned());
        assert_eq!(classify(Trigger::Click(new_tab), &location()), Intercept::Native);

        let mut modified = LinkClick::plain("/x");
        modified.modifier = true;
        assert_eq!(classify(Trigger::Click(modified), &location()), Intercept::Native);

        let mut middle = LinkClick::plain("/x");
        middle.button = 1;
        assert_eq!(classify(Trigger::Click(middle), &location()), Intercept::Native);

        let mut download = LinkClick::plain("/report.pdf");
        download.download = true;
        assert_eq!(classify(Trigger::Click(download), &location()), Intercept::Native);
    }

    #[test]
    fn test_get_forms_replace_the_query() {
        assert_eq!(
            classify(
                submit(FormMethod::Get, "/search?old=1", &[("q", "rust lang"), ("tag", "a&b")]),
                &location()
            ),
            Intercept::Navigate("/search?q=rust+lang&tag=a%26b".to_owned())
        );
        // An empty action submits to the current path.
        assert_eq!(
            classify(submit(FormMethod::Get, "", &[("page", "3")]), &location()),
            Intercept::Navigate("/blog?page=3".to_owned())
        );
        assert_eq!(
            classify(submit(FormMethod::Get, "/all", &[]), &location()),
            Intercept::Navigate("/all".to_owned())
        );
    }

    #[test]
    fn test_post_forms() {
        assert_eq!(
            classify(submit(FormMethod::Post, "/contact", &[("name", "Ada")]), &location()),
            Intercept::Post {
                action: "/contact".to_owned(),
                body: FormBody::from_fields(vec![("name".to_owned(), "Ada".to_owned())]),
            }
        );

        assert_eq!(
            classify(submit(FormMethod::Post, "https://other.com/x", &[]), &location()),
            Intercept::Native
        );

        // A file input with nothing chosen still submits an entry; the form is posted
        // like any other.
        assert_eq!(
            classify(submit(FormMethod::Post, "/profile", &[("avatar", "")]), &location()),
            Intercept::Post {
                action: "/profile".to_owned(),
                body: FormBody::from_fields(vec![("avatar".to_owned(), String::new())]),
            }
        );

        assert_eq!(
            classify(submit(FormMethod::Other, "/x", &[]), &location()),
            Intercept::Native
        );
    }

    #[test]
    fn test_form_method_parse() {
        assert_eq!(FormMethod::parse("GET"), FormMethod::Get);
        assert_eq!(FormMethod::parse(""), FormMethod::Get);
        assert_eq!(FormMethod::parse("Post"), FormMethod::Post);
        assert_eq!(FormMethod::parse("dialog"), FormMethod::Other);
    }
}
