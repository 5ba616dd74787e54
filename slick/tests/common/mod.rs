#![allow(dead_code, missing_debug_implementations, unreachable_pub)]

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use futures_util::FutureExt;
use futures_util::future::{self, LocalBoxFuture};
use slick::protocol::server::{Client, classify, json_response};
use slick::protocol::{
    EncodedRequest, KNOWN_TEMPLATE_HEADER, NavigationResponse, RegionPayload, TemplatePayload,
};
use slick::url::Url;
use slick::virtual_dom::VirtualDocument;
use slick::{Browser, FetchedPage, FormBody, Result, Slick, SlickConfig, SlickError};

pub const ORIGIN: &str = "https://shop.test";
pub const CLOCK: u64 = 1_700_000_000_000;

/// Server-rendered `/` with the `main` template mounted.
pub const SHELL: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="template" content="main">
    <title>Home</title>
    <link rel="shortcut icon" href="/favicon.ico">
    <meta name="description" content="home">
    <script slick-static src="/analytics.js"></script>
</head>
<body>
    <div id="root">
        <header id="chrome">
            <a href="/">Home</a>
            <a href="/about">About</a>
            <a href="https://elsewhere.org/">Elsewhere</a>
        </header>
        <main id="app">
            <h1>Home</h1>
            <a href="/about#contact">Contact us</a>
            <a href="/blog">Blog</a>
            <form id="contact-form" method="post" action="/contact">
                <input name="name" value="Ada">
                <input name="email" value="ada@example.com">
            </form>
            <form id="search" action="/search">
                <input name="q" value="rust lang">
            </form>
        </main>
    </div>
    <footer><a href="/legal">Legal</a></footer>
</body>
</html>"#;

struct SitePage {
    title: String,
    favicon: String,
    template: String,
    page: RegionPayload,
}

/// Canned server behind [`TestBrowser::fetch_navigation`].
#[derive(Default)]
struct Site {
    templates: HashMap<String, TemplatePayload>,
    pages: HashMap<String, SitePage>,
    redirects: HashMap<String, String>,
    raw: HashMap<String, String>,
    down: Vec<String>,
    form_targets: HashMap<String, Option<String>>,
}

pub fn region(head: &str, body: &str, styles: &[&str], scripts: &[&str]) -> RegionPayload {
    RegionPayload {
        head: head.to_owned(),
        body: body.to_owned(),
        styles: styles.iter().map(|url| (*url).to_owned()).collect(),
        scripts: scripts.iter().map(|url| (*url).to_owned()).collect(),
    }
}

impl Site {
    fn storefront() -> Self {
        let mut site = Site::default();

        site.template(
            "main",
            region(
                r#"<meta name="template" content="main">"#,
                r#"<header id="chrome"><a href="/">Home</a><a href="/about">About</a></header><main id="app"></main>"#,
                &["/main.css"],
                &["/main.js"],
            ),
        );
        site.template(
            "docs",
            region(
                r#"<meta name="template" content="docs"><link rel="preload" href="/font.woff2">"#,
                r#"<nav id="docs-nav"><a href="/">Home</a><a href="/docs">Docs</a></nav><article id="app"></article>"#,
                &["/docs.css"],
                &["/docs.js"],
            ),
        );

        site.page(
            "/",
            "Home",
            "main",
            region(
                r#"<meta name="description" content="home">"#,
                r#"<h1>Home</h1><a href="/about#contact">Contact us</a><a href="/blog">Blog</a>"#,
                &[],
                &[],
            ),
        );
        site.page(
            "/about",
            "About",
            "main",
            region(
                r#"<meta name="description" content="about">"#,
                r#"<h1>About</h1><p>Since 1999.</p><section id="contact">Write to us</section>"#,
                &["/about.css"],
                &["/about.js"],
            ),
        );
        site.page(
            "/blog",
            "Blog",
            "main",
            region(
                r#"<meta name="description" content="blog">"#,
                r#"<h1>Blog</h1><a href="/blog/first">First post</a>"#,
                &["/blog.css"],
                &[],
            ),
        );
        site.page(
            "/docs",
            "Docs",
            "docs",
            region(
                r#"<meta name="description" content="docs">"#,
                "<h1>Docs</h1>",
                &["/docs-page.css"],
                &[],
            ),
        );
        site.template(
            "shop",
            region(
                r#"<meta name="template" content="shop"><link rel="icon" sizes="32x32" href="/shop-32.png">"#,
                r#"<main id="app"></main>"#,
                &[],
                &[],
            ),
        );
        site.template(
            "landing",
            region(
                r#"<base href="/landing/"><script slick-static src="/landing.js"></script><meta name="template" content="landing">"#,
                r#"<main id="app"></main>"#,
                &[],
                &[],
            ),
        );
        site.page("/shop", "Shop", "shop", region("", "<h1>Shop</h1>", &[], &[]));
        site.pages.get_mut("/shop").unwrap().favicon = "/shop.ico".to_owned();
        site.page("/landing", "Landing", "landing", region("", "<h1>Landing</h1>", &[], &[]));
        site.page(
            "/profile",
            "Profile",
            "main",
            region(
                "",
                r#"<form id="avatar-form" method="post" action="/profile" enctype="multipart/form-data"><input type="file" name="avatar"><input name="nick" value="ada"></form>"#,
                &[],
                &[],
            ),
        );
        site.page(
            "/thanks",
            "Thanks",
            "main",
            region("", "<h1>Thanks!</h1>", &[], &[]),
        );
        site.page(
            "/search",
            "Search",
            "main",
            region("", r#"<h1 id="results">Results</h1>"#, &[], &[]),
        );

        site.form_targets
            .insert("/contact".to_owned(), Some("/thanks".to_owned()));
        site.form_targets
            .insert("/profile".to_owned(), Some("/thanks".to_owned()));
        site
    }

    fn template(&mut self, name: &str, region: RegionPayload) {
        self.templates.insert(
            name.to_owned(),
            TemplatePayload {
                name: name.to_owned(),
                region,
            },
        );
    }

    fn page(&mut self, path: &str, title: &str, template: &str, page: RegionPayload) {
        self.pages.insert(
            path.to_owned(),
            SitePage {
                title: title.to_owned(),
                favicon: "/favicon.ico".to_owned(),
                template: template.to_owned(),
                page,
            },
        );
    }

    /// Answer `request` the way a slick-aware server would.
    fn answer(&self, request: &EncodedRequest, url: &Url) -> Result<FetchedPage> {
        let mut path = url.path().to_owned();
        let mut redirected = None;

        if let Some(target) = self.redirects.get(&path) {
            redirected = Some(url.join(target)?.to_string());
            path = target.clone();
        }

        let unavailable = |reason: &str| SlickError::Transport {
            url: request.url.clone(),
            reason: reason.to_owned(),
        };

        if self.down.contains(&path) {
            return Err(unavailable("connection reset"));
        }
        if let Some(body) = self.raw.get(&path) {
            return Ok(FetchedPage {
                body: body.clone(),
                redirected,
            });
        }

        let page = self.pages.get(&path).ok_or_else(|| unavailable("HTTP 404"))?;
        let template = self.templates[&page.template].clone();

        let known_template = match classify(&receive(request, url), KNOWN_TEMPLATE_HEADER, request.body.as_deref()) {
            Client::Slick { known_template } => known_template,
            Client::Document => return Err(unavailable("not a slick request")),
        };

        let response = NavigationResponse::new(&page.title, &page.favicon, page.page.clone())
            .with_template_unless_known(known_template.as_deref(), template);

        Ok(FetchedPage {
            body: json_response(&response)?.into_body(),
            redirected,
        })
    }
}

/// The request as an `http` server would see it.
fn receive(request: &EncodedRequest, url: &Url) -> http::Request<()> {
    let target = match url.query() {
        Some(query) => format!("{}?{query}", url.path()),
        None => url.path().to_owned(),
    };

    let mut builder = http::Request::builder()
        .method(request.method)
        .uri(target.as_str());
    for (name, value) in &request.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder.body(()).unwrap()
}

/// A scripted browser over a [`VirtualDocument`].
///
/// Network calls yield once before resolving so that concurrent navigations really
/// overlap. Spawned tasks are queued until [`TestBrowser::run_pending`].
pub struct TestBrowser {
    document: VirtualDocument,
    site: RefCell<Site>,
    entries: RefCell<Vec<Url>>,
    index: Cell<usize>,
    requests: RefCell<Vec<EncodedRequest>>,
    posts: RefCell<Vec<(String, Vec<(String, String)>)>>,
    tasks: RefCell<Vec<LocalBoxFuture<'static, ()>>>,
    on_history: RefCell<Option<Rc<dyn Fn()>>>,
}

impl TestBrowser {
    pub fn new(config: &SlickConfig) -> Self {
        Self {
            document: VirtualDocument::parse(SHELL, config.layout.clone()),
            site: RefCell::new(Site::storefront()),
            entries: RefCell::new(vec![Url::parse(ORIGIN).unwrap().join("/").unwrap()]),
            index: Cell::new(0),
            requests: RefCell::new(Vec::new()),
            posts: RefCell::new(Vec::new()),
            tasks: RefCell::new(Vec::new()),
            on_history: RefCell::new(None),
        }
    }

    /// Path, query and fragment of the current entry.
    pub fn path(&self) -> String {
        slick::protocol::path_of(&self.location().unwrap())
    }

    pub fn history_len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn history_index(&self) -> usize {
        self.index.get()
    }

    pub fn requests(&self) -> Vec<EncodedRequest> {
        self.requests.borrow().clone()
    }

    pub fn posts(&self) -> Vec<(String, Vec<(String, String)>)> {
        self.posts.borrow().clone()
    }

    pub fn redirect_route(&self, from: &str, to: &str) {
        self.site
            .borrow_mut()
            .redirects
            .insert(from.to_owned(), to.to_owned());
    }

    pub fn raw_route(&self, path: &str, body: &str) {
        self.site
            .borrow_mut()
            .raw
            .insert(path.to_owned(), body.to_owned());
    }

    pub fn down_route(&self, path: &str) {
        self.site.borrow_mut().down.push(path.to_owned());
    }

    /// Move back one entry and fire the history handler, like the back button.
    pub fn go_back(&self) {
        let index = self.index.get();
        assert!(index > 0, "no entry to go back to");
        self.index.set(index - 1);

        let handler = self.on_history.borrow().clone();
        if let Some(handler) = handler {
            handler();
        }
    }

    /// Run spawned tasks, concurrently, until none are left.
    pub async fn run_pending(&self) {
        loop {
            let tasks = std::mem::take(&mut *self.tasks.borrow_mut());
            if tasks.is_empty() {
                break;
            }
            future::join_all(tasks).await;
        }
    }
}

impl Browser for TestBrowser {
    type Document = VirtualDocument;

    fn document(&self) -> &VirtualDocument {
        &self.document
    }

    fn location(&self) -> Result<Url> {
        Ok(self.entries.borrow()[self.index.get()].clone())
    }

    fn push_state(&self, url: &str) -> Result<()> {
        let url = self.location()?.join(url)?;
        let index = self.index.get() + 1;

        let mut entries = self.entries.borrow_mut();
        entries.truncate(index);
        entries.push(url);
        self.index.set(index);
        Ok(())
    }

    fn replace_state(&self, url: &str) -> Result<()> {
        let url = self.location()?.join(url)?;
        self.entries.borrow_mut()[self.index.get()] = url;
        Ok(())
    }

    fn fetch_navigation(&self, request: EncodedRequest) -> LocalBoxFuture<'static, Result<FetchedPage>> {
        self.requests.borrow_mut().push(request.clone());
        let answer = self
            .location()
            .and_then(|location| Ok(location.join(&request.url)?))
            .and_then(|url| self.site.borrow().answer(&request, &url));

        async move {
            tokio::task::yield_now().await;
            answer
        }
        .boxed_local()
    }

    fn submit_form(
        &self,
        action: &str,
        body: FormBody,
    ) -> LocalBoxFuture<'static, Result<Option<String>>> {
        self.posts.borrow_mut().push((action.to_owned(), body.fields));
        let target = self
            .site
            .borrow()
            .form_targets
            .get(action)
            .cloned()
            .flatten();

        async move {
            tokio::task::yield_now().await;
            Ok(target)
        }
        .boxed_local()
    }

    fn spawn(&self, task: LocalBoxFuture<'static, ()>) {
        self.tasks.borrow_mut().push(task);
    }

    fn delay(&self, millis: u32) -> LocalBoxFuture<'static, ()> {
        tokio::time::sleep(std::time::Duration::from_millis(u64::from(millis))).boxed_local()
    }

    fn now_millis(&self) -> u64 {
        CLOCK
    }

    fn on_history_change(&self, handler: Rc<dyn Fn()>) -> Result<()> {
        *self.on_history.borrow_mut() = Some(handler);
        Ok(())
    }
}

pub fn start(config: SlickConfig) -> Rc<Slick<TestBrowser>> {
    let browser = TestBrowser::new(&config);
    Slick::start(browser, config).unwrap()
}

pub fn start_default() -> Rc<Slick<TestBrowser>> {
    start(SlickConfig::new("main"))
}
