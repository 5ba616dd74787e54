#![cfg(not(target_arch = "wasm32"))]
#![allow(missing_docs)]

mod common;

use common::start_default;
use slick::virtual_dom::ScrollTarget;
use slick::{Browser, FormBody, Intercept, Outcome};

#[tokio::test]
async fn test_link_click_to_fragment() {
    let slick = start_default();
    let browser = slick.browser();
    let document = browser.document();
    let chrome = document.node_by_id("chrome");

    assert_eq!(document.click("/about#contact"), Some(true));
    browser.run_pending().await;

    assert_eq!(browser.path(), "/about#contact");
    assert_eq!(browser.history_len(), 2);
    assert_eq!(document.node_by_id("chrome"), chrome);
    assert_eq!(
        document.inner_html("contact").as_deref(),
        Some("Write to us")
    );
    assert_eq!(
        document.last_scroll(),
        Some(ScrollTarget::Fragment("contact".to_owned()))
    );
}

#[tokio::test]
async fn test_external_links_are_native() {
    let slick = start_default();
    let browser = slick.browser();

    assert_eq!(browser.document().click("https://elsewhere.org/"), Some(false));
    browser.run_pending().await;

    assert!(browser.requests().is_empty());
    assert_eq!(browser.path(), "/");
}

#[tokio::test]
async fn test_new_links_are_bound_once() {
    let slick = start_default();
    let browser = slick.browser();
    let document = browser.document();

    // Three chrome links, two page links, two forms and the footer link.
    assert_eq!(document.listener_count(), 8);

    slick.redirect("/blog").await.unwrap();
    assert_eq!(document.listener_count(), 5);
    assert_eq!(document.click("/blog/first"), Some(true));

    slick.redirect("/blog").await.unwrap();
    assert_eq!(document.listener_count(), 5);

    slick.redirect("/docs").await.unwrap();
    // The docs chrome has two links; the footer sits outside the template.
    assert_eq!(document.listener_count(), 3);
    assert_eq!(document.click("/legal"), Some(true));
}

#[tokio::test]
async fn test_post_form_follows_location_once() {
    let slick = start_default();
    let browser = slick.browser();
    let document = browser.document();

    // A double submit: the second one finds the first still in flight.
    assert_eq!(document.submit("contact-form"), Some(true));
    assert_eq!(document.submit("contact-form"), Some(true));
    browser.run_pending().await;

    assert_eq!(
        browser.posts(),
        [(
            "/contact".to_owned(),
            vec![
                ("name".to_owned(), "Ada".to_owned()),
                ("email".to_owned(), "ada@example.com".to_owned()),
            ]
        )]
    );
    assert_eq!(browser.path(), "/thanks");
    assert_eq!(browser.history_len(), 2);
    assert_eq!(document.title().as_deref(), Some("Thanks"));
}

#[tokio::test]
async fn test_post_form_with_file_input_is_intercepted() {
    let slick = start_default();
    let browser = slick.browser();
    let document = browser.document();

    slick.redirect("/profile").await.unwrap();
    assert_eq!(document.submit("avatar-form"), Some(true));
    browser.run_pending().await;

    assert_eq!(
        browser.posts(),
        [(
            "/profile".to_owned(),
            vec![
                ("avatar".to_owned(), String::new()),
                ("nick".to_owned(), "ada".to_owned()),
            ]
        )]
    );
    assert_eq!(browser.path(), "/thanks");
    assert_eq!(document.title().as_deref(), Some("Thanks"));
}

#[tokio::test]
async fn test_post_without_location_stays() {
    let slick = start_default();
    let browser = slick.browser();

    let outcome = slick
        .follow(Intercept::Post {
            action: "/newsletter".to_owned(),
            body: FormBody::from_fields(vec![("email".to_owned(), "ada@example.com".to_owned())]),
        })
        .await
        .unwrap();

    assert_eq!(outcome, Outcome::Stayed);
    assert_eq!(browser.posts().len(), 1);
    assert!(browser.requests().is_empty());
    assert_eq!(browser.path(), "/");
}

#[tokio::test]
async fn test_get_form_navigates_with_query() {
    let slick = start_default();
    let browser = slick.browser();

    assert_eq!(browser.document().submit("search"), Some(true));
    browser.run_pending().await;

    assert_eq!(browser.path(), "/search?q=rust+lang");
    assert_eq!(browser.requests()[0].url, "/search?q=rust+lang");
    assert_eq!(
        browser.document().inner_html("results").as_deref(),
        Some("Results")
    );
}

#[tokio::test]
async fn test_failed_interception_keeps_page() {
    let slick = start_default();
    let browser = slick.browser();
    let body = browser.document().body_html();

    // The site has no /legal page.
    assert_eq!(browser.document().click("/legal"), Some(true));
    browser.run_pending().await;

    assert_eq!(browser.document().body_html(), body);
    assert_eq!(browser.path(), "/");
    assert_eq!(browser.history_len(), 1);
    assert!(!slick.state().in_flight);
}
