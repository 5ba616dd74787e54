#![allow(missing_docs)]

use http::{Method, Request, header};
use slick_protocol::server::{Client, classify, form_redirect, json_response};
use slick_protocol::{
    KNOWN_TEMPLATE_HEADER, NavigationRequest, NavigationResponse, RegionPayload, TemplatePayload,
    TransportMode,
};

// Build an `http::Request` the way a server would receive an encoded client request.
fn receive(mode: TransportMode, known: Option<&str>) -> (Request<()>, Option<String>) {
    let encoded = NavigationRequest::new("/about", known).encode(mode, KNOWN_TEMPLATE_HEADER);

    let mut builder = Request::builder()
        .method(encoded.method)
        .uri(encoded.url.as_str());
    for (name, value) in &encoded.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }

    (builder.body(()).unwrap(), encoded.body)
}

#[test]
fn test_classify_both_transports() {
    for mode in [TransportMode::Header, TransportMode::Body] {
        let (request, body) = receive(mode, Some("main"));
        assert_eq!(
            classify(&request, KNOWN_TEMPLATE_HEADER, body.as_deref()),
            Client::Slick {
                known_template: Some("main".to_owned())
            },
            "{mode:?}"
        );

        let (request, body) = receive(mode, None);
        assert_eq!(
            classify(&request, KNOWN_TEMPLATE_HEADER, body.as_deref()),
            Client::Slick {
                known_template: None
            },
            "{mode:?} reload"
        );
    }
}

#[test]
fn test_classify_plain_browser_requests() {
    let get = Request::builder().uri("/about").body(()).unwrap();
    assert_eq!(classify(&get, KNOWN_TEMPLATE_HEADER, None), Client::Document);

    let form_post = Request::builder()
        .method(Method::POST)
        .uri("/contact")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(())
        .unwrap();
    assert_eq!(
        classify(&form_post, KNOWN_TEMPLATE_HEADER, Some("name=x")),
        Client::Document
    );

    let foreign_json = Request::builder()
        .method(Method::POST)
        .uri("/api")
        .header(header::CONTENT_TYPE, "application/json")
        .body(())
        .unwrap();
    assert_eq!(
        classify(
            &foreign_json,
            KNOWN_TEMPLATE_HEADER,
            Some(r#"{"agent":"curl","template":null}"#)
        ),
        Client::Document
    );
}

#[test]
fn test_round_trip_through_json_response() {
    let template = TemplatePayload {
        name: "main".to_owned(),
        region: RegionPayload {
            head: "<meta name=\"x\">".to_owned(),
            body: "<nav></nav><div id=\"app\"></div>".to_owned(),
            styles: vec!["/main.css".to_owned()],
            scripts: vec!["/main.js".to_owned()],
        },
    };
    let page = RegionPayload {
        body: "<h1>About</h1>".to_owned(),
        ..RegionPayload::default()
    };

    let navigation =
        NavigationResponse::new("About", "/favicon.ico", page).with_template_unless_known(None, template);

    let response = json_response(&navigation).unwrap();
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/json"
    );
    assert_eq!(NavigationResponse::from_json(response.body()).unwrap(), navigation);
}

#[test]
fn test_form_redirect_is_readable_without_following() {
    let response = form_redirect("/thanks").unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/thanks");
}
