//! Server-side helpers for answering slick clients with plain `http` types.

use http::{HeaderValue, Method, Request, Response, StatusCode, header};

use crate::{ClientHello, NavigationResponse};

/// Who is asking for a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Client {
    /// A regular browser load; render the full document.
    Document,
    /// A slick navigation; answer with a [`NavigationResponse`].
    Slick { known_template: Option<String> },
}

/// Classify an incoming request.
///
/// `body` is the already-collected request body, if any. The header transport is
/// recognised by the presence of `header_name` (an empty value means the client
/// forces a template reload); the body transport by a JSON [`ClientHello`].
pub fn classify<B>(request: &Request<B>, header_name: &str, body: Option<&str>) -> Client {
    if let Some(value) = request.headers().get(header_name) {
        let known = value.to_str().unwrap_or_default().trim();

        return Client::Slick {
            known_template: (!known.is_empty()).then(|| known.to_owned()),
        };
    }

    if *request.method() != Method::POST || !is_json(request) {
        return Client::Document;
    }

    match body.map(serde_json::from_str::<ClientHello>) {
        Some(Ok(hello)) if hello.is_slick() => Client::Slick {
            known_template: hello.template,
        },
        _ => Client::Document,
    }
}

fn is_json<B>(request: &Request<B>) -> bool {
    request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/json"))
}

/// Serialize `navigation` into a JSON response.
pub fn json_response(
    navigation: &NavigationResponse,
) -> Result<Response<String>, serde_json::Error> {
    let body = serde_json::to_string(navigation)?;

    let mut response = Response::new(body);
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );

    Ok(response)
}

/// Answer a form POST so that a client posting with `redirect: "manual"` can read the
/// target: a `200` carrying a `Location` header instead of a `3xx`.
pub fn form_redirect(location: &str) -> Result<Response<String>, http::Error> {
    Response::builder()
        .status(StatusCode::OK)
        .header(header::LOCATION, location)
        .body(String::new())
}
