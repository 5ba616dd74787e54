use serde::{Deserialize, Serialize};

/// Header carrying the client's mounted template when [`TransportMode::Header`] is used.
pub const KNOWN_TEMPLATE_HEADER: &str = "X-Known-Template";

/// Agent string sent in the JSON body when [`TransportMode::Body`] is used.
pub const AGENT: &str = "slick-client";

/// How the client tells the server which template it has mounted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TransportMode {
    /// `GET <url>` with the template name in a request header. An empty value means reload.
    Header,
    /// `POST <url>` with a JSON body `{"agent": "slick-client", "template": ...}`.
    #[default]
    Body,
}

/// JSON body of a [`TransportMode::Body`] navigation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientHello {
    pub agent: String,
    pub template: Option<String>,
}

impl ClientHello {
    pub fn new(template: Option<&str>) -> Self {
        Self {
            agent: AGENT.to_owned(),
            template: template.map(str::to_owned),
        }
    }

    /// `true` when the body was produced by a slick client.
    pub fn is_slick(&self) -> bool {
        self.agent == AGENT
    }
}

/// One navigation request, before it is put on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationRequest {
    pub url: String,
    /// Template the client has mounted, `None` to force a fresh template payload.
    pub known_template: Option<String>,
}

/// A navigation request in its transport shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedRequest {
    pub url: String,
    pub method: &'static str,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl NavigationRequest {
    pub fn new(url: impl Into<String>, known_template: Option<&str>) -> Self {
        Self {
            url: url.into(),
            known_template: known_template.map(str::to_owned),
        }
    }

    /// Encode the request for `mode`, using `header_name` for the header transport.
    pub fn encode(&self, mode: TransportMode, header_name: &str) -> EncodedRequest {
        match mode {
            TransportMode::Header => EncodedRequest {
                url: self.url.clone(),
                method: "GET",
                headers: vec![(
                    header_name.to_owned(),
                    self.known_template.clone().unwrap_or_default(),
                )],
                body: None,
            },
            TransportMode::Body => {
                let hello = ClientHello::new(self.known_template.as_deref());
                // A struct of two strings always serializes.
                let body = serde_json::to_string(&hello).unwrap_or_default();

                EncodedRequest {
                    url: self.url.clone(),
                    method: "POST",
                    headers: vec![("Content-Type".to_owned(), "application/json".to_owned())],
                    body: Some(body),
                }
            }
        }
    }
}
