#![allow(missing_docs)]
//! Wire contract between the slick client and a server that renders pages as
//! structured fragments instead of full documents.
//!
//! The client asks for a URL and tells the server which template (shared chrome)
//! it currently has mounted. The server answers with a [`NavigationResponse`] whose
//! `template` is `null` when the mounted one still matches.

mod href;
mod request;
mod response;

#[cfg(not(target_arch = "wasm32"))]
pub mod server;

pub use href::{cache_bust, path_of, same_origin};
pub use request::{
    AGENT, ClientHello, EncodedRequest, KNOWN_TEMPLATE_HEADER, NavigationRequest, TransportMode,
};
pub use response::{NavigationResponse, RegionPayload, TemplatePayload};
