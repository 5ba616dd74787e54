use serde::Deserialize;
use slick_protocol::{KNOWN_TEMPLATE_HEADER, TransportMode};

/// Element in `<head>` that fences the page range and receives loaded stylesheets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HeadMarker {
    /// `<link rel="shortcut icon">` (any `rel` containing `icon`).
    #[default]
    Favicon,
    /// `<script type="importmap">`.
    ImportMap,
}

impl HeadMarker {
    pub fn selector(self) -> &'static str {
        match self {
            HeadMarker::Favicon => "link[rel~='icon']",
            HeadMarker::ImportMap => "script[type='importmap']",
        }
    }

    /// Match an element by tag name and attribute lookup.
    pub fn matches<'a>(self, tag: &str, attr: impl Fn(&str) -> Option<&'a str>) -> bool {
        match self {
            HeadMarker::Favicon => {
                tag.eq_ignore_ascii_case("link")
                    && attr("rel").is_some_and(|rel| {
                        rel.split_ascii_whitespace()
                            .any(|token| token.eq_ignore_ascii_case("icon"))
                    })
            }
            HeadMarker::ImportMap => {
                tag.eq_ignore_ascii_case("script")
                    && attr("type").is_some_and(|kind| kind.eq_ignore_ascii_case("importmap"))
            }
        }
    }
}

/// Fixed elements the patcher relies on.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DocumentLayout {
    /// Id of the element whose content is the template body.
    pub root_id: String,
    /// Id of the element, inside the template body, whose content is the page body.
    pub page_id: String,
    pub marker: HeadMarker,
    /// Attribute that tags loaded resources with their region.
    pub region_attribute: String,
}

impl Default for DocumentLayout {
    fn default() -> Self {
        Self {
            root_id: "root".to_owned(),
            page_id: "app".to_owned(),
            marker: HeadMarker::default(),
            region_attribute: "slick-type".to_owned(),
        }
    }
}

/// Session configuration. Every field has a default so a partial JSON object works.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SlickConfig {
    /// Template mounted by the server-rendered document.
    pub template: String,
    pub transport: TransportMode,
    pub template_header: String,
    pub layout: DocumentLayout,
    pub cache_bust_param: String,
    /// `type` attribute of loaded scripts, `None` for classic scripts.
    pub script_type: Option<String>,
    /// Give up on a single resource after this long; `None` waits forever.
    pub resource_timeout_ms: Option<u32>,
    /// Whether back/forward navigations scroll to the top like link clicks do.
    pub history_scroll_to_top: bool,
}

impl Default for SlickConfig {
    fn default() -> Self {
        Self {
            template: String::new(),
            transport: TransportMode::default(),
            template_header: KNOWN_TEMPLATE_HEADER.to_owned(),
            layout: DocumentLayout::default(),
            cache_bust_param: "cacheBust".to_owned(),
            script_type: Some("module".to_owned()),
            resource_timeout_ms: Some(10_000),
            history_scroll_to_top: true,
        }
    }
}

impl SlickConfig {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            ..Self::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config() {
        let config = SlickConfig::from_json(
            r#"{ "template": "main", "transport": "header", "layout": { "marker": "importMap" } }"#,
        )
        .unwrap();

        assert_eq!(config.template, "main");
        assert_eq!(config.transport, TransportMode::Header);
        assert_eq!(config.layout.marker, HeadMarker::ImportMap);
        assert_eq!(config.layout.page_id, "app");
        assert_eq!(config.template_header, "X-Known-Template");
        assert_eq!(config.resource_timeout_ms, Some(10_000));
    }

    #[test]
    fn test_marker_matching() {
        let favicon = |name: &str| match name {
            "rel" => Some("Shortcut Icon"),
            _ => None,
        };
        assert!(HeadMarker::Favicon.matches("link", favicon));
        assert!(!HeadMarker::Favicon.matches("link", |_| Some("stylesheet")));
        assert!(HeadMarker::ImportMap.matches("SCRIPT", |_| Some("importmap")));
        assert!(!HeadMarker::ImportMap.matches("script", |_| Some("module")));
    }
}
