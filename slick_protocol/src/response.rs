use serde::{Deserialize, Serialize};

/// Markup and assets for one region of the document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionPayload {
    /// Raw markup injected into the region's range of `<head>`.
    pub head: String,
    /// Raw markup that replaces the region's container.
    pub body: String,
    #[serde(default)]
    pub styles: Vec<String>,
    #[serde(default)]
    pub scripts: Vec<String>,
}

/// Region payload for the shared chrome, carrying the new template identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplatePayload {
    pub name: String,
    #[serde(flatten)]
    pub region: RegionPayload,
}

/// Server answer to a navigation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationResponse {
    pub title: String,
    pub favicon: String,
    /// `None` when the client's mounted template still matches.
    pub template: Option<TemplatePayload>,
    pub page: RegionPayload,
}

impl NavigationResponse {
    pub fn new(title: impl Into<String>, favicon: impl Into<String>, page: RegionPayload) -> Self {
        Self {
            title: title.into(),
            favicon: favicon.into(),
            template: None,
            page,
        }
    }

    /// Attach `template` unless the client already has a template of that name mounted.
    ///
    /// This is the server half of the cache-avoidance contract: a client that sent
    /// `known` equal to the template's name receives `"template": null`.
    pub fn with_template_unless_known(
        mut self,
        known: Option<&str>,
        template: TemplatePayload,
    ) -> Self {
        self.template = match known {
            Some(known) if known == template.name => None,
            _ => Some(template),
        };
        self
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
