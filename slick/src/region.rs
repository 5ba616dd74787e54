use std::fmt;

/// The two replaceable parts of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    /// Shared chrome, replaced only when the server reports a template change.
    Template,
    /// Inner content, replaced on every navigation.
    Page,
}

impl Region {
    /// Value written to the region attribute of loaded resources.
    pub fn as_str(self) -> &'static str {
        match self {
            Region::Template => "template",
            Region::Page => "page",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where interception listeners are attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Document,
    Page,
}

/// Kinds of dynamically loaded resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    /// `<link rel="stylesheet">`, inserted before the head marker.
    Style,
    /// `<script>`, appended to `<body>`.
    Script,
}
