//! Ownership ranges inside `<head>`.
//!
//! Head children are fenced by two fixed landmarks: the `<title>` element and the
//! head marker. Everything between the last static element before the title and the
//! title belongs to the mounted template; everything between the marker and the next
//! static element belongs to the mounted page. Loaded stylesheets live between the
//! title and the marker and are never part of either range.

use std::ops::Range;

use crate::config::HeadMarker;
use crate::{Region, Result, SlickError};

/// Attribute that pins a head element outside every managed range.
pub const STATIC_ATTRIBUTE: &str = "slick-static";

/// Role of one head child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Landmark {
    Title,
    Marker,
    /// Never removed and never crossed: `meta[charset]`, `base`, or `[slick-static]`
    /// in the server-rendered document.
    Static,
    Managed,
}

impl Landmark {
    /// Classify a head child by tag name and attribute lookup.
    pub fn classify<'a>(
        tag: &str,
        attr: impl Fn(&str) -> Option<&'a str> + Copy,
        marker: HeadMarker,
    ) -> Self {
        if tag.eq_ignore_ascii_case("title") {
            Landmark::Title
        } else if marker.matches(tag, attr) {
            Landmark::Marker
        } else if tag.eq_ignore_ascii_case("base")
            || (tag.eq_ignore_ascii_case("meta") && attr("charset").is_some())
            || attr(STATIC_ATTRIBUTE).is_some()
        {
            Landmark::Static
        } else {
            Landmark::Managed
        }
    }

    /// Role of a head child that arrived with region markup rather than with the
    /// server-rendered document. Such statics belong to the region that inserted them.
    pub fn inserted(self) -> Self {
        match self {
            Landmark::Static => Landmark::Managed,
            other => other,
        }
    }
}

/// Indices of the head children owned by `region`.
///
/// After removing the returned range, new markup for the region is inserted at
/// `range.start`.
pub fn owned_range(landmarks: &[Landmark], region: Region) -> Result<Range<usize>> {
    let title = position(landmarks, Landmark::Title).ok_or(SlickError::MissingMarker("title"))?;
    // Template head markup may carry its own icons; only a marker after the title counts.
    let marker = position(&landmarks[title + 1..], Landmark::Marker)
        .map(|offset| title + 1 + offset)
        .ok_or(SlickError::MissingMarker("head"))?;

    match region {
        Region::Template => {
            let start = landmarks[..title]
                .iter()
                .rposition(|landmark| *landmark == Landmark::Static)
                .map_or(0, |index| index + 1);

            Ok(start..title)
        }
        Region::Page => {
            let start = marker + 1;
            let end = landmarks[start..]
                .iter()
                .position(|landmark| *landmark == Landmark::Static)
                .map_or(landmarks.len(), |offset| start + offset);

            Ok(start..end)
        }
    }
}

fn position(landmarks: &[Landmark], wanted: Landmark) -> Option<usize> {
    landmarks.iter().position(|landmark| *landmark == wanted)
}
