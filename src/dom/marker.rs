// src/dom/marker.rs
use std::fmt;

use super::tree::Element;
use crate::utils::error::ExtractError;

/// One step of a marker: an optional tag plus classes that must all be present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
    tag: Option<String>,
    classes: Vec<String>,
}

/// A structural marker such as `div.match` or `div.header h3.title`.
///
/// Steps are separated by whitespace. Every step but the last narrows the
/// search to the first matching element; the last step selects the result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    source: String,
    steps: Vec<Descriptor>,
}

impl Descriptor {
    fn parse(raw: &str) -> Option<Self> {
        let mut parts = raw.split('.');
        let tag = parts.next()?.trim();
        let classes: Vec<String> = parts.map(str::to_string).collect();

        if classes.iter().any(String::is_empty) {
            return None;
        }
        if tag.is_empty() && classes.is_empty() {
            return None;
        }
        if !tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return None;
        }

        Some(Self {
            tag: (!tag.is_empty()).then(|| tag.to_ascii_lowercase()),
            classes,
        })
    }

    pub fn matches(&self, element: &Element) -> bool {
        if let Some(tag) = &self.tag {
            if element.tag() != tag {
                return false;
            }
        }
        self.classes.iter().all(|class| element.has_class(class))
    }
}

impl Marker {
    pub fn parse(raw: &str) -> Result<Self, ExtractError> {
        let steps = raw
            .split_whitespace()
            .map(Descriptor::parse)
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| ExtractError::InvalidMarker(raw.to_string()))?;

        if steps.is_empty() {
            return Err(ExtractError::InvalidMarker(raw.to_string()));
        }

        Ok(Self {
            source: raw.trim().to_string(),
            steps,
        })
    }

    pub fn steps(&self) -> &[Descriptor] {
        &self.steps
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
