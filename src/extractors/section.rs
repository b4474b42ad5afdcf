// src/extractors/section.rs

// --- Imports ---
use crate::dom::{Descriptor, DocumentTree, Element, Marker, Node};
use crate::dom::tree::Descendants;
use crate::utils::error::ExtractError;

// --- Data Structures ---

/// A located sub-tree of a document (one match, one table row, one list...).
#[derive(Debug, Clone, Copy)]
pub struct Section<'a> {
    element: &'a Element,
}

/// Lazily yields every element under a scope that matches the marker's last step.
/// Each call to `find_all` starts a fresh scan.
pub struct Sections<'a, 'm> {
    inner: Option<Descendants<'a>>,
    last: Option<&'m Descriptor>,
}

impl<'a, 'm> Iterator for Sections<'a, 'm> {
    type Item = Section<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let last = self.last?;
        self.inner
            .as_mut()?
            .find(|el| last.matches(el))
            .map(Section::new)
    }
}

impl<'a> Section<'a> {
    pub fn new(element: &'a Element) -> Self {
        Self { element }
    }

    /// Treats `node` as a searchable scope. A text leaf has no children to
    /// search, which is a structural error rather than an absence.
    pub fn from_node(node: &'a Node, marker: &Marker) -> Result<Self, ExtractError> {
        node.as_element()
            .map(Section::new)
            .ok_or_else(|| ExtractError::Structural {
                marker: marker.to_string(),
                found: node.describe(),
            })
    }

    pub fn element(&self) -> &'a Element {
        self.element
    }

    /// First match in document order, or `None` when the marker is absent.
    pub fn find_one(&self, marker: &Marker) -> Option<Section<'a>> {
        self.find_all(marker).next()
    }

    /// Every match in document order. Prefix steps narrow to their first match.
    pub fn find_all<'m>(&self, marker: &'m Marker) -> Sections<'a, 'm> {
        let Some((last, prefix)) = marker.steps().split_last() else {
            return Sections { inner: None, last: None };
        };

        let mut scope = Some(self.element);
        for step in prefix {
            scope = scope.and_then(|el| el.descendants().find(|d| step.matches(d)));
        }

        Sections {
            inner: scope.map(Element::descendants),
            last: Some(last),
        }
    }

    /// Raw concatenated text of the section.
    pub fn text(&self) -> String {
        self.element.text()
    }

    /// Text with embedded line breaks removed and outer whitespace trimmed.
    pub fn clean_text(&self) -> String {
        normalize_text(&self.element.text())
    }

    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.element.attr(name)
    }
}

/// Removes embedded newlines and trims; used for every label and value.
pub fn normalize_text(raw: &str) -> String {
    raw.replace(['\n', '\r'], "").trim().to_string()
}

/// Locates the first section under the document root matching `marker`.
pub fn find_one<'a>(
    tree: &'a DocumentTree,
    marker: &Marker,
) -> Result<Option<Section<'a>>, ExtractError> {
    Ok(Section::from_node(tree.root(), marker)?.find_one(marker))
}

/// Locates every section under the document root matching `marker`.
pub fn find_all<'a, 'm>(
    tree: &'a DocumentTree,
    marker: &'m Marker,
) -> Result<Sections<'a, 'm>, ExtractError> {
    Ok(Section::from_node(tree.root(), marker)?.find_all(marker))
}
