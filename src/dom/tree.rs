// src/dom/tree.rs

// --- Imports ---
use scraper::{ElementRef, Html, Node as HtmlNode};

// --- Data Structures ---

/// A node of the owned, read-only document tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

/// An element node: tag, class list, attributes and children in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    tag: String,
    classes: Vec<String>,
    attrs: Vec<(String, String)>,
    children: Vec<Node>,
}

/// A fully rendered page, detached from the parser that produced it.
///
/// The tree owns all of its strings so it can be handed across worker
/// boundaries; nothing in the crate mutates it after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentTree {
    root: Node,
}

impl Node {
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(el) => Some(el),
            Node::Text(_) => None,
        }
    }

    /// Short description used in structural error messages.
    pub fn describe(&self) -> String {
        match self {
            Node::Element(el) => format!("<{}>", el.tag),
            Node::Text(text) => format!("text node {:?}", text.trim()),
        }
    }
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into().to_ascii_lowercase(),
            classes: Vec::new(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Builder helper: adds space separated classes.
    pub fn with_class(mut self, classes: &str) -> Self {
        self.classes.extend(classes.split_whitespace().map(str::to_string));
        self
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        if name == "class" {
            let value: String = value.into();
            return self.with_class(&value);
        }
        self.attrs.push((name, value.into()));
        self
    }

    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.with_child(Node::Text(text.into()))
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn child_elements(&self) -> impl DoubleEndedIterator<Item = &Element> {
        self.children.iter().filter_map(Node::as_element)
    }

    /// All descendant elements in document (pre-order) order, excluding `self`.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants {
            stack: self.child_elements().rev().collect(),
        }
    }

    /// Concatenated text of every descendant text node.
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                Node::Text(text) => out.push_str(text),
                Node::Element(el) => el.collect_text(out),
            }
        }
    }
}

/// Lazy pre-order walk over descendant elements.
pub struct Descendants<'a> {
    stack: Vec<&'a Element>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.stack.pop()?;
        self.stack.extend(next.child_elements().rev());
        Some(next)
    }
}

impl DocumentTree {
    /// Parses raw markup into an owned tree rooted at the `<html>` element.
    pub fn parse(html: &str) -> Self {
        let document = Html::parse_document(html);
        let root = convert_element(document.root_element());
        tracing::trace!("Parsed document tree with root <{}>", root.tag());
        Self {
            root: Node::Element(root),
        }
    }

    /// Wraps an already built node, e.g. from another acquisition backend.
    pub fn from_node(root: Node) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Node {
        &self.root
    }
}

// Only element and text nodes survive; comments, doctype and processing
// instructions carry no data for the extractors.
fn convert_element(source: ElementRef<'_>) -> Element {
    let value = source.value();
    let mut element = Element::new(value.name());
    // Source order; the parser's own class set is unordered.
    element.classes = value
        .attr("class")
        .map(|classes| classes.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default();
    element.attrs = value
        .attrs()
        .filter(|(name, _)| *name != "class")
        .map(|(name, val)| (name.to_string(), val.to_string()))
        .collect();

    for child in source.children() {
        match child.value() {
            HtmlNode::Element(_) => {
                if let Some(child_ref) = ElementRef::wrap(child) {
                    element.children.push(Node::Element(convert_element(child_ref)));
                }
            }
            HtmlNode::Text(text_node) => {
                element.children.push(Node::Text(String::from(&*text_node.text)));
            }
            _ => {}
        }
    }
    element
}

// --- Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_keeps_tags_classes_attrs_and_text() {
        let tree = DocumentTree::parse(
            r#"<html><body><!-- skip --><div class="match  final" id="m1">Hello <b>world</b></div></body></html>"#,
        );
        let root = tree.root().as_element().unwrap();
        assert_eq!(root.tag(), "html");

        let div = root.descendants().find(|el| el.tag() == "div").unwrap();
        assert_eq!(div.classes().to_vec(), vec!["match".to_string(), "final".to_string()]);
        assert!(div.has_class("final"));
        assert_eq!(div.attr("id"), Some("m1"));
        assert_eq!(div.attr("class"), None);
        assert_eq!(div.text(), "Hello world");
    }

    #[test]
    fn classes_keep_source_order() {
        let tree = DocumentTree::parse(r#"<body><p class="zeta alpha  mid"></p></body>"#);
        let root = tree.root().as_element().unwrap();
        let p = root.descendants().find(|el| el.tag() == "p").unwrap();
        assert_eq!(p.classes().to_vec(), vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn descendants_are_in_document_order() {
        let tree = DocumentTree::parse(
            "<body><div id='a'><p id='b'></p></div><div id='c'><span id='d'></span></div></body>",
        );
        let root = tree.root().as_element().unwrap();
        let ids: Vec<_> = root.descendants().filter_map(|el| el.attr("id")).collect();
        assert_eq!(ids, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn builder_splits_class_attribute() {
        let el = Element::new("TD").with_attr("class", "rank bold").with_text("1");
        assert_eq!(el.tag(), "td");
        assert!(el.has_class("rank") && el.has_class("bold"));
        assert_eq!(el.text(), "1");
    }
}
