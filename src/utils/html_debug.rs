// src/utils/html_debug.rs
use std::fs;
use std::path::Path;

use crate::dom::{DocumentTree, Element, Node};
use crate::utils::error::AppError;

const TEXT_PREVIEW_CHARS: usize = 60;

/// Renders the element structure as an indented `tag.class` outline, with a
/// short preview of direct text. Handy for checking why a marker did not match.
pub fn outline(tree: &DocumentTree) -> String {
    let mut out = String::new();
    match tree.root() {
        Node::Element(root) => write_element(root, 0, &mut out),
        Node::Text(text) => out.push_str(&format!("#text {:?}\n", preview(text))),
    }
    out
}

fn write_element(element: &Element, depth: usize, out: &mut String) {
    out.push_str(&"  ".repeat(depth));
    out.push_str(element.tag());
    for class in element.classes() {
        out.push('.');
        out.push_str(class);
    }

    let direct_text: String = element
        .children()
        .iter()
        .filter_map(|child| match child {
            Node::Text(text) => Some(text.as_str()),
            Node::Element(_) => None,
        })
        .collect();
    let direct_text = preview(&direct_text);
    if !direct_text.is_empty() {
        out.push_str(&format!(" {:?}", direct_text));
    }
    out.push('\n');

    for child in element.child_elements() {
        write_element(child, depth + 1, out);
    }
}

fn preview(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() > TEXT_PREVIEW_CHARS {
        let cut: String = collapsed.chars().take(TEXT_PREVIEW_CHARS).collect();
        format!("{}...", cut)
    } else {
        collapsed
    }
}

/// Saves the outline of a document that produced no records.
pub fn save_debug_outline(tree: &DocumentTree, path: &Path) -> Result<(), AppError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, outline(tree))?;
    tracing::info!("Saved debug outline to {}", path.display());
    Ok(())
}
