// src/dom/mod.rs
pub mod marker;
pub mod tree;

pub use marker::{Descriptor, Marker};
pub use tree::{DocumentTree, Element, Node};
