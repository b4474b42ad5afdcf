// src/extractors/fields.rs
use std::collections::HashSet;

use super::record::Record;
use super::section::Section;
use crate::dom::Marker;

/// A `(label, value)` pair read from one item of a repeating list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledItem {
    pub label: String,
    pub value: String,
}

impl LabeledItem {
    /// Label from slot 0 and value from slot 1; `None` with fewer than two slots.
    pub fn from_section(item: Section<'_>, slot: &Marker) -> Option<Self> {
        let mut slots = item.find_all(slot);
        let label = slots.next()?.clean_text();
        let value = slots.next()?.clean_text();
        Some(Self { label, value })
    }
}

/// Maps labeled list items into a flat record, skipping noise labels.
#[derive(Debug, Clone, Default)]
pub struct FieldMapper {
    ignored_labels: HashSet<String>,
}

impl FieldMapper {
    pub fn new<I, S>(ignored_labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ignored_labels: ignored_labels.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_ignored(&self, label: &str) -> bool {
        self.ignored_labels.contains(label)
    }

    /// Later items overwrite earlier ones with the same label.
    pub fn map_items<'a, I>(&self, items: I, slot: &Marker) -> Record
    where
        I: IntoIterator<Item = Section<'a>>,
    {
        let mut record = Record::new();
        for item in items {
            let Some(LabeledItem { label, value }) = LabeledItem::from_section(item, slot) else {
                continue;
            };
            if self.is_ignored(&label) {
                tracing::trace!("Skipping ignored label '{}'", label);
                continue;
            }
            record.set_text(label, value);
        }
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::DocumentTree;
    use crate::extractors::section;

    const LIST: &str = r#"<ul class="pd_left">
        <li><span>Follow player</span><span>
            Follow</span></li>
        <li><span> Turned Pro </span><span>2010
        </span></li>
        <li><span>Only label</span></li>
        <li><span>Plays</span><span>Right-Handed</span></li>
        <li><span>Turned Pro</span><span>2011</span></li>
    </ul>"#;

    fn mapped(mapper: &FieldMapper) -> Record {
        let tree = DocumentTree::parse(LIST);
        let li = Marker::parse("li").unwrap();
        let span = Marker::parse("span").unwrap();
        let items = section::find_all(&tree, &li).unwrap();
        mapper.map_items(items, &span)
    }

    #[test]
    fn ignored_label_never_appears_and_last_wins() {
        let record = mapped(&FieldMapper::new(["Follow player"]));
        assert!(!record.contains("Follow player"));
        assert_eq!(record.get("Turned Pro"), Some("2011"));
        assert_eq!(record.get("Plays"), Some("Right-Handed"));
        assert!(!record.contains("Only label"));
        assert_eq!(record.len(), 2);
    }

    #[test]
    fn without_ignore_set_noise_label_is_kept() {
        let record = mapped(&FieldMapper::default());
        assert_eq!(record.get("Follow player"), Some("Follow"));
    }

    #[test]
    fn mapping_is_deterministic() {
        let mapper = FieldMapper::new(["Follow player"]);
        assert_eq!(mapped(&mapper), mapped(&mapper));
    }

    #[test]
    fn ignored_label_is_skipped_in_any_position() {
        let tree = DocumentTree::parse(
            r#"<ul>
                <li><span>Age</span><span>30</span></li>
                <li><span>Follow player</span><span>Follow</span></li>
                <li><span>Height</span><span>185cm</span></li>
                <li><span>Follow player</span><span>Follow</span></li>
            </ul>"#,
        );
        let li = Marker::parse("li").unwrap();
        let span = Marker::parse("span").unwrap();
        let record = FieldMapper::new(["Follow player"]).map_items(section::find_all(&tree, &li).unwrap(), &span);
        assert_eq!(record.keys().collect::<Vec<_>>(), vec!["Age", "Height"]);
        assert!(!record.contains("Follow player"));
    }

    #[test]
    fn item_with_one_slot_is_skipped() {
        let tree = DocumentTree::parse("<ul><li><span>lonely</span></li></ul>");
        let li = Marker::parse("li").unwrap();
        let span = Marker::parse("span").unwrap();
        let item = section::find_one(&tree, &li).unwrap().unwrap();
        assert_eq!(LabeledItem::from_section(item, &span), None);
    }
}
