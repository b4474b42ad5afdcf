// src/extractors/record.rs

// --- Imports ---
use once_cell::sync::Lazy;
use regex::Regex;
use serde::ser::{Serialize, SerializeMap, Serializer};

use super::section::{normalize_text, Section};
use crate::dom::Marker;

// --- Constants ---
/// Doubles matches are best of three sets.
pub const MAX_SETS: usize = 3;

// --- Markers (Lazy Static) ---
static SPAN: Lazy<Marker> = Lazy::new(|| Marker::parse("span").expect("Failed to compile SPAN"));
static NAMES: Lazy<Marker> =
    Lazy::new(|| Marker::parse("div.names").expect("Failed to compile NAMES"));
static NAME: Lazy<Marker> = Lazy::new(|| Marker::parse("div.name").expect("Failed to compile NAME"));
static SCORE_ITEM: Lazy<Marker> =
    Lazy::new(|| Marker::parse("div.score-item").expect("Failed to compile SCORE_ITEM"));

// A slot rendered as one string, e.g. "7-6(3)" or "6 (5)".
static INLINE_TIEBREAK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<set>.+?)\s*\((?P<tb>\d+)\)$").expect("Failed to compile INLINE_TIEBREAK_RE")
});

// --- Data Structures ---

/// Field name to optional scalar value, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    fields: Vec<(String, Option<String>)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key`, replacing an existing value in place so column order is stable.
    pub fn set(&mut self, key: impl Into<String>, value: Option<String>) {
        let key = key.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((key, value)),
        }
    }

    pub fn set_text(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.set(key, Some(value.into()));
    }

    /// The value of `key` if it is set to something.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .and_then(|(_, v)| v.as_deref())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        let idx = self.fields.iter().position(|(k, _)| k == key)?;
        self.fields.remove(idx).1
    }

    /// Merges `other` into `self`; values from `other` win on collision.
    pub fn merge(&mut self, other: Record) {
        for (key, value) in other.fields {
            self.set(key, value);
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Column layout and completeness rule of one pipeline.
#[derive(Debug)]
pub struct Schema {
    pub name: &'static str,
    pub columns: &'static [&'static str],
    pub required: &'static [&'static str],
}

impl Schema {
    pub fn missing(&self, record: &Record) -> Vec<&'static str> {
        self.required
            .iter()
            .copied()
            .filter(|field| !record.contains(field))
            .collect()
    }
}

/// Which side of a match a players/scores section belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Winners,
    Losers,
}

impl Side {
    pub fn prefix(self) -> &'static str {
        match self {
            Side::Winners => "winners",
            Side::Losers => "losers",
        }
    }
}

/// One set for one side; `tiebreak` only when the set went to a tiebreak.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreSlot {
    pub set_score: String,
    pub tiebreak: Option<String>,
}

/// The sections of one match, as located by the match pipeline.
#[derive(Debug, Default)]
pub struct MatchSections<'a> {
    pub header: Option<Section<'a>>,
    pub players: Vec<Section<'a>>,
    pub scores: Vec<Section<'a>>,
}

/// Assembles one Record against a schema, starting from context fields.
pub struct RecordBuilder<'s> {
    schema: &'s Schema,
    record: Record,
}

impl<'s> RecordBuilder<'s> {
    pub fn new(schema: &'s Schema, context: &Record) -> Self {
        Self {
            schema,
            record: context.clone(),
        }
    }

    pub fn set(&mut self, field: &str, value: Option<String>) -> &mut Self {
        self.record.set(field, value);
        self
    }

    /// Stage and duration from the first two header spans.
    pub fn header(&mut self, header: Option<Section<'_>>) -> &mut Self {
        let Some(header) = header else { return self };
        let spans: Vec<_> = header.find_all(&SPAN).collect();
        if spans.len() > 1 {
            let stage = spans[0].clean_text();
            let stage = stage.strip_suffix('-').unwrap_or(&stage).trim_end();
            let duration = spans[1].clean_text();
            self.record.set("stage", non_empty(stage));
            self.record.set("match_duration", non_empty(&duration));
        }
        self
    }

    /// Player pair for one side: `p1`/`p2`.
    pub fn names(&mut self, side: Side, players: Option<Section<'_>>) -> &mut Self {
        let Some(players) = players else { return self };
        if let Some((first, second)) = player_pair(players) {
            self.record.set_text(format!("{}_p1", side.prefix()), first);
            self.record.set_text(format!("{}_p2", side.prefix()), second);
        }
        self
    }

    /// Set scores for one side, filled contiguously from set 1.
    pub fn scores(&mut self, side: Side, scores: Option<Section<'_>>) -> &mut Self {
        let Some(scores) = scores else { return self };
        for (idx, slot) in score_slots(scores).into_iter().enumerate() {
            let set = idx + 1;
            self.record
                .set(format!("{}_set{}", side.prefix(), set), Some(slot.set_score));
            self.record
                .set(format!("{}_set{}_tiebreak", side.prefix(), set), slot.tiebreak);
        }
        self
    }

    /// Orders fields by schema columns (extras keep their order after them)
    /// and returns `None` when a required field is missing.
    pub fn finish(self) -> Option<Record> {
        let missing = self.schema.missing(&self.record);
        if !missing.is_empty() {
            tracing::debug!(
                "Discarding incomplete {} record, missing {:?}",
                self.schema.name,
                missing
            );
            return None;
        }

        let mut source = self.record;
        let mut ordered = Record::new();
        for column in self.schema.columns {
            let value = source.remove(column);
            ordered.set(*column, value);
        }
        ordered.merge(source);
        Some(ordered)
    }
}

/// Builds a match Record; the first players/scores section is the winning side.
pub fn build(sections: &MatchSections<'_>, schema: &Schema, context: &Record) -> Option<Record> {
    let mut builder = RecordBuilder::new(schema, context);
    builder
        .header(sections.header)
        .names(Side::Winners, sections.players.first().copied())
        .names(Side::Losers, sections.players.get(1).copied())
        .scores(Side::Winners, sections.scores.first().copied())
        .scores(Side::Losers, sections.scores.get(1).copied());
    builder.finish()
}

fn non_empty(text: &str) -> Option<String> {
    Some(text.to_string()).filter(|t| !t.is_empty())
}

fn player_pair(players: Section<'_>) -> Option<(String, String)> {
    if let Some(names) = players.find_one(&NAMES) {
        let names: Vec<_> = names.find_all(&NAME).map(|n| n.clean_text()).collect();
        if names.len() > 1 && !names[0].is_empty() && !names[1].is_empty() {
            return Some((names[0].clone(), names[1].clone()));
        }
    }

    // Some renderings collapse the team into a single "A/B" string.
    let text = players.clean_text();
    let (first, second) = text.split_once('/')?;
    let (first, second) = (first.trim(), second.trim());
    if first.is_empty() || second.is_empty() {
        return None;
    }
    Some((first.to_string(), second.to_string()))
}

/// Reads the score items of one side. The first item is the running total and
/// is skipped; reading stops at the first slot without a set score so a later
/// set is never present without the earlier ones.
pub fn score_slots(scores: Section<'_>) -> Vec<ScoreSlot> {
    let mut slots = Vec::new();
    for (idx, item) in scores.find_all(&SCORE_ITEM).skip(1).enumerate() {
        if idx >= MAX_SETS {
            tracing::debug!("Ignoring score slot {} beyond set {}", idx + 1, MAX_SETS);
            break;
        }
        let Some(slot) = read_slot(item) else { break };
        slots.push(slot);
    }
    slots
}

fn read_slot(item: Section<'_>) -> Option<ScoreSlot> {
    let spans: Vec<_> = item.find_all(&SPAN).collect();
    let primary = match spans.first() {
        Some(span) => span.clean_text(),
        None => item.clean_text(),
    };
    if primary.is_empty() {
        return None;
    }

    if let Some(tiebreak) = spans.get(1).map(|s| s.clean_text()).filter(|t| !t.is_empty()) {
        return Some(ScoreSlot {
            set_score: primary,
            tiebreak: Some(tiebreak),
        });
    }

    match INLINE_TIEBREAK_RE.captures(&primary) {
        Some(caps) => Some(ScoreSlot {
            set_score: normalize_text(&caps["set"]),
            tiebreak: Some(caps["tb"].to_string()),
        }),
        None => Some(ScoreSlot {
            set_score: primary,
            tiebreak: None,
        }),
    }
}

// --- Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::DocumentTree;
    use crate::extractors::section;

    static TEST_SCHEMA: Schema = Schema {
        name: "test",
        columns: &["a", "b", "c"],
        required: &["a", "b"],
    };

    #[test]
    fn record_set_overwrites_in_place() {
        let mut record = Record::new();
        record.set_text("x", "1");
        record.set_text("y", "2");
        record.set_text("x", "3");
        assert_eq!(record.keys().collect::<Vec<_>>(), vec!["x", "y"]);
        assert_eq!(record.get("x"), Some("3"));
        record.set("y", None);
        assert!(!record.contains("y"));
        assert_eq!(record.len(), 2);
    }

    #[test]
    fn record_serializes_as_ordered_map() {
        let mut record = Record::new();
        record.set_text("rank", "1");
        record.set("profile_url", None);
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"rank":"1","profile_url":null}"#);
    }

    #[test]
    fn finish_orders_by_schema_and_enforces_required() {
        let mut context = Record::new();
        context.set_text("extra", "ctx");
        let mut builder = RecordBuilder::new(&TEST_SCHEMA, &context);
        builder.set("b", Some("2".into())).set("a", Some("1".into()));
        let record = builder.finish().unwrap();
        assert_eq!(record.keys().collect::<Vec<_>>(), vec!["a", "b", "c", "extra"]);
        assert_eq!(record.get("c"), None);

        let mut builder = RecordBuilder::new(&TEST_SCHEMA, &Record::new());
        builder.set("a", Some("1".into()));
        assert!(builder.finish().is_none());
    }

    fn scores_section(tree: &DocumentTree) -> Section<'_> {
        let marker = Marker::parse("div.scores").unwrap();
        section::find_one(tree, &marker).unwrap().unwrap()
    }

    #[test]
    fn score_slots_skip_total_and_read_tiebreak_span() {
        let tree = DocumentTree::parse(
            r#"<div class="scores">
                <div class="score-item"><span>2</span></div>
                <div class="score-item"><span>6</span></div>
                <div class="score-item"><span>7</span><span>5</span></div>
            </div>"#,
        );
        let slots = score_slots(scores_section(&tree));
        assert_eq!(
            slots,
            vec![
                ScoreSlot { set_score: "6".into(), tiebreak: None },
                ScoreSlot { set_score: "7".into(), tiebreak: Some("5".into()) },
            ]
        );
    }

    #[test]
    fn score_slots_stop_at_first_gap() {
        let tree = DocumentTree::parse(
            r#"<div class="scores">
                <div class="score-item"><span>1</span></div>
                <div class="score-item"><span>6-4</span></div>
                <div class="score-item"></div>
                <div class="score-item"><span>6-2</span></div>
            </div>"#,
        );
        let slots = score_slots(scores_section(&tree));
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].set_score, "6-4");
    }

    #[test]
    fn inline_tiebreak_is_split() {
        let tree = DocumentTree::parse(
            r#"<div class="scores">
                <div class="score-item"><span>2</span></div>
                <div class="score-item"><span>7-6(3)</span></div>
                <div class="score-item"><span>6-7 (10)</span></div>
                <div class="score-item"><span>6-3</span></div>
                <div class="score-item"><span>6-1</span></div>
            </div>"#,
        );
        let slots = score_slots(scores_section(&tree));
        assert_eq!(slots.len(), MAX_SETS);
        assert_eq!(slots[0], ScoreSlot { set_score: "7-6".into(), tiebreak: Some("3".into()) });
        assert_eq!(slots[1], ScoreSlot { set_score: "6-7".into(), tiebreak: Some("10".into()) });
        assert_eq!(slots[2].tiebreak, None);
    }

    #[test]
    fn player_pair_prefers_name_divs_then_slash() {
        let tree = DocumentTree::parse(
            r#"<div class="players" id="a"><div class="names"><div class="name"> X. One </div><div class="name">Y. Two</div></div></div>
               <div class="players" id="b">C / D</div>
               <div class="players" id="c"><div class="names"><div class="name">Solo</div></div></div>"#,
        );
        let marker = Marker::parse("div.players").unwrap();
        let players: Vec<_> = section::find_all(&tree, &marker).unwrap().collect();
        assert_eq!(player_pair(players[0]), Some(("X. One".into(), "Y. Two".into())));
        assert_eq!(player_pair(players[1]), Some(("C".into(), "D".into())));
        assert_eq!(player_pair(players[2]), None);
    }

    #[test]
    fn empty_header_and_names_are_absent() {
        let tree = DocumentTree::parse(
            r#"<div class="header"><span></span><span>  </span></div>
               <div class="players"><div class="names"><div class="name"></div><div class="name">B</div></div></div>"#,
        );
        let header = section::find_one(&tree, &Marker::parse("div.header").unwrap()).unwrap();
        let players = section::find_one(&tree, &Marker::parse("div.players").unwrap()).unwrap();
        assert_eq!(players.map(player_pair), Some(None));

        let lenient = Schema {
            name: "test",
            columns: &["stage", "match_duration", "winners_p1", "winners_p2"],
            required: &[],
        };
        let mut builder = RecordBuilder::new(&lenient, &Record::new());
        builder.header(header).names(Side::Winners, players);
        let record = builder.finish().unwrap();
        assert!(!record.contains("stage"));
        assert!(!record.contains("match_duration"));
        assert!(!record.contains("winners_p1"));

        let strict = Schema {
            required: &["stage"],
            ..lenient
        };
        let mut builder = RecordBuilder::new(&strict, &Record::new());
        builder.header(header);
        assert!(builder.finish().is_none());
    }
}
