// src/extractors/profile.rs

// --- Imports ---
use once_cell::sync::Lazy;

use super::fields::FieldMapper;
use super::record::Record;
use super::section;
use crate::dom::{DocumentTree, Marker};
use crate::utils::error::ExtractError;

// --- Constants ---
/// Overview sections are rendered year-to-date first, then career.
pub const TIME_RANGES: [&str; 2] = ["YTD", "Career"];
/// Unit rendered after the win/loss figure, e.g. "12-8 W-L".
pub const WIN_LOSS_SUFFIX: &str = " W-L";
/// Unit rendered after the title count, e.g. "3 Titles".
pub const TITLES_SUFFIX: &str = " Titles";
/// Call-to-action entry mixed into the detail lists.
pub const FOLLOW_LABEL: &str = "Follow player";

// --- Markers (Lazy Static) ---
pub static PROFILE_READY: Lazy<Marker> =
    Lazy::new(|| Marker::parse("ul.pd_left").expect("Failed to compile PROFILE_READY"));
static WINS: Lazy<Marker> = Lazy::new(|| Marker::parse("div.wins").expect("Failed to compile WINS"));
static TITLES: Lazy<Marker> =
    Lazy::new(|| Marker::parse("div.titles").expect("Failed to compile TITLES"));
static DETAIL_LISTS: Lazy<[Marker; 2]> = Lazy::new(|| {
    [
        Marker::parse("ul.pd_left").expect("Failed to compile left details"),
        Marker::parse("ul.pd_right").expect("Failed to compile right details"),
    ]
});
static LIST_ITEM: Lazy<Marker> = Lazy::new(|| Marker::parse("li").expect("Failed to compile LIST_ITEM"));
static SLOT: Lazy<Marker> = Lazy::new(|| Marker::parse("span").expect("Failed to compile SLOT"));

static PROFILE_FIELDS: Lazy<FieldMapper> = Lazy::new(|| FieldMapper::new([FOLLOW_LABEL]));

/// Drops the rendered unit suffix by its character length.
///
/// The page always renders the unit, so the tail is removed by length; a
/// tail that is not the expected unit is logged because real data is being cut.
pub fn trim_unit_suffix(text: &str, suffix: &str) -> String {
    // Line breaks between figure and unit count as a single space.
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let text = text.as_str();
    let keep = text.chars().count().saturating_sub(suffix.chars().count());
    let split = text.char_indices().nth(keep).map(|(i, _)| i).unwrap_or(text.len());
    let (value, tail) = text.split_at(split);
    if !tail.eq_ignore_ascii_case(suffix) {
        tracing::warn!(
            "Expected unit '{}' at end of '{}', found '{}'",
            suffix.trim(),
            text,
            tail
        );
    }
    value.trim_end().to_string()
}

/// Turns one player profile page into a flat attribute record.
///
/// No completeness check applies; whatever subset of fields the page has is kept.
pub fn extract_profile(tree: &DocumentTree) -> Result<Record, ExtractError> {
    let mut record = Record::new();

    let overview = [("W-L", &*WINS, WIN_LOSS_SUFFIX), ("Titles", &*TITLES, TITLES_SUFFIX)];
    for (label, marker, suffix) in overview {
        let sections = section::find_all(tree, marker)?;
        for (range, found) in TIME_RANGES.iter().zip(sections) {
            record.set_text(format!("{} {}", label, range), trim_unit_suffix(&found.text(), suffix));
        }
    }

    for list in DETAIL_LISTS.iter() {
        if let Some(list) = section::find_one(tree, list)? {
            record.merge(PROFILE_FIELDS.map_items(list.find_all(&LIST_ITEM), &SLOT));
        }
    }

    tracing::debug!("Extracted {} profile fields", record.len());
    Ok(record)
}
