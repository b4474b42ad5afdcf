// src/extractors/matches.rs

// --- Imports ---
use once_cell::sync::Lazy;

use super::record::{self, MatchSections, Record, Schema};
use super::section::{self, Section};
use crate::dom::{DocumentTree, Marker};
use crate::utils::error::ExtractError;

// --- Markers (Lazy Static) ---
pub static MATCH: Lazy<Marker> = Lazy::new(|| Marker::parse("div.match").expect("Failed to compile MATCH"));
static TOURNAMENT_TITLE: Lazy<Marker> = Lazy::new(|| {
    Marker::parse("div.header h3.title").expect("Failed to compile TOURNAMENT_TITLE")
});
static DATE_LOCATION: Lazy<Marker> = Lazy::new(|| {
    Marker::parse("div.schedule div.date-location").expect("Failed to compile DATE_LOCATION")
});
static SPAN: Lazy<Marker> = Lazy::new(|| Marker::parse("span").expect("Failed to compile SPAN"));
static MATCH_HEADER: Lazy<Marker> =
    Lazy::new(|| Marker::parse("div.match-header").expect("Failed to compile MATCH_HEADER"));
static MATCH_CONTENT: Lazy<Marker> =
    Lazy::new(|| Marker::parse("div.match-content").expect("Failed to compile MATCH_CONTENT"));
static PLAYERS: Lazy<Marker> =
    Lazy::new(|| Marker::parse("div.players").expect("Failed to compile PLAYERS"));
static SCORES: Lazy<Marker> =
    Lazy::new(|| Marker::parse("div.scores").expect("Failed to compile SCORES"));

// --- Schema ---
pub static MATCH_SCHEMA: Schema = Schema {
    name: "match",
    columns: &[
        "tournament",
        "location",
        "date",
        "year",
        "tournament_code",
        "stage",
        "match_duration",
        "winners_p1",
        "winners_p2",
        "losers_p1",
        "losers_p2",
        "winners_set1",
        "winners_set1_tiebreak",
        "winners_set2",
        "winners_set2_tiebreak",
        "winners_set3",
        "winners_set3_tiebreak",
        "losers_set1",
        "losers_set1_tiebreak",
        "losers_set2",
        "losers_set2_tiebreak",
        "losers_set3",
        "losers_set3_tiebreak",
    ],
    required: &[
        "tournament",
        "year",
        "tournament_code",
        "date",
        "stage",
        "match_duration",
        "winners_p1",
        "winners_p2",
        "losers_p1",
        "losers_p2",
        "winners_set1",
        "losers_set1",
    ],
};

/// Caller-supplied identity of a results page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchContext {
    /// Display name used when the page carries no title.
    pub tournament: String,
    pub tournament_code: String,
    pub year: u32,
}

/// Document-level fields shared by every match on one page.
fn document_context(tree: &DocumentTree, context: &MatchContext) -> Result<Record, ExtractError> {
    let title = section::find_one(tree, &TOURNAMENT_TITLE)?
        .map(|s| s.clean_text())
        .filter(|t| !t.is_empty());

    let spans: Vec<String> = section::find_one(tree, &DATE_LOCATION)?
        .map(|s| s.find_all(&SPAN).map(|span| span.clean_text()).collect())
        .unwrap_or_default();

    let mut record = Record::new();
    record.set_text("tournament", title.unwrap_or_else(|| context.tournament.clone()));
    record.set("location", spans.first().cloned());
    record.set("date", spans.get(1).cloned());
    record.set_text("year", context.year.to_string());
    record.set_text("tournament_code", context.tournament_code.clone());
    Ok(record)
}

fn locate_sections(match_section: Section<'_>) -> MatchSections<'_> {
    let header = match_section.find_one(&MATCH_HEADER);
    match match_section.find_one(&MATCH_CONTENT) {
        Some(content) => MatchSections {
            header,
            players: content.find_all(&PLAYERS).collect(),
            scores: content.find_all(&SCORES).collect(),
        },
        None => MatchSections {
            header,
            ..MatchSections::default()
        },
    }
}

/// Turns one tournament results page into complete doubles match records.
pub fn extract_matches(tree: &DocumentTree, context: &MatchContext) -> Result<Vec<Record>, ExtractError> {
    let shared = document_context(tree, context)?;

    let mut total = 0usize;
    let mut rows = Vec::new();
    for match_section in section::find_all(tree, &MATCH)? {
        total += 1;
        let sections = locate_sections(match_section);
        if sections.players.len() < 2 || sections.scores.len() < 2 {
            tracing::debug!(
                "Match {} has {} player and {} score sections, skipping",
                total,
                sections.players.len(),
                sections.scores.len()
            );
            continue;
        }
        if let Some(row) = record::build(&sections, &MATCH_SCHEMA, &shared) {
            rows.push(row);
        }
    }

    tracing::info!(
        "Extracted {} of {} matches for {} {} ({})",
        rows.len(),
        total,
        context.tournament,
        context.year,
        context.tournament_code
    );
    Ok(rows)
}
