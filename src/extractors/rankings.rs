// src/extractors/rankings.rs

// --- Imports ---
use once_cell::sync::Lazy;

use super::record::{Record, RecordBuilder, Schema};
use super::section::{self, Section};
use crate::dom::{DocumentTree, Marker};
use crate::utils::error::ExtractError;

// --- Markers (Lazy Static) ---
pub static TABLE_BODY: Lazy<Marker> =
    Lazy::new(|| Marker::parse("tbody").expect("Failed to compile TABLE_BODY"));
static ROW: Lazy<Marker> = Lazy::new(|| Marker::parse("tr").expect("Failed to compile ROW"));
static RANK_CELL: Lazy<Marker> =
    Lazy::new(|| Marker::parse("td.rank").expect("Failed to compile RANK_CELL"));
static PLAYER_CELL: Lazy<Marker> =
    Lazy::new(|| Marker::parse("td.player").expect("Failed to compile PLAYER_CELL"));
static PROFILE_LINK: Lazy<Marker> =
    Lazy::new(|| Marker::parse("a").expect("Failed to compile PROFILE_LINK"));
// Queried document-wide, not per row; aligned with the rows by position.
static TOURNAMENTS_CELL: Lazy<Marker> =
    Lazy::new(|| Marker::parse("td.tourns").expect("Failed to compile TOURNAMENTS_CELL"));

// --- Schema ---
pub static RANKING_SCHEMA: Schema = Schema {
    name: "ranking",
    columns: &[
        "rank",
        "player",
        "tournaments_played",
        "profile_url",
        "tournament",
        "year",
        "date_week",
    ],
    required: &["rank", "player"],
};

/// Caller-supplied identity of a rankings page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankingContext {
    pub tournament: String,
    pub year: u32,
    pub date_week: String,
    /// Prefix for relative profile links, e.g. `https://www.atptour.com`.
    pub site_root: String,
}

impl RankingContext {
    fn to_record(&self) -> Record {
        let mut record = Record::new();
        record.set_text("tournament", self.tournament.clone());
        record.set_text("year", self.year.to_string());
        record.set_text("date_week", self.date_week.clone());
        record
    }

    fn profile_url(&self, player_cell: Section<'_>) -> String {
        let Some(href) = player_cell
            .find_one(&PROFILE_LINK)
            .and_then(|link| link.attr("href"))
            .map(str::trim)
            .filter(|href| !href.is_empty())
        else {
            return String::new();
        };

        if href.starts_with("http://") || href.starts_with("https://") {
            href.to_string()
        } else {
            format!("{}{}", self.site_root.trim_end_matches('/'), href)
        }
    }
}

/// Turns one rankings page into player summary records.
///
/// Rows and tournament-count cells are two parallel sequences zipped by
/// index: both are cut to `row_limit` and the shorter one bounds the result.
/// If the page renders a different number of count cells than rows, later
/// rows can pick up a neighbour's count.
pub fn extract_rankings(
    tree: &DocumentTree,
    context: &RankingContext,
    row_limit: usize,
) -> Result<Vec<Record>, ExtractError> {
    let Some(table) = section::find_one(tree, &TABLE_BODY)? else {
        tracing::warn!("No ranking table found for week {}", context.date_week);
        return Ok(Vec::new());
    };

    let counts: Vec<Section<'_>> = section::find_all(tree, &TOURNAMENTS_CELL)?.take(row_limit).collect();
    let row_count = table.find_all(&ROW).count();
    if row_count.min(row_limit) != counts.len() {
        tracing::warn!(
            "Ranking rows ({}) and tournament cells ({}) differ for week {}; alignment may be off",
            row_count.min(row_limit),
            counts.len(),
            context.date_week
        );
    }

    let shared = context.to_record();
    let mut rows = Vec::new();
    for (row, count) in table.find_all(&ROW).take(row_limit).zip(counts) {
        let (Some(rank), Some(player)) = (row.find_one(&RANK_CELL), row.find_one(&PLAYER_CELL)) else {
            tracing::debug!("Ranking row without rank or player cell, skipping");
            continue;
        };

        let mut builder = RecordBuilder::new(&RANKING_SCHEMA, &shared);
        builder
            .set("rank", Some(rank.clean_text()).filter(|t| !t.is_empty()))
            .set("player", Some(player.clean_text()).filter(|t| !t.is_empty()))
            .set("tournaments_played", Some(count.clean_text()))
            .set("profile_url", Some(context.profile_url(player)));
        if let Some(record) = builder.finish() {
            rows.push(record);
        }
    }

    tracing::info!(
        "Extracted {} ranking rows for {} {} (week {})",
        rows.len(),
        context.tournament,
        context.year,
        context.date_week
    );
    Ok(rows)
}

// --- Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> RankingContext {
        RankingContext {
            tournament: "Australian Open".into(),
            year: 2018,
            date_week: "2018-01-15".into(),
            site_root: "https://www.atptour.com".into(),
        }
    }

    fn row(rank: Option<&str>, player: &str, href: Option<&str>, tourns: &str) -> String {
        let rank = rank
            .map(|r| format!(r#"<td class="rank bold heavy tiny-cell">{}</td>"#, r))
            .unwrap_or_default();
        let link = match href {
            Some(h) => format!(r#"<a href="{}">{}</a>"#, h, player),
            None => player.to_string(),
        };
        format!(
            r#"<tr>{}<td class="player bold heavy large-cell">
                {}
            </td><td class="tourns center small-cell">{}</td></tr>"#,
            rank, link, tourns
        )
    }

    fn page(rows: &[String]) -> DocumentTree {
        DocumentTree::parse(&format!("<body><table><tbody>{}</tbody></table></body>", rows.concat()))
    }

    #[test]
    fn row_limit_keeps_first_rows_in_order() {
        let rows: Vec<String> = (1..=30)
            .map(|i| row(Some(&i.to_string()), &format!("Player {}", i), Some(&format!("/en/players/p{}/overview", i)), "20"))
            .collect();
        let records = extract_rankings(&page(&rows), &context(), 25).unwrap();
        assert_eq!(records.len(), 25);
        let ranks: Vec<_> = records.iter().map(|r| r.get("rank").unwrap().to_string()).collect();
        assert_eq!(ranks.first().map(String::as_str), Some("1"));
        assert_eq!(ranks.last().map(String::as_str), Some("25"));
        assert_eq!(
            records[0].get("profile_url"),
            Some("https://www.atptour.com/en/players/p1/overview")
        );
        assert_eq!(records[0].get("player"), Some("Player 1"));
        assert_eq!(records[0].get("date_week"), Some("2018-01-15"));
        assert_eq!(records[0].get("year"), Some("2018"));
    }

    #[test]
    fn missing_link_keeps_row_with_empty_reference() {
        let records = extract_rankings(&page(&[row(Some("1"), "No Link", None, "18")]), &context(), 25).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get("profile_url"), Some(""));
        assert!(records[0].iter().any(|(k, v)| k == "profile_url" && v == Some("")));
        assert_eq!(records[0].get("tournaments_played"), Some("18"));
    }

    #[test]
    fn empty_anchor_keeps_row_with_empty_reference() {
        let rows = [
            row(Some("1"), "Blank Href", Some(""), "18"),
            r#"<tr><td class="rank">2</td><td class="player"><a>No Href</a></td><td class="tourns">9</td></tr>"#
                .to_string(),
            row(Some("3"), "Spaces", Some("   "), "7"),
        ];
        let records = extract_rankings(&page(&rows), &context(), 25).unwrap();
        assert_eq!(records.len(), 3);
        let urls: Vec<_> = records.iter().map(|r| r.get("profile_url")).collect();
        assert_eq!(urls, vec![Some(""), Some(""), Some("")]);
        assert_eq!(records[1].get("player"), Some("No Href"));
        assert_eq!(records[1].get("tournaments_played"), Some("9"));
    }

    #[test]
    fn missing_rank_cell_drops_row() {
        let rows = [
            row(Some("1"), "First", Some("/a"), "10"),
            row(None, "Unranked", Some("/b"), "11"),
            row(Some("3"), "Third", Some("/c"), "12"),
        ];
        let records = extract_rankings(&page(&rows), &context(), 25).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].get("player"), Some("Third"));
        assert_eq!(records[1].get("tournaments_played"), Some("12"));
    }

    #[test]
    fn shorter_side_channel_truncates_rows() {
        let tree = DocumentTree::parse(
            r#"<body><table><tbody>
                <tr><td class="rank">1</td><td class="player">A</td></tr>
                <tr><td class="rank">2</td><td class="player">B</td></tr>
            </tbody></table>
            <table><tbody><tr><td class="tourns">7</td></tr></tbody></table></body>"#,
        );
        let records = extract_rankings(&tree, &context(), 25).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get("tournaments_played"), Some("7"));
    }

    #[test]
    fn absolute_links_are_kept() {
        let records = extract_rankings(
            &page(&[row(Some("1"), "Abs", Some("https://example.org/p"), "1")]),
            &context(),
            5,
        )
        .unwrap();
        assert_eq!(records[0].get("profile_url"), Some("https://example.org/p"));
    }

    #[test]
    fn page_without_table_is_empty() {
        let tree = DocumentTree::parse("<body><p>maintenance</p></body>");
        assert!(extract_rankings(&tree, &context(), 25).unwrap().is_empty());
    }
}
