// src/extractors/mod.rs
pub mod fields;
pub mod matches;
pub mod profile;
pub mod rankings;
pub mod record;
pub mod section;

// Re-export key extraction types for convenience
pub use fields::{FieldMapper, LabeledItem};
pub use matches::{extract_matches, MatchContext, MATCH_SCHEMA};
pub use profile::extract_profile;
pub use rankings::{extract_rankings, RankingContext, RANKING_SCHEMA};
pub use record::{Record, RecordBuilder, Schema, ScoreSlot, Side};
pub use section::Section;
