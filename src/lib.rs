//! Doubles match results, rankings and player profiles from ATP Tour pages,
//! normalised into flat records ready for tabular export.
//!
//! The extraction core (`dom`, `extractors`) is synchronous and pure: one
//! document and one context in, records out. Acquisition (`atp`) and export
//! (`storage`) sit around it.

pub mod atp;
pub mod dom;
pub mod extractors;
pub mod storage;
pub mod utils;

pub use dom::{DocumentTree, Marker};
pub use extractors::{
    extract_matches, extract_profile, extract_rankings, MatchContext, RankingContext, Record,
};
pub use utils::AppError;
