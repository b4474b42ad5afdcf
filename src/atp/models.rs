// src/atp/models.rs
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};

use crate::extractors::{MatchContext, RankingContext};

pub const SITE_ROOT: &str = "https://www.atptour.com";

/// A tournament as addressed by the results archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tournament {
    pub slug: String,
    pub code: String,
}

impl Tournament {
    pub fn new(slug: &str, code: &str) -> Self {
        Self {
            slug: slug.to_string(),
            code: code.to_string(),
        }
    }

    /// Doubles results archive page for one edition.
    pub fn results_url(&self, site_root: &str, year: u32) -> String {
        format!(
            "{}/en/scores/archive/{}/{}/{}/results?matchType=doubles",
            site_root.trim_end_matches('/'),
            self.slug,
            self.code,
            year
        )
    }

    pub fn context(&self, year: u32) -> MatchContext {
        MatchContext {
            tournament: self.slug.clone(),
            tournament_code: self.code.clone(),
            year,
        }
    }
}

impl fmt::Display for Tournament {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.slug, self.code)
    }
}

/// Parses `slug:code`, e.g. `wimbledon:540`.
impl FromStr for Tournament {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (slug, code) = s
            .split_once(':')
            .ok_or_else(|| format!("expected <slug>:<code>, got '{}'", s))?;
        let (slug, code) = (slug.trim(), code.trim());
        if slug.is_empty() || code.is_empty() || !code.chars().all(|c| c.is_ascii_digit()) {
            return Err(format!("expected <slug>:<numeric code>, got '{}'", s));
        }
        Ok(Self::new(slug, code))
    }
}

/// A rankings snapshot taken in the week a tournament was played.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankingWeek {
    pub date_week: NaiveDate,
    pub tournament: String,
}

impl RankingWeek {
    pub fn new(date_week: NaiveDate, tournament: &str) -> Self {
        Self {
            date_week,
            tournament: tournament.to_string(),
        }
    }

    pub fn year(&self) -> u32 {
        u32::try_from(self.date_week.year()).unwrap_or_default()
    }

    pub fn date_label(&self) -> String {
        self.date_week.format("%Y-%m-%d").to_string()
    }

    /// Top-100 doubles rankings page for this week.
    pub fn rankings_url(&self, site_root: &str) -> String {
        format!(
            "{}/en/rankings/doubles?RankRange=1-100&Region=all&DateWeek={}",
            site_root.trim_end_matches('/'),
            self.date_label()
        )
    }

    pub fn context(&self, site_root: &str) -> RankingContext {
        RankingContext {
            tournament: self.tournament.clone(),
            year: self.year(),
            date_week: self.date_label(),
            site_root: site_root.trim_end_matches('/').to_string(),
        }
    }
}

/// The four Grand Slams and their archive codes.
pub fn grand_slams() -> Vec<Tournament> {
    [
        ("australian-open", "580"),
        ("roland-garros", "520"),
        ("wimbledon", "540"),
        ("us-open", "560"),
    ]
    .iter()
    .map(|(slug, code)| Tournament::new(slug, code))
    .collect()
}

/// Ranking weeks matching each Grand Slam from 2018 to 2023.
pub fn grand_slam_weeks() -> Vec<RankingWeek> {
    const WEEKS: [(i32, u32, u32, &str); 23] = [
        (2018, 1, 15, "Australian Open"),
        (2019, 1, 14, "Australian Open"),
        (2020, 1, 20, "Australian Open"),
        (2021, 2, 8, "Australian Open"),
        (2022, 1, 17, "Australian Open"),
        (2023, 1, 16, "Australian Open"),
        (2018, 5, 21, "Roland Garros"),
        (2019, 5, 20, "Roland Garros"),
        (2020, 9, 21, "Roland Garros"),
        (2021, 5, 24, "Roland Garros"),
        (2022, 5, 16, "Roland Garros"),
        (2023, 5, 22, "Roland Garros"),
        (2018, 9, 24, "US Open"),
        (2019, 8, 26, "US Open"),
        (2020, 8, 31, "US Open"),
        (2021, 8, 30, "US Open"),
        (2022, 8, 22, "US Open"),
        (2023, 8, 28, "US Open"),
        (2018, 7, 2, "Wimbledon"),
        (2019, 7, 1, "Wimbledon"),
        (2021, 6, 28, "Wimbledon"),
        (2022, 6, 27, "Wimbledon"),
        (2023, 7, 3, "Wimbledon"),
    ];

    WEEKS
        .iter()
        .filter_map(|&(y, m, d, tournament)| {
            NaiveDate::from_ymd_opt(y, m, d).map(|date| RankingWeek::new(date, tournament))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn results_url_matches_archive_layout() {
        let t = Tournament::new("wimbledon", "540");
        assert_eq!(
            t.results_url(SITE_ROOT, 2019),
            "https://www.atptour.com/en/scores/archive/wimbledon/540/2019/results?matchType=doubles"
        );
        assert_eq!(t.context(2019).tournament_code, "540");
    }

    #[test]
    fn tournament_parses_slug_and_code() {
        assert_eq!("us-open:560".parse::<Tournament>(), Ok(Tournament::new("us-open", "560")));
        assert!("us-open".parse::<Tournament>().is_err());
        assert!("us-open:abc".parse::<Tournament>().is_err());
    }

    #[test]
    fn ranking_week_derives_year_and_url() {
        let week = RankingWeek::new(NaiveDate::from_ymd_opt(2021, 2, 8).unwrap(), "Australian Open");
        assert_eq!(week.year(), 2021);
        assert_eq!(
            week.rankings_url("https://www.atptour.com/"),
            "https://www.atptour.com/en/rankings/doubles?RankRange=1-100&Region=all&DateWeek=2021-02-08"
        );
        let ctx = week.context(SITE_ROOT);
        assert_eq!(ctx.date_week, "2021-02-08");
        assert_eq!(ctx.year, 2021);
    }

    #[test]
    fn built_in_schedule_is_complete() {
        assert_eq!(grand_slams().len(), 4);
        let weeks = grand_slam_weeks();
        assert_eq!(weeks.len(), 23);
        assert!(weeks.iter().all(|w| (2018..=2023).contains(&w.year())));
    }
}
