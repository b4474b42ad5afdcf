// src/atp/mod.rs
pub mod client;
pub mod models;
pub mod retry;

pub use client::{FetchConfig, Fetcher, HttpFetcher};
pub use models::{grand_slam_weeks, grand_slams, RankingWeek, Tournament, SITE_ROOT};
pub use retry::RetryPolicy;
