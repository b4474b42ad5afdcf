// src/main.rs
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use atp_extractor::atp::{
    grand_slam_weeks, grand_slams, FetchConfig, Fetcher, HttpFetcher, RankingWeek, RetryPolicy, Tournament,
};
use atp_extractor::extractors::{matches::MATCH, profile::PROFILE_READY, rankings::TABLE_BODY};
use atp_extractor::storage::StorageManager;
use atp_extractor::utils::{self, html_debug, AppError};
use atp_extractor::{extract_matches, extract_profile, extract_rankings, DocumentTree, Record};

/// Command Line Interface for the ATP doubles extractor
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Output directory for exported tables
    #[arg(short, long, default_value = "./output", global = true)]
    output_dir: String,

    /// Debug mode - verbose logs and outlines of pages that yielded nothing
    #[arg(short, long, global = true)]
    debug: bool,

    /// User-Agent header sent with every request
    #[arg(long, global = true)]
    user_agent: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, default_value = "30", global = true)]
    timeout_secs: u64,

    /// Minimum pause before each request, in milliseconds
    #[arg(long, default_value = "1000", global = true)]
    delay_ms: u64,

    /// Maximum random extra pause before each request, in milliseconds
    #[arg(long, default_value = "4000", global = true)]
    jitter_ms: u64,

    /// Attempts per page before giving up
    #[arg(long, default_value = "3", global = true)]
    retries: u32,

    /// Pages fetched at the same time
    #[arg(long, default_value = "2", global = true)]
    concurrency: usize,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Doubles match results from tournament archive pages
    Matches {
        /// Tournament as <slug>:<code>; defaults to the four Grand Slams
        #[arg(short, long = "tournament")]
        tournaments: Vec<Tournament>,

        #[arg(long, default_value = "2018")]
        start_year: u32,

        #[arg(long, default_value = "2023")]
        end_year: u32,

        /// Output file name (.csv or .json)
        #[arg(short, long)]
        file: Option<String>,
    },
    /// Doubles rankings, optionally enriched with player profiles
    Rankings {
        /// Ranking week (YYYY-MM-DD); defaults to the Grand Slam weeks 2018-2023
        #[arg(long = "date-week")]
        date_weeks: Vec<NaiveDate>,

        /// Tournament label stored with weeks given on the command line
        #[arg(long, default_value = "")]
        tournament_label: String,

        /// Ranked players kept per week
        #[arg(short, long, default_value = "25")]
        limit: usize,

        /// Do not visit player profile pages
        #[arg(long)]
        skip_profiles: bool,

        /// Output format extension
        #[arg(long, default_value = "csv")]
        format: String,
    },
}

impl Args {
    fn fetch_config(&self) -> Result<FetchConfig, AppError> {
        if self.retries == 0 {
            return Err(AppError::Config("--retries must be at least 1".to_string()));
        }
        let mut config = FetchConfig {
            request_delay: Duration::from_millis(self.delay_ms),
            delay_jitter: Duration::from_millis(self.jitter_ms),
            timeout: Duration::from_secs(self.timeout_secs),
            retry: RetryPolicy {
                max_attempts: self.retries,
                ..RetryPolicy::default()
            },
            ..FetchConfig::default()
        };
        if let Some(agent) = &self.user_agent {
            config.user_agent = agent.clone();
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // 1. Parse CLI Arguments
    let args = Args::parse();

    // 2. Setup Logging (reads RUST_LOG env var)
    utils::logging::setup_logging(args.debug);
    tracing::info!("Starting processing for args: {:?}", args);

    if args.concurrency == 0 {
        return Err(AppError::Config("--concurrency must be at least 1".to_string()));
    }

    // 3. Initialize storage and acquisition
    let storage = StorageManager::new(&args.output_dir)?;
    let fetcher = Arc::new(HttpFetcher::new(args.fetch_config()?)?);
    let debug_dir = args.debug.then(|| storage.base_dir().join("debug"));

    match &args.command {
        Command::Matches {
            tournaments,
            start_year,
            end_year,
            file,
        } => {
            if start_year > end_year {
                return Err(AppError::Config(format!(
                    "start year {} is after end year {}",
                    start_year, end_year
                )));
            }
            let tournaments = if tournaments.is_empty() { grand_slams() } else { tournaments.clone() };
            let file = file
                .clone()
                .unwrap_or_else(|| format!("grand_slam_matches_{}_{}.csv", start_year, end_year));

            let jobs: Vec<(Tournament, u32)> = tournaments
                .iter()
                .flat_map(|t| (*start_year..=*end_year).map(move |year| (t.clone(), year)))
                .collect();
            run_matches(fetcher, &storage, jobs, args.concurrency, debug_dir, &file).await
        }
        Command::Rankings {
            date_weeks,
            tournament_label,
            limit,
            skip_profiles,
            format,
        } => {
            let weeks = if date_weeks.is_empty() {
                grand_slam_weeks()
            } else {
                date_weeks
                    .iter()
                    .map(|date| RankingWeek::new(*date, tournament_label))
                    .collect()
            };
            run_rankings(
                fetcher,
                &storage,
                weeks,
                *limit,
                !*skip_profiles,
                args.concurrency,
                debug_dir,
                format,
            )
            .await
        }
    }
}

/// Runs one task per job with at most `concurrency` in flight. Each task owns
/// its document and returns its own rows; results come back in job order.
async fn run_jobs<J, R, F, Fut>(jobs: Vec<J>, concurrency: usize, work: F) -> Vec<R>
where
    F: Fn(J) -> Fut,
    Fut: Future<Output = R> + Send + 'static,
    R: Send + 'static,
{
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut tasks = JoinSet::new();
    for (idx, job) in jobs.into_iter().enumerate() {
        let semaphore = Arc::clone(&semaphore);
        let task = work(job);
        tasks.spawn(async move {
            let _permit = semaphore.acquire_owned().await;
            (idx, task.await)
        });
    }

    let mut results = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(result) => results.push(result),
            Err(e) => tracing::error!("Worker task failed: {}", e),
        }
    }
    results.sort_by_key(|(idx, _)| *idx);
    results.into_iter().map(|(_, result)| result).collect()
}

fn dump_outline(debug_dir: Option<&Path>, name: &str, tree: &DocumentTree) {
    let Some(dir) = debug_dir else { return };
    let path = dir.join(format!("{}.txt", name));
    if let Err(e) = html_debug::save_debug_outline(tree, &path) {
        tracing::warn!("Failed to save debug outline: {}", e);
    }
}

async fn scrape_results(
    fetcher: &HttpFetcher,
    tournament: &Tournament,
    year: u32,
    debug_dir: Option<&Path>,
) -> Vec<Record> {
    tracing::info!("Scraping data for {} in year: {}", tournament.slug, year);
    let url = tournament.results_url(&fetcher.config().site_root, year);

    let tree = match fetcher.fetch(&url, &MATCH, fetcher.config().timeout).await {
        Ok(tree) => tree,
        Err(e) => {
            tracing::error!("Failed to load results for {} in {}: {}", tournament.slug, year, e);
            return Vec::new();
        }
    };

    match extract_matches(&tree, &tournament.context(year)) {
        Ok(rows) => {
            if rows.is_empty() {
                dump_outline(debug_dir, &format!("{}_{}", tournament.slug, year), &tree);
            }
            rows
        }
        Err(e) => {
            tracing::error!("Skipping results for {} in {}: {}", tournament.slug, year, e);
            Vec::new()
        }
    }
}

async fn run_matches(
    fetcher: Arc<HttpFetcher>,
    storage: &StorageManager,
    jobs: Vec<(Tournament, u32)>,
    concurrency: usize,
    debug_dir: Option<PathBuf>,
    file: &str,
) -> Result<(), AppError> {
    let job_count = jobs.len();
    let per_page = run_jobs(jobs, concurrency, |(tournament, year)| {
        let fetcher = Arc::clone(&fetcher);
        let debug_dir = debug_dir.clone();
        async move { scrape_results(&fetcher, &tournament, year, debug_dir.as_deref()).await }
    })
    .await;

    let all_rows: Vec<Record> = per_page.into_iter().flatten().collect();
    tracing::info!("Processing finished. {} matches from {} pages", all_rows.len(), job_count);

    if all_rows.is_empty() {
        return Err(AppError::Processing(format!(
            "Failed to extract any matches from {} pages",
            job_count
        )));
    }

    storage.export(&all_rows, file)?;
    storage.export_metadata(&all_rows, file)?;
    Ok(())
}

async fn scrape_profile(fetcher: &HttpFetcher, url: &str) -> Option<Record> {
    let tree = match fetcher.fetch(url, &PROFILE_READY, fetcher.config().timeout).await {
        Ok(tree) => tree,
        Err(e) => {
            tracing::error!("Failed to load profile {}: {}", url, e);
            return None;
        }
    };
    match extract_profile(&tree) {
        Ok(profile) => {
            tracing::debug!("Scraped {} profile fields from {}", profile.len(), url);
            Some(profile)
        }
        Err(e) => {
            tracing::error!("Skipping profile {}: {}", url, e);
            None
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_rankings(
    fetcher: Arc<HttpFetcher>,
    storage: &StorageManager,
    weeks: Vec<RankingWeek>,
    limit: usize,
    with_profiles: bool,
    concurrency: usize,
    debug_dir: Option<PathBuf>,
    format: &str,
) -> Result<(), AppError> {
    let mut saved = 0usize;
    for week in weeks {
        let label = week.date_label();
        let url = week.rankings_url(&fetcher.config().site_root);
        let context = week.context(&fetcher.config().site_root);

        let tree = match fetcher.fetch(&url, &TABLE_BODY, fetcher.config().timeout).await {
            Ok(tree) => tree,
            Err(e) => {
                tracing::error!("Failed to load rankings for week {}: {}", label, e);
                continue;
            }
        };
        let mut rows = match extract_rankings(&tree, &context, limit) {
            Ok(rows) => rows,
            Err(e) => {
                tracing::error!("Skipping rankings for week {}: {}", label, e);
                continue;
            }
        };
        tracing::info!("Found {} player profiles for {}, {} {}", rows.len(), label, week.tournament, week.year());
        if rows.is_empty() {
            dump_outline(debug_dir.as_deref(), &format!("ranking_{}", label), &tree);
            tracing::warn!("No data to save for {}.", label);
            continue;
        }
        drop(tree);

        if with_profiles {
            let links: Vec<(usize, String)> = rows
                .iter()
                .enumerate()
                .filter_map(|(idx, row)| {
                    row.get("profile_url")
                        .filter(|url| !url.is_empty())
                        .map(|url| (idx, url.to_string()))
                })
                .collect();
            let profiles = run_jobs(links, concurrency, |(idx, url)| {
                let fetcher = Arc::clone(&fetcher);
                async move { (idx, scrape_profile(&fetcher, &url).await) }
            })
            .await;
            for (idx, profile) in profiles {
                if let (Some(profile), Some(row)) = (profile, rows.get_mut(idx)) {
                    row.merge(profile);
                }
            }
        }

        let file = format!("ranking_doubles_{}.{}", label, format);
        storage.export(&rows, &file)?;
        storage.export_metadata(&rows, &file)?;
        saved += 1;
    }

    if saved == 0 {
        return Err(AppError::Processing("No ranking tables were saved".to_string()));
    }
    tracing::info!("Processing finished. Saved {} ranking tables", saved);
    Ok(())
}
