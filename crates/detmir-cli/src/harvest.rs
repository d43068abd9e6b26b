//! `harvest` command handler.
//!
//! Categories run concurrently up to `scraper_max_concurrent_categories`;
//! pages within a category stay sequential. A category that fails is logged
//! and counted rather than propagated, so one bad seed does not abort the run.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use anyhow::Context;
use detmir_core::categories::validate_categories;
use detmir_core::{load_categories, AppConfig, CategoriesFile};
use detmir_scraper::{CategoryHarvest, CategoryTarget, DetmirClient, QueryBuilder, QueryConfig};
use futures::stream::{self, StreamExt};

use crate::sink::JsonlSink;

/// Totals across every category of one run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct HarvestSummary {
    pub categories: usize,
    /// Paginated to a short page without a page-level error.
    pub complete: usize,
    /// Stopped early but kept some records.
    pub partial: usize,
    /// Produced nothing: bad seed URL, or the first page already failed.
    pub failed: usize,
    pub records: usize,
    /// Records carrying a sale tag.
    pub discounted: usize,
    pub skipped_listings: usize,
}

impl HarvestSummary {
    fn record(&mut self, harvest: &CategoryHarvest) {
        self.categories += 1;
        self.records += harvest.listings.len();
        self.discounted += harvest.listings.iter().filter(|l| l.is_discounted()).count();
        self.skipped_listings += harvest.failures.len();
        match (&harvest.error, harvest.listings.is_empty()) {
            (None, _) => self.complete += 1,
            (Some(_), false) => self.partial += 1,
            (Some(_), true) => self.failed += 1,
        }
    }

    fn record_bad_seed(&mut self) {
        self.categories += 1;
        self.failed += 1;
    }

    /// `true` when there was at least one category and none produced output.
    pub(crate) fn all_failed(&self) -> bool {
        self.categories > 0 && self.failed == self.categories
    }
}

pub(crate) fn query_builder(config: &AppConfig) -> QueryBuilder {
    QueryBuilder::new(QueryConfig::with_base_url(&config.api_base_url))
}

/// Seeds from `--seed` flags, else the categories file, else the built-in list.
///
/// # Errors
///
/// Returns an error if the flags or the file fail validation, or the file
/// exists but cannot be read.
pub(crate) fn resolve_seed_urls(
    config: &AppConfig,
    seed_args: &[String],
) -> anyhow::Result<Vec<String>> {
    let file = if !seed_args.is_empty() {
        let file = CategoriesFile::from_seed_urls(seed_args.iter().cloned());
        validate_categories(&file).context("invalid --seed arguments")?;
        file
    } else if config.categories_path.exists() {
        load_categories(&config.categories_path).with_context(|| {
            format!(
                "failed to load categories from {}",
                config.categories_path.display()
            )
        })?
    } else {
        tracing::warn!(
            path = %config.categories_path.display(),
            "categories file not found, using built-in seeds"
        );
        CategoriesFile::builtin()
    };

    Ok(file.seed_urls().into_iter().map(str::to_owned).collect())
}

/// Runs the `harvest` command and returns per-run totals.
///
/// When `dry_run` is `true` the first page URL of each category is printed
/// and nothing is fetched.
///
/// # Errors
///
/// Returns an error if seeds cannot be resolved, the HTTP client cannot be
/// built, or output cannot be written. Per-category fetch failures are
/// logged and counted in the summary, not propagated.
pub(crate) async fn run_harvest(
    config: &AppConfig,
    seed_args: &[String],
    output: Option<&Path>,
    dry_run: bool,
) -> anyhow::Result<HarvestSummary> {
    let seed_urls = resolve_seed_urls(config, seed_args)?;
    let builder = query_builder(config);
    let mut summary = HarvestSummary::default();

    let mut targets = Vec::with_capacity(seed_urls.len());
    for seed_url in &seed_urls {
        match CategoryTarget::from_seed_url(seed_url) {
            Ok(target) => targets.push(target),
            Err(e) => {
                tracing::error!(seed_url, error = %e, "skipping category with malformed seed URL");
                eprintln!("{seed_url}: failed ({e})");
                summary.record_bad_seed();
            }
        }
    }

    if dry_run {
        println!("dry-run: would harvest {} categories", targets.len());
        for target in &targets {
            println!("{target}\t{}", builder.build_request(target, 0).url());
        }
        return Ok(summary);
    }

    let client = DetmirClient::from_config(config).context("failed to build HTTP client")?;

    let writer: Box<dyn Write> = match output {
        Some(path) => Box::new(BufWriter::new(File::create(path).with_context(|| {
            format!("failed to create output file {}", path.display())
        })?)),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };
    let mut sink = JsonlSink::new(writer);

    let max_concurrent = config.scraper_max_concurrent_categories.max(1);
    let mut harvests = stream::iter(targets)
        .map(|target| {
            client.harvest_category(
                &builder,
                target,
                config.scraper_inter_request_delay_ms,
                config.scraper_max_pages,
            )
        })
        .buffer_unordered(max_concurrent);

    while let Some(harvest) = harvests.next().await {
        sink.write_all(&harvest.listings)?;
        summary.record(&harvest);
        eprintln!("{}", describe(&harvest));
    }

    tracing::info!(
        categories = summary.categories,
        complete = summary.complete,
        partial = summary.partial,
        failed = summary.failed,
        records = sink.written(),
        discounted = summary.discounted,
        skipped_listings = summary.skipped_listings,
        "harvest finished"
    );
    sink.finish()?;

    Ok(summary)
}

/// One-line per-category report for stderr.
fn describe(harvest: &CategoryHarvest) -> String {
    let status = match &harvest.error {
        None => "ok".to_string(),
        Some(e) => format!("stopped ({e})"),
    };
    format!(
        "{}: {} records, {} skipped, {} pages, {status}",
        harvest.category,
        harvest.listings.len(),
        harvest.failures.len(),
        harvest.pages_fetched,
    )
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use detmir_core::Environment;

    use super::*;

    fn test_config(categories_path: &str) -> AppConfig {
        AppConfig {
            env: Environment::Test,
            log_level: "info".to_string(),
            categories_path: PathBuf::from(categories_path),
            api_base_url: "https://api.detmir.ru".to_string(),
            scraper_request_timeout_secs: 5,
            scraper_user_agent: "detmir-test/0.1".to_string(),
            scraper_max_concurrent_categories: 1,
            scraper_inter_request_delay_ms: 0,
            scraper_max_retries: 0,
            scraper_retry_backoff_base_secs: 0,
            scraper_max_pages: 10,
        }
    }

    #[test]
    fn seed_flags_take_precedence() {
        let config = test_config("../../config/categories.yaml");
        let seeds = vec!["https://www.detmir.ru/catalog/index/name/kurtki/".to_string()];
        let resolved = resolve_seed_urls(&config, &seeds).unwrap();
        assert_eq!(resolved, seeds);
    }

    #[test]
    fn duplicate_seed_flags_are_rejected() {
        let config = test_config("/nonexistent/categories.yaml");
        let seeds = vec![
            "https://www.detmir.ru/catalog/index/name/kurtki/".to_string(),
            "https://www.detmir.ru/catalog/index/name/kurtki".to_string(),
        ];
        assert!(resolve_seed_urls(&config, &seeds).is_err());
    }

    #[test]
    fn categories_file_is_used_when_no_flags() {
        let config = test_config("../../config/categories.yaml");
        let resolved = resolve_seed_urls(&config, &[]).unwrap();
        assert!(resolved
            .iter()
            .any(|url| url.ends_with("/bombery_vo/")));
    }

    #[test]
    fn builtin_seeds_when_file_missing() {
        let config = test_config("/nonexistent/categories.yaml");
        let resolved = resolve_seed_urls(&config, &[]).unwrap();
        assert_eq!(resolved, detmir_core::DEFAULT_SEED_URLS);
    }

    #[test]
    fn query_builder_uses_configured_origin() {
        let mut config = test_config("/nonexistent/categories.yaml");
        config.api_base_url = "http://127.0.0.1:9000".to_string();
        let target = CategoryTarget {
            alias: "bombery_vo".to_string(),
        };
        let request = query_builder(&config).build_request(&target, 0);
        assert!(request
            .url()
            .starts_with("http://127.0.0.1:9000/v2/products/new?filter="));
    }

    fn harvest_with(listings: usize, error: bool) -> CategoryHarvest {
        let listing: detmir_core::CanonicalListing = serde_json::from_value(serde_json::json!({
            "captured_at": "2024-11-02T10:30:00Z",
            "id": "1",
            "url": "https://www.detmir.ru/product/index/id/1/",
            "title": "Бомбер",
            "brand": "",
            "marketing_tags": [],
            "price": { "current": 100.0, "original": 100.0 },
            "in_stock": true,
            "assets": { "main_image": "", "set_images": [], "video": null },
            "description": "",
            "metadata": {
                "article": null, "sex": null, "rating": null,
                "review_count": null, "questions_count": null,
                "vendor": {
                    "id": null, "name": null, "inn": null,
                    "ogrn": null, "phone": null, "address": null
                }
            }
        }))
        .unwrap();

        CategoryHarvest {
            category: CategoryTarget {
                alias: "bombery_vo".to_string(),
            },
            listings: vec![listing; listings],
            failures: Vec::new(),
            pages_fetched: 1,
            error: error.then(|| detmir_scraper::ScraperError::NotFound {
                url: "https://api.detmir.ru/v2/products/new".to_string(),
            }),
        }
    }

    #[test]
    fn summary_classifies_categories() {
        let mut summary = HarvestSummary::default();
        summary.record(&harvest_with(3, false));
        summary.record(&harvest_with(2, true));
        summary.record(&harvest_with(0, true));
        summary.record_bad_seed();

        assert_eq!(summary.categories, 4);
        assert_eq!(summary.complete, 1);
        assert_eq!(summary.partial, 1);
        assert_eq!(summary.failed, 2);
        assert_eq!(summary.records, 5);
        assert!(!summary.all_failed());
    }

    #[test]
    fn all_failed_only_when_nothing_succeeded() {
        let mut summary = HarvestSummary::default();
        assert!(!summary.all_failed());
        summary.record_bad_seed();
        summary.record(&harvest_with(0, true));
        assert!(summary.all_failed());
    }

    #[test]
    fn empty_complete_category_is_not_a_failure() {
        let mut summary = HarvestSummary::default();
        summary.record(&harvest_with(0, false));
        assert_eq!(summary.complete, 1);
        assert!(!summary.all_failed());
    }

    #[test]
    fn describe_reports_counts_and_status() {
        assert_eq!(
            describe(&harvest_with(2, false)),
            "bombery_vo: 2 records, 0 skipped, 1 pages, ok"
        );
        assert!(describe(&harvest_with(0, true)).contains("stopped (endpoint not found"));
    }
}
