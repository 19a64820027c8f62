// src/collect.rs
//! Collection engine: adapters → staleness gate → dedup → durable batch.
//! Runs on every tick, independent of whether a delivery may follow.

use anyhow::{Context, Result};
use chrono::Utc;
use metrics::counter;
use tracing::{debug, info};

use crate::listing::{fallback_id, RawListing};
use crate::sources::{scrape_all, SourceAdapter};
use crate::store::{BatchStore, SeenSet};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionSummary {
    pub scraped: usize,
    pub new_count: usize,
    pub skipped_seen: usize,
    pub skipped_stale: usize,
    pub skipped_duplicate: usize,
    pub adapter_failures: usize,
}

pub struct CollectionEngine {
    max_age_days: u32,
}

impl CollectionEngine {
    pub fn new(max_age_days: u32) -> Self {
        Self { max_age_days }
    }

    /// One full collection pass. Adapter failures are tolerated and counted;
    /// a persistence failure aborts the pass with an error (the next tick
    /// retries from the last good state).
    pub async fn collect(
        &self,
        adapters: &[Box<dyn SourceAdapter>],
        seen: &mut SeenSet,
        batch: &mut BatchStore,
    ) -> Result<CollectionSummary> {
        let (raw_listings, adapter_failures) = scrape_all(adapters).await;
        info!(total = raw_listings.len(), adapter_failures, "collection pass scraped");

        let mut summary = CollectionSummary {
            scraped: raw_listings.len(),
            adapter_failures,
            ..Default::default()
        };

        let now = Utc::now();
        for mut raw in raw_listings {
            let id = resolve_id(&raw);
            raw.id = Some(id.clone());

            if seen.contains(&id) {
                summary.skipped_seen += 1;
                counter!("collect_skipped_seen_total").increment(1);
                continue;
            }

            let posted = raw.posted_date.as_deref().unwrap_or_default();
            if crate::relevance::is_too_old(posted, self.max_age_days) {
                debug!(title = %raw.title, company = %raw.company, posted, "skipped (too old)");
                summary.skipped_stale += 1;
                counter!("collect_skipped_stale_total").increment(1);
                continue;
            }

            match batch.try_add(raw, now) {
                Some(added) => {
                    debug!(title = %added.title, company = %added.company, "added to batch");
                    seen.insert(id);
                    summary.new_count += 1;
                    counter!("collect_new_total").increment(1);
                }
                None => {
                    summary.skipped_duplicate += 1;
                    counter!("collect_skipped_duplicate_total").increment(1);
                }
            }
        }

        // Sequential best-effort persistence; each file individually atomic.
        seen.persist().context("persisting seen-set")?;
        batch.persist().context("persisting batch")?;

        info!(
            new = summary.new_count,
            seen = summary.skipped_seen,
            stale = summary.skipped_stale,
            dup = summary.skipped_duplicate,
            "collection cycle completed"
        );
        Ok(summary)
    }
}

/// Dedup key for a scraped listing: the adapter's id when it has one,
/// otherwise the deterministic content hash.
fn resolve_id(raw: &RawListing) -> String {
    match raw.id.as_deref().map(str::trim) {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => fallback_id(&raw.title, &raw.company, &raw.source),
    }
}
