// src/sources/mod.rs
pub mod internshala;
pub mod timesjobs;

use anyhow::Result;
use metrics::{counter, describe_counter, describe_gauge};
use once_cell::sync::OnceCell;

use crate::listing::RawListing;

/// One-time metrics registration (facade only; no-op without an exporter).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("collect_listings_scraped_total", "Raw listings returned by adapters.");
        describe_counter!("collect_new_total", "Listings newly added to the batch.");
        describe_counter!("collect_skipped_seen_total", "Listings skipped via the seen-set.");
        describe_counter!("collect_skipped_stale_total", "Listings skipped as too old.");
        describe_counter!("collect_skipped_duplicate_total", "Listings rejected by batch dedup.");
        describe_counter!("collect_adapter_errors_total", "Adapter scrape/parse errors.");
        describe_counter!("deliver_sent_total", "Per-recipient digest sends that succeeded.");
        describe_counter!("deliver_failed_total", "Per-recipient digest sends that failed.");
        describe_gauge!("tick_last_run_ts", "Unix ts of the last completed tick.");
    });
}

/// A site adapter: one scrape pass over one job board. Finite, not
/// restartable mid-scrape; re-invocation re-scrapes from scratch.
#[async_trait::async_trait]
pub trait SourceAdapter: Send + Sync {
    async fn scrape(&self) -> Result<Vec<RawListing>>;
    fn name(&self) -> &'static str;
}

/// Invoke every adapter independently. An adapter error is logged, counted,
/// and contributes zero listings; the pass continues with the rest.
/// Returns the pooled raw listings plus the number of failed adapters.
pub async fn scrape_all(adapters: &[Box<dyn SourceAdapter>]) -> (Vec<RawListing>, usize) {
    ensure_metrics_described();

    let mut pooled = Vec::new();
    let mut failures = 0usize;
    for adapter in adapters {
        match adapter.scrape().await {
            Ok(mut listings) => {
                tracing::info!(adapter = adapter.name(), count = listings.len(), "adapter scrape ok");
                counter!("collect_listings_scraped_total").increment(listings.len() as u64);
                pooled.append(&mut listings);
            }
            Err(e) => {
                tracing::warn!(error = ?e, adapter = adapter.name(), "adapter error");
                counter!("collect_adapter_errors_total").increment(1);
                failures += 1;
            }
        }
    }
    (pooled, failures)
}

/// Clean a scraped text fragment: entity-decode, strip tags, collapse
/// whitespace.
pub(crate) fn clean_fragment(s: &str) -> String {
    let mut out = html_escape::decode_html_entities(s).to_string();

    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").expect("tags regex"));
    out = re_tags.replace_all(&out, "").to_string();

    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").expect("ws regex"));
    out = re_ws.replace_all(&out, " ").to_string();
    out.trim().to_string()
}

/// Pull a "posted X ago"-style phrase out of a listing card's full text.
pub(crate) fn extract_posted_phrase(text: &str) -> Option<String> {
    static RE_POSTED: OnceCell<regex::Regex> = OnceCell::new();
    let re = RE_POSTED.get_or_init(|| {
        regex::Regex::new(r"(?i)(\d+\s+(?:day|week|month|hour)s?\s+ago|just now|today|few hours ago)")
            .expect("posted regex")
    });
    re.find(text).map(|m| m.as_str().to_string())
}

/// Pull an "Apply by ..." deadline phrase out of a listing card's full text.
pub(crate) fn extract_deadline_phrase(text: &str) -> Option<String> {
    static RE_DEADLINE: OnceCell<regex::Regex> = OnceCell::new();
    let re = RE_DEADLINE.get_or_init(|| {
        regex::Regex::new(r"(?i)apply\s+by\s+(\d{1,2}\s*[A-Za-z]{3,9}\s*(?:\d{2,4})?)")
            .expect("deadline regex")
    });
    re.captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
}
