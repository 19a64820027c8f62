// src/listing.rs
//! Listing data model: the adapter handoff record and the normalized,
//! persisted form that flows through the batch.

use chrono::{DateTime, Utc};
use once_cell::sync::OnceCell;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Sentinel for optional free-text fields. Persisted verbatim so the digest
/// formatter can tell "no data" apart from an empty scrape.
pub const UNSPECIFIED: &str = "Not specified";

/// Raw record as produced by a site adapter. `id` may be absent or unstable;
/// the collection engine is tolerant and mints a fallback.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RawListing {
    pub id: Option<String>,
    pub title: String,
    pub company: String,
    pub link: String,
    pub source: String,
    pub posted_date: Option<String>,
    pub deadline: Option<String>,
}

/// Normalized listing as stored in the batch file. All fields present;
/// optional scrape data defaults to [`UNSPECIFIED`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Listing {
    pub id: String,
    pub title: String,
    pub company: String,
    pub link: String,
    pub source: String,
    pub posted_date: String,
    pub deadline: String,
    pub added_at: DateTime<Utc>,
}

impl Listing {
    /// Normalize a raw record, resolving the dedup id and stamping `added_at`.
    pub fn from_raw(raw: RawListing, added_at: DateTime<Utc>) -> Self {
        let id = match raw.id {
            Some(id) if !id.trim().is_empty() => id,
            _ => fallback_id(&raw.title, &raw.company, &raw.source),
        };
        Self {
            id,
            title: raw.title,
            company: raw.company,
            link: raw.link,
            source: raw.source,
            posted_date: non_empty_or_unspecified(raw.posted_date),
            deadline: non_empty_or_unspecified(raw.deadline),
            added_at,
        }
    }

    /// Soft-identity key: case-insensitive `(title, company)` pair. Guards
    /// against adapters minting unstable ids for the same posting.
    pub fn soft_key(&self) -> (String, String) {
        soft_key(&self.title, &self.company)
    }
}

fn non_empty_or_unspecified(v: Option<String>) -> String {
    match v {
        Some(s) if !s.trim().is_empty() => s,
        _ => UNSPECIFIED.to_string(),
    }
}

pub fn soft_key(title: &str, company: &str) -> (String, String) {
    (
        title.trim().to_lowercase(),
        company.trim().to_lowercase(),
    )
}

/// Deterministic content hash for listings whose source provides no stable
/// identifier. Stable across processes and restarts, unlike the language
/// hash the original sites were keyed with.
pub fn fallback_id(title: &str, company: &str, source: &str) -> String {
    let normalized = format!(
        "{}|{}|{}",
        collapse_ws(&title.to_lowercase()),
        collapse_ws(&company.to_lowercase()),
        source.to_lowercase()
    );
    let mut hasher = Sha256::new();
    hasher.update(normalized.as_bytes());
    let digest = hasher.finalize();
    let mut hex = String::with_capacity(16);
    for b in digest.iter().take(8) {
        use std::fmt::Write as _;
        let _ = write!(&mut hex, "{:02x}", b);
    }
    format!("{}_{}", source.to_lowercase(), hex)
}

fn collapse_ws(s: &str) -> String {
    static RE_WS: OnceCell<Regex> = OnceCell::new();
    let re = RE_WS.get_or_init(|| Regex::new(r"\s+").expect("ws regex"));
    re.replace_all(s.trim(), " ").to_string()
}
