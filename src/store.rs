// src/store.rs
//! Durable stores backing the pipeline: the cross-run seen-set and the
//! not-yet-delivered batch. Plain JSON files, rewritten via temp-file +
//! rename so a crash mid-write leaves the previous state intact.
//!
//! Single-process, single-writer by design: one scheduler tick owns both
//! files for its whole duration.

use std::collections::HashSet;
use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};

use crate::listing::{Listing, RawListing};

/// Serialize `value` as JSON to `path` atomically (same-dir temp + rename).
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent)
        .with_context(|| format!("creating state directory {}", parent.display()))?;

    let tmp = parent.join(format!(
        ".{}.tmp",
        path.file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("state.json")
    ));

    let bytes = serde_json::to_vec_pretty(value).context("serializing state to JSON")?;
    let mut file = fs::File::create(&tmp)
        .with_context(|| format!("creating temp state file {}", tmp.display()))?;
    file.write_all(&bytes)
        .with_context(|| format!("writing temp state file {}", tmp.display()))?;
    file.flush()
        .with_context(|| format!("flushing temp state file {}", tmp.display()))?;
    drop(file);

    fs::rename(&tmp, path)
        .with_context(|| format!("renaming {} -> {}", tmp.display(), path.display()))?;
    Ok(())
}

/// Read JSON state from `path`. A missing file yields `None`; an unreadable
/// or malformed file is an error the caller decides how to handle.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading state file {}", path.display()))?;
    let value = serde_json::from_str(&content)
        .with_context(|| format!("parsing state file {}", path.display()))?;
    Ok(Some(value))
}

/// Monotonically growing set of every listing id ever collected. Entries are
/// never removed — growth is bounded only by distinct listings observed,
/// an accepted tradeoff for moderate deployment lifetimes.
#[derive(Debug)]
pub struct SeenSet {
    path: PathBuf,
    ids: HashSet<String>,
}

impl SeenSet {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let ids: HashSet<String> = read_json::<Vec<String>>(&path)?
            .map(|v| v.into_iter().collect())
            .unwrap_or_default();
        Ok(Self { path, ids })
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn insert(&mut self, id: String) -> bool {
        self.ids.insert(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn persist(&self) -> Result<()> {
        // Sorted for a stable on-disk representation.
        let mut ids: Vec<&String> = self.ids.iter().collect();
        ids.sort();
        write_json_atomic(&self.path, &ids)
    }
}

/// Ordered queue of collected listings awaiting delivery. Enforces the
/// intra-window dedup rules: no two entries share an id, and no two entries
/// share a `(title, company)` pair.
#[derive(Debug)]
pub struct BatchStore {
    path: PathBuf,
    listings: Vec<Listing>,
}

impl BatchStore {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let listings = read_json::<Vec<Listing>>(&path)?.unwrap_or_default();
        Ok(Self { path, listings })
    }

    pub fn listings(&self) -> &[Listing] {
        &self.listings
    }

    pub fn len(&self) -> usize {
        self.listings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }

    /// Append a raw listing unless an equal-or-duplicate entry already sits
    /// in the batch. Returns the normalized listing on acceptance.
    pub fn try_add(&mut self, raw: RawListing, now: DateTime<Utc>) -> Option<&Listing> {
        let candidate = Listing::from_raw(raw, now);
        let dup = self.listings.iter().any(|existing| {
            existing.id == candidate.id || existing.soft_key() == candidate.soft_key()
        });
        if dup {
            return None;
        }
        self.listings.push(candidate);
        self.listings.last()
    }

    /// Empty the queue and persist the empty state. Called exactly once per
    /// delivery cycle, after all send attempts completed.
    pub fn clear(&mut self) -> Result<()> {
        self.listings.clear();
        self.persist()
    }

    pub fn persist(&self) -> Result<()> {
        write_json_atomic(&self.path, &self.listings)
    }
}
