// src/subscribers.rs
//! Subscriber registry: the configured recipient list minus the durable
//! unsubscribe records. Unsubscribe/resubscribe requests arrive from outside
//! (form submissions, inbound-email keyword scans, manual operator entry) —
//! this module is only the state they mutate.

use std::path::PathBuf;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::store::{read_json, write_json_atomic};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UnsubscribeRecord {
    pub email: String,
    pub unsubscribed_at: DateTime<Utc>,
}

/// Durable, ordered list of unsubscribed addresses. Emails are normalized to
/// lowercase; each appears at most once.
#[derive(Debug)]
pub struct UnsubscribeList {
    path: PathBuf,
    records: Vec<UnsubscribeRecord>,
}

impl UnsubscribeList {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let records = read_json::<Vec<UnsubscribeRecord>>(&path)?.unwrap_or_default();
        Ok(Self { path, records })
    }

    /// Add an address. Returns true when it was newly added.
    pub fn add(&mut self, email: &str) -> Result<bool> {
        let email = normalize_email(email);
        if self.contains(&email) {
            return Ok(false);
        }
        self.records.push(UnsubscribeRecord {
            email: email.clone(),
            unsubscribed_at: Utc::now(),
        });
        self.persist()?;
        info!(%email, "unsubscribed");
        Ok(true)
    }

    /// Remove an address (resubscribe). Returns true when it was present.
    pub fn remove(&mut self, email: &str) -> Result<bool> {
        let email = normalize_email(email);
        let before = self.records.len();
        self.records.retain(|r| r.email != email);
        if self.records.len() == before {
            return Ok(false);
        }
        self.persist()?;
        info!(%email, "resubscribed");
        Ok(true)
    }

    pub fn is_unsubscribed(&self, email: &str) -> bool {
        self.contains(&normalize_email(email))
    }

    pub fn records(&self) -> &[UnsubscribeRecord] {
        &self.records
    }

    /// Configured subscribers minus unsubscribed addresses, in configured
    /// order, normalized and de-blanked.
    pub fn active_emails(&self, configured: &[String]) -> Vec<String> {
        configured
            .iter()
            .map(|e| normalize_email(e))
            .filter(|e| !e.is_empty() && !self.contains(e))
            .collect()
    }

    fn contains(&self, normalized: &str) -> bool {
        self.records.iter().any(|r| r.email == normalized)
    }

    fn persist(&self) -> Result<()> {
        write_json_atomic(&self.path, &self.records)
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn add_is_idempotent_and_case_insensitive() {
        let dir = tempdir().expect("tempdir");
        let mut list = UnsubscribeList::load(dir.path().join("unsubscribed.json")).expect("load");

        assert!(list.add("Alice@Example.com").expect("add"));
        assert!(!list.add("alice@example.com ").expect("add again"));
        assert_eq!(list.records().len(), 1);
        assert!(list.is_unsubscribed("ALICE@EXAMPLE.COM"));
    }

    #[test]
    fn remove_restores_delivery() {
        let dir = tempdir().expect("tempdir");
        let mut list = UnsubscribeList::load(dir.path().join("unsubscribed.json")).expect("load");

        list.add("bob@example.com").expect("add");
        assert!(list.remove("Bob@example.com").expect("remove"));
        assert!(!list.remove("bob@example.com").expect("remove again"));
        assert!(!list.is_unsubscribed("bob@example.com"));
    }

    #[test]
    fn active_emails_filters_unsubscribed() {
        let dir = tempdir().expect("tempdir");
        let mut list = UnsubscribeList::load(dir.path().join("unsubscribed.json")).expect("load");
        list.add("carol@example.com").expect("add");

        let configured = vec![
            "Alice@example.com".to_string(),
            "CAROL@example.com".to_string(),
            "  ".to_string(),
            "dan@example.com".to_string(),
        ];
        assert_eq!(
            list.active_emails(&configured),
            vec!["alice@example.com".to_string(), "dan@example.com".to_string()]
        );

        list.remove("carol@example.com").expect("remove");
        assert_eq!(list.active_emails(&configured).len(), 3);
    }

    #[test]
    fn records_survive_reload() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("unsubscribed.json");
        {
            let mut list = UnsubscribeList::load(&path).expect("load");
            list.add("eve@example.com").expect("add");
        }
        let reloaded = UnsubscribeList::load(&path).expect("reload");
        assert!(reloaded.is_unsubscribed("eve@example.com"));
    }
}
