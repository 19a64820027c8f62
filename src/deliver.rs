// src/deliver.rs
//! Delivery engine: formats the pending batch into one digest and sends it
//! to every active subscriber, isolating per-recipient failures. The batch
//! clears exactly once per cycle, after all attempts — listings that missed
//! a failing recipient are not redelivered (forward progress over
//! per-recipient reliability).

use anyhow::{Context, Result};
use metrics::counter;
use tracing::{info, warn};

use crate::notify::{compose_digest, DeliveryReport, Mailer};
use crate::store::BatchStore;

pub struct DeliveryEngine<'a> {
    mailer: &'a dyn Mailer,
}

impl<'a> DeliveryEngine<'a> {
    pub fn new(mailer: &'a dyn Mailer) -> Self {
        Self { mailer }
    }

    /// Send the current batch to `recipients`. No-op on an empty batch. On a
    /// non-empty batch the store is cleared unconditionally after the last
    /// attempt; only a persistence failure of that clear is an error.
    pub async fn deliver(
        &self,
        batch: &mut BatchStore,
        recipients: &[String],
    ) -> Result<DeliveryReport> {
        if batch.is_empty() {
            info!("no new internships in batch to send");
            return Ok(DeliveryReport::default());
        }

        let (subject, body) = compose_digest(batch.listings());
        info!(
            listings = batch.len(),
            recipients = recipients.len(),
            "sending digest"
        );

        let mut report = DeliveryReport::default();
        for to in recipients {
            match self.mailer.send(to, &subject, &body).await {
                Ok(()) => {
                    info!(recipient = %to, "sent internship digest");
                    counter!("deliver_sent_total").increment(1);
                    report.sent.push(to.clone());
                }
                Err(e) => {
                    warn!(error = ?e, recipient = %to, "failed to send digest");
                    counter!("deliver_failed_total").increment(1);
                    report.failed.push((to.clone(), format!("{e:#}")));
                }
            }
        }

        batch.clear().context("clearing batch after delivery")?;
        info!(
            sent = report.sent.len(),
            failed = report.failed.len(),
            "delivery cycle completed; batch cleared"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::RawListing;
    use chrono::Utc;
    use std::sync::Mutex;
    use tempfile::tempdir;

    /// Mailer that fails for addresses listed in `fail_for` and records the
    /// rest.
    struct MockMailer {
        fail_for: Vec<String>,
        delivered: Mutex<Vec<(String, String)>>,
    }

    impl MockMailer {
        fn new(fail_for: &[&str]) -> Self {
            Self {
                fail_for: fail_for.iter().map(|s| s.to_string()).collect(),
                delivered: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait::async_trait]
    impl Mailer for MockMailer {
        async fn send(&self, to: &str, subject: &str, _body: &str) -> Result<()> {
            if self.fail_for.iter().any(|f| f == to) {
                anyhow::bail!("mailbox unavailable");
            }
            self.delivered
                .lock()
                .expect("mock mutex")
                .push((to.to_string(), subject.to_string()));
            Ok(())
        }
    }

    fn loaded_batch(dir: &std::path::Path, n: usize) -> BatchStore {
        let mut batch = BatchStore::load(dir.join("batch.json")).expect("load");
        for i in 0..n {
            batch.try_add(
                RawListing {
                    id: Some(format!("x_{i}")),
                    title: format!("Python Intern {i}"),
                    company: "Acme".to_string(),
                    link: "https://example.test".to_string(),
                    source: "internshala".to_string(),
                    posted_date: None,
                    deadline: None,
                },
                Utc::now(),
            );
        }
        batch.persist().expect("persist");
        batch
    }

    #[tokio::test]
    async fn empty_batch_is_a_noop() {
        let dir = tempdir().expect("tempdir");
        let mut batch = BatchStore::load(dir.path().join("batch.json")).expect("load");
        let mailer = MockMailer::new(&[]);

        let report = DeliveryEngine::new(&mailer)
            .deliver(&mut batch, &["a@example.com".to_string()])
            .await
            .expect("deliver");

        assert_eq!(report.attempted(), 0);
        assert!(mailer.delivered.lock().expect("mock mutex").is_empty());
    }

    #[tokio::test]
    async fn partial_recipient_failure_is_isolated_and_batch_clears() {
        let dir = tempdir().expect("tempdir");
        let mut batch = loaded_batch(dir.path(), 2);
        let mailer = MockMailer::new(&["bad@example.com"]);

        let recipients = vec!["good@example.com".to_string(), "bad@example.com".to_string()];
        let report = DeliveryEngine::new(&mailer)
            .deliver(&mut batch, &recipients)
            .await
            .expect("deliver");

        assert_eq!(report.sent, vec!["good@example.com".to_string()]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "bad@example.com");

        // Cleared exactly once, in memory and on disk.
        assert!(batch.is_empty());
        assert!(BatchStore::load(dir.path().join("batch.json")).expect("reload").is_empty());
    }

    #[tokio::test]
    async fn same_digest_goes_to_every_recipient() {
        let dir = tempdir().expect("tempdir");
        let mut batch = loaded_batch(dir.path(), 3);
        let mailer = MockMailer::new(&[]);

        let recipients = vec!["a@example.com".to_string(), "b@example.com".to_string()];
        DeliveryEngine::new(&mailer)
            .deliver(&mut batch, &recipients)
            .await
            .expect("deliver");

        let delivered = mailer.delivered.lock().expect("mock mutex");
        assert_eq!(delivered.len(), 2);
        assert_eq!(delivered[0].1, delivered[1].1);
        assert!(delivered[0].1.contains("3 Fresh Opportunities"));
    }
}
