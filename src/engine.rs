// src/engine.rs
//! # Tick Orchestration
//! One tick = collect (always) → maybe deliver → record. All adapters are
//! queried before any delivery decision, so a digest always reflects the
//! tick's full collection pass, never a partial one.
//!
//! Persistence failures abort the tick with an error; the next tick resumes
//! from the last successfully persisted state.

use anyhow::Result;
use chrono::Utc;
use metrics::gauge;
use tracing::info;

use crate::collect::{CollectionEngine, CollectionSummary};
use crate::config::AppConfig;
use crate::deliver::DeliveryEngine;
use crate::notify::{DeliveryReport, Mailer};
use crate::scheduler::SendGate;
use crate::sources::SourceAdapter;
use crate::store::{BatchStore, SeenSet};
use crate::subscribers::UnsubscribeList;

/// What one tick did, for logs and tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickOutcome {
    pub collection: CollectionSummary,
    /// Present when a delivery cycle ran this tick.
    pub delivery: Option<DeliveryReport>,
    /// True when a non-empty batch was held back by the frequency gate.
    pub gated: bool,
}

/// Run one collect-then-maybe-deliver cycle against the durable state under
/// `cfg.data_dir`. Single-threaded by contract: exactly one tick runs at a
/// time, and only one process owns the state files.
pub async fn run_tick(
    cfg: &AppConfig,
    adapters: &[Box<dyn SourceAdapter>],
    mailer: &dyn Mailer,
) -> Result<TickOutcome> {
    let mut seen = SeenSet::load(cfg.seen_path())?;
    let mut batch = BatchStore::load(cfg.batch_path())?;
    let mut gate = SendGate::load(cfg.scheduler_state_path(), cfg.send_limits());
    let unsubscribes = UnsubscribeList::load(cfg.unsubscribed_path())?;

    let collector = CollectionEngine::new(cfg.stale_after_days);
    let collection = collector.collect(adapters, &mut seen, &mut batch).await?;

    let mut outcome = TickOutcome {
        collection,
        ..Default::default()
    };

    let now = Utc::now();
    if batch.is_empty() {
        info!("no new internships found; no email sent");
    } else if !gate.can_send(now) {
        // Normal control flow, not an error; the batch waits for a later tick.
        info!(pending = batch.len(), "frequency gate closed; holding batch");
        outcome.gated = true;
    } else {
        let recipients = unsubscribes.active_emails(&cfg.subscribers);
        let report = DeliveryEngine::new(mailer)
            .deliver(&mut batch, &recipients)
            .await?;
        gate.record_send(now)?;
        info!(
            sent_today = gate.emails_sent_today(now),
            cap = cfg.max_emails_per_day,
            "email digest cycle recorded"
        );
        outcome.delivery = Some(report);
    }

    gauge!("tick_last_run_ts").set(now.timestamp() as f64);
    Ok(outcome)
}
