// src/scheduler.rs
//! Frequency gate for digest delivery: at most N emails per day, with a
//! minimum spacing between sends. State survives restarts as a small JSON
//! record.
//!
//! The gate only answers "may I send now" and records outcomes; the trigger
//! cadence (interval loop, cron, CI workflow) lives outside.

use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::store::{read_json, write_json_atomic};

#[derive(Debug, Clone, Copy)]
pub struct SendLimits {
    pub max_emails_per_day: u32,
    pub min_hours_between_emails: i64,
}

impl Default for SendLimits {
    fn default() -> Self {
        Self {
            max_emails_per_day: 3,
            min_hours_between_emails: 4,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct GateState {
    last_email_sent: Option<DateTime<Utc>>,
    emails_sent_today: u32,
}

/// Durable send gate. `record_send` must be called exactly once per delivery
/// cycle, after the cycle completed — never before. A crash between send and
/// record can therefore cause one duplicate send on retry; the reverse
/// ordering would silently under-count, which is worse.
#[derive(Debug)]
pub struct SendGate {
    path: PathBuf,
    limits: SendLimits,
    state: GateState,
}

impl SendGate {
    /// Load persisted state. A corrupt state file resets to defaults with a
    /// warning rather than blocking the tick.
    pub fn load(path: impl Into<PathBuf>, limits: SendLimits) -> Self {
        let path = path.into();
        let state = match read_json::<GateState>(&path) {
            Ok(Some(s)) => s,
            Ok(None) => GateState::default(),
            Err(e) => {
                warn!(error = ?e, path = %path.display(), "could not load scheduler state; resetting");
                GateState::default()
            }
        };
        let mut gate = Self { path, limits, state };
        gate.apply_rollover(Utc::now());
        gate
    }

    /// Daily count as of `now`: zero whenever the last send happened on a
    /// different UTC date (lazy day rollover, no background timer).
    fn effective_sent_today(&self, now: DateTime<Utc>) -> u32 {
        match self.state.last_email_sent {
            Some(last) if last.date_naive() == now.date_naive() => self.state.emails_sent_today,
            _ => 0,
        }
    }

    fn apply_rollover(&mut self, now: DateTime<Utc>) {
        if let Some(last) = self.state.last_email_sent {
            if last.date_naive() != now.date_naive() && self.state.emails_sent_today != 0 {
                info!("new day detected - resetting email counter");
                self.state.emails_sent_today = 0;
            }
        }
    }

    /// Whether a delivery cycle may proceed at `now`. Refusal is normal
    /// control flow, not an error. Does not mutate state.
    pub fn can_send(&self, now: DateTime<Utc>) -> bool {
        let sent_today = self.effective_sent_today(now);
        if sent_today >= self.limits.max_emails_per_day {
            info!(
                sent_today,
                cap = self.limits.max_emails_per_day,
                "daily email limit reached; no more emails today"
            );
            return false;
        }

        if let Some(last) = self.state.last_email_sent {
            let since = now.signed_duration_since(last);
            if since < Duration::hours(self.limits.min_hours_between_emails) {
                let hours_since_last = since.num_minutes() as f64 / 60.0;
                info!(
                    hours_since_last,
                    min_hours = self.limits.min_hours_between_emails,
                    "too soon since last email; waiting"
                );
                return false;
            }
        }

        true
    }

    /// Record a completed delivery cycle at `now` and persist.
    pub fn record_send(&mut self, now: DateTime<Utc>) -> Result<()> {
        self.state.emails_sent_today = self.effective_sent_today(now) + 1;
        self.state.last_email_sent = Some(now);
        self.persist()
    }

    pub fn emails_sent_today(&self, now: DateTime<Utc>) -> u32 {
        self.effective_sent_today(now)
    }

    pub fn last_email_sent(&self) -> Option<DateTime<Utc>> {
        self.state.last_email_sent
    }

    fn persist(&self) -> Result<()> {
        write_json_atomic(&self.path, &self.state)
    }
}
