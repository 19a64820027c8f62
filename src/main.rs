//! InternBot — Binary Entrypoint
//! Long-running frequency-controlled scheduler: every interval, run one
//! collect-then-maybe-deliver tick. External cron/workflow setups can run
//! the binary once per trigger instead; each invocation performs at least
//! the initial tick.

use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use internbot::config::AppConfig;
use internbot::notify::email::SmtpMailer;
use internbot::relevance::RelevanceFilter;
use internbot::sources::{internshala::InternshalaAdapter, timesjobs::TimesJobsAdapter, SourceAdapter};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

fn build_adapters(filter: &RelevanceFilter) -> Result<Vec<Box<dyn SourceAdapter>>> {
    let client = reqwest::Client::builder()
        .user_agent("Mozilla/5.0 (compatible; internbot/0.1)")
        .timeout(Duration::from_secs(20))
        .build()
        .context("building http client")?;

    Ok(vec![
        Box::new(InternshalaAdapter::from_http(client.clone(), filter.clone())),
        Box::new(TimesJobsAdapter::from_http(client, filter.clone())),
    ])
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op when absent. Enables SMTP_USER/SMTP_PASS
    // and INTERNBOT_CONFIG_PATH before config load.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = AppConfig::load().context("loading configuration")?;
    info!(
        subscribers = cfg.subscribers.len(),
        interval_secs = cfg.check_interval_secs,
        max_per_day = cfg.max_emails_per_day,
        "starting internbot scheduler"
    );

    let filter = cfg.relevance_filter();
    let adapters = build_adapters(&filter)?;
    let mailer = SmtpMailer::new(&cfg.smtp).context("building smtp mailer")?;

    let mut ticker = tokio::time::interval(Duration::from_secs(cfg.check_interval_secs.max(60)));
    loop {
        ticker.tick().await;
        match internbot::run_tick(&cfg, &adapters, &mailer).await {
            Ok(outcome) => {
                if let Some(report) = &outcome.delivery {
                    info!(
                        new = outcome.collection.new_count,
                        sent = report.sent.len(),
                        failed = report.failed.len(),
                        "tick completed with delivery"
                    );
                } else {
                    info!(
                        new = outcome.collection.new_count,
                        gated = outcome.gated,
                        "tick completed without delivery"
                    );
                }
            }
            // A failed tick (persistence error) is logged; the loop retries
            // from the last good state at the next interval.
            Err(e) => error!(error = ?e, "tick failed"),
        }
    }
}
