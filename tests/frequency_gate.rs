// tests/frequency_gate.rs
// The send gate across whole ticks: cooldown holds a fresh batch back, the
// daily cap binds even with no cooldown, and state survives "restarts"
// (every tick reloads from disk).

use std::sync::Mutex;

use anyhow::Result;
use internbot::config::AppConfig;
use internbot::notify::Mailer;
use internbot::sources::SourceAdapter;
use internbot::store::BatchStore;
use internbot::RawListing;
use tempfile::tempdir;

struct CountingMailer(Mutex<usize>);

#[async_trait::async_trait]
impl Mailer for CountingMailer {
    async fn send(&self, _to: &str, _subject: &str, _body: &str) -> Result<()> {
        *self.0.lock().expect("mailer mutex") += 1;
        Ok(())
    }
}

struct OneListingAdapter(String);

#[async_trait::async_trait]
impl SourceAdapter for OneListingAdapter {
    async fn scrape(&self) -> Result<Vec<RawListing>> {
        Ok(vec![RawListing {
            id: Some(self.0.clone()),
            title: format!("Python Intern {}", self.0),
            company: "Acme".to_string(),
            link: "https://example.test".to_string(),
            source: "stub".to_string(),
            posted_date: None,
            deadline: None,
        }])
    }
    fn name(&self) -> &'static str {
        "stub"
    }
}

fn adapter(id: &str) -> Vec<Box<dyn SourceAdapter>> {
    vec![Box::new(OneListingAdapter(id.to_string()))]
}

#[tokio::test]
async fn cooldown_holds_batch_until_a_later_tick() {
    let dir = tempdir().expect("tempdir");
    let mut cfg = AppConfig::for_data_dir(dir.path());
    cfg.subscribers = vec!["a@example.com".to_string()];

    let mailer = CountingMailer(Mutex::new(0));

    let first = internbot::run_tick(&cfg, &adapter("x1"), &mailer)
        .await
        .expect("tick 1");
    assert!(first.delivery.is_some());

    // Default 4h cooldown is hot: the new listing is collected but held.
    let second = internbot::run_tick(&cfg, &adapter("x2"), &mailer)
        .await
        .expect("tick 2");
    assert_eq!(second.collection.new_count, 1);
    assert!(second.gated);
    assert!(second.delivery.is_none());

    assert_eq!(*mailer.0.lock().expect("mailer mutex"), 1);
    assert_eq!(BatchStore::load(cfg.batch_path()).expect("batch").len(), 1);
}

#[tokio::test]
async fn daily_cap_gates_the_fourth_send() {
    let dir = tempdir().expect("tempdir");
    let mut cfg = AppConfig::for_data_dir(dir.path());
    cfg.subscribers = vec!["a@example.com".to_string()];
    cfg.min_hours_between_emails = 0;
    cfg.max_emails_per_day = 3;

    let mailer = CountingMailer(Mutex::new(0));

    for i in 0..3 {
        let outcome = internbot::run_tick(&cfg, &adapter(&format!("cap_{i}")), &mailer)
            .await
            .expect("tick");
        assert!(outcome.delivery.is_some(), "send {i} should pass the gate");
    }

    let fourth = internbot::run_tick(&cfg, &adapter("cap_3"), &mailer)
        .await
        .expect("tick 4");
    assert!(fourth.gated, "daily cap must hold the fourth digest");
    assert_eq!(*mailer.0.lock().expect("mailer mutex"), 3);
}
