// src/config.rs
//! Process configuration: one explicit `AppConfig` loaded at startup and
//! passed into the engines. TOML file + env overrides for SMTP credentials;
//! no module-level mutable state.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

pub const DEFAULT_CONFIG_PATH: &str = "config/internbot.toml";
pub const ENV_CONFIG_PATH: &str = "INTERNBOT_CONFIG_PATH";

#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    #[serde(default = "default_smtp_host")]
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub pass: String,
    /// From-address; falls back to `user` when unset.
    #[serde(default)]
    pub from: String,
}

fn default_smtp_host() -> String {
    "smtp.gmail.com".to_string()
}

fn default_smtp_port() -> u16 {
    587
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: default_smtp_host(),
            port: default_smtp_port(),
            user: String::new(),
            pass: String::new(),
            from: String::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory holding the four JSON state files.
    pub data_dir: PathBuf,
    /// Configured subscriber emails (before unsubscribe filtering).
    pub subscribers: Vec<String>,
    pub smtp: SmtpConfig,
    pub max_emails_per_day: u32,
    pub min_hours_between_emails: i64,
    /// Listings older than this (days, from "posted X ago" text) are dropped.
    pub stale_after_days: u32,
    /// Tick cadence for the long-running loop, in seconds.
    pub check_interval_secs: u64,
    /// Optional override of the relevance keyword allow-list.
    pub keywords: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            subscribers: Vec::new(),
            smtp: SmtpConfig::default(),
            max_emails_per_day: 3,
            min_hours_between_emails: 4,
            stale_after_days: crate::relevance::DEFAULT_MAX_AGE_DAYS,
            check_interval_secs: 5 * 3600,
            keywords: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Load from `$INTERNBOT_CONFIG_PATH` or the default path; a missing
    /// file yields defaults. SMTP credentials are then overridden from
    /// `SMTP_USER`/`SMTP_PASS` (call after `dotenvy::dotenv()`).
    pub fn load() -> Result<Self> {
        let path = std::env::var(ENV_CONFIG_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));

        let mut cfg = if path.exists() {
            Self::from_path(&path)?
        } else {
            Self::default()
        };
        cfg.apply_env_overrides();
        Ok(cfg)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let cfg: Self = toml::from_str(s).context("parsing config TOML")?;
        Ok(cfg)
    }

    /// Test/embedding helper: defaults with all state rooted at `dir`.
    pub fn for_data_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: dir.into(),
            ..Self::default()
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(user) = std::env::var("SMTP_USER") {
            self.smtp.user = user;
        }
        if let Ok(pass) = std::env::var("SMTP_PASS") {
            self.smtp.pass = pass;
        }
        if self.smtp.from.is_empty() {
            self.smtp.from = self.smtp.user.clone();
        }
    }

    pub fn seen_path(&self) -> PathBuf {
        self.data_dir.join("seen.json")
    }

    pub fn batch_path(&self) -> PathBuf {
        self.data_dir.join("batch.json")
    }

    pub fn scheduler_state_path(&self) -> PathBuf {
        self.data_dir.join("scheduler_state.json")
    }

    pub fn unsubscribed_path(&self) -> PathBuf {
        self.data_dir.join("unsubscribed_emails.json")
    }

    pub fn send_limits(&self) -> crate::scheduler::SendLimits {
        crate::scheduler::SendLimits {
            max_emails_per_day: self.max_emails_per_day,
            min_hours_between_emails: self.min_hours_between_emails,
        }
    }

    pub fn relevance_filter(&self) -> crate::relevance::RelevanceFilter {
        if self.keywords.is_empty() {
            crate::relevance::RelevanceFilter::default()
        } else {
            crate::relevance::RelevanceFilter::new(self.keywords.clone())
        }
    }
}
