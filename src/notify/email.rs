// src/notify/email.rs
//! SMTP transport for digest delivery, via lettre's async STARTTLS relay.

use anyhow::{Context, Result};
use lettre::message::{header, Mailbox, Message};
use lettre::transport::smtp::{authentication::Credentials, AsyncSmtpTransport};
use lettre::{AsyncTransport, Tokio1Executor};

use super::Mailer;
use crate::config::SmtpConfig;

pub struct SmtpMailer {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(cfg: &SmtpConfig) -> Result<Self> {
        let creds = Credentials::new(cfg.user.clone(), cfg.pass.clone());
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&cfg.host)
            .with_context(|| format!("invalid SMTP host {}", cfg.host))?
            .port(cfg.port)
            .credentials(creds)
            .build();

        let from = cfg
            .from
            .parse()
            .with_context(|| format!("invalid from address {}", cfg.from))?;

        Ok(Self { mailer, from })
    }
}

#[async_trait::async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        let to: Mailbox = to
            .parse()
            .with_context(|| format!("invalid recipient address {to}"))?;

        let msg = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(subject)
            .header(header::ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .context("build email")?;

        self.mailer.send(msg).await.context("send email")?;
        Ok(())
    }
}
