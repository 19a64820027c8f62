// src/notify/mod.rs
pub mod email;

use anyhow::Result;

use crate::listing::{Listing, UNSPECIFIED};

/// Outcome of one delivery cycle, for operator-facing logs/status.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub sent: Vec<String>,
    pub failed: Vec<(String, String)>,
}

impl DeliveryReport {
    pub fn attempted(&self) -> usize {
        self.sent.len() + self.failed.len()
    }
}

/// Transport seam: one message to one recipient. Implemented by the SMTP
/// mailer in production and by mocks in tests. The transport supplies its
/// own timeout; a timeout surfaces as an ordinary send error.
#[async_trait::async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()>;
}

/// Compose the digest for a batch: subject plus a body with entries grouped
/// by source (stable order = first appearance in the batch), numbered
/// continuously, with optional posted/deadline metadata per entry.
pub fn compose_digest(batch: &[Listing]) -> (String, String) {
    let subject = format!(
        "New Internship Alert - {} Fresh Opportunities!",
        batch.len()
    );

    // Group by source preserving first-appearance order.
    let mut source_order: Vec<&str> = Vec::new();
    for l in batch {
        if !source_order.contains(&l.source.as_str()) {
            source_order.push(&l.source);
        }
    }

    let mut listing_block = String::new();
    let mut counter = 1usize;
    for source in &source_order {
        listing_block.push_str(&format!("\n{}:\n", source.to_uppercase()));
        for l in batch.iter().filter(|l| l.source == *source) {
            listing_block.push_str(&format!("{}. {} at {}\n", counter, l.title, l.company));

            if l.posted_date != UNSPECIFIED || l.deadline != UNSPECIFIED {
                listing_block.push_str(&format!("   Posted: {}", l.posted_date));
                if l.deadline != UNSPECIFIED {
                    listing_block.push_str(&format!(" | Deadline: {}", l.deadline));
                }
                listing_block.push('\n');
            }

            listing_block.push_str(&format!("   Apply here: {}\n\n", l.link));
            counter += 1;
        }
    }

    let body = format!(
        "Internship Alert\n\n\
         Hi,\n\n\
         Great news! We have discovered {total} new internship opportunities that match your interests.\n\
         {listings}\n\
         Best of luck with your applications!\n\n\
         ---\n\
         InternBot | Automated & Spam-Free\n\
         ---\n\
         Manage your subscription:\n\
         - To unsubscribe from these alerts, reply to this email with \"UNSUBSCRIBE\" in the subject line.\n\
         - To resubscribe later, reply with \"RESUBSCRIBE\".\n\n\
         Your email privacy is protected - we never share it.\n",
        total = batch.len(),
        listings = listing_block
    );

    (subject, body)
}
