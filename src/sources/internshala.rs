// src/sources/internshala.rs
//! Internshala adapter: CSS-selector extraction over the public listing
//! pages. Fixture mode feeds tests; HTTP mode fetches the live category
//! pages.

use anyhow::{Context, Result};
use async_trait::async_trait;
use scraper::{Html, Selector};

use crate::listing::RawListing;
use crate::relevance::RelevanceFilter;
use crate::sources::{clean_fragment, extract_deadline_phrase, extract_posted_phrase, SourceAdapter};

const SOURCE: &str = "internshala";
const BASE_URL: &str = "https://internshala.com";

/// Category pages scanned in HTTP mode, most specific first.
const CATEGORY_URLS: &[&str] = &[
    "https://internshala.com/internships/computer-science",
    "https://internshala.com/internships/web-development",
    "https://internshala.com/internships/software-development",
    "https://internshala.com/internships/data-science",
    "https://internshala.com/internships/machine-learning",
    "https://internshala.com/internships/ui-ux-design",
    "https://internshala.com/internships/business-development",
];

pub struct InternshalaAdapter {
    mode: Mode,
    filter: RelevanceFilter,
}

enum Mode {
    Fixture(String),
    Http { client: reqwest::Client },
}

impl InternshalaAdapter {
    pub fn from_fixture_str(html: &str, filter: RelevanceFilter) -> Self {
        Self {
            mode: Mode::Fixture(html.to_string()),
            filter,
        }
    }

    pub fn from_http(client: reqwest::Client, filter: RelevanceFilter) -> Self {
        Self {
            mode: Mode::Http { client },
            filter,
        }
    }

    fn parse_listings(&self, html_text: &str) -> Vec<RawListing> {
        let document = Html::parse_document(html_text);
        let card_sel = Selector::parse(".individual_internship").expect("card selector");
        let title_sel = Selector::parse(".job-title-href").expect("title selector");
        let company_sel = Selector::parse(".company-name").expect("company selector");
        let link_sel = Selector::parse("a").expect("link selector");

        let mut out = Vec::new();
        for card in document.select(&card_sel) {
            let Some(title_el) = card.select(&title_sel).next() else {
                continue;
            };
            let title = clean_fragment(&title_el.text().collect::<String>());
            if title.is_empty() {
                continue;
            }

            let company = card
                .select(&company_sel)
                .next()
                .map(|el| clean_fragment(&el.text().collect::<String>()))
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| "Unknown Company".to_string());

            if RelevanceFilter::is_excluded_seniority(&title) {
                continue;
            }
            if !self.filter.is_relevant(&title, &company) {
                continue;
            }

            let link = card
                .select(&link_sel)
                .next()
                .and_then(|a| a.value().attr("href"))
                .map(|href| {
                    if href.starts_with("http") {
                        href.to_string()
                    } else {
                        format!("{BASE_URL}{href}")
                    }
                })
                .unwrap_or_else(|| BASE_URL.to_string());

            // Card id attribute when present, e.g. internship_12345.
            let id = card
                .value()
                .attr("internshipid")
                .or_else(|| card.value().attr("data-internship-id"))
                .map(|raw| format!("{SOURCE}_{raw}"));

            let card_text = clean_fragment(&card.text().collect::<String>());

            out.push(RawListing {
                id,
                title,
                company,
                link,
                source: SOURCE.to_string(),
                posted_date: extract_posted_phrase(&card_text),
                deadline: extract_deadline_phrase(&card_text),
            });
        }
        out
    }
}

#[async_trait]
impl SourceAdapter for InternshalaAdapter {
    async fn scrape(&self) -> Result<Vec<RawListing>> {
        match &self.mode {
            Mode::Fixture(html) => Ok(self.parse_listings(html)),
            Mode::Http { client } => {
                let mut out = Vec::new();
                for url in CATEGORY_URLS {
                    let body = client
                        .get(*url)
                        .send()
                        .await
                        .with_context(|| format!("internshala get {url}"))?
                        .text()
                        .await
                        .with_context(|| format!("internshala body {url}"))?;
                    out.extend(self.parse_listings(&body));
                }
                Ok(out)
            }
        }
    }

    fn name(&self) -> &'static str {
        SOURCE
    }
}
