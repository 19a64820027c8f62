// src/sources/timesjobs.rs
//! TimesJobs adapter. Same shape as the Internshala one; the board carries
//! no stable listing id, so ids are left to the collection engine's
//! content-hash fallback.

use anyhow::{Context, Result};
use async_trait::async_trait;
use scraper::{Html, Selector};

use crate::listing::RawListing;
use crate::relevance::RelevanceFilter;
use crate::sources::{clean_fragment, extract_posted_phrase, SourceAdapter};

const SOURCE: &str = "timesjobs";
const SEARCH_URL: &str =
    "https://www.timesjobs.com/candidate/job-search.html?searchType=personalizedSearch&txtKeywords=internship";

pub struct TimesJobsAdapter {
    mode: Mode,
    filter: RelevanceFilter,
}

enum Mode {
    Fixture(String),
    Http { client: reqwest::Client },
}

impl TimesJobsAdapter {
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
        let card_sel = Selector::parse("li.clearfix.job-bx").expect("card selector");
        let title_sel = Selector::parse("h2 a").expect("title selector");
        let company_sel = Selector::parse("h3.joblist-comp-name").expect("company selector");
        let posted_sel = Selector::parse("span.sim-posted").expect("posted selector");

        let mut out = Vec::new();
        for card in document.select(&card_sel) {
            let Some(title_el) = card.select(&title_sel).next() else {
                continue;
            };
            let title = clean_fragment(&title_el.text().collect::<String>());
            if title.is_empty() || RelevanceFilter::is_excluded_seniority(&title) {
                continue;
            }

            let company = card
                .select(&company_sel)
                .next()
                .map(|el| clean_fragment(&el.text().collect::<String>()))
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| "Unknown Company".to_string());

            if !self.filter.is_relevant(&title, &company) {
                continue;
            }

            let link = title_el
                .value()
                .attr("href")
                .map(str::to_string)
                .unwrap_or_else(|| SEARCH_URL.to_string());

            let posted_date = card
                .select(&posted_sel)
                .next()
                .map(|el| clean_fragment(&el.text().collect::<String>()))
                .and_then(|t| extract_posted_phrase(&t).or(Some(t)));

            out.push(RawListing {
                id: None,
                title,
                company,
                link,
                source: SOURCE.to_string(),
                posted_date,
                deadline: None,
            });
        }
        out
    }
}

#[async_trait]
impl SourceAdapter for TimesJobsAdapter {
    async fn scrape(&self) -> Result<Vec<RawListing>> {
        match &self.mode {
            Mode::Fixture(html) => Ok(self.parse_listings(html)),
            Mode::Http { client } => {
                let body = client
                    .get(SEARCH_URL)
                    .send()
                    .await
                    .context("timesjobs get")?
                    .text()
                    .await
                    .context("timesjobs body")?;
                Ok(self.parse_listings(&body))
            }
        }
    }

    fn name(&self) -> &'static str {
        SOURCE
    }
}
