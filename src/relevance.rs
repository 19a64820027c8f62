// src/relevance.rs
//! Relevance gate for scraped listings: keyword allow-list over
//! `(title, company)` plus the free-text staleness check. Pure, no I/O.

use once_cell::sync::OnceCell;
use regex::Regex;

/// Listings older than this many days are dropped at collection time.
pub const DEFAULT_MAX_AGE_DAYS: u32 = 14;

/// Domain vocabulary matched as case-insensitive substrings across
/// `"{title} {company}"`. Mirrors the categories the bot was built for:
/// software, AI/ML & data, design, business, and the specialized non-tech
/// tracks.
pub const DEFAULT_KEYWORDS: &[&str] = &[
    // Software engineering
    "software engineer",
    "software developer",
    "programming",
    "coding",
    "python",
    "java",
    "javascript",
    "react",
    "node",
    "web development",
    "app development",
    "mobile app",
    "android",
    "ios",
    "flutter",
    "backend",
    "frontend",
    "fullstack",
    "devops",
    "cloud",
    "aws",
    "database",
    "sql",
    "api",
    "tech",
    "technology",
    "computer science",
    "cybersecurity",
    "blockchain",
    "qa",
    "testing",
    "automation",
    "docker",
    "kubernetes",
    "microservices",
    // AI/ML & data analytics
    "artificial intelligence",
    "machine learning",
    "deep learning",
    "neural network",
    "data science",
    "data analyst",
    "data analytics",
    "big data",
    "statistics",
    "business intelligence",
    "tableau",
    "power bi",
    "nlp",
    "computer vision",
    // UI/UX design
    "ui/ux",
    "ui designer",
    "ux designer",
    "user interface",
    "user experience",
    "graphic design",
    "web design",
    "figma",
    "wireframe",
    "prototype",
    // Business development
    "business development",
    "business analyst",
    "market research",
    "marketing",
    "product management",
    "product manager",
    "digital marketing",
    "growth hacking",
    // Specialized non-tech tracks
    "esg",
    "sustainability",
    "compliance",
    "environmental engineering",
    "renewable energy",
    "risk management",
    "audit",
    "finance",
    "consulting",
    "research",
    "policy",
];

/// Titles carrying these markers are not internships; adapters reject them
/// before the allow-list runs.
pub const SENIORITY_EXCLUDES: &[&str] = &[
    "senior", "sr.", "director", "head of", "principal", "vp ", "vice president",
];

/// Keyword-based relevance filter. Built once at startup from config (or the
/// embedded defaults) and shared by the adapters.
#[derive(Debug, Clone)]
pub struct RelevanceFilter {
    keywords: Vec<String>,
}

impl Default for RelevanceFilter {
    fn default() -> Self {
        Self::new(DEFAULT_KEYWORDS.iter().map(|s| s.to_string()).collect())
    }
}

impl RelevanceFilter {
    pub fn new(keywords: Vec<String>) -> Self {
        let keywords = keywords
            .into_iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        Self { keywords }
    }

    /// Case-insensitive substring match over title + company.
    pub fn is_relevant(&self, title: &str, company: &str) -> bool {
        let haystack = format!("{} {}", title, company).to_lowercase();
        self.keywords.iter().any(|k| haystack.contains(k.as_str()))
    }

    /// Seniority-based rejection applied by adapters before `is_relevant`.
    pub fn is_excluded_seniority(title: &str) -> bool {
        let t = title.to_lowercase();
        SENIORITY_EXCLUDES.iter().any(|m| t.contains(m))
    }
}

/// Whether a listing is older than `max_age_days`, judged from free-text
/// "posted X ago" strings. Unparseable, absent, or sentinel text passes
/// through — the permissive default avoids discarding listings on a parser
/// miss.
pub fn is_too_old(posted_date: &str, max_age_days: u32) -> bool {
    if posted_date.trim().is_empty() || posted_date == crate::listing::UNSPECIFIED {
        return false;
    }

    static RE_AGE: OnceCell<Regex> = OnceCell::new();
    let re = RE_AGE.get_or_init(|| {
        Regex::new(r"(?i)(\d+)\s+(day|week|month)s?\s+ago").expect("age regex")
    });

    let Some(caps) = re.captures(posted_date) else {
        return false;
    };
    let Ok(number) = caps[1].parse::<u32>() else {
        return false;
    };

    let days_old = match caps[2].to_lowercase().as_str() {
        "day" => number,
        "week" => number.saturating_mul(7),
        // Approximate; close enough for a 14-day cutoff.
        "month" => number.saturating_mul(30),
        _ => return false,
    };

    days_old > max_age_days
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relevant_by_title_keyword() {
        let f = RelevanceFilter::default();
        assert!(f.is_relevant("Machine Learning Intern", "Acme"));
        assert!(f.is_relevant("Frontend Developer Intern", ""));
        assert!(!f.is_relevant("Warehouse Assistant", "Logistics Co"));
    }

    #[test]
    fn relevant_by_company_keyword() {
        let f = RelevanceFilter::default();
        assert!(f.is_relevant("Intern", "CloudTech Solutions"));
    }

    #[test]
    fn custom_keyword_list_is_normalized() {
        let f = RelevanceFilter::new(vec![
            " Rust ".to_string(),
            String::new(),
            "embedded".to_string(),
        ]);
        assert!(f.is_relevant("Rust Intern", "X"));
        assert!(f.is_relevant("Embedded Systems Intern", "X"));
        assert!(!f.is_relevant("Python Intern", "X"));
    }

    #[test]
    fn seniority_markers_are_excluded() {
        assert!(RelevanceFilter::is_excluded_seniority("Senior Python Developer"));
        assert!(RelevanceFilter::is_excluded_seniority("Director of Engineering"));
        assert!(!RelevanceFilter::is_excluded_seniority("Python Intern"));
    }

    #[test]
    fn stale_threshold_is_fourteen_days() {
        assert!(is_too_old("20 days ago", DEFAULT_MAX_AGE_DAYS));
        assert!(!is_too_old("10 days ago", DEFAULT_MAX_AGE_DAYS));
        assert!(!is_too_old("14 days ago", DEFAULT_MAX_AGE_DAYS));
        assert!(is_too_old("15 days ago", DEFAULT_MAX_AGE_DAYS));
    }

    #[test]
    fn week_and_month_units_convert() {
        assert!(!is_too_old("2 weeks ago", DEFAULT_MAX_AGE_DAYS));
        assert!(is_too_old("3 weeks ago", DEFAULT_MAX_AGE_DAYS));
        assert!(is_too_old("1 month ago", DEFAULT_MAX_AGE_DAYS));
    }

    #[test]
    fn singular_units_and_case_are_accepted() {
        assert!(is_too_old("Posted 3 Weeks Ago", DEFAULT_MAX_AGE_DAYS));
        assert!(!is_too_old("1 day ago", DEFAULT_MAX_AGE_DAYS));
    }

    #[test]
    fn unparseable_text_is_permissive() {
        assert!(!is_too_old("Not specified", DEFAULT_MAX_AGE_DAYS));
        assert!(!is_too_old("", DEFAULT_MAX_AGE_DAYS));
        assert!(!is_too_old("recently", DEFAULT_MAX_AGE_DAYS));
        assert!(!is_too_old("2 hours ago", DEFAULT_MAX_AGE_DAYS));
    }
}
