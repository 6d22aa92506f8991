//! SEO report over the catalog and the blog.
//!
//! Every crystal and blog post becomes a [`PageAudit`] listing its issues.
//! A page scores 100 minus 10 per issue (never below zero); the report
//! score is the mean over all pages.

use std::collections::HashMap;
use std::ops::RangeInclusive;

use serde::Serialize;

use moonstone_core::is_valid_slug;
use moonstone_db::models::{BlogPost, Crystal};

/// Recommended `<title>` length.
pub const TITLE_LENGTH: RangeInclusive<usize> = 30..=60;
/// Recommended meta description length.
pub const META_DESCRIPTION_LENGTH: RangeInclusive<usize> = 120..=160;
/// Blog posts shorter than this are thin content.
pub const MIN_POST_WORDS: usize = 300;
/// Product descriptions shorter than this are thin content.
pub const MIN_PRODUCT_WORDS: usize = 50;

const POINTS_PER_ISSUE: u32 = 10;

/// A single finding on a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum SeoIssue {
    TitleLength { length: usize },
    MissingMetaDescription,
    MetaDescriptionLength { length: usize },
    ThinContent { words: usize, minimum: usize },
    DuplicateTitle { title: String },
    InvalidSlug,
    MissingImage,
}

impl SeoIssue {
    /// Human readable description.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::TitleLength { length } => format!(
                "Title is {length} characters (aim for {}-{})",
                TITLE_LENGTH.start(),
                TITLE_LENGTH.end()
            ),
            Self::MissingMetaDescription => "Meta description is missing".to_string(),
            Self::MetaDescriptionLength { length } => format!(
                "Meta description is {length} characters (aim for {}-{})",
                META_DESCRIPTION_LENGTH.start(),
                META_DESCRIPTION_LENGTH.end()
            ),
            Self::ThinContent { words, minimum } => {
                format!("Only {words} words of content (minimum {minimum})")
            }
            Self::DuplicateTitle { title } => format!("Title \"{title}\" is used more than once"),
            Self::InvalidSlug => "Slug should be lowercase words joined by hyphens".to_string(),
            Self::MissingImage => "No image".to_string(),
        }
    }
}

/// Kind of page audited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PageKind {
    Product,
    BlogPost,
}

/// Audit of one page.
#[derive(Debug, Clone, Serialize)]
pub struct PageAudit {
    pub kind: PageKind,
    pub title: String,
    pub slug: String,
    pub url: String,
    pub score: u32,
    pub issues: Vec<SeoIssue>,
}

/// Full SEO report.
#[derive(Debug, Clone, Serialize)]
pub struct SeoReport {
    /// Mean page score, 100 when there are no pages.
    pub overall_score: u32,
    pub pages_audited: usize,
    pub total_issues: usize,
    pub pages: Vec<PageAudit>,
}

/// Fields the checks look at, common to products and posts.
struct PageFacts<'a> {
    kind: PageKind,
    title: &'a str,
    slug: &'a str,
    meta_description: Option<&'a str>,
    words: usize,
    has_image: bool,
}

impl<'a> PageFacts<'a> {
    fn product(crystal: &'a Crystal) -> Self {
        Self {
            kind: PageKind::Product,
            title: crystal.seo_title(),
            slug: &crystal.slug,
            meta_description: crystal.meta_description.as_deref(),
            words: crystal.description.split_whitespace().count(),
            has_image: crystal.image_url.is_some(),
        }
    }

    fn post(post: &'a BlogPost) -> Self {
        Self {
            kind: PageKind::BlogPost,
            title: &post.title,
            slug: &post.slug,
            meta_description: post.meta_description.as_deref(),
            words: post.word_count(),
            has_image: post.image_url.is_some(),
        }
    }

    fn min_words(&self) -> usize {
        match self.kind {
            PageKind::Product => MIN_PRODUCT_WORDS,
            PageKind::BlogPost => MIN_POST_WORDS,
        }
    }

    fn url(&self, storefront_url: &str) -> String {
        let section = match self.kind {
            PageKind::Product => "products",
            PageKind::BlogPost => "blog",
        };
        format!("{storefront_url}/{section}/{}", self.slug)
    }
}

/// Issues for one page, not counting duplicates across pages.
fn page_issues(page: &PageFacts<'_>) -> Vec<SeoIssue> {
    let mut issues = Vec::new();

    let title_length = page.title.chars().count();
    if !TITLE_LENGTH.contains(&title_length) {
        issues.push(SeoIssue::TitleLength {
            length: title_length,
        });
    }

    match page.meta_description.map(str::trim).filter(|m| !m.is_empty()) {
        None => issues.push(SeoIssue::MissingMetaDescription),
        Some(meta) => {
            let length = meta.chars().count();
            if !META_DESCRIPTION_LENGTH.contains(&length) {
                issues.push(SeoIssue::MetaDescriptionLength { length });
            }
        }
    }

    if page.words < page.min_words() {
        issues.push(SeoIssue::ThinContent {
            words: page.words,
            minimum: page.min_words(),
        });
    }

    if !is_valid_slug(page.slug) {
        issues.push(SeoIssue::InvalidSlug);
    }

    if !page.has_image {
        issues.push(SeoIssue::MissingImage);
    }

    issues
}

/// Score for a page with `issue_count` issues.
#[must_use]
pub fn page_score(issue_count: usize) -> u32 {
    let penalty = u32::try_from(issue_count)
        .unwrap_or(u32::MAX)
        .saturating_mul(POINTS_PER_ISSUE);
    100_u32.saturating_sub(penalty)
}

/// Build the report for `crystals` and `posts`.
#[must_use]
pub fn audit(crystals: &[Crystal], posts: &[BlogPost], storefront_url: &str) -> SeoReport {
    let storefront_url = storefront_url.trim_end_matches('/');
    let facts: Vec<PageFacts<'_>> = crystals
        .iter()
        .map(PageFacts::product)
        .chain(posts.iter().map(PageFacts::post))
        .collect();

    let mut title_counts: HashMap<String, usize> = HashMap::new();
    for page in &facts {
        *title_counts
            .entry(page.title.trim().to_lowercase())
            .or_default() += 1;
    }

    let pages: Vec<PageAudit> = facts
        .iter()
        .map(|page| {
            let mut issues = page_issues(page);
            if title_counts
                .get(&page.title.trim().to_lowercase())
                .is_some_and(|count| *count > 1)
            {
                issues.push(SeoIssue::DuplicateTitle {
                    title: page.title.to_string(),
                });
            }
            PageAudit {
                kind: page.kind,
                title: page.title.to_string(),
                slug: page.slug.to_string(),
                url: page.url(storefront_url),
                score: page_score(issues.len()),
                issues,
            }
        })
        .collect();

    let total_issues = pages.iter().map(|p| p.issues.len()).sum();
    let overall_score = if pages.is_empty() {
        100
    } else {
        let sum: u64 = pages.iter().map(|p| u64::from(p.score)).sum();
        let count = u64::try_from(pages.len()).unwrap_or(u64::MAX);
        u32::try_from(sum / count).unwrap_or(100)
    };

    SeoReport {
        overall_score,
        pages_audited: pages.len(),
        total_issues,
        pages,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use moonstone_core::BlogPostId;
    use moonstone_db::fixtures::sample_catalog;

    use super::*;

    fn post(title: &str, slug: &str, words: usize) -> BlogPost {
        BlogPost {
            id: BlogPostId::new(1),
            title: title.to_string(),
            slug: slug.to_string(),
            excerpt: String::new(),
            meta_description: Some("m".repeat(140)),
            body_markdown: vec!["moon"; words].join(" "),
            image_url: Some("/static/images/blog/moon.jpg".to_string()),
            tags: vec![],
            source: "manual".to_string(),
            is_published: true,
            published_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_page_score() {
        assert_eq!(page_score(0), 100);
        assert_eq!(page_score(3), 70);
        assert_eq!(page_score(10), 0);
        assert_eq!(page_score(14), 0);
    }

    #[test]
    fn test_clean_post_scores_full_marks() {
        let report = audit(
            &[],
            &[post("Working With Amethyst for Deeper Sleep", "amethyst-sleep", 320)],
            "https://moonstone.shop",
        );
        assert_eq!(report.pages_audited, 1);
        assert_eq!(report.total_issues, 0);
        assert_eq!(report.overall_score, 100);
        assert_eq!(report.pages[0].url, "https://moonstone.shop/blog/amethyst-sleep");
    }

    #[test]
    fn test_post_issues() {
        let mut bad = post("Moon", "Moon_Notes", 120);
        bad.meta_description = None;
        bad.image_url = None;
        let report = audit(&[], &[bad], "https://moonstone.shop");
        let issues = &report.pages[0].issues;

        assert!(issues.contains(&SeoIssue::TitleLength { length: 4 }));
        assert!(issues.contains(&SeoIssue::MissingMetaDescription));
        assert!(issues.contains(&SeoIssue::ThinContent {
            words: 120,
            minimum: MIN_POST_WORDS
        }));
        assert!(issues.contains(&SeoIssue::InvalidSlug));
        assert!(issues.contains(&SeoIssue::MissingImage));
        assert_eq!(report.pages[0].score, 50);
    }

    #[test]
    fn test_duplicate_titles_flag_both_pages() {
        let title = "A Beginner's Guide to Crystal Grids";
        let report = audit(
            &[],
            &[post(title, "crystal-grids", 400), post(title, "crystal-grids-2", 400)],
            "https://moonstone.shop",
        );
        assert!(report.pages.iter().all(|p| p
            .issues
            .contains(&SeoIssue::DuplicateTitle {
                title: title.to_string()
            })));
        assert_eq!(report.overall_score, 90);
    }

    #[test]
    fn test_products_use_lower_word_minimum() {
        let catalog = sample_catalog();
        let report = audit(&catalog, &[], "https://moonstone.shop");
        assert_eq!(report.pages_audited, catalog.len());
        assert!(report.pages.iter().all(|p| p.kind == PageKind::Product));
        for page in &report.pages {
            for issue in &page.issues {
                if let SeoIssue::ThinContent { minimum, .. } = issue {
                    assert_eq!(*minimum, MIN_PRODUCT_WORDS);
                }
            }
        }
    }

    #[test]
    fn test_empty_report() {
        let report = audit(&[], &[], "https://moonstone.shop");
        assert_eq!(report.overall_score, 100);
        assert_eq!(report.total_issues, 0);
    }

    #[test]
    fn test_issue_serializes_with_code() {
        let json = serde_json::to_value(SeoIssue::TitleLength { length: 4 }).unwrap();
        assert_eq!(json["code"], "title_length");
        assert_eq!(json["length"], 4);
    }
}
