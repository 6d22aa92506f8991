//! Markdown content: static pages from disk and blog post rendering.
//!
//! Static pages (about, shipping, crystal care...) live in
//! `content/pages/*.md` with YAML front matter and are loaded once at
//! startup. Blog posts come from the database; this module only renders
//! their markdown.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use chrono::NaiveDate;
use comrak::{Options, markdown_to_html};
use gray_matter::{Matter, ParsedEntity, engine::YAML};
use serde::Deserialize;

/// Average reading speed used for reading time estimates.
pub const WORDS_PER_MINUTE: usize = 200;

/// Front matter for static pages.
#[derive(Debug, Clone, Deserialize)]
pub struct PageMeta {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub updated_at: Option<NaiveDate>,
}

/// A rendered static page.
#[derive(Debug, Clone)]
pub struct Page {
    pub slug: String,
    pub meta: PageMeta,
    pub content_html: String,
}

/// Static pages held in memory.
#[derive(Debug, Clone, Default)]
pub struct ContentStore {
    pages: Arc<HashMap<String, Page>>,
}

impl ContentStore {
    /// Load all pages under `content_dir/pages`.
    ///
    /// A missing directory yields an empty store. Files that fail to parse
    /// are logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory exists but cannot be read.
    pub fn load(content_dir: &Path) -> Result<Self, ContentError> {
        let dir = content_dir.join("pages");
        let mut pages = HashMap::new();

        if !dir.exists() {
            tracing::warn!("Pages directory does not exist: {:?}", dir);
            return Ok(Self::default());
        }

        let entries = std::fs::read_dir(&dir).map_err(|e| ContentError::Io(e.to_string()))?;
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "md") {
                match load_page(&path) {
                    Ok(page) => {
                        tracing::info!("Loaded page: {}", page.slug);
                        pages.insert(page.slug.clone(), page);
                    }
                    Err(e) => tracing::error!("Failed to load page {:?}: {}", path, e),
                }
            }
        }

        Ok(Self {
            pages: Arc::new(pages),
        })
    }

    /// Build a store from in-memory markdown documents keyed by slug.
    ///
    /// # Errors
    ///
    /// Returns an error if any document lacks valid front matter.
    pub fn from_documents<'a>(
        docs: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<Self, ContentError> {
        let pages = docs
            .into_iter()
            .map(|(slug, source)| parse_page(slug, source).map(|p| (p.slug.clone(), p)))
            .collect::<Result<HashMap<_, _>, _>>()?;
        Ok(Self {
            pages: Arc::new(pages),
        })
    }

    #[must_use]
    pub fn get_page(&self, slug: &str) -> Option<&Page> {
        self.pages.get(slug)
    }

    /// Pages sorted by title, for footers and sitemaps.
    #[must_use]
    pub fn all_pages(&self) -> Vec<&Page> {
        let mut pages: Vec<&Page> = self.pages.values().collect();
        pages.sort_by(|a, b| a.meta.title.cmp(&b.meta.title));
        pages
    }
}

fn load_page(path: &Path) -> Result<Page, ContentError> {
    let source = std::fs::read_to_string(path).map_err(|e| ContentError::Io(e.to_string()))?;
    let slug = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| ContentError::Parse("Invalid filename".to_string()))?;
    parse_page(slug, &source)
}

fn parse_page(slug: &str, source: &str) -> Result<Page, ContentError> {
    let matter = Matter::<YAML>::new();
    let parsed: ParsedEntity<PageMeta> = matter
        .parse(source)
        .map_err(|e| ContentError::Parse(format!("Failed to parse frontmatter: {e}")))?;
    let meta = parsed
        .data
        .ok_or_else(|| ContentError::Parse("Missing frontmatter".to_string()))?;

    Ok(Page {
        slug: slug.to_string(),
        meta,
        content_html: render_markdown(&parsed.content),
    })
}

/// Render markdown to HTML with GitHub Flavored Markdown extensions.
///
/// Raw HTML in the source is escaped; blog bodies may come from an LLM.
#[must_use]
pub fn render_markdown(content: &str) -> String {
    let mut options = Options::default();

    options.extension.strikethrough = true;
    options.extension.table = true;
    options.extension.autolink = true;
    options.extension.tasklist = true;
    options.extension.header_ids = Some(String::new());
    options.extension.footnotes = true;

    markdown_to_html(content, &options)
}

/// Estimated reading time in whole minutes, never less than one.
#[must_use]
pub fn reading_time_minutes(word_count: usize) -> u32 {
    let minutes = word_count.div_ceil(WORDS_PER_MINUTE).max(1);
    u32::try_from(minutes).unwrap_or(u32::MAX)
}

/// Content loading errors
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Parse error: {0}")]
    Parse(String),
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_reading_time() {
        assert_eq!(reading_time_minutes(0), 1);
        assert_eq!(reading_time_minutes(200), 1);
        assert_eq!(reading_time_minutes(201), 2);
        assert_eq!(reading_time_minutes(1000), 5);
    }

    #[test]
    fn test_render_markdown_escapes_raw_html() {
        let html = render_markdown("# Hi\n\n<script>alert(1)</script>");
        assert!(html.contains("<h1>"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_parse_page_front_matter() {
        let store = ContentStore::from_documents([(
            "shipping",
            "---\ntitle: Shipping\ndescription: How we ship\n---\n\nWe ship **fast**.\n",
        )])
        .unwrap();

        let page = store.get_page("shipping").unwrap();
        assert_eq!(page.meta.title, "Shipping");
        assert_eq!(page.meta.description.as_deref(), Some("How we ship"));
        assert!(page.content_html.contains("<strong>fast</strong>"));
    }

    #[test]
    fn test_page_without_front_matter_rejected() {
        assert!(ContentStore::from_documents([("bare", "just text")]).is_err());
    }
}
