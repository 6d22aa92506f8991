//! Blog post generation.
//!
//! Posts are written about one of the fixed [`TOPICS`] using facts from the
//! crystal catalog. [`TemplateGenerator`] fills in prose templates and never
//! fails; [`LlmGenerator`] asks Claude and falls back to the templates when
//! there is no API key or the call fails.

mod llm;
mod template;
mod topics;

pub use llm::{LlmGenerator, SYSTEM_PROMPT, build_prompt, parse_reply, post_slug};
pub use template::TemplateGenerator;
pub use topics::{
    TOPICS, Topic, TopicKind, TopicSubject, find_topic, next_topic, topic_by_number,
};

use serde::Serialize;
use sqlx::PgPool;

use moonstone_db::models::{BlogPost, NewBlogPost};
use moonstone_db::{BlogPostRepository, RepositoryError};

/// Longest meta description we generate.
const META_DESCRIPTION_MAX: usize = 160;
/// Longest excerpt we generate.
const EXCERPT_MAX: usize = 220;

/// Which generator wrote a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PostSource {
    Template,
    Llm,
}

impl PostSource {
    /// Value stored in `blog_post.source`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Template => "template",
            Self::Llm => "llm",
        }
    }
}

/// A generated, not yet saved, blog post.
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedPost {
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub meta_description: String,
    pub body_markdown: String,
    pub tags: Vec<String>,
    pub source: PostSource,
    /// Image of the lead crystal, if any.
    pub image_url: Option<String>,
}

impl GeneratedPost {
    /// Insertable row.
    #[must_use]
    pub fn into_new_post(self, publish: bool) -> NewBlogPost {
        NewBlogPost {
            title: self.title,
            slug: self.slug,
            excerpt: self.excerpt,
            meta_description: Some(self.meta_description),
            body_markdown: self.body_markdown,
            image_url: self.image_url,
            tags: self.tags,
            source: self.source.as_str().to_string(),
            publish,
        }
    }
}

/// Save `post`, suffixing `-2`, `-3`, ... to the slug while it is taken.
///
/// A slug claimed between the check and the insert counts as taken.
///
/// # Errors
///
/// Returns `RepositoryError` if a query fails.
pub async fn save_post(
    pool: &PgPool,
    post: GeneratedPost,
    publish: bool,
) -> Result<BlogPost, RepositoryError> {
    let posts = BlogPostRepository::new(pool);
    let mut new_post = post.into_new_post(publish);
    let base = new_post.slug.clone();
    let mut n = 1;

    let saved = loop {
        while posts.slug_exists(&new_post.slug).await? {
            n += 1;
            new_post.slug = format!("{base}-{n}");
        }
        match posts.create(&new_post).await {
            Ok(saved) => break saved,
            Err(RepositoryError::Conflict(_)) => {
                tracing::debug!(slug = %new_post.slug, "Slug taken concurrently, retrying");
                n += 1;
                new_post.slug = format!("{base}-{n}");
            }
            Err(err) => return Err(err),
        }
    };

    tracing::info!(
        post_id = %saved.id,
        slug = %saved.slug,
        source = %saved.source,
        published = saved.is_published,
        "Blog post saved"
    );
    Ok(saved)
}

/// Shorten `text` to at most `max` characters at a word boundary, adding an
/// ellipsis when anything was cut.
#[must_use]
pub fn clamp_text(text: &str, max: usize) -> String {
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if text.chars().count() <= max {
        return text;
    }

    let mut out = String::new();
    for word in text.split(' ') {
        // +1 for the space, +1 for the ellipsis
        if out.chars().count() + word.chars().count() + 2 > max {
            break;
        }
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    let trimmed = out.trim_end_matches([',', ';', ':', '.']);
    format!("{trimmed}…")
}

/// First prose paragraph of a markdown body, with inline markup removed.
#[must_use]
pub fn first_paragraph(markdown: &str) -> String {
    markdown
        .split("\n\n")
        .map(str::trim)
        .find(|p| {
            !p.is_empty()
                && !p.starts_with('#')
                && !p.starts_with('-')
                && !p.starts_with('*')
                && !p.starts_with('>')
                && !p.starts_with('|')
        })
        .map(|p| p.replace(['*', '_', '`'], ""))
        .map(|p| strip_links(&p))
        .unwrap_or_default()
}

/// `[text](url)` becomes `text`.
fn strip_links(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(open) = rest.find('[') {
        let Some(close) = rest[open..].find("](").map(|i| open + i) else {
            break;
        };
        let Some(end) = rest[close..].find(')').map(|i| close + i) else {
            break;
        };
        out.push_str(&rest[..open]);
        out.push_str(&rest[open + 1..close]);
        rest = &rest[end + 1..];
    }
    out.push_str(rest);
    out
}

/// Excerpt for listing pages.
#[must_use]
pub fn excerpt_for(body_markdown: &str) -> String {
    clamp_text(&first_paragraph(body_markdown), EXCERPT_MAX)
}

/// Meta description built from the excerpt.
#[must_use]
pub fn meta_description_for(excerpt: &str) -> String {
    clamp_text(excerpt, META_DESCRIPTION_MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_text_short_is_unchanged() {
        assert_eq!(clamp_text("  Calm   stones ", 60), "Calm stones");
    }

    #[test]
    fn test_clamp_text_cuts_at_word() {
        let clamped = clamp_text("Amethyst brings calm, clarity and restful sleep", 24);
        assert_eq!(clamped, "Amethyst brings calm…");
        assert!(clamped.chars().count() <= 24);
    }

    #[test]
    fn test_first_paragraph_skips_headings_and_lists() {
        let body = "# Title\n\n- a list\n\nAmethyst is *calm*. See [the shop](/products).\n\nMore.";
        assert_eq!(first_paragraph(body), "Amethyst is calm. See the shop.");
    }

    #[test]
    fn test_post_source_values() {
        assert_eq!(PostSource::Template.as_str(), "template");
        assert_eq!(PostSource::Llm.as_str(), "llm");
    }
}
