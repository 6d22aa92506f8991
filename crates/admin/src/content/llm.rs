//! Claude-backed post writer with template fallback.

use std::fmt::Write as _;

use moonstone_core::slugify;
use moonstone_db::models::Crystal;

use crate::claude::{ClaudeClient, ClaudeError};

use super::template::TemplateGenerator;
use super::topics::Topic;
use super::{GeneratedPost, PostSource, excerpt_for, meta_description_for};

/// System prompt for blog generation.
pub const SYSTEM_PROMPT: &str = "You write the journal for Moonstone, a small online crystal shop. \
Write warm, grounded, practical posts of 500 to 800 words in Markdown. \
Start with a single line `# Title` (30 to 60 characters), then the body. \
Use `##` section headings. Only mention crystals from the facts you are given, \
link each one as [Name](/products/slug), and never make medical claims.";

/// Writes posts with Claude, falling back to [`TemplateGenerator`].
#[derive(Clone, Default)]
pub struct LlmGenerator {
    client: Option<ClaudeClient>,
    fallback: TemplateGenerator,
}

impl LlmGenerator {
    /// Generator using `client`, or templates only when `None`.
    #[must_use]
    pub fn new(client: Option<ClaudeClient>) -> Self {
        Self {
            client,
            fallback: TemplateGenerator,
        }
    }

    /// Write a post. Never fails: any Claude error is logged and the
    /// template post is returned instead, with `source = template`.
    pub async fn generate(&self, topic: &Topic, catalog: &[Crystal]) -> GeneratedPost {
        let Some(client) = &self.client else {
            return self.fallback.generate(topic, catalog);
        };

        match self.try_generate(client, topic, catalog).await {
            Ok(post) => post,
            Err(e) => {
                tracing::warn!(topic = topic.key, error = %e, "LLM generation failed, using template");
                self.fallback.generate(topic, catalog)
            }
        }
    }

    /// Write a post with Claude only.
    ///
    /// # Errors
    ///
    /// Returns `ClaudeError` if the call fails or the reply has no
    /// `# Title` line followed by a body.
    pub async fn try_generate(
        &self,
        client: &ClaudeClient,
        topic: &Topic,
        catalog: &[Crystal],
    ) -> Result<GeneratedPost, ClaudeError> {
        let featured = topic.select(catalog);
        let reply = client
            .complete(SYSTEM_PROMPT, &build_prompt(topic, &featured))
            .await?;
        let (title, body_markdown) = parse_reply(&reply).ok_or(ClaudeError::MissingTitle)?;

        let excerpt = excerpt_for(&body_markdown);
        let meta_description = meta_description_for(&excerpt);

        Ok(GeneratedPost {
            slug: post_slug(&title, topic),
            title,
            excerpt,
            meta_description,
            body_markdown,
            tags: topic.tags.iter().map(|t| (*t).to_string()).collect(),
            source: PostSource::Llm,
            image_url: featured.first().and_then(|c| c.image_url.clone()),
        })
    }
}

/// User prompt: the topic and the facts for each featured crystal.
#[must_use]
pub fn build_prompt(topic: &Topic, featured: &[&Crystal]) -> String {
    let mut prompt = format!(
        "Write a journal post titled roughly \"{}\" about {}.\n\nCrystal facts:\n",
        topic.title,
        topic.subject_label()
    );
    for crystal in featured {
        let signs: Vec<String> = crystal
            .zodiac_signs
            .iter()
            .map(|s| s.display_name())
            .collect();
        let _ = writeln!(
            prompt,
            "- {} (slug: {}, {}): {} Properties: {}. Chakras: {}. Signs: {}.",
            crystal.name,
            crystal.slug,
            crystal.price.display(),
            crystal.description,
            crystal.properties.join(", "),
            crystal.chakras.join(", "),
            signs.join(", "),
        );
    }
    prompt
}

/// Slug for a generated title. Titles with nothing to slugify (e.g. written
/// entirely in another script) take the topic's slug.
#[must_use]
pub fn post_slug(title: &str, topic: &Topic) -> String {
    let slug = slugify(title);
    if slug.is_empty() {
        slugify(topic.title)
    } else {
        slug
    }
}

/// Split a reply into title and body.
///
/// The first non-blank line must be `# Title`; the rest, trimmed, is the
/// body. Returns `None` if either part is empty.
#[must_use]
pub fn parse_reply(reply: &str) -> Option<(String, String)> {
    let reply = reply.trim_start();
    let (first, rest) = reply.split_once('\n').unwrap_or((reply, ""));
    let title = first.trim().strip_prefix("# ")?.trim();
    let body = rest.trim();
    if title.is_empty() || body.is_empty() {
        return None;
    }
    Some((title.to_string(), format!("{body}\n")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use moonstone_db::fixtures::sample_catalog;

    use super::super::topics::find_topic;
    use super::*;

    #[test]
    fn test_parse_reply() {
        let (title, body) =
            parse_reply("\n# Amethyst for Restful Sleep\n\nAmethyst is calm.\n\n## Use\n").unwrap();
        assert_eq!(title, "Amethyst for Restful Sleep");
        assert_eq!(body, "Amethyst is calm.\n\n## Use\n");
    }

    #[test]
    fn test_parse_reply_requires_heading_and_body() {
        assert!(parse_reply("Amethyst for Restful Sleep\n\nBody").is_none());
        assert!(parse_reply("## Subheading\n\nBody").is_none());
        assert!(parse_reply("# Title only").is_none());
        assert!(parse_reply("").is_none());
    }

    #[test]
    fn test_post_slug_from_title() {
        let topic = find_topic("root-chakra").unwrap();
        assert_eq!(
            post_slug("Grounding Stones for the Root Chakra", topic),
            "grounding-stones-for-the-root-chakra"
        );
    }

    #[test]
    fn test_post_slug_falls_back_to_topic() {
        let topic = find_topic("amethyst-spotlight").unwrap();
        let (title, _) = parse_reply("# 水晶と月の光\n\nアメジストは穏やかな石です。\n").unwrap();
        let slug = post_slug(&title, topic);
        assert_eq!(slug, slugify(topic.title));
        assert!(moonstone_core::is_valid_slug(&slug));
    }

    #[test]
    fn test_build_prompt_lists_facts() {
        let catalog = sample_catalog();
        let topic = find_topic("pisces-crystals").unwrap();
        let featured = topic.select(&catalog);
        let prompt = build_prompt(topic, &featured);
        assert!(prompt.contains("about Pisces"));
        assert!(prompt.contains("slug: amethyst-cluster"));
        assert_eq!(prompt.matches("\n- ").count(), featured.len());
    }

    #[tokio::test]
    async fn test_without_client_falls_back_to_template() {
        let catalog = sample_catalog();
        let topic = find_topic("root-chakra").unwrap();
        let post = LlmGenerator::new(None).generate(topic, &catalog).await;
        assert_eq!(post.source, PostSource::Template);
        assert_eq!(post.title, topic.title);
    }
}
