//! Offline blog generation with the template generator.

use moonstone_admin::content::{TOPICS, TemplateGenerator, next_topic, save_post, topic_by_number};
use moonstone_db::{BlogPostRepository, CrystalRepository};

use super::{CliError, connect};

/// Generate and save one post.
pub async fn generate(topic: Option<usize>, publish: bool) -> Result<(), CliError> {
    let pool = connect().await?;

    let catalog = CrystalRepository::new(&pool).list_active().await?;
    let topic = match topic {
        Some(number) => topic_by_number(number).ok_or(CliError::UnknownTopic {
            number,
            count: TOPICS.len(),
        })?,
        None => {
            let slugs: Vec<String> = BlogPostRepository::new(&pool)
                .list_all()
                .await?
                .into_iter()
                .map(|p| p.slug)
                .collect();
            next_topic(&slugs)
        }
    };

    tracing::info!("Generating \"{}\"", topic.title);
    let generated = TemplateGenerator.generate(topic, &catalog);
    let post = save_post(&pool, generated, publish).await?;

    tracing::info!(
        "Saved post {} at /blog/{} ({})",
        post.id,
        post.slug,
        if post.is_published { "published" } else { "draft" }
    );
    Ok(())
}
