//! Storefront and admin logic over the seed catalog, without a database.

#![allow(clippy::unwrap_used)]

use chrono::Utc;

use moonstone_admin::content::{TOPICS, TemplateGenerator, find_topic};
use moonstone_admin::services::seo::{SeoIssue, audit};
use moonstone_core::{Money, ZodiacSign, is_valid_slug};
use moonstone_db::fixtures::sample_catalog;
use moonstone_db::models::BlogPost;
use moonstone_storefront::cart::{Cart, FLAT_SHIPPING_CENTS, FREE_SHIPPING_THRESHOLD_CENTS};
use moonstone_storefront::recommend::{DEFAULT_LIMIT, recommend};

fn as_blog_post(id: i32, generated: moonstone_admin::content::GeneratedPost) -> BlogPost {
    let now = Utc::now();
    BlogPost {
        id: moonstone_core::BlogPostId::new(id),
        title: generated.title,
        slug: generated.slug,
        excerpt: generated.excerpt,
        meta_description: Some(generated.meta_description),
        body_markdown: generated.body_markdown,
        image_url: generated.image_url,
        tags: generated.tags,
        source: generated.source.as_str().to_string(),
        is_published: true,
        published_at: Some(now),
        created_at: now,
        updated_at: now,
    }
}

#[test]
fn test_generated_posts_link_to_real_products() {
    let catalog = sample_catalog();
    for topic in TOPICS {
        let post = TemplateGenerator.generate(topic, &catalog);
        assert!(is_valid_slug(&post.slug), "{}", post.slug);

        for chunk in post.body_markdown.split("](/products/").skip(1) {
            let slug = chunk.split(')').next().unwrap();
            assert!(
                catalog.iter().any(|c| c.slug == slug),
                "{} links to missing product {slug}",
                topic.key
            );
        }
    }
}

#[test]
fn test_generated_posts_pass_content_checks() {
    let catalog = sample_catalog();
    let posts: Vec<BlogPost> = TOPICS
        .iter()
        .zip(1..)
        .map(|(topic, id)| as_blog_post(id, TemplateGenerator.generate(topic, &catalog)))
        .collect();

    let report = audit(&[], &posts, "https://moonstone.shop");
    assert_eq!(report.pages_audited, TOPICS.len());
    for page in &report.pages {
        for issue in &page.issues {
            assert!(
                !matches!(
                    issue,
                    SeoIssue::ThinContent { .. }
                        | SeoIssue::InvalidSlug
                        | SeoIssue::MissingMetaDescription
                        | SeoIssue::DuplicateTitle { .. }
                ),
                "{}: {}",
                page.slug,
                issue.message()
            );
        }
    }
}

#[test]
fn test_zodiac_guide_matches_recommender() {
    let catalog = sample_catalog();
    let topic = find_topic("pisces-crystals").unwrap();
    let post = TemplateGenerator.generate(topic, &catalog);

    let recommended = recommend(&catalog, ZodiacSign::Pisces, None, DEFAULT_LIMIT);
    assert!(!recommended.is_empty());
    // Every crystal the guide features is one the recommender would offer a Pisces
    for chunk in post.body_markdown.split("](/products/").skip(1) {
        let slug = chunk.split(')').next().unwrap();
        let crystal = catalog.iter().find(|c| c.slug == slug).unwrap();
        assert!(crystal.has_sign(ZodiacSign::Pisces), "{slug}");
    }
}

#[test]
fn test_cart_from_recommendations() {
    let catalog = sample_catalog();
    let picks = recommend(&catalog, ZodiacSign::Leo, None, DEFAULT_LIMIT);
    let pick = &picks
        .iter()
        .find(|r| r.crystal.stock_quantity > 0)
        .unwrap()
        .crystal;

    let mut cart = Cart::default();
    cart.add(pick, 1).unwrap();
    let priced = cart.priced(&catalog);

    assert_eq!(priced.item_count(), 1);
    assert_eq!(priced.subtotal, pick.price);
    if pick.price < Money::from_cents(FREE_SHIPPING_THRESHOLD_CENTS) {
        assert_eq!(priced.shipping, Money::from_cents(FLAT_SHIPPING_CENTS));
    }
    assert_eq!(priced.total, priced.subtotal + priced.shipping);
}

#[test]
fn test_catalog_seo_urls_point_at_storefront() {
    let catalog = sample_catalog();
    let report = audit(&catalog, &[], "https://moonstone.shop/");
    for page in &report.pages {
        assert_eq!(
            page.url,
            format!("https://moonstone.shop/products/{}", page.slug)
        );
    }
}
