//! Repository behavior against `PostgreSQL`.
//!
//! These tests require `DATABASE_URL` pointing at a scratch database.
//! Run with: `cargo test -p moonstone-integration-tests -- --ignored`

#![allow(clippy::unwrap_used)]

use moonstone_admin::content::{TemplateGenerator, find_topic, save_post};
use moonstone_admin::services::DashboardStats;
use moonstone_admin::services::seo::audit;
use moonstone_core::{
    CampaignStatus, Email, Money, OrderStatus, PaymentStatus, UserRole, is_valid_slug, password,
};
use moonstone_db::models::{NewCampaign, NewOrder, NewOrderItem, SubscriberFilter};
use moonstone_db::{
    BlogPostRepository, CampaignRepository, CrystalRepository, LOW_STOCK_THRESHOLD,
    OrderRepository, RepositoryError, SubscriberRepository, UserRepository,
};
use moonstone_integration_tests::{test_pool, unique_email};

#[tokio::test]
#[ignore = "Requires DATABASE_URL"]
async fn test_order_lifecycle_rejects_skipped_steps() {
    let pool = test_pool().await;
    let crystal = CrystalRepository::new(&pool)
        .get_by_slug("amethyst-cluster")
        .await
        .unwrap()
        .unwrap();

    let orders = OrderRepository::new(&pool);
    let order = orders
        .create(&NewOrder {
            user_id: None,
            customer_email: unique_email("lifecycle"),
            customer_name: Some("Luna Test".to_string()),
            shipping_address: None,
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Succeeded,
            stripe_payment_intent_id: Some(format!("pi_{}", uuid::Uuid::new_v4().simple())),
            subtotal: crystal.price,
            shipping: Money::ZERO,
            total: crystal.price,
            items: vec![NewOrderItem {
                crystal_id: crystal.id,
                crystal_name: crystal.name.clone(),
                unit_price: crystal.price,
                quantity: 1,
            }],
        })
        .await
        .unwrap();

    // PENDING cannot jump to SHIPPED
    assert!(matches!(
        orders.update_status(order.id, OrderStatus::Shipped).await,
        Err(RepositoryError::Conflict(_))
    ));

    let processing = orders
        .update_status(order.id, OrderStatus::Processing)
        .await
        .unwrap();
    assert_eq!(processing.status, OrderStatus::Processing);

    let detail = orders.get_detail(order.id).await.unwrap().unwrap();
    assert_eq!(detail.items.len(), 1);
    assert_eq!(detail.items[0].crystal_id, crystal.id);
}

#[tokio::test]
#[ignore = "Requires DATABASE_URL"]
async fn test_stock_never_goes_negative() {
    let pool = test_pool().await;
    let repo = CrystalRepository::new(&pool);
    let crystal = repo.get_by_slug("selenite-wand").await.unwrap().unwrap();

    let too_many = -(crystal.stock_quantity + 1);
    assert!(matches!(
        repo.adjust_stock(crystal.id, too_many, "test").await,
        Err(RepositoryError::Conflict(_))
    ));

    let raised = repo.adjust_stock(crystal.id, 2, "test restock").await.unwrap();
    let restored = repo.adjust_stock(crystal.id, -2, "test undo").await.unwrap();
    assert_eq!(raised - 2, restored);
}

#[tokio::test]
#[ignore = "Requires DATABASE_URL"]
async fn test_subscribe_is_idempotent() {
    let pool = test_pool().await;
    let repo = SubscriberRepository::new(&pool);
    let email = Email::parse(&unique_email("moon-notes")).unwrap();

    let (first, created) = repo.subscribe(&email, "footer").await.unwrap();
    assert!(created);
    let (second, created_again) = repo.subscribe(&email, "popup").await.unwrap();
    assert!(!created_again);
    assert_eq!(first.id, second.id);

    assert!(repo.unsubscribe(&email).await.unwrap());
    let page = repo
        .list(&SubscriberFilter {
            q: Some(email.as_str().to_string()),
            ..SubscriberFilter::default()
        })
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].status.as_str(), "unsubscribed");
}

#[tokio::test]
#[ignore = "Requires DATABASE_URL"]
async fn test_campaign_sends_once() {
    let pool = test_pool().await;
    let repo = CampaignRepository::new(&pool);
    let campaign = repo
        .create(&NewCampaign {
            name: "Test campaign".to_string(),
            subject: "Full moon in Pisces".to_string(),
            body_markdown: "Hello **moon**".to_string(),
        })
        .await
        .unwrap();

    // Only claimed campaigns can be recorded as sent
    assert!(matches!(
        repo.mark_sent(campaign.id, 3).await,
        Err(RepositoryError::Conflict(_))
    ));

    let claimed = repo.claim(campaign.id).await.unwrap();
    assert_eq!(claimed.status, CampaignStatus::Sending);
    assert!(matches!(
        repo.claim(campaign.id).await,
        Err(RepositoryError::Conflict(_))
    ));

    let sent = repo.mark_sent(campaign.id, 3).await.unwrap();
    assert_eq!(sent.status, CampaignStatus::Sent);
    assert_eq!(sent.recipient_count, 3);
    assert!(sent.sent_at.is_some());

    // A sent campaign is never released back to draft
    repo.release(campaign.id).await.unwrap();
    assert!(matches!(
        repo.claim(campaign.id).await,
        Err(RepositoryError::Conflict(_))
    ));
}

#[tokio::test]
#[ignore = "Requires DATABASE_URL"]
async fn test_concurrent_campaign_claims_have_one_winner() {
    let pool = test_pool().await;
    let repo = CampaignRepository::new(&pool);
    let campaign = repo
        .create(&NewCampaign {
            name: "Double click".to_string(),
            subject: "New moon intentions".to_string(),
            body_markdown: "Set your intentions.".to_string(),
        })
        .await
        .unwrap();

    let (first, second) = tokio::join!(repo.claim(campaign.id), repo.claim(campaign.id));
    assert_eq!(usize::from(first.is_ok()) + usize::from(second.is_ok()), 1);

    // A send that delivered nothing hands the draft back
    repo.release(campaign.id).await.unwrap();
    assert_eq!(
        repo.get(campaign.id).await.unwrap().unwrap().status,
        CampaignStatus::Draft
    );
}

#[tokio::test]
#[ignore = "Requires DATABASE_URL"]
async fn test_generated_post_slugs_never_collide() {
    let pool = test_pool().await;
    let catalog = CrystalRepository::new(&pool).list_active().await.unwrap();
    let topic = find_topic("cleansing-care").unwrap();

    let first = save_post(&pool, TemplateGenerator.generate(topic, &catalog), false)
        .await
        .unwrap();
    let second = save_post(&pool, TemplateGenerator.generate(topic, &catalog), false)
        .await
        .unwrap();

    assert_ne!(first.slug, second.slug);
    assert!(second.slug.starts_with("how-to-cleanse-and-care-for-your-crystals-"));
    assert!(!second.is_published);

    let published = BlogPostRepository::new(&pool)
        .set_published(second.id, true)
        .await
        .unwrap();
    assert!(published.is_published);
    assert!(published.published_at.is_some());
}

#[tokio::test]
#[ignore = "Requires DATABASE_URL"]
async fn test_concurrent_saves_of_one_topic_both_succeed() {
    let pool = test_pool().await;
    let catalog = CrystalRepository::new(&pool).list_active().await.unwrap();
    let topic = find_topic("heart-chakra").unwrap();

    let (first, second) = tokio::join!(
        save_post(&pool, TemplateGenerator.generate(topic, &catalog), false),
        save_post(&pool, TemplateGenerator.generate(topic, &catalog), false),
    );
    let (first, second) = (first.unwrap(), second.unwrap());
    assert_ne!(first.slug, second.slug);
    assert!(is_valid_slug(&first.slug));
    assert!(is_valid_slug(&second.slug));
}

#[tokio::test]
#[ignore = "Requires DATABASE_URL"]
async fn test_dashboard_stats_and_seo_report_load() {
    let pool = test_pool().await;

    let stats = DashboardStats::load(&pool).await.unwrap();
    assert!(stats.customers >= 0);
    assert_eq!(stats.low_stock_threshold, LOW_STOCK_THRESHOLD);

    let crystals = CrystalRepository::new(&pool).list_active().await.unwrap();
    let posts = BlogPostRepository::new(&pool).list_published().await.unwrap();
    let report = audit(&crystals, &posts, "https://moonstone.test");
    assert_eq!(report.pages_audited, crystals.len() + posts.len());
}

#[tokio::test]
#[ignore = "Requires DATABASE_URL"]
async fn test_admin_promotion() {
    let pool = test_pool().await;
    let users = UserRepository::new(&pool);
    let email = Email::parse(&unique_email("admin")).unwrap();
    let hash = password::hash_password("correct horse battery").unwrap();

    let user = users
        .create_with_password(&email, Some("Test Admin"), &hash, UserRole::Customer)
        .await
        .unwrap();
    assert!(!user.is_admin());

    let promoted = users.set_role(user.id, UserRole::Admin).await.unwrap();
    assert!(promoted.is_admin());

    let (_, stored) = users.get_password_hash(&email).await.unwrap().unwrap();
    password::verify_password("correct horse battery", &stored).unwrap();
}
