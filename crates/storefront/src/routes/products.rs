//! Product route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect},
};
use serde::Deserialize;
use tracing::instrument;

use moonstone_core::ZodiacSign;
use moonstone_db::ReviewRepository;
use moonstone_db::models::{Crystal, NewReview, RatingSummary, Review};

use crate::catalog::{self, CatalogPage, CatalogQuery, SortOrder};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{OptionalAuth, RequireAuth};
use crate::state::AppState;

/// Related crystals shown under a product.
const RELATED_LIMIT: usize = 4;

/// Review body length bounds, in characters.
const REVIEW_BODY_MIN: usize = 10;
const REVIEW_BODY_MAX: usize = 2000;

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub heading: String,
    pub base_path: String,
    pub page: CatalogPage,
    pub query: CatalogQuery,
    pub categories: Vec<String>,
    pub signs: [ZodiacSign; 12],
    pub sort_options: [(SortOrder, &'static str, &'static str); 5],
    pub previous_link: Option<String>,
    pub next_link: Option<String>,
}

impl ProductsIndexTemplate {
    fn is_sort(&self, sort: &SortOrder) -> bool {
        self.query.sort.unwrap_or_default() == *sort
    }

    fn is_sign(&self, sign: &ZodiacSign) -> bool {
        self.query.zodiac == Some(*sign)
    }

    fn text_filter(value: Option<&String>) -> &str {
        value.map_or("", String::as_str)
    }

    fn search_value(&self) -> &str {
        Self::text_filter(self.query.q.as_ref())
    }

    fn chakra_value(&self) -> &str {
        Self::text_filter(self.query.chakra.as_ref())
    }
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub crystal: Crystal,
    pub reviews: Vec<Review>,
    pub rating: RatingSummary,
    pub related: Vec<Crystal>,
    pub signed_in: bool,
    pub review_error: Option<String>,
}

/// Quick view fragment template.
#[derive(Template, WebTemplate)]
#[template(path = "partials/quick_view.html")]
pub struct QuickViewTemplate {
    pub crystal: Crystal,
}

/// Query parameters on the product page.
#[derive(Debug, Deserialize)]
pub struct ShowQuery {
    pub review_error: Option<String>,
}

/// Review form data.
#[derive(Debug, Deserialize)]
pub struct ReviewForm {
    pub rating: i16,
    pub title: Option<String>,
    pub body: String,
}

impl ReviewForm {
    /// Check rating and body bounds, returning the trimmed title and body.
    fn validate(&self) -> std::result::Result<(Option<String>, String), &'static str> {
        if !(1..=5).contains(&self.rating) {
            return Err("Rating must be between 1 and 5 stars.");
        }
        let body = self.body.trim();
        let length = body.chars().count();
        if length < REVIEW_BODY_MIN {
            return Err("Reviews need at least 10 characters.");
        }
        if length > REVIEW_BODY_MAX {
            return Err("Reviews are limited to 2000 characters.");
        }
        let title = self
            .title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_owned);
        Ok((title, body.to_owned()))
    }
}

/// Build a listing URL for `page`, keeping the active filters.
fn page_link(base_path: &str, query: &CatalogQuery, page: u32) -> String {
    let mut params = url::form_urlencoded::Serializer::new(String::new());
    if let Some(zodiac) = query.zodiac {
        params.append_pair("zodiac", zodiac.as_str());
    }
    if let Some(chakra) = &query.chakra {
        params.append_pair("chakra", chakra);
    }
    if let Some(q) = &query.q {
        params.append_pair("q", q);
    }
    if let Some(min) = query.min_price {
        params.append_pair("min_price", &min.amount().to_string());
    }
    if let Some(max) = query.max_price {
        params.append_pair("max_price", &max.amount().to_string());
    }
    if query.in_stock == Some(true) {
        params.append_pair("in_stock", "true");
    }
    if let Some(sort) = query.sort
        && let Some((_, value, _)) = SortOrder::OPTIONS.iter().find(|(s, _, _)| *s == sort)
    {
        params.append_pair("sort", value);
    }
    params.append_pair("page", &page.to_string());
    format!("{base_path}?{}", params.finish())
}

async fn render_listing(
    state: &AppState,
    heading: String,
    base_path: String,
    query: CatalogQuery,
) -> Result<ProductsIndexTemplate> {
    let crystals = state.catalog().snapshot().await?;
    let page = catalog::apply(&crystals, &query);

    let previous_link = page
        .has_previous()
        .then(|| page_link(&base_path, &query, page.page - 1));
    let next_link = page
        .has_next()
        .then(|| page_link(&base_path, &query, page.page + 1));

    Ok(ProductsIndexTemplate {
        heading,
        base_path,
        page,
        query,
        categories: catalog::categories(&crystals),
        signs: ZodiacSign::ALL,
        sort_options: SortOrder::OPTIONS,
        previous_link,
        next_link,
    })
}

/// Display product listing page.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<CatalogQuery>,
) -> Result<impl IntoResponse> {
    render_listing(
        &state,
        "All Crystals".to_string(),
        "/products".to_string(),
        query,
    )
    .await
}

/// Display one category of the catalog.
#[instrument(skip(state))]
pub async fn category(
    State(state): State<AppState>,
    Path(category): Path<String>,
    Query(mut query): Query<CatalogQuery>,
) -> Result<impl IntoResponse> {
    let crystals = state.catalog().snapshot().await?;
    if !catalog::categories(&crystals).contains(&category) {
        return Err(AppError::NotFound(format!("category {category}")));
    }

    let heading = filters::titleize_str(&category);
    let base_path = format!("/products/category/{category}");
    query.category = Some(category);
    render_listing(&state, heading, base_path, query).await
}

/// Display product detail page.
#[instrument(skip(state, user))]
pub async fn show(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<ShowQuery>,
    OptionalAuth(user): OptionalAuth,
) -> Result<impl IntoResponse> {
    let crystal = state
        .catalog()
        .by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("crystal {slug}")))?;

    let repo = ReviewRepository::new(state.pool());
    let reviews = repo.list_for_crystal(crystal.id).await?;
    let rating = repo.rating_summary(crystal.id).await?;

    let crystals = state.catalog().snapshot().await?;
    let related = catalog::related(&crystals, &crystal, RELATED_LIMIT);

    Ok(ProductShowTemplate {
        crystal,
        reviews,
        rating,
        related,
        signed_in: user.is_some(),
        review_error: query.review_error,
    })
}

/// Quick view fragment (HTMX).
#[instrument(skip(state))]
pub async fn quick_view(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse> {
    let crystal = state
        .catalog()
        .by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("crystal {slug}")))?;

    Ok(QuickViewTemplate { crystal })
}

/// Post a review for a crystal.
#[instrument(skip(state, user, form), fields(user_id = %user.id))]
pub async fn create_review(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(slug): Path<String>,
    Form(form): Form<ReviewForm>,
) -> Result<Redirect> {
    let crystal = state
        .catalog()
        .by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("crystal {slug}")))?;

    let (title, body) = match form.validate() {
        Ok(fields) => fields,
        Err(message) => {
            return Ok(Redirect::to(&format!(
                "/products/{slug}?review_error={}#reviews",
                urlencoding::encode(message)
            )));
        }
    };

    ReviewRepository::new(state.pool())
        .create(&NewReview {
            crystal_id: crystal.id,
            user_id: user.id,
            rating: form.rating,
            title,
            body,
        })
        .await?;

    tracing::info!(crystal = %crystal.slug, rating = form.rating, "Review posted");
    Ok(Redirect::to(&format!("/products/{slug}#reviews")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use moonstone_core::Money;

    fn form(rating: i16, body: &str) -> ReviewForm {
        ReviewForm {
            rating,
            title: Some("  ".to_string()),
            body: body.to_string(),
        }
    }

    #[test]
    fn test_review_rating_bounds() {
        assert!(form(0, "Lovely stone, very calming").validate().is_err());
        assert!(form(6, "Lovely stone, very calming").validate().is_err());
        assert!(form(5, "Lovely stone, very calming").validate().is_ok());
    }

    #[test]
    fn test_review_body_bounds() {
        assert!(form(4, "   too short   ").validate().is_err());
        assert!(form(4, &"a".repeat(2001)).validate().is_err());

        let (title, body) = form(4, "  exactly ten  ").validate().unwrap();
        assert_eq!(title, None);
        assert_eq!(body, "exactly ten");
    }

    #[test]
    fn test_page_link_keeps_filters() {
        let query = CatalogQuery {
            zodiac: Some(ZodiacSign::Leo),
            min_price: Some(Money::from_cents(1000)),
            sort: Some(SortOrder::PriceDesc),
            page: Some(1),
            ..CatalogQuery::default()
        };
        assert_eq!(
            page_link("/products", &query, 2),
            "/products?zodiac=leo&min_price=10.00&sort=price_desc&page=2"
        );
    }
}
