//! In-memory crystal catalog.
//!
//! The active catalog is small (a few dozen crystals), so listing pages load
//! one snapshot from the database, cache it with `moka`, and filter, sort and
//! paginate in memory.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use moonstone_core::{CrystalId, Money, ZodiacSign};
use moonstone_db::models::Crystal;
use moonstone_db::{CrystalRepository, RepositoryError};

/// Crystals per listing page.
pub const PER_PAGE: usize = 12;

const SNAPSHOT_KEY: &str = "active";

/// Cached snapshot of active crystals.
#[derive(Clone)]
pub struct CatalogService {
    pool: PgPool,
    cache: Cache<&'static str, Arc<Vec<Crystal>>>,
}

impl CatalogService {
    /// Create a catalog backed by the given pool.
    #[must_use]
    pub fn new(pool: PgPool, ttl: Duration) -> Self {
        let cache = Cache::builder().max_capacity(1).time_to_live(ttl).build();
        Self { pool, cache }
    }

    /// Current snapshot, loading it from the database when the cache is cold.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the crystals cannot be loaded.
    pub async fn snapshot(&self) -> Result<Arc<Vec<Crystal>>, RepositoryError> {
        if let Some(crystals) = self.cache.get(SNAPSHOT_KEY).await {
            return Ok(crystals);
        }

        let crystals = Arc::new(CrystalRepository::new(&self.pool).list_active().await?);
        tracing::debug!(count = crystals.len(), "Loaded catalog snapshot");
        self.cache.insert(SNAPSHOT_KEY, Arc::clone(&crystals)).await;
        Ok(crystals)
    }

    /// Drop the cached snapshot (after stock or price changes).
    pub async fn invalidate(&self) {
        self.cache.invalidate(SNAPSHOT_KEY).await;
    }

    /// Find an active crystal by slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the snapshot cannot be loaded.
    pub async fn by_slug(&self, slug: &str) -> Result<Option<Crystal>, RepositoryError> {
        Ok(self
            .snapshot()
            .await?
            .iter()
            .find(|c| c.slug == slug)
            .cloned())
    }

    /// Find an active crystal by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the snapshot cannot be loaded.
    pub async fn by_id(&self, id: CrystalId) -> Result<Option<Crystal>, RepositoryError> {
        Ok(self.snapshot().await?.iter().find(|c| c.id == id).cloned())
    }
}

/// Listing sort orders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Featured first, then by name.
    #[default]
    Featured,
    PriceAsc,
    PriceDesc,
    Name,
    Newest,
}

impl SortOrder {
    /// All sort orders with their labels, for the sort dropdown.
    pub const OPTIONS: [(Self, &'static str, &'static str); 5] = [
        (Self::Featured, "featured", "Featured"),
        (Self::PriceAsc, "price_asc", "Price: low to high"),
        (Self::PriceDesc, "price_desc", "Price: high to low"),
        (Self::Name, "name", "Name"),
        (Self::Newest, "newest", "Newest"),
    ];
}

/// Listing filters, read from the query string.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogQuery {
    pub category: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub zodiac: Option<ZodiacSign>,
    pub chakra: Option<String>,
    pub q: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub min_price: Option<Money>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub max_price: Option<Money>,
    pub in_stock: Option<bool>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub sort: Option<SortOrder>,
    pub page: Option<u32>,
}

/// Treat `field=` from a GET form as absent.
fn empty_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    use serde::de::IntoDeserializer;

    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => {
            let de: serde::de::value::StrDeserializer<'_, D::Error> = value.into_deserializer();
            T::deserialize(de).map(Some)
        }
    }
}

impl CatalogQuery {
    fn matches(&self, crystal: &Crystal, needle: Option<&str>) -> bool {
        if let Some(category) = self.category.as_deref().filter(|c| !c.is_empty())
            && !crystal.category.eq_ignore_ascii_case(category)
        {
            return false;
        }
        if let Some(sign) = self.zodiac
            && !crystal.has_sign(sign)
        {
            return false;
        }
        if let Some(chakra) = self.chakra.as_deref().filter(|c| !c.is_empty())
            && !crystal.has_chakra(chakra)
        {
            return false;
        }
        if self.min_price.is_some_and(|min| crystal.price < min)
            || self.max_price.is_some_and(|max| crystal.price > max)
        {
            return false;
        }
        if self.in_stock == Some(true) && !crystal.in_stock() {
            return false;
        }
        needle.is_none_or(|needle| {
            crystal.name.to_lowercase().contains(needle)
                || crystal.description.to_lowercase().contains(needle)
                || crystal.properties.iter().any(|p| p.contains(needle))
        })
    }
}

/// One page of listing results.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogPage {
    pub items: Vec<Crystal>,
    pub total: usize,
    pub page: u32,
    pub total_pages: u32,
}

impl CatalogPage {
    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.page > 1
    }

    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

/// Filter, sort and paginate a catalog snapshot.
#[must_use]
pub fn apply(crystals: &[Crystal], query: &CatalogQuery) -> CatalogPage {
    let needle = query
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(str::to_lowercase);

    let mut matched: Vec<&Crystal> = crystals
        .iter()
        .filter(|c| c.is_active && query.matches(c, needle.as_deref()))
        .collect();

    match query.sort.unwrap_or_default() {
        SortOrder::Featured => matched.sort_by(|a, b| {
            b.is_featured
                .cmp(&a.is_featured)
                .then_with(|| a.name.cmp(&b.name))
        }),
        SortOrder::PriceAsc => {
            matched.sort_by(|a, b| a.price.cmp(&b.price).then_with(|| a.name.cmp(&b.name)));
        }
        SortOrder::PriceDesc => {
            matched.sort_by(|a, b| b.price.cmp(&a.price).then_with(|| a.name.cmp(&b.name)));
        }
        SortOrder::Name => matched.sort_by(|a, b| a.name.cmp(&b.name)),
        SortOrder::Newest => {
            matched.sort_by(|a, b| {
                b.created_at
                    .cmp(&a.created_at)
                    .then(b.id.as_i32().cmp(&a.id.as_i32()))
            });
        }
    }

    let total = matched.len();
    let total_pages = u32::try_from(total.div_ceil(PER_PAGE).max(1)).unwrap_or(u32::MAX);
    let page = query.page.unwrap_or(1).clamp(1, total_pages);
    let skip = usize::try_from(page - 1).unwrap_or_default() * PER_PAGE;

    CatalogPage {
        items: matched
            .into_iter()
            .skip(skip)
            .take(PER_PAGE)
            .cloned()
            .collect(),
        total,
        page,
        total_pages,
    }
}

/// Crystals sharing a chakra or category with `crystal`, best matches first.
#[must_use]
pub fn related(crystals: &[Crystal], crystal: &Crystal, limit: usize) -> Vec<Crystal> {
    let mut scored: Vec<(usize, &Crystal)> = crystals
        .iter()
        .filter(|other| other.id != crystal.id && other.is_active)
        .filter_map(|other| {
            let shared_chakras = other
                .chakras
                .iter()
                .filter(|c| crystal.has_chakra(c))
                .count();
            let same_category = usize::from(other.category == crystal.category);
            let score = shared_chakras + same_category;
            (score > 0).then_some((score, other))
        })
        .collect();

    scored.sort_by(|(sa, a), (sb, b)| sb.cmp(sa).then_with(|| a.name.cmp(&b.name)));
    scored
        .into_iter()
        .take(limit)
        .map(|(_, c)| c.clone())
        .collect()
}

/// Distinct categories in display order.
#[must_use]
pub fn categories(crystals: &[Crystal]) -> Vec<String> {
    let mut categories: Vec<String> = crystals.iter().map(|c| c.category.clone()).collect();
    categories.sort();
    categories.dedup();
    categories
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use moonstone_db::fixtures::sample_catalog;

    fn slugs(page: &CatalogPage) -> Vec<&str> {
        page.items.iter().map(|c| c.slug.as_str()).collect()
    }

    #[test]
    fn test_default_query_paginates() {
        let catalog = sample_catalog();
        let page = apply(&catalog, &CatalogQuery::default());
        assert_eq!(page.total, 20);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.items.len(), PER_PAGE);
        assert!(page.items.iter().take(4).all(|c| c.is_featured));

        let second = apply(
            &catalog,
            &CatalogQuery {
                page: Some(2),
                ..CatalogQuery::default()
            },
        );
        assert_eq!(second.items.len(), 8);
        assert!(second.has_previous());
        assert!(!second.has_next());
    }

    #[test]
    fn test_page_out_of_range_clamps() {
        let page = apply(
            &sample_catalog(),
            &CatalogQuery {
                page: Some(99),
                ..CatalogQuery::default()
            },
        );
        assert_eq!(page.page, 2);
    }

    #[test]
    fn test_category_filter() {
        let page = apply(
            &sample_catalog(),
            &CatalogQuery {
                category: Some("Towers".to_owned()),
                sort: Some(SortOrder::Name),
                ..CatalogQuery::default()
            },
        );
        assert_eq!(
            slugs(&page),
            vec![
                "citrine-point",
                "clear-quartz-tower",
                "fluorite-tower",
                "obsidian-sphere"
            ]
        );
    }

    #[test]
    fn test_zodiac_and_in_stock_filters() {
        let query = CatalogQuery {
            zodiac: Some(ZodiacSign::Scorpio),
            in_stock: Some(true),
            ..CatalogQuery::default()
        };
        let page = apply(&sample_catalog(), &query);
        assert!(page.items.iter().all(|c| c.has_sign(ZodiacSign::Scorpio)));
        assert!(!slugs(&page).contains(&"obsidian-sphere"));
    }

    #[test]
    fn test_price_range_and_sort() {
        let query = CatalogQuery {
            min_price: Some(Money::from_cents(1000)),
            max_price: Some(Money::from_cents(1900)),
            sort: Some(SortOrder::PriceAsc),
            ..CatalogQuery::default()
        };
        let page = apply(&sample_catalog(), &query);
        assert_eq!(
            slugs(&page),
            vec![
                "carnelian-tumble",
                "selenite-wand",
                "pyrite-cube",
                "black-tourmaline",
                "aquamarine-tumble"
            ]
        );
    }

    #[test]
    fn test_text_search_hits_properties() {
        let query = CatalogQuery {
            q: Some("  Grounding ".to_owned()),
            ..CatalogQuery::default()
        };
        let page = apply(&sample_catalog(), &query);
        assert!(!page.items.is_empty());
        assert!(
            page.items
                .iter()
                .all(|c| c.properties.iter().any(|p| p == "grounding")
                    || c.description.to_lowercase().contains("grounding"))
        );
    }

    #[test]
    fn test_inactive_crystals_hidden() {
        let mut catalog = sample_catalog();
        catalog[0].is_active = false;
        let page = apply(&catalog, &CatalogQuery::default());
        assert_eq!(page.total, 19);
    }

    #[test]
    fn test_newest_sort() {
        let query = CatalogQuery {
            sort: Some(SortOrder::Newest),
            ..CatalogQuery::default()
        };
        let page = apply(&sample_catalog(), &query);
        assert_eq!(page.items[0].slug, "sunstone-pendant");
    }

    #[test]
    fn test_related_excludes_self() {
        let catalog = sample_catalog();
        let rose = catalog.iter().find(|c| c.slug == "rose-quartz-heart").unwrap();
        let related = related(&catalog, rose, 4);
        assert_eq!(related.len(), 4);
        assert!(related.iter().all(|c| c.id != rose.id));
        assert!(
            related
                .iter()
                .all(|c| c.has_chakra("heart") || c.category == "tumbled")
        );
    }

    #[test]
    fn test_query_string_deserializes() {
        let query: CatalogQuery = serde_json::from_value(serde_json::json!({
            "zodiac": "leo",
            "sort": "price_desc",
            "in_stock": true
        }))
        .unwrap();
        assert_eq!(query.zodiac, Some(ZodiacSign::Leo));
        assert_eq!(query.sort, Some(SortOrder::PriceDesc));
    }

    #[test]
    fn test_blank_form_fields_are_absent() {
        let query: CatalogQuery = serde_json::from_value(serde_json::json!({
            "zodiac": "",
            "sort": " ",
            "min_price": "10.00"
        }))
        .unwrap();
        assert_eq!(query.zodiac, None);
        assert_eq!(query.sort, None);
        assert_eq!(query.min_price, Some(Money::from_cents(1000)));
    }
}
