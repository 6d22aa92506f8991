//! Crystal (product) domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use moonstone_core::{CrystalId, Money, ZodiacSign};

/// A crystal listed in the shop.
#[derive(Debug, Clone, Serialize)]
pub struct Crystal {
    /// Unique crystal ID.
    pub id: CrystalId,
    /// Display name, e.g. "Rose Quartz Tower".
    pub name: String,
    /// URL slug.
    pub slug: String,
    /// Catalog category (`raw`, `tumbled`, `towers`, `clusters`, `jewelry`).
    pub category: String,
    /// Current price.
    pub price: Money,
    /// Original price when on sale.
    pub compare_at_price: Option<Money>,
    /// Product description (plain text).
    pub description: String,
    /// SEO title override.
    pub meta_title: Option<String>,
    /// SEO meta description.
    pub meta_description: Option<String>,
    /// Primary image URL.
    pub image_url: Option<String>,
    /// Associated chakras, lowercase (`heart`, `root`, ...).
    pub chakras: Vec<String>,
    /// Zodiac signs this crystal is traditionally paired with.
    pub zodiac_signs: Vec<ZodiacSign>,
    /// Metaphysical properties, lowercase (`love`, `grounding`, ...).
    pub properties: Vec<String>,
    /// Units on hand.
    pub stock_quantity: i32,
    /// Whether the crystal is visible on the storefront.
    pub is_active: bool,
    /// Whether the crystal is promoted on the home page.
    pub is_featured: bool,
    /// When the crystal was created.
    pub created_at: DateTime<Utc>,
    /// When the crystal was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Crystal {
    /// Whether at least one unit is available.
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock_quantity > 0
    }

    /// Whether the crystal is discounted.
    #[must_use]
    pub fn is_on_sale(&self) -> bool {
        self.compare_at_price.is_some_and(|compare| compare > self.price)
    }

    /// Whether the crystal lists `sign`.
    #[must_use]
    pub fn has_sign(&self, sign: ZodiacSign) -> bool {
        self.zodiac_signs.contains(&sign)
    }

    /// Whether the crystal lists `chakra` (case-insensitive).
    #[must_use]
    pub fn has_chakra(&self, chakra: &str) -> bool {
        self.chakras.iter().any(|c| c.eq_ignore_ascii_case(chakra))
    }

    /// Title used in `<title>` and search results.
    #[must_use]
    pub fn seo_title(&self) -> &str {
        self.meta_title.as_deref().unwrap_or(&self.name)
    }
}

/// Fields needed to insert or upsert a crystal.
#[derive(Debug, Clone)]
pub struct NewCrystal {
    pub name: String,
    pub slug: String,
    pub category: String,
    pub price: Money,
    pub compare_at_price: Option<Money>,
    pub description: String,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub image_url: Option<String>,
    pub chakras: Vec<String>,
    pub zodiac_signs: Vec<ZodiacSign>,
    pub properties: Vec<String>,
    pub stock_quantity: i32,
    pub is_featured: bool,
}

/// Partial update from the inventory dashboard. `None` leaves a field as is.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CrystalUpdate {
    pub price: Option<Money>,
    pub compare_at_price: Option<Money>,
    pub stock_quantity: Option<i32>,
    pub is_active: Option<bool>,
    pub is_featured: Option<bool>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
}

impl CrystalUpdate {
    /// Whether the update changes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.price.is_none()
            && self.compare_at_price.is_none()
            && self.stock_quantity.is_none()
            && self.is_active.is_none()
            && self.is_featured.is_none()
            && self.meta_title.is_none()
            && self.meta_description.is_none()
    }
}
