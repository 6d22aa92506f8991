//! The shop's crystal dataset.
//!
//! Seeded with `ms-cli seed crystals` and used by content generation and
//! tests as a stand-in catalog.

use chrono::{TimeZone, Utc};

use moonstone_core::ZodiacSign::{
    Aquarius, Aries, Cancer, Capricorn, Gemini, Leo, Libra, Pisces, Sagittarius, Scorpio, Taurus,
    Virgo,
};
use moonstone_core::{CrystalId, Money, ZodiacSign};

use crate::models::{Crystal, NewCrystal};

/// A crystal record in the seed dataset.
#[derive(Debug, Clone, Copy)]
pub struct CrystalFixture {
    pub name: &'static str,
    pub slug: &'static str,
    pub category: &'static str,
    pub price_cents: i64,
    pub compare_at_cents: Option<i64>,
    pub description: &'static str,
    pub meta_description: Option<&'static str>,
    pub chakras: &'static [&'static str],
    pub zodiac_signs: &'static [ZodiacSign],
    pub properties: &'static [&'static str],
    pub stock: i32,
    pub featured: bool,
}

/// The seed catalog.
pub const CRYSTALS: &[CrystalFixture] = &[
    CrystalFixture {
        name: "Amethyst Cluster",
        slug: "amethyst-cluster",
        category: "clusters",
        price_cents: 4800,
        compare_at_cents: None,
        description: "Deep violet points grown together on a natural matrix. Amethyst is the classic stone of calm and intuition, kept on nightstands and meditation altars to quiet a busy mind.",
        meta_description: Some("Shop our natural Amethyst Cluster, a deep violet crystal for calm, intuition and restful sleep. Ethically sourced from Uruguay and hand selected."),
        chakras: &["third-eye", "crown"],
        zodiac_signs: &[Pisces, Virgo, Aquarius, Capricorn],
        properties: &["calm", "intuition", "clarity"],
        stock: 14,
        featured: true,
    },
    CrystalFixture {
        name: "Rose Quartz Heart",
        slug: "rose-quartz-heart",
        category: "tumbled",
        price_cents: 2200,
        compare_at_cents: Some(2800),
        description: "A polished heart of soft pink quartz. Rose quartz is the stone of unconditional love and self-compassion.",
        meta_description: Some("Rose Quartz Heart for love, self-compassion and emotional healing. A palm-sized polished pink quartz heart that makes a thoughtful gift for anyone."),
        chakras: &["heart"],
        zodiac_signs: &[Taurus, Libra],
        properties: &["love", "healing", "calm"],
        stock: 40,
        featured: true,
    },
    CrystalFixture {
        name: "Citrine Point",
        slug: "citrine-point",
        category: "towers",
        price_cents: 3600,
        compare_at_cents: None,
        description: "A golden citrine generator point. Known as the merchant's stone, citrine is kept near registers and desks to invite abundance and confident action.",
        meta_description: None,
        chakras: &["solar-plexus", "sacral"],
        zodiac_signs: &[Aries, Leo, Gemini],
        properties: &["abundance", "energy", "confidence"],
        stock: 9,
        featured: true,
    },
    CrystalFixture {
        name: "Black Tourmaline",
        slug: "black-tourmaline",
        category: "raw",
        price_cents: 1800,
        compare_at_cents: None,
        description: "Raw striated black tourmaline. A favorite protection stone, often placed by doorways or carried to stay grounded in crowded places.",
        meta_description: Some("Raw Black Tourmaline for protection and grounding. Place it by your door or desk to absorb negative energy. Each piece is unique and hand chosen."),
        chakras: &["root"],
        zodiac_signs: &[Capricorn, Scorpio],
        properties: &["protection", "grounding"],
        stock: 25,
        featured: false,
    },
    CrystalFixture {
        name: "Clear Quartz Tower",
        slug: "clear-quartz-tower",
        category: "towers",
        price_cents: 4200,
        compare_at_cents: None,
        description: "A polished clear quartz tower. The master healer amplifies intention and the energy of stones placed around it.",
        meta_description: Some("Clear Quartz Tower, the master healer crystal. Amplify your intentions and the energy of your other crystals with this polished point tower."),
        chakras: &["crown"],
        zodiac_signs: &[Aries, Leo, Capricorn],
        properties: &["clarity", "healing", "energy"],
        stock: 12,
        featured: false,
    },
    CrystalFixture {
        name: "Moonstone Ring",
        slug: "moonstone-ring",
        category: "jewelry",
        price_cents: 6800,
        compare_at_cents: Some(7800),
        description: "Rainbow moonstone set in sterling silver. Moonstone follows the lunar cycle and is treasured for new beginnings, intuition and emotional balance.",
        meta_description: Some("Rainbow Moonstone Ring in sterling silver. A stone of new beginnings, intuition and emotional balance. Adjustable band, gift boxed and ready to give."),
        chakras: &["sacral", "crown"],
        zodiac_signs: &[Cancer, Libra, Scorpio],
        properties: &["intuition", "balance", "calm"],
        stock: 6,
        featured: true,
    },
    CrystalFixture {
        name: "Tiger's Eye Bracelet",
        slug: "tigers-eye-bracelet",
        category: "jewelry",
        price_cents: 2900,
        compare_at_cents: None,
        description: "8mm tiger's eye beads on stretch cord. Golden bands of chatoyant light for courage, focus and steady confidence.",
        meta_description: Some("Tiger's Eye Bracelet with 8mm beads for courage, focus and confidence. Stretch fit for most wrists, a grounding everyday companion for bold days."),
        chakras: &["solar-plexus", "root"],
        zodiac_signs: &[Leo, Capricorn],
        properties: &["confidence", "protection", "energy"],
        stock: 30,
        featured: false,
    },
    CrystalFixture {
        name: "Labradorite Palm Stone",
        slug: "labradorite-palm-stone",
        category: "tumbled",
        price_cents: 2400,
        compare_at_cents: None,
        description: "A smooth palm stone that flashes blue and gold labradorescence. A stone of magic and transformation that protects the aura.",
        meta_description: None,
        chakras: &["third-eye", "throat"],
        zodiac_signs: &[Scorpio, Sagittarius, Leo],
        properties: &["intuition", "protection", "creativity"],
        stock: 18,
        featured: false,
    },
    CrystalFixture {
        name: "Selenite Wand",
        slug: "selenite-wand",
        category: "raw",
        price_cents: 1400,
        compare_at_cents: None,
        description: "A satin spar selenite wand. Used to cleanse other crystals and clear a room's energy.",
        meta_description: Some("Selenite Wand for cleansing crystals and clearing space. A soft satin spar stick that brings peace, clarity and light to any altar or shelf."),
        chakras: &["crown"],
        zodiac_signs: &[Taurus, Cancer],
        properties: &["clarity", "calm", "healing"],
        stock: 50,
        featured: false,
    },
    CrystalFixture {
        name: "Green Aventurine",
        slug: "green-aventurine",
        category: "tumbled",
        price_cents: 900,
        compare_at_cents: None,
        description: "Tumbled green aventurine, the stone of opportunity. Carry one in a wallet or pocket for luck, growth and a lighter heart.",
        meta_description: Some("Tumbled Green Aventurine, the stone of luck and opportunity. Carry it in your pocket or wallet to invite abundance, growth and optimism daily."),
        chakras: &["heart"],
        zodiac_signs: &[Virgo, Libra, Taurus],
        properties: &["abundance", "love", "balance"],
        stock: 60,
        featured: false,
    },
    CrystalFixture {
        name: "Carnelian Tumble",
        slug: "carnelian-tumble",
        category: "tumbled",
        price_cents: 1000,
        compare_at_cents: None,
        description: "Warm orange carnelian for motivation and creative fire. A favorite of artists and anyone starting something new.",
        meta_description: Some("Carnelian tumbled stone for motivation, courage and creativity. A warm orange crystal that sparks action, passion and fresh creative energy."),
        chakras: &["sacral", "root"],
        zodiac_signs: &[Aries, Leo, Virgo],
        properties: &["energy", "creativity", "confidence"],
        stock: 45,
        featured: false,
    },
    CrystalFixture {
        name: "Lapis Lazuli Pendant",
        slug: "lapis-lazuli-pendant",
        category: "jewelry",
        price_cents: 5400,
        compare_at_cents: None,
        description: "Royal blue lapis lazuli flecked with pyrite, set as a silver pendant. The stone of truth and wisdom, worn close to the throat.",
        meta_description: Some("Lapis Lazuli Pendant in sterling silver, a royal blue stone of truth, wisdom and self expression. Comes on an 18 inch chain, gift boxed for you."),
        chakras: &["throat", "third-eye"],
        zodiac_signs: &[Sagittarius, Libra, Taurus],
        properties: &["clarity", "intuition", "confidence"],
        stock: 8,
        featured: false,
    },
    CrystalFixture {
        name: "Smoky Quartz Point",
        slug: "smoky-quartz-point",
        category: "raw",
        price_cents: 3200,
        compare_at_cents: None,
        description: "A natural smoky quartz point. Gently grounds and transmutes stress into calm focus.",
        meta_description: None,
        chakras: &["root"],
        zodiac_signs: &[Capricorn, Sagittarius, Scorpio],
        properties: &["grounding", "protection", "calm"],
        stock: 11,
        featured: false,
    },
    CrystalFixture {
        name: "Pyrite Cube",
        slug: "pyrite-cube",
        category: "raw",
        price_cents: 1600,
        compare_at_cents: None,
        description: "Naturally formed pyrite cube with a mirror shine. Fool's gold is a powerful abundance and willpower stone.",
        meta_description: Some("Natural Pyrite Cube, known as fool's gold, for abundance, willpower and protection. Naturally formed cubic crystal with a brilliant metallic shine."),
        chakras: &["solar-plexus"],
        zodiac_signs: &[Leo, Aries],
        properties: &["abundance", "protection", "confidence"],
        stock: 3,
        featured: false,
    },
    CrystalFixture {
        name: "Aquamarine Tumble",
        slug: "aquamarine-tumble",
        category: "tumbled",
        price_cents: 1900,
        compare_at_cents: None,
        description: "Sea blue aquamarine, the stone of courage and calm communication. Sailors once carried it for safe passage.",
        meta_description: Some("Tumbled Aquamarine, a sea blue stone of courage, calm and clear communication. Soothes anxiety and helps you speak your truth with ease daily."),
        chakras: &["throat", "heart"],
        zodiac_signs: &[Pisces, Aquarius, Gemini],
        properties: &["calm", "clarity", "healing"],
        stock: 22,
        featured: false,
    },
    CrystalFixture {
        name: "Fluorite Tower",
        slug: "fluorite-tower",
        category: "towers",
        price_cents: 3800,
        compare_at_cents: None,
        description: "Banded purple and green fluorite tower. A study stone for focus, order and mental clarity.",
        meta_description: Some("Rainbow Fluorite Tower for focus, order and mental clarity. Banded purple and green fluorite, the perfect study and desk crystal for busy minds."),
        chakras: &["third-eye", "heart"],
        zodiac_signs: &[Pisces, Capricorn, Gemini],
        properties: &["clarity", "balance"],
        stock: 7,
        featured: false,
    },
    CrystalFixture {
        name: "Obsidian Sphere",
        slug: "obsidian-sphere",
        category: "towers",
        price_cents: 4400,
        compare_at_cents: None,
        description: "A polished black obsidian sphere. Volcanic glass for shadow work, truth and strong protection.",
        meta_description: Some("Black Obsidian Sphere, polished volcanic glass for protection, grounding and shadow work. A strong reflective stone for an honest inner practice."),
        chakras: &["root"],
        zodiac_signs: &[Scorpio, Sagittarius],
        properties: &["protection", "grounding"],
        stock: 0,
        featured: false,
    },
    CrystalFixture {
        name: "Garnet Earrings",
        slug: "garnet-earrings",
        category: "jewelry",
        price_cents: 4600,
        compare_at_cents: None,
        description: "Faceted red garnet studs in gold vermeil. Garnet kindles passion, devotion and vitality.",
        meta_description: Some("Red Garnet Earrings in gold vermeil, faceted studs for passion, devotion and vitality. January birthstone, hypoallergenic posts, gift ready box."),
        chakras: &["root", "heart"],
        zodiac_signs: &[Aquarius, Capricorn, Virgo],
        properties: &["love", "energy"],
        stock: 10,
        featured: false,
    },
    CrystalFixture {
        name: "Sodalite Tumble",
        slug: "sodalite-tumble",
        category: "tumbled",
        price_cents: 800,
        compare_at_cents: None,
        description: "Deep blue sodalite with white veins. Brings logic and intuition together.",
        meta_description: None,
        chakras: &["throat", "third-eye"],
        zodiac_signs: &[Sagittarius, Virgo],
        properties: &["clarity", "calm", "intuition"],
        stock: 35,
        featured: false,
    },
    CrystalFixture {
        name: "Sunstone Pendant",
        slug: "sunstone-pendant",
        category: "jewelry",
        price_cents: 5200,
        compare_at_cents: None,
        description: "Glittering orange sunstone on a gold filled chain. Carries the warmth of the sun for joy, optimism and leadership.",
        meta_description: Some("Sunstone Pendant on a gold filled chain for joy, optimism and leadership. A glittering orange crystal that brings the sun's warmth to every day."),
        chakras: &["sacral", "solar-plexus"],
        zodiac_signs: &[Leo, Libra],
        properties: &["energy", "confidence", "abundance"],
        stock: 5,
        featured: false,
    },
];

impl CrystalFixture {
    /// Insertable form of this fixture.
    #[must_use]
    pub fn to_new_crystal(&self) -> NewCrystal {
        NewCrystal {
            name: self.name.to_owned(),
            slug: self.slug.to_owned(),
            category: self.category.to_owned(),
            price: Money::from_cents(self.price_cents),
            compare_at_price: self.compare_at_cents.map(Money::from_cents),
            description: self.description.to_owned(),
            meta_title: None,
            meta_description: self.meta_description.map(str::to_owned),
            image_url: Some(format!("/static/images/crystals/{}.jpg", self.slug)),
            chakras: self.chakras.iter().map(|c| (*c).to_owned()).collect(),
            zodiac_signs: self.zodiac_signs.to_vec(),
            properties: self.properties.iter().map(|p| (*p).to_owned()).collect(),
            stock_quantity: self.stock,
            is_featured: self.featured,
        }
    }
}

/// The dataset as in-memory [`Crystal`]s with IDs `1..=n`.
///
/// Used where no database is at hand (offline content generation, tests).
#[must_use]
pub fn sample_catalog() -> Vec<Crystal> {
    let created = Utc
        .with_ymd_and_hms(2025, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or_else(Utc::now);

    CRYSTALS
        .iter()
        .zip(1..)
        .map(|(fixture, id)| {
            let new = fixture.to_new_crystal();
            Crystal {
                id: CrystalId::new(id),
                name: new.name,
                slug: new.slug,
                category: new.category,
                price: new.price,
                compare_at_price: new.compare_at_price,
                description: new.description,
                meta_title: new.meta_title,
                meta_description: new.meta_description,
                image_url: new.image_url,
                chakras: new.chakras,
                zodiac_signs: new.zodiac_signs,
                properties: new.properties,
                stock_quantity: new.stock_quantity,
                is_active: true,
                is_featured: new.is_featured,
                created_at: created + chrono::Duration::days(i64::from(id)),
                updated_at: created + chrono::Duration::days(i64::from(id)),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use moonstone_core::is_valid_slug;

    use super::*;

    #[test]
    fn test_dataset_size() {
        assert_eq!(CRYSTALS.len(), 20);
    }

    #[test]
    fn test_slugs_valid_and_unique() {
        let mut seen = HashSet::new();
        for crystal in CRYSTALS {
            assert!(is_valid_slug(crystal.slug), "bad slug {}", crystal.slug);
            assert!(seen.insert(crystal.slug), "duplicate slug {}", crystal.slug);
        }
    }

    #[test]
    fn test_every_sign_has_a_crystal() {
        for sign in ZodiacSign::ALL {
            assert!(
                CRYSTALS.iter().any(|c| c.zodiac_signs.contains(&sign)),
                "no crystal for {sign}"
            );
        }
    }

    #[test]
    fn test_sample_catalog_ids() {
        let catalog = sample_catalog();
        assert_eq!(catalog.len(), CRYSTALS.len());
        assert_eq!(catalog.first().map(|c| c.id), Some(CrystalId::new(1)));
        assert!(catalog.iter().all(|c| c.is_active));
    }
}
