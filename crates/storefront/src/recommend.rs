//! Zodiac crystal recommendations.
//!
//! Two static tables drive the matcher: the crystals traditionally paired
//! with each sign, and the crystal properties that serve each intention.
//! A crystal is recommended when it belongs to the sign (listed in the table
//! or carrying the sign itself); intentions only re-rank those matches.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use moonstone_core::ZodiacSign;
use moonstone_db::models::Crystal;

/// Default number of recommendations.
pub const DEFAULT_LIMIT: usize = 6;

const SIGN_MATCH_SCORE: u32 = 2;

/// What the customer wants the crystal to help with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intention {
    Love,
    Protection,
    Abundance,
    Calm,
    Clarity,
    Energy,
}

impl Intention {
    pub const ALL: [Self; 6] = [
        Self::Love,
        Self::Protection,
        Self::Abundance,
        Self::Calm,
        Self::Clarity,
        Self::Energy,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Love => "love",
            Self::Protection => "protection",
            Self::Abundance => "abundance",
            Self::Calm => "calm",
            Self::Clarity => "clarity",
            Self::Energy => "energy",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Love => "Love & relationships",
            Self::Protection => "Protection",
            Self::Abundance => "Abundance & success",
            Self::Calm => "Calm & sleep",
            Self::Clarity => "Focus & clarity",
            Self::Energy => "Energy & motivation",
        }
    }

    /// Crystal properties that serve this intention.
    #[must_use]
    pub fn properties(self) -> &'static [&'static str] {
        INTENTION_PROPERTIES
            .iter()
            .find(|(i, _)| *i == self)
            .map_or(&[][..], |&(_, props)| props)
    }
}

impl fmt::Display for Intention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Intention {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|i| i.as_str() == lower)
            .ok_or_else(|| format!("unknown intention: {s}"))
    }
}

/// Crystal slugs traditionally paired with each sign.
pub const SIGN_CRYSTALS: &[(ZodiacSign, &[&str])] = &[
    (
        ZodiacSign::Aries,
        &[
            "carnelian-tumble",
            "garnet-earrings",
            "sunstone-pendant",
            "clear-quartz-tower",
        ],
    ),
    (
        ZodiacSign::Taurus,
        &[
            "rose-quartz-heart",
            "green-aventurine",
            "selenite-wand",
            "pyrite-cube",
        ],
    ),
    (
        ZodiacSign::Gemini,
        &[
            "citrine-point",
            "tigers-eye-bracelet",
            "fluorite-tower",
            "aquamarine-tumble",
        ],
    ),
    (
        ZodiacSign::Cancer,
        &[
            "moonstone-ring",
            "selenite-wand",
            "rose-quartz-heart",
            "labradorite-palm-stone",
        ],
    ),
    (
        ZodiacSign::Leo,
        &[
            "sunstone-pendant",
            "citrine-point",
            "tigers-eye-bracelet",
            "carnelian-tumble",
        ],
    ),
    (
        ZodiacSign::Virgo,
        &[
            "amethyst-cluster",
            "green-aventurine",
            "sodalite-tumble",
            "smoky-quartz-point",
        ],
    ),
    (
        ZodiacSign::Libra,
        &[
            "rose-quartz-heart",
            "lapis-lazuli-pendant",
            "labradorite-palm-stone",
            "moonstone-ring",
        ],
    ),
    (
        ZodiacSign::Scorpio,
        &[
            "obsidian-sphere",
            "black-tourmaline",
            "garnet-earrings",
            "labradorite-palm-stone",
        ],
    ),
    (
        ZodiacSign::Sagittarius,
        &[
            "lapis-lazuli-pendant",
            "sodalite-tumble",
            "amethyst-cluster",
            "smoky-quartz-point",
        ],
    ),
    (
        ZodiacSign::Capricorn,
        &[
            "smoky-quartz-point",
            "black-tourmaline",
            "garnet-earrings",
            "obsidian-sphere",
        ],
    ),
    (
        ZodiacSign::Aquarius,
        &[
            "amethyst-cluster",
            "aquamarine-tumble",
            "fluorite-tower",
            "clear-quartz-tower",
        ],
    ),
    (
        ZodiacSign::Pisces,
        &[
            "amethyst-cluster",
            "aquamarine-tumble",
            "moonstone-ring",
            "fluorite-tower",
        ],
    ),
];

/// Crystal properties that serve each intention.
pub const INTENTION_PROPERTIES: &[(Intention, &[&str])] = &[
    (Intention::Love, &["love", "healing", "balance"]),
    (Intention::Protection, &["protection", "grounding"]),
    (Intention::Abundance, &["abundance", "confidence"]),
    (Intention::Calm, &["calm", "balance", "healing"]),
    (Intention::Clarity, &["clarity", "intuition"]),
    (Intention::Energy, &["energy", "creativity", "confidence"]),
];

/// Slugs paired with `sign`.
#[must_use]
pub fn sign_crystals(sign: ZodiacSign) -> &'static [&'static str] {
    SIGN_CRYSTALS
        .iter()
        .find(|(s, _)| *s == sign)
        .map_or(&[][..], |&(_, slugs)| slugs)
}

/// A scored recommendation.
#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    pub crystal: Crystal,
    pub score: u32,
    /// Intention properties the crystal carries.
    pub matched_properties: Vec<String>,
}

/// Recommend crystals for a sign, optionally ranked by an intention.
///
/// Single pass over `crystals`: sign matches score 2 and each property
/// serving the intention adds 1. Crystals that do not match the sign are
/// excluded. Ties break on name.
#[must_use]
pub fn recommend(
    crystals: &[Crystal],
    sign: ZodiacSign,
    intention: Option<Intention>,
    limit: usize,
) -> Vec<Recommendation> {
    let paired = sign_crystals(sign);
    let wanted = intention.map_or(&[][..], Intention::properties);

    let mut matches: Vec<Recommendation> = crystals
        .iter()
        .filter(|c| c.is_active && (paired.contains(&c.slug.as_str()) || c.has_sign(sign)))
        .map(|crystal| {
            let matched_properties: Vec<String> = crystal
                .properties
                .iter()
                .filter(|p| wanted.contains(&p.as_str()))
                .cloned()
                .collect();
            let bonus = u32::try_from(matched_properties.len()).unwrap_or(u32::MAX);
            Recommendation {
                crystal: crystal.clone(),
                score: SIGN_MATCH_SCORE.saturating_add(bonus),
                matched_properties,
            }
        })
        .collect();

    matches.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| a.crystal.name.cmp(&b.crystal.name))
    });
    matches.truncate(limit);
    matches
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use moonstone_db::fixtures::{CRYSTALS, sample_catalog};

    fn slugs(recs: &[Recommendation]) -> Vec<&str> {
        recs.iter().map(|r| r.crystal.slug.as_str()).collect()
    }

    #[test]
    fn test_every_paired_slug_exists() {
        for sign in ZodiacSign::ALL {
            for slug in sign_crystals(sign) {
                assert!(
                    CRYSTALS.iter().any(|c| c.slug == *slug),
                    "{sign}: unknown crystal {slug}"
                );
            }
        }
    }

    #[test]
    fn test_sign_only_sorts_by_name() {
        let recs = recommend(&sample_catalog(), ZodiacSign::Cancer, None, 10);
        assert!(recs.iter().all(|r| r.score == SIGN_MATCH_SCORE));
        assert_eq!(
            slugs(&recs),
            vec![
                "labradorite-palm-stone",
                "moonstone-ring",
                "rose-quartz-heart",
                "selenite-wand"
            ]
        );
    }

    #[test]
    fn test_intention_reranks_without_adding() {
        let catalog = sample_catalog();
        let plain = recommend(&catalog, ZodiacSign::Scorpio, None, 20);
        let ranked = recommend(&catalog, ZodiacSign::Scorpio, Some(Intention::Protection), 20);

        assert_eq!(plain.len(), ranked.len());
        // Black tourmaline, obsidian and smoky quartz carry both protection and grounding.
        assert_eq!(ranked[0].score, 4);
        assert_eq!(ranked[0].crystal.slug, "black-tourmaline");
        assert!(
            ranked
                .windows(2)
                .all(|w| w[0].score >= w[1].score)
        );
    }

    #[test]
    fn test_crystal_listing_the_sign_matches() {
        // Pyrite lists Leo but is not in Leo's table.
        let recs = recommend(&sample_catalog(), ZodiacSign::Leo, None, 20);
        assert!(slugs(&recs).contains(&"pyrite-cube"));
    }

    #[test]
    fn test_limit_truncates() {
        let recs = recommend(&sample_catalog(), ZodiacSign::Leo, Some(Intention::Energy), 3);
        assert_eq!(recs.len(), 3);
    }

    #[test]
    fn test_inactive_excluded() {
        let mut catalog = sample_catalog();
        for crystal in &mut catalog {
            crystal.is_active = crystal.slug != "moonstone-ring";
        }
        let recs = recommend(&catalog, ZodiacSign::Cancer, None, 10);
        assert!(!slugs(&recs).contains(&"moonstone-ring"));
    }

    #[test]
    fn test_tables_cover_every_key() {
        for sign in ZodiacSign::ALL {
            assert!(!sign_crystals(sign).is_empty(), "{sign}");
        }
        for intention in Intention::ALL {
            assert!(!intention.properties().is_empty(), "{intention}");
        }
    }

    #[test]
    fn test_intention_parse() {
        assert_eq!("Calm".parse::<Intention>().unwrap(), Intention::Calm);
        assert!("luck".parse::<Intention>().is_err());
    }
}
