//! Fixed blog topics tied to the crystal dataset.

use serde::Serialize;

use moonstone_core::ZodiacSign;
use moonstone_db::models::Crystal;

/// Most crystals featured in one post.
const MAX_FEATURED: usize = 5;

/// The shape of post a topic produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TopicKind {
    CrystalSpotlight,
    ZodiacGuide,
    ChakraGuide,
    CareGuide,
}

/// What a topic is about, and so which crystals it features.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopicSubject {
    /// One crystal, by slug, plus companions sharing a chakra.
    Crystal(&'static str),
    Sign(ZodiacSign),
    Chakra(&'static str),
    /// Care advice for the listed crystals.
    Care(&'static [&'static str]),
}

/// A blog topic.
#[derive(Debug, Clone, Copy)]
pub struct Topic {
    /// Stable identifier used by the API.
    pub key: &'static str,
    pub title: &'static str,
    pub subject: TopicSubject,
    pub tags: &'static [&'static str],
}

/// All topics, in the order `ms-cli blog generate --topic N` numbers them (from 1).
pub const TOPICS: &[Topic] = &[
    Topic {
        key: "amethyst-spotlight",
        title: "Amethyst: The Calm Stone for Restless Minds",
        subject: TopicSubject::Crystal("amethyst-cluster"),
        tags: &["amethyst", "calm", "sleep"],
    },
    Topic {
        key: "rose-quartz-spotlight",
        title: "Rose Quartz and the Practice of Self-Compassion",
        subject: TopicSubject::Crystal("rose-quartz-heart"),
        tags: &["rose-quartz", "love", "heart-chakra"],
    },
    Topic {
        key: "black-tourmaline-spotlight",
        title: "Black Tourmaline: Grounding and Protection at Home",
        subject: TopicSubject::Crystal("black-tourmaline"),
        tags: &["black-tourmaline", "protection", "grounding"],
    },
    Topic {
        key: "scorpio-crystals",
        title: "Crystals for Scorpio: Depth, Protection and Renewal",
        subject: TopicSubject::Sign(ZodiacSign::Scorpio),
        tags: &["zodiac", "scorpio"],
    },
    Topic {
        key: "leo-crystals",
        title: "Crystals for Leo: Warmth, Courage and Creative Fire",
        subject: TopicSubject::Sign(ZodiacSign::Leo),
        tags: &["zodiac", "leo"],
    },
    Topic {
        key: "pisces-crystals",
        title: "Crystals for Pisces: Intuition, Dreams and Calm Waters",
        subject: TopicSubject::Sign(ZodiacSign::Pisces),
        tags: &["zodiac", "pisces"],
    },
    Topic {
        key: "heart-chakra",
        title: "Opening the Heart Chakra with Green and Pink Stones",
        subject: TopicSubject::Chakra("heart"),
        tags: &["chakras", "heart-chakra", "love"],
    },
    Topic {
        key: "root-chakra",
        title: "Root Chakra Crystals for Feeling Safe and Grounded",
        subject: TopicSubject::Chakra("root"),
        tags: &["chakras", "root-chakra", "grounding"],
    },
    Topic {
        key: "third-eye-chakra",
        title: "Third Eye Chakra Crystals for Clarity and Insight",
        subject: TopicSubject::Chakra("third-eye"),
        tags: &["chakras", "third-eye", "intuition"],
    },
    Topic {
        key: "cleansing-care",
        title: "How to Cleanse and Care for Your Crystals",
        subject: TopicSubject::Care(&[
            "selenite-wand",
            "clear-quartz-tower",
            "amethyst-cluster",
            "pyrite-cube",
            "rose-quartz-heart",
        ]),
        tags: &["crystal-care", "cleansing", "beginners"],
    },
];

impl Topic {
    #[must_use]
    pub const fn kind(&self) -> TopicKind {
        match self.subject {
            TopicSubject::Crystal(_) => TopicKind::CrystalSpotlight,
            TopicSubject::Sign(_) => TopicKind::ZodiacGuide,
            TopicSubject::Chakra(_) => TopicKind::ChakraGuide,
            TopicSubject::Care(_) => TopicKind::CareGuide,
        }
    }

    /// Crystals from `catalog` this topic features, most relevant first.
    #[must_use]
    pub fn select<'c>(&self, catalog: &'c [Crystal]) -> Vec<&'c Crystal> {
        let mut featured: Vec<&Crystal> = match self.subject {
            TopicSubject::Crystal(slug) => {
                let Some(hero) = catalog.iter().find(|c| c.slug == slug) else {
                    return Vec::new();
                };
                std::iter::once(hero)
                    .chain(catalog.iter().filter(|c| {
                        c.slug != hero.slug && hero.chakras.iter().any(|chakra| c.has_chakra(chakra))
                    }))
                    .take(3)
                    .collect()
            }
            TopicSubject::Sign(sign) => catalog.iter().filter(|c| c.has_sign(sign)).collect(),
            TopicSubject::Chakra(chakra) => {
                catalog.iter().filter(|c| c.has_chakra(chakra)).collect()
            }
            TopicSubject::Care(slugs) => slugs
                .iter()
                .filter_map(|slug| catalog.iter().find(|c| c.slug == *slug))
                .collect(),
        };
        featured.truncate(MAX_FEATURED);
        featured
    }

    /// Subject in words, for prompts and copy.
    #[must_use]
    pub fn subject_label(&self) -> String {
        match self.subject {
            TopicSubject::Crystal(slug) => slug.replace('-', " "),
            TopicSubject::Sign(sign) => sign.display_name(),
            TopicSubject::Chakra(chakra) => format!("{} chakra", chakra.replace('-', " ")),
            TopicSubject::Care(_) => "crystal care".to_string(),
        }
    }
}

/// Look up a topic by its key.
#[must_use]
pub fn find_topic(key: &str) -> Option<&'static Topic> {
    TOPICS.iter().find(|t| t.key.eq_ignore_ascii_case(key.trim()))
}

/// Topic by its 1-based position in [`TOPICS`].
#[must_use]
pub fn topic_by_number(number: usize) -> Option<&'static Topic> {
    number.checked_sub(1).and_then(|i| TOPICS.get(i))
}

/// The first topic whose template slug is not taken yet, or the first topic.
#[must_use]
pub fn next_topic(existing_slugs: &[String]) -> &'static Topic {
    TOPICS
        .iter()
        .find(|t| {
            let slug = moonstone_core::slugify(t.title);
            !existing_slugs.iter().any(|s| *s == slug)
        })
        .unwrap_or(&TOPICS[0])
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use moonstone_db::fixtures::sample_catalog;

    use super::*;

    #[test]
    fn test_every_topic_features_crystals() {
        let catalog = sample_catalog();
        for topic in TOPICS {
            let featured = topic.select(&catalog);
            assert!(!featured.is_empty(), "{} features nothing", topic.key);
            assert!(featured.len() <= MAX_FEATURED);
        }
    }

    #[test]
    fn test_topic_keys_are_unique_slugs() {
        for (i, topic) in TOPICS.iter().enumerate() {
            assert!(moonstone_core::is_valid_slug(topic.key));
            assert!(TOPICS[i + 1..].iter().all(|t| t.key != topic.key));
        }
    }

    #[test]
    fn test_spotlight_leads_with_its_crystal() {
        let catalog = sample_catalog();
        let topic = find_topic("amethyst-spotlight").unwrap();
        let featured = topic.select(&catalog);
        assert_eq!(featured[0].slug, "amethyst-cluster");
        assert_eq!(topic.kind(), TopicKind::CrystalSpotlight);
    }

    #[test]
    fn test_sign_topic_only_features_that_sign() {
        let catalog = sample_catalog();
        let topic = find_topic("leo-crystals").unwrap();
        assert!(
            topic
                .select(&catalog)
                .iter()
                .all(|c| c.has_sign(ZodiacSign::Leo))
        );
    }

    #[test]
    fn test_topic_by_number() {
        assert_eq!(topic_by_number(1).unwrap().key, TOPICS[0].key);
        assert!(topic_by_number(0).is_none());
        assert!(topic_by_number(TOPICS.len() + 1).is_none());
    }

    #[test]
    fn test_next_topic_skips_used_slugs() {
        let used = vec![moonstone_core::slugify(TOPICS[0].title)];
        assert_eq!(next_topic(&used).key, TOPICS[1].key);
        assert_eq!(next_topic(&[]).key, TOPICS[0].key);
    }

    #[test]
    fn test_missing_crystal_selects_nothing() {
        let topic = Topic {
            key: "ghost",
            title: "Ghost Quartz",
            subject: TopicSubject::Crystal("ghost-quartz"),
            tags: &[],
        };
        assert!(topic.select(&sample_catalog()).is_empty());
    }
}
