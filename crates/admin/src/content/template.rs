//! Template-based post writer.

use std::fmt::Write as _;

use moonstone_core::slugify;
use moonstone_db::models::Crystal;

use super::topics::{Topic, TopicKind, TopicSubject};
use super::{GeneratedPost, PostSource, excerpt_for, meta_description_for};

/// Writes posts from fixed prose templates and catalog facts.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateGenerator;

impl TemplateGenerator {
    /// Write a post about `topic` featuring crystals from `catalog`.
    #[must_use]
    pub fn generate(&self, topic: &Topic, catalog: &[Crystal]) -> GeneratedPost {
        let featured = topic.select(catalog);
        let mut body = String::new();

        body.push_str(&intro(topic, &featured));
        body.push_str("\n\n");

        if !featured.is_empty() {
            let _ = writeln!(body, "## {}\n", section_heading(topic.kind()));
            for crystal in &featured {
                body.push_str(&crystal_section(topic, crystal));
                body.push_str("\n\n");
            }
        }

        body.push_str(&practice_section(topic));
        body.push_str("\n\n");
        body.push_str(&closing(&featured));
        body.push('\n');

        let excerpt = excerpt_for(&body);
        let meta_description = meta_description_for(&excerpt);

        GeneratedPost {
            title: topic.title.to_string(),
            slug: slugify(topic.title),
            excerpt,
            meta_description,
            body_markdown: body,
            tags: topic.tags.iter().map(|t| (*t).to_string()).collect(),
            source: PostSource::Template,
            image_url: featured.first().and_then(|c| c.image_url.clone()),
        }
    }
}

fn names(crystals: &[&Crystal]) -> String {
    let names: Vec<&str> = crystals.iter().map(|c| c.name.as_str()).collect();
    match names.as_slice() {
        [] => "a few favorite stones".to_string(),
        [one] => (*one).to_string(),
        [init @ .., last] => format!("{} and {last}", init.join(", ")),
    }
}

fn intro(topic: &Topic, featured: &[&Crystal]) -> String {
    let stones = names(featured);
    match topic.subject {
        TopicSubject::Crystal(_) => format!(
            "Some stones earn a permanent place on the altar, and {stones} is one of them. \
             In this spotlight we look at where it comes from, what people reach for it for, \
             and how it pairs with the stones that share its energy. Whether you are buying \
             your first crystal or adding to a collection you have tended for years, it \
             rewards a little attention and a quiet moment of intention."
        ),
        TopicSubject::Sign(sign) => format!(
            "Every sign has its own rhythm, and {sign} is no exception. As a {element} sign, \
             {sign} tends to move through the world in a way that some crystals support \
             beautifully. Below we gather the stones that resonate most with {sign}: \
             {stones}. Keep one close during your birthday season, or whenever you want to \
             feel more like yourself.",
            sign = sign.display_name(),
            element = sign.element(),
        ),
        TopicSubject::Chakra(_) => format!(
            "The {label} is one of the seven energy centers described in yogic tradition. \
             When it feels blocked you may notice it in your mood, your body or your \
             relationships; when it flows freely, everything feels a little lighter. \
             Crystals are a simple, tactile way to bring your attention back to it. These \
             are the stones we recommend most often: {stones}.",
            label = topic.subject_label(),
        ),
        TopicSubject::Care(_) => format!(
            "Crystals are hardy, but they are not indestructible, and the way you cleanse \
             and store them matters. Some stones fade in strong sun, some dissolve in water, \
             and some scratch more easily than you might expect. This guide walks through \
             the simple habits that keep a collection looking and feeling its best, using \
             {stones} as examples."
        ),
    }
}

const fn section_heading(kind: TopicKind) -> &'static str {
    match kind {
        TopicKind::CrystalSpotlight => "Meet the stones",
        TopicKind::ZodiacGuide => "Crystals for your sign",
        TopicKind::ChakraGuide => "Stones for this chakra",
        TopicKind::CareGuide => "Stone by stone",
    }
}

fn crystal_section(topic: &Topic, crystal: &Crystal) -> String {
    let mut section = format!("### {}\n\n{}", crystal.name, crystal.description);

    if !crystal.properties.is_empty() {
        let _ = write!(
            section,
            " People choose it for {}.",
            crystal.properties.join(", ")
        );
    }
    if !crystal.chakras.is_empty() {
        let chakras: Vec<String> = crystal.chakras.iter().map(|c| c.replace('-', " ")).collect();
        let _ = write!(section, " It is associated with the {} chakra.", chakras.join(" and "));
    }
    if matches!(topic.kind(), TopicKind::CareGuide) {
        let _ = write!(section, " {}", care_tip(crystal));
    }
    let _ = write!(
        section,
        "\n\n[Shop {}](/products/{}) from {}.",
        crystal.name,
        crystal.slug,
        crystal.price.display()
    );
    section
}

/// Care advice keyed on what the stone is.
fn care_tip(crystal: &Crystal) -> &'static str {
    let slug = crystal.slug.as_str();
    if slug.contains("selenite") {
        "Keep it dry: selenite is soft and water dissolves its surface. Cleanse it with sound or moonlight instead."
    } else if slug.contains("pyrite") {
        "Avoid water and humidity, which tarnish pyrite. Wipe it with a dry cloth."
    } else if slug.contains("amethyst") || slug.contains("rose-quartz") {
        "Keep it out of long, direct sunlight, which slowly fades its color."
    } else {
        "A rinse in cool water and a rest on a windowsill overnight is all it needs."
    }
}

fn practice_section(topic: &Topic) -> String {
    let steps = match topic.kind() {
        TopicKind::CrystalSpotlight | TopicKind::ZodiacGuide => [
            "Hold the stone for a minute each morning and set one clear intention for the day.",
            "Keep it where you will see it often: a desk, a nightstand, a coat pocket.",
            "Cleanse it regularly, especially after a heavy week.",
        ],
        TopicKind::ChakraGuide => [
            "Lie down and rest the stone over the chakra's place on the body for five to ten minutes.",
            "Breathe slowly and picture the chakra's color growing brighter with each breath.",
            "Finish by drinking a glass of water and noting how you feel.",
        ],
        TopicKind::CareGuide => [
            "Cleanse after use with sound, smoke, moonlight or a selenite plate.",
            "Store stones apart so harder crystals do not scratch softer ones.",
            "Dust gently with a soft, dry cloth; skip soaps and sprays.",
        ],
    };

    let mut section = String::from("## Working with your crystals\n\n");
    for step in steps {
        let _ = writeln!(section, "- {step}");
    }
    section.push_str(
        "\nThere is no single right way to work with crystals. Treat these as a starting \
         point, notice what feels good, and let your practice grow from there. Crystals \
         are companions for reflection, not a replacement for care from a qualified \
         professional.",
    );
    section
}

fn closing(featured: &[&Crystal]) -> String {
    format!(
        "## Bring them home\n\nEvery piece in our shop is hand selected and ethically \
         sourced. Explore {} and the rest of the [collection](/products), or take the \
         [zodiac quiz](/zodiac) to find the stones that match your sign. Questions about a \
         stone? Reply to any of our emails and someone from the studio will help you \
         choose.",
        names(featured)
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use moonstone_db::fixtures::sample_catalog;

    use super::super::topics::{TOPICS, find_topic};
    use super::*;

    #[test]
    fn test_generates_every_topic() {
        let catalog = sample_catalog();
        for topic in TOPICS {
            let post = TemplateGenerator.generate(topic, &catalog);
            assert_eq!(post.title, topic.title);
            assert!(moonstone_core::is_valid_slug(&post.slug), "{}", post.slug);
            assert_eq!(post.source, PostSource::Template);
            assert!(!post.excerpt.is_empty());
            assert!(post.meta_description.chars().count() <= 160);
            assert!(
                post.body_markdown.split_whitespace().count() >= 300,
                "{} is too short",
                topic.key
            );
        }
    }

    #[test]
    fn test_spotlight_links_featured_crystals() {
        let catalog = sample_catalog();
        let topic = find_topic("amethyst-spotlight").unwrap();
        let post = TemplateGenerator.generate(topic, &catalog);
        assert!(post.body_markdown.contains("### Amethyst Cluster"));
        assert!(post.body_markdown.contains("(/products/amethyst-cluster)"));
        assert_eq!(
            post.image_url.as_deref(),
            Some("/static/images/crystals/amethyst-cluster.jpg")
        );
        assert_eq!(post.tags, vec!["amethyst", "calm", "sleep"]);
    }

    #[test]
    fn test_care_guide_includes_tips() {
        let catalog = sample_catalog();
        let topic = find_topic("cleansing-care").unwrap();
        let post = TemplateGenerator.generate(topic, &catalog);
        assert!(post.body_markdown.contains("selenite is soft"));
    }

    #[test]
    fn test_empty_catalog_still_writes_a_post() {
        let post = TemplateGenerator.generate(&TOPICS[0], &[]);
        assert!(post.body_markdown.contains("a few favorite stones"));
        assert!(post.image_url.is_none());
    }

    #[test]
    fn test_names() {
        let catalog = sample_catalog();
        let refs: Vec<&Crystal> = catalog.iter().take(3).collect();
        assert_eq!(
            names(&refs),
            format!("{}, {} and {}", refs[0].name, refs[1].name, refs[2].name)
        );
    }
}
