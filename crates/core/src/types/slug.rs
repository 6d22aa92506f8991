//! URL slugs for crystals, blog posts and static pages.

/// Maximum slug length accepted by [`is_valid_slug`].
pub const MAX_SLUG_LENGTH: usize = 100;

/// Turn a title into a URL slug.
///
/// Lowercases ASCII letters, keeps digits, collapses every other run of
/// characters into a single `-` and trims dashes from both ends.
///
/// ```
/// use moonstone_core::slugify;
///
/// assert_eq!(slugify("Rose Quartz & Love: A Guide"), "rose-quartz-love-a-guide");
/// ```
#[must_use]
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;

    for c in input.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else if c != '\'' {
            // apostrophes vanish: "Aries' stones" -> "aries-stones"
            pending_dash = true;
        }
    }

    if slug.len() > MAX_SLUG_LENGTH {
        slug.truncate(MAX_SLUG_LENGTH);
        while slug.ends_with('-') {
            slug.pop();
        }
    }

    slug
}

/// Whether `slug` is lowercase kebab-case with no leading, trailing or
/// doubled dashes.
#[must_use]
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug.len() <= MAX_SLUG_LENGTH
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && !slug.contains("--")
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("Amethyst Cluster"), "amethyst-cluster");
        assert_eq!(slugify("  Black   Tourmaline  "), "black-tourmaline");
        assert_eq!(slugify("Top 5 Crystals for 2025!"), "top-5-crystals-for-2025");
    }

    #[test]
    fn test_slugify_apostrophes_and_symbols() {
        assert_eq!(slugify("Aries' Power Stones"), "aries-power-stones");
        assert_eq!(slugify("Citrine & Pyrite"), "citrine-pyrite");
        assert_eq!(slugify("---"), "");
    }

    #[test]
    fn test_slugify_truncates() {
        let long = "word ".repeat(60);
        let slug = slugify(&long);
        assert!(slug.len() <= MAX_SLUG_LENGTH);
        assert!(is_valid_slug(&slug));
    }

    #[test]
    fn test_is_valid_slug() {
        assert!(is_valid_slug("rose-quartz"));
        assert!(is_valid_slug("moonstone2"));
        assert!(!is_valid_slug(""));
        assert!(!is_valid_slug("Rose-Quartz"));
        assert!(!is_valid_slug("rose--quartz"));
        assert!(!is_valid_slug("-rose"));
        assert!(!is_valid_slug("rose_quartz"));
    }
}
