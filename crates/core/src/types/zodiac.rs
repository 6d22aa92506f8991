//! Western zodiac signs and their elements.
//!
//! Used by the crystal recommendation quiz and by blog content generation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::status::ParseStatusError;

/// Classical element of a sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Element {
    Fire,
    Earth,
    Air,
    Water,
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Fire => "Fire",
            Self::Earth => "Earth",
            Self::Air => "Air",
            Self::Water => "Water",
        })
    }
}

/// One of the twelve tropical zodiac signs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZodiacSign {
    Aries,
    Taurus,
    Gemini,
    Cancer,
    Leo,
    Virgo,
    Libra,
    Scorpio,
    Sagittarius,
    Capricorn,
    Aquarius,
    Pisces,
}

/// First (month, day) of each sign in calendar order. Dates before January 20
/// fall in Capricorn.
const SIGN_STARTS: [(u32, u32, ZodiacSign); 12] = [
    (1, 20, ZodiacSign::Aquarius),
    (2, 19, ZodiacSign::Pisces),
    (3, 21, ZodiacSign::Aries),
    (4, 20, ZodiacSign::Taurus),
    (5, 21, ZodiacSign::Gemini),
    (6, 21, ZodiacSign::Cancer),
    (7, 23, ZodiacSign::Leo),
    (8, 23, ZodiacSign::Virgo),
    (9, 23, ZodiacSign::Libra),
    (10, 23, ZodiacSign::Scorpio),
    (11, 22, ZodiacSign::Sagittarius),
    (12, 22, ZodiacSign::Capricorn),
];

impl ZodiacSign {
    /// All signs starting at Aries.
    pub const ALL: [Self; 12] = [
        Self::Aries,
        Self::Taurus,
        Self::Gemini,
        Self::Cancer,
        Self::Leo,
        Self::Virgo,
        Self::Libra,
        Self::Scorpio,
        Self::Sagittarius,
        Self::Capricorn,
        Self::Aquarius,
        Self::Pisces,
    ];

    /// Sign for a birth date. Returns `None` for impossible dates
    /// (month outside 1..=12 or day outside 1..=31).
    #[must_use]
    pub fn from_birth_date(month: u32, day: u32) -> Option<Self> {
        if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
            return None;
        }

        let mut sign = Self::Capricorn;
        for (start_month, start_day, candidate) in SIGN_STARTS {
            if (month, day) >= (start_month, start_day) {
                sign = candidate;
            }
        }
        Some(sign)
    }

    /// The sign's element.
    #[must_use]
    pub const fn element(self) -> Element {
        match self {
            Self::Aries | Self::Leo | Self::Sagittarius => Element::Fire,
            Self::Taurus | Self::Virgo | Self::Capricorn => Element::Earth,
            Self::Gemini | Self::Libra | Self::Aquarius => Element::Air,
            Self::Cancer | Self::Scorpio | Self::Pisces => Element::Water,
        }
    }

    /// Lowercase identifier used in URLs and the database.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Aries => "aries",
            Self::Taurus => "taurus",
            Self::Gemini => "gemini",
            Self::Cancer => "cancer",
            Self::Leo => "leo",
            Self::Virgo => "virgo",
            Self::Libra => "libra",
            Self::Scorpio => "scorpio",
            Self::Sagittarius => "sagittarius",
            Self::Capricorn => "capricorn",
            Self::Aquarius => "aquarius",
            Self::Pisces => "pisces",
        }
    }

    /// Capitalized name for display.
    #[must_use]
    pub fn display_name(self) -> String {
        let name = self.as_str();
        let mut chars = name.chars();
        chars.next().map_or_else(String::new, |c| {
            c.to_uppercase().chain(chars).collect::<String>()
        })
    }
}

impl fmt::Display for ZodiacSign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name())
    }
}

impl FromStr for ZodiacSign {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Self::ALL
            .into_iter()
            .find(|sign| sign.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| ParseStatusError {
                kind: "zodiac sign",
                value: s.to_owned(),
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_birth_date_boundaries() {
        assert_eq!(ZodiacSign::from_birth_date(3, 20), Some(ZodiacSign::Pisces));
        assert_eq!(ZodiacSign::from_birth_date(3, 21), Some(ZodiacSign::Aries));
        assert_eq!(ZodiacSign::from_birth_date(7, 23), Some(ZodiacSign::Leo));
        assert_eq!(
            ZodiacSign::from_birth_date(12, 22),
            Some(ZodiacSign::Capricorn)
        );
    }

    #[test]
    fn test_from_birth_date_year_wrap() {
        assert_eq!(
            ZodiacSign::from_birth_date(1, 1),
            Some(ZodiacSign::Capricorn)
        );
        assert_eq!(
            ZodiacSign::from_birth_date(1, 19),
            Some(ZodiacSign::Capricorn)
        );
        assert_eq!(
            ZodiacSign::from_birth_date(1, 20),
            Some(ZodiacSign::Aquarius)
        );
        assert_eq!(
            ZodiacSign::from_birth_date(12, 31),
            Some(ZodiacSign::Capricorn)
        );
    }

    #[test]
    fn test_from_birth_date_invalid() {
        assert_eq!(ZodiacSign::from_birth_date(0, 10), None);
        assert_eq!(ZodiacSign::from_birth_date(13, 1), None);
        assert_eq!(ZodiacSign::from_birth_date(5, 0), None);
    }

    #[test]
    fn test_elements() {
        assert_eq!(ZodiacSign::Leo.element(), Element::Fire);
        assert_eq!(ZodiacSign::Virgo.element(), Element::Earth);
        assert_eq!(ZodiacSign::Aquarius.element(), Element::Air);
        assert_eq!(ZodiacSign::Pisces.element(), Element::Water);
    }

    #[test]
    fn test_parse_case_insensitive() {
        assert_eq!(
            "SCORPIO".parse::<ZodiacSign>().unwrap(),
            ZodiacSign::Scorpio
        );
        assert!("ophiuchus".parse::<ZodiacSign>().is_err());
        assert_eq!(ZodiacSign::Sagittarius.to_string(), "Sagittarius");
    }
}
