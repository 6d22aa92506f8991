//! User and address domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use moonstone_core::{AddressId, Email, Money, UserId, UserRole};

/// A customer or admin account.
///
/// Guests checking out without an account also get a row (created by the
/// payment webhook) so their orders can be linked if they register later.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// User's email address.
    pub email: Email,
    /// Display name, if known.
    pub name: Option<String>,
    /// Account role.
    pub role: UserRole,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Whether the user may sign in to the admin dashboards.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// Name for greetings, falling back to the email's local part.
    #[must_use]
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| self.email.greeting_name())
    }
}

/// A shipping address.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Address {
    pub id: AddressId,
    /// Owner; `None` for addresses attached to guest orders.
    pub user_id: Option<UserId>,
    pub name: String,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}

impl Address {
    /// Single-line rendering for lists and emails.
    #[must_use]
    pub fn one_line(&self) -> String {
        let mut parts = vec![self.line1.clone()];
        if let Some(line2) = self.line2.as_deref().filter(|l| !l.is_empty()) {
            parts.push(line2.to_owned());
        }
        parts.push(format!("{}, {} {}", self.city, self.state, self.postal_code));
        parts.push(self.country.clone());
        parts.join(", ")
    }
}

/// Address fields submitted by a customer or decoded from order metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAddress {
    pub name: String,
    pub line1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    #[serde(default = "default_country")]
    pub country: String,
}

fn default_country() -> String {
    "US".to_owned()
}

impl NewAddress {
    /// Names of required fields that are blank.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("name", &self.name),
            ("line1", &self.line1),
            ("city", &self.city),
            ("state", &self.state),
            ("postal_code", &self.postal_code),
            ("country", &self.country),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
        .collect()
    }
}

/// A customer row for the admin customer list.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CustomerSummary {
    pub id: UserId,
    pub email: String,
    pub name: Option<String>,
    pub order_count: i64,
    pub total_spent: Money,
    pub last_order_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Filters for the admin customer list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CustomerFilter {
    /// Matches email or name.
    pub q: Option<String>,
    pub page: Option<u32>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn address() -> NewAddress {
        NewAddress {
            name: "Luna Vale".to_owned(),
            line1: "12 Quartz Lane".to_owned(),
            line2: None,
            city: "Sedona".to_owned(),
            state: "AZ".to_owned(),
            postal_code: "86336".to_owned(),
            country: "US".to_owned(),
        }
    }

    #[test]
    fn test_missing_fields() {
        assert!(address().missing_fields().is_empty());

        let mut incomplete = address();
        incomplete.city = "  ".to_owned();
        incomplete.postal_code = String::new();
        assert_eq!(incomplete.missing_fields(), vec!["city", "postal_code"]);
    }

    #[test]
    fn test_country_defaults_to_us() {
        let parsed: NewAddress = serde_json::from_str(
            r#"{"name":"A","line1":"1 Main","city":"X","state":"CA","postal_code":"90210"}"#,
        )
        .unwrap();
        assert_eq!(parsed.country, "US");
    }
}
