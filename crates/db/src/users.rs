//! User repository.

use sqlx::PgPool;
use tracing::instrument;

use moonstone_core::{Email, UserId, UserRole};

use super::{DEFAULT_PAGE_SIZE, Page, RepositoryError, page_offset, search_pattern};
use crate::models::{CustomerFilter, CustomerSummary, User};

const USER_COLUMNS: &str = "id, email, name, role, created_at, updated_at";

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by their email address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails (including a
    /// stored email that no longer parses).
    pub async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM shop.user WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        Ok(user)
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM shop.user WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(user)
    }

    /// Create a new user with email and password.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    #[instrument(skip(self, password_hash), fields(email = %email))]
    pub async fn create_with_password(
        &self,
        email: &Email,
        name: Option<&str>,
        password_hash: &str,
        role: UserRole,
    ) -> Result<User, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let user = sqlx::query_as::<_, User>(&format!(
            r"
            INSERT INTO shop.user (email, name, role)
            VALUES ($1, $2, $3)
            RETURNING {USER_COLUMNS}
            "
        ))
        .bind(email)
        .bind(name)
        .bind(role)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "email already exists"))?;

        sqlx::query(
            r"
            INSERT INTO shop.user_password (user_id, password_hash)
            VALUES ($1, $2)
            ",
        )
        .bind(user.id)
        .bind(password_hash)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(user)
    }

    /// Set (or replace) a user's password hash.
    ///
    /// Used to give a password to an account first created by checkout.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn set_password(
        &self,
        user_id: UserId,
        password_hash: &str,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO shop.user_password (user_id, password_hash)
            VALUES ($1, $2)
            ON CONFLICT (user_id) DO UPDATE
                SET password_hash = EXCLUDED.password_hash, updated_at = NOW()
            ",
        )
        .bind(user_id)
        .bind(password_hash)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Find or create a customer by email, filling in the name if it was
    /// unknown. Used by the payment webhook for guest checkouts.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert_customer(
        &self,
        email: &Email,
        name: Option<&str>,
    ) -> Result<User, RepositoryError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r"
            INSERT INTO shop.user (email, name)
            VALUES ($1, $2)
            ON CONFLICT (email) DO UPDATE
                SET name = COALESCE(shop.user.name, EXCLUDED.name), updated_at = NOW()
            RETURNING {USER_COLUMNS}
            "
        ))
        .bind(email)
        .bind(name)
        .fetch_one(self.pool)
        .await?;

        Ok(user)
    }

    /// Get a user with their password hash (for login).
    ///
    /// Returns `None` if the user doesn't exist or has no password.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let Some(user) = self.get_by_email(email).await? else {
            return Ok(None);
        };

        let hash: Option<(String,)> =
            sqlx::query_as("SELECT password_hash FROM shop.user_password WHERE user_id = $1")
                .bind(user.id)
                .fetch_optional(self.pool)
                .await?;

        Ok(hash.map(|(hash,)| (user, hash)))
    }

    /// Update a user's display name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    pub async fn update_name(&self, id: UserId, name: &str) -> Result<User, RepositoryError> {
        sqlx::query_as::<_, User>(&format!(
            r"
            UPDATE shop.user SET name = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "
        ))
        .bind(id)
        .bind(name)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// Change a user's role.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    #[instrument(skip(self))]
    pub async fn set_role(&self, id: UserId, role: UserRole) -> Result<User, RepositoryError> {
        sqlx::query_as::<_, User>(&format!(
            r"
            UPDATE shop.user SET role = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "
        ))
        .bind(id)
        .bind(role)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// Customers with order aggregates, most recent buyers first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_customers(
        &self,
        filter: &CustomerFilter,
    ) -> Result<Page<CustomerSummary>, RepositoryError> {
        let pattern = search_pattern(filter.q.as_deref());

        let (total,): (i64,) = sqlx::query_as(
            r"
            SELECT COUNT(*) FROM shop.user u
            WHERE u.role = 'customer'
              AND ($1::TEXT IS NULL OR u.email ILIKE $1 OR u.name ILIKE $1)
            ",
        )
        .bind(pattern.as_deref())
        .fetch_one(self.pool)
        .await?;

        let items = sqlx::query_as::<_, CustomerSummary>(
            r#"
            SELECT u.id, u.email, u.name,
                   COUNT(o.id) AS order_count,
                   COALESCE(SUM(o.total) FILTER (WHERE o.payment_status = 'SUCCEEDED'), 0)
                       AS total_spent,
                   MAX(o.created_at) AS last_order_at,
                   u.created_at
            FROM shop.user u
            LEFT JOIN shop."order" o ON o.user_id = u.id
            WHERE u.role = 'customer'
              AND ($1::TEXT IS NULL OR u.email ILIKE $1 OR u.name ILIKE $1)
            GROUP BY u.id
            ORDER BY MAX(o.created_at) DESC NULLS LAST, u.created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(pattern.as_deref())
        .bind(DEFAULT_PAGE_SIZE)
        .bind(page_offset(filter.page, DEFAULT_PAGE_SIZE))
        .fetch_all(self.pool)
        .await?;

        Ok(Page {
            items,
            total,
            page: filter.page.unwrap_or(1).max(1),
            per_page: DEFAULT_PAGE_SIZE,
        })
    }

    /// Number of customer accounts.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_customers(&self) -> Result<i64, RepositoryError> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM shop.user WHERE role = 'customer'")
                .fetch_one(self.pool)
                .await?;
        Ok(count)
    }
}
