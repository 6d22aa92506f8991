//! Address repository.

use sqlx::{PgConnection, PgExecutor, PgPool};

use moonstone_core::{AddressId, UserId};

use super::RepositoryError;
use crate::models::{Address, NewAddress};

const ADDRESS_COLUMNS: &str = r"
    id, user_id, name, line1, line2, city, state, postal_code, country, is_default, created_at
";

/// Repository for shipping addresses.
pub struct AddressRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AddressRepository<'a> {
    /// Create a new address repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert an address. The first address a user saves becomes the default.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create(
        &self,
        user_id: Option<UserId>,
        address: &NewAddress,
    ) -> Result<Address, RepositoryError> {
        insert(self.pool, user_id, address).await
    }

    /// Addresses saved by a user, default first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Address>, RepositoryError> {
        let addresses = sqlx::query_as::<_, Address>(&format!(
            r"
            SELECT {ADDRESS_COLUMNS} FROM shop.address
            WHERE user_id = $1
            ORDER BY is_default DESC, created_at DESC
            "
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(addresses)
    }

    /// Delete a user's address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the address does not exist or
    /// belongs to another user.
    pub async fn delete(&self, user_id: UserId, id: AddressId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.address WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

/// Address id for an order's shipping address, inside the order's transaction.
///
/// A customer who ships to an address already in their book reuses that row;
/// guest orders always get their own row.
pub(crate) async fn save_for_order(
    conn: &mut PgConnection,
    user_id: Option<UserId>,
    address: &NewAddress,
) -> Result<AddressId, RepositoryError> {
    if let Some(user_id) = user_id {
        let existing: Option<(AddressId,)> = sqlx::query_as(
            r"
            SELECT id FROM shop.address
            WHERE user_id = $1 AND name = $2 AND line1 = $3
              AND line2 IS NOT DISTINCT FROM $4
              AND city = $5 AND state = $6 AND postal_code = $7 AND country = $8
            ORDER BY id
            LIMIT 1
            ",
        )
        .bind(user_id)
        .bind(&address.name)
        .bind(&address.line1)
        .bind(address.line2.as_deref())
        .bind(&address.city)
        .bind(&address.state)
        .bind(&address.postal_code)
        .bind(&address.country)
        .fetch_optional(&mut *conn)
        .await?;

        if let Some((id,)) = existing {
            return Ok(id);
        }
    }

    Ok(insert(&mut *conn, user_id, address).await?.id)
}

/// Insert an address. The first address a user saves becomes the default.
async fn insert<'e>(
    executor: impl PgExecutor<'e>,
    user_id: Option<UserId>,
    address: &NewAddress,
) -> Result<Address, RepositoryError> {
    let created = sqlx::query_as::<_, Address>(&format!(
        r"
        INSERT INTO shop.address
            (user_id, name, line1, line2, city, state, postal_code, country, is_default)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8,
                $1::INTEGER IS NOT NULL
                AND NOT EXISTS (SELECT 1 FROM shop.address WHERE user_id = $1))
        RETURNING {ADDRESS_COLUMNS}
        "
    ))
    .bind(user_id)
    .bind(&address.name)
    .bind(&address.line1)
    .bind(address.line2.as_deref())
    .bind(&address.city)
    .bind(&address.state)
    .bind(&address.postal_code)
    .bind(&address.country)
    .fetch_one(executor)
    .await?;

    Ok(created)
}
