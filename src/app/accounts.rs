use sqlx::Row;
use uuid::Uuid;

use crate::domain::account::Account;
use crate::domain::error::DomainError;
use crate::infra::db::Db;

#[derive(Clone)]
pub struct AccountService {
    db: Db,
}

impl AccountService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub async fn get_account(&self, user_id: Uuid) -> Result<Option<Account>, DomainError> {
        let row = sqlx::query(
            "SELECT id, username, email, display_name, bio, created_at \
             FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(account_from_row))
    }

    pub async fn get_account_by_username(
        &self,
        username: &str,
    ) -> Result<Option<Account>, DomainError> {
        let row = sqlx::query(
            "SELECT id, username, email, display_name, bio, created_at \
             FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(account_from_row))
    }

    /// Directory lookup used by the timeline and relationship paths.
    pub async fn resolve(&self, user_id: Uuid) -> Result<Account, DomainError> {
        self.get_account(user_id)
            .await?
            .ok_or_else(|| DomainError::not_found("account not found"))
    }

    pub async fn resolve_by_username(&self, username: &str) -> Result<Account, DomainError> {
        self.get_account_by_username(username)
            .await?
            .ok_or_else(|| DomainError::not_found("account not found"))
    }

    pub async fn update_profile(
        &self,
        user_id: Uuid,
        display_name: Option<String>,
        bio: Option<String>,
    ) -> Result<Option<Account>, DomainError> {
        let row = sqlx::query(
            "UPDATE users \
             SET display_name = COALESCE($2, display_name), \
                 bio = COALESCE($3, bio) \
             WHERE id = $1 \
             RETURNING id, username, email, display_name, bio, created_at",
        )
        .bind(user_id)
        .bind(display_name)
        .bind(bio)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(account_from_row))
    }

    /// Deleting the row cascades to posts, follows, and refresh tokens.
    pub async fn delete_account(&self, user_id: Uuid) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

fn account_from_row(row: sqlx::postgres::PgRow) -> Account {
    Account {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        display_name: row.get("display_name"),
        bio: row.get("bio"),
        created_at: row.get("created_at"),
    }
}
