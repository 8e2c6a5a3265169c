use sqlx::Row;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::error::DomainError;
use crate::domain::post::Post;
use crate::domain::validate;
use crate::infra::db::Db;

#[derive(Clone)]
pub struct PostService {
    db: Db,
}

impl PostService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub async fn create_post(&self, author_id: Uuid, body: String) -> Result<Post, DomainError> {
        validate::validate_post_body(&body)?;

        let row = sqlx::query(
            "WITH inserted_post AS ( \
                INSERT INTO posts (author_id, body) \
                VALUES ($1, $2) \
                RETURNING id, author_id, body, created_at \
             ) \
             SELECT p.*, u.username AS author_username \
             FROM inserted_post p \
             JOIN users u ON u.id = p.author_id",
        )
        .bind(author_id)
        .bind(body)
        .fetch_one(self.db.pool())
        .await?;

        Ok(post_from_row(row))
    }

    pub async fn get_post(&self, post_id: Uuid) -> Result<Option<Post>, DomainError> {
        let row = sqlx::query(
            "SELECT p.id, p.author_id, u.username AS author_username, p.body, p.created_at \
             FROM posts p \
             JOIN users u ON u.id = p.author_id \
             WHERE p.id = $1",
        )
        .bind(post_id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(post_from_row))
    }

    /// Scoped to the author; a post that exists but belongs to someone else
    /// reads as absent.
    pub async fn delete_post(&self, post_id: Uuid, author_id: Uuid) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1 AND author_id = $2")
            .bind(post_id)
            .bind(author_id)
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn list_posts(
        &self,
        cursor: Option<(OffsetDateTime, Uuid)>,
        limit: i64,
    ) -> Result<Vec<Post>, DomainError> {
        let rows = match cursor {
            Some((created_at, post_id)) => {
                sqlx::query(
                    "SELECT p.id, p.author_id, u.username AS author_username, p.body, p.created_at \
                     FROM posts p \
                     JOIN users u ON u.id = p.author_id \
                     WHERE p.created_at < $1 OR (p.created_at = $1 AND p.id < $2) \
                     ORDER BY p.created_at DESC, p.id DESC \
                     LIMIT $3",
                )
                .bind(created_at)
                .bind(post_id)
                .bind(limit)
                .fetch_all(self.db.pool())
                .await?
            }
            None => {
                sqlx::query(
                    "SELECT p.id, p.author_id, u.username AS author_username, p.body, p.created_at \
                     FROM posts p \
                     JOIN users u ON u.id = p.author_id \
                     ORDER BY p.created_at DESC, p.id DESC \
                     LIMIT $1",
                )
                .bind(limit)
                .fetch_all(self.db.pool())
                .await?
            }
        };

        Ok(rows.into_iter().map(post_from_row).collect())
    }

    pub async fn by_author(
        &self,
        author_id: Uuid,
        cursor: Option<(OffsetDateTime, Uuid)>,
        limit: i64,
    ) -> Result<Vec<Post>, DomainError> {
        self.by_authors(&[author_id], cursor, limit).await
    }

    /// Batched fetch for a whole source-account set in one query. Each post
    /// is returned once even if `author_ids` contains duplicates.
    pub async fn by_authors(
        &self,
        author_ids: &[Uuid],
        cursor: Option<(OffsetDateTime, Uuid)>,
        limit: i64,
    ) -> Result<Vec<Post>, DomainError> {
        if author_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = match cursor {
            Some((created_at, post_id)) => {
                sqlx::query(
                    "SELECT p.id, p.author_id, u.username AS author_username, p.body, p.created_at \
                     FROM posts p \
                     JOIN users u ON u.id = p.author_id \
                     WHERE p.author_id = ANY($1) \
                       AND (p.created_at < $2 OR (p.created_at = $2 AND p.id < $3)) \
                     ORDER BY p.created_at DESC, p.id DESC \
                     LIMIT $4",
                )
                .bind(author_ids.to_vec())
                .bind(created_at)
                .bind(post_id)
                .bind(limit)
                .fetch_all(self.db.pool())
                .await?
            }
            None => {
                sqlx::query(
                    "SELECT p.id, p.author_id, u.username AS author_username, p.body, p.created_at \
                     FROM posts p \
                     JOIN users u ON u.id = p.author_id \
                     WHERE p.author_id = ANY($1) \
                     ORDER BY p.created_at DESC, p.id DESC \
                     LIMIT $2",
                )
                .bind(author_ids.to_vec())
                .bind(limit)
                .fetch_all(self.db.pool())
                .await?
            }
        };

        Ok(rows.into_iter().map(post_from_row).collect())
    }
}

fn post_from_row(row: sqlx::postgres::PgRow) -> Post {
    Post {
        id: row.get("id"),
        author_id: row.get("author_id"),
        author_username: Some(row.get("author_username")),
        body: row.get("body"),
        created_at: row.get("created_at"),
    }
}
