use sqlx::Row;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::account::PublicAccount;
use crate::domain::error::DomainError;
use crate::domain::relationship::{Relationship, RelationshipStatus};
use crate::infra::db::Db;

#[derive(Clone)]
pub struct RelationshipService {
    db: Db,
}

/// A follower/following list entry: the account on the far side of the
/// edge plus when the edge was created.
#[derive(Debug, Clone)]
pub struct FollowEdge {
    pub account: PublicAccount,
    pub followed_at: OffsetDateTime,
}

impl RelationshipService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Create one directed edge. Duplicate edges and unknown accounts are
    /// reported, not masked; the unique constraint is what resolves two
    /// concurrent follows for the same pair, so there is no check-then-insert
    /// on the uniqueness path.
    pub async fn follow(
        &self,
        follower_id: Uuid,
        followed_id: Uuid,
    ) -> Result<Relationship, DomainError> {
        for (id, role) in [(follower_id, "follower"), (followed_id, "followed")] {
            let exists: bool =
                sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE id = $1)")
                    .bind(id)
                    .fetch_one(self.db.pool())
                    .await?;
            if !exists {
                return Err(DomainError::validation(format!(
                    "{} account does not exist",
                    role
                )));
            }
        }

        let row = sqlx::query(
            "INSERT INTO follows (follower_id, followed_id) \
             VALUES ($1, $2) \
             RETURNING id, follower_id, followed_id, created_at",
        )
        .bind(follower_id)
        .bind(followed_id)
        .fetch_one(self.db.pool())
        .await
        .map_err(translate_insert_error)?;

        Ok(Relationship {
            id: row.get("id"),
            follower_id: row.get("follower_id"),
            followed_id: row.get("followed_id"),
            created_at: row.get("created_at"),
        })
    }

    /// Delete the exact identified edge. A stale handle onto an edge that
    /// was already removed reports `NotFound` rather than touching whatever
    /// replaced it.
    pub async fn unfollow(&self, relationship: &Relationship) -> Result<(), DomainError> {
        let result = sqlx::query("DELETE FROM follows WHERE id = $1")
            .bind(relationship.id)
            .execute(self.db.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("relationship not found"));
        }
        Ok(())
    }

    pub async fn get_relationship(
        &self,
        follower_id: Uuid,
        followed_id: Uuid,
    ) -> Result<Relationship, DomainError> {
        let row = sqlx::query(
            "SELECT id, follower_id, followed_id, created_at \
             FROM follows WHERE follower_id = $1 AND followed_id = $2",
        )
        .bind(follower_id)
        .bind(followed_id)
        .fetch_optional(self.db.pool())
        .await?;

        let row = row.ok_or_else(|| DomainError::not_found("relationship not found"))?;
        Ok(Relationship {
            id: row.get("id"),
            follower_id: row.get("follower_id"),
            followed_id: row.get("followed_id"),
            created_at: row.get("created_at"),
        })
    }

    /// Membership test; absence is `false`, never an error.
    pub async fn is_following(
        &self,
        follower_id: Uuid,
        followed_id: Uuid,
    ) -> Result<bool, DomainError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM follows WHERE follower_id = $1 AND followed_id = $2)",
        )
        .bind(follower_id)
        .bind(followed_id)
        .fetch_one(self.db.pool())
        .await?;
        Ok(exists)
    }

    /// Ids of everyone who follows `user_id`. Duplicate-free by the edge
    /// uniqueness invariant; order unspecified.
    pub async fn follower_ids(&self, user_id: Uuid) -> Result<Vec<Uuid>, DomainError> {
        let ids = sqlx::query_scalar("SELECT follower_id FROM follows WHERE followed_id = $1")
            .bind(user_id)
            .fetch_all(self.db.pool())
            .await?;
        Ok(ids)
    }

    /// Ids of everyone `user_id` follows.
    pub async fn following_ids(&self, user_id: Uuid) -> Result<Vec<Uuid>, DomainError> {
        let ids = sqlx::query_scalar("SELECT followed_id FROM follows WHERE follower_id = $1")
            .bind(user_id)
            .fetch_all(self.db.pool())
            .await?;
        Ok(ids)
    }

    pub async fn list_followers(
        &self,
        user_id: Uuid,
        cursor: Option<(OffsetDateTime, Uuid)>,
        limit: i64,
    ) -> Result<Vec<FollowEdge>, DomainError> {
        let rows = match cursor {
            Some((created_at, follower_id)) => {
                sqlx::query(
                    "SELECT u.id, u.username, u.display_name, u.bio, u.created_at, \
                            f.created_at AS followed_at \
                     FROM follows f \
                     JOIN users u ON u.id = f.follower_id \
                     WHERE f.followed_id = $1 \
                       AND (f.created_at < $2 OR (f.created_at = $2 AND f.follower_id < $3)) \
                     ORDER BY f.created_at DESC, f.follower_id DESC \
                     LIMIT $4",
                )
                .bind(user_id)
                .bind(created_at)
                .bind(follower_id)
                .bind(limit)
                .fetch_all(self.db.pool())
                .await?
            }
            None => {
                sqlx::query(
                    "SELECT u.id, u.username, u.display_name, u.bio, u.created_at, \
                            f.created_at AS followed_at \
                     FROM follows f \
                     JOIN users u ON u.id = f.follower_id \
                     WHERE f.followed_id = $1 \
                     ORDER BY f.created_at DESC, f.follower_id DESC \
                     LIMIT $2",
                )
                .bind(user_id)
                .bind(limit)
                .fetch_all(self.db.pool())
                .await?
            }
        };

        Ok(rows.into_iter().map(edge_from_row).collect())
    }

    pub async fn list_following(
        &self,
        user_id: Uuid,
        cursor: Option<(OffsetDateTime, Uuid)>,
        limit: i64,
    ) -> Result<Vec<FollowEdge>, DomainError> {
        let rows = match cursor {
            Some((created_at, followed_id)) => {
                sqlx::query(
                    "SELECT u.id, u.username, u.display_name, u.bio, u.created_at, \
                            f.created_at AS followed_at \
                     FROM follows f \
                     JOIN users u ON u.id = f.followed_id \
                     WHERE f.follower_id = $1 \
                       AND (f.created_at < $2 OR (f.created_at = $2 AND f.followed_id < $3)) \
                     ORDER BY f.created_at DESC, f.followed_id DESC \
                     LIMIT $4",
                )
                .bind(user_id)
                .bind(created_at)
                .bind(followed_id)
                .bind(limit)
                .fetch_all(self.db.pool())
                .await?
            }
            None => {
                sqlx::query(
                    "SELECT u.id, u.username, u.display_name, u.bio, u.created_at, \
                            f.created_at AS followed_at \
                     FROM follows f \
                     JOIN users u ON u.id = f.followed_id \
                     WHERE f.follower_id = $1 \
                     ORDER BY f.created_at DESC, f.followed_id DESC \
                     LIMIT $2",
                )
                .bind(user_id)
                .bind(limit)
                .fetch_all(self.db.pool())
                .await?
            }
        };

        Ok(rows.into_iter().map(edge_from_row).collect())
    }

    pub async fn relationship_status(
        &self,
        viewer_id: Uuid,
        other_id: Uuid,
    ) -> Result<RelationshipStatus, DomainError> {
        let row = sqlx::query(
            "SELECT \
                EXISTS (SELECT 1 FROM follows WHERE follower_id = $1 AND followed_id = $2) AS is_following, \
                EXISTS (SELECT 1 FROM follows WHERE follower_id = $2 AND followed_id = $1) AS is_followed_by",
        )
        .bind(viewer_id)
        .bind(other_id)
        .fetch_one(self.db.pool())
        .await?;

        Ok(RelationshipStatus {
            is_following: row.get("is_following"),
            is_followed_by: row.get("is_followed_by"),
        })
    }
}

fn edge_from_row(row: sqlx::postgres::PgRow) -> FollowEdge {
    FollowEdge {
        account: PublicAccount {
            id: row.get("id"),
            username: row.get("username"),
            display_name: row.get("display_name"),
            bio: row.get("bio"),
            created_at: row.get("created_at"),
        },
        followed_at: row.get("followed_at"),
    }
}

/// The existence pre-checks above give friendly messages, but the
/// constraints are what close the races: 23505 is the duplicate edge,
/// 23503 an account deleted between check and insert.
fn translate_insert_error(err: sqlx::Error) -> DomainError {
    if let sqlx::Error::Database(ref db_err) = err {
        match db_err.code().as_deref() {
            Some("23505") => return DomainError::conflict("already following this account"),
            Some("23503") => return DomainError::validation("account does not exist"),
            _ => {}
        }
    }
    DomainError::Database(err)
}
