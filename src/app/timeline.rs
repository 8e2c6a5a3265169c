use time::OffsetDateTime;
use uuid::Uuid;

use crate::app::accounts::AccountService;
use crate::app::posts::PostService;
use crate::app::relationships::RelationshipService;
use crate::domain::error::DomainError;
use crate::domain::post::Post;
use crate::infra::db::Db;

/// Pull-time fan-out: every call resolves the source-account set and
/// queries posts fresh. Nothing is materialized or cached, so reads see
/// the graph as it is now, at read latency proportional to the following
/// set. Within one call the follow-set read and the post read are not an
/// atomic snapshot; a concurrent unfollow mid-call is an accepted race.
#[derive(Clone)]
pub struct TimelineService {
    db: Db,
}

impl TimelineService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Posts authored by `user_id`, newest first, ties broken by id
    /// descending. `NotFound` if the account is unknown.
    pub async fn user_timeline(
        &self,
        user_id: Uuid,
        cursor: Option<(OffsetDateTime, Uuid)>,
        limit: i64,
    ) -> Result<Vec<Post>, DomainError> {
        let account = AccountService::new(self.db.clone()).resolve(user_id).await?;
        PostService::new(self.db.clone())
            .by_author(account.id, cursor, limit)
            .await
    }

    /// Posts authored by `user_id` or anyone they follow, one batched
    /// fetch over the whole source set.
    pub async fn home_timeline(
        &self,
        user_id: Uuid,
        cursor: Option<(OffsetDateTime, Uuid)>,
        limit: i64,
    ) -> Result<Vec<Post>, DomainError> {
        let account = AccountService::new(self.db.clone()).resolve(user_id).await?;

        let mut source_ids = RelationshipService::new(self.db.clone())
            .following_ids(account.id)
            .await?;
        source_ids.push(account.id);

        PostService::new(self.db.clone())
            .by_authors(&source_ids, cursor, limit)
            .await
    }
}
