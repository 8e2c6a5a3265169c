use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// One directed follow edge. The ordered pair (follower_id, followed_id)
/// is unique at the storage layer; edges are never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relationship {
    pub id: Uuid,
    pub follower_id: Uuid,
    pub followed_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize)]
pub struct RelationshipStatus {
    pub is_following: bool,
    pub is_followed_by: bool,
}
