use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Join document marking a post as bookmarked by a user. Existence of a
/// record for (user, post) is the sole source of truth for "saved".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveRecord {
    pub id: String,
    pub user_id: String,
    pub post_id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}
