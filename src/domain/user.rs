use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::domain::engagement::SaveRecord;

/// The raw auth account held by the backend's account service.
#[derive(Debug, Clone, Deserialize)]
pub struct Account {
    pub id: String,
    pub email: String,
    pub name: String,
}

/// A profile document in the users collection, linked to an account
/// through `account_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDoc {
    pub id: String,
    pub account_id: String,
    pub name: String,
    pub username: String,
    pub email: String,
    pub image_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// The signed-in viewer: profile plus their save records, assembled by
/// `AuthService::current_user`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    pub user: UserDoc,
    pub saves: Vec<SaveRecord>,
}

impl CurrentUser {
    pub fn save_record_for(&self, post_id: &str) -> Option<&SaveRecord> {
        self.saves.iter().find(|record| record.post_id == post_id)
    }
}
