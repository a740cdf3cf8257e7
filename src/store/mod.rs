pub mod memory;
pub mod mongo;

use crate::errors::StoreError;
use crate::schemas::{InvestmentCategory, ProfilePatch, Record, RecordKind, RecordPatch, User};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use memory::MemoryUserStore;
pub use mongo::MongoUserStore;

/// A user aggregate as persisted: the aggregate itself plus credentials and
/// bookkeeping timestamps that never leave the store layer.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDocument {
    #[serde(flatten)]
    pub user: User,
    pub password_hash: String,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl UserDocument {
    pub fn new(user: User, password_hash: String) -> Self {
        let now = Utc::now();
        UserDocument {
            user,
            password_hash,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Persistence for user aggregates. Every mutation touches exactly one user
/// document and returns the updated aggregate, or `None` when the user (or
/// the addressed sub-record) does not exist.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `StoreError::DuplicateEmail` if the email is taken.
    async fn insert_user(&self, document: UserDocument) -> Result<(), StoreError>;

    async fn find_user(&self, user_id: &str) -> Result<Option<User>, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<UserDocument>, StoreError>;

    async fn list_users(&self) -> Result<Vec<User>, StoreError>;

    async fn update_profile(
        &self,
        user_id: &str,
        patch: &ProfilePatch,
    ) -> Result<Option<User>, StoreError>;

    /// Returns false when the user does not exist.
    async fn set_password_hash(&self, user_id: &str, password_hash: &str)
        -> Result<bool, StoreError>;

    async fn delete_user(&self, user_id: &str) -> Result<Option<User>, StoreError>;

    async fn push_record(&self, user_id: &str, record: Record) -> Result<Option<User>, StoreError>;

    async fn update_record(
        &self,
        user_id: &str,
        record_id: &str,
        patch: &RecordPatch,
    ) -> Result<Option<User>, StoreError>;

    async fn remove_record(
        &self,
        user_id: &str,
        kind: RecordKind,
        record_id: &str,
    ) -> Result<Option<User>, StoreError>;

    async fn set_investment_categories(
        &self,
        user_id: &str,
        categories: &[InvestmentCategory],
    ) -> Result<Option<User>, StoreError>;
}
