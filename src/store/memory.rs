use super::{UserDocument, UserStore};
use crate::errors::StoreError;
use crate::schemas::{InvestmentCategory, ProfilePatch, Record, RecordKind, RecordPatch, User};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

/// In-memory user store keyed by user id. Each operation holds the lock for
/// its whole read-modify-write, so mutations are atomic per user.
#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<String, UserDocument>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn modify<F>(&self, user_id: &str, change: F) -> Option<User>
    where
        F: FnOnce(&mut User) -> bool + Send,
    {
        let mut users = self.users.write().await;
        let document = users.get_mut(user_id)?;
        if !change(&mut document.user) {
            return None;
        }
        document.updated_at = Utc::now();
        Some(document.user.clone())
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn insert_user(&self, document: UserDocument) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        let email = &document.user.profile.email;
        if users.values().any(|other| &other.user.profile.email == email) {
            return Err(StoreError::DuplicateEmail(email.clone()));
        }
        debug!(%email, "User inserted");
        users.insert(document.user.id.clone(), document);
        Ok(())
    }

    async fn find_user(&self, user_id: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users.get(user_id).map(|document| document.user.clone()))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserDocument>, StoreError> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|document| document.user.profile.email == email)
            .cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let users = self.users.read().await;
        let mut listed: Vec<User> = users.values().map(|document| document.user.clone()).collect();
        listed.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(listed)
    }

    async fn update_profile(
        &self,
        user_id: &str,
        patch: &ProfilePatch,
    ) -> Result<Option<User>, StoreError> {
        let mut users = self.users.write().await;
        if let Some(email) = &patch.email {
            let taken = users
                .values()
                .any(|other| other.user.id != user_id && &other.user.profile.email == email);
            if taken {
                return Err(StoreError::DuplicateEmail(email.clone()));
            }
        }
        Ok(users.get_mut(user_id).map(|document| {
            patch.apply(&mut document.user.profile);
            document.updated_at = Utc::now();
            document.user.clone()
        }))
    }

    async fn set_password_hash(
        &self,
        user_id: &str,
        password_hash: &str,
    ) -> Result<bool, StoreError> {
        let mut users = self.users.write().await;
        Ok(match users.get_mut(user_id) {
            Some(document) => {
                document.password_hash = password_hash.to_string();
                document.updated_at = Utc::now();
                true
            }
            None => false,
        })
    }

    async fn delete_user(&self, user_id: &str) -> Result<Option<User>, StoreError> {
        let mut users = self.users.write().await;
        Ok(users.remove(user_id).map(|document| document.user))
    }

    async fn push_record(&self, user_id: &str, record: Record) -> Result<Option<User>, StoreError> {
        debug!(%user_id, kind = record.kind().label(), "Appending record");
        Ok(self
            .modify(user_id, move |user| {
                user.push_record(record);
                true
            })
            .await)
    }

    async fn update_record(
        &self,
        user_id: &str,
        record_id: &str,
        patch: &RecordPatch,
    ) -> Result<Option<User>, StoreError> {
        debug!(%user_id, %record_id, "Updating record");
        Ok(self
            .modify(user_id, |user| user.apply_patch(record_id, patch))
            .await)
    }

    async fn remove_record(
        &self,
        user_id: &str,
        kind: RecordKind,
        record_id: &str,
    ) -> Result<Option<User>, StoreError> {
        debug!(%user_id, %record_id, "Removing record");
        Ok(self
            .modify(user_id, |user| user.remove_record(kind, record_id))
            .await)
    }

    async fn set_investment_categories(
        &self,
        user_id: &str,
        categories: &[InvestmentCategory],
    ) -> Result<Option<User>, StoreError> {
        Ok(self
            .modify(user_id, |user| {
                user.investment_categories = categories.to_vec();
                true
            })
            .await)
    }
}
