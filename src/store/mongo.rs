use super::{UserDocument, UserStore};
use crate::errors::StoreError;
use crate::schemas::{InvestmentCategory, ProfilePatch, Record, RecordKind, RecordPatch, User};
use async_trait::async_trait;
use bson::{doc, Bson, DateTime, Document};
use futures::TryStreamExt;
use mongodb::{
    error::{ErrorKind, WriteFailure},
    options::{FindOneAndUpdateOptions, IndexOptions, ReturnDocument},
    Client, Collection, Database, IndexModel,
};
use serde::Serialize;
use tracing::{debug, info};

const USERS_COLLECTION: &str = "Users";
const DUPLICATE_KEY: i32 = 11000;

pub struct MongoUserStore {
    users: Collection<UserDocument>,
}

impl MongoUserStore {
    pub fn new(database: Database) -> Self {
        MongoUserStore {
            users: database.collection(USERS_COLLECTION),
        }
    }

    pub async fn connect(uri: &str, database: &str) -> Result<Self, StoreError> {
        let client = Client::with_uri_str(uri).await?;
        let store = Self::new(client.database(database));
        store.ensure_indexes().await?;
        info!(%database, "Connected to MongoDB");
        Ok(store)
    }

    async fn ensure_indexes(&self) -> Result<(), StoreError> {
        let unique = || IndexOptions::builder().unique(true).build();
        let indexes = vec![
            IndexModel::builder()
                .keys(doc! { "id": 1 })
                .options(unique())
                .build(),
            IndexModel::builder()
                .keys(doc! { "profile.email": 1 })
                .options(unique())
                .build(),
        ];
        self.users.create_indexes(indexes, None).await?;
        Ok(())
    }

    async fn find_and_update(
        &self,
        filter: Document,
        update: Document,
    ) -> Result<Option<User>, StoreError> {
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();
        let document = self
            .users
            .find_one_and_update(filter, update, options)
            .await?;
        Ok(document.map(|document| document.user))
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => write_error.code == DUPLICATE_KEY,
        ErrorKind::Command(command_error) => command_error.code == DUPLICATE_KEY,
        _ => false,
    }
}

/// `$set` operand assigning every serialized field of `fields` below
/// `prefix`, plus the modification timestamp.
fn set_fields<T: Serialize>(prefix: &str, fields: &T) -> Result<Document, StoreError> {
    let mut set: Document = bson::to_document(fields)?
        .into_iter()
        .map(|(key, value)| (format!("{prefix}{key}"), value))
        .collect();
    set.insert("updatedAt", DateTime::now());
    Ok(set)
}

fn record_to_bson(record: &Record) -> Result<Bson, StoreError> {
    let bson = match record {
        Record::Bill(bill) => bson::to_bson(bill)?,
        Record::Investment(investment) => bson::to_bson(investment)?,
        Record::Spending(spending) => bson::to_bson(spending)?,
    };
    Ok(bson)
}

#[async_trait]
impl UserStore for MongoUserStore {
    async fn insert_user(&self, document: UserDocument) -> Result<(), StoreError> {
        let email = document.user.profile.email.clone();
        match self.users.insert_one(document, None).await {
            Ok(_) => {
                debug!(%email, "User inserted");
                Ok(())
            }
            Err(err) if is_duplicate_key(&err) => Err(StoreError::DuplicateEmail(email)),
            Err(err) => Err(err.into()),
        }
    }

    async fn find_user(&self, user_id: &str) -> Result<Option<User>, StoreError> {
        let document = self.users.find_one(doc! { "id": user_id }, None).await?;
        Ok(document.map(|document| document.user))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserDocument>, StoreError> {
        Ok(self
            .users
            .find_one(doc! { "profile.email": email }, None)
            .await?)
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let documents: Vec<UserDocument> = self.users.find(None, None).await?.try_collect().await?;
        Ok(documents.into_iter().map(|document| document.user).collect())
    }

    async fn update_profile(
        &self,
        user_id: &str,
        patch: &ProfilePatch,
    ) -> Result<Option<User>, StoreError> {
        let update = doc! { "$set": set_fields("profile.", patch)? };
        match self.find_and_update(doc! { "id": user_id }, update).await {
            Err(StoreError::Mongo(err)) if is_duplicate_key(&err) => Err(StoreError::DuplicateEmail(
                patch.email.clone().unwrap_or_default(),
            )),
            result => result,
        }
    }

    async fn set_password_hash(
        &self,
        user_id: &str,
        password_hash: &str,
    ) -> Result<bool, StoreError> {
        let result = self
            .users
            .update_one(
                doc! { "id": user_id },
                doc! { "$set": { "passwordHash": password_hash, "updatedAt": DateTime::now() } },
                None,
            )
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn delete_user(&self, user_id: &str) -> Result<Option<User>, StoreError> {
        let document = self
            .users
            .find_one_and_delete(doc! { "id": user_id }, None)
            .await?;
        Ok(document.map(|document| document.user))
    }

    async fn push_record(&self, user_id: &str, record: Record) -> Result<Option<User>, StoreError> {
        let mut push = Document::new();
        push.insert(record.kind().field(), record_to_bson(&record)?);
        debug!(%user_id, kind = record.kind().label(), "Appending record");
        self.find_and_update(
            doc! { "id": user_id },
            doc! { "$push": push, "$set": { "updatedAt": DateTime::now() } },
        )
        .await
    }

    async fn update_record(
        &self,
        user_id: &str,
        record_id: &str,
        patch: &RecordPatch,
    ) -> Result<Option<User>, StoreError> {
        let field = patch.kind().field();
        let prefix = format!("{field}.$.");
        let set = match patch {
            RecordPatch::Bill(patch) => set_fields(&prefix, patch)?,
            RecordPatch::Investment(patch) => set_fields(&prefix, patch)?,
            RecordPatch::Spending(patch) => set_fields(&prefix, patch)?,
        };
        let mut filter = doc! { "id": user_id };
        filter.insert(format!("{field}.id"), record_id);
        debug!(%user_id, %record_id, "Updating record");
        self.find_and_update(filter, doc! { "$set": set }).await
    }

    async fn remove_record(
        &self,
        user_id: &str,
        kind: RecordKind,
        record_id: &str,
    ) -> Result<Option<User>, StoreError> {
        let field = kind.field();
        let mut filter = doc! { "id": user_id };
        filter.insert(format!("{field}.id"), record_id);
        let mut pull = Document::new();
        pull.insert(field, doc! { "id": record_id });
        debug!(%user_id, %record_id, "Removing record");
        self.find_and_update(
            filter,
            doc! { "$pull": pull, "$set": { "updatedAt": DateTime::now() } },
        )
        .await
    }

    async fn set_investment_categories(
        &self,
        user_id: &str,
        categories: &[InvestmentCategory],
    ) -> Result<Option<User>, StoreError> {
        let categories = bson::to_bson(categories)?;
        self.find_and_update(
            doc! { "id": user_id },
            doc! { "$set": { "investmentCategories": categories, "updatedAt": DateTime::now() } },
        )
        .await
    }
}
