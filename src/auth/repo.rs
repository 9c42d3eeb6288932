use anyhow::Context;
use async_trait::async_trait;
use mongodb::{
    bson::doc,
    error::{ErrorKind, WriteFailure},
    options::IndexOptions,
    Collection, Database, IndexModel,
};

use crate::auth::repo_types::{InsertOutcome, NewUser, User, DEFAULT_ROLE};

const USERS_COLLECTION: &str = "users";
const DUPLICATE_KEY_CODE: i32 = 11000;

/// Credential store used by the auth handlers.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;

    /// Inserts the user unless a record with the same email exists, as one
    /// atomic operation.
    async fn insert_if_absent(&self, user: NewUser) -> anyhow::Result<InsertOutcome>;
}

#[derive(Clone)]
pub struct MongoUserStore {
    users: Collection<User>,
}

impl MongoUserStore {
    pub fn new(db: &Database) -> Self {
        Self {
            users: db.collection::<User>(USERS_COLLECTION),
        }
    }

    /// Creates the unique index on `email`. Idempotent.
    pub async fn ensure_indexes(&self) -> anyhow::Result<()> {
        let index = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        self.users
            .create_index(index)
            .await
            .context("create unique index on users.email")?;
        Ok(())
    }
}

#[async_trait]
impl UserStore for MongoUserStore {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let user = self
            .users
            .find_one(doc! { "email": email })
            .await
            .context("find user by email")?;
        Ok(user)
    }

    async fn insert_if_absent(&self, user: NewUser) -> anyhow::Result<InsertOutcome> {
        let update = doc! {
            "$setOnInsert": {
                "username": user.username.as_str(),
                "email": user.email.as_str(),
                "password": user.password_hash.as_str(),
                "role": DEFAULT_ROLE,
            }
        };
        let result = self
            .users
            .update_one(doc! { "email": user.email.as_str() }, update)
            .upsert(true)
            .await;

        match result {
            Ok(res) if res.upserted_id.is_some() => Ok(InsertOutcome::Inserted),
            Ok(_) => Ok(InsertOutcome::AlreadyExists),
            // two concurrent upserts on the same email; the index rejected the loser
            Err(e) if is_duplicate_key(&e) => Ok(InsertOutcome::AlreadyExists),
            Err(e) => Err(anyhow::Error::new(e).context("upsert user")),
        }
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        &*err.kind,
        ErrorKind::Write(WriteFailure::WriteError(we)) if we.code == DUPLICATE_KEY_CODE
    )
}

#[cfg(test)]
pub use memory::MemoryUserStore;


#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use mongodb::bson::{self, doc};

    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            username: "alice".into(),
            email: email.into(),
            password_hash: "$2b$10$abcdefghijklmnopqrstuu".into(),
        }
    }

    #[tokio::test]
    async fn insert_if_absent_inserts_once() {
        let store = MemoryUserStore::new();
        assert_eq!(
            store.insert_if_absent(new_user("a@x.com")).await.unwrap(),
            InsertOutcome::Inserted
        );
        assert_eq!(
            store.insert_if_absent(new_user("a@x.com")).await.unwrap(),
            InsertOutcome::AlreadyExists
        );

        let user = store.find_by_email("a@x.com").await.unwrap().expect("stored");
        assert_eq!(user.role, DEFAULT_ROLE);
        assert_eq!(user.username.as_deref(), Some("alice"));
    }

    #[tokio::test]
    async fn concurrent_inserts_yield_single_record() {
        let store = Arc::new(MemoryUserStore::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                tokio::spawn(async move { store.insert_if_absent(new_user("race@x.com")).await })
            })
            .collect();

        let mut inserted = 0;
        for handle in handles {
            if handle.await.unwrap().unwrap() == InsertOutcome::Inserted {
                inserted += 1;
            }
        }
        assert_eq!(inserted, 1);
    }

    #[tokio::test]
    async fn emails_are_case_sensitive() {
        let store = MemoryUserStore::new();
        store.insert_if_absent(new_user("a@x.com")).await.unwrap();
        assert!(store.find_by_email("A@X.com").await.unwrap().is_none());
    }

    #[test]
    fn user_document_without_username_or_role_deserializes() {
        let document = doc! {
            "_id": bson::oid::ObjectId::new(),
            "email": "legacy@x.com",
            "password": "$2b$10$hash",
        };
        let user: User = bson::from_document(document).expect("deserialize");
        assert_eq!(user.username, None);
        assert_eq!(user.role, DEFAULT_ROLE);
    }

    #[test]
    fn user_document_roundtrips_field_names() {
        let user = User {
            id: None,
            username: Some("alice".into()),
            email: "a@x.com".into(),
            password: "$2b$10$hash".into(),
            role: DEFAULT_ROLE.into(),
        };
        let document = bson::to_document(&user).expect("serialize");
        assert!(!document.contains_key("_id"));
        assert_eq!(document.get_str("email").unwrap(), "a@x.com");
        assert_eq!(document.get_str("password").unwrap(), "$2b$10$hash");
        assert_eq!(document.get_str("role").unwrap(), "user");
    }
}
