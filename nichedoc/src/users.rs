//! Mirroring of relational user rows into the `users` collection read by the
//! mobile app.
//!
//! Each user becomes the document `users/{id}`, fully replaced on every sync.

use chrono::{DateTime, Utc};
use futures::{StreamExt, stream};
use serde::{Deserialize, Serialize};

use nichedoc_core::{
    backend::StoreBackend,
    document::Document,
    store::DocumentStore,
    value::{Fields, Value},
};

pub const USERS_COLLECTION: &str = "users";

/// A user row as exported from the relational database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub google_id: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub email_verified_at: Option<DateTime<Utc>>,
}

impl UserRecord {
    pub fn document_id(&self) -> String {
        self.id.to_string()
    }

    /// The mirrored document body.
    ///
    /// `name` and `email` are always present (empty when unknown); the
    /// optional columns are written only when they hold a value.
    pub fn to_fields(&self) -> Fields {
        let mut fields = Fields::new();
        fields.insert("id".into(), Value::Integer(self.id));
        fields.insert("name".into(), Value::from(self.name.clone().unwrap_or_default()));
        fields.insert("email".into(), Value::from(self.email.clone().unwrap_or_default()));
        fields.insert("created_at".into(), Value::Timestamp(self.created_at));
        fields.insert("updated_at".into(), Value::Timestamp(self.updated_at));

        if let Some(google_id) = self.google_id.as_deref().filter(|value| !value.is_empty()) {
            fields.insert("google_id".into(), Value::from(google_id));
        }
        if let Some(avatar) = self.avatar.as_deref().filter(|value| !value.is_empty()) {
            fields.insert("avatar".into(), Value::from(avatar));
        }
        if let Some(verified_at) = self.email_verified_at {
            fields.insert("email_verified_at".into(), Value::Timestamp(verified_at));
        }

        fields
    }
}

/// Outcome of [`UserMirror::sync_all`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub synced: usize,
    pub failed: usize,
}

/// Writes user rows into the document store.
///
/// Every method is fail-soft: failures are logged by the store and reported
/// as `false` or `None`.
#[derive(Debug)]
pub struct UserMirror<'a, B: StoreBackend> {
    store: &'a DocumentStore<B>,
}

impl<'a, B: StoreBackend> UserMirror<'a, B> {
    pub fn new(store: &'a DocumentStore<B>) -> Self {
        Self { store }
    }

    /// Creates or replaces `users/{id}`.
    pub async fn sync(&self, user: &UserRecord) -> bool {
        let synced = self
            .store
            .create(USERS_COLLECTION, user.to_fields(), Some(&user.document_id()))
            .await
            .is_some();

        if synced {
            tracing::debug!(user_id = user.id, "Synced user");
        }
        synced
    }

    pub async fn fetch(&self, id: i64) -> Option<Document> {
        self.store.read(USERS_COLLECTION, &id.to_string()).await
    }

    pub async fn remove(&self, id: i64) -> bool {
        self.store.delete(USERS_COLLECTION, &id.to_string()).await
    }

    /// Syncs users one after another.
    pub async fn sync_all<'u, I>(&self, users: I) -> SyncReport
    where
        I: IntoIterator<Item = &'u UserRecord>,
    {
        let report = stream::iter(users)
            .then(|user| self.sync(user))
            .fold(SyncReport::default(), |mut report, synced| async move {
                if synced {
                    report.synced += 1;
                } else {
                    report.failed += 1;
                }
                report
            })
            .await;

        tracing::info!(synced = report.synced, failed = report.failed, "User sync complete");
        report
    }
}
