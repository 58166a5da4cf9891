// Storage backend abstraction
// Decision: Use enum dispatch for simplicity over trait objects
//
// This module provides a unified StorageBackend enum that can work with
// either PostgreSQL (production) or in-memory (dev mode) storage.

use anyhow::Result;
use async_trait::async_trait;
use registrar_core::{Account, CredentialStore, NewAccount, StoreError};
use serde_json::{Map, Value as JsonValue};
use uuid::Uuid;

use super::memory::InMemoryDatabase;
use super::models::*;
use super::repositories::Database;

/// Storage backend that can be either PostgreSQL or in-memory
#[derive(Clone)]
pub enum StorageBackend {
    /// PostgreSQL database (production)
    Postgres(Database),
    /// In-memory database (dev mode)
    InMemory(std::sync::Arc<InMemoryDatabase>),
}

impl StorageBackend {
    /// Create a PostgreSQL storage backend from a database URL
    pub async fn postgres(database_url: &str) -> Result<Self> {
        let db = Database::from_url(database_url).await?;
        Ok(Self::Postgres(db))
    }

    /// Create an in-memory storage backend
    pub fn in_memory() -> Self {
        Self::InMemory(std::sync::Arc::new(InMemoryDatabase::new()))
    }

    /// Check if this is dev mode (in-memory)
    pub fn is_dev_mode(&self) -> bool {
        matches!(self, Self::InMemory(_))
    }

    // ============================================
    // Academic records
    // ============================================

    pub async fn create_record(&self, input: CreateRecordRow) -> Result<RecordRow, StoreError> {
        match self {
            Self::Postgres(db) => db.create_record(input).await,
            Self::InMemory(db) => db.create_record(input).await,
        }
    }

    pub async fn list_records(&self, kind: RecordKind) -> Result<Vec<RecordRow>> {
        match self {
            Self::Postgres(db) => db.list_records(kind).await,
            Self::InMemory(db) => db.list_records(kind).await,
        }
    }

    pub async fn get_record(&self, kind: RecordKind, id: Uuid) -> Result<Option<RecordRow>> {
        match self {
            Self::Postgres(db) => db.get_record(kind, id).await,
            Self::InMemory(db) => db.get_record(kind, id).await,
        }
    }

    pub async fn find_record_by_key(
        &self,
        kind: RecordKind,
        natural_key: &str,
    ) -> Result<Option<RecordRow>> {
        match self {
            Self::Postgres(db) => db.find_record_by_key(kind, natural_key).await,
            Self::InMemory(db) => db.find_record_by_key(kind, natural_key).await,
        }
    }

    pub async fn update_record(
        &self,
        kind: RecordKind,
        id: Uuid,
        patch: Map<String, JsonValue>,
    ) -> Result<Option<RecordRow>> {
        match self {
            Self::Postgres(db) => db.update_record(kind, id, patch).await,
            Self::InMemory(db) => db.update_record(kind, id, patch).await,
        }
    }

    pub async fn delete_record(&self, kind: RecordKind, id: Uuid) -> Result<Option<RecordRow>> {
        match self {
            Self::Postgres(db) => db.delete_record(kind, id).await,
            Self::InMemory(db) => db.delete_record(kind, id).await,
        }
    }
}

#[async_trait]
impl CredentialStore for StorageBackend {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        match self {
            Self::Postgres(db) => db.get_account_by_email(email).await,
            Self::InMemory(db) => db.get_account_by_email(email).await,
        }
    }

    async fn create(&self, account: NewAccount) -> Result<Account, StoreError> {
        match self {
            Self::Postgres(db) => db.create_account(account).await,
            Self::InMemory(db) => db.create_account(account).await,
        }
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        match self {
            Self::Postgres(db) => db.delete_account(id).await,
            Self::InMemory(db) => db.delete_account(id).await,
        }
    }
}
