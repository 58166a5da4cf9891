// In-memory storage implementation for dev mode
// Decision: Use parking_lot for thread-safe access
// Decision: UUIDs generated via uuid v7 (time-ordered)
// Decision: Uniqueness checks and inserts happen under one write lock, which gives
// the same all-or-nothing behaviour as the PostgreSQL unique constraints
//
// This implementation provides a PostgreSQL-compatible API backed by in-memory
// HashMaps, allowing the control-plane to run without a database for development.

use anyhow::Result;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use registrar_core::{Account, NewAccount, StoreError};
use serde_json::{Map, Value as JsonValue};
use std::collections::HashMap;
use uuid::Uuid;

use super::models::*;

/// In-memory database for dev mode
/// All data is stored in memory and lost on restart
#[derive(Default)]
pub struct InMemoryDatabase {
    accounts: RwLock<HashMap<Uuid, Account>>,
    records: RwLock<HashMap<Uuid, RecordRow>>,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    // ============================================
    // Accounts
    // ============================================

    pub async fn create_account(&self, input: NewAccount) -> Result<Account, StoreError> {
        let mut accounts = self.accounts.write();
        if accounts.values().any(|a| a.email == input.email) {
            return Err(StoreError::duplicate(format!("email {}", input.email)));
        }

        let now = Self::now();
        let account = Account {
            id: Uuid::now_v7(),
            email: input.email,
            password_hash: input.password_hash,
            first_name: input.first_name,
            last_name: input.last_name,
            role: input.role,
            created_at: now,
            updated_at: now,
        };
        accounts.insert(account.id, account.clone());
        Ok(account)
    }

    pub async fn get_account_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        Ok(self
            .accounts
            .read()
            .values()
            .find(|a| a.email == email)
            .cloned())
    }

    pub async fn delete_account(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.accounts.write().remove(&id).is_some())
    }

    // ============================================
    // Academic records
    // ============================================

    pub async fn create_record(&self, input: CreateRecordRow) -> Result<RecordRow, StoreError> {
        let mut records = self.records.write();
        if let Some(key) = &input.natural_key {
            let taken = records
                .values()
                .any(|r| r.kind == input.kind && r.natural_key.as_deref() == Some(key.as_str()));
            if taken {
                return Err(StoreError::duplicate(format!("{} {}", input.kind, key)));
            }
        }

        let now = Self::now();
        let row = RecordRow {
            id: Uuid::now_v7(),
            kind: input.kind,
            natural_key: input.natural_key,
            account_id: input.account_id,
            data: input.data,
            created_at: now,
            updated_at: now,
        };
        records.insert(row.id, row.clone());
        Ok(row)
    }

    pub async fn list_records(&self, kind: RecordKind) -> Result<Vec<RecordRow>> {
        let mut rows: Vec<RecordRow> = self
            .records
            .read()
            .values()
            .filter(|r| r.kind == kind)
            .cloned()
            .collect();
        // UUID v7 sorts by creation time
        rows.sort_by_key(|r| r.id);
        Ok(rows)
    }

    pub async fn get_record(&self, kind: RecordKind, id: Uuid) -> Result<Option<RecordRow>> {
        Ok(self
            .records
            .read()
            .get(&id)
            .filter(|r| r.kind == kind)
            .cloned())
    }

    pub async fn find_record_by_key(
        &self,
        kind: RecordKind,
        natural_key: &str,
    ) -> Result<Option<RecordRow>> {
        Ok(self
            .records
            .read()
            .values()
            .find(|r| r.kind == kind && r.natural_key.as_deref() == Some(natural_key))
            .cloned())
    }

    /// Merge top-level fields of `patch` into the stored document
    pub async fn update_record(
        &self,
        kind: RecordKind,
        id: Uuid,
        patch: Map<String, JsonValue>,
    ) -> Result<Option<RecordRow>> {
        let mut records = self.records.write();
        match records.get_mut(&id) {
            Some(row) if row.kind == kind => {
                row.data.extend(patch);
                row.updated_at = Self::now();
                Ok(Some(row.clone()))
            }
            _ => Ok(None),
        }
    }

    /// Delete a record, returning the removed row
    pub async fn delete_record(&self, kind: RecordKind, id: Uuid) -> Result<Option<RecordRow>> {
        let mut records = self.records.write();
        if records.get(&id).map(|r| r.kind) != Some(kind) {
            return Ok(None);
        }
        Ok(records.remove(&id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use registrar_core::Role;
    use serde_json::json;
    use std::sync::Arc;

    fn new_account(email: &str) -> NewAccount {
        NewAccount {
            email: email.to_string(),
            password_hash: "hash".to_string(),
            first_name: "Grace".to_string(),
            last_name: "Hopper".to_string(),
            role: Role::Instructor,
        }
    }

    fn course(code: &str) -> CreateRecordRow {
        let data = json!({ "code": code, "name": "Compilers" });
        CreateRecordRow {
            kind: RecordKind::Course,
            natural_key: Some(code.to_string()),
            account_id: None,
            data: data.as_object().cloned().unwrap(),
        }
    }

    #[tokio::test]
    async fn test_account_create_and_lookup() {
        let db = InMemoryDatabase::new();
        let created = db.create_account(new_account("g@example.com")).await.unwrap();

        let found = db.get_account_by_email("g@example.com").await.unwrap();
        assert_eq!(found.map(|a| a.id), Some(created.id));
        assert!(db.get_account_by_email("G@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let db = InMemoryDatabase::new();
        db.create_account(new_account("dup@example.com")).await.unwrap();
        let err = db
            .create_account(new_account("dup@example.com"))
            .await
            .unwrap_err();
        assert!(err.is_duplicate());
    }

    #[tokio::test]
    async fn test_concurrent_creates_have_one_winner() {
        let db = Arc::new(InMemoryDatabase::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let db = db.clone();
            handles.push(tokio::spawn(async move {
                db.create_account(new_account("race@example.com")).await
            }));
        }

        let mut created = 0;
        let mut duplicates = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => created += 1,
                Err(e) if e.is_duplicate() => duplicates += 1,
                Err(e) => panic!("unexpected error: {e}"),
            }
        }
        assert_eq!(created, 1);
        assert_eq!(duplicates, 7);
    }

    #[tokio::test]
    async fn test_delete_account() {
        let db = InMemoryDatabase::new();
        let account = db.create_account(new_account("bye@example.com")).await.unwrap();
        assert!(db.delete_account(account.id).await.unwrap());
        assert!(!db.delete_account(account.id).await.unwrap());
        assert!(db.get_account_by_email("bye@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_record_natural_key_is_unique_per_kind() {
        let db = InMemoryDatabase::new();
        db.create_record(course("CS101")).await.unwrap();
        assert!(db.create_record(course("CS101")).await.unwrap_err().is_duplicate());

        let mut student = course("CS101");
        student.kind = RecordKind::Student;
        assert!(db.create_record(student).await.is_ok());
    }

    #[tokio::test]
    async fn test_record_update_merges_fields() {
        let db = InMemoryDatabase::new();
        let row = db.create_record(course("CS102")).await.unwrap();

        let patch = json!({ "name": "Advanced Compilers", "credits": 4 });
        let updated = db
            .update_record(RecordKind::Course, row.id, patch.as_object().cloned().unwrap())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.data["code"], "CS102");
        assert_eq!(updated.data["name"], "Advanced Compilers");
        assert_eq!(updated.data["credits"], 4);
    }

    #[tokio::test]
    async fn test_record_lookup_is_scoped_by_kind() {
        let db = InMemoryDatabase::new();
        let row = db.create_record(course("CS103")).await.unwrap();

        assert!(db.get_record(RecordKind::Student, row.id).await.unwrap().is_none());
        assert!(db.delete_record(RecordKind::Teacher, row.id).await.unwrap().is_none());

        let removed = db.delete_record(RecordKind::Course, row.id).await.unwrap();
        assert_eq!(removed.map(|r| r.id), Some(row.id));
        assert!(db.list_records(RecordKind::Course).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_find_record_by_key() {
        let db = InMemoryDatabase::new();
        let row = db.create_record(course("CS104")).await.unwrap();

        let found = db.find_record_by_key(RecordKind::Course, "CS104").await.unwrap();
        assert_eq!(found.map(|r| r.id), Some(row.id));
        assert!(db
            .find_record_by_key(RecordKind::Student, "CS104")
            .await
            .unwrap()
            .is_none());
    }
}
