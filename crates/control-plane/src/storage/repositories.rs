// Repository layer for PostgreSQL
// Decision: Uniqueness is enforced by table constraints; unique violations surface
// as StoreError::Duplicate so callers never need a check-then-insert

use anyhow::{Context, Result};
use registrar_core::{Account, NewAccount, StoreError};
use serde_json::{Map, Value as JsonValue};
use sqlx::PgPool;
use uuid::Uuid;

use super::models::*;

const ACCOUNT_COLUMNS: &str =
    "id, email, password_hash, first_name, last_name, role, created_at, updated_at";
const RECORD_COLUMNS: &str = "id, kind, natural_key, account_id, data, created_at, updated_at";

/// Map a sqlx error, turning unique violations into `StoreError::Duplicate`
fn map_write_error(err: sqlx::Error, what: impl FnOnce() -> String) -> StoreError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            StoreError::duplicate(what())
        }
        _ => StoreError::Backend(err.into()),
    }
}

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create database connection from URL and apply pending migrations
    pub async fn from_url(database_url: &str) -> Result<Self> {
        let pool = PgPool::connect(database_url)
            .await
            .context("failed to connect to PostgreSQL")?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("failed to run migrations")?;
        Ok(Self { pool })
    }

    // ============================================
    // Accounts
    // ============================================

    pub async fn create_account(&self, input: NewAccount) -> Result<Account, StoreError> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            r#"
            INSERT INTO accounts (id, email, password_hash, first_name, last_name, role)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {ACCOUNT_COLUMNS}
            "#
        ))
        .bind(Uuid::now_v7())
        .bind(&input.email)
        .bind(&input.password_hash)
        .bind(&input.first_name)
        .bind(&input.last_name)
        .bind(input.role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, || format!("email {}", input.email)))?;

        Ok(Account::try_from(row)?)
    }

    pub async fn get_account_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(anyhow::Error::from)?;

        Ok(row.map(Account::try_from).transpose()?)
    }

    pub async fn delete_account(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM accounts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(anyhow::Error::from)?;

        Ok(result.rows_affected() > 0)
    }

    // ============================================
    // Academic records
    // ============================================

    pub async fn create_record(&self, input: CreateRecordRow) -> Result<RecordRow, StoreError> {
        let row = sqlx::query_as::<_, RecordDbRow>(&format!(
            r#"
            INSERT INTO records (id, kind, natural_key, account_id, data)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {RECORD_COLUMNS}
            "#
        ))
        .bind(Uuid::now_v7())
        .bind(input.kind.as_str())
        .bind(&input.natural_key)
        .bind(input.account_id)
        .bind(JsonValue::Object(input.data))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            map_write_error(e, || {
                format!(
                    "{} {}",
                    input.kind,
                    input.natural_key.as_deref().unwrap_or_default()
                )
            })
        })?;

        Ok(RecordRow::try_from(row)?)
    }

    pub async fn list_records(&self, kind: RecordKind) -> Result<Vec<RecordRow>> {
        let rows = sqlx::query_as::<_, RecordDbRow>(&format!(
            "SELECT {RECORD_COLUMNS} FROM records WHERE kind = $1 ORDER BY id"
        ))
        .bind(kind.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(RecordRow::try_from).collect()
    }

    pub async fn get_record(&self, kind: RecordKind, id: Uuid) -> Result<Option<RecordRow>> {
        let row = sqlx::query_as::<_, RecordDbRow>(&format!(
            "SELECT {RECORD_COLUMNS} FROM records WHERE kind = $1 AND id = $2"
        ))
        .bind(kind.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(RecordRow::try_from).transpose()
    }

    pub async fn find_record_by_key(
        &self,
        kind: RecordKind,
        natural_key: &str,
    ) -> Result<Option<RecordRow>> {
        let row = sqlx::query_as::<_, RecordDbRow>(&format!(
            "SELECT {RECORD_COLUMNS} FROM records WHERE kind = $1 AND natural_key = $2"
        ))
        .bind(kind.as_str())
        .bind(natural_key)
        .fetch_optional(&self.pool)
        .await?;

        row.map(RecordRow::try_from).transpose()
    }

    /// Merge top-level fields of `patch` into the stored document (jsonb `||`)
    pub async fn update_record(
        &self,
        kind: RecordKind,
        id: Uuid,
        patch: Map<String, JsonValue>,
    ) -> Result<Option<RecordRow>> {
        let row = sqlx::query_as::<_, RecordDbRow>(&format!(
            r#"
            UPDATE records
            SET data = data || $3, updated_at = NOW()
            WHERE kind = $1 AND id = $2
            RETURNING {RECORD_COLUMNS}
            "#
        ))
        .bind(kind.as_str())
        .bind(id)
        .bind(JsonValue::Object(patch))
        .fetch_optional(&self.pool)
        .await?;

        row.map(RecordRow::try_from).transpose()
    }

    /// Delete a record, returning the removed row
    pub async fn delete_record(&self, kind: RecordKind, id: Uuid) -> Result<Option<RecordRow>> {
        let row = sqlx::query_as::<_, RecordDbRow>(&format!(
            "DELETE FROM records WHERE kind = $1 AND id = $2 RETURNING {RECORD_COLUMNS}"
        ))
        .bind(kind.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(RecordRow::try_from).transpose()
    }
}
