// Academic records service: students, teachers, courses, enrollments
// Decision: Records are JSON documents; only the natural key and the account link
// are lifted into columns
// Decision: Student/teacher creation is a two-step saga (account, then record) with
// a compensating account delete when the record write fails
// Decision: Deletion removes the linked account first, so a failed delete can be retried

use registrar_core::Role;
use serde_json::{Map, Value as JsonValue};
use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use super::auth::{AccountInput, AuthService};
use crate::api::validation::validate_record_size;
use crate::error::ApiError;
use crate::storage::{CreateRecordRow, RecordKind, RecordRow, StorageBackend};

/// Server-managed fields; ignored when present in a request body
const RESERVED_FIELDS: &[&str] = &["id", "accountId", "createdAt", "updatedAt"];

/// Fields whose values form the natural key of a record kind
pub fn natural_key_fields(kind: RecordKind) -> &'static [&'static str] {
    match kind {
        RecordKind::Student => &["studentId"],
        RecordKind::Teacher => &["employeeId"],
        RecordKind::Course => &["code"],
        RecordKind::Enrollment => &["studentId", "courseId"],
    }
}

/// Fields that name another record by its natural key
pub fn reference_fields(kind: RecordKind) -> &'static [(&'static str, RecordKind)] {
    match kind {
        RecordKind::Course => &[("teacherId", RecordKind::Teacher)],
        RecordKind::Enrollment => &[
            ("studentId", RecordKind::Student),
            ("courseId", RecordKind::Course),
        ],
        RecordKind::Student | RecordKind::Teacher => &[],
    }
}

/// Fields that cannot change after creation
fn immutable_fields(kind: RecordKind) -> Vec<&'static str> {
    let mut fields = natural_key_fields(kind).to_vec();
    if kind.account_role().is_some() {
        fields.extend(["email", "password"]);
    }
    fields
}

/// Key component from a non-blank string or a number
fn scalar(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) if !s.trim().is_empty() => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn key_part(data: &Map<String, JsonValue>, field: &str) -> Result<String, ApiError> {
    data.get(field)
        .and_then(scalar)
        .ok_or_else(|| ApiError::bad_request(format!("{} is required", field)))
}

/// Single-field keys are stored as the bare value; composite keys as a JSON array,
/// so no separator inside a value can make two keys collide
fn encode_key(mut parts: Vec<String>) -> Result<String, ApiError> {
    if parts.len() == 1 {
        return Ok(parts.swap_remove(0));
    }
    serde_json::to_string(&parts).map_err(|e| ApiError::Internal(e.into()))
}

fn natural_key(kind: RecordKind, data: &Map<String, JsonValue>) -> Result<String, ApiError> {
    let parts = natural_key_fields(kind)
        .iter()
        .map(|field| key_part(data, field))
        .collect::<Result<Vec<_>, _>>()?;
    encode_key(parts)
}

fn string_field(data: &Map<String, JsonValue>, field: &str) -> Result<String, ApiError> {
    match data.get(field) {
        Some(JsonValue::String(s)) => Ok(s.clone()),
        _ => Err(ApiError::bad_request(format!("{} is required", field))),
    }
}

fn check_size(data: &Map<String, JsonValue>) -> Result<(), ApiError> {
    let bytes = serde_json::to_vec(data).map_err(|e| ApiError::Internal(e.into()))?;
    validate_record_size(bytes.len()).map_err(|e| ApiError::BadRequest(e.0))
}

fn text<'a>(row: &'a RecordRow, field: &str) -> Option<&'a str> {
    row.data.get(field).and_then(JsonValue::as_str)
}

/// Ordering for list endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListOrder {
    /// Creation order
    #[default]
    Created,
    /// `name`, ascending
    Name,
    /// `startDate`, ascending
    Date,
    /// Enrollment count, descending (courses only)
    Students,
}

impl ListOrder {
    /// Unknown values fall back to creation order
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("name") => ListOrder::Name,
            Some("date") => ListOrder::Date,
            Some("students") => ListOrder::Students,
            _ => ListOrder::Created,
        }
    }
}

pub struct RecordService {
    db: Arc<StorageBackend>,
    accounts: Arc<AuthService>,
}

impl RecordService {
    pub fn new(db: Arc<StorageBackend>, accounts: Arc<AuthService>) -> Self {
        Self { db, accounts }
    }

    pub async fn list(&self, kind: RecordKind, order: ListOrder) -> Result<Vec<RecordRow>, ApiError> {
        let mut rows = self.db.list_records(kind).await?;

        match order {
            ListOrder::Created => {}
            ListOrder::Name => rows.sort_by(|a, b| text(a, "name").cmp(&text(b, "name"))),
            ListOrder::Date => {
                rows.sort_by(|a, b| text(a, "startDate").cmp(&text(b, "startDate")))
            }
            ListOrder::Students if kind == RecordKind::Course => {
                let counts = self.enrollment_counts().await?;
                rows.sort_by_key(|row| {
                    let code = row.data.get("code").and_then(scalar);
                    Reverse(code.and_then(|c| counts.get(&c).copied()).unwrap_or(0))
                });
            }
            ListOrder::Students => {}
        }

        Ok(rows)
    }

    /// Enrollment count per course code
    async fn enrollment_counts(&self) -> Result<HashMap<String, usize>, ApiError> {
        let mut counts = HashMap::new();
        for enrollment in self.db.list_records(RecordKind::Enrollment).await? {
            if let Some(course) = enrollment.data.get("courseId").and_then(scalar) {
                *counts.entry(course).or_insert(0) += 1;
            }
        }
        Ok(counts)
    }

    pub async fn get(&self, kind: RecordKind, id: Uuid) -> Result<RecordRow, ApiError> {
        self.db
            .get_record(kind, id)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("{} not found", kind.singular())))
    }

    /// Require every reference field present in `fields` to name an existing record
    async fn ensure_references(
        &self,
        kind: RecordKind,
        fields: &Map<String, JsonValue>,
    ) -> Result<(), ApiError> {
        for (field, target) in reference_fields(kind) {
            let Some(value) = fields.get(*field) else {
                continue;
            };
            let key = scalar(value).ok_or_else(|| {
                ApiError::bad_request(format!("{} must be a non-empty string or number", field))
            })?;
            if self.db.find_record_by_key(*target, &key).await?.is_none() {
                tracing::debug!(kind = %kind, field = *field, key = %key, "Dangling reference");
                return Err(ApiError::not_found(format!("{} not found", target.singular())));
            }
        }
        Ok(())
    }

    pub async fn create(
        &self,
        kind: RecordKind,
        mut data: Map<String, JsonValue>,
    ) -> Result<RecordRow, ApiError> {
        for field in RESERVED_FIELDS {
            data.remove(*field);
        }
        let natural_key = natural_key(kind, &data)?;
        self.ensure_references(kind, &data).await?;

        let Some(role) = kind.account_role() else {
            check_size(&data)?;
            return Ok(self
                .db
                .create_record(CreateRecordRow {
                    kind,
                    natural_key: Some(natural_key),
                    account_id: None,
                    data,
                })
                .await?);
        };

        self.create_with_account(kind, role, natural_key, data).await
    }

    async fn create_with_account(
        &self,
        kind: RecordKind,
        role: Role,
        natural_key: String,
        mut data: Map<String, JsonValue>,
    ) -> Result<RecordRow, ApiError> {
        let password = string_field(&data, "password")?;
        data.remove("password");
        let input = AccountInput {
            email: string_field(&data, "email")?,
            password,
            first_name: string_field(&data, "firstName")?,
            last_name: string_field(&data, "lastName")?,
            role,
        };
        check_size(&data)?;

        let account = self.accounts.create_account(input).await?;

        let created = self
            .db
            .create_record(CreateRecordRow {
                kind,
                natural_key: Some(natural_key),
                account_id: Some(account.id),
                data,
            })
            .await;

        match created {
            Ok(row) => {
                tracing::info!(kind = %kind, record_id = %row.id, account_id = %account.id, "Record created");
                Ok(row)
            }
            Err(err) => {
                match self.accounts.remove_account(account.id).await {
                    Ok(_) => tracing::warn!(
                        kind = %kind,
                        account_id = %account.id,
                        "Record write failed, account rolled back: {}",
                        err
                    ),
                    Err(cleanup) => tracing::error!(
                        kind = %kind,
                        account_id = %account.id,
                        "Record write failed and account rollback failed: {}; {}",
                        err,
                        cleanup
                    ),
                }
                Err(err.into())
            }
        }
    }

    /// Merge top-level fields into a record
    pub async fn update(
        &self,
        kind: RecordKind,
        id: Uuid,
        mut patch: Map<String, JsonValue>,
    ) -> Result<RecordRow, ApiError> {
        let existing = self.get(kind, id).await?;

        for field in RESERVED_FIELDS {
            patch.remove(*field);
        }
        for field in immutable_fields(kind) {
            if let Some(value) = patch.remove(field) {
                if existing.data.get(field) != Some(&value) {
                    return Err(ApiError::bad_request(format!("{} cannot be changed", field)));
                }
            }
        }
        self.ensure_references(kind, &patch).await?;

        // The limit applies to the document as it will be stored
        let mut merged = existing.data;
        merged.extend(patch.clone());
        check_size(&merged)?;

        self.db
            .update_record(kind, id, patch)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("{} not found", kind.singular())))
    }

    /// Delete the account a record owns, then the record
    pub async fn delete(&self, kind: RecordKind, id: Uuid) -> Result<(), ApiError> {
        let row = self.get(kind, id).await?;

        if let Some(account_id) = row.account_id {
            let removed = self.accounts.remove_account(account_id).await?;
            if !removed {
                tracing::warn!(kind = %kind, record_id = %id, account_id = %account_id, "Linked account was already gone");
            }
        }

        self.db
            .delete_record(kind, id)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("{} not found", kind.singular())))?;

        tracing::info!(kind = %kind, record_id = %id, "Record deleted");
        Ok(())
    }
}
