// Database models (internal, may differ from public DTOs)

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use registrar_core::{Account, Role};
use serde_json::{Map, Value as JsonValue};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

// ============================================
// Accounts
// ============================================

#[derive(Clone, FromRow)]
pub struct AccountRow {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl fmt::Debug for AccountRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountRow")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}

impl TryFrom<AccountRow> for Account {
    type Error = anyhow::Error;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        let role: Role = row
            .role
            .parse()
            .map_err(|e| anyhow!("account {} has invalid role: {}", row.id, e))?;
        Ok(Account {
            id: row.id,
            email: row.email,
            password_hash: row.password_hash,
            first_name: row.first_name,
            last_name: row.last_name,
            role,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

// ============================================
// Academic records
// ============================================

/// Record collections exposed under /api
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Student,
    Teacher,
    Course,
    Enrollment,
}

impl RecordKind {
    pub const ALL: [RecordKind; 4] = [
        RecordKind::Student,
        RecordKind::Teacher,
        RecordKind::Course,
        RecordKind::Enrollment,
    ];

    /// Value stored in the `kind` column; also the collection path segment
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Student => "students",
            RecordKind::Teacher => "teachers",
            RecordKind::Course => "courses",
            RecordKind::Enrollment => "enrollments",
        }
    }

    /// Singular noun used in messages
    pub fn singular(&self) -> &'static str {
        match self {
            RecordKind::Student => "student",
            RecordKind::Teacher => "teacher",
            RecordKind::Course => "course",
            RecordKind::Enrollment => "enrollment",
        }
    }

    /// Role given to the account created alongside a record of this kind
    pub fn account_role(&self) -> Option<Role> {
        match self {
            RecordKind::Student => Some(Role::Student),
            RecordKind::Teacher => Some(Role::Instructor),
            RecordKind::Course | RecordKind::Enrollment => None,
        }
    }
}

impl std::str::FromStr for RecordKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RecordKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| anyhow!("unknown record kind: {}", s))
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct RecordRow {
    pub id: Uuid,
    pub kind: RecordKind,
    pub natural_key: Option<String>,
    pub account_id: Option<Uuid>,
    pub data: Map<String, JsonValue>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Raw `records` row as read from PostgreSQL
#[derive(Debug, Clone, FromRow)]
pub struct RecordDbRow {
    pub id: Uuid,
    pub kind: String,
    pub natural_key: Option<String>,
    pub account_id: Option<Uuid>,
    pub data: JsonValue,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<RecordDbRow> for RecordRow {
    type Error = anyhow::Error;

    fn try_from(row: RecordDbRow) -> Result<Self, Self::Error> {
        let data = match row.data {
            JsonValue::Object(map) => map,
            other => return Err(anyhow!("record {} data is not an object: {}", row.id, other)),
        };
        Ok(RecordRow {
            id: row.id,
            kind: row.kind.parse()?,
            natural_key: row.natural_key,
            account_id: row.account_id,
            data,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Clone)]
pub struct CreateRecordRow {
    pub kind: RecordKind,
    pub natural_key: Option<String>,
    pub account_id: Option<Uuid>,
    pub data: Map<String, JsonValue>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn account_row(role: &str) -> AccountRow {
        AccountRow {
            id: Uuid::now_v7(),
            email: "a@example.com".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            role: role.to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_account_row_converts_role() {
        let account = Account::try_from(account_row("TEACHER")).unwrap();
        assert_eq!(account.role, Role::Instructor);
    }

    #[test]
    fn test_account_row_rejects_unknown_role() {
        assert!(Account::try_from(account_row("janitor")).is_err());
    }

    #[test]
    fn test_account_row_debug_omits_hash() {
        let rendered = format!("{:?}", account_row("ADMIN"));
        assert!(!rendered.contains("argon2id"));
    }

    #[test]
    fn test_record_kind_paths() {
        for kind in RecordKind::ALL {
            assert_eq!(kind.as_str().parse::<RecordKind>().unwrap(), kind);
        }
        assert!("grades".parse::<RecordKind>().is_err());
        assert_eq!(RecordKind::Teacher.account_role(), Some(Role::Instructor));
        assert_eq!(RecordKind::Course.account_role(), None);
    }

    #[test]
    fn test_record_db_row_requires_object() {
        let row = RecordDbRow {
            id: Uuid::now_v7(),
            kind: "courses".to_string(),
            natural_key: Some("CS101".to_string()),
            account_id: None,
            data: json!(["not", "an", "object"]),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(RecordRow::try_from(row).is_err());
    }
}
