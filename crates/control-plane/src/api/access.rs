// Static role allow-sets for the records API
//
// Reads are open to every authenticated role; writes follow this table.

use registrar_core::Role;

use crate::storage::RecordKind;

pub const ADMIN_ONLY: &[Role] = &[Role::Administrator];
pub const STAFF: &[Role] = &[Role::Administrator, Role::Instructor];

/// Roles allowed to perform each write operation on a record collection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourcePolicy {
    pub create: &'static [Role],
    pub update: &'static [Role],
    pub delete: &'static [Role],
}

pub fn policy_for(kind: RecordKind) -> ResourcePolicy {
    match kind {
        RecordKind::Student | RecordKind::Teacher => ResourcePolicy {
            create: ADMIN_ONLY,
            update: ADMIN_ONLY,
            delete: ADMIN_ONLY,
        },
        RecordKind::Course => ResourcePolicy {
            create: STAFF,
            update: STAFF,
            delete: ADMIN_ONLY,
        },
        RecordKind::Enrollment => ResourcePolicy {
            create: STAFF,
            update: STAFF,
            delete: STAFF,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_people_are_admin_only() {
        for kind in [RecordKind::Student, RecordKind::Teacher] {
            let policy = policy_for(kind);
            assert_eq!(policy.create, ADMIN_ONLY);
            assert_eq!(policy.update, ADMIN_ONLY);
            assert_eq!(policy.delete, ADMIN_ONLY);
        }
    }

    #[test]
    fn test_course_delete_is_admin_only() {
        let policy = policy_for(RecordKind::Course);
        assert!(policy.create.contains(&Role::Instructor));
        assert!(policy.update.contains(&Role::Instructor));
        assert!(!policy.delete.contains(&Role::Instructor));
    }

    #[test]
    fn test_students_never_write() {
        for kind in RecordKind::ALL {
            let policy = policy_for(kind);
            for allowed in [policy.create, policy.update, policy.delete] {
                assert!(!allowed.contains(&Role::Student), "{kind} allows students");
            }
        }
    }
}
