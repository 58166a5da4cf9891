// Input validation for account and record APIs
//
// Shape checks only; uniqueness and authorization live elsewhere.
// Login deliberately skips these so its failures stay uniform.

use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

// =============================================================================
// Limits
// =============================================================================

/// Minimum password length in characters.
pub const MIN_PASSWORD_CHARS: usize = 8;

/// Characters accepted as the "special" class of the password policy.
pub const PASSWORD_SPECIAL_CHARS: &str = "!@#$%^&*(),.?\":{}|<>";

/// Inclusive bounds for first and last names, in characters.
pub const MIN_NAME_CHARS: usize = 2;
pub const MAX_NAME_CHARS: usize = 50;

/// Maximum serialized size of a record document.
/// 64 KB is far beyond any real student, course or enrollment entry.
pub const MAX_RECORD_BYTES: usize = 64 * 1024;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is a valid regex")
});

// =============================================================================
// Validation Functions
// =============================================================================

/// Validation failure; the message is safe to return to clients
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Validate email shape (`local@domain.tld`)
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if !EMAIL_RE.is_match(email) {
        return Err(ValidationError::new("invalid email format"));
    }
    Ok(())
}

/// Validate the password policy: length plus one of each character class
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(ValidationError::new(format!(
            "password must be at least {} characters long",
            MIN_PASSWORD_CHARS
        )));
    }

    let checks = [
        (password.chars().any(|c| c.is_ascii_uppercase()), "an uppercase letter"),
        (password.chars().any(|c| c.is_ascii_lowercase()), "a lowercase letter"),
        (password.chars().any(|c| c.is_ascii_digit()), "a digit"),
        (
            password.chars().any(|c| PASSWORD_SPECIAL_CHARS.contains(c)),
            "a special character",
        ),
    ];
    if let Some((_, missing)) = checks.iter().find(|(present, _)| !present) {
        return Err(ValidationError::new(format!(
            "password must contain {}",
            missing
        )));
    }
    Ok(())
}

/// Validate a first or last name
pub fn validate_name(field: &str, value: &str) -> Result<(), ValidationError> {
    let len = value.trim().chars().count();
    if !(MIN_NAME_CHARS..=MAX_NAME_CHARS).contains(&len) {
        return Err(ValidationError::new(format!(
            "{} must be between {} and {} characters",
            field, MIN_NAME_CHARS, MAX_NAME_CHARS
        )));
    }
    Ok(())
}

/// Validate record document size
pub fn validate_record_size(bytes: usize) -> Result<(), ValidationError> {
    if bytes > MAX_RECORD_BYTES {
        tracing::warn!(
            "Record exceeds limit: {} bytes (max: {})",
            bytes,
            MAX_RECORD_BYTES
        );
        return Err(ValidationError::new("record exceeds allowed size"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_emails() {
        assert!(validate_email("a@x.com").is_ok());
        assert!(validate_email("first.last+tag@uni.example.edu").is_ok());
    }

    #[test]
    fn test_invalid_emails() {
        for email in ["", "plain", "a@x", "@x.com", "a b@x.com", "a@@x.com"] {
            assert!(validate_email(email).is_err(), "{email} should be rejected");
        }
    }

    #[test]
    fn test_valid_password() {
        assert!(validate_password("Str0ng!Pass").is_ok());
        assert!(validate_password("aB3{xxxx").is_ok());
    }

    #[test]
    fn test_password_too_short() {
        let err = validate_password("S0!a").unwrap_err();
        assert_eq!(err.0, "password must be at least 8 characters long");
    }

    #[test]
    fn test_password_missing_classes() {
        assert_eq!(
            validate_password("str0ng!pass").unwrap_err().0,
            "password must contain an uppercase letter"
        );
        assert_eq!(
            validate_password("STR0NG!PASS").unwrap_err().0,
            "password must contain a lowercase letter"
        );
        assert_eq!(
            validate_password("Strong!Pass").unwrap_err().0,
            "password must contain a digit"
        );
        assert_eq!(
            validate_password("Str0ngPass").unwrap_err().0,
            "password must contain a special character"
        );
        // Underscore is not in the special set
        assert!(validate_password("Str0ng_Pass").is_err());
    }

    #[test]
    fn test_name_bounds() {
        assert!(validate_name("firstName", "Al").is_ok());
        assert!(validate_name("firstName", &"x".repeat(50)).is_ok());
        assert!(validate_name("firstName", "A").is_err());
        assert!(validate_name("firstName", "  A  ").is_err());
        assert!(validate_name("lastName", &"x".repeat(51)).is_err());
        assert_eq!(
            validate_name("lastName", "").unwrap_err().0,
            "lastName must be between 2 and 50 characters"
        );
    }

    #[test]
    fn test_record_size() {
        assert!(validate_record_size(MAX_RECORD_BYTES).is_ok());
        assert!(validate_record_size(MAX_RECORD_BYTES + 1).is_err());
    }
}
