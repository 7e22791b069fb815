//! Input normalization shared by the services.

use super::error::{DomainError, DomainResult};

/// Trim a required text field, rejecting blank input
pub fn require(field: &'static str, value: &str) -> DomainResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::Validation {
            field,
            message: "is required".to_string(),
        });
    }
    Ok(trimmed.to_string())
}

/// Trim an optional text field; blank collapses to `None`
pub fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Required email address: trimmed, one `@` with text on both sides
pub fn require_email(field: &'static str, value: &str) -> DomainResult<String> {
    let email = require(field, value)?;
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() && !domain.contains('@') => Ok(email),
        _ => Err(DomainError::Validation {
            field,
            message: "should be valid".to_string(),
        }),
    }
}

/// [`require`] for a patch field; `None` leaves the field untouched
pub fn require_patch(field: &'static str, value: Option<String>) -> DomainResult<Option<String>> {
    value.map(|v| require(field, &v)).transpose()
}

/// [`require_email`] for a patch field
pub fn require_email_patch(field: &'static str, value: Option<String>) -> DomainResult<Option<String>> {
    value.map(|v| require_email(field, &v)).transpose()
}

/// Overwrite `target` when a new value is supplied
pub fn patch<T>(target: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *target = value;
    }
}

/// Overwrite an optional text field when supplied; blank input clears it
pub fn patch_optional(target: &mut Option<String>, value: Option<String>) {
    if value.is_some() {
        *target = normalize_optional(value);
    }
}

/// Required non-text value such as a date
pub fn require_value<T>(field: &'static str, value: Option<T>) -> DomainResult<T> {
    value.ok_or_else(|| DomainError::Validation {
        field,
        message: "is required".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_trims() {
        assert_eq!(require("Name", "  Max ").unwrap(), "Max");
        assert!(matches!(
            require("Name", "   "),
            Err(DomainError::Validation { field: "Name", .. })
        ));
    }

    #[test]
    fn test_normalize_optional() {
        assert_eq!(normalize_optional(Some(" 555 ".to_string())), Some("555".to_string()));
        assert_eq!(normalize_optional(Some("  ".to_string())), None);
        assert_eq!(normalize_optional(None), None);
    }

    #[test]
    fn test_patch_helpers() {
        let mut name = "Max".to_string();
        patch(&mut name, None);
        assert_eq!(name, "Max");
        patch(&mut name, Some("Rex".to_string()));
        assert_eq!(name, "Rex");

        let mut phone = Some("555".to_string());
        patch_optional(&mut phone, None);
        assert_eq!(phone.as_deref(), Some("555"));
        patch_optional(&mut phone, Some(" ".to_string()));
        assert_eq!(phone, None);

        assert_eq!(require_patch("Name", None).unwrap(), None);
        assert!(require_patch("Name", Some(String::new())).is_err());
        assert!(require_email_patch("Email", Some("x".to_string())).is_err());
    }

    #[test]
    fn test_require_value() {
        assert_eq!(require_value("Birth date", Some(3)).unwrap(), 3);

        let err = require_value::<i32>("Visit date", None).unwrap_err();
        assert_eq!(err.to_string(), "Visit date is required");
    }

    #[test]
    fn test_require_email() {
        assert_eq!(require_email("Email", " vet@clinic.co ").unwrap(), "vet@clinic.co");
        assert!(require_email("Email", "").is_err());
        assert!(require_email("Email", "no-at-sign").is_err());
        assert!(require_email("Email", "@clinic.co").is_err());
        assert!(require_email("Email", "a@b@c").is_err());
    }
}
