use once_cell::sync::Lazy;
use regex::Regex;

use crate::{AppError, AppResult};

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("email regex")
});

/// Username: non-empty after trimming, 3 to 50 characters.
pub fn validate_username(username: &str) -> AppResult<&str> {
    let trimmed = username.trim();

    if trimmed.is_empty() {
        return Err(AppError::Validation("Please enter a username.".to_string()));
    }

    if trimmed.chars().count() < 3 {
        return Err(AppError::Validation(
            "The username must be at least 3 characters.".to_string(),
        ));
    }

    if trimmed.chars().count() > 50 {
        return Err(AppError::Validation(
            "The username must be 50 characters or fewer.".to_string(),
        ));
    }

    Ok(trimmed)
}

/// Password: at least 8 characters. Pool-level complexity rules are the
/// provider's to enforce.
pub fn validate_password(password: &str) -> AppResult<()> {
    if password.is_empty() {
        return Err(AppError::Validation("Please enter a password.".to_string()));
    }

    if password.chars().count() < 8 {
        return Err(AppError::Validation(
            "The password must be at least 8 characters.".to_string(),
        ));
    }

    Ok(())
}

pub fn validate_email(email: &str) -> AppResult<&str> {
    let trimmed = email.trim();

    if trimmed.is_empty() {
        return Err(AppError::Validation("Please enter an email address.".to_string()));
    }

    if !EMAIL_RE.is_match(trimmed) {
        return Err(AppError::Validation(
            "That does not look like a valid email address.".to_string(),
        ));
    }

    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username_bounds() {
        assert!(validate_username("").is_err());
        assert!(validate_username("   ").is_err());
        assert!(validate_username("ab").is_err());
        assert!(validate_username(&"x".repeat(51)).is_err());
        assert_eq!(validate_username("  dana.kim  ").unwrap(), "dana.kim");
    }

    #[test]
    fn test_password_minimum_length() {
        assert!(validate_password("").is_err());
        assert!(validate_password("short7!").is_err());
        assert!(validate_password("longenough").is_ok());
    }

    #[test]
    fn test_email_shapes() {
        assert!(validate_email("").is_err());
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("missing@tld").is_err());
        assert_eq!(validate_email(" dana@example.com ").unwrap(), "dana@example.com");
    }
}
