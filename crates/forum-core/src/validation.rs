//! Input validation, run as a plain pre-check before any store access.

use crate::error::FieldError;

/// Usernames and passwords must be strictly longer than this.
pub const MIN_SECRET_LEN: usize = 5;

/// Registration rules, checked in order. The first failure wins.
pub fn validate_registration(username: &str, email: &str, password: &str) -> Option<FieldError> {
    if !email.contains('@') {
        return Some(FieldError::new("email", "Email must include @ symbol"));
    }

    if username.chars().count() <= MIN_SECRET_LEN {
        return Some(FieldError::new(
            "username",
            format!("Length must be greater than {MIN_SECRET_LEN}"),
        ));
    }

    if username.contains('@') {
        return Some(FieldError::new("username", "Username cannot include @"));
    }

    validate_password("password", password)
}

pub fn validate_password(field: &str, password: &str) -> Option<FieldError> {
    (password.chars().count() <= MIN_SECRET_LEN).then(|| {
        FieldError::new(field, format!("Length must be greater than {MIN_SECRET_LEN}"))
    })
}

/// Title and text must both be present. Reports every failing field.
pub fn validate_post_content(title: &str, text: &str) -> Vec<FieldError> {
    let mut errors = Vec::new();
    if title.trim().is_empty() {
        errors.push(FieldError::new("title", "Title is required"));
    }
    if text.trim().is_empty() {
        errors.push(FieldError::new("text", "Text is required"));
    }
    errors
}
