//! Client-side form checks. A form that fails here is never sent to the
//! remote; its errors are shown next to the offending fields.

use std::{collections::BTreeMap, fmt, sync::LazyLock};

use regex::Regex;

use crate::models::{ArticlePatch, CategoryPatch, LoginRequest, NewArticle, NewCategory, RegisterRequest};

static USERNAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_]+$").expect("static username pattern"));

/// Field name to message, ordered by field name for stable output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    fields: BTreeMap<&'static str, String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the first error for a field; later ones are ignored.
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.fields.entry(field).or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.fields.iter().map(|(k, v)| (*k, v.as_str()))
    }

    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .fields
            .values()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("; ");
        f.write_str(&joined)
    }
}

/// Implemented by every payload that goes through a form.
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationErrors>;
}

impl Validate for NewCategory {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.name.trim().is_empty() {
            errors.add("name", "Category name is required");
        }
        errors.into_result()
    }
}

impl Validate for CategoryPatch {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.name.trim().is_empty() {
            errors.add("name", "Category name is required");
        }
        errors.into_result()
    }
}

impl Validate for NewArticle {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.title.trim().is_empty() {
            errors.add("title", "Title is required");
        }
        if self.content.trim().is_empty() {
            errors.add("content", "Content is required");
        }
        if self.category_id.trim().is_empty() {
            errors.add("categoryId", "Please select a category");
        }
        errors.into_result()
    }
}

impl Validate for ArticlePatch {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.title.trim().is_empty() {
            errors.add("title", "Title is required");
        }
        if self.category_id.trim().is_empty() {
            errors.add("categoryId", "Please select a category");
        }
        errors.into_result()
    }
}

impl Validate for LoginRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.username.trim().is_empty() {
            errors.add("username", "Username is required");
        } else if self.username.chars().count() < 3 {
            errors.add("username", "Username must be at least 3 characters");
        }
        if self.password.is_empty() {
            errors.add("password", "Password is required");
        } else if self.password.chars().count() < 6 {
            errors.add("password", "Password must be at least 6 characters");
        }
        errors.into_result()
    }
}

/// RegisterForm
///
/// The registration form carries a confirmation field that never leaves the
/// client.
#[derive(Debug, Clone, Default)]
pub struct RegisterForm {
    pub username: String,
    pub password: String,
    pub confirm_password: String,
    pub role: String,
}

impl RegisterForm {
    pub fn into_request(self) -> RegisterRequest {
        RegisterRequest {
            username: self.username,
            password: self.password,
            role: self.role,
        }
    }
}

impl Validate for RegisterForm {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.username.trim().is_empty() {
            errors.add("username", "Username is required");
        } else if self.username.chars().count() < 3 {
            errors.add("username", "Username must be at least 3 characters");
        } else if !USERNAME_CHARS.is_match(&self.username) {
            errors.add(
                "username",
                "Username can only contain letters, numbers, and underscores",
            );
        }

        if self.password.is_empty() {
            errors.add("password", "Password is required");
        } else if self.password.chars().count() < 6 {
            errors.add("password", "Password must be at least 6 characters");
        } else if !is_mixed_password(&self.password) {
            errors.add(
                "password",
                "Password must contain at least one uppercase letter, one lowercase letter, and one number",
            );
        }

        if self.confirm_password.is_empty() {
            errors.add("confirmPassword", "Please confirm your password");
        } else if self.password != self.confirm_password {
            errors.add("confirmPassword", "Passwords do not match");
        }

        if self.role.trim().is_empty() {
            errors.add("role", "Please select a role");
        }

        errors.into_result()
    }
}

fn is_mixed_password(password: &str) -> bool {
    password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register_form() -> RegisterForm {
        RegisterForm {
            username: "jane_doe".to_string(),
            password: "Secret123".to_string(),
            confirm_password: "Secret123".to_string(),
            role: "User".to_string(),
        }
    }

    #[test]
    fn valid_register_form_passes() {
        assert!(register_form().validate().is_ok());
    }

    #[test]
    fn register_rejects_symbols_in_username() {
        let form = RegisterForm {
            username: "jane-doe".to_string(),
            ..register_form()
        };
        let errors = form.validate().unwrap_err();
        assert_eq!(
            errors.get("username"),
            Some("Username can only contain letters, numbers, and underscores")
        );
    }

    #[test]
    fn register_requires_mixed_password() {
        let form = RegisterForm {
            password: "secret123".to_string(),
            confirm_password: "secret123".to_string(),
            ..register_form()
        };
        let errors = form.validate().unwrap_err();
        assert!(errors.get("password").unwrap().contains("uppercase"));
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn register_reports_every_bad_field() {
        let errors = RegisterForm::default().validate().unwrap_err();
        assert_eq!(errors.len(), 4);
        assert_eq!(errors.get("role"), Some("Please select a role"));
    }

    #[test]
    fn mismatched_confirmation() {
        let form = RegisterForm {
            confirm_password: "Secret124".to_string(),
            ..register_form()
        };
        assert_eq!(
            form.validate().unwrap_err().get("confirmPassword"),
            Some("Passwords do not match")
        );
    }

    #[test]
    fn blank_category_name_is_rejected() {
        let errors = NewCategory {
            name: "   ".to_string(),
        }
        .validate()
        .unwrap_err();
        assert_eq!(errors.to_string(), "Category name is required");
    }
}
