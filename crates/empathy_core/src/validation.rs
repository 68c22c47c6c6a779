//! crates/empathy_core/src/validation.rs
//!
//! Local form rules. Input that fails here is reported per field and is never
//! sent to the backend.

use crate::domain::{Credentials, NewStory, Registration};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

static EMAIL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());
static LOWERCASE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[a-z]").unwrap());
static UPPERCASE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Z]").unwrap());
static DIGIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]").unwrap());
static SPECIAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"[@#$%^&+=!]").unwrap());

pub const PASSWORD_MIN_LEN: usize = 6;
pub const PASSWORD_MAX_LEN: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    FirstName,
    LastName,
    Email,
    Password,
    ConfirmPassword,
    Story,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: Field,
    pub message: String,
}

/// Every rule that failed, in form order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(Vec<FieldError>);

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self.0.iter().map(|e| e.message.as_str()).collect();
        write!(f, "{}", messages.join(" "))
    }
}

impl std::error::Error for ValidationErrors {}

impl ValidationErrors {
    pub fn push(&mut self, field: Field, message: impl Into<String>) {
        self.0.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }

    /// The first message reported for `field`, for inline display.
    pub fn for_field(&self, field: Field) -> Option<&str> {
        self.0
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    pub fn merge(&mut self, other: ValidationErrors) {
        self.0.extend(other.0);
    }

    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL.is_match(email.trim())
}

/// One lowercase, one uppercase, one digit, one of `@#$%^&+=!`, 6 to 20 characters.
pub fn meets_password_policy(password: &str) -> bool {
    let len = password.chars().count();
    (PASSWORD_MIN_LEN..=PASSWORD_MAX_LEN).contains(&len)
        && LOWERCASE.is_match(password)
        && UPPERCASE.is_match(password)
        && DIGIT.is_match(password)
        && SPECIAL.is_match(password)
}

pub fn validate_registration(input: &Registration) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    if input.first_name.trim().is_empty() {
        errors.push(Field::FirstName, "First Name is required.");
    }
    if input.last_name.trim().is_empty() {
        errors.push(Field::LastName, "Last Name is required.");
    }
    if !is_valid_email(&input.email) {
        errors.push(Field::Email, "Valid Email is required.");
    }
    if input.password.trim().is_empty() {
        errors.push(Field::Password, "Password is required.");
    } else if !meets_password_policy(&input.password) {
        errors.push(
            Field::Password,
            "Password must be 6-20 characters and contain an uppercase letter, \
             a lowercase letter, a number and one of @#$%^&+=!",
        );
    }
    errors.into_result()
}

pub fn validate_password_confirmation(password: &str, confirm: &str) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    if password != confirm {
        errors.push(Field::ConfirmPassword, "Passwords do not match.");
    }
    errors.into_result()
}

pub fn validate_credentials(input: &Credentials) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    if input.email.trim().is_empty() {
        errors.push(Field::Email, "Email Required");
    }
    if input.password.trim().is_empty() {
        errors.push(Field::Password, "Password Required");
    }
    errors.into_result()
}

pub fn validate_story(input: &NewStory) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    if input.text.trim().is_empty() {
        errors.push(Field::Story, "Story cannot be empty");
    }
    errors.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration() -> Registration {
        Registration {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            password: "Secret1!".to_string(),
        }
    }

    #[test]
    fn complete_registration_passes() {
        assert!(validate_registration(&registration()).is_ok());
    }

    #[test]
    fn each_missing_field_is_reported_on_that_field() {
        let cases = [
            (Field::FirstName, Registration { first_name: " ".into(), ..registration() }),
            (Field::LastName, Registration { last_name: String::new(), ..registration() }),
            (Field::Email, Registration { email: String::new(), ..registration() }),
            (Field::Password, Registration { password: String::new(), ..registration() }),
        ];
        for (field, input) in cases {
            let errors = validate_registration(&input).unwrap_err();
            assert_eq!(errors.errors().len(), 1, "{field:?}");
            assert!(errors.for_field(field).is_some(), "{field:?}");
        }
    }

    #[test]
    fn password_policy() {
        for ok in ["Secret1!", "aB3@xy", "Abcdefghijklmnop12#z"] {
            assert!(meets_password_policy(ok), "{ok}");
        }
        for bad in [
            "secret1!",              // no uppercase
            "SECRET1!",              // no lowercase
            "Secret!!",              // no digit
            "Secret12",              // no special
            "Se1!",                  // too short
            "Abcdefghijklmnop12#zz", // too long
            "Secret1?",              // special outside the set
        ] {
            assert!(!meets_password_policy(bad), "{bad}");
        }
    }

    #[test]
    fn email_format() {
        assert!(is_valid_email("a@b.com"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("ab.com"));
        assert!(!is_valid_email("a b@c.com"));
    }

    #[test]
    fn confirmation_must_match() {
        assert!(validate_password_confirmation("Secret1!", "Secret1!").is_ok());
        let errors = validate_password_confirmation("Secret1!", "Secret1").unwrap_err();
        assert_eq!(errors.for_field(Field::ConfirmPassword), Some("Passwords do not match."));
    }

    #[test]
    fn login_only_requires_both_fields() {
        let errors = validate_credentials(&Credentials::default()).unwrap_err();
        assert_eq!(errors.for_field(Field::Email), Some("Email Required"));
        assert_eq!(errors.for_field(Field::Password), Some("Password Required"));
        let weak = Credentials {
            email: "a@b.com".into(),
            password: "x".into(),
        };
        assert!(validate_credentials(&weak).is_ok());
    }

    #[test]
    fn whitespace_story_is_rejected() {
        let story = NewStory {
            text: " \n\t".into(),
            ..Default::default()
        };
        let errors = validate_story(&story).unwrap_err();
        assert_eq!(errors.to_string(), "Story cannot be empty");
    }
}
