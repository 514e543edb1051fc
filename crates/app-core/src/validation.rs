//! Client-side form validation
//!
//! Checks run on the auth forms before anything is sent to the API. Every
//! validator collects all field errors instead of stopping at the first one,
//! so a form can mark each invalid field at once.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Minimum password length accepted by sign-up and reset
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Minimum OTP length accepted by password reset
pub const MIN_RESET_OTP_LENGTH: usize = 6;

/// A single invalid field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Form field name (matches the API variable name)
    pub field: &'static str,
    /// Message shown under the field
    pub message: String,
}

/// All invalid fields of a form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("Invalid form: {}", join_errors(.errors))]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

fn join_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationErrors {
    fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push(FieldError { field, message: message.into() });
    }

    fn into_result(self) -> Result<()> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    /// All field errors in form order
    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// Messages for one field
    pub fn for_field(&self, field: &str) -> Vec<&str> {
        self.errors
            .iter()
            .filter(|e| e.field == field)
            .map(|e| e.message.as_str())
            .collect()
    }

    /// Whether a field has any error
    pub fn has_field(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }
}

/// Result type for validation
pub type Result<T> = std::result::Result<T, ValidationErrors>;

/// Sign-in form
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginForm {
    /// Email address
    pub email: String,
    /// Password
    pub password: String,
}

/// Sign-up form
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignUpForm {
    /// First name
    pub first_name: String,
    /// Last name
    pub last_name: String,
    /// Email address
    pub email: String,
    /// Password
    pub password: String,
    /// Password confirmation
    pub confirm_password: String,
}

/// Password reset form
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResetPasswordForm {
    /// OTP received by email
    pub otp: String,
    /// New password
    pub password: String,
    /// New password confirmation
    pub confirm_password: String,
}

fn email_regex() -> &'static Regex {
    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    EMAIL_REGEX.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap())
}

fn special_char_regex() -> &'static Regex {
    static SPECIAL_REGEX: OnceLock<Regex> = OnceLock::new();
    SPECIAL_REGEX.get_or_init(|| Regex::new(r#"[`~<>?,./!@#$%^&*()\-_+="'|{}\[\];:\\]"#).unwrap())
}

/// Text fields are trimmed by the caller; passwords are checked as typed.
fn check_required(errors: &mut ValidationErrors, field: &'static str, value: &str, message: &str) -> bool {
    if value.is_empty() {
        errors.push(field, message);
        return false;
    }
    true
}

fn check_email(errors: &mut ValidationErrors, email: &str) {
    let email = email.trim();
    if check_required(errors, "email", email, "Email is required") && !email_regex().is_match(email)
    {
        errors.push("email", "Invalid email");
    }
}

fn check_password_strength(errors: &mut ValidationErrors, field: &'static str, password: &str) {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        errors.push(
            field,
            format!("Must be at least {} characters in length", MIN_PASSWORD_LENGTH),
        );
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        errors.push(field, "One uppercase character");
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        errors.push(field, "One lowercase character");
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        errors.push(field, "One number");
    }
    if !special_char_regex().is_match(password) {
        errors.push(field, "One special character");
    }
}

/// Validate an email address on its own (forgot-password form)
pub fn validate_email(email: &str) -> Result<()> {
    let mut errors = ValidationErrors::default();
    check_email(&mut errors, email);
    errors.into_result()
}

/// Validate the sign-in form
pub fn validate_login(form: &LoginForm) -> Result<()> {
    let mut errors = ValidationErrors::default();
    check_email(&mut errors, &form.email);
    check_required(&mut errors, "password", &form.password, "Password is required");
    errors.into_result()
}

/// Validate the sign-up form
pub fn validate_sign_up(form: &SignUpForm) -> Result<()> {
    let mut errors = ValidationErrors::default();
    check_required(&mut errors, "first_name", form.first_name.trim(), "First name is required");
    check_required(&mut errors, "last_name", form.last_name.trim(), "Last name is required");
    check_email(&mut errors, &form.email);
    check_password_strength(&mut errors, "password", &form.password);
    check_password_strength(&mut errors, "confirm_password", &form.confirm_password);
    if form.password != form.confirm_password {
        errors.push("confirm_password", "Passwords do not match");
    }
    errors.into_result()
}

/// Validate the account verification OTP
pub fn validate_verification_otp(otp: &str) -> Result<()> {
    let mut errors = ValidationErrors::default();
    check_required(&mut errors, "otp", otp.trim(), "OTP is required");
    errors.into_result()
}

/// Validate the password reset form
pub fn validate_reset_password(form: &ResetPasswordForm) -> Result<()> {
    let mut errors = ValidationErrors::default();
    if form.otp.trim().chars().count() < MIN_RESET_OTP_LENGTH {
        errors.push("otp", "Please enter a valid OTP.");
    }
    check_password_strength(&mut errors, "password", &form.password);
    check_password_strength(&mut errors, "confirm_password", &form.confirm_password);
    if form.password != form.confirm_password {
        errors.push("confirm_password", "Passwords do not match");
    }
    errors.into_result()
}
