//! Login, forget-password and set-password forms.

use serde::{Deserialize, Serialize};

use super::validators::{min_chars, required};
use super::{check_field, FieldErrors, FieldRule, FormField, Validated};
use crate::backend::ResetError;

pub const EMAIL_REQUIRED: &str = "Email is required.";
pub const PASSWORD_REQUIRED: &str = "Password is required.";
pub const PASSWORD_TOO_SHORT: &str = "Password must be at least 8 characters long.";
pub const PASSWORD_NOT_MATCHED: &str = "Password not matched.";

pub const INCORRECT_CREDENTIALS: &str = "Incorrect email or password.";
pub const RESET_SENT: &str = "An email with an instruction to reset your password is sent to your email address.";
pub const RESET_NO_USER: &str = "There is no user with this email.";
pub const RESET_FAILED: &str = "Failed to reset your password.";

pub const MIN_PASSWORD_CHARS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AuthField {
    Email,
    Password,
    ConfirmPassword,
}

impl FormField for AuthField {
    fn as_str(&self) -> &'static str {
        match self {
            AuthField::Email => "email",
            AuthField::Password => "password",
            AuthField::ConfirmPassword => "confirm_password",
        }
    }
}

fn text_required(value: &str, _: &()) -> bool {
    required(value)
}

fn long_enough(value: &str, _: &()) -> bool {
    min_chars(value, MIN_PASSWORD_CHARS)
}

/// Confirmation is only compared once a password was typed
fn matches_password(confirm: &str, password: &String) -> bool {
    password.is_empty() || confirm == password.as_str()
}

const EMAIL_RULES: &[FieldRule<str, ()>] = &[FieldRule {
    name: "required",
    message: EMAIL_REQUIRED,
    check: text_required,
}];

const LOGIN_PASSWORD_RULES: &[FieldRule<str, ()>] = &[FieldRule {
    name: "required",
    message: PASSWORD_REQUIRED,
    check: text_required,
}];

const NEW_PASSWORD_RULES: &[FieldRule<str, ()>] = &[
    FieldRule {
        name: "required",
        message: PASSWORD_REQUIRED,
        check: text_required,
    },
    FieldRule {
        name: "minLength",
        message: PASSWORD_TOO_SHORT,
        check: long_enough,
    },
];

const CONFIRM_PASSWORD_RULES: &[FieldRule<str, String>] = &[FieldRule {
    name: "validate",
    message: PASSWORD_NOT_MATCHED,
    check: matches_password,
}];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> Validated<(), AuthField> {
        let mut errors = FieldErrors::new();
        errors.record(AuthField::Email, check_field(EMAIL_RULES, self.email.as_str(), &()));
        errors.record(AuthField::Password, check_field(LOGIN_PASSWORD_RULES, self.password.as_str(), &()));
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ForgetPasswordForm {
    #[serde(default)]
    pub email: String,
}

impl ForgetPasswordForm {
    pub fn validate(&self) -> Validated<(), AuthField> {
        let mut errors = FieldErrors::new();
        errors.record(AuthField::Email, check_field(EMAIL_RULES, self.email.as_str(), &()));
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Message shown after the reset request completes
    pub fn outcome_message(result: &Result<(), ResetError>) -> &'static str {
        match result {
            Ok(()) => RESET_SENT,
            Err(err) if err.status == 404 => RESET_NO_USER,
            Err(_) => RESET_FAILED,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SetPasswordForm {
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
}

impl SetPasswordForm {
    pub fn validate(&self) -> Validated<(), AuthField> {
        let mut errors = FieldErrors::new();
        errors.record(AuthField::Password, check_field(NEW_PASSWORD_RULES, self.password.as_str(), &()));
        errors.record(
            AuthField::ConfirmPassword,
            check_field(CONFIRM_PASSWORD_RULES, self.confirm_password.as_str(), &self.password),
        );
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
