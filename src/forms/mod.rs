//! Typed form rule tables.
//!
//! Every form declares, per field, a static list of [`FieldRule`]s. Rules are
//! evaluated in declaration order; a field is invalid if any rule fails and
//! reports the message of the first failing rule.

pub mod auth;
pub mod product;
pub mod validators;

use std::collections::{BTreeMap, HashMap};
use std::fmt;

pub use auth::{ForgetPasswordForm, LoginForm, SetPasswordForm};
pub use product::{ProductField, ProductForm, QuantityDelta};

/// Field identifier of a form
pub trait FormField: Copy + Ord + fmt::Debug {
    fn as_str(&self) -> &'static str;
}

/// One validation rule for a value of type `T`, evaluated against context `C`
pub struct FieldRule<T: ?Sized, C> {
    pub name: &'static str,
    pub message: &'static str,
    pub check: fn(&T, &C) -> bool,
}

/// Outcome for a field that failed at least one rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// First failing rule
    pub rule: &'static str,
    pub message: &'static str,
    /// Every failing rule, in declaration order
    pub failed_rules: Vec<&'static str>,
}

/// Run every rule of a field
pub fn check_field<T: ?Sized, C>(rules: &[FieldRule<T, C>], value: &T, ctx: &C) -> Option<FieldError> {
    let failed: Vec<&FieldRule<T, C>> = rules.iter().filter(|rule| !(rule.check)(value, ctx)).collect();
    let first = failed.first()?;
    Some(FieldError {
        rule: first.name,
        message: first.message,
        failed_rules: failed.iter().map(|rule| rule.name).collect(),
    })
}

/// Field errors of one form submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldErrors<F: FormField> {
    errors: BTreeMap<F, FieldError>,
}

impl<F: FormField> Default for FieldErrors<F> {
    fn default() -> Self {
        Self { errors: BTreeMap::new() }
    }
}

impl<F: FormField> FieldErrors<F> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of [`check_field`] for `field`
    pub fn record(&mut self, field: F, outcome: Option<FieldError>) {
        match outcome {
            Some(error) => {
                self.errors.insert(field, error);
            }
            None => {
                self.errors.remove(&field);
            }
        }
    }

    pub fn get(&self, field: F) -> Option<&FieldError> {
        self.errors.get(&field)
    }

    pub fn message(&self, field: F) -> Option<&'static str> {
        self.errors.get(&field).map(|e| e.message)
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (F, &FieldError)> {
        self.errors.iter().map(|(field, error)| (*field, error))
    }

    /// Field name → message, as sent in `field_errors` of an API error
    pub fn to_map(&self) -> HashMap<String, String> {
        self.iter()
            .map(|(field, error)| (field.as_str().to_string(), error.message.to_string()))
            .collect()
    }
}

impl<F: FormField> fmt::Display for FieldErrors<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .iter()
            .map(|(field, error)| format!("{}: {}", field.as_str(), error.message))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

/// Convenience for forms whose validation either yields a value or field errors
pub type Validated<T, F> = Result<T, FieldErrors<F>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
    enum Field {
        Code,
    }

    impl FormField for Field {
        fn as_str(&self) -> &'static str {
            "code"
        }
    }

    fn not_empty(value: &str, _: &()) -> bool {
        !value.is_empty()
    }

    fn short(value: &str, _: &()) -> bool {
        value.len() <= 3
    }

    fn digits(value: &str, _: &()) -> bool {
        value.chars().all(|c| c.is_ascii_digit())
    }

    const CODE_RULES: &[FieldRule<str, ()>] = &[
        FieldRule { name: "required", message: "Code is required.", check: not_empty },
        FieldRule { name: "short", message: "Code is too long.", check: short },
        FieldRule { name: "digits", message: "Code must be digits.", check: digits },
    ];

    #[test]
    fn first_failing_rule_wins_but_all_are_evaluated() {
        let error = check_field(CODE_RULES, "abcd", &()).unwrap();
        assert_eq!(error.message, "Code is too long.");
        assert_eq!(error.failed_rules, vec!["short", "digits"]);
        assert!(check_field(CODE_RULES, "123", &()).is_none());
    }

    #[test]
    fn record_clears_fixed_fields() {
        let mut errors = FieldErrors::new();
        errors.record(Field::Code, check_field(CODE_RULES, "", &()));
        assert_eq!(errors.message(Field::Code), Some("Code is required."));
        assert_eq!(errors.to_map().get("code").map(String::as_str), Some("Code is required."));

        errors.record(Field::Code, check_field(CODE_RULES, "42", &()));
        assert!(errors.is_empty());
    }
}
