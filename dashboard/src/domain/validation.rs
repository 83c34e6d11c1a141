//! Form validation primitives shared by entity drafts and login forms.
//!
//! Validation runs before any network call. A successful check yields a
//! [`Validated`] wrapper, and entity services only accept validated payloads,
//! so unchecked input cannot reach the backend.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

/// Maximum length of names and titles.
pub const NAME_MAX: usize = 120;
/// Maximum length of free-text descriptions.
pub const DESCRIPTION_MAX: usize = 1000;

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        let pattern = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";
        Regex::new(pattern).unwrap_or_else(|error| panic!("email regex failed to compile: {error}"))
    })
}

/// Whether `value` looks like `local@domain.tld`.
pub fn is_valid_email(value: &str) -> bool {
    email_regex().is_match(value)
}

/// Per-field validation messages keyed by the wire (camelCase) field name.
///
/// Only the first failure for each field is kept, matching what a form shows
/// beneath an input.
///
/// # Examples
/// ```
/// use dashboard::domain::FieldErrors;
///
/// let mut errors = FieldErrors::new();
/// errors.add("name", "Name is required");
/// errors.add("name", "ignored");
/// assert_eq!(errors.get("name"), Some("Name is required"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldErrors(BTreeMap<&'static str, String>);

impl FieldErrors {
    /// Empty error set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message for `field` unless one is already present.
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
    }

    /// Message recorded for `field`, if any.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    /// Whether no field failed validation.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of failing fields.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate failing fields in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.0.iter().map(|(field, message)| (*field, message.as_str()))
    }

    /// Fail `field` when the trimmed text is empty or longer than `max`.
    pub fn require_text(&mut self, field: &'static str, label: &str, value: &str, max: usize) {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            self.add(field, format!("{label} is required"));
        } else if trimmed.chars().count() > max {
            self.add(field, format!("{label} must be at most {max} characters"));
        }
    }

    /// Fail `field` when present text is longer than `max`.
    pub fn limit_optional_text(
        &mut self,
        field: &'static str,
        label: &str,
        value: Option<&str>,
        max: usize,
    ) {
        if value.is_some_and(|text| text.trim().chars().count() > max) {
            self.add(field, format!("{label} must be at most {max} characters"));
        }
    }

    /// Fail `field` when the value is blank or not shaped like an address.
    pub fn require_email(&mut self, field: &'static str, value: &str) {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            self.add(field, "Email is required");
        } else if !is_valid_email(trimmed) {
            self.add(field, "Enter a valid email address");
        }
    }

    /// Fail `field` when a required reference id is blank.
    pub fn require_reference(&mut self, field: &'static str, label: &str, value: &str) {
        if value.trim().is_empty() {
            self.add(field, format!("Select a {label}"));
        }
    }
}

/// Trim `value` in place.
pub fn trim_text(value: &mut String) {
    let trimmed = value.trim();
    if trimmed.len() != value.len() {
        *value = trimmed.to_owned();
    }
}

/// Trim optional text, dropping it when nothing is left.
pub fn trim_optional_text(value: &mut Option<String>) {
    if let Some(text) = value.as_mut() {
        trim_text(text);
    }
    if value.as_deref().is_some_and(str::is_empty) {
        *value = None;
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in self.iter() {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for FieldErrors {}

/// A payload that passed its schema check.
///
/// The only constructor is [`Validate::validated`].
#[derive(Debug, Clone, PartialEq)]
pub struct Validated<T>(T);

impl<T> Validated<T> {
    /// Borrow the checked payload.
    pub fn as_inner(&self) -> &T {
        &self.0
    }

    /// Unwrap the checked payload.
    pub fn into_inner(self) -> T {
        self.0
    }
}

/// Schema check for a form payload.
pub trait Validate: Sized {
    /// Collect every field failure for the current values.
    fn validate(&self) -> FieldErrors;

    /// The payload as it should travel: surrounding whitespace removed.
    fn normalized(self) -> Self {
        self
    }

    /// Consume the payload, returning its normalized form wrapped when it
    /// is valid.
    fn validated(self) -> Result<Validated<Self>, FieldErrors> {
        let payload = self.normalized();
        let errors = payload.validate();
        if errors.is_empty() {
            Ok(Validated(payload))
        } else {
            Err(errors)
        }
    }
}
