//! Form validation.
//!
//! Every form collects all of its failures at once, keyed by field name, so a
//! front end can show each message next to the offending input. Optional text
//! inputs are normalized: surrounding whitespace is dropped and blank values
//! become `None`.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Serialize;

use crate::model::ActivityType;

/// Minimum password length used when no configuration is supplied.
pub const DEFAULT_MIN_PASSWORD_LENGTH: usize = 6;

/// Loose email shape: something, an `@`, something, a dot, something.
const EMAIL_PATTERN: &str = r"\S+@\S+\.\S+";

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(EMAIL_PATTERN).expect("email pattern is valid"))
}

/// Check whether a string looks like an email address.
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    email_regex().is_match(email)
}

/// `#rgb` or `#rrggbb`.
const COLOR_PATTERN: &str = r"^#(?:[0-9a-fA-F]{3}|[0-9a-fA-F]{6})$";

fn color_regex() -> &'static Regex {
    static COLOR: OnceLock<Regex> = OnceLock::new();
    COLOR.get_or_init(|| Regex::new(COLOR_PATTERN).expect("color pattern is valid"))
}

/// Validate an optional stage color, normalizing blank input to `None`.
///
/// # Errors
///
/// Returns a `color` error when the value is not a hex color.
pub fn stage_color(color: Option<String>) -> Result<Option<String>, ValidationErrors> {
    match normalize_optional(color) {
        Some(color) if !color_regex().is_match(&color) => {
            let mut errors = ValidationErrors::default();
            errors.add("color", "Color must look like #rrggbb");
            Err(errors)
        }
        color => Ok(color.map(|c| c.to_lowercase())),
    }
}

/// Per-field validation messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors {
    fields: BTreeMap<&'static str, String>,
}

impl ValidationErrors {
    /// Record a failure for `field`. The first message for a field wins.
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.fields.entry(field).or_insert_with(|| message.into());
    }

    /// The message recorded for `field`, if any.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    /// Whether `field` failed.
    #[must_use]
    pub fn has(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Whether nothing failed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Number of failing fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Iterate over `(field, message)` pairs in field order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.fields.iter().map(|(k, v)| (*k, v.as_str()))
    }

    /// `Ok(())` when empty, otherwise `Err(self)`.
    ///
    /// # Errors
    ///
    /// Returns the collected errors when at least one field failed.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in &self.fields {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Trim an optional input, turning blank strings into `None`.
#[must_use]
pub fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Require a non-blank value, returning it trimmed.
///
/// # Errors
///
/// Returns a single-field error when the value is blank.
pub fn require(
    field: &'static str,
    value: &str,
    message: &str,
) -> Result<String, ValidationErrors> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        let mut errors = ValidationErrors::default();
        errors.add(field, message);
        Err(errors)
    } else {
        Ok(trimmed.to_string())
    }
}

fn check_email(errors: &mut ValidationErrors, field: &'static str, email: &str) {
    if email.trim().is_empty() {
        errors.add(field, "Email is required");
    } else if !is_valid_email(email) {
        errors.add(field, "Email is invalid");
    }
}

/// Account registration form.
#[derive(Debug, Clone, Default)]
pub struct RegistrationForm {
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: String,
    /// Chosen password.
    pub password: String,
    /// Password typed a second time.
    pub confirm_password: String,
}

impl RegistrationForm {
    /// Validate every field.
    ///
    /// # Errors
    ///
    /// Returns all failing fields.
    pub fn validate(&self, min_password_length: usize) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();

        if self.name.trim().is_empty() {
            errors.add("name", "Name is required");
        }

        check_email(&mut errors, "email", &self.email);

        if self.password.trim().is_empty() {
            errors.add("password", "Password is required");
        } else if self.password.chars().count() < min_password_length {
            errors.add(
                "password",
                format!("Password must be at least {min_password_length} characters"),
            );
        }

        if self.confirm_password.trim().is_empty() {
            errors.add("confirm_password", "Please confirm your password");
        } else if self.password != self.confirm_password {
            errors.add("confirm_password", "Passwords do not match");
        }

        errors.into_result()
    }
}

/// Profile settings form.
#[derive(Debug, Clone, Default)]
pub struct ProfileForm {
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: String,
    /// Avatar image URL.
    pub avatar: Option<String>,
}

impl ProfileForm {
    /// Validate and normalize.
    ///
    /// # Errors
    ///
    /// Returns all failing fields.
    pub fn validate(self) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::default();
        if self.name.trim().is_empty() {
            errors.add("name", "Name is required");
        }
        check_email(&mut errors, "email", &self.email);
        errors.into_result()?;

        Ok(Self {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            avatar: normalize_optional(self.avatar),
        })
    }
}

/// First-run setup: the company and the user who owns it.
#[derive(Debug, Clone, Default)]
pub struct WorkspaceForm {
    /// Name of the new company.
    pub company_name: String,
    /// Name of the company owner.
    pub owner_name: String,
    /// Email of the company owner.
    pub owner_email: String,
}

impl WorkspaceForm {
    /// Validate and normalize.
    ///
    /// # Errors
    ///
    /// Returns all failing fields.
    pub fn validate(self) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::default();
        if self.company_name.trim().is_empty() {
            errors.add("company_name", "Company name is required");
        }
        if self.owner_name.trim().is_empty() {
            errors.add("owner_name", "Name is required");
        }
        check_email(&mut errors, "owner_email", &self.owner_email);
        errors.into_result()?;

        Ok(Self {
            company_name: self.company_name.trim().to_string(),
            owner_name: self.owner_name.trim().to_string(),
            owner_email: self.owner_email.trim().to_string(),
        })
    }
}

/// Lead create/edit form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeadForm {
    /// Lead name.
    pub name: String,
    /// Email address.
    pub email: Option<String>,
    /// Phone number as entered.
    pub phone: Option<String>,
    /// Stage the lead sits in.
    pub stage_id: String,
    /// Interest tag.
    pub interest_id: Option<String>,
    /// User responsible for the lead.
    pub assigned_to: Option<String>,
}

impl LeadForm {
    /// Validate and normalize.
    ///
    /// # Errors
    ///
    /// Returns all failing fields.
    pub fn validate(self) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::default();
        if self.name.trim().is_empty() {
            errors.add("name", "Lead name is required");
        }
        if self.stage_id.trim().is_empty() {
            errors.add("stage_id", "Stage is required");
        }

        let email = normalize_optional(self.email);
        if let Some(email) = &email {
            if !is_valid_email(email) {
                errors.add("email", "Email is invalid");
            }
        }
        errors.into_result()?;

        Ok(Self {
            name: self.name.trim().to_string(),
            email,
            phone: normalize_optional(self.phone),
            stage_id: self.stage_id.trim().to_string(),
            interest_id: normalize_optional(self.interest_id),
            assigned_to: normalize_optional(self.assigned_to),
        })
    }
}

/// Activity scheduling form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivityForm {
    /// Short title.
    pub title: String,
    /// Longer description.
    pub description: Option<String>,
    /// The lead to attach it to.
    pub lead_id: String,
    /// Kind of activity.
    pub activity_type: ActivityType,
    /// When it is due.
    pub due_date: Option<DateTime<Utc>>,
}

/// An [`ActivityForm`] that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidActivity {
    /// Short title.
    pub title: String,
    /// Longer description.
    pub description: Option<String>,
    /// The lead to attach it to.
    pub lead_id: String,
    /// Kind of activity.
    pub activity_type: ActivityType,
    /// When it is due.
    pub due_date: DateTime<Utc>,
}

impl ActivityForm {
    /// Validate and normalize.
    ///
    /// # Errors
    ///
    /// Returns all failing fields.
    pub fn validate(self) -> Result<ValidActivity, ValidationErrors> {
        let mut errors = ValidationErrors::default();
        if self.title.trim().is_empty() {
            errors.add("title", "Title is required");
        }
        if self.lead_id.trim().is_empty() {
            errors.add("lead_id", "Lead is required");
        }
        let Some(due_date) = self.due_date else {
            errors.add("due_date", "Date is required");
            return Err(errors);
        };
        errors.into_result()?;

        Ok(ValidActivity {
            title: self.title.trim().to_string(),
            description: normalize_optional(self.description),
            lead_id: self.lead_id.trim().to_string(),
            activity_type: self.activity_type,
            due_date,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration(name: &str, email: &str, password: &str, confirm: &str) -> RegistrationForm {
        RegistrationForm {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            confirm_password: confirm.to_string(),
        }
    }

    #[test]
    fn test_email_shapes() {
        assert!(is_valid_email("ana@example.com"));
        assert!(is_valid_email("a.b+c@sub.example.co"));
        assert!(!is_valid_email("ana@example"));
        assert!(!is_valid_email("ana.example.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn test_registration_valid() {
        let form = registration("Ana", "ana@example.com", "secret1", "secret1");
        assert!(form.validate(DEFAULT_MIN_PASSWORD_LENGTH).is_ok());
    }

    #[test]
    fn test_registration_reports_every_field() {
        let form = registration(" ", "", "", "");
        let errors = form.validate(DEFAULT_MIN_PASSWORD_LENGTH).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert_eq!(errors.get("name"), Some("Name is required"));
        assert_eq!(errors.get("email"), Some("Email is required"));
        assert_eq!(errors.get("password"), Some("Password is required"));
        assert_eq!(
            errors.get("confirm_password"),
            Some("Please confirm your password")
        );
    }

    #[test]
    fn test_registration_malformed_email() {
        let form = registration("Ana", "ana-at-example", "secret1", "secret1");
        let errors = form.validate(DEFAULT_MIN_PASSWORD_LENGTH).unwrap_err();
        assert_eq!(errors.get("email"), Some("Email is invalid"));
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_registration_short_password() {
        let form = registration("Ana", "ana@example.com", "abc", "abc");
        let errors = form.validate(DEFAULT_MIN_PASSWORD_LENGTH).unwrap_err();
        assert_eq!(
            errors.get("password"),
            Some("Password must be at least 6 characters")
        );
        assert!(!errors.has("confirm_password"));
    }

    #[test]
    fn test_registration_mismatched_confirmation() {
        let form = registration("Ana", "ana@example.com", "secret1", "secret2");
        let errors = form.validate(DEFAULT_MIN_PASSWORD_LENGTH).unwrap_err();
        assert_eq!(errors.get("confirm_password"), Some("Passwords do not match"));
    }

    #[test]
    fn test_registration_respects_configured_length() {
        let form = registration("Ana", "ana@example.com", "secret1", "secret1");
        assert!(form.validate(10).is_err());
    }

    #[test]
    fn test_lead_form_requires_name() {
        let form = LeadForm {
            name: "   ".to_string(),
            stage_id: "stg-1".to_string(),
            ..LeadForm::default()
        };
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.get("name"), Some("Lead name is required"));
    }

    #[test]
    fn test_lead_form_normalizes_optionals() {
        let form = LeadForm {
            name: "  Ana Souza ".to_string(),
            email: Some(String::new()),
            phone: Some("  ".to_string()),
            stage_id: "stg-1".to_string(),
            interest_id: Some(" int-1 ".to_string()),
            assigned_to: None,
        };
        let lead = form.validate().unwrap();
        assert_eq!(lead.name, "Ana Souza");
        assert_eq!(lead.email, None);
        assert_eq!(lead.phone, None);
        assert_eq!(lead.interest_id.as_deref(), Some("int-1"));
    }

    #[test]
    fn test_lead_form_rejects_bad_email() {
        let form = LeadForm {
            name: "Ana".to_string(),
            email: Some("nope".to_string()),
            stage_id: "stg-1".to_string(),
            ..LeadForm::default()
        };
        let errors = form.validate().unwrap_err();
        assert!(errors.has("email"));
    }

    #[test]
    fn test_activity_form_missing_everything() {
        let errors = ActivityForm::default().validate().unwrap_err();
        assert!(errors.has("title"));
        assert!(errors.has("lead_id"));
        assert!(errors.has("due_date"));
    }

    #[test]
    fn test_activity_form_valid() {
        let due = Utc::now();
        let activity = ActivityForm {
            title: " Call ".to_string(),
            description: Some(String::new()),
            lead_id: "led-1".to_string(),
            activity_type: ActivityType::Call,
            due_date: Some(due),
        }
        .validate()
        .unwrap();
        assert_eq!(activity.title, "Call");
        assert_eq!(activity.description, None);
        assert_eq!(activity.due_date, due);
    }

    #[test]
    fn test_stage_color() {
        assert_eq!(stage_color(None).unwrap(), None);
        assert_eq!(stage_color(Some(" ".into())).unwrap(), None);
        assert_eq!(
            stage_color(Some("#0EA5E9".into())).unwrap().as_deref(),
            Some("#0ea5e9")
        );
        assert_eq!(stage_color(Some("#fff".into())).unwrap().as_deref(), Some("#fff"));
        assert!(stage_color(Some("blue".into())).unwrap_err().has("color"));
        assert!(stage_color(Some("#12345".into())).is_err());
    }

    #[test]
    fn test_require() {
        assert_eq!(require("name", "  New  ", "x").unwrap(), "New");
        let errors = require("name", "\t", "Stage name is required").unwrap_err();
        assert_eq!(errors.get("name"), Some("Stage name is required"));
    }

    #[test]
    fn test_profile_form() {
        let profile = ProfileForm {
            name: "Ana".into(),
            email: "ana@example.com".into(),
            avatar: Some(" ".into()),
        }
        .validate()
        .unwrap();
        assert_eq!(profile.avatar, None);

        let errors = ProfileForm::default().validate().unwrap_err();
        assert!(errors.has("name"));
        assert!(errors.has("email"));
    }

    #[test]
    fn test_workspace_form() {
        let errors = WorkspaceForm {
            company_name: "Acme".into(),
            owner_name: "Ana".into(),
            owner_email: "bad".into(),
        }
        .validate()
        .unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.get("owner_email"), Some("Email is invalid"));
    }

    #[test]
    fn test_errors_display_lists_fields_in_order() {
        let mut errors = ValidationErrors::default();
        errors.add("title", "Title is required");
        errors.add("due_date", "Date is required");
        errors.add("title", "ignored");
        assert_eq!(
            errors.to_string(),
            "due_date: Date is required; title: Title is required"
        );
    }
}
