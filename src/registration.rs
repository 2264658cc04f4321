//! Intern and visitor registration forms.
//!
//! Forms are trimmed with [`normalized`](InternRegistration::normalized)
//! and checked with `validate` before they are posted. Validation reports
//! every failing field at once.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\S+@\S+\.\S+").expect("email pattern is valid"));
static AADHAAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{12}$").expect("aadhaar pattern is valid"));
static PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{10,15}$").expect("phone pattern is valid"));

/// Field errors keyed by wire field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors(BTreeMap<&'static str, &'static str>);

impl ValidationErrors {
    /// Whether no field failed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of failing fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Message for `field`, if it failed.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&'static str> {
        self.0.get(field).copied()
    }

    /// Failing fields and messages, ordered by field name.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &'static str)> + '_ {
        self.0.iter().map(|(field, message)| (*field, *message))
    }

    fn add(&mut self, field: &'static str, message: &'static str) {
        self.0.insert(field, message);
    }

    fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self.0.values().copied().collect();
        write!(f, "invalid form: {}", messages.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

/// New intern registration, posted to `/interns/register`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InternRegistration {
    pub intern_id: String,
    pub name: String,
    pub email: String,
    pub aadhaar_number: String,
    pub mobile_number: String,
}

impl InternRegistration {
    /// Copy with every field trimmed.
    #[must_use]
    pub fn normalized(&self) -> Self {
        Self {
            intern_id: self.intern_id.trim().to_string(),
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            aadhaar_number: self.aadhaar_number.trim().to_string(),
            mobile_number: self.mobile_number.trim().to_string(),
        }
    }

    /// Check every field.
    ///
    /// # Errors
    ///
    /// Returns all failing fields with the message to show for each.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        required(&mut errors, "internId", &self.intern_id, "Intern ID is required");
        required(&mut errors, "name", &self.name, "Name is required");
        check_email(&mut errors, &self.email);
        check_aadhaar(&mut errors, "aadhaarNumber", &self.aadhaar_number);
        check_phone(
            &mut errors,
            "mobileNumber",
            &self.mobile_number,
            "Mobile number is required",
            "Mobile number must be 10-15 digits",
        );
        errors.into_result()
    }
}

/// Visitor registration, posted to `/new-comers`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitorRegistration {
    pub name: String,
    pub visitor_id: String,
    pub email: String,
    pub phone: String,
    pub aadhaar: String,
    pub purpose: String,
}

impl VisitorRegistration {
    /// Copy with every field trimmed.
    #[must_use]
    pub fn normalized(&self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            visitor_id: self.visitor_id.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: self.phone.trim().to_string(),
            aadhaar: self.aadhaar.trim().to_string(),
            purpose: self.purpose.trim().to_string(),
        }
    }

    /// Check every field.
    ///
    /// # Errors
    ///
    /// Returns all failing fields with the message to show for each.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        required(&mut errors, "name", &self.name, "Name is required");
        required(&mut errors, "visitorId", &self.visitor_id, "Visitor ID is required");
        check_email(&mut errors, &self.email);
        check_phone(
            &mut errors,
            "phone",
            &self.phone,
            "Phone number is required",
            "Phone number must be 10-15 digits",
        );
        check_aadhaar(&mut errors, "aadhaar", &self.aadhaar);
        required(&mut errors, "purpose", &self.purpose, "Purpose is required");
        errors.into_result()
    }
}

fn required(
    errors: &mut ValidationErrors,
    field: &'static str,
    value: &str,
    message: &'static str,
) -> bool {
    if value.trim().is_empty() {
        errors.add(field, message);
        false
    } else {
        true
    }
}

fn check_email(errors: &mut ValidationErrors, value: &str) {
    if required(errors, "email", value, "Email is required") && !EMAIL.is_match(value) {
        errors.add("email", "Email is invalid");
    }
}

fn check_aadhaar(errors: &mut ValidationErrors, field: &'static str, value: &str) {
    if required(errors, field, value, "Aadhaar number is required") && !AADHAAR.is_match(value)
    {
        errors.add(field, "Aadhaar number must be 12 digits");
    }
}

fn check_phone(
    errors: &mut ValidationErrors,
    field: &'static str,
    value: &str,
    missing: &'static str,
    malformed: &'static str,
) {
    if required(errors, field, value, missing) && !PHONE.is_match(value) {
        errors.add(field, malformed);
    }
}
