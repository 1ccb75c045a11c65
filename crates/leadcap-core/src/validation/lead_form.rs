//! Local lead form validation
//!
//! Runs on the client before anything touches the network. Messages are German because
//! they are shown to field staff as-is.

use std::collections::BTreeMap;

use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::constants::{MAX_NAME_LENGTH, MAX_PHONE_LENGTH};
use crate::models::{is_german_postal_code, CreateLeadRequest, Salutation};

const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";
const GERMAN_PHONE_PATTERN: &str = r"^(\+49|0)[0-9\s\-()]{6,}$";

/// Field name to user-facing message, only for fields that failed.
pub type FieldErrors = BTreeMap<&'static str, &'static str>;

/// Raw lead form as entered by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadForm {
    pub salutation: Option<Salutation>,
    pub first_name: String,
    pub last_name: String,
    pub postal_code: String,
    pub email: String,
    pub phone: String,
    pub privacy_accepted: bool,
    pub newsletter_single_opt_in: bool,
}

fn matches(pattern: &str, value: &str) -> bool {
    Regex::new(pattern)
        .map(|re| re.is_match(value))
        .unwrap_or(false)
}

fn too_long(value: &str, max: usize) -> bool {
    value.chars().count() > max
}

/// Message for a field the server-side request validator refused.
fn server_rule_message(field: &str) -> Option<(&'static str, &'static str)> {
    match field {
        "first_name" => Some(("firstName", "Vorname darf höchstens 100 Zeichen lang sein.")),
        "last_name" => Some(("lastName", "Nachname darf höchstens 100 Zeichen lang sein.")),
        "postal_code" => Some(("postalCode", "Bitte eine gültige PLZ (5 Ziffern) eingeben.")),
        "email" => Some(("email", "Bitte gültige E-Mail eingeben.")),
        "phone" => Some(("phone", "Telefonnummer darf höchstens 50 Zeichen lang sein.")),
        _ => None,
    }
}

impl LeadForm {
    /// Per-field errors; empty when the form may be submitted.
    pub fn errors(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();

        if self.salutation.is_none() {
            errors.insert("salutation", "Bitte wählen Sie eine Anrede.");
        }
        let first_name = self.first_name.trim();
        if first_name.is_empty() {
            errors.insert("firstName", "Vorname ist erforderlich.");
        } else if too_long(first_name, MAX_NAME_LENGTH) {
            errors.insert("firstName", "Vorname darf höchstens 100 Zeichen lang sein.");
        }
        let last_name = self.last_name.trim();
        if last_name.is_empty() {
            errors.insert("lastName", "Nachname ist erforderlich.");
        } else if too_long(last_name, MAX_NAME_LENGTH) {
            errors.insert("lastName", "Nachname darf höchstens 100 Zeichen lang sein.");
        }

        let postal_code = self.postal_code.trim();
        if postal_code.is_empty() {
            errors.insert("postalCode", "Postleitzahl ist erforderlich.");
        } else if !is_german_postal_code(postal_code) {
            errors.insert("postalCode", "Bitte eine gültige PLZ (5 Ziffern) eingeben.");
        }

        let email = self.email.trim();
        if email.is_empty() {
            errors.insert("email", "E-Mail ist erforderlich.");
        } else if !matches(EMAIL_PATTERN, email) {
            errors.insert("email", "Bitte gültige E-Mail eingeben.");
        }

        let phone = self.phone.trim();
        if phone.is_empty() {
            errors.insert("phone", "Telefonnummer ist erforderlich.");
        } else if too_long(phone, MAX_PHONE_LENGTH) {
            errors.insert("phone", "Telefonnummer darf höchstens 50 Zeichen lang sein.");
        } else if !matches(GERMAN_PHONE_PATTERN, phone) {
            errors.insert("phone", "Bitte gültige deutsche Telefonnummer eingeben.");
        }

        if !self.privacy_accepted {
            errors.insert("privacyAccepted", "Bitte Datenschutzerklärung akzeptieren.");
        }

        errors
    }

    /// All required fields filled and consent given (the submit button state).
    pub fn is_submit_enabled(&self) -> bool {
        self.salutation.is_some()
            && !self.first_name.trim().is_empty()
            && !self.last_name.trim().is_empty()
            && !self.postal_code.trim().is_empty()
            && !self.email.trim().is_empty()
            && !self.phone.trim().is_empty()
            && self.privacy_accepted
    }

    /// Validate and build the trimmed request body.
    ///
    /// The body is also checked against the rules `POST /leads` enforces, so a draft saved
    /// offline is never one the server will refuse on every sync.
    pub fn to_payload(&self) -> Result<CreateLeadRequest, FieldErrors> {
        let errors = self.errors();
        let salutation = match self.salutation {
            Some(salutation) if errors.is_empty() => salutation,
            _ => return Err(errors),
        };

        let payload = CreateLeadRequest {
            salutation,
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            postal_code: self.postal_code.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: self.phone.trim().to_string(),
            newsletter_single_opt_in: Some(self.newsletter_single_opt_in),
        };

        if let Err(rejected) = payload.validate() {
            let errors: FieldErrors = rejected
                .field_errors()
                .keys()
                .filter_map(|field| server_rule_message(field))
                .collect();
            if !errors.is_empty() {
                return Err(errors);
            }
        }

        Ok(payload)
    }
}
