use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::PictureMeta;

/// Form of address chosen by the lead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Salutation {
    Male,
    Female,
    Divers,
}

impl Salutation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Salutation::Male => "MALE",
            Salutation::Female => "FEMALE",
            Salutation::Divers => "DIVERS",
        }
    }
}

impl fmt::Display for Salutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Salutation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "MALE" => Ok(Salutation::Male),
            "FEMALE" => Ok(Salutation::Female),
            "DIVERS" => Ok(Salutation::Divers),
            other => Err(format!("Unknown salutation: {}", other)),
        }
    }
}

/// German postal codes are exactly five digits.
pub fn is_german_postal_code(value: &str) -> bool {
    value.len() == 5 && value.bytes().all(|b| b.is_ascii_digit())
}

fn validate_postal_code(value: &str) -> Result<(), ValidationError> {
    if is_german_postal_code(value) {
        Ok(())
    } else {
        let mut err = ValidationError::new("postal_code");
        err.message = Some("Postal code must be a 5-digit German postal code".into());
        Err(err)
    }
}

/// Request body of `POST /leads`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateLeadRequest {
    pub salutation: Salutation,
    #[validate(length(min = 1, max = 100, message = "First name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100, message = "Last name is required"))]
    pub last_name: String,
    #[validate(custom(function = "validate_postal_code"))]
    pub postal_code: String,
    #[validate(email(message = "Email must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, max = 50, message = "Phone is required"))]
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub newsletter_single_opt_in: Option<bool>,
}

/// Response of `POST /leads`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateLeadResponse {
    pub success: bool,
    pub message: String,
    pub lead_id: Uuid,
    /// Picture-scoped bearer token for this lead only
    pub picture_token: String,
}

/// Lead record as stored by the lead repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: Uuid,
    pub salutation: Salutation,
    pub first_name: String,
    pub last_name: String,
    pub postal_code: String,
    pub email: String,
    pub phone: String,
    pub newsletter_single_opt_in: bool,
    pub pictures: Vec<PictureMeta>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields needed to insert a new lead. Input strings are trimmed.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLead {
    pub salutation: Salutation,
    pub first_name: String,
    pub last_name: String,
    pub postal_code: String,
    pub email: String,
    pub phone: String,
    pub newsletter_single_opt_in: bool,
}

impl From<CreateLeadRequest> for NewLead {
    fn from(req: CreateLeadRequest) -> Self {
        NewLead {
            salutation: req.salutation,
            first_name: req.first_name.trim().to_string(),
            last_name: req.last_name.trim().to_string(),
            postal_code: req.postal_code.trim().to_string(),
            email: req.email.trim().to_string(),
            phone: req.phone.trim().to_string(),
            newsletter_single_opt_in: req.newsletter_single_opt_in.unwrap_or(false),
        }
    }
}
