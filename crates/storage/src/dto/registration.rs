use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::{Registration, ReviewStatus};

/// Request payload for submitting a registration. Status and submission date
/// are server-assigned; anything the client sends for them is ignored.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateRegistrationRequest {
    #[validate(length(
        min = 1,
        max = 255,
        message = "Name must be between 1 and 255 characters"
    ))]
    pub name: String,

    #[validate(length(max = 255))]
    pub unit: Option<String>,

    #[validate(length(
        min = 6,
        max = 20,
        message = "Phone number must be between 6 and 20 characters"
    ))]
    #[validate(custom(function = "validate_phone"))]
    pub phone: String,

    #[validate(length(
        min = 1,
        max = 100,
        message = "Category must be between 1 and 100 characters"
    ))]
    pub category: String,
}

/// Request payload for an admin review decision. Status and note travel
/// together; there is no partial update.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateStatusRequest {
    #[validate(custom(function = "validate_status"))]
    pub status: String,

    #[validate(length(max = 1000))]
    pub note: Option<String>,
}

/// Response containing registration details
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegistrationResponse {
    pub id: Uuid,
    pub name: String,
    pub unit: Option<String>,
    pub phone: String,
    pub category: String,
    pub submitted_on: NaiveDate,
    pub status: ReviewStatus,
    pub note: Option<String>,
}

impl From<Registration> for RegistrationResponse {
    fn from(registration: Registration) -> Self {
        Self {
            id: registration.id,
            name: registration.name,
            unit: registration.unit,
            phone: registration.phone,
            category: registration.category,
            submitted_on: registration.submitted_on,
            status: registration.status,
            note: registration.note,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategoryCount {
    pub category: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StatusBreakdown {
    pub pending: usize,
    pub approved: usize,
    pub rejected: usize,
}

/// Aggregates for the admin dashboard, computed over the full record scan.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StatsResponse {
    pub total: usize,
    pub by_category: Vec<CategoryCount>,
    pub by_status: StatusBreakdown,
}

fn validate_status(status: &str) -> Result<(), ValidationError> {
    if status.parse::<ReviewStatus>().is_err() {
        let mut error = ValidationError::new("invalid_status");
        error.message = Some("Status must be one of: pending, approved, rejected".into());
        return Err(error);
    }
    Ok(())
}

fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    let digits = phone.strip_prefix('+').unwrap_or(phone);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        let mut error = ValidationError::new("invalid_phone");
        error.message = Some("Phone number may only contain digits and a leading +".into());
        return Err(error);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_request() -> CreateRegistrationRequest {
        CreateRegistrationRequest {
            name: "Tim A".to_string(),
            unit: Some("Unit X".to_string()),
            phone: "081111111111".to_string(),
            category: "Gobak Sodor".to_string(),
        }
    }

    #[test]
    fn accepts_a_valid_create_request() {
        assert!(create_request().validate().is_ok());
    }

    #[test]
    fn rejects_empty_name_and_bad_phone() {
        let mut request = create_request();
        request.name = String::new();
        assert!(request.validate().is_err());

        let mut request = create_request();
        request.phone = "not-a-number".to_string();
        assert!(request.validate().is_err());
    }

    #[test]
    fn rejects_status_outside_the_enumerated_set() {
        let request = UpdateStatusRequest {
            status: "archived".to_string(),
            note: None,
        };
        assert!(request.validate().is_err());

        let request = UpdateStatusRequest {
            status: "approved".to_string(),
            note: Some("good submission".to_string()),
        };
        assert!(request.validate().is_ok());
    }
}
