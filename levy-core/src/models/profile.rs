use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const TIN_LENGTH: std::ops::RangeInclusive<usize> = 6..=40;
const LOCATION_LENGTH: std::ops::RangeInclusive<usize> = 2..=120;
const PHONE_LENGTH: std::ops::RangeInclusive<usize> = 7..=30;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProfileError {
    #[error("TIN must be 6 to 40 characters, got {0}")]
    TinLength(usize),

    #[error("TIN format invalid: '{0}' is not a letter, digit or '-'")]
    TinCharacter(char),

    #[error("location must be 2 to 120 characters, got {0}")]
    LocationLength(usize),

    #[error("phone must be 7 to 30 characters, got {0}")]
    PhoneLength(usize),
}

/// Trims `raw` and checks it is a plausible taxpayer identification number.
///
/// ```
/// use levy_core::validate_tin;
///
/// assert_eq!(validate_tin(" 1234-56789 "), Ok("1234-56789".to_string()));
/// assert!(validate_tin("12345").is_err());
/// assert!(validate_tin("1234 5678").is_err());
/// ```
pub fn validate_tin(raw: &str) -> Result<String, ProfileError> {
    let tin = raw.trim();
    let len = tin.chars().count();
    if !TIN_LENGTH.contains(&len) {
        return Err(ProfileError::TinLength(len));
    }
    if let Some(bad) = tin.chars().find(|c| !(c.is_ascii_alphanumeric() || *c == '-')) {
        return Err(ProfileError::TinCharacter(bad));
    }
    Ok(tin.to_string())
}

/// A registered citizen, found by officers through their TIN.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitizenProfile {
    /// The user id calculations and requests are filed under.
    pub id: String,
    pub tin_number: String,
    pub email: Option<String>,
    pub location: String,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// For registering or updating a citizen by id (no timestamps)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCitizenProfile {
    pub id: String,
    pub tin_number: String,
    pub email: Option<String>,
    pub location: String,
    pub phone: Option<String>,
}

impl NewCitizenProfile {
    /// Trims every field and checks the TIN, location and phone.
    pub fn validated(self) -> Result<Self, ProfileError> {
        let location = self.location.trim().to_string();
        let location_len = location.chars().count();
        if !LOCATION_LENGTH.contains(&location_len) {
            return Err(ProfileError::LocationLength(location_len));
        }

        let phone = self
            .phone
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty());
        if let Some(phone) = &phone {
            let phone_len = phone.chars().count();
            if !PHONE_LENGTH.contains(&phone_len) {
                return Err(ProfileError::PhoneLength(phone_len));
            }
        }

        Ok(Self {
            id: self.id.trim().to_string(),
            tin_number: validate_tin(&self.tin_number)?,
            email: self
                .email
                .map(|e| e.trim().to_string())
                .filter(|e| !e.is_empty()),
            location,
            phone,
        })
    }
}
