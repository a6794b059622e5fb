use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivityType {
    #[serde(rename = "TIN_SEARCH")]
    TinSearch,
    #[serde(rename = "OFFICER_CALC_CREATE")]
    OfficerCalcCreate,
    #[serde(rename = "REQUEST_APPROVED")]
    RequestApproved,
    #[serde(rename = "REQUEST_REJECTED")]
    RequestRejected,
}

impl ActivityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TinSearch => "TIN_SEARCH",
            Self::OfficerCalcCreate => "OFFICER_CALC_CREATE",
            Self::RequestApproved => "REQUEST_APPROVED",
            Self::RequestRejected => "REQUEST_REJECTED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "TIN_SEARCH" => Some(Self::TinSearch),
            "OFFICER_CALC_CREATE" => Some(Self::OfficerCalcCreate),
            "REQUEST_APPROVED" => Some(Self::RequestApproved),
            "REQUEST_REJECTED" => Some(Self::RequestRejected),
            _ => None,
        }
    }
}

/// One row of the officer audit log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfficerActivity {
    pub id: i64,
    pub officer_id: String,
    pub activity_type: ActivityType,
    pub target_user_id: Option<String>,
    pub description: String,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOfficerActivity {
    pub officer_id: String,
    pub activity_type: ActivityType,
    pub target_user_id: Option<String>,
    pub description: String,
    pub metadata: serde_json::Value,
}
