use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerilDetail {
    pub peril_type: String,
    #[serde(default)]
    pub cause: Option<String>,
    #[serde(default)]
    pub water_category: Option<u8>,
    #[serde(default)]
    pub water_class: Option<u8>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlPointStatus {
    #[default]
    Pending,
    Complete,
    NotApplicable,
}

impl ControlPointStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Complete => "Complete",
            Self::NotApplicable => "N/A",
        }
    }
}

/// Carrier milestone tracked on the claim (contact, inspection, estimate upload).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlPoint {
    pub name: String,
    #[serde(default)]
    pub status: ControlPointStatus,
    #[serde(default)]
    pub completed_on: Option<NaiveDate>,
}

/// Claim identity carried in the interchange header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimInfo {
    pub claim_number: String,
    pub policy_number: String,
    pub insured_name: String,
    #[serde(default)]
    pub carrier_code: Option<String>,
    #[serde(default)]
    pub date_of_loss: Option<NaiveDate>,
    #[serde(default)]
    pub property_address: Option<Address>,
    pub peril: PerilDetail,
    #[serde(default)]
    pub control_points: Vec<ControlPoint>,
    #[serde(default)]
    pub estimator: Option<String>,
    #[serde(default)]
    pub price_list: Option<String>,
}
