use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const RECEIVER_MAX_CHARS: usize = 12;
pub const MOBILE_LEN: usize = 11;

static MOBILE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^1[3-9]\d{9}$").expect("mobile regex is valid"));

/// First rule an address payload breaks.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("receiver must not be empty")]
    ReceiverMissing,
    #[error("receiver name is too long")]
    ReceiverTooLong,
    #[error("receiver mobile must not be empty")]
    MobileMissing,
    #[error("receiver mobile has an incorrect length")]
    MobileLength,
    #[error("receiver mobile format is invalid")]
    MobileFormat,
    #[error("shipping address fields must not be empty")]
    LocationMissing,
}

/// User-supplied address fields, shared by add and update.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AddressFields {
    pub receiver: String,
    pub mobile: String,
    pub province: String,
    pub city: String,
    pub district: String,
    pub detail: String,
}

impl AddressFields {
    /// Rules are checked in a fixed order; the first failure is returned.
    pub fn validate(&self) -> Result<(), AddressError> {
        if self.receiver.trim().is_empty() {
            return Err(AddressError::ReceiverMissing);
        }
        if self.receiver.chars().count() > RECEIVER_MAX_CHARS {
            return Err(AddressError::ReceiverTooLong);
        }

        if self.mobile.trim().is_empty() {
            return Err(AddressError::MobileMissing);
        }
        if self.mobile.chars().count() != MOBILE_LEN {
            return Err(AddressError::MobileLength);
        }
        if !MOBILE_RE.is_match(&self.mobile) {
            return Err(AddressError::MobileFormat);
        }

        let location = [&self.province, &self.city, &self.district, &self.detail];
        if location.iter().any(|f| f.trim().is_empty()) {
            return Err(AddressError::LocationMissing);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Address {
    pub id: String,
    pub user_id: String,
    pub receiver: String,
    pub mobile: String,
    pub province: String,
    pub city: String,
    pub district: String,
    pub detail: String,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Address {
    /// Builds a validated, not-yet-default address for `user_id`.
    pub fn new(user_id: String, fields: AddressFields) -> Result<Self, AddressError> {
        fields.validate()?;
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            user_id,
            receiver: fields.receiver,
            mobile: fields.mobile,
            province: fields.province,
            city: fields.city,
            district: fields.district,
            detail: fields.detail,
            is_default: false,
            created_at: now,
            updated_at: now,
        })
    }

    /// Replaces the editable fields. The default flag is left alone.
    pub fn apply(&mut self, fields: AddressFields) -> Result<(), AddressError> {
        fields.validate()?;
        self.receiver = fields.receiver;
        self.mobile = fields.mobile;
        self.province = fields.province;
        self.city = fields.city;
        self.district = fields.district;
        self.detail = fields.detail;
        self.updated_at = Utc::now();
        Ok(())
    }
}
