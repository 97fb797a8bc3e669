//! Property snapshot embedded in a mandate.
//!
//! The property record itself lives in the CRM; a mandate captures the
//! fields the contract names at the moment the mandate is created.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Snapshot of the property a mandate is granted against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    /// CRM-side property record id.
    pub id: i64,
    /// Real-estate registry number of the property.
    pub registry_number: String,
    /// Street address.
    pub address: String,
    /// City.
    pub city: String,
    /// State or region.
    pub state: String,
    /// Postal code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    /// Free-form description included in the contract, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Property {
    /// Validate that the fields the contract names are present.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (field, value) in [
            ("registry_number", &self.registry_number),
            ("address", &self.address),
            ("city", &self.city),
            ("state", &self.state),
        ] {
            if value.trim().is_empty() {
                return Err(ValidationError::MissingPropertyField { field });
            }
        }
        Ok(())
    }
}
