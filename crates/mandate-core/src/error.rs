//! Validation errors for domain inputs.
//!
//! Raised before any external call is made; never retried automatically.

use thiserror::Error;

/// A domain input failed validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field for the given contracting-party variant is missing
    /// or empty.
    #[error("contracting party ({kind}) is missing required field: {field}")]
    MissingPartyField {
        /// The party variant name (e.g. "company").
        kind: &'static str,
        /// The missing field.
        field: &'static str,
    },

    /// A co-owned party was declared with an empty owner list.
    #[error("co-owned contracting party requires at least one owner")]
    NoCoOwners,

    /// A required property field is missing or empty.
    #[error("property is missing required field: {field}")]
    MissingPropertyField {
        /// The missing field.
        field: &'static str,
    },

    /// The commission percentage is outside the accepted range.
    #[error("commission percentage {given} is out of range (expected 0 < c <= 100)")]
    CommissionOutOfRange {
        /// The rejected value, rendered as a string.
        given: String,
    },
}
