//! # Contracting-Party Sum Type
//!
//! The party granting a sales mandate comes in four shapes: a single
//! individual, a married individual (the spouse appears on the contract),
//! multiple co-owners, or a company acting through a legal representative.
//!
//! All four are variants of one closed enum. Each variant carries exactly
//! the fields its shape requires, and [`ContractingParty::validate`] checks
//! them exhaustively — a mandate never reaches artifact generation or the
//! signing provider with a structurally incomplete party.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Identifying details of a natural person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonDetails {
    /// Full legal name.
    pub full_name: String,
    /// Contact e-mail, used as the signing channel.
    pub email: String,
    /// Government identification number.
    pub tax_id: String,
    /// Contact phone, if provided.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Nationality, as stated on the contract.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nationality: Option<String>,
    /// Occupation, as stated on the contract.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occupation: Option<String>,
}

/// Spouse details for a married contracting individual.
///
/// The spouse is named on the contract but is not a signature-list party.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpouseDetails {
    /// Spouse's full legal name.
    pub full_name: String,
    /// Spouse's government identification number.
    pub tax_id: String,
}

/// The party granting the sales mandate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContractingParty {
    /// A single unmarried individual.
    Individual {
        /// The individual.
        person: PersonDetails,
    },
    /// A married individual; the spouse is named on the contract.
    MarriedIndividual {
        /// The individual who signs.
        person: PersonDetails,
        /// The spouse named on the contract.
        spouse: SpouseDetails,
    },
    /// Multiple co-owners of the property; the first listed owner signs on
    /// behalf of all.
    CoOwners {
        /// The co-owners, signing representative first.
        owners: Vec<PersonDetails>,
    },
    /// A company acting through its legal representative.
    Company {
        /// Registered company name.
        legal_name: String,
        /// Company tax identification number.
        tax_id: String,
        /// The representative who signs for the company.
        representative: PersonDetails,
    },
}

impl ContractingParty {
    /// The variant name, matching the serialized `kind` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Individual { .. } => "individual",
            Self::MarriedIndividual { .. } => "married_individual",
            Self::CoOwners { .. } => "co_owners",
            Self::Company { .. } => "company",
        }
    }

    /// Validate that every field this variant requires is present.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] encountered, in field order.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let kind = self.kind();
        match self {
            Self::Individual { person } => validate_person(kind, person),
            Self::MarriedIndividual { person, spouse } => {
                validate_person(kind, person)?;
                require(kind, "spouse.full_name", &spouse.full_name)?;
                require(kind, "spouse.tax_id", &spouse.tax_id)
            }
            Self::CoOwners { owners } => {
                if owners.is_empty() {
                    return Err(ValidationError::NoCoOwners);
                }
                for owner in owners {
                    validate_person(kind, owner)?;
                }
                Ok(())
            }
            Self::Company {
                legal_name,
                tax_id,
                representative,
            } => {
                require(kind, "legal_name", legal_name)?;
                require(kind, "tax_id", tax_id)?;
                require(kind, "representative.full_name", &representative.full_name)?;
                require(kind, "representative.email", &representative.email)?;
                require(kind, "representative.tax_id", &representative.tax_id)
            }
        }
    }

    /// The person who signs the mandate on the party's behalf.
    ///
    /// Individuals sign for themselves, the first-listed co-owner signs for
    /// a co-owned property, and the legal representative signs for a
    /// company. Call [`ContractingParty::validate`] first; this returns the
    /// same missing-field errors for incomplete variants.
    pub fn representative(&self) -> Result<&PersonDetails, ValidationError> {
        self.validate()?;
        match self {
            Self::Individual { person } | Self::MarriedIndividual { person, .. } => Ok(person),
            // Non-empty after validate().
            Self::CoOwners { owners } => owners.first().ok_or(ValidationError::NoCoOwners),
            Self::Company { representative, .. } => Ok(representative),
        }
    }
}

impl std::fmt::Display for ContractingParty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.kind())
    }
}

fn validate_person(kind: &'static str, person: &PersonDetails) -> Result<(), ValidationError> {
    require(kind, "full_name", &person.full_name)?;
    require(kind, "email", &person.email)?;
    require(kind, "tax_id", &person.tax_id)
}

fn require(
    kind: &'static str,
    field: &'static str,
    value: &str,
) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::MissingPartyField { kind, field })
    } else {
        Ok(())
    }
}
