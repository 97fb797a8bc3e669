//! # Contract Rendering
//!
//! Renders a mandate into its sales-authorization contract document.
//!
//! The renderer is a pure function of the mandate's structured data: the
//! contracting-party variant, the property snapshot, the commercial terms,
//! and the creation date. It reads no clock and draws no randomness, so the
//! same mandate always renders to the same bytes.

use chrono::{DateTime, Utc};
use thiserror::Error;

use mandate_core::{ContractingParty, PersonDetails, Property, Terms, ValidationError};
use mandate_state::Mandate;

/// Contract generation failed before any bytes were produced.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    /// The mandate's data is missing fields its party variant requires.
    #[error("cannot generate contract: {0}")]
    Invalid(#[from] ValidationError),
}

/// Logical filename of the contract document for a mandate.
pub fn contract_filename(mandate_id: i64) -> String {
    format!("sales-mandate-{mandate_id}.txt")
}

/// Validated view of the data the contract names.
///
/// Constructing a `ContractData` performs the exhaustive per-variant
/// validation; [`ContractData::render`] cannot fail afterwards.
#[derive(Debug, Clone)]
pub struct ContractData<'a> {
    party: &'a ContractingParty,
    property: &'a Property,
    terms: &'a Terms,
    mandate_id: i64,
    issued_at: DateTime<Utc>,
}

impl<'a> ContractData<'a> {
    /// Validate a mandate's data for contract generation.
    pub fn from_mandate(mandate: &'a Mandate) -> Result<Self, GenerationError> {
        mandate.party.validate()?;
        mandate.property.validate()?;
        mandate.terms.validate()?;
        Ok(Self {
            party: &mandate.party,
            property: &mandate.property,
            terms: &mandate.terms,
            mandate_id: mandate.id,
            issued_at: mandate.created_at,
        })
    }

    /// Render the contract document bytes.
    ///
    /// Deterministic: the issue date comes from the mandate's creation
    /// timestamp, never from the wall clock.
    pub fn render(&self) -> Vec<u8> {
        let mut out = String::with_capacity(1024);

        out.push_str("SALES AUTHORIZATION MANDATE\n");
        out.push_str("===========================\n\n");
        out.push_str(&format!("Mandate no. {}\n\n", self.mandate_id));

        out.push_str("GRANTOR\n");
        self.render_party(&mut out);

        out.push_str("\nPROPERTY\n");
        self.render_property(&mut out);

        out.push_str("\nTERMS\n");
        self.render_terms(&mut out);

        out.push_str(&format!(
            "\nThe grantor authorizes the brokerage to offer the property \
             identified above for sale under the terms stated herein.\n\
             \nIssued on {}.\n",
            self.issued_at.format("%Y-%m-%d"),
        ));

        out.into_bytes()
    }

    fn render_party(&self, out: &mut String) {
        match self.party {
            ContractingParty::Individual { person } => {
                render_person(out, "  Seller", person);
            }
            ContractingParty::MarriedIndividual { person, spouse } => {
                render_person(out, "  Seller", person);
                out.push_str(&format!(
                    "  Spouse: {} (tax id {})\n",
                    spouse.full_name, spouse.tax_id
                ));
            }
            ContractingParty::CoOwners { owners } => {
                for (idx, owner) in owners.iter().enumerate() {
                    render_person(out, &format!("  Co-owner {}", idx + 1), owner);
                }
            }
            ContractingParty::Company {
                legal_name,
                tax_id,
                representative,
            } => {
                out.push_str(&format!("  Company: {legal_name} (tax id {tax_id})\n"));
                render_person(out, "  Represented by", representative);
            }
        }
    }

    fn render_property(&self, out: &mut String) {
        out.push_str(&format!(
            "  Registry no. {}\n  {} — {}/{}\n",
            self.property.registry_number,
            self.property.address,
            self.property.city,
            self.property.state,
        ));
        if let Some(postal_code) = &self.property.postal_code {
            out.push_str(&format!("  Postal code: {postal_code}\n"));
        }
        if let Some(description) = &self.property.description {
            out.push_str(&format!("  {description}\n"));
        }
    }

    fn render_terms(&self, out: &mut String) {
        out.push_str(&format!(
            "  Commission: {}% of the sale price\n",
            self.terms.commission_percent
        ));
        if self.terms.exclusivity_days > 0 {
            out.push_str(&format!(
                "  Exclusive mandate for {} days\n",
                self.terms.exclusivity_days
            ));
        } else {
            out.push_str("  Non-exclusive mandate\n");
        }
    }
}

fn render_person(out: &mut String, label: &str, person: &PersonDetails) {
    out.push_str(&format!(
        "{label}: {} (tax id {})\n",
        person.full_name, person.tax_id
    ));
    if let Some(nationality) = &person.nationality {
        out.push_str(&format!("    Nationality: {nationality}\n"));
    }
    if let Some(occupation) = &person.occupation {
        out.push_str(&format!("    Occupation: {occupation}\n"));
    }
    out.push_str(&format!("    E-mail: {}\n", person.email));
    if let Some(phone) = &person.phone {
        out.push_str(&format!("    Phone: {phone}\n"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use mandate_core::SpouseDetails;
    use proptest::prelude::*;
    use rust_decimal::Decimal;

    fn person(name: &str) -> PersonDetails {
        PersonDetails {
            full_name: name.to_string(),
            email: "seller@example.com".to_string(),
            tax_id: "123.456.789-00".to_string(),
            phone: None,
            nationality: None,
            occupation: None,
        }
    }

    fn property() -> Property {
        Property {
            id: 42,
            registry_number: "M-55.123".to_string(),
            address: "Rua das Laranjeiras, 100".to_string(),
            city: "Rio de Janeiro".to_string(),
            state: "RJ".to_string(),
            postal_code: Some("22240-006".to_string()),
            description: None,
        }
    }

    fn mandate_with_party(party: ContractingParty) -> Mandate {
        let created = Utc.with_ymd_and_hms(2026, 3, 10, 14, 30, 0).unwrap();
        Mandate::new(
            5,
            property(),
            party,
            1,
            Terms {
                exclusivity_days: 45,
                commission_percent: Decimal::from(6),
            },
            created,
        )
        .unwrap()
    }

    #[test]
    fn render_is_deterministic_for_identical_input() {
        let mandate = mandate_with_party(ContractingParty::MarriedIndividual {
            person: person("Bruno Lima"),
            spouse: SpouseDetails {
                full_name: "Carla Lima".to_string(),
                tax_id: "987.654.321-00".to_string(),
            },
        });
        let a = ContractData::from_mandate(&mandate).unwrap().render();
        let b = ContractData::from_mandate(&mandate).unwrap().render();
        assert_eq!(a, b);
    }

    #[test]
    fn render_names_spouse_for_married_individual() {
        let mandate = mandate_with_party(ContractingParty::MarriedIndividual {
            person: person("Bruno Lima"),
            spouse: SpouseDetails {
                full_name: "Carla Lima".to_string(),
                tax_id: "987.654.321-00".to_string(),
            },
        });
        let text = String::from_utf8(
            ContractData::from_mandate(&mandate).unwrap().render(),
        )
        .unwrap();
        assert!(text.contains("Spouse: Carla Lima"));
        assert!(text.contains("Exclusive mandate for 45 days"));
        assert!(text.contains("Issued on 2026-03-10"));
    }

    #[test]
    fn render_lists_all_co_owners() {
        let mandate = mandate_with_party(ContractingParty::CoOwners {
            owners: vec![person("Elisa Prado"), person("Fabio Prado")],
        });
        let text = String::from_utf8(
            ContractData::from_mandate(&mandate).unwrap().render(),
        )
        .unwrap();
        assert!(text.contains("Co-owner 1: Elisa Prado"));
        assert!(text.contains("Co-owner 2: Fabio Prado"));
    }

    #[test]
    fn generation_fails_for_company_without_representative_email() {
        let mut rep = person("Diego Alves");
        rep.email = String::new();
        let created = Utc.with_ymd_and_hms(2026, 3, 10, 14, 30, 0).unwrap();
        // Build the invalid party directly; Mandate::new would reject it.
        let mut mandate = mandate_with_party(ContractingParty::Individual {
            person: person("Placeholder"),
        });
        mandate.party = ContractingParty::Company {
            legal_name: "Imobiliária Alfa Ltda".to_string(),
            tax_id: "12.345.678/0001-00".to_string(),
            representative: rep,
        };
        mandate.created_at = created;
        let result = ContractData::from_mandate(&mandate);
        assert!(matches!(result, Err(GenerationError::Invalid(_))));
    }

    #[test]
    fn filename_embeds_mandate_id() {
        assert_eq!(contract_filename(42), "sales-mandate-42.txt");
    }

    proptest! {
        /// Rendering the same structurally-valid mandate twice always
        /// produces byte-identical output, whatever the field contents.
        #[test]
        fn render_deterministic_for_arbitrary_fields(
            name in "[A-Za-zÀ-ú][A-Za-zÀ-ú ]{1,40}",
            tax_id in "[0-9]{3}\\.[0-9]{3}\\.[0-9]{3}-[0-9]{2}",
            address in "[A-Za-z0-9 ,.]{5,60}",
            exclusivity in 0u32..365,
        ) {
            let mut p = person(&name);
            p.tax_id = tax_id;
            let mut prop = property();
            prop.address = address;
            let created = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
            let mandate = Mandate::new(
                11,
                prop,
                ContractingParty::Individual { person: p },
                1,
                Terms {
                    exclusivity_days: exclusivity,
                    commission_percent: Decimal::new(55, 1),
                },
                created,
            )
            .unwrap();
            let a = ContractData::from_mandate(&mandate).unwrap().render();
            let b = ContractData::from_mandate(&mandate).unwrap().render();
            prop_assert_eq!(a, b);
        }
    }
}
