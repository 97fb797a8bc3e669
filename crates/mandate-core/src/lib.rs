//! # mandate-core — Foundational Types for the Mandate Stack
//!
//! Domain primitives shared by every other crate in the workspace:
//! the contracting-party sum type, property snapshots, contract terms,
//! and the validation error hierarchy. This crate is the leaf of the
//! dependency DAG — it depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **One closed sum type for contracting parties.** Individual, married
//!    individual, co-owners, and company are variants of a single enum with
//!    per-variant required fields, validated exhaustively — never ad hoc
//!    optional-field presence checks scattered across call sites.
//!
//! 2. **No floats in monetary fields.** The commission percentage is a
//!    `rust_decimal::Decimal`.
//!
//! 3. **Snapshots over joins.** A mandate embeds the property and party data
//!    it was granted against; once it leaves draft those fields are frozen
//!    with it.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `mandate-*` crates.
//! - No `unsafe` code, no `panic!()` or `.unwrap()` outside tests.

pub mod error;
pub mod party;
pub mod property;
pub mod terms;

pub use error::ValidationError;
pub use party::{ContractingParty, PersonDetails, SpouseDetails};
pub use property::Property;
pub use terms::{Terms, DEFAULT_VALIDITY_DAYS};
