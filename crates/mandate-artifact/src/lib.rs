//! # mandate-artifact — Contract Artifact Pipeline
//!
//! Turns a mandate into its contract document and keeps the generated bytes
//! in digest-verified storage.
//!
//! - **Generation** (`contract.rs`): [`ContractData`] validates the mandate's
//!   party variant exhaustively, then renders the contract bytes. Rendering
//!   is a pure function — byte-identical input produces byte-identical
//!   output, so "does an artifact already exist" checks are meaningful and
//!   regeneration before submission is safe.
//!
//! - **Storage** (`store.rs`): the [`ArtifactStore`] trait with a
//!   filesystem implementation. Stored paths encode the content digest;
//!   retrieval recomputes and verifies it, so corruption is detected at
//!   read time. All I/O runs under a bounded timeout and timeouts surface
//!   as a transient error kind.
//!
//! Page-layout rendering (PDF) is a collaborator concern; this crate owns
//! the canonical contract content and treats stored bytes as opaque.

pub mod contract;
pub mod store;

pub use contract::{contract_filename, ContractData, GenerationError};
pub use store::{ArtifactStore, FsArtifactStore, StoreError, StoredArtifact};
