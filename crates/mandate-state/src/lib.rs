//! # mandate-state — Mandate Lifecycle State Machine
//!
//! Models the lifecycle of a sales mandate from draft through signature
//! completion, and the sub-step progression of a submission to the signing
//! provider.
//!
//! ## State Machines
//!
//! - **Mandate** (`mandate.rs`):
//!   `Draft → AwaitingSignature → {Signed | Canceled}`, with `Expired` as a
//!   deadline-derived terminal state. Webhook-driven transitions are
//!   idempotent: re-applying a completed transition reports
//!   [`EventEffect::AlreadyApplied`] instead of failing.
//!
//! - **Submission phase** (`submission.rs`):
//!   `NotStarted → DocumentSubmitted → PartiesRegistered → Bound → Persisted`.
//!   The phase is derived from the external keys already persisted on the
//!   mandate, so a submission that failed midway resumes from the last
//!   completed sub-step rather than restarting.
//!
//! ## Design
//!
//! Transitions are methods on [`Mandate`] returning `Result` — invalid
//! transitions are rejected with structured errors naming the current state
//! and the attempted operation. The enum-with-guards approach (rather than
//! typestate types per status) keeps the record directly serializable for
//! storage while still centralizing every status check in one module.

pub mod mandate;
pub mod submission;

pub use mandate::{EventEffect, Mandate, MandateError, MandateStatus};
pub use submission::SubmissionPhase;
