//! # mandate-engine — Lifecycle Orchestration
//!
//! The engine behind "send this mandate for signature": it drives the
//! provider call sequence, keeps the mandate record consistent with the
//! provider's view, and reconciles the asynchronous events the provider
//! posts back.
//!
//! ## Components
//!
//! - **Controller** (`controller.rs`) — owns the submission sequence
//!   (generate artifact → store → submit document → register signers →
//!   bind signature request → persist) and the application of provider
//!   events to the state machine. External keys are persisted the moment
//!   they are obtained so a failed submission resumes instead of
//!   resubmitting.
//!
//! - **Reconciler** (`reconciler.rs`) — verifies webhook authenticity
//!   (HMAC-SHA256 over the raw body, constant-time comparison), parses the
//!   provider's event taxonomy into a closed union, and applies events
//!   through the controller idempotently.
//!
//! - **Seams** (`gateway.rs`, `repo.rs`) — the signing provider and the
//!   mandate store sit behind traits so the orchestration logic is testable
//!   against in-memory fakes; `ClicksignClient` implements the gateway seam.
//!
//! - **Errors** (`error.rs`) — one taxonomy with an explicit
//!   classification (validation / conflict / transient / partial
//!   completion / reconciliation) so callers can pick the right recovery
//!   strategy. Nothing here swallows an external-call failure.

pub mod controller;
pub mod error;
pub mod event;
pub mod gateway;
pub mod reconciler;
pub mod repo;

pub use controller::{
    LifecycleController, ReconcileOutcome, SignatoryConfig, SubmissionReceipt,
};
pub use error::{EngineError, ErrorClass};
pub use event::{MalformedEventError, WebhookEvent};
pub use gateway::{
    DocumentSubmission, GatewayFailure, SignatureGateway, SignerRegistration, SignerRole,
};
pub use reconciler::{compute_signature, verify_signature, WebhookConfig, WebhookReconciler};
pub use repo::{MandateRepository, RepoError};
