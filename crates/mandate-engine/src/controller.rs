//! # Lifecycle Controller
//!
//! Owns the mandate's path through the signing provider: the submission
//! sequence and the application of the provider's asynchronous events.
//!
//! ## Submission sequence
//!
//! ```text
//! 1. guard status            (signed → rejected, nothing called)
//! 2. generate + store artifact if absent, persist its reference
//! 3. load artifact bytes, encode for transport
//! 4. compute deadline        (exclusivity days, or the 90-day default)
//! 5. submit document         → persist document key IMMEDIATELY
//! 6. register signers        (grantor representative + brokerage signatory)
//! 7. bind signature request  → request key
//! 8. persist                 (status-guarded compare-and-swap)
//! ```
//!
//! Step 5's immediate persist is what makes failures after it resumable: a
//! draft carrying a document key re-enters the sequence at step 6 and never
//! resubmits the document. Failures before step 5 leave no provider-side
//! state and are plain retries.
//!
//! ## Event application
//!
//! Transitions are idempotent (a redelivered `document.signed` is a no-op
//! success) and conflict-checked: the persist expects the status that was
//! read, and on conflict the record is re-fetched once — the racing writer
//! usually applied the same event.

use chrono::{DateTime, Duration, Utc};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

use mandate_artifact::{contract_filename, ArtifactStore, ContractData};
use mandate_state::{EventEffect, Mandate, MandateError, MandateStatus, SubmissionPhase};

use crate::error::EngineError;
use crate::event::WebhookEvent;
use crate::gateway::{DocumentSubmission, SignatureGateway, SignerRegistration, SignerRole};
use crate::repo::{MandateRepository, RepoError};

/// The brokerage's own signing party, appended to every signature request.
#[derive(Debug, Clone)]
pub struct SignatoryConfig {
    /// Signatory full name.
    pub name: String,
    /// Signatory e-mail.
    pub email: String,
    /// Signatory government identification number.
    pub documentation: String,
    /// Signatory contact phone, if any.
    pub phone: Option<String>,
}

impl SignatoryConfig {
    /// Load the brokerage signatory from environment variables:
    /// `SIGNATORY_NAME`, `SIGNATORY_EMAIL`, `SIGNATORY_TAX_ID`, and the
    /// optional `SIGNATORY_PHONE`.
    pub fn from_env() -> Result<Self, SignatoryConfigError> {
        let var = |name: &'static str| {
            std::env::var(name)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .ok_or(SignatoryConfigError::MissingVar(name))
        };
        Ok(Self {
            name: var("SIGNATORY_NAME")?,
            email: var("SIGNATORY_EMAIL")?,
            documentation: var("SIGNATORY_TAX_ID")?,
            phone: std::env::var("SIGNATORY_PHONE").ok(),
        })
    }

    fn registration(&self) -> SignerRegistration {
        SignerRegistration {
            name: self.name.clone(),
            email: self.email.clone(),
            documentation: self.documentation.clone(),
            phone: self.phone.clone(),
        }
    }
}

/// Signatory configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum SignatoryConfigError {
    #[error("{0} environment variable is required")]
    MissingVar(&'static str),
}

/// Result of a completed submission.
#[derive(Debug, Clone)]
pub struct SubmissionReceipt {
    /// The mandate as persisted, now awaiting signature.
    pub mandate: Mandate,
    /// Whether an existing provider document was reused.
    pub resumed: bool,
}

/// What reconciling a provider event actually did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The lifecycle status changed.
    Applied {
        /// The affected mandate.
        id: i64,
        /// The status after the transition.
        status: MandateStatus,
    },
    /// The event had already been applied; nothing changed.
    AlreadyApplied {
        /// The affected mandate.
        id: i64,
    },
    /// Partial signing progress was mirrored; status unchanged.
    ProgressRecorded {
        /// The affected mandate.
        id: i64,
    },
    /// The event was acknowledged without effect.
    Ignored {
        /// The affected mandate.
        id: i64,
        /// Why the event had no effect.
        reason: String,
    },
}

impl ReconcileOutcome {
    /// The mandate the outcome refers to.
    pub fn mandate_id(&self) -> i64 {
        match self {
            Self::Applied { id, .. }
            | Self::AlreadyApplied { id }
            | Self::ProgressRecorded { id }
            | Self::Ignored { id, .. } => *id,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum EventAction {
    Signed,
    Canceled,
    Progress,
}

/// Drives mandates through submission and provider-event reconciliation.
#[derive(Debug, Clone)]
pub struct LifecycleController<R, G, A> {
    repo: R,
    gateway: G,
    artifacts: A,
    signatory: SignatoryConfig,
    locale: String,
}

impl<R, G, A> LifecycleController<R, G, A>
where
    R: MandateRepository,
    G: SignatureGateway,
    A: ArtifactStore,
{
    /// Create a controller over the given seams.
    pub fn new(repo: R, gateway: G, artifacts: A, signatory: SignatoryConfig) -> Self {
        Self {
            repo,
            gateway,
            artifacts,
            signatory,
            locale: "pt-BR".to_string(),
        }
    }

    /// Override the locale passed to the provider.
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }

    /// Read access to the repository seam.
    pub fn repository(&self) -> &R {
        &self.repo
    }

    // ── Submission ───────────────────────────────────────────────────

    /// Send a mandate for signature, resuming a previously failed
    /// submission when the draft already carries a provider document key.
    pub async fn submit_for_signing(&self, id: i64) -> Result<SubmissionReceipt, EngineError> {
        let mut mandate = self.repo.get(id).await?;
        mandate.ensure_submittable()?;

        // Where to re-enter the sequence: a draft carrying a document key
        // resumes at signer registration instead of resubmitting.
        let phase = SubmissionPhase::of(&mandate);
        let resumed = !phase.needs_document_submission();
        if resumed {
            tracing::info!(
                mandate_id = mandate.id,
                phase = %phase,
                "resuming partially completed submission"
            );
        }

        // Artifact: generate on first submission, reload on regenerated
        // drafts and resumes. Generation failures abort before any
        // provider call.
        let filename = contract_filename(mandate.id);
        let bytes = match mandate.artifact_url.clone() {
            None => {
                let bytes = ContractData::from_mandate(&mandate)?.render();
                let stored = self.artifacts.put(&filename, &bytes).await?;
                mandate.record_artifact(stored.url, stored.filename, stored.digest, Utc::now())?;
                self.repo.update(&mandate, MandateStatus::Draft).await?;
                bytes
            }
            Some(url) => self.artifacts.get(&url).await?,
        };

        // The deadline doubles as the provider-side document deadline and
        // the persisted expiry.
        let deadline = Utc::now() + Duration::days(i64::from(mandate.terms.validity_days()));

        let document_key = match mandate.document_key.clone() {
            Some(key) => key,
            None => {
                self.submit_document(&mut mandate, &filename, &bytes, deadline)
                    .await?
            }
        };

        // Signing parties: the grantor's representative and the brokerage
        // signatory. From here on, failures are partial completions — the
        // provider document exists and its key is already persisted.
        let grantor = mandate.party.representative()?;
        let registrations = [
            (
                SignerRegistration {
                    name: grantor.full_name.clone(),
                    email: grantor.email.clone(),
                    documentation: grantor.tax_id.clone(),
                    phone: grantor.phone.clone(),
                },
                SignerRole::Grantor,
            ),
            (self.signatory.registration(), SignerRole::Brokerage),
        ];

        let mut signer_keys = Vec::with_capacity(registrations.len());
        for (registration, role) in &registrations {
            let key = self
                .gateway
                .register_signer(registration)
                .await
                .map_err(|failure| {
                    tracing::error!(
                        mandate_id = mandate.id,
                        document_key = %document_key,
                        error = %failure,
                        "signer registration failed after document submission"
                    );
                    EngineError::PartialSubmission {
                        id: mandate.id,
                        document_key: document_key.clone(),
                        detail: failure.to_string(),
                    }
                })?;
            signer_keys.push((key, *role));
        }

        let request_key = self
            .gateway
            .create_signature_request(&document_key, &signer_keys)
            .await
            .map_err(|failure| {
                tracing::error!(
                    mandate_id = mandate.id,
                    document_key = %document_key,
                    error = %failure,
                    "signature request binding failed"
                );
                EngineError::PartialSubmission {
                    id: mandate.id,
                    document_key: document_key.clone(),
                    detail: failure.to_string(),
                }
            })?;

        mandate.complete_submission(&request_key, deadline, Utc::now())?;
        match self.repo.update(&mandate, MandateStatus::Draft).await {
            Ok(()) => {
                tracing::info!(
                    mandate_id = mandate.id,
                    document_key = %document_key,
                    request_key = %request_key,
                    expires_at = %deadline,
                    "mandate sent for signature"
                );
                Ok(SubmissionReceipt { mandate, resumed })
            }
            Err(RepoError::Conflict { id, .. }) => Err(EngineError::Concurrency { id }),
            Err(other) => Err(EngineError::Finalize {
                id: mandate.id,
                document_key,
                request_key,
                detail: other.to_string(),
            }),
        }
    }

    /// Step 5: submit the document and persist its key before anything
    /// else happens. A persist failure here leaves an orphaned provider
    /// document; the key is logged for intervention.
    async fn submit_document(
        &self,
        mandate: &mut Mandate,
        filename: &str,
        bytes: &[u8],
        deadline: DateTime<Utc>,
    ) -> Result<String, EngineError> {
        let submission = DocumentSubmission {
            path: format!("/mandates/{filename}"),
            content_base64: BASE64.encode(bytes),
            deadline_at: deadline,
            auto_close: true,
            locale: self.locale.clone(),
        };
        let key = self
            .gateway
            .submit_document(&submission)
            .await
            .map_err(EngineError::Gateway)?;

        mandate.record_document_key(&key, Utc::now())?;
        if let Err(e) = self.repo.update(mandate, MandateStatus::Draft).await {
            tracing::error!(
                mandate_id = mandate.id,
                document_key = %key,
                error = %e,
                "provider document created but its key could not be persisted"
            );
            return Err(match e {
                RepoError::Conflict { id, .. } => EngineError::Concurrency { id },
                other => EngineError::PartialSubmission {
                    id: mandate.id,
                    document_key: key,
                    detail: format!("document key persist failed: {other}"),
                },
            });
        }
        Ok(key)
    }

    // ── Event application ────────────────────────────────────────────

    /// Apply a verified provider event to the mandate it references.
    pub async fn apply_event(&self, event: &WebhookEvent) -> Result<ReconcileOutcome, EngineError> {
        let key = event.document_key();
        let Some(mandate) = self.repo.find_by_document_key(key).await? else {
            tracing::warn!(
                document_key = %key,
                event = event.name(),
                "webhook references a provider document no mandate correlates to"
            );
            return Err(EngineError::UnknownDocument {
                key: key.to_string(),
            });
        };

        let action = match event {
            WebhookEvent::DocumentSigned { .. } => EventAction::Signed,
            WebhookEvent::DocumentCanceled { .. } => EventAction::Canceled,
            WebhookEvent::SignerSigned { signer_email, .. } => {
                if let Some(email) = signer_email {
                    tracing::debug!(mandate_id = mandate.id, signer = %email, "partial signature");
                }
                EventAction::Progress
            }
            WebhookEvent::Unknown { name, .. } => {
                tracing::info!(
                    mandate_id = mandate.id,
                    event = %name,
                    "ignoring unrecognized provider event"
                );
                return Ok(ReconcileOutcome::Ignored {
                    id: mandate.id,
                    reason: format!("unrecognized event {name}"),
                });
            }
        };

        self.apply_with_conflict_retry(mandate, action).await
    }

    /// Mark an overdue mandate expired. Invoked by an external scheduler.
    pub async fn mark_expired(&self, id: i64) -> Result<Mandate, EngineError> {
        let mut mandate = self.repo.get(id).await?;
        let expected = mandate.status;
        mandate.mark_expired(Utc::now())?;
        self.repo.update(&mandate, expected).await?;
        Ok(mandate)
    }

    async fn apply_with_conflict_retry(
        &self,
        mandate: Mandate,
        action: EventAction,
    ) -> Result<ReconcileOutcome, EngineError> {
        let id = mandate.id;
        let mut current = mandate;

        // One re-fetch on conflict: the racing writer usually applied this
        // very event, which the guards then report as already applied.
        for attempt in 0..2 {
            let expected = current.status;
            let mut updated = current.clone();
            let applied = match action {
                EventAction::Signed => updated.apply_document_signed(Utc::now()),
                EventAction::Canceled => updated.apply_document_canceled(Utc::now()),
                EventAction::Progress => updated.record_signer_progress("running", Utc::now()),
            };

            match applied {
                Ok(EventEffect::AlreadyApplied) => {
                    return Ok(ReconcileOutcome::AlreadyApplied { id });
                }
                Ok(effect) => match self.repo.update(&updated, expected).await {
                    Ok(()) => {
                        return Ok(match effect {
                            EventEffect::StatusChanged => ReconcileOutcome::Applied {
                                id,
                                status: updated.status,
                            },
                            _ => ReconcileOutcome::ProgressRecorded { id },
                        });
                    }
                    Err(RepoError::Conflict { .. }) if attempt == 0 => {
                        current = self.repo.get(id).await?;
                    }
                    Err(e) => return Err(e.into()),
                },
                Err(MandateError::InvalidTransition { status, event, .. }) => {
                    tracing::warn!(
                        mandate_id = id,
                        status = %status,
                        event = event,
                        "provider event does not apply to current status"
                    );
                    return Ok(ReconcileOutcome::Ignored {
                        id,
                        reason: format!("event {event} in status {status}"),
                    });
                }
                Err(other) => return Err(other.into()),
            }
        }

        Err(EngineError::Concurrency { id })
    }
}
