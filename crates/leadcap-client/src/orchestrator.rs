//! Submission orchestrator
//!
//! Drives one lead from form to attached pictures:
//!
//! ```text
//! Form -> Submitting -> OfflineSaved | Created -> ImagesPending -> Uploading -> Done | PartialFailure
//! ```
//!
//! Everything the user entered lives in the local draft until the server confirms it. The remote
//! lead is created at most once per draft: its id and picture token are written back into the
//! draft before any picture is sent. Pictures go up one at a time and each confirmed picture is
//! removed from the draft immediately, so an interrupted batch resumes with exactly the pictures
//! that are still missing.
//!
//! Only one submission or upload sequence runs at a time; a concurrent call fails with
//! [`ClientError::Busy`] instead of waiting.

use std::sync::Arc;

use leadcap_core::validation::LeadForm;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::api::LeadApi;
use crate::draft::{DraftRepository, LeadDraft, NewImage};
use crate::error::{ApiErrorKind, ClientError, DraftStoreError};
use crate::network::NetworkMonitor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    Form,
    Submitting,
    OfflineSaved,
    Created,
    ImagesPending,
    Uploading,
    Done,
    PartialFailure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// No connection; the form waits in the draft
    SavedOffline,
    Created { lead_id: Uuid },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Offline,
    NothingToSync,
    /// The lead exists remotely but no pictures are queued; the draft is kept for them
    NoImages { lead_id: Uuid },
    /// Connectivity dropped between two pictures
    Interrupted {
        lead_id: Uuid,
        attached: usize,
        remaining: usize,
    },
    /// Every queued picture is attached and the draft is gone
    Completed { lead_id: Uuid, attached: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Progress {
    state: FlowState,
    last_error: Option<&'static str>,
}

/// Everything the UI derives its labels from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowSnapshot {
    pub state: FlowState,
    pub is_online: bool,
    pub has_draft: bool,
    pub lead_id: Option<Uuid>,
    /// Pictures queued in the draft
    pub pending_images: usize,
    pub pending_bytes: u64,
    /// Pictures picked by the user but not queued yet
    pub selected_images: usize,
    pub last_error: Option<&'static str>,
}

impl FlowSnapshot {
    pub fn with_selected(mut self, selected_images: usize) -> Self {
        self.selected_images = selected_images;
        self
    }

    pub fn is_uploading(&self) -> bool {
        self.state == FlowState::Uploading
    }
}

pub fn primary_action_label(snapshot: &FlowSnapshot) -> &'static str {
    if snapshot.is_uploading() {
        "Wird hochgeladen..."
    } else if snapshot.is_online {
        "Bilder hochladen"
    } else {
        "Bilder lokal speichern"
    }
}

pub fn primary_action_enabled(snapshot: &FlowSnapshot) -> bool {
    !snapshot.is_uploading() && (snapshot.selected_images > 0 || snapshot.pending_images > 0)
}

pub fn status_message(is_online: bool) -> &'static str {
    if is_online {
        "Online: Bilder können jetzt über den Upload-Button hochgeladen werden."
    } else {
        "Offline: Bilder werden lokal gespeichert und später hochgeladen."
    }
}

pub struct Orchestrator {
    drafts: Arc<dyn DraftRepository>,
    api: Arc<dyn LeadApi>,
    network: NetworkMonitor,
    sequence: Mutex<()>,
    progress: watch::Sender<Progress>,
}

impl Orchestrator {
    pub fn new(
        drafts: Arc<dyn DraftRepository>,
        api: Arc<dyn LeadApi>,
        network: NetworkMonitor,
    ) -> Self {
        let (progress, _rx) = watch::channel(Progress {
            state: FlowState::Form,
            last_error: None,
        });
        Self {
            drafts,
            api,
            network,
            sequence: Mutex::new(()),
            progress,
        }
    }

    /// Build an orchestrator that picks up where a previous run left off.
    pub async fn restore(
        drafts: Arc<dyn DraftRepository>,
        api: Arc<dyn LeadApi>,
        network: NetworkMonitor,
    ) -> Result<Self, DraftStoreError> {
        let has_draft = drafts.get().await?.is_some();
        let orchestrator = Self::new(drafts, api, network);
        if has_draft {
            orchestrator.transition(FlowState::ImagesPending);
        }
        Ok(orchestrator)
    }

    /// Connectivity signal the auto-sync task listens to.
    pub fn network(&self) -> &NetworkMonitor {
        &self.network
    }

    pub fn state(&self) -> FlowState {
        self.progress.borrow().state
    }

    pub async fn snapshot(&self) -> Result<FlowSnapshot, ClientError> {
        let draft = self.drafts.get().await?;
        let progress = *self.progress.borrow();
        Ok(FlowSnapshot {
            state: progress.state,
            is_online: self.network.is_online(),
            has_draft: draft.is_some(),
            lead_id: draft.as_ref().and_then(|d| d.lead_id),
            pending_images: draft.as_ref().map_or(0, |d| d.images.len()),
            pending_bytes: draft.as_ref().map_or(0, LeadDraft::image_bytes),
            selected_images: 0,
            last_error: progress.last_error,
        })
    }

    fn transition(&self, state: FlowState) {
        self.progress.send_if_modified(|p| {
            let changed = p.state != state;
            p.state = state;
            p.last_error = None;
            changed
        });
        tracing::debug!(state = ?state, "Flow state");
    }

    /// Record `err` for the UI, move to `state` and hand the error back.
    fn fail(&self, state: FlowState, err: ClientError) -> ClientError {
        self.progress.send_modify(|p| {
            p.state = state;
            p.last_error = Some(err.user_message());
        });
        tracing::warn!(state = ?state, error = %err, "Flow step failed");
        err
    }

    fn lock(&self) -> Result<tokio::sync::MutexGuard<'_, ()>, ClientError> {
        self.sequence.try_lock().map_err(|_| ClientError::Busy)
    }

    /// Validate and submit the form. Offline, the form is only stored locally.
    pub async fn submit_form(&self, form: &LeadForm) -> Result<SubmitOutcome, ClientError> {
        let _sequence = self.lock()?;

        let payload = form
            .to_payload()
            .map_err(|errors| self.fail(FlowState::Form, ClientError::Validation(errors)))?;

        if let Some(existing) = self.drafts.get().await? {
            if !existing.images.is_empty() {
                tracing::warn!(
                    pending_images = existing.images.len(),
                    "Replacing draft that still has queued pictures"
                );
            }
        }

        self.transition(FlowState::Submitting);

        if !self.network.is_online() {
            self.drafts
                .save(&LeadDraft::new(payload))
                .await
                .map_err(|e| self.fail(FlowState::Form, e.into()))?;
            self.transition(FlowState::OfflineSaved);
            self.transition(FlowState::ImagesPending);
            tracing::info!("Lead saved offline");
            return Ok(SubmitOutcome::SavedOffline);
        }

        let created = self
            .api
            .create_lead(&payload)
            .await
            .map_err(|e| self.fail(FlowState::Form, ClientError::Submit(e)))?;
        self.transition(FlowState::Created);

        self.drafts
            .save(&LeadDraft::created(
                payload,
                created.lead_id,
                created.picture_token,
            ))
            .await
            .map_err(|e| {
                tracing::error!(lead_id = %created.lead_id, "Lead created but draft could not be stored");
                self.fail(FlowState::Form, e.into())
            })?;
        self.transition(FlowState::ImagesPending);

        tracing::info!(lead_id = %created.lead_id, "Lead created");
        Ok(SubmitOutcome::Created {
            lead_id: created.lead_id,
        })
    }

    /// Queue pictures in the draft. Nothing is uploaded here.
    pub async fn add_images(&self, images: Vec<NewImage>) -> Result<LeadDraft, ClientError> {
        let _sequence = self.lock()?;

        let state = self.state();
        let draft = self
            .drafts
            .append_images(images)
            .await
            .map_err(|e| self.fail(state, e.into()))?;

        self.transition(FlowState::ImagesPending);
        tracing::info!(
            pending_images = draft.images.len(),
            pending_bytes = draft.image_bytes(),
            "Pictures queued"
        );
        Ok(draft)
    }

    /// Make sure the lead exists remotely, then upload every queued picture in order.
    pub async fn sync(&self) -> Result<SyncOutcome, ClientError> {
        let _sequence = self.lock()?;
        self.sync_locked().await
    }

    /// `sync` for the reconnect path, reported with the offline wording.
    pub async fn resume(&self) -> Result<SyncOutcome, ClientError> {
        match self.sync().await {
            Err(ClientError::Upload { source, .. }) => Err(self.fail(
                FlowState::PartialFailure,
                ClientError::ResumeUpload(source),
            )),
            other => other,
        }
    }

    async fn sync_locked(&self) -> Result<SyncOutcome, ClientError> {
        if !self.network.is_online() {
            return Ok(SyncOutcome::Offline);
        }

        let Some(draft) = self.drafts.get().await? else {
            return Ok(SyncOutcome::NothingToSync);
        };

        self.transition(FlowState::Uploading);

        let (lead_id, picture_token) = match draft.identity() {
            Some((id, token)) => (id, token.to_string()),
            None => {
                let created = self
                    .api
                    .create_lead(&draft.form)
                    .await
                    .map_err(|e| self.fail(FlowState::ImagesPending, ClientError::Submit(e)))?;
                self.drafts
                    .set_identity(created.lead_id, &created.picture_token)
                    .await
                    .map_err(|e| {
                        tracing::error!(lead_id = %created.lead_id, "Lead created but identity could not be stored");
                        self.fail(FlowState::ImagesPending, e.into())
                    })?;
                tracing::info!(lead_id = %created.lead_id, "Offline lead created");
                (created.lead_id, created.picture_token)
            }
        };

        if draft.images.is_empty() {
            self.transition(FlowState::ImagesPending);
            return Ok(SyncOutcome::NoImages { lead_id });
        }

        let total = draft.images.len();
        let mut attached = 0;
        for image in &draft.images {
            if !self.network.is_online() {
                tracing::info!(lead_id = %lead_id, attached, remaining = total - attached, "Went offline during upload");
                self.transition(FlowState::ImagesPending);
                return Ok(SyncOutcome::Interrupted {
                    lead_id,
                    attached,
                    remaining: total - attached,
                });
            }

            let key = self
                .api
                .upload_picture(lead_id, &picture_token, image)
                .await
                .map_err(|source| {
                    let err = if source.kind == ApiErrorKind::Auth {
                        ClientError::PictureTokenRejected(source)
                    } else {
                        ClientError::Upload {
                            file_name: image.file_name.clone(),
                            source,
                        }
                    };
                    self.fail(FlowState::PartialFailure, err)
                })?;

            self.drafts
                .remove_image(image.id)
                .await
                .map_err(|e| self.fail(FlowState::PartialFailure, e.into()))?;
            attached += 1;
            tracing::info!(lead_id = %lead_id, key = %key, attached, total, "Picture attached");
        }

        self.drafts
            .clear()
            .await
            .map_err(|e| self.fail(FlowState::PartialFailure, e.into()))?;
        self.transition(FlowState::Done);

        Ok(SyncOutcome::Completed { lead_id, attached })
    }

    /// Throw the draft away and start over.
    pub async fn discard(&self) -> Result<(), ClientError> {
        let _sequence = self.lock()?;
        self.drafts.clear().await?;
        self.transition(FlowState::Form);
        Ok(())
    }

    /// Run `resume` on every offline to online transition.
    pub fn spawn_auto_sync(self: &Arc<Self>) -> JoinHandle<()> {
        let orchestrator = Arc::clone(self);
        let mut online = orchestrator.network.subscribe();
        tokio::spawn(async move {
            let mut was_online = *online.borrow_and_update();
            while online.changed().await.is_ok() {
                let is_online = *online.borrow_and_update();
                if is_online && !was_online {
                    match orchestrator.resume().await {
                        Ok(outcome) => tracing::info!(outcome = ?outcome, "Auto-sync finished"),
                        Err(ClientError::Busy) => {
                            tracing::debug!("Auto-sync skipped, another sequence is running")
                        }
                        Err(e) => tracing::warn!(error = %e, "Auto-sync failed"),
                    }
                }
                was_online = is_online;
            }
        })
    }
}
