//! Generate/retry/abort state machine for one studio session.
//!
//! The session owns the form, the recent history and the attempt
//! bookkeeping. It never performs I/O: [`GenerationSession::begin`] hands
//! out an [`Attempt`] describing the request to send, and the caller
//! reports the outcome back through [`GenerationSession::settle`].
//!
//! ```text
//!            begin(Generate)                 Ok
//!   Idle ─────────────────────> Submitting ───────> Succeeded
//!    ^                            │   │ Err
//!    │ (any settled phase)        │   └───────────> Failed ──(overloaded, retries left)──> retry eligible
//!    │                            │ abort()                        │ begin(Retry)
//!    │                            └───────────────> Aborted        └──────> Submitting
//! ```
//!
//! Each attempt carries its own [`CancellationToken`] and id. Outcomes for
//! anything other than the current, uncancelled attempt are dropped, so an
//! abort always wins over a result that arrives late.

use aistudio_core::generation::{Style, PROMPT_MIN_CHARS};
use tokio_util::sync::CancellationToken;

use crate::error::ClientError;
use crate::types::{Generation, GenerationRequest, ImageFile};

/// Manual retries offered after consecutive overload failures.
pub const MAX_RETRIES: u32 = 3;

/// Most recent generations kept in history.
pub const HISTORY_CAP: usize = 5;

pub const PROCESSING_MESSAGE: &str = "Sketching your look…";
pub const SUCCESS_MESSAGE: &str = "Generation completed";
pub const ABORTED_MESSAGE: &str = "Generation aborted.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Submitting,
    Succeeded,
    Failed,
    Aborted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptKind {
    /// A fresh request. Resets the retry counter.
    Generate,
    /// Re-send the same inputs after an overload.
    Retry,
}

/// Why an attempt could not start.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BeginError {
    #[error("A generation is already in progress")]
    Busy,
    #[error("Enter a prompt of at least 3 characters and choose an image")]
    IncompleteForm,
    #[error("Retry is not available")]
    RetryUnavailable,
}

/// What happened to a reported outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    Succeeded,
    Failed,
    Aborted,
    /// The outcome belonged to a stale or cancelled attempt and was dropped.
    Ignored,
}

/// One in-flight request handed out by [`GenerationSession::begin`].
#[derive(Debug, Clone)]
pub struct Attempt {
    pub id: u64,
    pub kind: AttemptKind,
    pub cancel: CancellationToken,
    pub request: GenerationRequest,
}

#[derive(Debug, Clone)]
struct InFlight {
    id: u64,
    cancel: CancellationToken,
}

#[derive(Debug, Clone, Default)]
pub struct GenerationSession {
    pub prompt: String,
    pub style: Style,
    pub image: Option<ImageFile>,
    /// URL shown in the preview pane.
    pub preview: Option<String>,
    phase: Phase,
    retry_count: u32,
    last_error_overloaded: bool,
    history: Vec<Generation>,
    status_message: Option<String>,
    error_message: Option<String>,
    success_message: Option<String>,
    in_flight: Option<InFlight>,
    next_attempt_id: u64,
}

impl GenerationSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    pub fn remaining_retries(&self) -> u32 {
        MAX_RETRIES.saturating_sub(self.retry_count)
    }

    pub fn history(&self) -> &[Generation] {
        &self.history
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn success_message(&self) -> Option<&str> {
        self.success_message.as_deref()
    }

    pub fn is_submitting(&self) -> bool {
        self.phase == Phase::Submitting
    }

    /// Whether "Generate" is enabled.
    pub fn can_generate(&self) -> bool {
        !self.is_submitting() && self.form_complete()
    }

    /// Whether "Retry" is enabled.
    pub fn retry_eligible(&self) -> bool {
        self.phase == Phase::Failed
            && self.last_error_overloaded
            && self.retry_count < MAX_RETRIES
    }

    fn form_complete(&self) -> bool {
        self.prompt.chars().count() as u64 >= PROMPT_MIN_CHARS && self.image.is_some()
    }

    /// Start an attempt and enter [`Phase::Submitting`].
    pub fn begin(&mut self, kind: AttemptKind) -> Result<Attempt, BeginError> {
        if self.is_submitting() {
            return Err(BeginError::Busy);
        }
        let image = match kind {
            AttemptKind::Generate => {
                if !self.can_generate() {
                    return Err(BeginError::IncompleteForm);
                }
                self.retry_count = 0;
                self.image.clone()
            }
            AttemptKind::Retry => {
                if !self.retry_eligible() {
                    return Err(BeginError::RetryUnavailable);
                }
                if !self.form_complete() {
                    return Err(BeginError::IncompleteForm);
                }
                self.retry_count += 1;
                self.image.clone()
            }
        }
        .ok_or(BeginError::IncompleteForm)?;

        self.next_attempt_id += 1;
        let id = self.next_attempt_id;
        let cancel = CancellationToken::new();
        self.in_flight = Some(InFlight {
            id,
            cancel: cancel.clone(),
        });

        self.phase = Phase::Submitting;
        self.status_message = Some(PROCESSING_MESSAGE.to_string());
        self.error_message = None;
        self.success_message = None;
        self.last_error_overloaded = false;

        tracing::debug!(attempt_id = id, ?kind, retry_count = self.retry_count, "Attempt started");
        Ok(Attempt {
            id,
            kind,
            cancel,
            request: GenerationRequest {
                prompt: self.prompt.clone(),
                style: self.style,
                image,
            },
        })
    }

    /// Cancel the in-flight attempt, if any. Returns whether one was cancelled.
    pub fn abort(&mut self) -> bool {
        let Some(in_flight) = self.in_flight.take() else {
            return false;
        };
        in_flight.cancel.cancel();
        self.enter_aborted();
        tracing::info!(attempt_id = in_flight.id, "Attempt aborted");
        true
    }

    /// Apply the outcome of attempt `attempt_id`.
    pub fn settle(
        &mut self,
        attempt_id: u64,
        outcome: Result<Generation, ClientError>,
    ) -> Settlement {
        let current = match &self.in_flight {
            Some(in_flight) if in_flight.id == attempt_id && !in_flight.cancel.is_cancelled() => {
                true
            }
            _ => false,
        };
        if !current {
            tracing::debug!(attempt_id, "Dropped outcome of stale attempt");
            return Settlement::Ignored;
        }
        self.in_flight = None;

        match outcome {
            Ok(generation) => {
                tracing::info!(attempt_id, generation_id = generation.id, "Attempt succeeded");
                self.preview = Some(generation.image_url.clone());
                self.history.insert(0, generation);
                self.history.truncate(HISTORY_CAP);
                self.phase = Phase::Succeeded;
                self.status_message = None;
                self.success_message = Some(SUCCESS_MESSAGE.to_string());
                self.retry_count = 0;
                Settlement::Succeeded
            }
            Err(ClientError::Cancelled) => {
                self.enter_aborted();
                Settlement::Aborted
            }
            Err(err) => {
                tracing::info!(attempt_id, error = %err, "Attempt failed");
                self.phase = Phase::Failed;
                self.last_error_overloaded = err.is_overloaded();
                self.error_message = Some(err.to_string());
                self.status_message = if self.retry_eligible() {
                    Some(retry_message(self.remaining_retries()))
                } else {
                    None
                };
                Settlement::Failed
            }
        }
    }

    /// Replace history with `items`, newest first, capped.
    pub fn replace_history(&mut self, mut items: Vec<Generation>) {
        items.truncate(HISTORY_CAP);
        self.history = items;
    }

    /// Copy a history entry into the form and preview. Returns whether
    /// `id` was found.
    pub fn select_history(&mut self, id: i64) -> bool {
        let Some(entry) = self.history.iter().find(|g| g.id == id) else {
            return false;
        };
        self.prompt = entry.prompt.clone();
        self.style = entry.style.parse().unwrap_or_default();
        self.preview = Some(entry.image_url.clone());
        true
    }

    fn enter_aborted(&mut self) {
        self.phase = Phase::Aborted;
        self.status_message = Some(ABORTED_MESSAGE.to_string());
        self.error_message = None;
        self.last_error_overloaded = false;
    }
}

/// `"Model overloaded. You can retry N more time(s)."`
pub fn retry_message(remaining: u32) -> String {
    let unit = if remaining == 1 { "time" } else { "times" };
    format!("Model overloaded. You can retry {remaining} more {unit}.")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
