//! The reported job outcome and the job lifecycle state machine.

use serde::{Deserialize, Serialize};

/// Message attached to successful outcomes.
pub const SUCCESS_MESSAGE: &str = "3D model generated successfully";

/// Message attached to failed outcomes.
pub const FAILURE_MESSAGE: &str = "3D model generation failed";

// ---------------------------------------------------------------------------
// JobOutcome
// ---------------------------------------------------------------------------

/// Uniform result payload returned to the caller.
///
/// Exactly one of the following holds:
/// - `success == true`, `image_url` and `step_url` set, `error` absent;
/// - `success == false`, `error` set.
///
/// `model_id` is `null` whenever the metadata record was not written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobOutcome {
    pub success: bool,
    pub model_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl JobOutcome {
    pub fn succeeded(image_url: String, step_url: String, model_id: Option<String>) -> Self {
        Self {
            success: true,
            model_id,
            image_url: Some(image_url),
            step_url: Some(step_url),
            error: None,
            message: Some(SUCCESS_MESSAGE.to_string()),
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            model_id: None,
            image_url: None,
            step_url: None,
            error: Some(error.into()),
            message: Some(FAILURE_MESSAGE.to_string()),
        }
    }

    /// Whether the outcome satisfies the success/failure exclusivity rule.
    pub fn is_consistent(&self) -> bool {
        if self.success {
            self.image_url.is_some() && self.step_url.is_some() && self.error.is_none()
        } else {
            self.error.is_some()
        }
    }
}

// ---------------------------------------------------------------------------
// JobState
// ---------------------------------------------------------------------------

/// Lifecycle of a single job.
///
/// ```text
/// Received -> Staged -> Invoked -> Published -> Recorded -> CleanedUp -> Reported
///     \          \          \                                  ^
///      `----------`----------`-----> Failed -------------------'
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Received,
    Staged,
    Invoked,
    Published,
    Failed,
    Recorded,
    CleanedUp,
    Reported,
}

impl JobState {
    /// Whether `self -> next` is a legal forward transition.
    pub fn can_transition_to(self, next: JobState) -> bool {
        use JobState::*;
        matches!(
            (self, next),
            (Received, Staged)
                | (Received, Failed)
                | (Staged, Invoked)
                | (Staged, Failed)
                | (Invoked, Published)
                | (Invoked, Failed)
                | (Published, Recorded)
                | (Published, Failed)
                | (Recorded, CleanedUp)
                | (Failed, CleanedUp)
                | (CleanedUp, Reported)
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
