//! Conversion job admission, artifact kinds and storage-key derivation.

use serde::Serialize;

use crate::types::{JobId, Timestamp};

/// Prompt used when a request does not carry one (or carries only whitespace).
pub const DEFAULT_PROMPT: &str =
    "Generate a 3D CAD model that faithfully reproduces the part shown in this 2D drawing.";

/// Content type of the engine's output artifact (ISO 10303-21 exchange file).
pub const MODEL_CONTENT_TYPE: &str = "model/step";

/// File extension of the engine's output artifact.
pub const MODEL_EXTENSION: &str = "step";

// ---------------------------------------------------------------------------
// Artifact kinds
// ---------------------------------------------------------------------------

/// What a staged or published artifact contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    /// The uploaded 2D drawing.
    InputImage,
    /// The 3D model written by the engine.
    OutputModel,
}

impl ArtifactKind {
    /// Short label used inside storage keys.
    pub fn label(self) -> &'static str {
        match self {
            Self::InputImage => "drawing",
            Self::OutputModel => "model",
        }
    }
}

/// Image encoding of the uploaded drawing, selected by the file-name hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
}

impl ImageFormat {
    /// `.png` (any case) selects PNG; every other name is treated as JPEG.
    pub fn from_file_name(file_name: &str) -> Self {
        let is_png = std::path::Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("png"));
        if is_png {
            Self::Png
        } else {
            Self::Jpeg
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
        }
    }
}

// ---------------------------------------------------------------------------
// Job
// ---------------------------------------------------------------------------

/// One conversion request, from admission to its single terminal outcome.
///
/// A job is never reused: every admission mints a fresh [`JobId`], and every
/// staged path and storage key is scoped under it.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: JobId,
    pub prompt: String,
    pub file_name: String,
    pub image_format: ImageFormat,
    pub created_at: Timestamp,
}

impl Job {
    /// Admit a new job.
    ///
    /// A missing or blank `prompt` falls back to `default_prompt`.
    pub fn admit(file_name: &str, prompt: Option<&str>, default_prompt: &str) -> Self {
        let prompt = prompt
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .unwrap_or(default_prompt)
            .to_string();

        Self {
            id: uuid::Uuid::now_v7(),
            prompt,
            file_name: file_name.to_string(),
            image_format: ImageFormat::from_file_name(file_name),
            created_at: chrono::Utc::now(),
        }
    }

    /// Storage key for one of this job's artifacts.
    ///
    /// Format: `<job-id>/<yyyymmddThhmmssZ>-<kind>.<ext>`.
    pub fn storage_key(&self, kind: ArtifactKind) -> String {
        format!(
            "{}/{}-{}.{}",
            self.id,
            self.created_at.format("%Y%m%dT%H%M%SZ"),
            kind.label(),
            self.extension(kind),
        )
    }

    pub fn content_type(&self, kind: ArtifactKind) -> &'static str {
        match kind {
            ArtifactKind::InputImage => self.image_format.content_type(),
            ArtifactKind::OutputModel => MODEL_CONTENT_TYPE,
        }
    }

    pub fn extension(&self, kind: ArtifactKind) -> &'static str {
        match kind {
            ArtifactKind::InputImage => self.image_format.extension(),
            ArtifactKind::OutputModel => MODEL_EXTENSION,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
