//! Local and durable artifact handles.

use std::path::PathBuf;

use crate::job::ArtifactKind;

/// A local, ephemeral file exchanged with the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedArtifact {
    pub path: PathBuf,
    pub byte_len: u64,
    pub kind: ArtifactKind,
}

/// The durable copy of a staged artifact after a successful upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedArtifact {
    pub key: String,
    pub url: String,
    pub kind: ArtifactKind,
}
