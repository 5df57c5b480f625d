use std::fmt;

/// Which canonical record an adapter was trying to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Movie,
    Episode,
    RadarrQueueItem,
    SonarrQueueItem,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RecordKind::Movie => "movie",
            RecordKind::Episode => "episode",
            RecordKind::RadarrQueueItem => "radarr queue item",
            RecordKind::SonarrQueueItem => "sonarr queue item",
        };
        f.write_str(name)
    }
}

/// A single upstream item did not match any known shape. Scoped to that item.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("schema mismatch for {kind}: {reason}")]
pub struct SchemaMismatch {
    pub kind: RecordKind,
    pub reason: String,
}

impl SchemaMismatch {
    pub fn new(kind: RecordKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            reason: reason.into(),
        }
    }
}

/// Reasons a collector invocation ended without writing anything.
#[derive(Debug, thiserror::Error)]
pub enum CollectError {
    #[error("upstream returned no usable data")]
    EmptyUpstream,

    #[error("no points left to write after adaptation and filtering")]
    EmptyBatch,

    #[error("sink write failed: {0}")]
    Sink(#[from] anyhow::Error),
}
