use thiserror::Error;

/// Errors raised while painting onto a [`crate::renderer::Surface`].
///
/// These never reach the user: the renderer aborts the current paint,
/// restores the surface transform and logs the failure.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RenderError {
    #[error("render surface is unavailable ({width}x{height})")]
    SurfaceUnavailable { width: u32, height: u32 },

    #[error("invalid surface transform: {0}")]
    InvalidTransform(String),

    #[error("restore called without a matching save")]
    UnbalancedRestore,
}

/// Errors reported by a [`crate::persistence::SaveBackend`].
#[derive(Debug, Error)]
pub enum SaveError {
    #[error("save backend failed: {0}")]
    Backend(String),

    #[error("failed to serialize drawing: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("failed to write drawing: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur while reading stored drawing content.
///
/// Loading never fails outright; callers fall back to an empty drawing.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("malformed drawing content: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Errors that can occur while loading settings from disk.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("failed to read settings: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid setting `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}
