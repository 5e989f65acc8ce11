//! Error types for engine and configuration operations.
//!
//! Most interaction operations are total: unknown ids and out-of-state
//! pointer events are ignored. Only relationship creation and configuration
//! loading report failures.

use std::{io, path::PathBuf};

use thiserror::Error;

use crate::interaction::ModeTag;
use crate::model::ElementId;

/// Why a relationship endpoint pair was rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EndpointProblem {
    SelfLoop,
    MissingSource,
    MissingTarget,
}

impl std::fmt::Display for EndpointProblem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            EndpointProblem::SelfLoop => "source and target are the same element",
            EndpointProblem::MissingSource => "source element does not exist",
            EndpointProblem::MissingTarget => "target element does not exist",
        })
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    #[error("Invalid relationship {source_id} -> {target_id}: {problem}")]
    InvalidEndpoint {
        source_id: ElementId,
        target_id: ElementId,
        problem: EndpointProblem,
    },

    #[error("Another interaction is in progress: {active}")]
    InteractionInProgress { active: ModeTag },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read configuration {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Failed to parse JSON configuration: {0}")]
    Json(#[from] serde_json::Error),
}
