// error.rs — Failure taxonomy for a compilation run
//
// Every way a run can stop is a `PipelineError` variant, returned by value and
// propagated with `?`. The variant decides the process exit category so that
// user mistakes, compiler bugs and toolchain failures stay distinguishable.

use std::fmt;
use std::io;

use thiserror::Error;

use crate::diag::Diagnostic;
use crate::phase::PhaseId;

/// What kind of internal invariant was broken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InternalErrorKind {
    /// The Validator rejected the IR at a checkpoint.
    IrValidation,
    /// The post-emission check rejected the emitted artifact.
    BitcodeVerification,
    /// The module index no longer matches the IR it was built from.
    StaleIndex,
    /// A write-once artifact was produced twice in one run.
    ArtifactRewritten,
    /// A nested phase ran outside its parent.
    PhaseNesting,
    /// A phase was started a second time in one run.
    PhaseReentry,
}

impl fmt::Display for InternalErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            InternalErrorKind::IrValidation => "IR validation",
            InternalErrorKind::BitcodeVerification => "bitcode verification",
            InternalErrorKind::StaleIndex => "stale module index",
            InternalErrorKind::ArtifactRewritten => "artifact rewritten",
            InternalErrorKind::PhaseNesting => "phase nesting",
            InternalErrorKind::PhaseReentry => "phase re-entry",
        };
        write!(f, "{s}")
    }
}

/// Failure reported by an external collaborator (analyzer, codegen, linker, ...).
#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("codegen error: {0}")]
    Codegen(String),

    #[error("link error: {0}")]
    Link(String),

    #[error("{0}")]
    Other(String),
}

/// Invalid configuration, detected before any phase runs.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("unknown phase `{0}` (run with --list-phases to see available phases)")]
    UnknownPhase(String),

    #[error("unknown target `{name}` (available: {available})")]
    UnknownTarget { name: String, available: String },
}

/// Coarse exit category of a failed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    UserSource,
    Internal,
    Collaborator,
    Configuration,
}

impl ErrorCategory {
    /// Process exit code for this category.
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorCategory::UserSource => 1,
            ErrorCategory::Collaborator | ErrorCategory::Configuration => 2,
            ErrorCategory::Internal => 3,
        }
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    /// The program has errors; the diagnostics say where.
    #[error("compilation failed with {} error(s)", count_errors(.diagnostics))]
    UserSource { diagnostics: Vec<Diagnostic> },

    /// A bug in the compiler's own transformation chain.
    #[error("internal compiler error in {phase} ({kind}): {message}")]
    Internal {
        phase: PhaseId,
        kind: InternalErrorKind,
        message: String,
    },

    #[error("{phase} failed: {source}")]
    Collaborator {
        phase: PhaseId,
        #[source]
        source: CollaboratorError,
    },

    /// A phase needs an artifact that was never produced, typically because
    /// the producing phase is disabled.
    #[error("{phase} requires the {artifact}, which no earlier phase produced (is the producing phase disabled?)")]
    MissingInput {
        phase: PhaseId,
        artifact: &'static str,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Output staging or listing could not be written.
    #[error("output error: {0}")]
    Output(#[source] io::Error),
}

fn count_errors(diagnostics: &[Diagnostic]) -> usize {
    diagnostics.iter().filter(|d| d.is_error()).count()
}

impl PipelineError {
    pub fn internal(phase: PhaseId, kind: InternalErrorKind, message: impl Into<String>) -> Self {
        Self::Internal {
            phase,
            kind,
            message: message.into(),
        }
    }

    pub fn collaborator(phase: PhaseId, source: impl Into<CollaboratorError>) -> Self {
        Self::Collaborator {
            phase,
            source: source.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            PipelineError::UserSource { .. } => ErrorCategory::UserSource,
            PipelineError::Internal { .. } => ErrorCategory::Internal,
            PipelineError::Collaborator { .. } | PipelineError::Output(_) => {
                ErrorCategory::Collaborator
            }
            PipelineError::MissingInput { .. } | PipelineError::Config(_) => {
                ErrorCategory::Configuration
            }
        }
    }

    pub fn exit_code(&self) -> i32 {
        self.category().exit_code()
    }

    /// The internal error kind, if this is an internal compiler error.
    pub fn internal_kind(&self) -> Option<InternalErrorKind> {
        match self {
            PipelineError::Internal { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}
