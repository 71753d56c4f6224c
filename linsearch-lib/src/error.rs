//! Error taxonomy for the search workflow.  Every variant carries enough
//! context to print a single actionable line for the operator.
use crate::collection::CollectionType;
use std::{io, path::PathBuf};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The collection's stored type could not be determined.  The collection
    /// has to be regenerated; there is no recovery path.
    #[error(
        "could not determine the type of collection '{}'; recreate the collection or add a .dbtype file next to it",
        path.display()
    )]
    UnrecognizedFormat { path: PathBuf },

    /// The query/target type combination (possibly together with the
    /// alignment setting) has no legal search mode.
    #[error("unsupported {query}-{target} pairing: {reason}")]
    UnsupportedPairing {
        query: CollectionType,
        target: CollectionType,
        reason: &'static str,
    },

    /// The target collection has no pre-built linear index.  Indexes are
    /// never built inline; the operator has to create one first.
    #[error(
        "target collection '{}' has no linear index; build one first: createlinindex {}",
        target.display(),
        target.display()
    )]
    MissingIndex { target: PathBuf },

    #[error("could not create directory '{}': {source}", path.display())]
    DirectoryCreateError { path: PathBuf, source: io::Error },

    /// `--reuse-latest` was requested but no prior run left a usable alias.
    #[error(
        "no prior run found under '{}'; run once without --reuse-latest first",
        root.display()
    )]
    NoPriorRun { root: PathBuf },

    /// The dispatched pipeline reported failure.  Stage outputs are left in
    /// place for diagnosis.
    #[error("search pipeline failed with exit status {status}")]
    ExitFailure { status: i32 },

    #[error("i/o error at '{}': {source}", path.display())]
    Io { path: PathBuf, source: io::Error },
}

impl Error {
    /// The process exit status this error maps to.
    pub fn exit_status(&self) -> i32 {
        match self {
            Error::ExitFailure { status } => *status,
            _ => 1,
        }
    }
}
