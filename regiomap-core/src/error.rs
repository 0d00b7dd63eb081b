//! Error taxonomy for per-region build operations.
//!
//! Every variant is local to the region that produced it. The traversal
//! reports the error, folds it into the subtree outcome and carries on with
//! the remaining regions.

use std::{fmt, io};

use camino::Utf8PathBuf;
use thiserror::Error;

use crate::{BoundingBoxError, PolygonParseError};

/// Errors produced while building a region's subset or map artefact.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BuildError {
    /// The region's polygon filter file could not be turned into a bounding box.
    #[error("malformed polygon file {path:?}: {defect}")]
    MalformedPolygonFile {
        /// Location of the offending `.poly` file.
        path: Utf8PathBuf,
        /// What was wrong with it.
        #[source]
        defect: PolygonDefect,
    },
    /// The inherited source PBF does not exist or has zero length.
    #[error("cannot create {artefact:?}, source pbf is {defect}: {input:?}")]
    SourceMissingOrEmpty {
        /// Artefact the operation was asked to produce.
        artefact: Utf8PathBuf,
        /// The source PBF that failed the check.
        input: Utf8PathBuf,
        /// Whether the source was absent or empty.
        defect: SourceDefect,
    },
    /// The region's polygon filter file is absent.
    #[error("cannot create {artefact:?}, polygon is missing: {polygon:?}")]
    PolygonMissing {
        /// Artefact the operation was asked to produce.
        artefact: Utf8PathBuf,
        /// Expected location of the `.poly` file.
        polygon: Utf8PathBuf,
    },
    /// An external tool could not be run or did not produce usable output.
    #[error("{tool} failed while creating {artefact:?}: {failure}")]
    EngineInvocation {
        /// Name of the external tool.
        tool: String,
        /// Artefact the tool was asked to produce.
        artefact: Utf8PathBuf,
        /// How the invocation failed.
        #[source]
        failure: EngineFailure,
    },
    /// The finished map could not be moved to its published location.
    #[error("could not move created map {from:?} to {to:?}: {source}")]
    Relocation {
        /// Staged map file.
        from: Utf8PathBuf,
        /// Published destination.
        to: Utf8PathBuf,
        /// Underlying filesystem error.
        #[source]
        source: io::Error,
    },
    /// Preparing an intermediate file or directory failed.
    #[error("failed to stage {path:?}: {source}")]
    Staging {
        /// Path that could not be prepared.
        path: Utf8PathBuf,
        /// Underlying filesystem error.
        #[source]
        source: io::Error,
    },
}

impl BuildError {
    /// Wrap a filesystem error raised while preparing `path`.
    pub fn staging(path: impl Into<Utf8PathBuf>, source: io::Error) -> Self {
        Self::Staging {
            path: path.into(),
            source,
        }
    }
}

/// Reasons a polygon file cannot yield a bounding box.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PolygonDefect {
    /// The file does not follow the polygon filter grammar.
    #[error(transparent)]
    Parse(#[from] PolygonParseError),
    /// The polygon parsed but has no usable extent.
    #[error(transparent)]
    Bounds(#[from] BoundingBoxError),
}

/// Why a source PBF was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceDefect {
    /// The file does not exist.
    Missing,
    /// The file exists but has zero length.
    Empty,
}

impl fmt::Display for SourceDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => f.write_str("missing"),
            Self::Empty => f.write_str("empty"),
        }
    }
}

/// Failure modes of a single external tool invocation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EngineFailure {
    /// The executable could not be started, typically because it is missing.
    #[error("executable {program:?} could not be started: {source}")]
    Spawn {
        /// Program that was launched.
        program: Utf8PathBuf,
        /// Error reported by the operating system.
        #[source]
        source: io::Error,
    },
    /// The per-call diagnostics log could not be opened.
    #[error("log file {path:?} could not be opened: {source}")]
    Log {
        /// Log file location.
        path: Utf8PathBuf,
        /// Underlying filesystem error.
        #[source]
        source: io::Error,
    },
    /// The tool ran but exited unsuccessfully.
    #[error("exited with {}{}", describe_code(.code), describe_log(.log))]
    Exit {
        /// Exit code, absent when the process was terminated by a signal.
        code: Option<i32>,
        /// File capturing the tool's diagnostics.
        log: Option<Utf8PathBuf>,
    },
    /// The tool reported success but left an empty output file.
    #[error("resulting file {path:?} is empty")]
    EmptyOutput {
        /// Output file with zero length.
        path: Utf8PathBuf,
    },
}

fn describe_code(code: &Option<i32>) -> String {
    code.map_or_else(|| "a signal".to_owned(), |value| format!("status {value}"))
}

fn describe_log(log: &Option<Utf8PathBuf>) -> String {
    log.as_ref().map_or_else(String::new, |path| format!(", see {path} for details"))
}
