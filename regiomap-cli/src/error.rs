//! Error types emitted by the regiomap CLI.
//!
//! Only startup problems surface here. Failures while building a region are
//! reported by the traversal and end up in the build outcome instead.

use std::sync::Arc;

use camino::Utf8PathBuf;
use regiomap_core::RegionConfigError;
use thiserror::Error;
use zip::result::ZipError;

/// Errors emitted by the regiomap CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        /// Long flag naming the option.
        field: &'static str,
        /// Environment variable that can supply it instead.
        env: &'static str,
    },
    /// The plan file could not be read.
    #[error("failed to read plan at {path:?}: {source}")]
    ReadPlan {
        /// Plan location.
        path: Utf8PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
    /// Plan JSON could not be decoded.
    #[error("failed to parse plan JSON at {path:?}: {source}")]
    ParsePlan {
        /// Plan location.
        path: Utf8PathBuf,
        /// Decoder error with line and column.
        #[source]
        source: serde_json::Error,
    },
    /// The region tree in the plan is inconsistent.
    #[error("plan at {path:?} declares invalid regions: {source}")]
    InvalidRegions {
        /// Plan location.
        path: Utf8PathBuf,
        /// First inconsistency found while resolving regions.
        #[source]
        source: RegionConfigError,
    },
    /// The land simplification tolerance is negative or not finite.
    #[error("land_simplification must be a finite, non-negative number, got {value}")]
    InvalidSimplification {
        /// Rejected tolerance.
        value: f64,
    },
    /// A configured tool cannot be found or is not executable.
    #[error("{field} {program:?} is not an executable file or cannot be found on PATH")]
    MissingExecutable {
        /// Plan field configuring the tool.
        field: &'static str,
        /// Configured program name or path.
        program: Utf8PathBuf,
    },
    /// The run log under the logging root could not be opened.
    #[error("failed to open run log at {path:?}: {source}")]
    OpenRunLog {
        /// Run log location.
        path: Utf8PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
    /// The land polygon archive could not be unpacked.
    #[error("failed to unpack land polygons from {path:?}: {source}")]
    UnpackLandArchive {
        /// Archive location.
        path: Utf8PathBuf,
        /// Underlying archive or IO error.
        #[source]
        source: ZipError,
    },
}
