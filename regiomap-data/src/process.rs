//! Blocking invocation of external tools.

use std::fmt;
use std::process::{Command, Stdio};

use camino::{Utf8Path, Utf8PathBuf};
use log::debug;
use regiomap_core::{BuildError, EngineFailure};

/// A fully constructed external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Executable to launch.
    pub program: Utf8PathBuf,
    /// Arguments, passed verbatim.
    pub args: Vec<String>,
    /// File receiving the tool's stderr, opened in append mode.
    pub log: Utf8PathBuf,
    /// File the tool is expected to produce.
    pub output: Utf8PathBuf,
}

impl Invocation {
    /// Start an invocation of `program` logging to `log` and producing `output`.
    pub fn new(
        program: impl Into<Utf8PathBuf>,
        log: impl Into<Utf8PathBuf>,
        output: impl Into<Utf8PathBuf>,
    ) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            log: log.into(),
            output: output.into(),
        }
    }

    /// Append arguments.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Short tool name used in diagnostics.
    #[must_use]
    pub fn tool(&self) -> &str {
        self.program.file_name().unwrap_or(self.program.as_str())
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.program.as_str())?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Runs external commands to completion.
pub trait CommandRunner {
    /// Run `invocation` and wait for it to exit.
    fn run(&self, invocation: &Invocation) -> Result<(), EngineFailure>;
}

impl<R: CommandRunner + ?Sized> CommandRunner for &R {
    fn run(&self, invocation: &Invocation) -> Result<(), EngineFailure> {
        (**self).run(invocation)
    }
}

/// Runner spawning real processes with stderr appended to the invocation log.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> Result<(), EngineFailure> {
        let log = regiomap_fs::open_append(&invocation.log).map_err(|source| EngineFailure::Log {
            path: invocation.log.clone(),
            source,
        })?;
        let status = Command::new(invocation.program.as_std_path())
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stderr(Stdio::from(log))
            .status()
            .map_err(|source| EngineFailure::Spawn {
                program: invocation.program.clone(),
                source,
            })?;
        if status.success() {
            Ok(())
        } else {
            Err(EngineFailure::Exit {
                code: status.code(),
                log: Some(invocation.log.clone()),
            })
        }
    }
}

/// Run `invocation`, or create a placeholder for its output in dry-run mode.
///
/// Failures are attributed to `artefact`.
pub(crate) fn execute<R: CommandRunner + ?Sized>(
    runner: &R,
    invocation: &Invocation,
    dry_run: bool,
    artefact: &Utf8Path,
) -> Result<(), BuildError> {
    debug!("calling: {invocation}");
    if dry_run {
        return regiomap_fs::touch(&invocation.output)
            .map_err(|source| BuildError::staging(&invocation.output, source));
    }
    runner
        .run(invocation)
        .map_err(|failure| BuildError::EngineInvocation {
            tool: invocation.tool().to_owned(),
            artefact: artefact.to_path_buf(),
            failure,
        })
}

/// Fail when `invocation` reported success but left no usable output.
pub(crate) fn require_output(
    invocation: &Invocation,
    artefact: &Utf8Path,
) -> Result<(), BuildError> {
    let len = regiomap_fs::file_len(&invocation.output)
        .map_err(|source| BuildError::staging(&invocation.output, source))?;
    match len {
        Some(len) if len > 0 => Ok(()),
        _ => Err(BuildError::EngineInvocation {
            tool: invocation.tool().to_owned(),
            artefact: artefact.to_path_buf(),
            failure: EngineFailure::EmptyOutput {
                path: invocation.output.clone(),
            },
        }),
    }
}
