//! Command runner double recording invocations instead of spawning tools.

use std::cell::RefCell;

use regiomap_core::EngineFailure;

use crate::process::{CommandRunner, Invocation};

/// `CommandRunner` that records every invocation and fakes its output.
///
/// Successful invocations write a fixed body (`stub` by default) to their
/// output path. Invocations whose output path ends with a registered suffix
/// fail with exit status 1 and write nothing.
#[derive(Debug)]
pub struct RecordingRunner {
    invocations: RefCell<Vec<Invocation>>,
    failing: Vec<String>,
    output: String,
}

impl Default for RecordingRunner {
    fn default() -> Self {
        Self {
            invocations: RefCell::new(Vec::new()),
            failing: Vec::new(),
            output: "stub".to_owned(),
        }
    }
}

impl RecordingRunner {
    /// Fail invocations whose output path ends with `suffix`.
    #[must_use]
    pub fn failing_for(mut self, suffix: &str) -> Self {
        self.failing.push(suffix.to_owned());
        self
    }

    /// Write `contents` to outputs instead of the default body.
    #[must_use]
    pub fn with_output(mut self, contents: &str) -> Self {
        contents.clone_into(&mut self.output);
        self
    }

    /// Invocations received so far, in order.
    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations.borrow().clone()
    }
}

impl CommandRunner for RecordingRunner {
    fn run(&self, invocation: &Invocation) -> Result<(), EngineFailure> {
        self.invocations.borrow_mut().push(invocation.clone());
        if self
            .failing
            .iter()
            .any(|suffix| invocation.output.as_str().ends_with(suffix.as_str()))
        {
            return Err(EngineFailure::Exit {
                code: Some(1),
                log: Some(invocation.log.clone()),
            });
        }
        regiomap_fs::write_file(&invocation.output, &self.output).map_err(|source| {
            EngineFailure::Spawn {
                program: invocation.program.clone(),
                source,
            }
        })
    }
}
