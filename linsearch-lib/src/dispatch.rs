//! Handing the assembled pipeline to the external process runner.
use crate::{
    error::{Error, Result},
    pipeline::{Pipeline, StageVars},
};
use log::info;
use std::{
    path::{Path, PathBuf},
    process::Command,
};

/// External process execution boundary.  The production implementation
/// blocks on a child process; tests substitute a recording runner.
pub trait ProcessRunner {
    /// Runs `program` with `args` and the stage variables, blocking until
    /// completion.  Returns the exit status on success, or
    /// [`Error::ExitFailure`] when the pipeline reports failure.
    fn exec(&self, program: &Path, args: &[PathBuf], vars: &StageVars) -> Result<i32>;
}

/// Runs the entry script with `/bin/sh`, mapping the stage variables into
/// the child environment.
#[derive(Clone, Copy, Debug, Default)]
pub struct ShellRunner;

impl ProcessRunner for ShellRunner {
    fn exec(&self, program: &Path, args: &[PathBuf], vars: &StageVars) -> Result<i32> {
        let mut command = Command::new("/bin/sh");
        command.arg(program).args(args);
        for (name, value) in vars.iter() {
            command.env(name, value);
        }
        let status = command.status().map_err(|source| Error::Io {
            path: program.to_path_buf(),
            source,
        })?;
        if status.success() {
            Ok(0)
        } else {
            Err(Error::ExitFailure {
                status: status.code().unwrap_or(1),
            })
        }
    }
}

/// Dispatches the pipeline as a single opaque unit of work.  No retries; a
/// failing pipeline leaves its stage outputs in place for diagnosis.
pub fn dispatch<R: ProcessRunner>(runner: &R, pipeline: &Pipeline) -> Result<i32> {
    info!("Dispatching {}", pipeline.entry.display());
    runner.exec(&pipeline.entry, &pipeline.args, &pipeline.vars)
}
