//! End-to-end search orchestration: classify the inputs, pick a mode,
//! resolve the cache-keyed working directory, assemble the pipeline and
//! dispatch it.
//!
//! All classification and validation happens before any filesystem mutation;
//! once the pipeline is dispatched, failure reporting is entirely its own.
use crate::{
    cache,
    collection::CollectionReader,
    config::SearchConfig,
    dispatch::{self, ProcessRunner},
    error::{Error, Result},
    mode::select_mode,
    pipeline,
};
use log::info;
use std::path::{Path, PathBuf};

/// The three collection paths named on the command line.
#[derive(Clone, Debug)]
pub struct SearchInputs {
    pub query: PathBuf,
    pub target: PathBuf,
    pub result: PathBuf,
}

/// Runs one search end to end, returning the exit status of the dispatched
/// pipeline.
pub fn run_search<C: CollectionReader, R: ProcessRunner>(
    reader: &C,
    runner: &R,
    inputs: &SearchInputs,
    work_root: &Path,
    config: &SearchConfig,
    reuse_latest: bool,
) -> Result<i32> {
    let query_type = reader.detect_type(&inputs.query)?;
    let target_type = reader.detect_type(&inputs.target)?;
    let mode = select_mode(query_type, target_type, config.alignment)?;
    info!("Query is {query_type}, target is {target_type}: {mode} search");

    let index = reader.find_index(&inputs.target);
    if index.is_none() {
        return Err(Error::MissingIndex {
            target: inputs.target.clone(),
        });
    }

    let hash_inputs = [inputs.query.as_path(), inputs.target.as_path()];
    let workdir = cache::resolve(work_root, &hash_inputs, config, reuse_latest)?;
    info!("Working directory {}", workdir.path.display());

    let assembled = pipeline::assemble(
        mode,
        config,
        inputs,
        query_type,
        target_type,
        &workdir,
        index.as_deref(),
    )?;
    dispatch::dispatch(runner, &assembled)
}
