//! Pipeline assembly: stage variable wiring and the generated entry scripts.
//!
//! The assembler writes a fixed, versioned script template into the working
//! directory and wires per-stage parameter strings into it as named
//! variables.  The wiring is plain data on [`Pipeline`] so tests can inspect
//! it; the dispatcher maps it into the child environment at exec time.
use crate::{
    cache::WorkDir,
    collection::CollectionType,
    config::{AlignmentSetting, SearchConfig},
    error::{Error, Result},
    mode::SearchMode,
    search::SearchInputs,
};
use std::{
    fs,
    os::unix::fs::PermissionsExt,
    path::{Path, PathBuf},
};

/// Script name of the single-stage search.
pub const SEARCH_SCRIPT: &str = "linsearch.sh";

/// Script name of the translated-search wrapper.
pub const TRANSLATED_SCRIPT: &str = "translated_search.sh";

const SEARCH_SCRIPT_TEXT: &str = r#"#!/bin/sh -e
# linsearch single-stage search, template v1.
# Positional: <queryDB> <targetDB> <resultDB> <tmpDir>
# Variables: TARGET_INDEX ALIGN_ENGINE KMERSEARCH_PAR ALIGNMENT_PAR
#            SWAPRESULT_PAR [NUCL]
fail() {
    echo "$1" >&2
    exit 1
}

notexists() {
    [ ! -f "$1.dbtype" ]
}

[ "$#" -ne 4 ] && fail "usage: linsearch.sh <queryDB> <targetDB> <resultDB> <tmpDir>"
QUERY="$1"
TARGET="$2"
RESULT="$3"
TMP="$4"

if notexists "${TMP}/pref"; then
    # shellcheck disable=SC2086
    kmersearch "${QUERY}" "${TARGET_INDEX}" "${TMP}/pref" ${KMERSEARCH_PAR} \
        || fail "kmer search died"
fi

if notexists "${TMP}/aln"; then
    if [ "${ALIGN_ENGINE}" = "ungapped" ]; then
        # shellcheck disable=SC2086
        rescorediagonal "${QUERY}" "${TARGET}" "${TMP}/pref" "${TMP}/aln" ${ALIGNMENT_PAR} \
            || fail "ungapped rescore died"
    else
        # shellcheck disable=SC2086
        align "${QUERY}" "${TARGET}" "${TMP}/pref" "${TMP}/aln" ${ALIGNMENT_PAR} \
            || fail "alignment died"
    fi
fi

if notexists "${RESULT}"; then
    if [ -n "${NUCL}" ]; then
        # shellcheck disable=SC2086
        offsetalignment "${QUERY}" "${QUERY}" "${TARGET}" "${TARGET}" "${TMP}/aln" "${RESULT}" ${SWAPRESULT_PAR} \
            || fail "strand offset died"
    else
        # shellcheck disable=SC2086
        swapresults "${QUERY}" "${TARGET}" "${TMP}/aln" "${RESULT}" ${SWAPRESULT_PAR} \
            || fail "result swap died"
    fi
fi
"#;

const TRANSLATED_SCRIPT_TEXT: &str = r#"#!/bin/sh -e
# linsearch translated-search wrapper, template v1.
# Positional: <queryDB> <targetDB> <resultDB> <tmpDir>
# Variables: SEARCH ORF_PAR TRANSLATE_PAR OFFSETALIGNMENT_PAR
#            [QUERY_NUCL] [TARGET_NUCL] [NO_TARGET_INDEX]
fail() {
    echo "$1" >&2
    exit 1
}

notexists() {
    [ ! -f "$1.dbtype" ]
}

[ "$#" -ne 4 ] && fail "usage: translated_search.sh <queryDB> <targetDB> <resultDB> <tmpDir>"
QUERY="$1"
TARGET="$2"
RESULT="$3"
TMP="$4"

QUERY_AA="${QUERY}"
TARGET_AA="${TARGET}"

if [ -n "${QUERY_NUCL}" ]; then
    if notexists "${TMP}/q_orfs_aa"; then
        # shellcheck disable=SC2086
        extractorfs "${QUERY}" "${TMP}/q_orfs" ${ORF_PAR} \
            || fail "query orf extraction died"
        # shellcheck disable=SC2086
        translatenucs "${TMP}/q_orfs" "${TMP}/q_orfs_aa" ${TRANSLATE_PAR} \
            || fail "query translation died"
    fi
    QUERY_AA="${TMP}/q_orfs_aa"
fi

if [ -n "${TARGET_NUCL}" ] && [ -n "${NO_TARGET_INDEX}" ]; then
    # No pre-built index: translate the target too and let the inner search
    # build its prefilter data inline.
    if notexists "${TMP}/t_orfs_aa"; then
        # shellcheck disable=SC2086
        extractorfs "${TARGET}" "${TMP}/t_orfs" ${ORF_PAR} \
            || fail "target orf extraction died"
        # shellcheck disable=SC2086
        translatenucs "${TMP}/t_orfs" "${TMP}/t_orfs_aa" ${TRANSLATE_PAR} \
            || fail "target translation died"
    fi
    TARGET_AA="${TMP}/t_orfs_aa"
fi

if notexists "${TMP}/aln_aa"; then
    sh "${SEARCH}" "${QUERY_AA}" "${TARGET_AA}" "${TMP}/aln_aa" "${TMP}" \
        || fail "inner search died"
fi

if notexists "${RESULT}"; then
    # shellcheck disable=SC2086
    offsetalignment "${QUERY}" "${QUERY_AA}" "${TARGET}" "${TARGET_AA}" "${TMP}/aln_aa" "${RESULT}" ${OFFSETALIGNMENT_PAR} \
        || fail "offset alignment died"
fi
"#;

/// Named variables wired into the pipeline stages, inspectable as data.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct StageVars {
    vars: Vec<(&'static str, String)>,
}

impl StageVars {
    pub fn set(&mut self, name: &'static str, value: impl Into<String>) {
        self.vars.push((name, value.into()));
    }

    /// Sets `name` to `TRUE` when `on`; an off flag is absent, not empty.
    pub fn set_flag(&mut self, name: &'static str, on: bool) {
        if on {
            self.set(name, "TRUE");
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.vars.iter().map(|(n, v)| (*n, v.as_str()))
    }
}

/// The assembled, dispatch-ready pipeline: one entry script, its positional
/// arguments and the stage variable wiring.
#[derive(Clone, Debug)]
pub struct Pipeline {
    pub entry: PathBuf,
    pub args: Vec<PathBuf>,
    pub vars: StageVars,
}

/// Builds the pipeline for `mode`, writing the entry script(s) into the
/// working directory.  Requires a pre-built target index; fails with
/// [`Error::MissingIndex`] otherwise.  Re-assembly overwrites prior scripts
/// of the same name.
///
/// Because of the index requirement, the `NO_TARGET_INDEX` flag in the
/// translated branch is never set in an assembled pipeline; the wrapper
/// script still honors it (translating the target inline) when run by hand
/// against an unindexed target.
pub fn assemble(
    mode: SearchMode,
    config: &SearchConfig,
    inputs: &SearchInputs,
    query_type: CollectionType,
    target_type: CollectionType,
    workdir: &WorkDir,
    index: Option<&Path>,
) -> Result<Pipeline> {
    let has_index = index.is_some();
    let Some(index) = index else {
        return Err(Error::MissingIndex {
            target: inputs.target.clone(),
        });
    };

    let mut vars = StageVars::default();
    vars.set("TARGET_INDEX", index.display().to_string());
    // The engine follows the alignment setting, not the mode: a nucleotide
    // or translated search still rescores ungapped when asked to.
    vars.set(
        "ALIGN_ENGINE",
        if config.alignment == AlignmentSetting::Ungapped {
            "ungapped"
        } else {
            "full"
        },
    );
    vars.set("KMERSEARCH_PAR", config.kmersearch_args());
    vars.set("ALIGNMENT_PAR", config.alignment_args());
    vars.set("SWAPRESULT_PAR", config.swapresult_args());
    if mode == SearchMode::Nucleotide {
        vars.set("NUCL", "1");
    }

    let search_script = workdir.path.join(SEARCH_SCRIPT);
    write_script(&search_script, SEARCH_SCRIPT_TEXT)?;
    let mut entry = search_script.clone();

    if mode.is_translated() {
        vars.set_flag("NO_TARGET_INDEX", !has_index);
        vars.set_flag("QUERY_NUCL", query_type.is_nucleotide());
        vars.set_flag("TARGET_NUCL", target_type.is_nucleotide());
        vars.set("ORF_PAR", config.orf_args());
        vars.set("OFFSETALIGNMENT_PAR", config.threads_args());
        vars.set("TRANSLATE_PAR", config.translate_args());
        vars.set("SEARCH", search_script.display().to_string());

        let translated_script = workdir.path.join(TRANSLATED_SCRIPT);
        write_script(&translated_script, TRANSLATED_SCRIPT_TEXT)?;
        entry = translated_script;
    }

    Ok(Pipeline {
        entry,
        args: vec![
            inputs.query.clone(),
            inputs.target.clone(),
            inputs.result.clone(),
            workdir.path.clone(),
        ],
        vars,
    })
}

fn write_script(path: &Path, text: &str) -> Result<()> {
    let io_error = |source| Error::Io {
        path: path.to_path_buf(),
        source,
    };
    fs::write(path, text).map_err(io_error)?;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).map_err(io_error)
}
