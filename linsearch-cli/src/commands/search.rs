use super::command::{Command, ValueEnum};
use anyhow::Result;
use clap::{
    builder::{PossibleValuesParser, TypedValueParser as _},
    Parser,
};
use linsearch::{
    collection::FsCollectionReader,
    config::{AlignmentSetting, SearchConfig},
    dispatch::ShellRunner,
    error::Error,
    search::{run_search, SearchInputs},
};
use log::{error, info};
use std::path::PathBuf;

impl ValueEnum for AlignmentSetting {
    fn variants<'a>() -> &'a [Self] {
        &[
            Self::ScoreOnly,
            Self::ScoreCoverage,
            Self::ScoreCoverageSeqId,
            Self::Ungapped,
        ]
    }
}

/// Searches a query collection against a pre-indexed target collection.
///
/// The query and target may each hold nucleotide sequences, amino-acid
/// sequences or profiles; the search strategy is picked from the pairing.
/// When exactly one side is nucleotide, open reading frames are extracted
/// and translated on that side before the amino-acid search runs.
/// Profile-profile pairings are not supported, and ungapped alignment
/// cannot be combined with profiles on either side.
///
/// The target must already carry a linear index; build one with
/// `createlinindex` before searching.
///
/// Intermediate results live in a working directory under <WORK_ROOT>,
/// keyed by a hash of the inputs and the full parameter set, so an
/// interrupted run with identical parameters resumes from the finished
/// stages.  `--reuse-latest` resumes in the most recent working directory
/// regardless of the current parameters.
#[derive(Parser, Debug, Clone)]
#[clap(version, term_width = 0)]
pub struct Search {
    /// The query collection of sequences or profiles.
    #[clap(display_order = 1)]
    query: PathBuf,

    /// The target collection to search against (must be indexed).
    #[clap(display_order = 2)]
    target: PathBuf,

    /// The result collection to create.
    #[clap(display_order = 3)]
    result: PathBuf,

    /// The working root holding cache-keyed run directories.
    #[clap(display_order = 4)]
    work_root: PathBuf,

    /// How alignments are scored and accepted.
    #[clap(
        long,
        short = 'a',
        value_parser = PossibleValuesParser::new(AlignmentSetting::possible_values())
            .map(|s| s.parse::<AlignmentSetting>().unwrap()),
        default_value_t = AlignmentSetting::ScoreCoverage,
        ignore_case = true,
        display_order = 5
    )]
    alignment: AlignmentSetting,

    /// Sensitivity of the k-mer search; higher is slower and more sensitive.
    #[clap(long, short = 's', default_value = "5.7", display_order = 6)]
    sensitivity: f64,

    /// K-mers sampled per sequence during the k-mer search.
    #[clap(long, default_value = "21", display_order = 7)]
    kmers_per_sequence: usize,

    /// Use spaced k-mer patterns.
    #[clap(long, default_value = "true", display_order = 8)]
    spaced_kmer: bool,

    /// E-value threshold for reported matches.
    #[clap(long, short = 'e', default_value = "0.001", display_order = 9)]
    evalue: f64,

    /// E-value threshold when the query side is a profile.
    #[clap(long, default_value = "0.1", display_order = 10)]
    profile_evalue: f64,

    /// Minimum sequence identity to accept an alignment.
    #[clap(long, default_value = "0.0", display_order = 11)]
    min_seq_id: f64,

    /// Minimum coverage of query and target.
    #[clap(long, short = 'c', default_value = "0.0", display_order = 12)]
    coverage: f64,

    /// Coverage mode (0: bidirectional, 1: target, 2: query).
    #[clap(long, default_value = "0", display_order = 13)]
    cov_mode: u8,

    /// Maximum matches per query passed to the alignment stage.
    #[clap(long, default_value = "300", display_order = 14)]
    max_seqs: usize,

    /// ORF start mode (0: first codon only, 1: any sense codon).
    #[clap(long, default_value = "1", display_order = 15)]
    orf_start_mode: u8,

    /// Minimum open-reading-frame length in codons.
    #[clap(long, default_value = "30", display_order = 16)]
    orf_min_length: usize,

    /// Maximum open-reading-frame length in codons.
    #[clap(long, default_value = "32734", display_order = 17)]
    orf_max_length: usize,

    /// NCBI translation table for nucleotide sides.
    #[clap(long, default_value = "1", display_order = 18)]
    translation_table: u8,

    /// The number of threads to use.
    #[clap(long, short = 't', default_value = "2", display_order = 19)]
    threads: usize,

    /// Resume in the most recent working directory instead of hashing the
    /// current parameters.
    #[clap(long, default_value = "false", display_order = 20)]
    reuse_latest: bool,
}

impl Search {
    /// Executes the search command.  On success the process exits with the
    /// status of the dispatched pipeline and never returns here.
    pub fn execute(&self) -> Result<()> {
        let config = self.to_config();
        info!("Query collection {}", self.query.display());
        info!("Target collection {}", self.target.display());
        info!(
            "Alignment {}, sensitivity {}, e-value {}, threads {}",
            config.alignment, config.sensitivity, config.evalue, config.threads
        );

        let inputs = SearchInputs {
            query: self.query.clone(),
            target: self.target.clone(),
            result: self.result.clone(),
        };
        let status = match run_search(
            &FsCollectionReader,
            &ShellRunner,
            &inputs,
            &self.work_root,
            &config,
            self.reuse_latest,
        ) {
            Ok(status) => status,
            // The pipeline's own failure status becomes ours; everything
            // else is a fatal orchestration error.
            Err(err @ Error::ExitFailure { .. }) => {
                error!("{err}");
                err.exit_status()
            }
            Err(err) => return Err(err.into()),
        };
        // The pipeline owns the outcome from here on.
        std::process::exit(status);
    }

    /// Overlays the command-line overrides on the domain defaults.
    fn to_config(&self) -> SearchConfig {
        let mut config = SearchConfig::linsearch_defaults();
        config.alignment = self.alignment;
        config.sensitivity = self.sensitivity;
        config.kmers_per_sequence = self.kmers_per_sequence;
        config.spaced_kmer = self.spaced_kmer;
        config.evalue = self.evalue;
        config.profile_evalue = self.profile_evalue;
        config.min_seq_id = self.min_seq_id;
        config.coverage = self.coverage;
        config.cov_mode = self.cov_mode;
        config.max_seqs = self.max_seqs;
        config.orf_start_mode = self.orf_start_mode;
        config.orf_min_length = self.orf_min_length;
        config.orf_max_length = self.orf_max_length;
        config.translation_table = self.translation_table;
        config.threads = self.threads;
        config
    }
}

impl Command for Search {
    fn execute(&self) -> Result<()> {
        Search::execute(self)
    }
}
