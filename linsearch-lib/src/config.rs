//! The effective configuration for one search run and the per-stage
//! parameter groups rendered from it.
//!
//! Configuration is built once by overlaying user overrides on the
//! [`SearchConfig::linsearch_defaults`] preset and is read-only afterwards.
use itertools::Itertools;
use serde::Serialize;
use std::{fmt, str::FromStr};

/// How alignments are scored and accepted.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize)]
pub enum AlignmentSetting {
    /// Score only.
    ScoreOnly,
    /// Score and coverage.
    ScoreCoverage,
    /// Score, coverage and sequence identity.
    ScoreCoverageSeqId,
    /// Ungapped rescoring along the best diagonal.
    Ungapped,
}

impl AlignmentSetting {
    /// The numeric mode passed to the alignment stage.
    pub fn mode_code(self) -> u8 {
        match self {
            AlignmentSetting::ScoreOnly => 1,
            AlignmentSetting::ScoreCoverage => 2,
            AlignmentSetting::ScoreCoverageSeqId => 3,
            AlignmentSetting::Ungapped => 4,
        }
    }
}

impl fmt::Display for AlignmentSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AlignmentSetting::ScoreOnly => "score-only",
            AlignmentSetting::ScoreCoverage => "score-coverage",
            AlignmentSetting::ScoreCoverageSeqId => "score-coverage-seqid",
            AlignmentSetting::Ungapped => "ungapped",
        };
        write!(f, "{name}")
    }
}

impl FromStr for AlignmentSetting {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "score-only" => Ok(AlignmentSetting::ScoreOnly),
            "score-coverage" => Ok(AlignmentSetting::ScoreCoverage),
            "score-coverage-seqid" => Ok(AlignmentSetting::ScoreCoverageSeqId),
            "ungapped" => Ok(AlignmentSetting::Ungapped),
            _ => Err(format!("unknown alignment setting: {s}")),
        }
    }
}

/// The full set of resolved parameters for one run.  Serialization order is
/// the declaration order below and is part of the cache-key contract.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SearchConfig {
    pub alignment: AlignmentSetting,
    pub sensitivity: f64,
    pub kmers_per_sequence: usize,
    pub spaced_kmer: bool,
    pub evalue: f64,
    pub profile_evalue: f64,
    pub min_seq_id: f64,
    pub coverage: f64,
    pub cov_mode: u8,
    pub max_seqs: usize,
    pub orf_start_mode: u8,
    pub orf_min_length: usize,
    pub orf_max_length: usize,
    pub translation_table: u8,
    pub threads: usize,
}

impl SearchConfig {
    /// The domain defaults applied before any user override.
    pub fn linsearch_defaults() -> Self {
        SearchConfig {
            alignment: AlignmentSetting::ScoreCoverage,
            sensitivity: 5.7,
            kmers_per_sequence: 21,
            spaced_kmer: true,
            evalue: 0.001,
            profile_evalue: 0.1,
            min_seq_id: 0.0,
            coverage: 0.0,
            cov_mode: 0,
            max_seqs: 300,
            orf_start_mode: 1,
            orf_min_length: 30,
            orf_max_length: 32734,
            translation_table: 1,
            threads: 2,
        }
    }

    /// Parameters for the k-mer search stage.
    pub fn kmersearch_args(&self) -> String {
        [
            format!("-s {}", self.sensitivity),
            format!("--kmer-per-seq {}", self.kmers_per_sequence),
            format!("--spaced-kmer-mode {}", u8::from(self.spaced_kmer)),
            format!("--max-seqs {}", self.max_seqs),
            format!("--threads {}", self.threads),
        ]
        .iter()
        .join(" ")
    }

    /// Parameters for the alignment stage.
    pub fn alignment_args(&self) -> String {
        [
            format!("--alignment-mode {}", self.alignment.mode_code()),
            format!("-e {}", self.evalue),
            format!("--e-profile {}", self.profile_evalue),
            format!("--min-seq-id {}", self.min_seq_id),
            format!("-c {}", self.coverage),
            format!("--cov-mode {}", self.cov_mode),
            format!("--threads {}", self.threads),
        ]
        .iter()
        .join(" ")
    }

    /// Parameters for the result-merge stage.
    pub fn swapresult_args(&self) -> String {
        [
            format!("-e {}", self.evalue),
            format!("--max-seqs {}", self.max_seqs),
            format!("--threads {}", self.threads),
        ]
        .iter()
        .join(" ")
    }

    /// Parameters for the open-reading-frame extraction stage.
    pub fn orf_args(&self) -> String {
        [
            format!("--min-length {}", self.orf_min_length),
            format!("--max-length {}", self.orf_max_length),
            format!("--orf-start-mode {}", self.orf_start_mode),
            format!("--threads {}", self.threads),
        ]
        .iter()
        .join(" ")
    }

    /// Parameters for the nucleotide translation stage.
    pub fn translate_args(&self) -> String {
        [
            format!("--translation-table {}", self.translation_table),
            format!("--threads {}", self.threads),
        ]
        .iter()
        .join(" ")
    }

    /// Parameters for stages that only take a thread count.
    pub fn threads_args(&self) -> String {
        format!("--threads {}", self.threads)
    }
}

#[cfg(test)]
pub mod tests {
    use super::{AlignmentSetting, SearchConfig};
    use rstest::rstest;

    #[rstest]
    fn test_defaults_preset() {
        let config = SearchConfig::linsearch_defaults();
        assert_eq!(config.alignment, AlignmentSetting::ScoreCoverage);
        assert!((config.sensitivity - 5.7).abs() < f64::EPSILON);
        assert!((config.evalue - 0.001).abs() < f64::EPSILON);
        assert!((config.profile_evalue - 0.1).abs() < f64::EPSILON);
        assert!(config.spaced_kmer);
        assert_eq!(config.orf_start_mode, 1);
        assert_eq!(config.orf_min_length, 30);
        assert_eq!(config.orf_max_length, 32734);
    }

    /// Overrides compose on top of the preset without touching other fields.
    #[rstest]
    fn test_override_on_preset() {
        let mut config = SearchConfig::linsearch_defaults();
        config.sensitivity = 7.5;
        config.threads = 16;
        assert!((config.sensitivity - 7.5).abs() < f64::EPSILON);
        assert_eq!(config.threads, 16);
        assert!((config.evalue - 0.001).abs() < f64::EPSILON);
    }

    #[rstest]
    fn test_kmersearch_args() {
        let config = SearchConfig::linsearch_defaults();
        assert_eq!(
            config.kmersearch_args(),
            "-s 5.7 --kmer-per-seq 21 --spaced-kmer-mode 1 --max-seqs 300 --threads 2"
        );
    }

    #[rstest]
    fn test_alignment_args() {
        let mut config = SearchConfig::linsearch_defaults();
        config.alignment = AlignmentSetting::Ungapped;
        assert_eq!(
            config.alignment_args(),
            "--alignment-mode 4 -e 0.001 --e-profile 0.1 --min-seq-id 0 -c 0 --cov-mode 0 --threads 2"
        );
    }

    /// The profile e-value flows into the dispatched stage parameters, not
    /// just the cache key.
    #[rstest]
    fn test_profile_evalue_reaches_alignment_args() {
        let mut config = SearchConfig::linsearch_defaults();
        let before = config.alignment_args();
        config.profile_evalue = 0.5;
        let after = config.alignment_args();
        assert_ne!(before, after);
        assert!(after.contains("--e-profile 0.5"));
    }

    #[rstest]
    fn test_orf_and_translate_args() {
        let config = SearchConfig::linsearch_defaults();
        assert_eq!(
            config.orf_args(),
            "--min-length 30 --max-length 32734 --orf-start-mode 1 --threads 2"
        );
        assert_eq!(config.translate_args(), "--translation-table 1 --threads 2");
        assert_eq!(config.threads_args(), "--threads 2");
    }

    #[rstest]
    #[case("score-only", AlignmentSetting::ScoreOnly)]
    #[case("score-coverage", AlignmentSetting::ScoreCoverage)]
    #[case("Score-Coverage-SeqId", AlignmentSetting::ScoreCoverageSeqId)]
    #[case("UNGAPPED", AlignmentSetting::Ungapped)]
    fn test_alignment_setting_from_str(#[case] input: &str, #[case] expected: AlignmentSetting) {
        assert_eq!(input.parse::<AlignmentSetting>().unwrap(), expected);
        assert_eq!(expected.to_string().parse::<AlignmentSetting>(), Ok(expected));
    }
}
