//! Search-mode selection.
use crate::{
    collection::CollectionType,
    config::AlignmentSetting,
    error::{Error, Result},
};
use std::fmt;

/// The execution strategy for one run.  Exactly one mode is active per run.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum SearchMode {
    /// Amino-acid or profile search against an amino-acid or profile target.
    Standard,
    /// Nucleotide query against a nucleotide target.
    Nucleotide,
    /// Exactly one side is nucleotide; that side is ORF-extracted and
    /// translated before the inner search.
    Translated,
    /// Standard search scored without gaps.
    Ungapped,
}

impl SearchMode {
    pub fn is_translated(self) -> bool {
        self == SearchMode::Translated
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SearchMode::Standard => "standard",
            SearchMode::Nucleotide => "nucleotide",
            SearchMode::Translated => "translated",
            SearchMode::Ungapped => "ungapped",
        };
        write!(f, "{name}")
    }
}

/// Picks the search mode for a query/target pairing.  Pure function of its
/// inputs; first matching row wins:
///
/// | query      | target     | alignment | result              |
/// |------------|------------|-----------|---------------------|
/// | profile    | profile    | any       | unsupported pairing |
/// | any prof.  | any prof.  | ungapped  | unsupported pairing |
/// | nucleotide | nucleotide | any       | Nucleotide          |
/// | one side nucleotide     | any       | Translated          |
/// | no profile | no profile | ungapped  | Ungapped            |
/// | otherwise  |            |           | Standard            |
pub fn select_mode(
    query: CollectionType,
    target: CollectionType,
    alignment: AlignmentSetting,
) -> Result<SearchMode> {
    if query.is_profile() && target.is_profile() {
        return Err(Error::UnsupportedPairing {
            query,
            target,
            reason: "profile-profile searches are not supported",
        });
    }
    let ungapped = alignment == AlignmentSetting::Ungapped;
    if ungapped && (query.is_profile() || target.is_profile()) {
        return Err(Error::UnsupportedPairing {
            query,
            target,
            reason: "ungapped alignment cannot be used with profile collections",
        });
    }
    if query.is_nucleotide() && target.is_nucleotide() {
        return Ok(SearchMode::Nucleotide);
    }
    if query.is_nucleotide() || target.is_nucleotide() {
        return Ok(SearchMode::Translated);
    }
    if ungapped {
        return Ok(SearchMode::Ungapped);
    }
    Ok(SearchMode::Standard)
}

#[cfg(test)]
pub mod tests {
    use super::{select_mode, SearchMode};
    use crate::{collection::CollectionType, config::AlignmentSetting, error::Error};
    use rstest::rstest;

    use AlignmentSetting::{ScoreCoverage, Ungapped};
    use CollectionType::{AminoAcid, Nucleotide, Profile};

    #[rstest]
    #[case(AminoAcid, AminoAcid, SearchMode::Standard)]
    #[case(Profile, AminoAcid, SearchMode::Standard)]
    #[case(AminoAcid, Profile, SearchMode::Standard)]
    #[case(Nucleotide, Nucleotide, SearchMode::Nucleotide)]
    #[case(Nucleotide, AminoAcid, SearchMode::Translated)]
    #[case(AminoAcid, Nucleotide, SearchMode::Translated)]
    #[case(Nucleotide, Profile, SearchMode::Translated)]
    #[case(Profile, Nucleotide, SearchMode::Translated)]
    fn test_gapped_modes(
        #[case] query: CollectionType,
        #[case] target: CollectionType,
        #[case] expected: SearchMode,
    ) {
        assert_eq!(select_mode(query, target, ScoreCoverage).unwrap(), expected);
    }

    #[rstest]
    #[case(AminoAcid, AminoAcid, SearchMode::Ungapped)]
    #[case(Nucleotide, Nucleotide, SearchMode::Nucleotide)]
    #[case(Nucleotide, AminoAcid, SearchMode::Translated)]
    #[case(AminoAcid, Nucleotide, SearchMode::Translated)]
    fn test_ungapped_setting(
        #[case] query: CollectionType,
        #[case] target: CollectionType,
        #[case] expected: SearchMode,
    ) {
        assert_eq!(select_mode(query, target, Ungapped).unwrap(), expected);
    }

    /// Profile-profile is rejected no matter the alignment setting.
    #[rstest]
    #[case(ScoreCoverage)]
    #[case(Ungapped)]
    fn test_profile_profile_rejected(#[case] alignment: AlignmentSetting) {
        let err = select_mode(Profile, Profile, alignment).unwrap_err();
        assert!(matches!(err, Error::UnsupportedPairing { .. }));
        assert!(err.to_string().contains("profile-profile"));
    }

    /// Ungapped alignment is rejected when either side is a profile.
    #[rstest]
    #[case(Profile, AminoAcid)]
    #[case(AminoAcid, Profile)]
    #[case(Profile, Nucleotide)]
    #[case(Nucleotide, Profile)]
    fn test_ungapped_with_profile_rejected(
        #[case] query: CollectionType,
        #[case] target: CollectionType,
    ) {
        let err = select_mode(query, target, Ungapped).unwrap_err();
        assert!(matches!(err, Error::UnsupportedPairing { .. }));
        assert!(err.to_string().contains("ungapped"));
    }

    /// Every legal combination maps to exactly one mode, deterministically.
    #[rstest]
    fn test_exhaustive_and_deterministic() {
        let types = [AminoAcid, Nucleotide, Profile];
        let settings = [
            AlignmentSetting::ScoreOnly,
            AlignmentSetting::ScoreCoverage,
            AlignmentSetting::ScoreCoverageSeqId,
            AlignmentSetting::Ungapped,
        ];
        for query in types {
            for target in types {
                for alignment in settings {
                    let first = select_mode(query, target, alignment);
                    let second = select_mode(query, target, alignment);
                    match (first, second) {
                        (Ok(a), Ok(b)) => assert_eq!(a, b),
                        (Err(a), Err(b)) => assert_eq!(a.to_string(), b.to_string()),
                        _ => panic!("selection not deterministic for {query}-{target}"),
                    }
                }
            }
        }
    }
}
