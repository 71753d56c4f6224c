//! Collection typing and index discovery.
//!
//! A collection stores its content type in a `.dbtype` sidecar next to the
//! data file: a little-endian 32-bit integer whose low 16 bits encode the
//! type.  The linear index, when built, lives in a `.linidx` sidecar.
use crate::error::{Error, Result};
use serde::Serialize;
use std::{
    fmt, fs,
    path::{Path, PathBuf},
};

/// File extension of the type sidecar.
pub const DBTYPE_EXTENSION: &str = "dbtype";

/// File extension of the pre-built linear index.
pub const INDEX_EXTENSION: &str = "linidx";

/// Content type stored in a collection.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize)]
pub enum CollectionType {
    AminoAcid,
    Nucleotide,
    Profile,
}

impl CollectionType {
    /// Decodes the low 16 bits of a `.dbtype` sidecar value.
    fn from_code(code: u32) -> Option<Self> {
        match code & 0xFFFF {
            0 => Some(CollectionType::AminoAcid),
            1 => Some(CollectionType::Nucleotide),
            2 => Some(CollectionType::Profile),
            _ => None,
        }
    }

    /// The sidecar value for this type.
    pub fn to_code(self) -> u32 {
        match self {
            CollectionType::AminoAcid => 0,
            CollectionType::Nucleotide => 1,
            CollectionType::Profile => 2,
        }
    }

    pub fn is_nucleotide(self) -> bool {
        self == CollectionType::Nucleotide
    }

    pub fn is_profile(self) -> bool {
        self == CollectionType::Profile
    }
}

impl fmt::Display for CollectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CollectionType::AminoAcid => "aminoacid",
            CollectionType::Nucleotide => "nucleotide",
            CollectionType::Profile => "profile",
        };
        write!(f, "{name}")
    }
}

/// Read access to collection metadata and index sidecars.  The default
/// implementation reads the local filesystem; tests substitute their own.
pub trait CollectionReader {
    /// Reports the stored type of the collection at `path`.
    fn detect_type(&self, path: &Path) -> Result<CollectionType>;

    /// Returns the path of the pre-built linear index for `path`, if one
    /// exists.  An empty result is a legal, expected outcome.
    fn find_index(&self, path: &Path) -> Option<PathBuf>;
}

/// Appends `.{extension}` to the full collection name, keeping any existing
/// extension (collections are named `db`, their sidecars `db.dbtype`).
pub fn sidecar_path(path: &Path, extension: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".");
    name.push(extension);
    PathBuf::from(name)
}

/// Reads `.dbtype` and `.linidx` sidecars from the local filesystem.
#[derive(Clone, Copy, Debug, Default)]
pub struct FsCollectionReader;

impl CollectionReader for FsCollectionReader {
    fn detect_type(&self, path: &Path) -> Result<CollectionType> {
        let sidecar = sidecar_path(path, DBTYPE_EXTENSION);
        let unrecognized = || Error::UnrecognizedFormat {
            path: path.to_path_buf(),
        };
        let bytes = fs::read(&sidecar).map_err(|_| unrecognized())?;
        if bytes.len() < 4 {
            return Err(unrecognized());
        }
        let code = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        CollectionType::from_code(code).ok_or_else(unrecognized)
    }

    fn find_index(&self, path: &Path) -> Option<PathBuf> {
        let index = sidecar_path(path, INDEX_EXTENSION);
        index.is_file().then_some(index)
    }
}
