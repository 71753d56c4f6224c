//! Cache-keyed working directories.
//!
//! Each run configuration hashes to a stable key; the working directory for
//! that key is created lazily under the working root and reused by any later
//! run that hashes to the same key.  A `latest` symlink always points at the
//! most recently resolved directory so a follow-up run can pick up where the
//! last one left off without recomputing the key.
use crate::{
    config::SearchConfig,
    error::{Error, Result},
};
use log::info;
use sha2::{Digest, Sha256};
use std::{
    fs, io,
    path::{Path, PathBuf},
};

/// Name of the "most recent run" alias under the working root.
pub const LATEST_ALIAS: &str = "latest";

/// Hex characters kept from the digest for directory names.
const KEY_LEN: usize = 16;

/// A resolved cache-keyed working directory.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WorkDir {
    pub key: String,
    pub path: PathBuf,
}

/// The stable cache key for a run: a truncated SHA-256 over the ordered
/// input paths and the canonical serialization of the configuration.  Any
/// difference in inputs or configuration changes the key.
pub fn cache_key(inputs: &[&Path], config: &SearchConfig) -> String {
    let mut hasher = Sha256::new();
    for input in inputs {
        hasher.update(input.as_os_str().as_encoded_bytes());
        hasher.update([0u8]);
    }
    let canonical = serde_json::to_string(config).expect("config serialization cannot fail");
    hasher.update(canonical.as_bytes());
    let digest = hex::encode(hasher.finalize());
    digest[..KEY_LEN].to_string()
}

/// Resolves the working directory for this run, creating the root and the
/// keyed directory if needed and repointing the `latest` alias at it.
///
/// With `reuse_latest` the key is read from the existing alias instead of
/// recomputed; this fails with [`Error::NoPriorRun`] when no usable alias
/// exists.  Idempotent: resolving twice yields the same directory and never
/// truncates existing content.
pub fn resolve(
    root: &Path,
    inputs: &[&Path],
    config: &SearchConfig,
    reuse_latest: bool,
) -> Result<WorkDir> {
    ensure_dir(root)?;
    let key = if reuse_latest {
        key_from_alias(root)?
    } else {
        cache_key(inputs, config)
    };
    let path = root.join(&key);
    ensure_dir(&path)?;
    update_alias(root, &key)?;
    Ok(WorkDir { key, path })
}

/// Creates `path` as a directory, tolerating an existing directory.
fn ensure_dir(path: &Path) -> Result<()> {
    match fs::create_dir(path) {
        Ok(()) => {
            info!("Created directory {}", path.display());
            Ok(())
        }
        Err(ref e) if e.kind() == io::ErrorKind::AlreadyExists && path.is_dir() => Ok(()),
        Err(source) => Err(Error::DirectoryCreateError {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Reads the cache key a prior run left in the `latest` alias.
fn key_from_alias(root: &Path) -> Result<String> {
    let no_prior = || Error::NoPriorRun {
        root: root.to_path_buf(),
    };
    let alias = root.join(LATEST_ALIAS);
    let target = fs::read_link(&alias).map_err(|_| no_prior())?;
    let resolved = if target.is_absolute() {
        target.clone()
    } else {
        root.join(&target)
    };
    if !resolved.is_dir() {
        return Err(no_prior());
    }
    target
        .file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .ok_or_else(no_prior)
}

/// Repoints `latest` at `root/key`.  The new link is staged under a
/// temporary name and renamed over the alias, so a concurrent reader sees
/// either the old target or the new one, never a broken alias.
fn update_alias(root: &Path, key: &str) -> Result<()> {
    let alias = root.join(LATEST_ALIAS);
    let staging = root.join(format!(".{LATEST_ALIAS}.staging"));
    let _ = fs::remove_file(&staging);
    std::os::unix::fs::symlink(key, &staging).map_err(|source| Error::Io {
        path: staging.clone(),
        source,
    })?;
    fs::rename(&staging, &alias).map_err(|source| Error::Io {
        path: alias,
        source,
    })
}

#[cfg(test)]
pub mod tests {
    use super::{cache_key, resolve, LATEST_ALIAS};
    use crate::{config::SearchConfig, error::Error};
    use rstest::rstest;
    use std::{fs, path::Path};
    use tempfile::TempDir;

    fn inputs<'a>() -> Vec<&'a Path> {
        vec![Path::new("queryDB"), Path::new("targetDB")]
    }

    #[rstest]
    fn test_cache_key_deterministic() {
        let config = SearchConfig::linsearch_defaults();
        assert_eq!(cache_key(&inputs(), &config), cache_key(&inputs(), &config));
        assert_eq!(cache_key(&inputs(), &config).len(), 16);
    }

    /// Changing any single configuration field changes the key.
    #[rstest]
    fn test_cache_key_sensitive_to_config() {
        let base = SearchConfig::linsearch_defaults();
        let base_key = cache_key(&inputs(), &base);

        let variants: Vec<SearchConfig> = vec![
            {
                let mut c = base.clone();
                c.alignment = crate::config::AlignmentSetting::ScoreOnly;
                c
            },
            {
                let mut c = base.clone();
                c.sensitivity = 1.0;
                c
            },
            {
                let mut c = base.clone();
                c.kmers_per_sequence = 60;
                c
            },
            {
                let mut c = base.clone();
                c.spaced_kmer = false;
                c
            },
            {
                let mut c = base.clone();
                c.evalue = 1e-5;
                c
            },
            {
                let mut c = base.clone();
                c.profile_evalue = 0.5;
                c
            },
            {
                let mut c = base.clone();
                c.min_seq_id = 0.9;
                c
            },
            {
                let mut c = base.clone();
                c.coverage = 0.8;
                c
            },
            {
                let mut c = base.clone();
                c.cov_mode = 2;
                c
            },
            {
                let mut c = base.clone();
                c.max_seqs = 1000;
                c
            },
            {
                let mut c = base.clone();
                c.orf_start_mode = 0;
                c
            },
            {
                let mut c = base.clone();
                c.orf_min_length = 10;
                c
            },
            {
                let mut c = base.clone();
                c.orf_max_length = 100;
                c
            },
            {
                let mut c = base.clone();
                c.translation_table = 11;
                c
            },
            {
                let mut c = base.clone();
                c.threads = 64;
                c
            },
        ];
        for variant in variants {
            assert_ne!(
                cache_key(&inputs(), &variant),
                base_key,
                "key unchanged for {variant:?}"
            );
        }
    }

    #[rstest]
    fn test_cache_key_sensitive_to_input_order() {
        let config = SearchConfig::linsearch_defaults();
        let forward = [Path::new("a"), Path::new("b")];
        let backward = [Path::new("b"), Path::new("a")];
        assert_ne!(cache_key(&forward, &config), cache_key(&backward, &config));
    }

    #[rstest]
    fn test_resolve_idempotent() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("tmp");
        let config = SearchConfig::linsearch_defaults();

        let first = resolve(&root, &inputs(), &config, false).unwrap();
        let marker = first.path.join("marker");
        fs::write(&marker, b"kept").unwrap();

        let second = resolve(&root, &inputs(), &config, false).unwrap();
        assert_eq!(first, second);
        assert_eq!(fs::read(&marker).unwrap(), b"kept");
    }

    #[rstest]
    fn test_resolve_updates_latest_alias() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("tmp");
        let config = SearchConfig::linsearch_defaults();

        let first = resolve(&root, &inputs(), &config, false).unwrap();
        let alias = root.join(LATEST_ALIAS);
        assert_eq!(fs::read_link(&alias).unwrap(), Path::new(&first.key));

        let mut changed = config.clone();
        changed.sensitivity = 1.0;
        let second = resolve(&root, &inputs(), &changed, false).unwrap();
        assert_ne!(first.key, second.key);
        assert_eq!(fs::read_link(&alias).unwrap(), Path::new(&second.key));
    }

    #[rstest]
    fn test_reuse_latest_roundtrip() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("tmp");
        let config = SearchConfig::linsearch_defaults();

        let first = resolve(&root, &inputs(), &config, false).unwrap();

        // A changed configuration with reuse still lands in the prior
        // directory; the key comes from the alias, not the hash.
        let mut changed = config.clone();
        changed.threads = 32;
        let reused = resolve(&root, &inputs(), &changed, true).unwrap();
        assert_eq!(first, reused);
    }

    #[rstest]
    fn test_reuse_latest_without_prior_run() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("tmp");
        let config = SearchConfig::linsearch_defaults();
        let err = resolve(&root, &inputs(), &config, true).unwrap_err();
        assert!(matches!(err, Error::NoPriorRun { .. }));
    }

    /// A dangling alias (target directory removed) counts as no prior run.
    #[rstest]
    fn test_reuse_latest_with_broken_alias() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("tmp");
        let config = SearchConfig::linsearch_defaults();

        let first = resolve(&root, &inputs(), &config, false).unwrap();
        fs::remove_dir_all(&first.path).unwrap();

        let err = resolve(&root, &inputs(), &config, true).unwrap_err();
        assert!(matches!(err, Error::NoPriorRun { .. }));
    }

    #[rstest]
    fn test_root_occupied_by_file() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("tmp");
        fs::write(&root, b"not a directory").unwrap();
        let config = SearchConfig::linsearch_defaults();
        let err = resolve(&root, &inputs(), &config, false).unwrap_err();
        assert!(matches!(err, Error::DirectoryCreateError { .. }));
    }
}
