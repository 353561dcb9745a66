//! Pending, completed and failed directory partitions of the input corpus

use crate::io::error::{AverageError, Result};
use std::collections::HashSet;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

/// The three disjoint directories an input filename can live in
#[derive(Clone, Debug)]
pub struct Workspace {
    input_dir: PathBuf,
    completed_dir: PathBuf,
    failed_dir: PathBuf,
    suffix: String,
    stranded: HashSet<OsString>,
}

impl Workspace {
    /// Open the workspace, creating any missing directory
    ///
    /// # Errors
    ///
    /// Returns `FileSystem` if a directory cannot be created
    pub fn open(
        input_dir: &Path,
        completed_dir: &Path,
        failed_dir: &Path,
        suffix: &str,
    ) -> Result<Self> {
        for dir in [input_dir, completed_dir, failed_dir] {
            fs::create_dir_all(dir).map_err(|e| AverageError::FileSystem {
                path: dir.to_path_buf(),
                operation: "create directory",
                source: e,
            })?;
        }

        Ok(Self {
            input_dir: input_dir.to_path_buf(),
            completed_dir: completed_dir.to_path_buf(),
            failed_dir: failed_dir.to_path_buf(),
            suffix: suffix.to_string(),
            stranded: HashSet::new(),
        })
    }

    /// Directory holding pending images
    pub fn input_dir(&self) -> &Path {
        &self.input_dir
    }

    /// Directory holding images whose contribution is persisted
    pub fn completed_dir(&self) -> &Path {
        &self.completed_dir
    }

    /// Directory holding images that could not be summed
    pub fn failed_dir(&self) -> &Path {
        &self.failed_dir
    }

    /// Whether a filename takes part in accumulation
    ///
    /// Hidden files are never eligible.
    pub fn is_eligible(&self, name: &str) -> bool {
        !name.starts_with('.') && name.ends_with(&self.suffix)
    }

    /// Pending names skipped for not being valid UTF-8
    pub const fn stranded(&self) -> &HashSet<OsString> {
        &self.stranded
    }

    /// Up to `limit` eligible pending filenames in sorted order
    ///
    /// Names that are not valid UTF-8 are never eligible. Each one is logged
    /// the first time it is seen and kept in [`Self::stranded`].
    ///
    /// # Errors
    ///
    /// Returns `FileSystem` if the input directory cannot be listed
    pub fn pending(&mut self, limit: usize) -> Result<Vec<String>> {
        let list_error = |e| AverageError::FileSystem {
            path: self.input_dir.clone(),
            operation: "list directory",
            source: e,
        };

        let mut names = Vec::new();
        for entry in fs::read_dir(&self.input_dir).map_err(list_error)? {
            let entry = entry.map_err(list_error)?;
            if !entry.file_type().map_err(list_error)?.is_file() {
                continue;
            }
            let name = match entry.file_name().into_string() {
                Ok(name) => name,
                Err(raw) => {
                    if !self.stranded.contains(&raw) {
                        log::warn!("Skipping pending file with non-UTF-8 name {raw:?}");
                        self.stranded.insert(raw);
                    }
                    continue;
                }
            };
            if self.is_eligible(&name) {
                names.push(name);
            }
        }

        names.sort();
        names.truncate(limit);
        Ok(names)
    }

    /// Move a summed file out of the pending set
    ///
    /// # Errors
    ///
    /// Returns `FileSystem` if the rename fails
    pub fn mark_completed(&self, name: &str) -> Result<()> {
        self.relocate(name, &self.completed_dir)
    }

    /// Move an unusable file out of the pending set
    ///
    /// # Errors
    ///
    /// Returns `FileSystem` if the rename fails
    pub fn mark_failed(&self, name: &str) -> Result<()> {
        self.relocate(name, &self.failed_dir)
    }

    fn relocate(&self, name: &str, target_dir: &Path) -> Result<()> {
        let from = self.input_dir.join(name);
        fs::rename(&from, target_dir.join(name)).map_err(|e| AverageError::FileSystem {
            path: from,
            operation: "relocate",
            source: e,
        })
    }
}
