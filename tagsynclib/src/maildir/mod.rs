/*
 * tagsync - maildir module
 *
 * Copyright 2026 The tagsync authors
 *
 * This file is part of tagsync.
 *
 * tagsync is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * tagsync is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with tagsync. If not, see <http://www.gnu.org/licenses/>.
 */

//! # Maildir folders
//!
//! Discovery of maildir folders below a mail root, according to the maildir
//! specification. <https://cr.yp.to/proto/maildir.html>
//!
//! A *folder* is a directory that contains the three state subdirectories
//! `cur`, `new` and `tmp`. Folders may nest: `work` and `work/sub` are both
//! folders if both contain the state subdirectories. Folders are identified by
//! their path relative to the mail root, which doubles as the notmuch tag that
//! marks membership in the folder.

use std::{
    fmt,
    path::{Component, Path, PathBuf},
};

pub mod copy;
pub mod filename;

#[cfg(test)]
mod tests;

pub use copy::{Copier, FileCopier};
pub use filename::{Flag, UniqueNameGenerator};

use crate::error::{Error, ErrorKind, Result, ResultIntoError};

/// Subdirectory holding messages that have been seen by a mail reader.
pub const CUR: &str = "cur";
/// Subdirectory holding freshly delivered messages.
pub const NEW: &str = "new";
/// Subdirectory holding messages still being delivered.
pub const TMP: &str = "tmp";

/// The reserved state subdirectory names. No folder path component may equal
/// any of these.
pub const STATE_SUBDIRS: [&str; 3] = [CUR, NEW, TMP];

pub fn is_state_subdir_name<S: AsRef<std::ffi::OsStr> + ?Sized>(name: &S) -> bool {
    STATE_SUBDIRS.iter().any(|s| std::ffi::OsStr::new(s) == name.as_ref())
}

/// Does `path` contain all three state subdirectories?
pub fn is_maildir(path: &Path) -> bool {
    STATE_SUBDIRS.iter().all(|sub| path.join(sub).is_dir())
}

/// A maildir folder, as a `/`-separated path relative to the mail root.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Folder(String);

impl Folder {
    /// Validate and wrap a relative folder path.
    pub fn new<S: Into<String>>(path: S) -> Result<Self> {
        let path: String = path.into();
        let trimmed = path.trim_matches('/');
        if trimmed.is_empty() || trimmed == "." {
            return Err(Error::new("The mail root is not a folder of itself.")
                .set_kind(ErrorKind::ValueError));
        }
        for component in trimmed.split('/') {
            if component.is_empty() || component == "." || component == ".." {
                return Err(Error::new(format!(
                    "Folder path `{path}` contains an empty or relative component."
                ))
                .set_kind(ErrorKind::ValueError));
            }
            if is_state_subdir_name(component) {
                return Err(Error::new(format!(
                    "Folder path `{path}` contains reserved maildir name `{component}`."
                ))
                .set_kind(ErrorKind::ValueError));
            }
        }
        Ok(Self(trimmed.to_string()))
    }

    fn from_relative(rel: &Path) -> Option<Self> {
        let mut parts = Vec::new();
        for c in rel.components() {
            match c {
                Component::Normal(part) => parts.push(part.to_str()?),
                Component::CurDir => {}
                _ => return None,
            }
        }
        Self::new(parts.join("/")).ok()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Absolute path of the folder below `root`.
    pub fn fs_path(&self, root: &Path) -> PathBuf {
        let mut ret = root.to_path_buf();
        ret.extend(self.0.split('/'));
        ret
    }

    /// Absolute path of the folder's `cur` subdirectory below `root`.
    pub fn cur_path(&self, root: &Path) -> PathBuf {
        let mut ret = self.fs_path(root);
        ret.push(CUR);
        ret
    }
}

impl fmt::Display for Folder {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "{}", self.0)
    }
}

impl AsRef<str> for Folder {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Derive the folder of a message file by stripping its state subdirectory
/// and file name, relative to `root`.
///
/// Returns `Some(".")` for messages directly inside a root that is itself a
/// maildir, and `None` for files outside of `root`.
pub fn folder_of(file: &Path, root: &Path) -> Option<String> {
    let rel = file.strip_prefix(root).ok()?;
    let mut parts = rel
        .components()
        .filter_map(|c| match c {
            Component::Normal(p) => Some(p.to_str()),
            _ => None,
        })
        .collect::<Option<Vec<&str>>>()?;
    if parts.len() < 2 {
        return None;
    }
    parts.truncate(parts.len() - 2);
    if parts.is_empty() {
        return Some(".".to_string());
    }
    Some(parts.join("/"))
}

/// Recursively discover every folder below `root`, excluding `root` itself.
///
/// Every directory that is not named like a state subdirectory is descended
/// into before it is itself tested, so nested folders are all found. The
/// result is sorted. An empty result means "no folders" and is not an error.
/// Failure to list any directory is an error.
pub fn list_folders(root: &Path) -> Result<Vec<Folder>> {
    let mut folders = Vec::new();
    recurse_folders(root, Path::new(""), &mut folders)?;
    folders.sort();
    Ok(folders)
}

fn recurse_folders(root: &Path, rel: &Path, folders: &mut Vec<Folder>) -> Result<()> {
    let dir = root.join(rel);
    let entries = std::fs::read_dir(&dir)
        .chain_err_summary(|| format!("Could not list directory {}", dir.display()))
        .chain_err_related_path(&dir)?;
    for entry in entries {
        let entry = entry
            .chain_err_summary(|| format!("Could not list directory {}", dir.display()))
            .chain_err_related_path(&dir)?;
        let name = entry.file_name();
        if is_state_subdir_name(&name) {
            continue;
        }
        if !entry
            .file_type()
            .chain_err_related_path(&entry.path())?
            .is_dir()
        {
            continue;
        }
        let child = rel.join(&name);
        recurse_folders(root, &child, folders)?;
        if !is_maildir(&root.join(&child)) {
            continue;
        }
        match Folder::from_relative(&child) {
            Some(folder) => {
                log::trace!("found folder {}", folder);
                folders.push(folder);
            }
            None => {
                log::warn!(
                    "Skipping folder {} because its name is not valid UTF-8.",
                    child.display()
                );
            }
        }
    }
    Ok(())
}
