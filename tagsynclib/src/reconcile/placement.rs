/*
 * tagsync - reconcile module
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

//! Placement reconciler: make file locations follow folder tags.
//!
//! New copies are always materialized before stale ones are pruned, so a
//! message moving from one folder to another is never absent from both.

use std::{
    fs::{self, File, OpenOptions},
    os::unix::fs::OpenOptionsExt,
    path::{Path, PathBuf},
};

use super::{ReconcileContext, ReconcileStats};
use crate::{
    error::{Error, ErrorKind, Result, ResultIntoError},
    index::{MessageEntry, Query, TagIndex},
    maildir::{Copier, FileCopier, Flag, Folder, UniqueNameGenerator},
};

/// Materializes and prunes message files for one run.
///
/// Owns the file name generator and the copier so that their state (the
/// uniqueness counter, whether cloning is still worth trying) lasts for the
/// whole placement phase.
pub struct Placement {
    ctx: ReconcileContext,
    names: UniqueNameGenerator,
    copier: Box<dyn Copier>,
}

impl std::fmt::Debug for Placement {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        fmt.debug_struct(stringify!(Placement))
            .field("ctx", &self.ctx)
            .field("names", &self.names)
            .finish_non_exhaustive()
    }
}

impl Placement {
    pub fn new(ctx: ReconcileContext) -> Self {
        Self {
            ctx,
            names: UniqueNameGenerator::new(),
            copier: Box::new(FileCopier::new()),
        }
    }

    pub fn with_name_generator(mut self, names: UniqueNameGenerator) -> Self {
        self.names = names;
        self
    }

    pub fn with_copier(mut self, copier: Box<dyn Copier>) -> Self {
        self.copier = copier;
        self
    }

    pub fn context(&self) -> &ReconcileContext {
        &self.ctx
    }

    /// Copy every message tagged `folder` that has no file in `folder` into
    /// `folder/cur`. Source files are left in place.
    pub fn move_mails(&mut self, index: &dyn TagIndex, folder: &Folder) -> Result<ReconcileStats> {
        let query = Query::tagged_outside_folder(folder.as_str());
        let entries = search(index, &query)?;
        let mut stats = ReconcileStats::default();
        if entries.is_empty() {
            log::info!("No mails to copy to {}", folder);
            return Ok(stats);
        }
        log::info!("{} mails to copy to {}", entries.len(), folder);

        for entry in entries {
            stats.matched += 1;
            if self.ctx.dry_run {
                log::debug!("Would copy '{}' to '{}'.", entry.display_name(), folder);
                stats.applied += 1;
                continue;
            }
            match self.materialize(&entry, folder) {
                Ok(dest) => {
                    log::debug!(
                        "Copied '{}' to '{}' as {}.",
                        entry.display_name(),
                        folder,
                        dest.display()
                    );
                    stats.applied += 1;
                }
                Err(err) => {
                    log::error!(
                        "Could not copy '{}' to '{}': {}",
                        entry.display_name(),
                        folder,
                        err
                    );
                    stats.failed += 1;
                }
            }
        }
        Ok(stats)
    }

    /// Delete the files in `folder` of every message located there that is
    /// no longer tagged `folder`. Copies in other folders are kept.
    pub fn del_mails(&mut self, index: &dyn TagIndex, folder: &Folder) -> Result<ReconcileStats> {
        let query = Query::in_folder_untagged(folder.as_str());
        let entries = search(index, &query)?;
        let mut stats = ReconcileStats::default();
        if entries.is_empty() {
            log::info!("No mails to remove from {}", folder);
            return Ok(stats);
        }
        log::info!("{} mails to remove from {}", entries.len(), folder);

        let root = self.ctx.root.as_path();
        for entry in entries {
            stats.matched += 1;
            let files = entry
                .files_in_folder(root, folder.as_str())
                .collect::<Vec<&PathBuf>>();
            if files.is_empty() {
                log::error!(
                    "Could not find the file of '{}' in '{}'.",
                    entry.display_name(),
                    folder
                );
                stats.failed += 1;
                continue;
            }
            let mut failed = false;
            for file in files {
                if self.ctx.dry_run {
                    log::debug!(
                        "Would remove '{}' from '{}': {}",
                        entry.display_name(),
                        folder,
                        file.display()
                    );
                    continue;
                }
                log::debug!(
                    "Removing '{}' from '{}': {}",
                    entry.display_name(),
                    folder,
                    file.display()
                );
                if let Err(err) = fs::remove_file(file) {
                    log::error!("Could not remove {}: {}", file.display(), err);
                    failed = true;
                }
            }
            if failed {
                stats.failed += 1;
            } else {
                stats.applied += 1;
            }
        }
        Ok(stats)
    }

    fn materialize(&mut self, entry: &MessageEntry, folder: &Folder) -> Result<PathBuf> {
        let (src_path, mut src) = open_source(entry)?;
        let dest = folder
            .cur_path(&self.ctx.root)
            .join(self.names.filename(Flag::from_tags(entry.tags())));
        let mut dest_file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .mode(0o600)
            .open(&dest)
            .chain_err_summary(|| format!("Could not create {}", dest.display()))
            .chain_err_related_path(&dest)?;
        if let Err(err) = self
            .copier
            .copy(&mut src, &mut dest_file)
            .and_then(|()| dest_file.sync_all())
        {
            drop(dest_file);
            if let Err(rm_err) = fs::remove_file(&dest) {
                log::error!(
                    "Could not remove partially written {}: {}",
                    dest.display(),
                    rm_err
                );
            }
            return Err(Error::from(err)
                .set_summary(format!(
                    "Could not copy {} to {}",
                    src_path.display(),
                    dest.display()
                ))
                .set_related_path(Some(dest)));
        }
        Ok(dest)
    }
}

fn search(index: &dyn TagIndex, query: &Query) -> Result<Vec<MessageEntry>> {
    index
        .search(query)
        .chain_err_summary(|| format!("Could not run query '{}'", query))
}

/// Open the first of the message's files that can be read.
fn open_source(entry: &MessageEntry) -> Result<(&Path, File)> {
    let mut last_err = None;
    for path in &entry.filenames {
        match File::open(path) {
            Ok(f) => return Ok((path.as_path(), f)),
            Err(err) => {
                log::trace!("cannot open {}: {}", path.display(), err);
                last_err = Some(
                    Error::from(err)
                        .set_summary(format!("Could not open {}", path.display()))
                        .set_related_path(Some(path)),
                );
            }
        }
    }
    Err(last_err.unwrap_or_else(|| {
        Error::new(format!("Message {} has no files in the index.", entry.id))
            .set_kind(ErrorKind::NotFound)
    }))
}
