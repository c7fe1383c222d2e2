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

//! Tag reconciler: make folder tags follow file locations.

use super::{ReconcileContext, ReconcileStats};
use crate::{
    error::{Error, ErrorKind, Result, ResultIntoError},
    index::{AccessMode, Query, TagIndex},
    maildir::Folder,
};

fn ensure_writable(index: &dyn TagIndex, ctx: &ReconcileContext) -> Result<()> {
    if !ctx.dry_run && index.mode() == AccessMode::ReadOnly {
        return Err(
            Error::new("Tag reconciliation needs an index opened read-write.")
                .set_kind(ErrorKind::Bug),
        );
    }
    Ok(())
}

fn count(index: &dyn TagIndex, query: &Query) -> Result<u32> {
    index
        .count(query)
        .chain_err_summary(|| format!("Could not run query '{}'", query))
}

/// Add the tag `folder` to every message located in `folder` that lacks it.
pub fn add_tags(
    index: &mut dyn TagIndex,
    folder: &Folder,
    ctx: &ReconcileContext,
) -> Result<ReconcileStats> {
    ensure_writable(index, ctx)?;
    let query = Query::in_folder_untagged(folder.as_str());
    let mut stats = ReconcileStats::default();
    match count(index, &query)? {
        0 => {
            log::info!("No mails to add to {}", folder);
            return Ok(stats);
        }
        n => log::info!("{} mails to tag to {}", n, folder),
    }

    let entries = index
        .search(&query)
        .chain_err_summary(|| format!("Could not run query '{}'", query))?;
    for entry in entries {
        stats.matched += 1;
        log::debug!("Tagging '{}' as '{}'.", entry.display_name(), folder);
        if ctx.dry_run {
            stats.applied += 1;
            continue;
        }
        match index.add_tag(&entry.id, folder.as_str()) {
            Ok(()) => stats.applied += 1,
            Err(err) => {
                log::error!(
                    "Could not tag '{}' as '{}': {}",
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

/// Remove the tag `folder` from every message carrying it that has no file
/// in `folder`.
pub fn del_tags(
    index: &mut dyn TagIndex,
    folder: &Folder,
    ctx: &ReconcileContext,
) -> Result<ReconcileStats> {
    untag(
        index,
        folder.as_str(),
        &Query::tagged_outside_folder(folder.as_str()),
        ctx,
    )
}

/// Remove the transient `new_tag` from every message carrying it, wherever
/// it is located.
pub fn del_new_tag(
    index: &mut dyn TagIndex,
    new_tag: &str,
    ctx: &ReconcileContext,
) -> Result<ReconcileStats> {
    untag(index, new_tag, &Query::tag(new_tag), ctx)
}

fn untag(
    index: &mut dyn TagIndex,
    tag: &str,
    query: &Query,
    ctx: &ReconcileContext,
) -> Result<ReconcileStats> {
    ensure_writable(index, ctx)?;
    let mut stats = ReconcileStats::default();
    match count(index, query)? {
        0 => {
            log::info!("No mails to untag from {}", tag);
            return Ok(stats);
        }
        n => log::info!("{} mails to untag from {}", n, tag),
    }

    let entries = index
        .search(query)
        .chain_err_summary(|| format!("Could not run query '{}'", query))?;
    for entry in entries {
        stats.matched += 1;
        log::debug!("removing tag '{}' from '{}'.", tag, entry.display_name());
        if ctx.dry_run {
            stats.applied += 1;
            continue;
        }
        match index.remove_tag(&entry.id, tag) {
            Ok(()) => stats.applied += 1,
            Err(err) => {
                log::error!(
                    "Could not remove tag '{}' from '{}': {}",
                    tag,
                    entry.display_name(),
                    err
                );
                stats.failed += 1;
            }
        }
    }
    Ok(stats)
}
