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

//! # Reconciliation
//!
//! Folder membership (where a message's files are) and folder tags (what the
//! index says) are mutated independently by mail clients and sync tools. The
//! reconcilers compute the pairs on which the two disagree and converge them,
//! in one direction each:
//!
//! | operation                      | query                          | effect               |
//! |--------------------------------|--------------------------------|----------------------|
//! | [`tags::add_tags`]             | `folder:"X" NOT tag:"X"`       | add tag `X`          |
//! | [`tags::del_tags`]             | `tag:"X" NOT folder:"X"`       | remove tag `X`       |
//! | [`tags::del_new_tag`]          | `tag:"new"`                    | remove tag `new`     |
//! | [`Placement::move_mails`]      | `tag:"X" NOT folder:"X"`       | copy file into `X`   |
//! | [`Placement::del_mails`]       | `folder:"X" NOT tag:"X"`       | delete file in `X`   |
//!
//! Failure to run a query is fatal and returned as an error. Failure to
//! process one message is logged and counted in [`ReconcileStats::failed`].
//! In dry-run mode every query still runs and every intended action is
//! logged, but nothing is mutated.

use std::{
    fmt,
    ops::AddAssign,
    path::{Path, PathBuf},
};

pub mod placement;
pub mod tags;

pub use placement::Placement;

/// Shared parameters of every reconciliation operation.
#[derive(Clone, Debug)]
pub struct ReconcileContext {
    /// The mail root, which is also the index root.
    pub root: PathBuf,
    pub dry_run: bool,
}

impl ReconcileContext {
    pub fn new<P: Into<PathBuf>>(root: P, dry_run: bool) -> Self {
        Self {
            root: root.into(),
            dry_run,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Outcome counts of one reconciliation operation.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ReconcileStats {
    /// Messages returned by the query.
    pub matched: u32,
    /// Messages the effect was applied to (or would be, in dry-run mode).
    pub applied: u32,
    /// Messages skipped because of a recovered error.
    pub failed: u32,
}

impl ReconcileStats {
    pub fn is_noop(&self) -> bool {
        self.matched == 0
    }
}

impl AddAssign for ReconcileStats {
    fn add_assign(&mut self, other: Self) {
        self.matched += other.matched;
        self.applied += other.applied;
        self.failed += other.failed;
    }
}

impl fmt::Display for ReconcileStats {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(
            fmt,
            "{} matched, {} applied, {} failed",
            self.matched, self.applied, self.failed
        )
    }
}
