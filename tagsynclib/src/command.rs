/*
 * tagsync - command module
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

//! # Commands and phases
//!
//! The user names commands; each command stands for a set of [`Phases`].
//! Whatever the combination, the [`Orchestrator`] runs the requested phases
//! in one fixed order:
//!
//! 1. `list`: print the folders and stop.
//! 2. placement: `copy` for every folder, then `rm` for every folder, on a
//!    read-only index handle.
//! 3. `sync`: the external mail sync command.
//! 4. `notmuch`: the external reindex command.
//! 5. tags: `add` and `del` for every folder, then `deln`, on a read-write
//!    index handle.
//!
//! The two index handles are never open at the same time.

use std::{fmt, io::Write, str::FromStr};

use bitflags::bitflags;

use crate::{
    conf::Settings,
    error::{Error, ErrorKind, Result, ResultIntoError},
    index::{AccessMode, IndexOpener},
    maildir::{self, Folder},
    process::{run_phase_command, CommandOutcome},
    reconcile::{tags, Placement, ReconcileContext, ReconcileStats},
};

bitflags! {
    #[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
    pub struct Phases: u8 {
        const LIST           = 1 << 0;
        const ADD_TAGS       = 1 << 1;
        const DEL_TAGS       = 1 << 2;
        const DEL_NEW        = 1 << 3;
        const COPY_CHANGED   = 1 << 4;
        const RM_CHANGED     = 1 << 5;
        const NOTMUCH_UPDATE = 1 << 6;
        const MAILS_SYNC     = 1 << 7;

        const PRE  = Self::COPY_CHANGED.bits() | Self::RM_CHANGED.bits();
        const POST = Self::ADD_TAGS.bits() | Self::DEL_TAGS.bits() | Self::DEL_NEW.bits();
        const ALL  = !Self::LIST.bits();
    }
}

impl Phases {
    pub fn from_commands<'c, I>(commands: I) -> Self
    where
        I: IntoIterator<Item = &'c CommandName>,
    {
        commands
            .into_iter()
            .fold(Self::empty(), |acc, c| acc | c.phases())
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum CommandName {
    All,
    List,
    Pre,
    Post,
    Add,
    Del,
    Deln,
    Copy,
    Rm,
    Notmuch,
    Sync,
}

impl CommandName {
    pub const COMMANDS: [Self; 11] = [
        Self::All,
        Self::List,
        Self::Pre,
        Self::Post,
        Self::Add,
        Self::Del,
        Self::Deln,
        Self::Copy,
        Self::Rm,
        Self::Notmuch,
        Self::Sync,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::List => "list",
            Self::Pre => "pre",
            Self::Post => "post",
            Self::Add => "add",
            Self::Del => "del",
            Self::Deln => "deln",
            Self::Copy => "copy",
            Self::Rm => "rm",
            Self::Notmuch => "notmuch",
            Self::Sync => "sync",
        }
    }

    pub const fn help(self) -> &'static str {
        match self {
            Self::All => "Run everything but list",
            Self::List => "List labels (exclusive with everything else)",
            Self::Pre => "Update mail files from tags (equivalent to copy+rm)",
            Self::Post => "Update tags from mail files (equivalent to add+del+deln)",
            Self::Add => "Add missing tags",
            Self::Del => "Remove tags from displaced/removed mails",
            Self::Deln => "Remove any 'new' tags",
            Self::Copy => "Copy mails with new tags",
            Self::Rm => "Remove mails missing tags from directory",
            Self::Notmuch => "Launch 'notmuch new'",
            Self::Sync => "Launch sync command",
        }
    }

    pub const fn phases(self) -> Phases {
        match self {
            Self::All => Phases::ALL,
            Self::List => Phases::LIST,
            Self::Pre => Phases::PRE,
            Self::Post => Phases::POST,
            Self::Add => Phases::ADD_TAGS,
            Self::Del => Phases::DEL_TAGS,
            Self::Deln => Phases::DEL_NEW,
            Self::Copy => Phases::COPY_CHANGED,
            Self::Rm => Phases::RM_CHANGED,
            Self::Notmuch => Phases::NOTMUCH_UPDATE,
            Self::Sync => Phases::MAILS_SYNC,
        }
    }

    /// `Available commands:` block for `--help`.
    pub fn help_text() -> String {
        let mut ret = String::from("AVAILABLE COMMANDS:\n");
        for c in Self::COMMANDS {
            ret.push_str(&format!("    {:<8} {}\n", c.name(), c.help()));
        }
        ret
    }
}

impl fmt::Display for CommandName {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "{}", self.name())
    }
}

impl FromStr for CommandName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::COMMANDS
            .into_iter()
            .find(|c| c.name() == s)
            .ok_or_else(|| {
                Error::new(format!("Unknown command: '{s}'")).set_kind(ErrorKind::ValueError)
            })
    }
}

/// What a run did.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RunReport {
    pub folders: Vec<Folder>,
    pub listed: bool,
    pub copied: ReconcileStats,
    pub removed: ReconcileStats,
    pub sync: Option<CommandOutcome>,
    pub reindex: Option<CommandOutcome>,
    pub tagged: ReconcileStats,
    pub untagged: ReconcileStats,
    pub new_untagged: ReconcileStats,
}

impl RunReport {
    /// Per-message failures over the whole run.
    pub fn failed(&self) -> u32 {
        self.copied.failed
            + self.removed.failed
            + self.tagged.failed
            + self.untagged.failed
            + self.new_untagged.failed
    }

    fn log(&self, phases: Phases) {
        for (phase, label, stats) in [
            (Phases::COPY_CHANGED, "copy", &self.copied),
            (Phases::RM_CHANGED, "rm", &self.removed),
            (Phases::ADD_TAGS, "add", &self.tagged),
            (Phases::DEL_TAGS, "del", &self.untagged),
            (Phases::DEL_NEW, "deln", &self.new_untagged),
        ] {
            if phases.contains(phase) {
                log::info!("{label}: {stats}");
            }
        }
    }
}

/// Runs requested phases over every folder of one mail root.
#[derive(Debug)]
pub struct Orchestrator<'s> {
    settings: &'s Settings,
    phases: Phases,
    placement: Option<Placement>,
}

impl<'s> Orchestrator<'s> {
    pub fn new(settings: &'s Settings, phases: Phases) -> Self {
        Self {
            settings,
            phases,
            placement: None,
        }
    }

    /// Use `placement` instead of a default [`Placement`] for the placement
    /// phase.
    pub fn with_placement(mut self, placement: Placement) -> Self {
        self.placement = Some(placement);
        self
    }

    /// Run. Folder names requested with `list` are written to `out`.
    pub fn run(self, opener: &mut dyn IndexOpener, out: &mut dyn Write) -> Result<RunReport> {
        let Self {
            settings,
            phases,
            placement,
        } = self;
        let root = settings.database.as_path();
        let ctx = ReconcileContext::new(root, settings.dry_run);
        if ctx.dry_run {
            log::info!("Dry run: nothing will be modified.");
        }

        let mut report = RunReport {
            folders: maildir::list_folders(root)
                .chain_err_summary(|| format!("Could not scan mail root {}", root.display()))?,
            ..RunReport::default()
        };
        log::debug!("{} folders under {}", report.folders.len(), root.display());

        if phases.contains(Phases::LIST) {
            for f in &report.folders {
                writeln!(out, "{}", f)?;
            }
            out.flush()?;
            report.listed = true;
            return Ok(report);
        }

        if phases.intersects(Phases::PRE) {
            let index = opener
                .open(AccessMode::ReadOnly)
                .chain_err_summary(|| format!("Failed to load database at {}", root.display()))?;
            let mut placement = placement.unwrap_or_else(|| Placement::new(ctx.clone()));
            if phases.contains(Phases::COPY_CHANGED) {
                for f in &report.folders {
                    report.copied += placement.move_mails(&*index, f)?;
                }
            }
            if phases.contains(Phases::RM_CHANGED) {
                for f in &report.folders {
                    report.removed += placement.del_mails(&*index, f)?;
                }
            }
        }

        if phases.contains(Phases::MAILS_SYNC) {
            report.sync = Some(run_phase_command(
                "sync",
                &settings.sync_command,
                ctx.dry_run,
            ));
        }
        if phases.contains(Phases::NOTMUCH_UPDATE) {
            report.reindex = Some(run_phase_command(
                "reindex",
                &settings.reindex_command,
                ctx.dry_run,
            ));
        }

        if phases.intersects(Phases::POST) {
            let mut index = opener
                .open(AccessMode::ReadWrite)
                .chain_err_summary(|| format!("Failed to load database at {}", root.display()))?;
            if phases.intersects(Phases::ADD_TAGS | Phases::DEL_TAGS) {
                for f in &report.folders {
                    if phases.contains(Phases::ADD_TAGS) {
                        report.tagged += tags::add_tags(&mut *index, f, &ctx)?;
                    }
                    if phases.contains(Phases::DEL_TAGS) {
                        report.untagged += tags::del_tags(&mut *index, f, &ctx)?;
                    }
                }
            }
            if phases.contains(Phases::DEL_NEW) {
                report.new_untagged += tags::del_new_tag(&mut *index, &settings.new_tag, &ctx)?;
            }
        }

        report.log(phases);
        Ok(report)
    }
}
