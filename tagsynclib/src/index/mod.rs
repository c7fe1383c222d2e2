/*
 * tagsync - index module
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

//! # Tag index
//!
//! A tag index is the database that associates each message (identified by
//! its Message-ID) with the files that hold it and a set of tags. The
//! reconcilers only need a narrow slice of such a database, described by
//! [`TagIndex`]: count and search with a [`Query`], and add or remove a tag
//! on a message.
//!
//! Two implementations are provided:
//!
//! - [`notmuch::NotmuchIndex`], backed by `libnotmuch` loaded at runtime.
//! - [`memory::MemoryIndex`], an in-process index over a maildir tree, used
//!   by the test suites and by library users without notmuch.
//!
//! Indexes are opened through an [`IndexOpener`] in a given [`AccessMode`].
//! The returned handle closes the database when dropped.

use std::{
    collections::BTreeSet,
    fmt,
    path::{Path, PathBuf},
};

use crate::{error::Result, maildir};

pub mod memory;
pub mod notmuch;

pub use memory::MemoryIndex;

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum AccessMode {
    ReadOnly,
    ReadWrite,
}

impl fmt::Display for AccessMode {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::ReadOnly => write!(fmt, "read-only"),
            Self::ReadWrite => write!(fmt, "read-write"),
        }
    }
}

/// A boolean query over folder membership and tags.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Query {
    /// At least one of the message's files lies in this folder.
    Folder(String),
    /// The message carries this tag.
    Tag(String),
    Not(Box<Query>),
    And(Box<Query>, Box<Query>),
}

impl Query {
    pub fn folder<S: Into<String>>(s: S) -> Self {
        Self::Folder(s.into())
    }

    pub fn tag<S: Into<String>>(s: S) -> Self {
        Self::Tag(s.into())
    }

    pub fn and(self, other: Self) -> Self {
        Self::And(Box::new(self), Box::new(other))
    }

    pub fn and_not(self, other: Self) -> Self {
        Self::And(Box::new(self), Box::new(Self::Not(Box::new(other))))
    }

    /// Messages with a file in `folder` but without the tag of the same name.
    pub fn in_folder_untagged(folder: &str) -> Self {
        Self::folder(folder).and_not(Self::tag(folder))
    }

    /// Messages tagged `folder` without any file in the folder of the same
    /// name.
    pub fn tagged_outside_folder(folder: &str) -> Self {
        Self::tag(folder).and_not(Self::folder(folder))
    }

    /// Evaluate the query against one message, with folders derived relative
    /// to `root`.
    pub fn matches(&self, entry: &MessageEntry, root: &Path) -> bool {
        match self {
            Self::Folder(f) => entry.has_file_in_folder(root, f),
            Self::Tag(t) => entry.tags.contains(t),
            Self::Not(q) => !q.matches(entry, root),
            Self::And(a, b) => a.matches(entry, root) && b.matches(entry, root),
        }
    }
}

/// Quote a term for the notmuch query syntax. Embedded double quotes are
/// doubled.
fn quote_term(fmt: &mut fmt::Formatter, term: &str) -> fmt::Result {
    write!(fmt, "\"{}\"", term.replace('"', "\"\""))
}

impl fmt::Display for Query {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Folder(f) => {
                write!(fmt, "folder:")?;
                quote_term(fmt, f)
            }
            Self::Tag(t) => {
                write!(fmt, "tag:")?;
                quote_term(fmt, t)
            }
            Self::Not(q) => match q.as_ref() {
                Self::And(_, _) => write!(fmt, "NOT ({})", q),
                _ => write!(fmt, "NOT {}", q),
            },
            Self::And(a, b) => write!(fmt, "{} {}", a, b),
        }
    }
}

/// A snapshot of one indexed message.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct MessageEntry {
    pub id: String,
    /// Every file holding this message, in index order.
    pub filenames: Vec<PathBuf>,
    pub subject: Option<String>,
    pub tags: BTreeSet<String>,
}

impl MessageEntry {
    /// What to call this message in log lines.
    pub fn display_name(&self) -> &str {
        self.subject
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(self.id.as_str())
    }

    pub fn has_file_in_folder(&self, root: &Path, folder: &str) -> bool {
        self.files_in_folder(root, folder).next().is_some()
    }

    pub fn files_in_folder<'a>(
        &'a self,
        root: &'a Path,
        folder: &'a str,
    ) -> impl Iterator<Item = &'a PathBuf> + 'a {
        self.filenames
            .iter()
            .filter(move |f| maildir::folder_of(f, root).as_deref() == Some(folder))
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(String::as_str)
    }
}

/// The capabilities reconciliation needs from a tag index.
pub trait TagIndex {
    fn mode(&self) -> AccessMode;

    fn count(&self, query: &Query) -> Result<u32>;

    /// Snapshot every message matching `query`.
    fn search(&self, query: &Query) -> Result<Vec<MessageEntry>>;

    /// Requires [`AccessMode::ReadWrite`].
    fn add_tag(&mut self, message_id: &str, tag: &str) -> Result<()>;

    /// Requires [`AccessMode::ReadWrite`].
    fn remove_tag(&mut self, message_id: &str, tag: &str) -> Result<()>;
}

/// Opens a [`TagIndex`] handle. At most one handle exists at a time; it is
/// closed when dropped.
pub trait IndexOpener {
    fn open(&mut self, mode: AccessMode) -> Result<Box<dyn TagIndex + '_>>;
}

impl<F> IndexOpener for F
where
    F: FnMut(AccessMode) -> Result<Box<dyn TagIndex>>,
{
    fn open(&mut self, mode: AccessMode) -> Result<Box<dyn TagIndex + '_>> {
        let index: Box<dyn TagIndex + '_> = (self)(mode)?;
        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_notmuch_syntax() {
        assert_eq!(
            Query::in_folder_untagged("work/sub").to_string(),
            r#"folder:"work/sub" NOT tag:"work/sub""#
        );
        assert_eq!(
            Query::tagged_outside_folder("inbox").to_string(),
            r#"tag:"inbox" NOT folder:"inbox""#
        );
        assert_eq!(Query::tag("new").to_string(), r#"tag:"new""#);
        assert_eq!(
            Query::folder(r#"we"ird"#).to_string(),
            r#"folder:"we""ird""#
        );
    }

    #[test]
    fn test_query_matches_entry() {
        let root = Path::new("/mail");
        let entry = MessageEntry {
            id: "a@example".into(),
            filenames: vec![PathBuf::from("/mail/work/sub/cur/1.P1Q1.h:2,S")],
            subject: None,
            tags: ["inbox".to_string()].into_iter().collect(),
        };
        assert!(Query::in_folder_untagged("work/sub").matches(&entry, root));
        assert!(!Query::in_folder_untagged("work").matches(&entry, root));
        assert!(Query::tagged_outside_folder("inbox").matches(&entry, root));
        assert_eq!(entry.display_name(), "a@example");
    }
}
