/*
 * tagsync - in-memory tag index
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

//! An in-process [`TagIndex`] over a maildir tree.
//!
//! Tags live only as long as the [`MemoryIndex`] value. Messages are keyed by
//! their `Message-ID` header, or by file name when the header is missing, so
//! copies of one message in several folders collapse into one entry just like
//! in notmuch.

use std::{
    collections::{BTreeMap, BTreeSet},
    fs::File,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
};

use super::{AccessMode, IndexOpener, MessageEntry, Query, TagIndex};
use crate::{
    error::{Error, ErrorKind, Result, ResultIntoError},
    maildir::{self, Flag},
};

#[derive(Debug)]
pub struct MemoryIndex {
    root: PathBuf,
    messages: BTreeMap<String, MessageEntry>,
    new_tags: Vec<String>,
    rescan_on_open: bool,
}

impl MemoryIndex {
    /// An empty index over `root`. Call [`MemoryIndex::rescan`] to populate
    /// it.
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self {
            root: root.into(),
            messages: BTreeMap::new(),
            new_tags: vec![],
            rescan_on_open: false,
        }
    }

    /// Index every message under `root`.
    pub fn scan<P: Into<PathBuf>>(root: P) -> Result<Self> {
        let mut ret = Self::new(root);
        ret.rescan()?;
        Ok(ret)
    }

    /// Tags given to messages the first time they are seen.
    pub fn with_new_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.new_tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Rescan the tree every time a handle is opened through
    /// [`IndexOpener::open`], standing in for an external reindex.
    pub fn with_rescan_on_open(mut self, value: bool) -> Self {
        self.rescan_on_open = value;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn get(&self, message_id: &str) -> Option<&MessageEntry> {
        self.messages.get(message_id)
    }

    pub fn messages(&self) -> impl Iterator<Item = &MessageEntry> {
        self.messages.values()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Synchronize the index with the files on disk.
    ///
    /// Known messages keep their tags and get their file list refreshed.
    /// New messages get the configured new tags plus the tags implied by the
    /// maildir flags of their first file. Messages without files are
    /// dropped.
    pub fn rescan(&mut self) -> Result<()> {
        let mut dirs = Vec::new();
        if maildir::is_maildir(&self.root) {
            dirs.push(self.root.clone());
        }
        for folder in maildir::list_folders(&self.root)? {
            dirs.push(folder.fs_path(&self.root));
        }

        let mut found: BTreeMap<String, (Vec<PathBuf>, Option<String>)> = BTreeMap::new();
        for dir in dirs {
            for sub in [maildir::CUR, maildir::NEW] {
                let sub_path = dir.join(sub);
                let entries = std::fs::read_dir(&sub_path)
                    .chain_err_summary(|| {
                        format!("Could not list directory {}", sub_path.display())
                    })
                    .chain_err_related_path(&sub_path)?;
                for entry in entries {
                    let path = entry?.path();
                    if !path.is_file() {
                        continue;
                    }
                    let (message_id, subject) = match read_headers(&path) {
                        Ok(v) => v,
                        Err(err) => {
                            log::warn!("Skipping unreadable file {}: {}", path.display(), err);
                            continue;
                        }
                    };
                    let key = message_id.unwrap_or_else(|| {
                        path.file_name()
                            .map(|n| n.to_string_lossy().into_owned())
                            .unwrap_or_default()
                    });
                    let slot = found.entry(key).or_default();
                    slot.0.push(path);
                    if slot.1.is_none() {
                        slot.1 = subject;
                    }
                }
            }
        }

        let mut messages = BTreeMap::new();
        for (id, (mut filenames, subject)) in found {
            filenames.sort();
            let tags = match self.messages.remove(&id) {
                Some(prev) => prev.tags,
                None => {
                    let mut tags = self.new_tags.iter().cloned().collect::<BTreeSet<String>>();
                    if let Some(first) = filenames.first() {
                        tags.extend(
                            Flag::from_filename(first)
                                .to_tags()
                                .into_iter()
                                .map(str::to_string),
                        );
                    }
                    tags
                }
            };
            messages.insert(
                id.clone(),
                MessageEntry {
                    id,
                    filenames,
                    subject,
                    tags,
                },
            );
        }
        log::trace!(
            "memory index over {} holds {} messages",
            self.root.display(),
            messages.len()
        );
        self.messages = messages;
        Ok(())
    }

    fn entry_mut(&mut self, message_id: &str) -> Result<&mut MessageEntry> {
        self.messages.get_mut(message_id).ok_or_else(|| {
            Error::new(format!(
                "Message with message id {message_id:?} not found in index."
            ))
            .set_kind(ErrorKind::NotFound)
        })
    }
}

/// Read `Message-ID` and `Subject` from the header block of a message file.
fn read_headers(path: &Path) -> Result<(Option<String>, Option<String>)> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut headers: Vec<String> = vec![];
    let mut line = Vec::new();
    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            break;
        }
        let l = String::from_utf8_lossy(&line);
        let l = l.trim_end_matches(['\r', '\n']);
        if l.is_empty() {
            break;
        }
        if l.starts_with([' ', '\t']) {
            if let Some(last) = headers.last_mut() {
                last.push(' ');
                last.push_str(l.trim());
            }
            continue;
        }
        headers.push(l.to_string());
    }

    let mut message_id = None;
    let mut subject = None;
    for h in headers {
        let Some((name, value)) = h.split_once(':') else {
            continue;
        };
        let value = value.trim();
        if message_id.is_none() && name.trim().eq_ignore_ascii_case("message-id") {
            let id = value.trim_start_matches('<').trim_end_matches('>').trim();
            if !id.is_empty() {
                message_id = Some(id.to_string());
            }
        } else if subject.is_none() && name.trim().eq_ignore_ascii_case("subject") {
            subject = Some(value.to_string());
        }
    }
    Ok((message_id, subject))
}

impl TagIndex for MemoryIndex {
    fn mode(&self) -> AccessMode {
        AccessMode::ReadWrite
    }

    fn count(&self, query: &Query) -> Result<u32> {
        Ok(self
            .messages
            .values()
            .filter(|e| query.matches(e, &self.root))
            .count() as u32)
    }

    fn search(&self, query: &Query) -> Result<Vec<MessageEntry>> {
        Ok(self
            .messages
            .values()
            .filter(|e| query.matches(e, &self.root))
            .cloned()
            .collect())
    }

    fn add_tag(&mut self, message_id: &str, tag: &str) -> Result<()> {
        self.entry_mut(message_id)?.tags.insert(tag.to_string());
        Ok(())
    }

    fn remove_tag(&mut self, message_id: &str, tag: &str) -> Result<()> {
        self.entry_mut(message_id)?.tags.remove(tag);
        Ok(())
    }
}

/// A borrowed view of a [`MemoryIndex`] that honours an [`AccessMode`].
#[derive(Debug)]
pub struct MemoryIndexHandle<'i> {
    index: &'i mut MemoryIndex,
    mode: AccessMode,
}

impl MemoryIndexHandle<'_> {
    fn check_writable(&self) -> Result<()> {
        if self.mode == AccessMode::ReadOnly {
            return Err(Error::new("Cannot modify tags: index was opened read-only.")
                .set_kind(ErrorKind::Bug));
        }
        Ok(())
    }
}

impl TagIndex for MemoryIndexHandle<'_> {
    fn mode(&self) -> AccessMode {
        self.mode
    }

    fn count(&self, query: &Query) -> Result<u32> {
        self.index.count(query)
    }

    fn search(&self, query: &Query) -> Result<Vec<MessageEntry>> {
        self.index.search(query)
    }

    fn add_tag(&mut self, message_id: &str, tag: &str) -> Result<()> {
        self.check_writable()?;
        self.index.add_tag(message_id, tag)
    }

    fn remove_tag(&mut self, message_id: &str, tag: &str) -> Result<()> {
        self.check_writable()?;
        self.index.remove_tag(message_id, tag)
    }
}

impl IndexOpener for MemoryIndex {
    fn open(&mut self, mode: AccessMode) -> Result<Box<dyn TagIndex + '_>> {
        if self.rescan_on_open {
            self.rescan()?;
        }
        Ok(Box::new(MemoryIndexHandle { index: self, mode }))
    }
}
