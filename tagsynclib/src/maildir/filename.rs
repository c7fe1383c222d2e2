/*
 * tagsync - maildir filename codec
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

//! Maildir file names: `<seconds>.P<pid>Q<counter>.<host>:2,<flags>`.

use std::path::Path;

use bitflags::bitflags;

use crate::utils::{clock, hostname::hostname};

bitflags! {
    #[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
    pub struct Flag: u8 {
        const PASSED  = 0b0000_0001;
        const REPLIED = 0b0000_0010;
        const SEEN    = 0b0000_0100;
        const TRASHED = 0b0000_1000;
        const DRAFT   = 0b0001_0000;
        const FLAGGED = 0b0010_0000;
    }
}

/// Info letters in the order they appear in a file name.
const FLAG_LETTERS: [(Flag, char); 6] = [
    (Flag::DRAFT, 'D'),
    (Flag::FLAGGED, 'F'),
    (Flag::PASSED, 'P'),
    (Flag::REPLIED, 'R'),
    (Flag::SEEN, 'S'),
    (Flag::TRASHED, 'T'),
];

/// Tags that map onto a set flag.
const TAG_FLAGS: [(&str, Flag); 5] = [
    ("draft", Flag::DRAFT),
    ("flagged", Flag::FLAGGED),
    ("passed", Flag::PASSED),
    ("replied", Flag::REPLIED),
    ("trashed", Flag::TRASHED),
];

/// The tag whose *absence* sets [`Flag::SEEN`].
pub const UNREAD_TAG: &str = "unread";

impl Flag {
    /// Derive maildir flags from a message's tags.
    pub fn from_tags<'t, I>(tags: I) -> Self
    where
        I: IntoIterator<Item = &'t str>,
    {
        let mut ret = Self::SEEN;
        for tag in tags {
            if tag == UNREAD_TAG {
                ret.remove(Self::SEEN);
            } else if let Some((_, f)) = TAG_FLAGS.iter().find(|(t, _)| *t == tag) {
                ret.insert(*f);
            }
        }
        ret
    }

    /// The tags implied by these flags, as notmuch would derive them on
    /// indexing.
    pub fn to_tags(self) -> Vec<&'static str> {
        let mut ret = TAG_FLAGS
            .iter()
            .filter(|(_, f)| self.contains(*f))
            .map(|(t, _)| *t)
            .collect::<Vec<&'static str>>();
        if !self.contains(Self::SEEN) {
            ret.push(UNREAD_TAG);
        }
        ret
    }

    /// Parse the info section of a file name. Names without a `:2,` info
    /// section carry no flags.
    pub fn from_filename(path: &Path) -> Self {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return Self::empty();
        };
        let Some((_, info)) = name.rsplit_once(":2,") else {
            return Self::empty();
        };
        let mut ret = Self::empty();
        for c in info.chars() {
            if let Some((f, _)) = FLAG_LETTERS.iter().find(|(_, l)| *l == c) {
                ret.insert(*f);
            }
        }
        ret
    }

    /// Letters in ASCII order, e.g. `"FRS"`.
    pub fn letters(self) -> String {
        FLAG_LETTERS
            .iter()
            .filter(|(f, _)| self.contains(*f))
            .map(|(_, l)| *l)
            .collect()
    }
}

/// Replace characters that cannot appear in the host part of a unique name.
fn sanitize_hostname(host: &str) -> String {
    let mut ret = String::with_capacity(host.len());
    for c in host.chars() {
        match c {
            '/' => ret.push_str("\\057"),
            ':' => ret.push_str("\\072"),
            c => ret.push(c),
        }
    }
    ret
}

/// Generates process-unique maildir file names.
///
/// The counter is per generator and strictly increasing, so names generated
/// in the same second by the same process never collide.
#[derive(Debug)]
pub struct UniqueNameGenerator {
    pid: u32,
    hostname: String,
    counter: u64,
}

impl Default for UniqueNameGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl UniqueNameGenerator {
    pub fn new() -> Self {
        let host = match hostname() {
            Ok(h) => h.to_string_lossy().into_owned(),
            Err(err) => {
                log::warn!("{err}");
                "localhost".to_string()
            }
        };
        Self::with_identity(std::process::id(), &host)
    }

    pub fn with_identity(pid: u32, hostname: &str) -> Self {
        Self {
            pid,
            hostname: sanitize_hostname(hostname),
            counter: 0,
        }
    }

    /// Unique part of a file name for the given wall clock second.
    pub fn next_unique(&mut self, seconds: u64) -> String {
        self.counter += 1;
        format!("{}.P{}Q{}.{}", seconds, self.pid, self.counter, self.hostname)
    }

    /// A complete file name with an info section for `flags`.
    pub fn filename_at(&mut self, seconds: u64, flags: Flag) -> String {
        let unique = self.next_unique(seconds);
        format!("{}:2,{}", unique, flags.letters())
    }

    /// A complete file name stamped with the current time.
    pub fn filename(&mut self, flags: Flag) -> String {
        self.filename_at(clock::unix_seconds(), flags)
    }
}
