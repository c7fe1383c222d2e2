//
// tagsync
//
// Copyright 2026 The tagsync authors
//
// This file is part of tagsync.
//
// tagsync is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// tagsync is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with tagsync. If not, see <http://www.gnu.org/licenses/>.

use std::{
    collections::{BTreeMap, BTreeSet},
    fs::{self, File},
    io::{self, Read, Write},
    os::unix::fs::PermissionsExt,
    path::{Path, PathBuf},
};

use tagsynclib::{
    index::{MemoryIndex, Query, TagIndex},
    maildir::{Copier, Folder, UniqueNameGenerator, STATE_SUBDIRS},
    reconcile::{tags, Placement, ReconcileContext, ReconcileStats},
};
use tempfile::TempDir;

struct MailStore {
    dir: TempDir,
}

impl MailStore {
    fn new(folders: &[&str]) -> Self {
        let dir = TempDir::new().unwrap();
        for f in folders {
            for sub in STATE_SUBDIRS {
                fs::create_dir_all(dir.path().join(f).join(sub)).unwrap();
            }
        }
        Self { dir }
    }

    fn root(&self) -> &Path {
        self.dir.path()
    }

    fn deliver(&self, folder: &str, name: &str, id: &str, body: &str) -> PathBuf {
        let path = self.root().join(folder).join("cur").join(name);
        fs::write(
            &path,
            format!("Message-ID: <{id}>\nSubject: message {id}\n\n{body}\n"),
        )
        .unwrap();
        path
    }

    fn files_in(&self, folder: &str) -> Vec<PathBuf> {
        let mut ret = vec![];
        for sub in ["cur", "new"] {
            for entry in fs::read_dir(self.root().join(folder).join(sub)).unwrap() {
                ret.push(entry.unwrap().path());
            }
        }
        ret.sort();
        ret
    }

    fn snapshot(&self) -> BTreeMap<PathBuf, Vec<u8>> {
        fn walk(dir: &Path, acc: &mut BTreeMap<PathBuf, Vec<u8>>) {
            for entry in fs::read_dir(dir).unwrap() {
                let path = entry.unwrap().path();
                if path.is_dir() {
                    acc.insert(path.clone(), vec![]);
                    walk(&path, acc);
                } else {
                    acc.insert(path.clone(), fs::read(&path).unwrap());
                }
            }
        }
        let mut ret = BTreeMap::new();
        walk(self.root(), &mut ret);
        ret
    }
}

fn tag_snapshot(index: &MemoryIndex) -> BTreeMap<String, BTreeSet<String>> {
    index
        .messages()
        .map(|m| (m.id.clone(), m.tags.clone()))
        .collect()
}

fn folder(s: &str) -> Folder {
    Folder::new(s).unwrap()
}

#[test]
fn test_reconcile_add_tags_converges() {
    let store = MailStore::new(&["inbox", "work", "work/sub"]);
    store.deliver("inbox", "1.P1Q1.h:2,S", "a@x", "a");
    store.deliver("work", "1.P1Q2.h:2,S", "b@x", "b");
    store.deliver("work/sub", "1.P1Q3.h:2,S", "c@x", "c");
    let mut index = MemoryIndex::scan(store.root()).unwrap();
    let ctx = ReconcileContext::new(store.root(), false);

    for f in ["inbox", "work", "work/sub"] {
        let stats = tags::add_tags(&mut index, &folder(f), &ctx).unwrap();
        assert_eq!(
            stats,
            ReconcileStats {
                matched: 1,
                applied: 1,
                failed: 0
            }
        );
    }
    assert!(index.get("c@x").unwrap().tags.contains("work/sub"));
    // Membership in work/sub is not membership in work.
    assert!(!index.get("c@x").unwrap().tags.contains("work"));

    for f in ["inbox", "work", "work/sub"] {
        assert_eq!(
            index.count(&Query::in_folder_untagged(f)).unwrap(),
            0,
            "{f}"
        );
        let stats = tags::add_tags(&mut index, &folder(f), &ctx).unwrap();
        assert!(stats.is_noop());
    }
}

#[test]
fn test_reconcile_del_tags_converges() {
    let store = MailStore::new(&["inbox", "archive"]);
    store.deliver("inbox", "1.P1Q1.h:2,S", "a@x", "a");
    store.deliver("archive", "1.P1Q2.h:2,S", "b@x", "b");
    let mut index = MemoryIndex::scan(store.root()).unwrap();
    index.add_tag("a@x", "inbox").unwrap();
    index.add_tag("b@x", "archive").unwrap();
    // b@x was archived by a sync tool but still carries its old tag.
    index.add_tag("b@x", "inbox").unwrap();
    let ctx = ReconcileContext::new(store.root(), false);

    let stats = tags::del_tags(&mut index, &folder("inbox"), &ctx).unwrap();
    assert_eq!(stats.applied, 1);
    assert!(!index.get("b@x").unwrap().tags.contains("inbox"));
    assert!(index.get("b@x").unwrap().tags.contains("archive"));
    assert!(index.get("a@x").unwrap().tags.contains("inbox"));

    assert_eq!(
        index.count(&Query::tagged_outside_folder("inbox")).unwrap(),
        0
    );
    assert!(tags::del_tags(&mut index, &folder("inbox"), &ctx)
        .unwrap()
        .is_noop());
}

#[test]
fn test_reconcile_del_new_tag_everywhere() {
    let store = MailStore::new(&["inbox", "archive"]);
    store.deliver("inbox", "1.P1Q1.h:2,S", "a@x", "a");
    store.deliver("archive", "1.P1Q2.h:2,S", "b@x", "b");
    let mut index = MemoryIndex::new(store.root()).with_new_tags(["new", "inbox"]);
    index.rescan().unwrap();
    let ctx = ReconcileContext::new(store.root(), false);

    let stats = tags::del_new_tag(&mut index, "new", &ctx).unwrap();
    assert_eq!(stats.matched, 2);
    assert_eq!(index.count(&Query::tag("new")).unwrap(), 0);
    assert_eq!(index.count(&Query::tag("inbox")).unwrap(), 2);
}

#[test]
fn test_reconcile_retag_moves_message() {
    let store = MailStore::new(&["a", "b"]);
    store.deliver("a", "1.P1Q1.h:2,FS", "m@x", "moving");
    store.deliver("a", "1.P1Q2.h:2,S", "s@x", "staying");
    let mut index = MemoryIndex::scan(store.root()).unwrap();
    index.add_tag("m@x", "b").unwrap();
    index.add_tag("m@x", "replied").unwrap();
    index.add_tag("s@x", "a").unwrap();
    let ctx = ReconcileContext::new(store.root(), false);
    let mut placement = Placement::new(ctx.clone())
        .with_name_generator(UniqueNameGenerator::with_identity(77, "testhost"));

    let copied = placement.move_mails(&index, &folder("b")).unwrap();
    assert_eq!(copied.applied, 1);
    assert_eq!(placement.move_mails(&index, &folder("a")).unwrap().matched, 0);
    // The source is still there until the prune phase.
    assert_eq!(store.files_in("a").len(), 2);

    let removed = placement.del_mails(&index, &folder("a")).unwrap();
    assert_eq!(removed.applied, 1);
    assert_eq!(placement.del_mails(&index, &folder("b")).unwrap().matched, 0);

    let in_b = store.files_in("b");
    assert_eq!(in_b.len(), 1);
    assert_eq!(store.files_in("a"), vec![store.root().join("a/cur/1.P1Q2.h:2,S")]);
    let name = in_b[0].file_name().unwrap().to_str().unwrap();
    assert!(name.contains(".P77Q1.testhost"), "{name}");
    assert!(name.ends_with(":2,FRS"), "{name}");
    assert!(in_b[0].starts_with(store.root().join("b/cur")));
    let contents = fs::read_to_string(&in_b[0]).unwrap();
    assert!(contents.contains("Message-ID: <m@x>"));
    assert!(contents.ends_with("moving\n"));
    let mode = fs::metadata(&in_b[0]).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);

    index.rescan().unwrap();
    let m = index.get("m@x").unwrap();
    assert_eq!(m.filenames, in_b);
    assert!(m.tags.contains("b"));
}

#[test]
fn test_reconcile_del_mails_keeps_other_copies() {
    let store = MailStore::new(&["a", "b"]);
    store.deliver("a", "1.P1Q1.h:2,S", "m@x", "dup");
    store.deliver("b", "1.P1Q2.h:2,S", "m@x", "dup");
    let mut index = MemoryIndex::scan(store.root()).unwrap();
    index.add_tag("m@x", "b").unwrap();
    let mut placement = Placement::new(ReconcileContext::new(store.root(), false));

    let stats = placement.del_mails(&index, &folder("a")).unwrap();
    assert_eq!(stats.applied, 1);
    assert!(store.files_in("a").is_empty());
    assert_eq!(store.files_in("b").len(), 1);
}

#[test]
fn test_reconcile_dry_run_changes_nothing() {
    let store = MailStore::new(&["a", "b", "c"]);
    store.deliver("a", "1.P1Q1.h:2,S", "m@x", "retagged");
    store.deliver("c", "1.P1Q2.h:2,S", "n@x", "untagged");
    let mut index = MemoryIndex::new(store.root()).with_new_tags(["new"]);
    index.rescan().unwrap();
    index.add_tag("m@x", "b").unwrap();
    index.add_tag("n@x", "a").unwrap();

    let fs_before = store.snapshot();
    let tags_before = tag_snapshot(&index);
    let ctx = ReconcileContext::new(store.root(), true);
    let mut placement = Placement::new(ctx.clone());
    let mut matched = 0;
    for f in ["a", "b", "c"] {
        let f = folder(f);
        matched += placement.move_mails(&index, &f).unwrap().matched;
        matched += placement.del_mails(&index, &f).unwrap().matched;
        matched += tags::add_tags(&mut index, &f, &ctx).unwrap().matched;
        matched += tags::del_tags(&mut index, &f, &ctx).unwrap().matched;
    }
    matched += tags::del_new_tag(&mut index, "new", &ctx).unwrap().matched;

    assert!(matched > 0);
    assert_eq!(store.snapshot(), fs_before);
    assert_eq!(tag_snapshot(&index), tags_before);
}

/// Writes part of the message, then fails, for messages containing `FAIL`.
struct FlakyCopier;

impl Copier for FlakyCopier {
    fn copy(&mut self, src: &mut File, dest: &mut File) -> io::Result<()> {
        let mut contents = Vec::new();
        src.read_to_end(&mut contents)?;
        if contents.windows(4).any(|w| w == b"FAIL") {
            dest.write_all(&contents[..contents.len() / 2])?;
            return Err(io::Error::new(io::ErrorKind::Other, "disk full"));
        }
        dest.write_all(&contents)
    }
}

#[test]
fn test_reconcile_copy_failure_is_contained() {
    let store = MailStore::new(&["inbox", "archive"]);
    store.deliver("inbox", "1.P1Q1.h:2,S", "a@x", "first");
    store.deliver("inbox", "1.P1Q2.h:2,S", "b@x", "FAIL here");
    store.deliver("inbox", "1.P1Q3.h:2,S", "c@x", "third");
    store.deliver("inbox", "1.P1Q4.h:2,S", "d@x", "fourth");
    let mut index = MemoryIndex::scan(store.root()).unwrap();
    for id in ["a@x", "b@x", "c@x", "d@x"] {
        index.add_tag(id, "archive").unwrap();
    }
    // d@x lost its file after indexing.
    fs::remove_file(store.root().join("inbox/cur/1.P1Q4.h:2,S")).unwrap();

    let mut placement = Placement::new(ReconcileContext::new(store.root(), false))
        .with_copier(Box::new(FlakyCopier));
    let stats = placement.move_mails(&index, &folder("archive")).unwrap();
    assert_eq!(
        stats,
        ReconcileStats {
            matched: 4,
            applied: 2,
            failed: 2
        }
    );

    let archived = store.files_in("archive");
    assert_eq!(archived.len(), 2);
    for path in archived {
        assert!(!fs::read_to_string(path).unwrap().contains("FAIL"));
    }
    // Nothing is left in tmp or new either.
    let archive = store.root().join("archive");
    let files = store
        .snapshot()
        .into_keys()
        .filter(|p| p.starts_with(&archive) && p.is_file())
        .count();
    assert_eq!(files, 2);
}

#[test]
fn test_reconcile_del_failure_is_contained() {
    let store = MailStore::new(&["a", "b"]);
    store.deliver("a", "1.P1Q1.h:2,S", "m@x", "gone");
    store.deliver("a", "1.P1Q2.h:2,S", "n@x", "kept");
    let index = MemoryIndex::scan(store.root()).unwrap();
    assert_eq!(index.root(), store.root());
    assert_eq!(index.len(), 2);
    // m@x lost its file after indexing.
    fs::remove_file(store.root().join("a/cur/1.P1Q1.h:2,S")).unwrap();

    let mut placement = Placement::new(ReconcileContext::new(store.root(), false));
    assert!(!placement.context().dry_run);
    let stats = placement.del_mails(&index, &folder("a")).unwrap();
    assert_eq!(
        stats,
        ReconcileStats {
            matched: 2,
            applied: 1,
            failed: 1
        }
    );
    assert!(store.files_in("a").is_empty());
}
