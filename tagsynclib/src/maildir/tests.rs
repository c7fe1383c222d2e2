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

use std::{collections::HashSet, fs, path::Path};

use tempfile::TempDir;

use super::*;

fn make_maildir(root: &Path, rel: &str) {
    for sub in STATE_SUBDIRS {
        fs::create_dir_all(root.join(rel).join(sub)).unwrap();
    }
}

#[test]
fn test_maildir_list_folders_nested() {
    let tmp_dir = TempDir::new().unwrap();
    let root = tmp_dir.path();
    make_maildir(root, "inbox");
    make_maildir(root, "work");
    make_maildir(root, "work/sub");
    // Not a folder, but holds one.
    make_maildir(root, "archive/2023");
    fs::create_dir_all(root.join("archive/notes")).unwrap();
    // Missing `tmp`.
    fs::create_dir_all(root.join("broken/cur")).unwrap();
    fs::create_dir_all(root.join("broken/new")).unwrap();
    fs::write(root.join("stray-file"), b"").unwrap();

    let folders = list_folders(root).unwrap();
    let names = folders.iter().map(Folder::as_str).collect::<Vec<&str>>();
    assert_eq!(names, vec!["archive/2023", "inbox", "work", "work/sub"]);
}

#[test]
fn test_maildir_list_folders_skips_state_subdirs() {
    let tmp_dir = TempDir::new().unwrap();
    let root = tmp_dir.path();
    make_maildir(root, "inbox");
    // A maildir-looking directory under a state subdirectory is never
    // visited.
    make_maildir(root, "inbox/cur/hidden");
    make_maildir(root, "new");

    let folders = list_folders(root).unwrap();
    assert_eq!(folders, vec![Folder::new("inbox").unwrap()]);
}

#[test]
fn test_maildir_list_folders_root_excluded() {
    let tmp_dir = TempDir::new().unwrap();
    let root = tmp_dir.path();
    make_maildir(root, ".");
    assert!(list_folders(root).unwrap().is_empty());

    let missing = root.join("does-not-exist");
    let err = list_folders(&missing).unwrap_err();
    assert!(err.kind.is_not_found());
    assert_eq!(err.related_path.as_deref(), Some(missing.as_path()));
}

#[test]
fn test_maildir_folder_validation() {
    assert!(Folder::new("work/sub").is_ok());
    assert_eq!(Folder::new("/work/").unwrap().as_str(), "work");
    assert!(Folder::new("").is_err());
    assert!(Folder::new(".").is_err());
    assert!(Folder::new("work/cur").is_err());
    assert!(Folder::new("tmp").is_err());
    assert!(Folder::new("a//b").is_err());
    assert!(Folder::new("../escape").is_err());

    let root = Path::new("/mail");
    let folder = Folder::new("work/sub").unwrap();
    assert_eq!(folder.fs_path(root), Path::new("/mail/work/sub"));
    assert_eq!(folder.cur_path(root), Path::new("/mail/work/sub/cur"));
}

#[test]
fn test_maildir_folder_of() {
    let root = Path::new("/mail");
    assert_eq!(
        folder_of(Path::new("/mail/work/sub/cur/1.P1Q1.h:2,S"), root).as_deref(),
        Some("work/sub")
    );
    assert_eq!(
        folder_of(Path::new("/mail/inbox/new/1.P1Q1.h"), root).as_deref(),
        Some("inbox")
    );
    assert_eq!(
        folder_of(Path::new("/mail/cur/1.P1Q1.h"), root).as_deref(),
        Some(".")
    );
    assert_eq!(folder_of(Path::new("/elsewhere/inbox/cur/x"), root), None);
}

#[test]
fn test_maildir_flags_from_tags() {
    assert_eq!(
        Flag::from_tags(["flagged", "replied", "inbox"]).letters(),
        "FRS"
    );
    assert_eq!(Flag::from_tags(["unread"]).letters(), "");
    assert_eq!(
        Flag::from_tags(["trashed", "draft", "passed", "unread", "flagged", "replied"])
            .letters(),
        "DFPRT"
    );
    assert_eq!(Flag::from_tags(std::iter::empty()).letters(), "S");
}

#[test]
fn test_maildir_flags_from_filename() {
    let flags = Flag::from_filename(Path::new("/mail/inbox/cur/1.P2Q3.host:2,FS"));
    assert_eq!(flags, Flag::FLAGGED | Flag::SEEN);
    assert!(Flag::from_filename(Path::new("/mail/inbox/new/1.P2Q3.host")).is_empty());
    let mut tags = Flag::from_filename(Path::new("x:2,R")).to_tags();
    tags.sort();
    assert_eq!(tags, vec!["replied", "unread"]);
}

#[test]
fn test_maildir_unique_names() {
    let mut gen = UniqueNameGenerator::with_identity(4242, "mx.example.org");
    let flags = Flag::from_tags(["flagged", "replied"]);
    let first = gen.filename_at(1_700_000_000, flags);
    assert_eq!(first, "1700000000.P4242Q1.mx.example.org:2,FRS");

    let mut seen = HashSet::new();
    seen.insert(first);
    for _ in 0..100 {
        assert!(seen.insert(gen.filename_at(1_700_000_000, flags)));
    }

    let mut gen = UniqueNameGenerator::with_identity(1, "we:ird/host");
    assert_eq!(gen.next_unique(5), "5.P1Q1.we\\072ird\\057host");
}
