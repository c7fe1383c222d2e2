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

use std::{fs, path::Path};

use tagsynclib::{
    command::{CommandName, Orchestrator, Phases},
    conf::Settings,
    error::{Error, ErrorKind, Result},
    index::{AccessMode, MemoryIndex, TagIndex},
    maildir::STATE_SUBDIRS,
    process::CommandOutcome,
};
use tempfile::TempDir;

fn make_store(root: &Path, folders: &[&str]) {
    for f in folders {
        for sub in STATE_SUBDIRS {
            fs::create_dir_all(root.join(f).join(sub)).unwrap();
        }
    }
}

fn message(id: &str) -> String {
    format!("Message-ID: <{id}>\nSubject: about {id}\n\nbody\n")
}

fn settings(root: &Path) -> Settings {
    Settings {
        database: root.to_path_buf(),
        sync_command: "true".to_string(),
        reindex_command: "true".to_string(),
        ..Settings::default()
    }
}

fn phases(commands: &[&str]) -> Phases {
    let commands = commands
        .iter()
        .map(|c| c.parse::<CommandName>().unwrap())
        .collect::<Vec<_>>();
    Phases::from_commands(&commands)
}

#[test]
fn test_orchestrator_list_only() {
    let tmp_dir = TempDir::new().unwrap();
    let root = tmp_dir.path();
    make_store(root, &["work", "work/sub", "inbox"]);
    let settings = settings(root);
    let mut opener = |_: AccessMode| -> Result<Box<dyn TagIndex>> {
        panic!("list must not open the index")
    };
    let mut out = Vec::new();
    let report = Orchestrator::new(&settings, phases(&["list", "all"]))
        .run(&mut opener, &mut out)
        .unwrap();
    assert!(report.listed);
    assert_eq!(String::from_utf8(out).unwrap(), "inbox\nwork\nwork/sub\n");
    assert_eq!(report.sync, None);
}

#[test]
fn test_orchestrator_full_run() {
    let tmp_dir = TempDir::new().unwrap();
    let root = tmp_dir.path();
    make_store(root, &["inbox", "archive"]);
    fs::write(root.join("inbox/cur/1.P1Q1.h:2,S"), message("a@x")).unwrap();
    fs::write(root.join("inbox/cur/1.P1Q2.h:2,S"), message("b@x")).unwrap();
    let incoming = tmp_dir.path().join("incoming");
    fs::write(&incoming, message("c@x")).unwrap();

    let mut index = MemoryIndex::new(root)
        .with_new_tags(["new"])
        .with_rescan_on_open(true);
    assert!(index.is_empty());
    index.rescan().unwrap();
    index.add_tag("a@x", "inbox").unwrap();
    // b@x was archived from a mail client.
    index.add_tag("b@x", "archive").unwrap();

    let mut settings = settings(root);
    // The "sync" delivers c@x into the archive.
    settings.sync_command = format!(
        "cp '{}' '{}'",
        incoming.display(),
        root.join("archive/new/2.P1Q1.h").display()
    );
    let mut out = Vec::new();
    let report = Orchestrator::new(&settings, phases(&["all"]))
        .run(&mut index, &mut out)
        .unwrap();
    assert!(out.is_empty());
    assert!(!report.listed);
    assert_eq!(report.sync, Some(CommandOutcome::Succeeded));
    assert_eq!(report.reindex, Some(CommandOutcome::Succeeded));
    assert_eq!(report.copied.applied, 1);
    assert_eq!(report.removed.applied, 1);
    assert_eq!(report.tagged.applied, 1);
    assert_eq!(report.failed(), 0);

    index.rescan().unwrap();
    let b = index.get("b@x").unwrap();
    assert_eq!(b.filenames.len(), 1);
    assert!(b.filenames[0].starts_with(root.join("archive/cur")));
    let c = index.get("c@x").unwrap();
    assert!(c.tags.contains("archive"));
    assert!(index.messages().all(|m| !m.tags.contains("new")));
    let a = index.get("a@x").unwrap();
    assert_eq!(a.filenames, vec![root.join("inbox/cur/1.P1Q1.h:2,S")]);
}

#[test]
fn test_orchestrator_dry_run() {
    let tmp_dir = TempDir::new().unwrap();
    let root = tmp_dir.path();
    make_store(root, &["inbox", "archive"]);
    fs::write(root.join("inbox/cur/1.P1Q1.h:2,S"), message("a@x")).unwrap();
    let mut index = MemoryIndex::new(root).with_new_tags(["new"]);
    index.rescan().unwrap();
    index.add_tag("a@x", "archive").unwrap();

    let mut settings = settings(root);
    settings.dry_run = true;
    settings.sync_command = format!("touch '{}'", root.join("synced").display());
    let report = Orchestrator::new(&settings, phases(&["pre", "sync", "notmuch", "post"]))
        .run(&mut index, &mut std::io::sink())
        .unwrap();
    assert_eq!(report.sync, Some(CommandOutcome::Skipped));
    assert_eq!(report.reindex, Some(CommandOutcome::Skipped));
    assert_eq!(report.copied.matched, 1);
    assert!(!root.join("synced").exists());
    assert!(fs::read_dir(root.join("archive/cur")).unwrap().next().is_none());
    let a = index.get("a@x").unwrap();
    assert!(a.tags.contains("new"));
    assert!(!a.tags.contains("inbox"));
    assert_eq!(a.filenames, vec![root.join("inbox/cur/1.P1Q1.h:2,S")]);
}

#[test]
fn test_orchestrator_sync_failure_is_not_fatal() {
    let tmp_dir = TempDir::new().unwrap();
    let root = tmp_dir.path();
    make_store(root, &["inbox"]);
    fs::write(root.join("inbox/cur/1.P1Q1.h:2,S"), message("a@x")).unwrap();
    let mut index = MemoryIndex::scan(root).unwrap();

    let mut settings = settings(root);
    settings.sync_command = "exit 2".to_string();
    let report = Orchestrator::new(&settings, phases(&["sync", "add"]))
        .run(&mut index, &mut std::io::sink())
        .unwrap();
    assert_eq!(report.sync, Some(CommandOutcome::Failed));
    assert_eq!(report.tagged.applied, 1);
    assert!(index.get("a@x").unwrap().tags.contains("inbox"));
}

#[test]
fn test_orchestrator_index_open_failure_is_fatal() {
    let tmp_dir = TempDir::new().unwrap();
    let root = tmp_dir.path();
    make_store(root, &["inbox"]);
    let settings = settings(root);
    let mut opened = vec![];
    let mut opener = |mode: AccessMode| -> Result<Box<dyn TagIndex>> {
        opened.push(mode);
        Err(Error::new("no database").set_kind(ErrorKind::LinkedLibrary("notmuch")))
    };
    let err = Orchestrator::new(&settings, phases(&["post"]))
        .run(&mut opener, &mut std::io::sink())
        .unwrap_err();
    assert!(err.summary.starts_with("Failed to load database at"));
    assert_eq!(opened, vec![AccessMode::ReadWrite]);

    let mut missing = settings.clone();
    missing.database = root.join("missing");
    let err = Orchestrator::new(&missing, phases(&["add"]))
        .run(&mut MemoryIndex::new(root), &mut std::io::sink())
        .unwrap_err();
    assert!(err.kind.is_not_found());
    assert!(err.summary.starts_with("Could not scan mail root"));
}
