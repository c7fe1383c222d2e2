/*
 * tagsync - maildir copy module
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

//! Copying message contents between open files.

use std::{fs::File, io};

/// Copies the contents of one open file into another.
pub trait Copier {
    fn copy(&mut self, src: &mut File, dest: &mut File) -> io::Result<()>;
}

#[cfg(target_os = "linux")]
mod ficlone {
    // FICLONE = _IOW(0x94, 9, int)
    nix::ioctl_write_int!(ficlone, 0x94, 9);
}

/// Copies file contents, trying a copy-on-write clone first where the
/// platform offers one.
///
/// Once a clone attempt has failed and the byte copy fallback succeeded,
/// cloning is not attempted again by this copier.
pub struct FileCopier {
    try_clone: bool,
    clone_file: fn(&File, &File) -> io::Result<()>,
}

impl std::fmt::Debug for FileCopier {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        fmt.debug_struct(stringify!(FileCopier))
            .field("try_clone", &self.try_clone)
            .finish_non_exhaustive()
    }
}

impl Default for FileCopier {
    fn default() -> Self {
        Self::new()
    }
}

impl FileCopier {
    pub fn new() -> Self {
        Self {
            try_clone: cfg!(target_os = "linux"),
            clone_file: Self::clone_file,
        }
    }

    /// A copier that only ever copies bytes.
    pub fn plain() -> Self {
        Self {
            try_clone: false,
            clone_file: Self::clone_file,
        }
    }

    pub fn tries_clone(&self) -> bool {
        self.try_clone
    }

    #[cfg(target_os = "linux")]
    fn clone_file(src: &File, dest: &File) -> io::Result<()> {
        use std::os::unix::io::AsRawFd;

        // SAFETY: both descriptors are open for the duration of the call.
        unsafe { ficlone::ficlone(dest.as_raw_fd(), src.as_raw_fd() as _) }
            .map(|_| ())
            .map_err(io::Error::from)
    }

    #[cfg(not(target_os = "linux"))]
    fn clone_file(_: &File, _: &File) -> io::Result<()> {
        Err(io::Error::from(io::ErrorKind::Unsupported))
    }
}

impl Copier for FileCopier {
    fn copy(&mut self, src: &mut File, dest: &mut File) -> io::Result<()> {
        let mut clone_failed = false;
        if self.try_clone {
            match (self.clone_file)(src, dest) {
                Ok(()) => return Ok(()),
                Err(err) => {
                    log::trace!("copy-on-write clone failed, copying bytes: {err}");
                    clone_failed = true;
                }
            }
        }
        io::copy(src, dest)?;
        if clone_failed {
            self.try_clone = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Seek, Write};

    use super::*;

    #[test]
    fn test_copier_copies_contents() {
        let tmp_dir = tempfile::tempdir().unwrap();
        let src_path = tmp_dir.path().join("src");
        let dest_path = tmp_dir.path().join("dest");
        {
            let mut f = File::create(&src_path).unwrap();
            f.write_all(b"Subject: hello\n\nbody\n").unwrap();
        }
        let mut src = File::open(&src_path).unwrap();
        let mut dest = std::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(&dest_path)
            .unwrap();
        let mut copier = FileCopier::new();
        copier.copy(&mut src, &mut dest).unwrap();
        dest.rewind().unwrap();
        let mut contents = String::new();
        dest.read_to_string(&mut contents).unwrap();
        assert_eq!(contents, "Subject: hello\n\nbody\n");

        let mut plain = FileCopier::plain();
        assert!(!plain.tries_clone());
        let mut src = File::open(&src_path).unwrap();
        let mut dest = File::create(tmp_dir.path().join("dest2")).unwrap();
        plain.copy(&mut src, &mut dest).unwrap();
        assert_eq!(
            std::fs::read(tmp_dir.path().join("dest2")).unwrap(),
            b"Subject: hello\n\nbody\n"
        );
    }

    fn clone_unsupported(_: &File, _: &File) -> io::Result<()> {
        Err(io::Error::from(io::ErrorKind::Unsupported))
    }

    #[test]
    fn test_copier_stops_cloning_after_fallback() {
        let tmp_dir = tempfile::tempdir().unwrap();
        let src_path = tmp_dir.path().join("src");
        std::fs::write(&src_path, b"Subject: hello\n\nbody\n").unwrap();
        let mut copier = FileCopier {
            try_clone: true,
            clone_file: clone_unsupported,
        };

        // Clone and byte copy both fail: keep trying clones.
        std::fs::write(tmp_dir.path().join("readonly"), b"").unwrap();
        let mut src = File::open(&src_path).unwrap();
        let mut dest = File::open(tmp_dir.path().join("readonly")).unwrap();
        assert!(copier.copy(&mut src, &mut dest).is_err());
        assert!(copier.tries_clone());

        // Clone fails, byte copy succeeds: stop cloning.
        let mut src = File::open(&src_path).unwrap();
        let mut dest = File::create(tmp_dir.path().join("dest")).unwrap();
        copier.copy(&mut src, &mut dest).unwrap();
        assert!(!copier.tries_clone());
        assert_eq!(
            std::fs::read(tmp_dir.path().join("dest")).unwrap(),
            b"Subject: hello\n\nbody\n"
        );
    }
}
