/*
 * tagsync - utils module
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

//! Utility modules for general use.

pub mod logging;
pub mod shellexpand;

pub mod hostname {
    //! Get local hostname.
    use std::io::Read;

    use crate::error::{Error, ErrorKind, Result};

    /// Get local hostname with the `gethostname()` libc function, falling
    /// back to `/etc/hostname`.
    pub fn hostname() -> Result<std::ffi::OsString> {
        let retval = nix::unistd::gethostname().map_err(|err| {
            Error::new("Could not discover local hostname")
                .set_source(Some(std::sync::Arc::new(err)))
                .set_kind(ErrorKind::OSError)
        });
        if retval.is_err() {
            let mut hostn_buf = String::with_capacity(256);
            if matches!(
                std::fs::File::open("/etc/hostname")
                    .ok()
                    .and_then(|mut f| f.read_to_string(&mut hostn_buf).ok()),
                Some(n) if n > 0
            ) {
                return Ok(hostn_buf.trim().to_string().into());
            }
        }
        retval
    }
}

pub mod clock {
    //! Wall clock helpers.
    use std::time::SystemTime;

    /// Seconds since the UNIX epoch. A clock set before the epoch reads as
    /// `0`.
    pub fn unix_seconds() -> u64 {
        SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}
