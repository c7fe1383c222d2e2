/*
 * tagsync - shellexpand module
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

//! A `ShellExpandTrait` to expand paths like a shell.

use std::path::{Path, PathBuf};

pub trait ShellExpandTrait {
    /// Expand a leading `~` to `$HOME` and whole `$VAR` components to the
    /// value of the environment variable `VAR` (upper case names only).
    fn expand(&self) -> PathBuf;
}

impl ShellExpandTrait for Path {
    fn expand(&self) -> PathBuf {
        let mut ret = PathBuf::new();
        for c in self.components() {
            let c_to_str = c.as_os_str().to_str();
            match c_to_str {
                Some("~") => {
                    if let Ok(home_dir) = std::env::var("HOME") {
                        ret.push(home_dir)
                    } else {
                        return PathBuf::new();
                    }
                }
                Some(var) if var.starts_with('$') => {
                    let env_name = var.split_at(1).1;
                    if !env_name.is_empty()
                        && env_name
                            .chars()
                            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
                    {
                        ret.push(std::env::var(env_name).unwrap_or_default());
                    } else {
                        ret.push(c);
                    }
                }
                Some(_) => {
                    ret.push(c);
                }
                None => {
                    /* path is not valid UTF-8; leave it as-is */
                    return self.to_path_buf();
                }
            }
        }
        ret
    }
}

impl ShellExpandTrait for PathBuf {
    fn expand(&self) -> PathBuf {
        self.as_path().expand()
    }
}

#[cfg(test)]
mod tests {
    use rusty_fork::rusty_fork_test;

    use super::*;

    rusty_fork_test! {
        #[test]
        fn test_shellexpand_home_and_vars() {
            std::env::set_var("HOME", "/home/user");
            std::env::set_var("MAIL_ROOT", "/srv/mail");
            assert_eq!(Path::new("~/.mail").expand(), Path::new("/home/user/.mail"));
            assert_eq!(Path::new("$MAIL_ROOT/inbox").expand(), Path::new("/srv/mail/inbox"));
            assert_eq!(Path::new("/plain/$lower").expand(), Path::new("/plain/$lower"));
        }
    }
}
