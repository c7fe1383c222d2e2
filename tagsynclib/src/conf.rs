/*
 * tagsync - configuration module
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

//! Run settings and the optional TOML configuration file.
//!
//! ```toml
//! database = "~/.mail"
//! new_tag = "new"
//! sync_command = "mbsync -a"
//! reindex_command = "notmuch new"
//! verbosity = 1
//! dry_run = false
//! log_file = "~/.cache/tagsync.log"
//! library_file_path = "/usr/lib/libnotmuch.so.5"
//! ```

use std::{
    env,
    path::{Path, PathBuf},
};

use crate::{
    error::{Error, ErrorKind, Result, ResultIntoError},
    utils::shellexpand::ShellExpandTrait,
};

/// Environment variable naming the configuration file.
pub const CONFIG_ENV_VAR: &str = "TAGSYNC_CONFIG";

pub mod defaults {
    use std::path::PathBuf;

    pub fn database() -> PathBuf {
        PathBuf::from("~/.mail")
    }

    pub fn new_tag() -> String {
        "new".to_string()
    }

    pub fn sync_command() -> String {
        "mbsync -a".to_string()
    }

    pub fn reindex_command() -> String {
        "notmuch new".to_string()
    }

    pub const fn verbosity() -> u8 {
        1
    }
}

/// Everything a run needs to know.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// The mail root and notmuch database path.
    #[serde(default = "defaults::database")]
    pub database: PathBuf,
    /// The transient tag marking freshly delivered mail.
    #[serde(default = "defaults::new_tag")]
    pub new_tag: String,
    #[serde(default = "defaults::sync_command")]
    pub sync_command: String,
    #[serde(default = "defaults::reindex_command")]
    pub reindex_command: String,
    /// `0` quiet, `1` per-folder summaries, `2` per-message details.
    #[serde(default = "defaults::verbosity")]
    pub verbosity: u8,
    #[serde(default)]
    pub dry_run: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub library_file_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database: defaults::database(),
            new_tag: defaults::new_tag(),
            sync_command: defaults::sync_command(),
            reindex_command: defaults::reindex_command(),
            verbosity: defaults::verbosity(),
            dry_run: false,
            log_file: None,
            library_file_path: None,
        }
    }
}

impl Settings {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string(self)?)
    }

    /// Read settings from `path`.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .chain_err_summary(|| format!("Could not read configuration file {}", path.display()))
            .chain_err_related_path(path)?;
        Self::from_toml_str(&contents)
            .chain_err_summary(|| {
                format!("Could not parse configuration file {}", path.display())
            })
            .chain_err_kind(ErrorKind::Configuration)
            .chain_err_related_path(path)
    }

    /// Read settings from the configuration file, if any. See
    /// [`config_file`].
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match config_file(explicit)? {
            Some(path) => {
                log::trace!("reading configuration from {}", path.display());
                Self::from_file(&path)
            }
            None => Ok(Self::default()),
        }
    }

    /// Expand `~` and `$VAR` in every path. An existing `database` is also
    /// canonicalized; index file names are matched against it by prefix.
    pub fn expand_paths(&mut self) {
        self.database = self.database.expand();
        if let Ok(canonical) = self.database.canonicalize() {
            self.database = canonical;
        }
        if let Some(p) = self.log_file.as_mut() {
            *p = p.expand();
        }
        if let Some(p) = self.library_file_path.as_mut() {
            *p = p.expand();
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.new_tag.trim().is_empty() {
            return Err(Error::new("`new_tag` must not be empty.")
                .set_kind(ErrorKind::Configuration));
        }
        if self.database.as_os_str().is_empty() {
            return Err(Error::new("`database` must not be empty.")
                .set_kind(ErrorKind::Configuration));
        }
        if !self.database.is_dir() {
            return Err(Error::new(format!(
                "`database` {} is not a directory.",
                self.database.display()
            ))
            .set_kind(ErrorKind::Configuration)
            .set_related_path(Some(&self.database)));
        }
        Ok(())
    }
}

/// Locate the configuration file.
///
/// An explicitly given path wins, then `$TAGSYNC_CONFIG`, then
/// `$XDG_CONFIG_HOME/tagsync/config.toml`. A missing explicit file is an
/// error; a missing default file means "no configuration file".
pub fn config_file(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
    let named = explicit
        .map(Path::to_path_buf)
        .or_else(|| env::var_os(CONFIG_ENV_VAR).map(PathBuf::from));
    if let Some(path) = named {
        let path = path.expand();
        if path.as_os_str().is_empty() {
            return Err(Error::new("Given configuration path is empty.")
                .set_kind(ErrorKind::Configuration));
        }
        if !path.is_file() {
            return Err(Error::new(format!(
                "Configuration file {} does not exist.",
                path.display()
            ))
            .set_kind(ErrorKind::Configuration)
            .set_related_path(Some(path)));
        }
        return Ok(Some(path));
    }
    let xdg_dirs = xdg::BaseDirectories::with_prefix("tagsync")?;
    Ok(xdg_dirs.find_config_file("config.toml"))
}
