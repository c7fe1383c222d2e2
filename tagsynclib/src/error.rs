/*
 * tagsync - error module
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

//! An error object for `tagsynclib`

use std::{
    borrow::Cow,
    fmt,
    io,
    path::{Path, PathBuf},
    str,
    sync::Arc,
};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ErrorKind {
    #[default]
    None,
    Bug,
    Configuration,
    External,
    LinkedLibrary(&'static str),
    NotFound,
    OSError,
    Platform,
    ValueError,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(
            fmt,
            "{}",
            match self {
                Self::None => "None",
                Self::Bug => "Bug, please report this!",
                Self::Configuration => "Configuration error",
                Self::External => "External command error",
                Self::LinkedLibrary(ref name) => return write!(fmt, "Linked library error: {name}"),
                Self::NotFound => "Not found",
                Self::OSError => "OS Error",
                Self::Platform => "Platform/Runtime environment error (OS or hardware)",
                Self::ValueError => "Invalid value",
            }
        )
    }
}

impl ErrorKind {
    pub const fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration)
    }

    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }
}

#[derive(Clone, Debug)]
pub struct Error {
    pub summary: Cow<'static, str>,
    pub details: Option<Cow<'static, str>>,
    pub source: Option<Arc<dyn std::error::Error + Send + Sync + 'static>>,
    pub related_path: Option<PathBuf>,
    pub kind: ErrorKind,
}

pub trait IntoError {
    fn set_err_summary<M>(self, msg: M) -> Error
    where
        M: Into<Cow<'static, str>>;

    fn set_err_details<M>(self, msg: M) -> Error
    where
        M: Into<Cow<'static, str>>;

    fn set_err_kind(self, kind: ErrorKind) -> Error;

    fn set_err_related_path(self, p: &Path) -> Error;
}

pub trait ResultIntoError<T> {
    fn chain_err_summary<M, F>(self, msg_fn: F) -> Result<T>
    where
        F: Fn() -> M,
        M: Into<Cow<'static, str>>;

    fn chain_err_details<M, F>(self, msg_fn: F) -> Result<T>
    where
        F: Fn() -> M,
        M: Into<Cow<'static, str>>;

    fn chain_err_kind(self, kind: ErrorKind) -> Result<T>;

    fn chain_err_related_path(self, p: &Path) -> Result<T>;
}

impl<I: Into<Error>> IntoError for I {
    #[inline]
    fn set_err_summary<M>(self, msg: M) -> Error
    where
        M: Into<Cow<'static, str>>,
    {
        let err: Error = self.into();
        err.set_summary(msg)
    }

    #[inline]
    fn set_err_details<M>(self, msg: M) -> Error
    where
        M: Into<Cow<'static, str>>,
    {
        let err: Error = self.into();
        err.set_details(msg)
    }

    #[inline]
    fn set_err_kind(self, kind: ErrorKind) -> Error {
        let err: Error = self.into();
        err.set_kind(kind)
    }

    #[inline]
    fn set_err_related_path(self, p: &Path) -> Error {
        let err: Error = self.into();
        err.set_related_path(Some(p))
    }
}

impl<T, I: Into<Error>> ResultIntoError<T> for std::result::Result<T, I> {
    #[inline]
    fn chain_err_summary<M, F>(self, msg_fn: F) -> Result<T>
    where
        F: Fn() -> M,
        M: Into<Cow<'static, str>>,
    {
        self.map_err(|err| err.set_err_summary(msg_fn()))
    }

    #[inline]
    fn chain_err_details<M, F>(self, msg_fn: F) -> Result<T>
    where
        F: Fn() -> M,
        M: Into<Cow<'static, str>>,
    {
        self.map_err(|err| err.set_err_details(msg_fn()))
    }

    #[inline]
    fn chain_err_kind(self, kind: ErrorKind) -> Result<T> {
        self.map_err(|err| err.set_err_kind(kind))
    }

    #[inline]
    fn chain_err_related_path(self, p: &Path) -> Result<T> {
        self.map_err(|err| err.set_err_related_path(p))
    }
}

impl Error {
    pub fn new<M>(msg: M) -> Self
    where
        M: Into<Cow<'static, str>>,
    {
        Self {
            summary: msg.into(),
            details: None,
            source: None,
            related_path: None,
            kind: ErrorKind::None,
        }
    }

    pub fn set_details<M>(mut self, details: M) -> Self
    where
        M: Into<Cow<'static, str>>,
    {
        if let Some(old_details) = self.details.as_ref() {
            self.details = Some(format!("{}. {}", old_details, details.into()).into());
        } else {
            self.details = Some(details.into());
        }
        self
    }

    /// The previous summary is demoted to details.
    pub fn set_summary<M>(mut self, summary: M) -> Self
    where
        M: Into<Cow<'static, str>>,
    {
        let old_summary = std::mem::replace(&mut self.summary, summary.into());
        self.set_details(old_summary)
    }

    pub fn set_source(
        mut self,
        new_val: Option<Arc<dyn std::error::Error + Send + Sync + 'static>>,
    ) -> Self {
        self.source = new_val;
        self
    }

    pub fn set_kind(mut self, new_val: ErrorKind) -> Self {
        self.kind = new_val;
        self
    }

    pub fn set_related_path<P: Into<PathBuf>>(mut self, new_val: Option<P>) -> Self {
        self.related_path = new_val.map(Into::into);
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{}", self.summary)?;
        if let Some(details) = self.details.as_ref() {
            if !details.trim().is_empty() {
                writeln!(f, "{}", details)?;
            }
        }
        if let Some(ref path) = self.related_path {
            writeln!(f, "Related path: {}", path.display())?;
        }
        if let Some(ref source) = self.source {
            write!(f, "Caused by: {}", source)?;
            if !matches!(self.kind, ErrorKind::None) {
                writeln!(f)?;
            }
        }
        if !matches!(self.kind, ErrorKind::None) {
            write!(f, "Error kind: {}", self.kind)?;
        }
        Ok(())
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|s| &(*(*s)) as &(dyn std::error::Error + 'static))
    }
}

impl From<io::ErrorKind> for ErrorKind {
    fn from(kind: io::ErrorKind) -> Self {
        match kind {
            io::ErrorKind::NotFound => Self::NotFound,
            io::ErrorKind::InvalidInput | io::ErrorKind::InvalidData => Self::ValueError,
            _ => Self::OSError,
        }
    }
}

impl From<io::Error> for Error {
    #[inline]
    fn from(err: io::Error) -> Self {
        let s = err.to_string();
        let kind = ErrorKind::from(err.kind());
        Self::new(s)
            .set_kind(kind)
            .set_source(Some(Arc::new(err)))
    }
}

impl From<str::Utf8Error> for Error {
    #[inline]
    fn from(err: str::Utf8Error) -> Self {
        Self::new(err.to_string())
            .set_kind(ErrorKind::ValueError)
            .set_source(Some(Arc::new(err)))
    }
}

impl From<std::ffi::NulError> for Error {
    #[inline]
    fn from(err: std::ffi::NulError) -> Self {
        Self::new(err.to_string())
            .set_kind(ErrorKind::ValueError)
            .set_source(Some(Arc::new(err)))
    }
}

impl From<libloading::Error> for Error {
    #[inline]
    fn from(err: libloading::Error) -> Self {
        Self::new(err.to_string()).set_source(Some(Arc::new(err)))
    }
}

impl From<nix::Error> for Error {
    #[inline]
    fn from(err: nix::Error) -> Self {
        Self::new(err.to_string())
            .set_kind(ErrorKind::OSError)
            .set_source(Some(Arc::new(err)))
    }
}

impl From<toml::de::Error> for Error {
    #[inline]
    fn from(err: toml::de::Error) -> Self {
        Self::new("Could not parse configuration file")
            .set_details(err.to_string())
            .set_kind(ErrorKind::Configuration)
            .set_source(Some(Arc::new(err)))
    }
}

impl From<toml::ser::Error> for Error {
    #[inline]
    fn from(err: toml::ser::Error) -> Self {
        Self::new(err.to_string())
            .set_kind(ErrorKind::Bug)
            .set_source(Some(Arc::new(err)))
    }
}

impl From<xdg::BaseDirectoriesError> for Error {
    #[inline]
    fn from(err: xdg::BaseDirectoriesError) -> Self {
        Self::new(err.to_string())
            .set_kind(ErrorKind::Platform)
            .set_source(Some(Arc::new(err)))
    }
}

impl From<&str> for Error {
    #[inline]
    fn from(err: &str) -> Self {
        Self::new(err.to_string())
    }
}

impl From<String> for Error {
    #[inline]
    fn from(err: String) -> Self {
        Self::new(err)
    }
}
