/*
 * tagsync - notmuch index
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

//! [`TagIndex`] backed by `libnotmuch`, loaded at runtime with
//! [`libloading`].

use std::{
    borrow::Cow,
    ffi::{CStr, CString},
    os::unix::ffi::OsStrExt,
    path::{Path, PathBuf},
    ptr::NonNull,
    sync::Arc,
};

use super::{AccessMode, IndexOpener, MessageEntry, Query, TagIndex};
use crate::{
    error::{Error, ErrorKind, Result},
    utils::shellexpand::ShellExpandTrait,
};

macro_rules! call {
    ($lib:expr, $func:ident) => {
        ($lib.api.$func)
    };
}

macro_rules! try_call {
    ($lib:expr, $call:expr) => {{
        let status = $call;
        if status == $crate::index::notmuch::ffi::NOTMUCH_STATUS_SUCCESS {
            Ok(())
        } else {
            Err($crate::index::notmuch::NotmuchError::new(&$lib, status))
        }
    }};
}

pub mod ffi;
mod message;
mod query;
mod tags;

pub use message::*;
pub use query::*;
pub use tags::*;

pub const NOTMUCH_ERROR_DETAILS: &str = "If notmuch is installed but the library isn't found, \
                                         you can set the `library_file_path` configuration \
                                         value to the location of `libnotmuch`.";

/// A status code returned by `libnotmuch`, with its description.
#[derive(Clone, Debug)]
pub struct NotmuchError {
    pub status: ffi::notmuch_status_t,
    pub message: String,
}

impl NotmuchError {
    pub fn new(lib: &NotmuchLibrary, status: ffi::notmuch_status_t) -> Self {
        let c_str = unsafe { call!(lib, notmuch_status_to_string)(status) };
        let message = if c_str.is_null() {
            format!("notmuch status {status}")
        } else {
            unsafe { CStr::from_ptr(c_str) }
                .to_string_lossy()
                .into_owned()
        };
        Self { status, message }
    }
}

impl std::fmt::Display for NotmuchError {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(fmt, "{}", self.message)
    }
}

impl std::error::Error for NotmuchError {}

impl From<NotmuchError> for Error {
    fn from(err: NotmuchError) -> Self {
        let kind = if err.status == ffi::NOTMUCH_STATUS_READ_ONLY_DATABASE {
            ErrorKind::Bug
        } else {
            ErrorKind::LinkedLibrary("notmuch")
        };
        Self::new(err.message.clone())
            .set_kind(kind)
            .set_source(Some(Arc::new(err)))
    }
}

pub struct NotmuchLibrary {
    pub inner: libloading::Library,
    pub api: ffi::NotmuchApi,
    pub dlpath: Cow<'static, str>,
}

impl std::fmt::Debug for NotmuchLibrary {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        fmt.debug_struct(stringify!(NotmuchLibrary))
            .field("dlpath", &self.dlpath)
            .finish_non_exhaustive()
    }
}

impl NotmuchLibrary {
    #[cfg(target_os = "linux")]
    pub const DEFAULT_DYLIB_NAME: &'static str = "libnotmuch.so.5";

    #[cfg(target_os = "macos")]
    pub const DEFAULT_DYLIB_NAME: &'static str = "libnotmuch.5.dylib";

    #[cfg(not(any(target_os = "linux", target_os = "macos")))]
    pub const DEFAULT_DYLIB_NAME: &'static str = "libnotmuch.so";

    /// Load `libnotmuch`, either from the user configured `library_file_path`
    /// or by its default name.
    pub fn load(library_file_path: Option<&Path>) -> Result<Arc<Self>> {
        let (dlpath, custom_dlpath) = match library_file_path {
            Some(lib_path) => {
                let expanded_path = lib_path.expand();
                if expanded_path.try_exists().unwrap_or(false) {
                    (Cow::Owned(expanded_path.display().to_string()), true)
                } else {
                    (Cow::Owned(lib_path.display().to_string()), true)
                }
            }
            None => (Cow::Borrowed(Self::DEFAULT_DYLIB_NAME), false),
        };
        let inner = match unsafe { libloading::Library::new(dlpath.as_ref()) } {
            Ok(l) => l,
            Err(err) if custom_dlpath => {
                return Err(Error::new(format!(
                    "Notmuch `library_file_path` setting value `{dlpath}` does not exist or is a \
                     directory or not a valid library file."
                ))
                .set_kind(ErrorKind::Configuration)
                .set_source(Some(Arc::new(err))));
            }
            Err(err) => {
                return Err(Error::new("Could not load libnotmuch!")
                    .set_details(NOTMUCH_ERROR_DETAILS)
                    .set_kind(ErrorKind::LinkedLibrary("notmuch"))
                    .set_source(Some(Arc::new(err))));
            }
        };
        let api = unsafe { ffi::NotmuchApi::load(&inner) }.map_err(|err| {
            err.set_summary(format!(
                "Library `{dlpath}` does not look like a compatible libnotmuch."
            ))
            .set_kind(ErrorKind::LinkedLibrary("notmuch"))
        })?;
        log::trace!("loaded {dlpath}");
        Ok(Arc::new(Self { inner, api, dlpath }))
    }

    fn error_kind(&self) -> ErrorKind {
        ErrorKind::LinkedLibrary(match self.dlpath {
            Cow::Borrowed(v) => v,
            Cow::Owned(_) => "user configured path",
        })
    }
}

/// An open notmuch database. Closed and destroyed on drop.
#[derive(Debug)]
pub struct DbConnection {
    pub lib: Arc<NotmuchLibrary>,
    inner: NonNull<ffi::notmuch_database_t>,
    mode: AccessMode,
    path: PathBuf,
}

impl DbConnection {
    pub fn new(path: &Path, lib: Arc<NotmuchLibrary>, mode: AccessMode) -> Result<Self> {
        if !path.is_dir() {
            return Err(Error::new(format!(
                "Notmuch database path {} is not a directory.",
                path.display()
            ))
            .set_kind(ErrorKind::Configuration)
            .set_related_path(Some(path)));
        }
        let path_c = CString::new(path.as_os_str().as_bytes())?;
        let mut database: *mut ffi::notmuch_database_t = std::ptr::null_mut();
        let status = unsafe {
            call!(lib, notmuch_database_open)(
                path_c.as_ptr(),
                match mode {
                    AccessMode::ReadOnly => ffi::NOTMUCH_DATABASE_MODE_READ_ONLY,
                    AccessMode::ReadWrite => ffi::NOTMUCH_DATABASE_MODE_READ_WRITE,
                },
                std::ptr::addr_of_mut!(database),
            )
        };
        if status != ffi::NOTMUCH_STATUS_SUCCESS {
            return Err(Error::new(format!(
                "Could not open notmuch database at path {}.",
                path.display()
            ))
            .set_details(NotmuchError::new(&lib, status).message)
            .set_kind(ErrorKind::LinkedLibrary("notmuch"))
            .set_related_path(Some(path)));
        }
        let inner = NonNull::new(database).ok_or_else(|| {
            Error::new("notmuch_database_open returned a NULL pointer and status = 0")
                .set_kind(lib.error_kind())
                .set_details(
                    "libnotmuch exhibited an unexpected and unrecoverable error. Make sure your \
                     libnotmuch version is compatible with this release.",
                )
        })?;
        log::trace!("opened notmuch database {} ({mode})", path.display());
        Ok(Self {
            lib,
            inner,
            mode,
            path: path.to_path_buf(),
        })
    }

    #[inline]
    pub(super) fn as_ptr(&self) -> *mut ffi::notmuch_database_t {
        self.inner.as_ptr()
    }

    pub fn mode(&self) -> AccessMode {
        self.mode
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for DbConnection {
    fn drop(&mut self) {
        unsafe {
            if let Err(err) = try_call!(
                self.lib,
                call!(self.lib, notmuch_database_close)(self.inner.as_ptr())
            ) {
                log::error!("Could not call C notmuch_database_close: {err}");
                return;
            }
            if let Err(err) = try_call!(
                self.lib,
                call!(self.lib, notmuch_database_destroy)(self.inner.as_ptr())
            ) {
                log::error!("Could not call C notmuch_database_destroy: {err}");
            }
        }
    }
}

/// A [`TagIndex`] over a notmuch database.
#[derive(Debug)]
pub struct NotmuchIndex {
    db: DbConnection,
}

impl NotmuchIndex {
    pub fn open(path: &Path, lib: Arc<NotmuchLibrary>, mode: AccessMode) -> Result<Self> {
        Ok(Self {
            db: DbConnection::new(path, lib, mode)?,
        })
    }

    fn find(&self, message_id: &str) -> Result<Message<'_>> {
        let msg_id = CString::new(message_id)?;
        Message::find_message(&self.db, &msg_id)
    }
}

impl TagIndex for NotmuchIndex {
    fn mode(&self) -> AccessMode {
        self.db.mode()
    }

    fn count(&self, query: &Query) -> Result<u32> {
        let query_str = query.to_string();
        let query = NotmuchQuery::new(&self.db, &query_str)?;
        query.count()
    }

    fn search(&self, query: &Query) -> Result<Vec<MessageEntry>> {
        let query_str = query.to_string();
        let query = NotmuchQuery::new(&self.db, &query_str)?;
        let mut ret = vec![];
        for message in query.search()? {
            ret.push(message.to_entry());
        }
        Ok(ret)
    }

    fn add_tag(&mut self, message_id: &str, tag: &str) -> Result<()> {
        let tag = CString::new(tag)?;
        self.find(message_id)?.add_tag(&tag)
    }

    fn remove_tag(&mut self, message_id: &str, tag: &str) -> Result<()> {
        let tag = CString::new(tag)?;
        self.find(message_id)?.remove_tag(&tag)
    }
}

/// Opens [`NotmuchIndex`] handles on one database path.
///
/// `libnotmuch` is loaded on the first [`IndexOpener::open`] call, so runs
/// that never touch the index do not need it installed.
#[derive(Debug)]
pub struct NotmuchOpener {
    lib: Option<Arc<NotmuchLibrary>>,
    library_file_path: Option<PathBuf>,
    path: PathBuf,
}

impl NotmuchOpener {
    pub fn new(path: PathBuf, library_file_path: Option<PathBuf>) -> Self {
        Self {
            lib: None,
            library_file_path,
            path,
        }
    }

    fn library(&mut self) -> Result<Arc<NotmuchLibrary>> {
        if let Some(lib) = self.lib.as_ref() {
            return Ok(lib.clone());
        }
        let lib = NotmuchLibrary::load(self.library_file_path.as_deref())?;
        self.lib = Some(lib.clone());
        Ok(lib)
    }
}

impl IndexOpener for NotmuchOpener {
    fn open(&mut self, mode: AccessMode) -> Result<Box<dyn TagIndex + '_>> {
        let lib = self.library()?;
        Ok(Box::new(NotmuchIndex::open(&self.path, lib, mode)?))
    }
}
