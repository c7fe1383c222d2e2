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

use std::{ffi::CString, marker::PhantomData, ptr::NonNull, sync::Arc};

use super::{ffi, DbConnection, MessageIterator, NotmuchLibrary};
use crate::error::{Error, Result, ResultIntoError};

pub struct NotmuchQuery<'db> {
    pub lib: Arc<NotmuchLibrary>,
    pub ptr: NonNull<ffi::notmuch_query_t>,
    pub query_str: &'db str,
    _ph: PhantomData<&'db DbConnection>,
}

impl<'db> NotmuchQuery<'db> {
    pub fn new(database: &'db DbConnection, query_str: &'db str) -> Result<Self> {
        let lib: Arc<NotmuchLibrary> = database.lib.clone();
        let query_cstr = CString::new(query_str)?;
        let query: *mut ffi::notmuch_query_t = unsafe {
            call!(lib, notmuch_query_create)(database.as_ptr(), query_cstr.as_ptr())
        };
        log::trace!("notmuch query {query_str}");
        Ok(NotmuchQuery {
            lib,
            ptr: NonNull::new(query)
                .ok_or_else(|| Error::new("Could not create query. Out of memory?"))?,
            query_str,
            _ph: PhantomData,
        })
    }

    pub fn count(&self) -> Result<u32> {
        let mut count = 0_u32;
        unsafe {
            try_call!(
                self.lib,
                call!(self.lib, notmuch_query_count_messages)(
                    self.ptr.as_ptr(),
                    std::ptr::addr_of_mut!(count)
                )
            )
        }
        .chain_err_summary(|| format!("Could not count messages for `{}`", self.query_str))?;
        Ok(count)
    }

    pub fn search(&self) -> Result<MessageIterator<'_>> {
        let mut messages: *mut ffi::notmuch_messages_t = std::ptr::null_mut();
        unsafe {
            try_call!(
                self.lib,
                call!(self.lib, notmuch_query_search_messages)(
                    self.ptr.as_ptr(),
                    std::ptr::addr_of_mut!(messages),
                )
            )
        }
        .chain_err_summary(|| format!("Search for `{}` failed", self.query_str))?;
        let messages = NonNull::new(messages).ok_or_else(|| {
            Error::new(format!(
                "Search for {} failed because of an internal libnotmuch error.",
                self.query_str
            ))
            .set_details(
                "notmuch_query_search_messages returned status == 0 but the passed `messages` \
                 pointer argument is NULL.",
            )
            .set_kind(self.lib.error_kind())
        })?;
        Ok(MessageIterator {
            lib: self.lib.clone(),
            messages: Some(messages),
            _ph: PhantomData,
        })
    }
}

impl Drop for NotmuchQuery<'_> {
    fn drop(&mut self) {
        unsafe {
            call!(self.lib, notmuch_query_destroy)(self.ptr.as_ptr());
        }
    }
}
