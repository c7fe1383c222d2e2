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

use std::{
    ffi::{CStr, OsStr},
    marker::PhantomData,
    os::unix::ffi::OsStrExt,
    path::PathBuf,
    ptr::NonNull,
    sync::Arc,
};

use super::{ffi, DbConnection, FilenameIterator, NotmuchLibrary, TagIterator};
use crate::{
    error::{Error, ErrorKind, Result, ResultIntoError},
    index::MessageEntry,
};

pub struct Message<'m> {
    pub lib: Arc<NotmuchLibrary>,
    pub message: NonNull<ffi::notmuch_message_t>,
    /// Messages yielded by a [`MessageIterator`] are owned by it.
    owned: bool,
    pub _ph: PhantomData<&'m ffi::notmuch_message_t>,
}

impl<'m> Message<'m> {
    pub fn find_message(db: &'m DbConnection, msg_id: &CStr) -> Result<Message<'m>> {
        let mut message: *mut ffi::notmuch_message_t = std::ptr::null_mut();
        let lib = db.lib.clone();
        unsafe {
            try_call!(
                lib,
                call!(lib, notmuch_database_find_message)(
                    db.as_ptr(),
                    msg_id.as_ptr(),
                    std::ptr::addr_of_mut!(message),
                )
            )
        }
        .chain_err_summary(|| format!("Could not look up message id {:?}", msg_id))?;
        Ok(Message {
            lib,
            message: NonNull::new(message).ok_or_else(|| {
                Error::new(format!(
                    "Message with message id {:?} not found in notmuch database.",
                    msg_id
                ))
                .set_kind(ErrorKind::NotFound)
            })?,
            owned: true,
            _ph: PhantomData,
        })
    }

    pub fn msg_id(&self) -> &CStr {
        let msg_id =
            unsafe { call!(self.lib, notmuch_message_get_message_id)(self.message.as_ptr()) };
        unsafe { CStr::from_ptr(msg_id) }
    }

    pub fn header(&self, header: &CStr) -> Option<&[u8]> {
        let header_val = unsafe {
            call!(self.lib, notmuch_message_get_header)(self.message.as_ptr(), header.as_ptr())
        };
        if header_val.is_null() {
            None
        } else {
            Some(unsafe { CStr::from_ptr(header_val) }.to_bytes())
        }
    }

    pub fn filenames(&self) -> FilenameIterator<'_> {
        FilenameIterator::new(self)
    }

    pub fn tags(&self) -> TagIterator<'_> {
        TagIterator::new(self)
    }

    pub fn add_tag(&self, tag: &CStr) -> Result<()> {
        unsafe {
            try_call!(
                self.lib,
                call!(self.lib, notmuch_message_add_tag)(self.message.as_ptr(), tag.as_ptr())
            )
        }
        .chain_err_summary(|| format!("Could not add tag {:?} to message", tag))?;
        Ok(())
    }

    pub fn remove_tag(&self, tag: &CStr) -> Result<()> {
        unsafe {
            try_call!(
                self.lib,
                call!(self.lib, notmuch_message_remove_tag)(self.message.as_ptr(), tag.as_ptr())
            )
        }
        .chain_err_summary(|| format!("Could not remove tag {:?} from message", tag))?;
        Ok(())
    }

    /// Snapshot id, files, subject and tags.
    pub fn to_entry(&self) -> MessageEntry {
        let subject = self
            .header(unsafe { CStr::from_bytes_with_nul_unchecked(b"subject\0") })
            .filter(|s| !s.is_empty())
            .map(|s| String::from_utf8_lossy(s).into_owned());
        MessageEntry {
            id: self.msg_id().to_string_lossy().into_owned(),
            filenames: self
                .filenames()
                .map(|f| PathBuf::from(OsStr::from_bytes(f.to_bytes())))
                .collect(),
            subject,
            tags: self
                .tags()
                .map(|t| t.to_string_lossy().into_owned())
                .collect(),
        }
    }
}

impl Drop for Message<'_> {
    fn drop(&mut self) {
        if self.owned {
            unsafe { call!(self.lib, notmuch_message_destroy)(self.message.as_ptr()) };
        }
    }
}

pub struct MessageIterator<'q> {
    pub lib: Arc<NotmuchLibrary>,
    pub messages: Option<NonNull<ffi::notmuch_messages_t>>,
    pub _ph: PhantomData<&'q ffi::notmuch_query_t>,
}

impl<'q> Iterator for MessageIterator<'q> {
    type Item = Message<'q>;

    fn next(&mut self) -> Option<Self::Item> {
        let messages = self.messages?;
        if unsafe { call!(self.lib, notmuch_messages_valid)(messages.as_ptr()) } == 1 {
            let message = unsafe { call!(self.lib, notmuch_messages_get)(messages.as_ptr()) };
            unsafe {
                call!(self.lib, notmuch_messages_move_to_next)(messages.as_ptr());
            }
            Some(Message {
                lib: self.lib.clone(),
                message: NonNull::new(message)?,
                owned: false,
                _ph: PhantomData,
            })
        } else {
            unsafe { call!(self.lib, notmuch_messages_destroy)(messages.as_ptr()) };
            self.messages = None;
            None
        }
    }
}

impl Drop for MessageIterator<'_> {
    fn drop(&mut self) {
        if let Some(messages) = self.messages.take() {
            unsafe { call!(self.lib, notmuch_messages_destroy)(messages.as_ptr()) };
        }
    }
}
