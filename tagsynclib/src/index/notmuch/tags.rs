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

use std::{ffi::CStr, ptr::NonNull};

use super::{ffi, Message};

pub struct TagIterator<'m> {
    pub tags: Option<NonNull<ffi::notmuch_tags_t>>,
    pub message: &'m Message<'m>,
}

impl Drop for TagIterator<'_> {
    fn drop(&mut self) {
        if let Some(tags) = self.tags.take() {
            unsafe { call!(self.message.lib, notmuch_tags_destroy)(tags.as_ptr()) };
        }
    }
}

impl<'m> TagIterator<'m> {
    pub fn new(message: &'m Message<'m>) -> Self {
        Self {
            tags: NonNull::new(unsafe {
                call!(message.lib, notmuch_message_get_tags)(message.message.as_ptr())
            }),
            message,
        }
    }
}

impl<'m> Iterator for TagIterator<'m> {
    type Item = &'m CStr;

    fn next(&mut self) -> Option<Self::Item> {
        let tags = self.tags?;
        if unsafe { call!(self.message.lib, notmuch_tags_valid)(tags.as_ptr()) } == 1 {
            let ret = unsafe {
                CStr::from_ptr(call!(self.message.lib, notmuch_tags_get)(tags.as_ptr()))
            };
            unsafe {
                call!(self.message.lib, notmuch_tags_move_to_next)(tags.as_ptr());
            }
            Some(ret)
        } else {
            unsafe { call!(self.message.lib, notmuch_tags_destroy)(tags.as_ptr()) };
            self.tags = None;
            None
        }
    }
}

/// Every file name the index holds for one message.
pub struct FilenameIterator<'m> {
    pub filenames: Option<NonNull<ffi::notmuch_filenames_t>>,
    pub message: &'m Message<'m>,
}

impl Drop for FilenameIterator<'_> {
    fn drop(&mut self) {
        if let Some(filenames) = self.filenames.take() {
            unsafe { call!(self.message.lib, notmuch_filenames_destroy)(filenames.as_ptr()) };
        }
    }
}

impl<'m> FilenameIterator<'m> {
    pub fn new(message: &'m Message<'m>) -> Self {
        Self {
            filenames: NonNull::new(unsafe {
                call!(message.lib, notmuch_message_get_filenames)(message.message.as_ptr())
            }),
            message,
        }
    }
}

impl<'m> Iterator for FilenameIterator<'m> {
    type Item = &'m CStr;

    fn next(&mut self) -> Option<Self::Item> {
        let filenames = self.filenames?;
        if unsafe { call!(self.message.lib, notmuch_filenames_valid)(filenames.as_ptr()) } == 1 {
            let ret = unsafe {
                CStr::from_ptr(call!(self.message.lib, notmuch_filenames_get)(
                    filenames.as_ptr(),
                ))
            };
            unsafe {
                call!(self.message.lib, notmuch_filenames_move_to_next)(filenames.as_ptr());
            }
            Some(ret)
        } else {
            unsafe { call!(self.message.lib, notmuch_filenames_destroy)(filenames.as_ptr()) };
            self.filenames = None;
            None
        }
    }
}
