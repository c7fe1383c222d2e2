/*
 * tagsync - notmuch bindings
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

//! The subset of the `notmuch.h` API used by tagsync, as function pointer
//! types resolved from the shared library at runtime.

#![allow(non_camel_case_types)]

use std::ffi::{c_char, c_int, c_uint};

pub type notmuch_bool_t = c_int;
pub type notmuch_status_t = c_uint;
pub type notmuch_database_mode_t = c_uint;

pub const NOTMUCH_STATUS_SUCCESS: notmuch_status_t = 0;
pub const NOTMUCH_STATUS_READ_ONLY_DATABASE: notmuch_status_t = 4;

pub const NOTMUCH_DATABASE_MODE_READ_ONLY: notmuch_database_mode_t = 0;
pub const NOTMUCH_DATABASE_MODE_READ_WRITE: notmuch_database_mode_t = 1;

macro_rules! opaque {
    ($($t:ident),* $(,)?) => {
        $(
            #[repr(C)]
            pub struct $t {
                _unused: [u8; 0],
            }
        )*
    };
}

opaque!(
    notmuch_database_t,
    notmuch_query_t,
    notmuch_messages_t,
    notmuch_message_t,
    notmuch_filenames_t,
    notmuch_tags_t,
);

pub type notmuch_status_to_string =
    unsafe extern "C" fn(status: notmuch_status_t) -> *const c_char;

pub type notmuch_database_open = unsafe extern "C" fn(
    path: *const c_char,
    mode: notmuch_database_mode_t,
    database: *mut *mut notmuch_database_t,
) -> notmuch_status_t;

pub type notmuch_database_close =
    unsafe extern "C" fn(database: *mut notmuch_database_t) -> notmuch_status_t;

pub type notmuch_database_destroy =
    unsafe extern "C" fn(database: *mut notmuch_database_t) -> notmuch_status_t;

pub type notmuch_database_find_message = unsafe extern "C" fn(
    database: *mut notmuch_database_t,
    message_id: *const c_char,
    message: *mut *mut notmuch_message_t,
) -> notmuch_status_t;

pub type notmuch_query_create = unsafe extern "C" fn(
    database: *mut notmuch_database_t,
    query_string: *const c_char,
) -> *mut notmuch_query_t;

pub type notmuch_query_destroy = unsafe extern "C" fn(query: *mut notmuch_query_t);

pub type notmuch_query_count_messages =
    unsafe extern "C" fn(query: *mut notmuch_query_t, count: *mut c_uint) -> notmuch_status_t;

pub type notmuch_query_search_messages = unsafe extern "C" fn(
    query: *mut notmuch_query_t,
    out: *mut *mut notmuch_messages_t,
) -> notmuch_status_t;

pub type notmuch_messages_valid =
    unsafe extern "C" fn(messages: *mut notmuch_messages_t) -> notmuch_bool_t;

pub type notmuch_messages_get =
    unsafe extern "C" fn(messages: *mut notmuch_messages_t) -> *mut notmuch_message_t;

pub type notmuch_messages_move_to_next = unsafe extern "C" fn(messages: *mut notmuch_messages_t);

pub type notmuch_messages_destroy = unsafe extern "C" fn(messages: *mut notmuch_messages_t);

pub type notmuch_message_get_message_id =
    unsafe extern "C" fn(message: *mut notmuch_message_t) -> *const c_char;

pub type notmuch_message_get_filenames =
    unsafe extern "C" fn(message: *mut notmuch_message_t) -> *mut notmuch_filenames_t;

pub type notmuch_message_get_header =
    unsafe extern "C" fn(message: *mut notmuch_message_t, header: *const c_char) -> *const c_char;

pub type notmuch_message_get_tags =
    unsafe extern "C" fn(message: *mut notmuch_message_t) -> *mut notmuch_tags_t;

pub type notmuch_message_add_tag =
    unsafe extern "C" fn(message: *mut notmuch_message_t, tag: *const c_char) -> notmuch_status_t;

pub type notmuch_message_remove_tag =
    unsafe extern "C" fn(message: *mut notmuch_message_t, tag: *const c_char) -> notmuch_status_t;

pub type notmuch_message_destroy = unsafe extern "C" fn(message: *mut notmuch_message_t);

pub type notmuch_filenames_valid =
    unsafe extern "C" fn(filenames: *mut notmuch_filenames_t) -> notmuch_bool_t;

pub type notmuch_filenames_get =
    unsafe extern "C" fn(filenames: *mut notmuch_filenames_t) -> *const c_char;

pub type notmuch_filenames_move_to_next =
    unsafe extern "C" fn(filenames: *mut notmuch_filenames_t);

pub type notmuch_filenames_destroy = unsafe extern "C" fn(filenames: *mut notmuch_filenames_t);

pub type notmuch_tags_valid = unsafe extern "C" fn(tags: *mut notmuch_tags_t) -> notmuch_bool_t;

pub type notmuch_tags_get = unsafe extern "C" fn(tags: *mut notmuch_tags_t) -> *const c_char;

pub type notmuch_tags_move_to_next = unsafe extern "C" fn(tags: *mut notmuch_tags_t);

pub type notmuch_tags_destroy = unsafe extern "C" fn(tags: *mut notmuch_tags_t);

macro_rules! notmuch_api {
    ($($name:ident),* $(,)?) => {
        /// Function pointers resolved from a loaded `libnotmuch`.
        pub struct NotmuchApi {
            $(pub $name: $name,)*
        }

        impl NotmuchApi {
            /// Resolve every symbol up front so that later calls cannot fail
            /// to link.
            ///
            /// # Safety
            ///
            /// `lib` must be a `libnotmuch` whose symbols match the
            /// signatures declared in this module, and must outlive the
            /// returned value.
            pub unsafe fn load(lib: &libloading::Library) -> crate::error::Result<Self> {
                Ok(Self {
                    $($name: *unsafe {
                        lib.get::<$name>(concat!(stringify!($name), "\0").as_bytes())
                    }?,)*
                })
            }
        }
    };
}

notmuch_api!(
    notmuch_status_to_string,
    notmuch_database_open,
    notmuch_database_close,
    notmuch_database_destroy,
    notmuch_database_find_message,
    notmuch_query_create,
    notmuch_query_destroy,
    notmuch_query_count_messages,
    notmuch_query_search_messages,
    notmuch_messages_valid,
    notmuch_messages_get,
    notmuch_messages_move_to_next,
    notmuch_messages_destroy,
    notmuch_message_get_message_id,
    notmuch_message_get_filenames,
    notmuch_message_get_header,
    notmuch_message_get_tags,
    notmuch_message_add_tag,
    notmuch_message_remove_tag,
    notmuch_message_destroy,
    notmuch_filenames_valid,
    notmuch_filenames_get,
    notmuch_filenames_move_to_next,
    notmuch_filenames_destroy,
    notmuch_tags_valid,
    notmuch_tags_get,
    notmuch_tags_move_to_next,
    notmuch_tags_destroy,
);
