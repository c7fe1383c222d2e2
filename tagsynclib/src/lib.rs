/*
 * tagsync - lib.rs
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

#![deny(
    rustdoc::redundant_explicit_links,
    unsafe_op_in_unsafe_fn,
    /* groups */
    clippy::correctness,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::style,
    /* restriction */
    clippy::dbg_macro,
    /* rustdoc */
    rustdoc::broken_intra_doc_links,
    /* pedantic */
    clippy::doc_markdown,
    clippy::expect_fun_call,
    clippy::or_fun_call,
    clippy::borrow_as_ptr,
)]

//! A library for reconciling notmuch tags with maildir folder placement.
//!
//! Every maildir folder below a mail root doubles as a notmuch tag with the
//! same name. Mail clients change tags, sync tools change files, and the two
//! drift apart. This library converges them:
//!
//! - [`maildir`]: folder discovery, maildir file names and file copies.
//! - [`index`]: the tag index capability ([`index::TagIndex`]), with a
//!   `libnotmuch` implementation and an in-memory one.
//! - [`reconcile`]: tag and placement reconcilers.
//! - [`command`]: command names, phases and the run orchestrator.
//! - [`conf`]: run settings.
//!
//! ```no_run
//! use tagsynclib::{
//!     command::{CommandName, Orchestrator, Phases},
//!     conf::Settings,
//!     index::MemoryIndex,
//! };
//!
//! let mut settings = Settings::default();
//! settings.database = "/srv/mail".into();
//! let mut index = MemoryIndex::scan(&settings.database)?;
//! let phases = Phases::from_commands(&[CommandName::Post]);
//! let report = Orchestrator::new(&settings, phases).run(&mut index, &mut std::io::stdout())?;
//! println!("{} failures", report.failed());
//! # Ok::<(), tagsynclib::error::Error>(())
//! ```

pub mod command;
pub mod conf;
pub mod error;
pub mod index;
pub mod maildir;
pub mod process;
pub mod reconcile;
pub mod utils;

#[macro_use]
extern crate serde_derive;
pub extern crate log;

pub use error::{Error, ErrorKind, Result};
pub use utils::{logging::StderrLogger, shellexpand::ShellExpandTrait};
