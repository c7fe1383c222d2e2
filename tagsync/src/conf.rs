/*
 * tagsync - conf.rs
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

//! Effective settings: configuration file values overridden by flags.

use tagsynclib::{conf::Settings, Result};

use crate::args::Opt;

/// Apply command line flags on top of `settings`.
pub fn apply_overrides(settings: &mut Settings, opt: &Opt) {
    if let Some(v) = opt.verbose {
        settings.verbosity = v;
    }
    if opt.dry_run {
        settings.dry_run = true;
    } else if opt.no_dry_run {
        settings.dry_run = false;
    }
    if let Some(p) = opt.notmuch_database.as_ref() {
        settings.database = p.clone();
    }
    if let Some(t) = opt.newtag.as_ref() {
        settings.new_tag = t.clone();
    }
    if let Some(s) = opt.sync.as_ref() {
        settings.sync_command = s.clone();
    }
}

/// Load the configuration file named by `opt` (or the default one), apply
/// flags and expand paths. The result is not validated.
pub fn effective_settings(opt: &Opt) -> Result<Settings> {
    let mut settings = Settings::load(opt.config.as_deref())?;
    apply_overrides(&mut settings, opt);
    settings.expand_paths();
    Ok(settings)
}
