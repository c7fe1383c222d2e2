/*
 * tagsync - main.rs
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

//! Command line binary.
//!
//! Argument parsing and configuration live here; everything else is in the
//! `tagsynclib` crate.

mod args;
mod conf;

use args::Opt;
use tagsynclib::{
    command::Orchestrator, index::notmuch::NotmuchOpener, utils::logging::LogLevel, Result,
    StderrLogger,
};

fn main() {
    let opt = Opt::from_args_with_commands();
    ::std::process::exit(match run_app(opt) {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("{}", err);
            1
        }
    });
}

fn run_app(opt: Opt) -> Result<()> {
    let settings = conf::effective_settings(&opt)?;
    if opt.print_config {
        print!("{}", settings.to_toml_string()?);
        return Ok(());
    }

    let logger = StderrLogger::new(LogLevel::from_verbosity(settings.verbosity));
    if let Some(path) = settings.log_file.as_ref() {
        logger.change_log_dest(path)?;
    }
    settings.validate()?;

    let mut opener = NotmuchOpener::new(
        settings.database.clone(),
        settings.library_file_path.clone(),
    );
    let stdout = std::io::stdout();
    let report = Orchestrator::new(&settings, opt.phases()).run(&mut opener, &mut stdout.lock())?;
    if report.failed() > 0 {
        log::warn!("{} mails could not be reconciled.", report.failed());
    }
    Ok(())
}
