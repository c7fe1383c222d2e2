/*
 * tagsync - args.rs
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

//! Command line arguments.

use std::path::PathBuf;

use structopt::StructOpt;
use tagsynclib::command::{CommandName, Phases};

#[derive(Debug, StructOpt)]
#[structopt(
    name = "tagsync",
    about = "reconcile notmuch tags with maildir folders",
    usage = "tagsync [FLAGS] [OPTIONS] <COMMAND>..."
)]
pub struct Opt {
    /// use specified configuration file
    #[structopt(long, parse(from_os_str), value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// verbosity level: 0 quiet, 1 summaries, 2 per-message details
    #[structopt(short, long, value_name = "N")]
    pub verbose: Option<u8>,

    /// log what would be done without changing tags, files or running
    /// commands
    #[structopt(long)]
    pub dry_run: bool,

    /// modify tags and files even if the configuration file enables dry
    /// runs
    #[structopt(long, conflicts_with = "dry-run")]
    pub no_dry_run: bool,

    /// notmuch database and mail root
    #[structopt(short = "d", long, parse(from_os_str), value_name = "PATH")]
    pub notmuch_database: Option<PathBuf>,

    /// tag marking freshly delivered mail
    #[structopt(short = "n", long, value_name = "TAG")]
    pub newtag: Option<String>,

    /// mail sync command
    #[structopt(short, long, value_name = "COMMAND")]
    pub sync: Option<String>,

    /// print the effective settings as TOML and exit
    #[structopt(long)]
    pub print_config: bool,

    #[structopt(
        name = "COMMAND",
        required_unless = "print-config",
        min_values = 1
    )]
    pub commands: Vec<CommandName>,
}

impl Opt {
    /// Parse the process arguments, with the command table appended to
    /// `--help`.
    pub fn from_args_with_commands() -> Self {
        let commands_help = CommandName::help_text();
        let matches = Self::clap()
            .after_help(commands_help.as_str())
            .get_matches();
        Self::from_clap(&matches)
    }

    pub fn phases(&self) -> Phases {
        Phases::from_commands(&self.commands)
    }
}
