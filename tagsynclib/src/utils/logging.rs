/*
 * tagsync - logging module
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
    fs::{File, OpenOptions},
    io::{BufWriter, Write},
    path::Path,
    sync::{
        atomic::{AtomicU8, Ordering},
        Arc, Mutex,
    },
};

use log::{Level, LevelFilter, Log, Metadata, Record};

use crate::error::{Result, ResultIntoError};

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, PartialOrd, Serialize)]
#[repr(u8)]
pub enum LogLevel {
    OFF = 0,
    ERROR,
    WARN,
    #[default]
    INFO,
    DEBUG,
    TRACE,
}

impl LogLevel {
    /// Map the command line verbosity scale (`0` quiet, `1` summaries, `2`
    /// per-message details) to a log level.
    pub const fn from_verbosity(verbosity: u8) -> Self {
        match verbosity {
            0 => Self::WARN,
            1 => Self::INFO,
            2 => Self::DEBUG,
            _ => Self::TRACE,
        }
    }
}

impl From<Level> for LogLevel {
    fn from(l: Level) -> Self {
        match l {
            Level::Error => Self::ERROR,
            Level::Warn => Self::WARN,
            Level::Info => Self::INFO,
            Level::Debug => Self::DEBUG,
            Level::Trace => Self::TRACE,
        }
    }
}

impl From<LogLevel> for LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::OFF => Self::Off,
            LogLevel::ERROR => Self::Error,
            LogLevel::WARN => Self::Warn,
            LogLevel::INFO => Self::Info,
            LogLevel::DEBUG => Self::Debug,
            LogLevel::TRACE => Self::Trace,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                OFF => "OFF",
                ERROR => "ERROR",
                WARN => "WARN",
                INFO => "INFO",
                DEBUG => "DEBUG",
                TRACE => "TRACE",
            }
        )
    }
}

use LogLevel::*;

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, PartialOrd, Serialize)]
pub enum Destination {
    /// Standard error and a log file.
    File,
    #[default]
    Stderr,
}

struct FileOutput {
    writer: BufWriter<File>,
}

#[derive(Clone)]
pub struct StderrLogger {
    file: Arc<Mutex<Option<FileOutput>>>,
    level: Arc<AtomicU8>,
    print_level: bool,
    print_module_names: bool,
    dest: Arc<Mutex<Destination>>,
}

impl std::fmt::Debug for StderrLogger {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        fmt.debug_struct(stringify!(StderrLogger))
            .field("level", &self.log_level())
            .field("print_level", &self.print_level)
            .field("print_module_names", &self.print_module_names)
            .field("dest", &self.log_dest())
            .finish()
    }
}

impl Default for StderrLogger {
    fn default() -> Self {
        Self::new(LogLevel::default())
    }
}

impl StderrLogger {
    /// Create a logger and install it as the global `log` logger. Only the
    /// first logger created in a process is installed; later instances still
    /// adjust the global max level.
    pub fn new(level: LogLevel) -> Self {
        use std::sync::Once;

        static INIT_STDERR_LOGGING: Once = Once::new();

        let logger = Self {
            file: Arc::new(Mutex::new(None)),
            level: Arc::new(AtomicU8::new(level as u8)),
            print_level: true,
            print_module_names: cfg!(debug_assertions),
            dest: Arc::new(Mutex::new(Destination::Stderr)),
        };

        log::set_max_level(LevelFilter::from(logger.log_level()));

        INIT_STDERR_LOGGING.call_once(|| {
            if let Err(err) = log::set_boxed_logger(Box::new(logger.clone())) {
                eprintln!("Could not install logger: {err}");
            }
        });
        logger
    }

    pub fn log_level(&self) -> LogLevel {
        match self.level.load(Ordering::SeqCst) {
            0 => OFF,
            1 => ERROR,
            2 => WARN,
            3 => INFO,
            4 => DEBUG,
            _ => TRACE,
        }
    }

    /// Mirror every record into `path`, appending to it.
    pub fn change_log_dest(&self, path: &Path) -> Result<()> {
        let log_file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(path)
            .chain_err_summary(|| format!("Could not open log file {}", path.display()))
            .chain_err_related_path(path)?;
        if let Ok(mut file) = self.file.lock() {
            *file = Some(FileOutput {
                writer: BufWriter::new(log_file),
            });
        }
        if let Ok(mut dest) = self.dest.lock() {
            *dest = Destination::File;
        }
        Ok(())
    }

    pub fn log_dest(&self) -> Destination {
        self.dest.lock().map(|d| *d).unwrap_or_default()
    }
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        LogLevel::from(metadata.level()) <= self.log_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        fn write(
            writer: &mut impl Write,
            record: &Record,
            (print_level, print_module_names): (bool, bool),
        ) -> Option<()> {
            write!(
                writer,
                "{}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
            )
            .ok()?;
            writer.write_all(b" [").ok()?;
            if print_level {
                writer
                    .write_all(record.level().to_string().as_bytes())
                    .ok()?;
            }
            write!(writer, "]: ").ok()?;
            if print_module_names {
                write!(writer, "{}: ", record.metadata().target()).ok()?;
            }
            write!(writer, "{}", record.args()).ok()?;
            writer.write_all(b"\n").ok()?;
            writer.flush().ok()?;
            Some(())
        }

        let opts = (self.print_level, self.print_module_names);
        match self.log_dest() {
            Destination::Stderr => {
                _ = write(&mut std::io::stderr(), record, opts);
            }
            Destination::File => {
                _ = write(&mut std::io::stderr(), record, opts);
                _ = self.file.lock().ok().and_then(|mut f| {
                    f.as_mut()
                        .and_then(|f| write(&mut f.writer, record, opts))
                });
            }
        }
    }

    fn flush(&self) {
        _ = self
            .file
            .lock()
            .ok()
            .and_then(|mut f| f.as_mut().and_then(|f| f.writer.flush().ok()));
    }
}
