// Copyright 2024 FastLabs Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::fmt;
use std::io::Write;
use std::panic::Location;

use crate::Append;
use crate::Error;
use crate::Filter;
use crate::Level;
use crate::Record;
use crate::filter::FilterResult;
use crate::logger::LoggerBuilder;

/// A named logger that dispatches records to one or more sinks.
///
/// Each sink is a [`Dispatch`] of filters and appenders. The logger is an ordinary value: hold
/// it, share it behind an `Arc`, or install it as the global [`log`] logger with
/// [`Logger::apply`].
///
/// This struct implements [`log::Log`], so the `log` macros can target it directly:
///
/// ```
/// use utilforth::Logger;
/// use utilforth::append::Testing;
///
/// let testing = Testing::default();
/// let logger = Logger::builder("app")
///     .dispatch(|d| d.append(testing.clone()))
///     .build();
///
/// // the `log` macros consult the global maximum level first
/// log::set_max_level(log::LevelFilter::Trace);
/// log::info!(logger: &logger, "hello {}", "world");
/// logger.error(format_args!("failed: {}", 42));
///
/// assert_eq!(
///     testing.lines(),
///     vec!["[INFO] [app] hello world", "[ERROR] [app] failed: 42"]
/// );
/// ```
#[derive(Debug)]
pub struct Logger {
    name: String,
    dispatches: Vec<Dispatch>,
}

impl Logger {
    /// Create a new [`LoggerBuilder`] for a logger with the given name.
    pub fn builder(name: impl Into<String>) -> LoggerBuilder {
        LoggerBuilder::new(name)
    }

    pub(crate) fn new(name: impl Into<String>, dispatches: Vec<Dispatch>) -> Self {
        Self {
            name: name.into(),
            dispatches,
        }
    }

    pub(crate) fn push_dispatch(&mut self, dispatch: Dispatch) {
        self.dispatches.push(dispatch);
    }

    /// The name of this logger.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether any sink accepts records of the given level.
    pub fn enabled(&self, level: Level) -> bool {
        self.dispatches
            .iter()
            .any(|dispatch| dispatch.enabled(level))
    }

    /// Log a message at the given level, recording the caller's file and line.
    #[track_caller]
    pub fn log(&self, level: Level, args: fmt::Arguments<'_>) {
        self.log_at(level, Location::caller(), args, None);
    }

    /// Log a message at [`Level::Debug`].
    #[track_caller]
    pub fn debug(&self, args: fmt::Arguments<'_>) {
        self.log_at(Level::Debug, Location::caller(), args, None);
    }

    /// Log a message at [`Level::Info`].
    #[track_caller]
    pub fn info(&self, args: fmt::Arguments<'_>) {
        self.log_at(Level::Info, Location::caller(), args, None);
    }

    /// Log a message at [`Level::Warning`].
    #[track_caller]
    pub fn warning(&self, args: fmt::Arguments<'_>) {
        self.log_at(Level::Warning, Location::caller(), args, None);
    }

    /// Log a message at [`Level::Error`].
    #[track_caller]
    pub fn error(&self, args: fmt::Arguments<'_>) {
        self.log_at(Level::Error, Location::caller(), args, None);
    }

    /// Log a message at [`Level::Critical`].
    #[track_caller]
    pub fn critical(&self, args: fmt::Arguments<'_>) {
        self.log_at(Level::Critical, Location::caller(), args, None);
    }

    pub(crate) fn log_at(
        &self,
        level: Level,
        location: &Location<'_>,
        args: fmt::Arguments<'_>,
        backtrace: Option<String>,
    ) {
        if !self.enabled(level) {
            return;
        }

        let payload = match args.as_str() {
            Some(s) => s.to_string(),
            None => args.to_string(),
        };
        let record = Record::builder()
            .name(&self.name)
            .level(level)
            .file(Some(location.file()))
            .line(Some(location.line()))
            .payload(payload)
            .backtrace(backtrace)
            .build();
        self.log_record(&record);
    }

    /// Dispatch a prepared record to every sink whose filters accept it.
    pub fn log_record(&self, record: &Record) {
        for dispatch in &self.dispatches {
            if let Err(err) = dispatch.log(record) {
                handle_log_error(record, err);
            }
        }
    }

    /// Flush every sink.
    pub fn flush(&self) {
        for dispatch in &self.dispatches {
            if let Err(err) = dispatch.flush() {
                handle_flush_error(err);
            }
        }
    }

    /// Set up this logger as the global [`log`] logger.
    ///
    /// # Errors
    ///
    /// Return an error if a global logger has already been set.
    pub fn try_apply(self) -> Result<(), log::SetLoggerError> {
        log::set_boxed_logger(Box::new(self))?;
        log::set_max_level(log::LevelFilter::Trace);
        Ok(())
    }

    /// Set up this logger as the global [`log`] logger.
    ///
    /// # Panics
    ///
    /// Panic if the global logger has already been set.
    pub fn apply(self) {
        self.try_apply()
            .expect("Logger::apply must be called before the global logger initialized");
    }
}

impl log::Log for Logger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        Logger::enabled(self, metadata.level().into())
    }

    fn log(&self, record: &log::Record) {
        let level = Level::from(record.level());
        if !Logger::enabled(self, level) {
            return;
        }

        let args = record.args();
        let payload = match args.as_str() {
            Some(s) => s.to_string(),
            None => args.to_string(),
        };
        let record = Record::builder()
            .name(&self.name)
            .target(record.target())
            .level(level)
            .module_path(record.module_path())
            .file(record.file())
            .line(record.line())
            .payload(payload)
            .build();
        self.log_record(&record);
    }

    fn flush(&self) {
        Logger::flush(self);
    }
}

/// A grouped set of appenders and filters.
///
/// `filters` are used to determine whether a log record should be passed to the appenders.
/// `appends` are used to write log records to a destination.
#[derive(Debug)]
pub(crate) struct Dispatch {
    filters: Vec<Box<dyn Filter>>,
    appends: Vec<Box<dyn Append>>,
}

impl Dispatch {
    pub(crate) fn new(filters: Vec<Box<dyn Filter>>, appends: Vec<Box<dyn Append>>) -> Self {
        debug_assert!(
            !appends.is_empty(),
            "A Dispatch must have at least one appender"
        );

        Self { filters, appends }
    }

    fn enabled(&self, level: Level) -> bool {
        for filter in &self.filters {
            match filter.enabled(level) {
                FilterResult::Reject => return false,
                FilterResult::Accept => return true,
                FilterResult::Neutral => {}
            }
        }

        true
    }

    fn log(&self, record: &Record) -> Result<(), Error> {
        for filter in &self.filters {
            match filter.matches(record) {
                FilterResult::Reject => return Ok(()),
                FilterResult::Accept => break,
                FilterResult::Neutral => {}
            }
        }

        for append in &self.appends {
            append.append(record)?;
        }
        Ok(())
    }

    fn flush(&self) -> Result<(), Error> {
        for append in &self.appends {
            append.flush()?;
        }
        Ok(())
    }
}

// Logging must never take the host process down: failures go to stderr and are dropped.
fn handle_log_error(record: &Record, error: Error) {
    let _ = write!(
        std::io::stderr(),
        r###"
Error perform logging.
    Attempted to log: {args}
    Record: {record:?}
    Error: {error:?}
"###,
        args = record.payload(),
        record = record,
        error = error,
    );
}

fn handle_flush_error(error: Error) {
    let _ = write!(
        std::io::stderr(),
        r###"
Error perform flush.
    Error: {error:?}
"###,
    );
}
