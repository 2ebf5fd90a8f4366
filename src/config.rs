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

//! Construction of a [`Logger`] wired to console and rotating file sinks.

use std::ffi::OsString;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;

use crate::Error;
use crate::Level;
use crate::Logger;
use crate::append::RollingFileBuilder;
use crate::append::Stderr;
use crate::filter::BelowLevel;
use crate::filter::MinLevel;
use crate::layout::ColoredLayout;
use crate::layout::PatternLayout;
use crate::logger::DispatchBuilder;

/// Configuration of a logger with a console sink, a rotating file sink and an optional
/// error-only rotating file sink.
///
/// Missing fields take their defaults when deserialized, and levels accept names or numbers,
/// so a host application can keep this in its own config file:
///
/// ```
/// use utilforth::Level;
/// use utilforth::LoggerConfig;
///
/// let config: LoggerConfig = serde_json::from_str(
///     r#"{ "name": "worker", "console_level": "warning", "file_level": 10, "enable_file": false }"#,
/// )
/// .unwrap();
///
/// assert_eq!(config.name(), "worker");
/// assert_eq!(config.console_threshold(), Level::Warning);
/// assert_eq!(config.file_threshold(), Level::Debug);
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggerConfig {
    name: String,
    log_path: PathBuf,
    console_level: Level,
    file_level: Level,
    color_console: bool,
    enable_console: bool,
    enable_file: bool,
    detach_error: bool,
    file_max_bytes: u64,
    file_backup_count: usize,
    console_format: String,
    file_format: String,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            name: "app".to_string(),
            log_path: PathBuf::from("logs/app.log"),
            console_level: Level::Info,
            file_level: Level::Debug,
            color_console: true,
            enable_console: true,
            enable_file: true,
            detach_error: false,
            file_max_bytes: RollingFileBuilder::DEFAULT_MAX_SIZE,
            file_backup_count: RollingFileBuilder::DEFAULT_MAX_BACKUPS,
            console_format: PatternLayout::DEFAULT_CONSOLE.to_string(),
            file_format: PatternLayout::DEFAULT_FILE.to_string(),
        }
    }
}

impl LoggerConfig {
    /// Create a default configuration for a logger with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set the path of the main log file.
    #[must_use]
    pub fn log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_path = path.into();
        self
    }

    /// Set the minimum level of the console sink.
    #[must_use]
    pub fn console_level(mut self, level: Level) -> Self {
        self.console_level = level;
        self
    }

    /// Set the minimum level of the main file sink.
    #[must_use]
    pub fn file_level(mut self, level: Level) -> Self {
        self.file_level = level;
        self
    }

    /// Enable or disable ANSI colors on the console sink.
    #[must_use]
    pub fn color_console(mut self, enable: bool) -> Self {
        self.color_console = enable;
        self
    }

    /// Enable or disable the console sink.
    #[must_use]
    pub fn enable_console(mut self, enable: bool) -> Self {
        self.enable_console = enable;
        self
    }

    /// Enable or disable the file sinks.
    #[must_use]
    pub fn enable_file(mut self, enable: bool) -> Self {
        self.enable_file = enable;
        self
    }

    /// Route `Error` and `Critical` records to a separate file instead of the main one.
    #[must_use]
    pub fn detach_error(mut self, enable: bool) -> Self {
        self.detach_error = enable;
        self
    }

    /// Set the size in bytes that triggers a rotation.
    #[must_use]
    pub fn file_max_bytes(mut self, n: u64) -> Self {
        self.file_max_bytes = n;
        self
    }

    /// Set the number of rotated files kept per sink.
    #[must_use]
    pub fn file_backup_count(mut self, n: usize) -> Self {
        self.file_backup_count = n;
        self
    }

    /// Set the template of the console sink. See [`PatternLayout`].
    #[must_use]
    pub fn console_format(mut self, format: impl Into<String>) -> Self {
        self.console_format = format.into();
        self
    }

    /// Set the template of the file sinks. See [`PatternLayout`].
    #[must_use]
    pub fn file_format(mut self, format: impl Into<String>) -> Self {
        self.file_format = format.into();
        self
    }

    /// The logger name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The main log file.
    pub fn path(&self) -> &Path {
        &self.log_path
    }

    /// The minimum level of the console sink.
    pub fn console_threshold(&self) -> Level {
        self.console_level
    }

    /// The minimum level of the main file sink.
    pub fn file_threshold(&self) -> Level {
        self.file_level
    }

    /// The file receiving `Error` and above when errors are detached.
    pub fn error_path(&self) -> PathBuf {
        error_log_path(&self.log_path)
    }

    /// Build the configured [`Logger`].
    ///
    /// This never fails: a sink that cannot be initialized is left out, and the failure is
    /// logged at [`Level::Error`] through the sinks that were set up before it.
    pub fn build(&self) -> Logger {
        let mut logger = Logger::new(&self.name, vec![]);

        if self.enable_console {
            if let Err(err) = self.attach_console(&mut logger) {
                logger.error(format_args!("failed to initialize console sink: {err}"));
            }
        }

        if let Some(dir) = self.log_path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            if let Err(err) = fs::create_dir_all(dir) {
                logger.error(format_args!(
                    "failed to create log directory {}: {err}",
                    dir.display()
                ));
            }
        }

        if self.enable_file {
            if let Err(err) = self.attach_file(&mut logger) {
                logger.error(format_args!("failed to initialize file sink: {err}"));
            }
            if self.detach_error {
                if let Err(err) = self.attach_error_file(&mut logger) {
                    logger.error(format_args!("failed to initialize error file sink: {err}"));
                }
            }
        }

        logger
    }

    fn attach_console(&self, logger: &mut Logger) -> Result<(), Error> {
        let pattern = PatternLayout::new(&self.console_format)?;
        let layout = ColoredLayout::new(pattern).with_color(self.color_console);
        let dispatch = DispatchBuilder::new()
            .filter(MinLevel(self.console_level))
            .append(Stderr::default().with_layout(layout))
            .build();
        logger.push_dispatch(dispatch);
        Ok(())
    }

    fn attach_file(&self, logger: &mut Logger) -> Result<(), Error> {
        let rolling = self.rolling_file(&self.log_path)?;
        let mut dispatch = DispatchBuilder::new().filter(MinLevel(self.file_level));
        if self.detach_error {
            dispatch = dispatch.filter(BelowLevel(Level::Error));
        }
        logger.push_dispatch(dispatch.append(rolling).build());
        Ok(())
    }

    fn attach_error_file(&self, logger: &mut Logger) -> Result<(), Error> {
        let rolling = self.rolling_file(&self.error_path())?;
        let dispatch = DispatchBuilder::new()
            .filter(MinLevel(Level::Error))
            .append(rolling)
            .build();
        logger.push_dispatch(dispatch);
        Ok(())
    }

    fn rolling_file(&self, path: &Path) -> Result<crate::append::RollingFile, Error> {
        RollingFileBuilder::new(path)
            .layout(PatternLayout::new(&self.file_format)?)
            .max_file_size(self.file_max_bytes)
            .max_backups(self.file_backup_count)
            .build()
    }
}

/// Derive the error log path from the main log path: `{base}_error{ext}`, where a missing
/// extension becomes `.log`.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use std::path::PathBuf;
///
/// use utilforth::error_log_path;
///
/// assert_eq!(error_log_path(Path::new("logs/app.log")), PathBuf::from("logs/app_error.log"));
/// assert_eq!(error_log_path(Path::new("logs/app")), PathBuf::from("logs/app_error.log"));
/// assert_eq!(error_log_path(Path::new("app.txt")), PathBuf::from("app_error.txt"));
/// ```
pub fn error_log_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.file_stem().unwrap_or_default());
    name.push("_error");
    match path.extension() {
        Some(ext) => {
            name.push(".");
            name.push(ext);
        }
        None => name.push(".log"),
    }
    path.with_file_name(name)
}
