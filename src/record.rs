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

//! Log record and severity levels.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use jiff::Zoned;

use crate::Error;

/// Severity of a log record, from least to most severe.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    /// Designates lower priority information.
    Debug,
    /// Designates useful information.
    Info,
    /// Designates hazardous situations.
    Warning,
    /// Designates very serious errors.
    Error,
    /// Designates errors the program may not recover from.
    Critical,
}

impl Level {
    const ALL: [Level; 5] = [
        Level::Debug,
        Level::Info,
        Level::Warning,
        Level::Error,
        Level::Critical,
    ];

    /// Return the string representation of the `Level`.
    ///
    /// This returns the same string as the `fmt::Display` implementation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warning => "WARNING",
            Level::Error => "ERROR",
            Level::Critical => "CRITICAL",
        }
    }

    /// The numeric severity: 10, 20, 30, 40 and 50.
    pub fn value(&self) -> u32 {
        match self {
            Level::Debug => 10,
            Level::Info => 20,
            Level::Warning => 30,
            Level::Error => 40,
            Level::Critical => 50,
        }
    }

    /// Map a numeric severity to the most severe level whose value does not exceed it.
    ///
    /// Values below 10 map to [`Level::Debug`].
    ///
    /// # Examples
    ///
    /// ```
    /// use utilforth::Level;
    ///
    /// assert_eq!(Level::from_value(30), Level::Warning);
    /// assert_eq!(Level::from_value(35), Level::Warning);
    /// assert_eq!(Level::from_value(0), Level::Debug);
    /// ```
    pub fn from_value(value: u32) -> Level {
        Level::ALL
            .into_iter()
            .rev()
            .find(|level| level.value() <= value)
            .unwrap_or(Level::Debug)
    }
}

impl fmt::Debug for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Level {
    type Err = Error;

    fn from_str(s: &str) -> Result<Level, Self::Err> {
        let s = s.trim();
        if let Ok(value) = s.parse::<u32>() {
            return Ok(Level::from_value(value));
        }

        for (name, level) in [
            ("debug", Level::Debug),
            ("info", Level::Info),
            ("warning", Level::Warning),
            ("warn", Level::Warning),
            ("error", Level::Error),
            ("critical", Level::Critical),
            ("crit", Level::Critical),
            ("fatal", Level::Critical),
        ] {
            if s.eq_ignore_ascii_case(name) {
                return Ok(level);
            }
        }

        Err(Error::new(format!("malformed level: {s:?}")))
    }
}

impl From<log::Level> for Level {
    fn from(level: log::Level) -> Self {
        match level {
            log::Level::Error => Level::Error,
            log::Level::Warn => Level::Warning,
            log::Level::Info => Level::Info,
            log::Level::Debug | log::Level::Trace => Level::Debug,
        }
    }
}

impl From<Level> for log::Level {
    fn from(level: Level) -> Self {
        match level {
            Level::Critical | Level::Error => log::Level::Error,
            Level::Warning => log::Level::Warn,
            Level::Info => log::Level::Info,
            Level::Debug => log::Level::Debug,
        }
    }
}

impl<'de> serde::Deserialize<'de> for Level {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(serde::Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Value(u32),
            Name(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Value(value) => Ok(Level::from_value(value)),
            Repr::Name(name) => name.parse().map_err(serde::de::Error::custom),
        }
    }
}

impl serde::Serialize for Level {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

/// The payload of a log message.
#[derive(Clone, Debug)]
pub struct Record<'a> {
    // the observed time
    now: Zoned,

    level: Level,
    name: &'a str,
    target: &'a str,
    module_path: Option<&'a str>,
    file: Option<&'a str>,
    line: Option<u32>,

    payload: Cow<'a, str>,
    backtrace: Option<Cow<'a, str>>,
}

impl<'a> Record<'a> {
    /// The observed time.
    pub fn time(&self) -> &Zoned {
        &self.now
    }

    /// The severity of the record.
    pub fn level(&self) -> Level {
        self.level
    }

    /// The name of the logger that produced the record.
    pub fn name(&self) -> &'a str {
        self.name
    }

    /// The target of the record, default to the logger name.
    pub fn target(&self) -> &'a str {
        self.target
    }

    /// The module path of the call site, if known.
    pub fn module_path(&self) -> Option<&'a str> {
        self.module_path
    }

    /// The source file of the call site, if known.
    pub fn file(&self) -> Option<&'a str> {
        self.file
    }

    /// The last path component of [`Record::file`].
    pub fn filename(&self) -> &'a str {
        self.file
            .map(|file| file.rsplit(['/', '\\']).next().unwrap_or(file))
            .unwrap_or_default()
    }

    /// The line of the call site, if known.
    pub fn line(&self) -> Option<u32> {
        self.line
    }

    /// The message body.
    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// The captured backtrace text, if any.
    pub fn backtrace(&self) -> Option<&str> {
        self.backtrace.as_deref()
    }

    /// Create a builder initialized with the current record's values.
    pub fn to_builder(&self) -> RecordBuilder<'a> {
        RecordBuilder {
            record: self.clone(),
        }
    }

    /// Create a new [`RecordBuilder`].
    pub fn builder() -> RecordBuilder<'a> {
        RecordBuilder::default()
    }
}

/// A builder for [`Record`].
#[derive(Debug)]
pub struct RecordBuilder<'a> {
    record: Record<'a>,
}

impl Default for RecordBuilder<'_> {
    fn default() -> Self {
        RecordBuilder {
            record: Record {
                now: Zoned::now(),
                level: Level::Info,
                name: "",
                target: "",
                module_path: None,
                file: None,
                line: None,
                payload: Cow::Borrowed(""),
                backtrace: None,
            },
        }
    }
}

impl<'a> RecordBuilder<'a> {
    /// Set the message body.
    pub fn payload(mut self, payload: impl Into<Cow<'a, str>>) -> Self {
        self.record.payload = payload.into();
        self
    }

    /// Set the severity.
    pub fn level(mut self, level: Level) -> Self {
        self.record.level = level;
        self
    }

    /// Set the logger name. The target follows the name unless set explicitly.
    pub fn name(mut self, name: &'a str) -> Self {
        if self.record.target.is_empty() || self.record.target == self.record.name {
            self.record.target = name;
        }
        self.record.name = name;
        self
    }

    /// Set the target.
    pub fn target(mut self, target: &'a str) -> Self {
        self.record.target = target;
        self
    }

    /// Set the module path.
    pub fn module_path(mut self, path: Option<&'a str>) -> Self {
        self.record.module_path = path;
        self
    }

    /// Set the source file.
    pub fn file(mut self, file: Option<&'a str>) -> Self {
        self.record.file = file;
        self
    }

    /// Set the source line.
    pub fn line(mut self, line: Option<u32>) -> Self {
        self.record.line = line;
        self
    }

    /// Attach a backtrace rendered after the formatted message.
    pub fn backtrace(mut self, backtrace: Option<impl Into<Cow<'a, str>>>) -> Self {
        self.record.backtrace = backtrace.map(Into::into);
        self
    }

    /// Override the observed time.
    pub fn time(mut self, now: Zoned) -> Self {
        self.record.now = now;
        self
    }

    /// Construct the record.
    pub fn build(self) -> Record<'a> {
        self.record
    }
}
