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

use crate::Append;
use crate::Filter;
use crate::Logger;
use crate::logger::Dispatch;

/// A builder for configuring the sinks of a named [`Logger`].
///
/// # Examples
///
/// ```
/// use utilforth::Level;
/// use utilforth::Logger;
/// use utilforth::append;
/// use utilforth::filter::MinLevel;
///
/// let logger = Logger::builder("app")
///     .dispatch(|d| d.filter(MinLevel(Level::Error)).append(append::Stderr::default()))
///     .dispatch(|d| d.filter(MinLevel(Level::Info)).append(append::Stdout::default()))
///     .build();
/// ```
#[must_use = "call `build` to construct a logger instance or `apply` to set the global logger"]
#[derive(Debug)]
pub struct LoggerBuilder {
    name: String,
    // stashed dispatches
    dispatches: Vec<Dispatch>,
}

impl LoggerBuilder {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dispatches: vec![],
        }
    }

    /// Register a new dispatch with the [`LoggerBuilder`].
    pub fn dispatch<F>(mut self, f: F) -> Self
    where
        F: FnOnce(DispatchBuilder<false>) -> DispatchBuilder<true>,
    {
        self.dispatches.push(f(DispatchBuilder::new()).build());
        self
    }

    /// Build the [`Logger`].
    pub fn build(self) -> Logger {
        Logger::new(self.name, self.dispatches)
    }

    /// Set up the global [`log`] logger with all the configured dispatches.
    ///
    /// # Errors
    ///
    /// Return an error if a global logger has already been set.
    pub fn try_apply(self) -> Result<(), log::SetLoggerError> {
        self.build().try_apply()
    }

    /// Set up the global [`log`] logger with all the configured dispatches.
    ///
    /// # Panics
    ///
    /// Panic if the global logger has already been set.
    pub fn apply(self) {
        self.try_apply()
            .expect("LoggerBuilder::apply must be called before the global logger initialized");
    }
}

/// A builder for configuring a log dispatch, including filters and appenders.
///
/// A dispatch is one sink: records pass its filters in order, then reach every appender.
#[derive(Debug)]
pub struct DispatchBuilder<const APPEND: bool> {
    filters: Vec<Box<dyn Filter>>,
    appends: Vec<Box<dyn Append>>,
}

impl DispatchBuilder<false> {
    pub(crate) fn new() -> Self {
        DispatchBuilder {
            filters: vec![],
            appends: vec![],
        }
    }

    /// Add a filter to this dispatch.
    pub fn filter(mut self, filter: impl Into<Box<dyn Filter>>) -> Self {
        self.filters.push(filter.into());
        self
    }
}

impl DispatchBuilder<true> {
    pub(crate) fn build(self) -> Dispatch {
        Dispatch::new(self.filters, self.appends)
    }
}

impl<const APPEND: bool> DispatchBuilder<APPEND> {
    /// Add an appender to this dispatch.
    pub fn append(mut self, append: impl Into<Box<dyn Append>>) -> DispatchBuilder<true> {
        self.appends.push(append.into());
        DispatchBuilder {
            filters: self.filters,
            appends: self.appends,
        }
    }
}
