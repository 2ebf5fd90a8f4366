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

use std::io::Write;

use crate::Error;
use crate::append::Append;
use crate::layout::ColoredLayout;
use crate::layout::Layout;
use crate::record::Record;

/// An appender that prints log records to stdout.
///
/// # Examples
///
/// ```
/// use utilforth::append::Stdout;
/// use utilforth::layout::ColoredLayout;
///
/// let stdout_appender = Stdout::default().with_layout(ColoredLayout::default().no_color());
/// ```
#[derive(Debug)]
pub struct Stdout {
    layout: Box<dyn Layout>,
}

impl Default for Stdout {
    fn default() -> Self {
        Self {
            layout: Box::new(ColoredLayout::default()),
        }
    }
}

impl Stdout {
    /// Set the layout for the [`Stdout`] appender.
    ///
    /// Default to [`ColoredLayout`].
    pub fn with_layout(mut self, layout: impl Into<Box<dyn Layout>>) -> Self {
        self.layout = layout.into();
        self
    }
}

impl Append for Stdout {
    fn append(&self, record: &Record) -> Result<(), Error> {
        let mut bytes = self.layout.format(record)?;
        bytes.push(b'\n');
        std::io::stdout()
            .write_all(&bytes)
            .map_err(Error::from_io_error)?;
        Ok(())
    }

    fn flush(&self) -> Result<(), Error> {
        std::io::stdout().flush().map_err(Error::from_io_error)
    }
}

/// An appender that prints log records to stderr.
///
/// This is the console sink built by [`LoggerConfig`](crate::LoggerConfig).
///
/// # Examples
///
/// ```
/// use utilforth::append::Stderr;
/// use utilforth::layout::PatternLayout;
///
/// let stderr_appender = Stderr::default().with_layout(PatternLayout::default());
/// ```
#[derive(Debug)]
pub struct Stderr {
    layout: Box<dyn Layout>,
}

impl Default for Stderr {
    fn default() -> Self {
        Self {
            layout: Box::new(ColoredLayout::default()),
        }
    }
}

impl Stderr {
    /// Set the layout for the [`Stderr`] appender.
    ///
    /// Default to [`ColoredLayout`].
    pub fn with_layout(mut self, layout: impl Into<Box<dyn Layout>>) -> Self {
        self.layout = layout.into();
        self
    }
}

impl Append for Stderr {
    fn append(&self, record: &Record) -> Result<(), Error> {
        let mut bytes = self.layout.format(record)?;
        bytes.push(b'\n');
        std::io::stderr()
            .write_all(&bytes)
            .map_err(Error::from_io_error)?;
        Ok(())
    }

    fn flush(&self) -> Result<(), Error> {
        std::io::stderr().flush().map_err(Error::from_io_error)
    }
}
