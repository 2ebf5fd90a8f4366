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

use std::path::Path;
use std::path::PathBuf;

use crate::Error;
use crate::append::Append;
use crate::append::rolling_file::RollingFileWriter;
use crate::layout::Layout;
use crate::layout::PatternLayout;
use crate::record::Record;

/// An appender that writes log records to size-rotated files.
#[derive(Debug)]
pub struct RollingFile {
    layout: Box<dyn Layout>,
    writer: RollingFileWriter,
}

impl RollingFile {
    /// The path of the active log file.
    pub fn path(&self) -> &Path {
        self.writer.path()
    }
}

impl Append for RollingFile {
    fn append(&self, record: &Record) -> Result<(), Error> {
        let mut bytes = self.layout.format(record)?;
        bytes.push(b'\n');
        self.writer.write_record(&bytes)
    }
}

/// A builder for configuring [`RollingFile`].
#[must_use = "call `build` to construct the appender"]
#[derive(Debug)]
pub struct RollingFileBuilder {
    path: PathBuf,
    layout: Box<dyn Layout>,
    max_size: u64,
    max_backups: usize,
}

impl RollingFileBuilder {
    /// The default threshold for rotation: 10 MiB.
    pub const DEFAULT_MAX_SIZE: u64 = 10 * 1024 * 1024;

    /// The default number of rotated files to keep.
    pub const DEFAULT_MAX_BACKUPS: usize = 5;

    /// Create a builder writing to the given file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            layout: Box::new(PatternLayout::default()),
            max_size: Self::DEFAULT_MAX_SIZE,
            max_backups: Self::DEFAULT_MAX_BACKUPS,
        }
    }

    /// Set the layout used to format log records.
    ///
    /// Default to [`PatternLayout::DEFAULT_FILE`].
    pub fn layout(mut self, layout: impl Into<Box<dyn Layout>>) -> Self {
        self.layout = layout.into();
        self
    }

    /// Set the size in bytes that triggers a rotation. Zero disables rotation.
    pub fn max_file_size(mut self, n: u64) -> Self {
        self.max_size = n;
        self
    }

    /// Set how many rotated files are kept. Zero truncates the active file on rotation.
    pub fn max_backups(mut self, n: usize) -> Self {
        self.max_backups = n;
        self
    }

    /// Build the [`RollingFile`] appender, creating missing parent directories.
    ///
    /// # Errors
    ///
    /// Return an error if the directory, the lock file or the log file cannot be created.
    pub fn build(self) -> Result<RollingFile, Error> {
        let Self {
            path,
            layout,
            max_size,
            max_backups,
        } = self;
        let writer = RollingFileWriter::new(path, max_size, max_backups)?;
        Ok(RollingFile { layout, writer })
    }
}
