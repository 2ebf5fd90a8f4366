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

use std::sync::Arc;
use std::sync::Mutex;

use crate::Error;
use crate::Level;
use crate::append::Append;
use crate::layout::Layout;
use crate::layout::PatternLayout;
use crate::record::Record;

/// An appender that keeps formatted records in memory, so tests can assert on what a logger
/// emitted. Clones share the same buffer.
///
/// Each line is also written with `eprintln!`, which the test harness captures unless
/// `--nocapture` or `--show-output` is specified.
///
/// # Examples
///
/// ```
/// use utilforth::Level;
/// use utilforth::Logger;
/// use utilforth::append::Testing;
///
/// let testing = Testing::default();
/// let logger = Logger::builder("app")
///     .dispatch(|d| d.append(testing.clone()))
///     .build();
///
/// logger.warning(format_args!("low disk"));
/// assert_eq!(testing.lines().len(), 1);
/// assert_eq!(testing.levels(), vec![Level::Warning]);
/// ```
#[derive(Debug, Clone)]
pub struct Testing {
    layout: Arc<dyn Layout>,
    entries: Arc<Mutex<Vec<(Level, String)>>>,
}

impl Default for Testing {
    fn default() -> Self {
        Self {
            layout: Arc::new(
                PatternLayout::new("[{level}] [{name}] {message}")
                    .expect("testing pattern must be valid"),
            ),
            entries: Arc::default(),
        }
    }
}

impl Testing {
    /// Set the layout for the [`Testing`] appender.
    pub fn with_layout(mut self, layout: impl Layout) -> Self {
        self.layout = Arc::new(layout);
        self
    }

    /// All formatted lines captured so far.
    pub fn lines(&self) -> Vec<String> {
        self.entries()
            .into_iter()
            .map(|(_, line)| line)
            .collect()
    }

    /// The levels of all records captured so far.
    pub fn levels(&self) -> Vec<Level> {
        self.entries()
            .into_iter()
            .map(|(level, _)| level)
            .collect()
    }

    fn entries(&self) -> Vec<(Level, String)> {
        match self.entries.lock() {
            Ok(entries) => entries.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl Append for Testing {
    fn append(&self, record: &Record) -> Result<(), Error> {
        let bytes = self.layout.format(record)?;
        let line = String::from_utf8_lossy(&bytes).into_owned();
        eprintln!("{line}");

        let mut entries = self
            .entries
            .lock()
            .map_err(|_| Error::new("testing appender buffer is poisoned"))?;
        entries.push((record.level(), line));
        Ok(())
    }
}
