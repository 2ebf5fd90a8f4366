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

//! Appender for writing log records to size-rotated files.
//!
//! Every write takes an exclusive advisory lock on a sibling lock file, so several processes
//! can share one log file: whichever process notices the size threshold first rotates the
//! files, the others pick up the fresh file on their next write.
//!
//! # Example
//!
//! ```
//! use utilforth::Level;
//! use utilforth::Logger;
//! use utilforth::append::rolling_file::RollingFileBuilder;
//! use utilforth::filter::MinLevel;
//!
//! let dir = tempfile::tempdir().unwrap();
//! let rolling = RollingFileBuilder::new(dir.path().join("app.log"))
//!     .max_file_size(1024 * 1024)
//!     .max_backups(3)
//!     .build()
//!     .unwrap();
//!
//! let logger = Logger::builder("app")
//!     .dispatch(|d| d.filter(MinLevel(Level::Debug)).append(rolling))
//!     .build();
//!
//! logger.info(format_args!("This log will be written to a rolling file."));
//! ```

pub use append::RollingFile;
pub use append::RollingFileBuilder;
pub use rolling::RollingFileWriter;

mod append;
mod rolling;
