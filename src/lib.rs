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

//! Utilforth is a small utility toolkit: a logging facade with colored console output and
//! multi-process-safe rotating log files, and blocking/async HTTP clients with a bounded retry
//! loop.
//!
//! # Overview
//!
//! A [`Logger`] dispatches records to one or more sinks. Each sink is a set of filters and
//! appenders, so the console, the log file and a separate error file can each have their own
//! severity floor and format. [`LoggerConfig`] wires up the common setup in one call, and
//! [`catch`] turns failures of a callable into logged errors.
//!
//! The [`http`] module wraps `reqwest` with default headers, timeouts, optional session reuse
//! and retries, and reports every request as an [`http::Outcome`] instead of an error.
//!
//! # Examples
//!
//! Configured logger with a console and a rotating file sink:
//!
//! ```
//! use utilforth::Level;
//! use utilforth::LoggerConfig;
//!
//! let dir = tempfile::tempdir().unwrap();
//! let logger = LoggerConfig::new("app")
//!     .log_path(dir.path().join("app.log"))
//!     .console_level(Level::Warning)
//!     .build();
//!
//! logger.info(format_args!("written to the file only"));
//! logger.error(format_args!("written to the console and the file"));
//! ```
//!
//! Hand-built dispatches:
//!
//! ```
//! use utilforth::Level;
//! use utilforth::Logger;
//! use utilforth::append;
//! use utilforth::filter::BelowLevel;
//!
//! let logger = Logger::builder("app")
//!     .dispatch(|d| d.filter(Level::Error).append(append::Stderr::default()))
//!     .dispatch(|d| {
//!         d.filter(Level::Info)
//!             .filter(BelowLevel(Level::Error))
//!             .append(append::Stdout::default())
//!     })
//!     .build();
//!
//! logger.error(format_args!("Error message."));
//! logger.info(format_args!("Info message."));
//! ```

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod append;
pub mod filter;
pub mod http;
pub mod layout;
pub mod registry;

mod catch;
mod color;
mod config;
mod error;
mod logger;
mod record;

pub use append::Append;
pub use filter::Filter;
pub use layout::Layout;

pub use self::catch::Catch;
pub use self::catch::catch;
pub use self::color::LevelColor;
pub use self::config::LoggerConfig;
pub use self::config::error_log_path;
pub use self::error::Error;
pub use self::logger::DispatchBuilder;
pub use self::logger::Logger;
pub use self::logger::LoggerBuilder;
pub use self::record::Level;
pub use self::record::Record;
pub use self::record::RecordBuilder;
