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

//! Share one configured logger between many named loggers.
//!
//! A [`LoggerRegistry`] owns at most one shared [`Logger`] built from a [`LoggerConfig`]. The
//! first configuration wins: later requests with different settings get the same instance.
//! Named loggers registered with the registry forward their records to the shared logger, and
//! the registry itself implements [`log::Log`] so it can be installed as the global logger.
//!
//! ```
//! use utilforth::LoggerConfig;
//! use utilforth::registry::LoggerRegistry;
//!
//! let dir = tempfile::tempdir().unwrap();
//! let config = LoggerConfig::new("shared")
//!     .log_path(dir.path().join("shared.log"))
//!     .enable_console(false);
//!
//! let registry = LoggerRegistry::new();
//! let http = registry.register("http", &config);
//! let db = registry.register("db", &config);
//!
//! http.info(format_args!("listening"));
//! db.info(format_args!("connected"));
//!
//! let text = std::fs::read_to_string(dir.path().join("shared.log")).unwrap();
//! assert!(text.contains("[http] "));
//! assert!(text.contains("[db] "));
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::OnceLock;
use std::sync::PoisonError;
use std::sync::RwLock;

use crate::Error;
use crate::Level;
use crate::Logger;
use crate::LoggerConfig;
use crate::append::Append;
use crate::record::Record;

/// An explicitly owned registry of named loggers backed by one shared logger.
#[derive(Debug, Default)]
pub struct LoggerRegistry {
    shared: OnceLock<Arc<Logger>>,
    loggers: RwLock<BTreeMap<String, Arc<Logger>>>,
}

impl LoggerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The shared logger, built from `config` if this is the first request.
    ///
    /// Once built, the configuration of later requests is ignored.
    pub fn shared(&self, config: &LoggerConfig) -> Arc<Logger> {
        self.shared
            .get_or_init(|| Arc::new(config.build()))
            .clone()
    }

    /// An appender forwarding records to the shared logger.
    ///
    /// The appender drops records below the file level of `config`, like any sink built from
    /// it would.
    pub fn handler(&self, config: &LoggerConfig) -> SharedHandler {
        SharedHandler {
            logger: self.shared(config),
            level: config.file_threshold(),
        }
    }

    /// Register a named logger whose only sink is a [`SharedHandler`].
    ///
    /// Registering a name twice returns the logger registered first.
    pub fn register(&self, name: impl Into<String>, config: &LoggerConfig) -> Arc<Logger> {
        let name = name.into();
        let mut loggers = self.loggers.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(logger) = loggers.get(&name) {
            return logger.clone();
        }

        let handler = self.handler(config);
        let logger = Arc::new(
            Logger::builder(name.as_str())
                .dispatch(|d| d.append(handler))
                .build(),
        );
        loggers.insert(name, logger.clone());
        logger
    }

    /// The logger registered under `name`.
    pub fn get(&self, name: &str) -> Option<Arc<Logger>> {
        let loggers = self.loggers.read().unwrap_or_else(PoisonError::into_inner);
        loggers.get(name).cloned()
    }

    /// The registered logger responsible for a `log` target: an exact match, or the longest
    /// registered name that is a `::`-separated prefix of the target.
    pub fn route(&self, target: &str) -> Option<Arc<Logger>> {
        let loggers = self.loggers.read().unwrap_or_else(PoisonError::into_inner);
        loggers
            .iter()
            .filter(|(name, _)| {
                target == name.as_str()
                    || target
                        .strip_prefix(name.as_str())
                        .is_some_and(|rest| rest.starts_with("::"))
            })
            .max_by_key(|(name, _)| name.len())
            .map(|(_, logger)| logger.clone())
    }

    /// Set up this registry as the global [`log`] logger.
    ///
    /// # Errors
    ///
    /// Return an error if a global logger has already been set.
    pub fn try_apply(self) -> Result<(), log::SetLoggerError> {
        log::set_boxed_logger(Box::new(self))?;
        log::set_max_level(log::LevelFilter::Trace);
        Ok(())
    }

    /// Set up this registry as the global [`log`] logger.
    ///
    /// # Panics
    ///
    /// Panic if the global logger has already been set.
    pub fn apply(self) {
        self.try_apply()
            .expect("LoggerRegistry::apply must be called before the global logger initialized");
    }
}

impl log::Log for LoggerRegistry {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        self.route(metadata.target())
            .is_some_and(|logger| Logger::enabled(&logger, metadata.level().into()))
    }

    fn log(&self, record: &log::Record) {
        if let Some(logger) = self.route(record.target()) {
            log::Log::log(logger.as_ref(), record);
        }
    }

    fn flush(&self) {
        if let Some(shared) = self.shared.get() {
            Logger::flush(shared);
        }
    }
}

/// An appender that hands records to a shared logger.
#[derive(Debug, Clone)]
pub struct SharedHandler {
    logger: Arc<Logger>,
    level: Level,
}

impl SharedHandler {
    /// The shared logger records are forwarded to.
    pub fn logger(&self) -> &Arc<Logger> {
        &self.logger
    }
}

impl Append for SharedHandler {
    fn append(&self, record: &Record) -> Result<(), Error> {
        if record.level() >= self.level {
            self.logger.log_record(record);
        }
        Ok(())
    }

    fn flush(&self) -> Result<(), Error> {
        Logger::flush(&self.logger);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet(name: &str) -> LoggerConfig {
        LoggerConfig::new(name)
            .log_path(format!("{name}.log"))
            .enable_console(false)
            .enable_file(false)
    }

    #[test]
    fn test_first_construction_wins() {
        let registry = LoggerRegistry::new();
        let first = registry.shared(&quiet("first"));
        let second = registry.shared(&quiet("second").console_level(Level::Critical));

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.name(), "first");
    }

    #[test]
    fn test_registries_are_independent() {
        let a = LoggerRegistry::new();
        let b = LoggerRegistry::new();

        assert_eq!(a.shared(&quiet("a")).name(), "a");
        assert_eq!(b.shared(&quiet("b")).name(), "b");
    }

    #[test]
    fn test_register_is_idempotent() {
        let registry = LoggerRegistry::new();
        let http = registry.register("http", &quiet("shared"));
        let again = registry.register("http", &quiet("other"));

        assert!(Arc::ptr_eq(&http, &again));
        assert!(registry.get("http").is_some());
        assert!(registry.get("db").is_none());
    }

    #[test]
    fn test_route_prefers_longest_prefix() {
        let registry = LoggerRegistry::new();
        registry.register("app", &quiet("shared"));
        registry.register("app::db", &quiet("shared"));

        assert_eq!(registry.route("app").unwrap().name(), "app");
        assert_eq!(registry.route("app::http").unwrap().name(), "app");
        assert_eq!(registry.route("app::db::pool").unwrap().name(), "app::db");
        assert!(registry.route("application").is_none());
        assert!(registry.route("other").is_none());
    }

    #[test]
    fn test_enabled_follows_routing() {
        let registry = LoggerRegistry::new();
        registry.register("db", &quiet("shared"));

        fn metadata(target: &str) -> log::Metadata<'_> {
            log::Metadata::builder()
                .target(target)
                .level(log::Level::Info)
                .build()
        }

        assert!(log::Log::enabled(&registry, &metadata("db")));
        assert!(log::Log::enabled(&registry, &metadata("db::pool")));
        assert!(!log::Log::enabled(&registry, &metadata("cache")));
    }
}
