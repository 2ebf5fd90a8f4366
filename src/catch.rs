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

//! Run fallible code and log what goes wrong.
//!
//! [`catch`] takes a logger and returns a [`Catch`] that runs a callable, logs any error it
//! returns (or any panic it raises) together with the call site and a backtrace, hands the
//! error to an optional callback, and then either returns the error to the caller or swallows
//! it.
//!
//! ```
//! use utilforth::Level;
//! use utilforth::Logger;
//! use utilforth::append::Testing;
//! use utilforth::catch;
//!
//! let testing = Testing::default();
//! let logger = Logger::builder("app")
//!     .dispatch(|d| d.append(testing.clone()))
//!     .build();
//!
//! let result = catch(&logger)
//!     .reraise(false)
//!     .call(|| "x".parse::<u32>());
//!
//! assert!(matches!(result, Ok(None)));
//! assert_eq!(testing.levels(), vec![Level::Error]);
//! ```

use std::any::Any;
use std::any::type_name;
use std::backtrace::Backtrace;
use std::backtrace::BacktraceStatus;
use std::borrow::Cow;
use std::fmt;
use std::panic;
use std::panic::AssertUnwindSafe;
use std::panic::Location;

use crate::Level;
use crate::Logger;

/// Create a [`Catch`] that logs through the given logger.
///
/// Defaults: [`Level::Error`], errors are returned to the caller, no callback.
pub fn catch(logger: &Logger) -> Catch<'_> {
    Catch {
        logger,
        level: Level::Error,
        reraise: true,
        on_error: None,
        name: None,
    }
}

/// Runs callables, logging their failures. See [`catch`].
#[must_use = "call `call`, `call_unwind` or `wrap` to run something"]
pub struct Catch<'a> {
    logger: &'a Logger,
    level: Level,
    reraise: bool,
    on_error: Option<Box<dyn Fn(&anyhow::Error) + 'a>>,
    name: Option<Cow<'static, str>>,
}

impl fmt::Debug for Catch<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Catch")
            .field("logger", &self.logger.name())
            .field("level", &self.level)
            .field("reraise", &self.reraise)
            .field("on_error", &self.on_error.as_ref().map(|_| ".."))
            .field("name", &self.name)
            .finish()
    }
}

impl<'a> Catch<'a> {
    /// Set the level failures are logged at.
    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Whether the failure is handed back to the caller after it is logged.
    pub fn reraise(mut self, reraise: bool) -> Self {
        self.reraise = reraise;
        self
    }

    /// Set a callback invoked with every failure after it is logged.
    pub fn on_error(mut self, f: impl Fn(&anyhow::Error) + 'a) -> Self {
        self.on_error = Some(Box::new(f));
        self
    }

    /// Set the name used for the callable in log messages.
    ///
    /// Default to the type name of the callable, which is the path of a function item.
    pub fn name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Run `f`.
    ///
    /// Return `Ok(Some(value))` on success. On failure the error is logged with the caller's
    /// location, then `Err(error)` is returned if reraise is set and `Ok(None)` otherwise. The
    /// original error can be recovered with [`anyhow::Error::downcast`].
    #[track_caller]
    pub fn call<T, E, F>(&self, f: F) -> anyhow::Result<Option<T>>
    where
        F: FnOnce() -> Result<T, E>,
        E: Into<anyhow::Error>,
    {
        let location = Location::caller();
        match f() {
            Ok(value) => Ok(Some(value)),
            Err(err) => self
                .handle(err.into(), type_name::<F>(), location)
                .map(|()| None),
        }
    }

    /// Run `f`, catching a panic instead of an error.
    ///
    /// Return `Some(value)` on success. A panic is logged with the caller's location, then
    /// resumed if reraise is set; otherwise `None` is returned.
    #[track_caller]
    pub fn call_unwind<T, F>(&self, f: F) -> Option<T>
    where
        F: FnOnce() -> T,
    {
        let location = Location::caller();
        match panic::catch_unwind(AssertUnwindSafe(f)) {
            Ok(value) => Some(value),
            Err(payload) => {
                let err = anyhow::anyhow!("panicked: {}", panic_message(payload.as_ref()));
                if self.handle(err, type_name::<F>(), location).is_err() {
                    panic::resume_unwind(payload);
                }
                None
            }
        }
    }

    /// Turn `f` into a reusable closure that behaves like [`Catch::call`] on every invocation.
    ///
    /// Failures are reported at the location `wrap` was called from.
    #[track_caller]
    pub fn wrap<T, E, F>(self, f: F) -> impl Fn() -> anyhow::Result<Option<T>>
    where
        F: Fn() -> Result<T, E>,
        E: Into<anyhow::Error>,
    {
        let location = Location::caller();
        move || match f() {
            Ok(value) => Ok(Some(value)),
            Err(err) => self
                .handle(err.into(), type_name::<F>(), location)
                .map(|()| None),
        }
    }

    fn handle(
        &self,
        err: anyhow::Error,
        default_name: &str,
        location: &Location<'_>,
    ) -> anyhow::Result<()> {
        let name = self.name.as_deref().unwrap_or(default_name);
        let backtrace = origin_backtrace(&err);
        self.logger.log_at(
            self.level,
            location,
            format_args!("function `{name}` failed: {err:#}"),
            Some(backtrace),
        );

        if let Some(on_error) = &self.on_error {
            on_error(&err);
        }

        if self.reraise { Err(err) } else { Ok(()) }
    }
}

// The trace recorded where the error was created, when anyhow captured one.
fn origin_backtrace(err: &anyhow::Error) -> String {
    match err.backtrace().status() {
        BacktraceStatus::Captured => err.backtrace().to_string(),
        _ => Backtrace::force_capture().to_string(),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "Box<dyn Any>"
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::cell::RefCell;

    use super::*;
    use crate::append::Testing;
    use crate::layout::PatternLayout;

    #[derive(Debug)]
    struct ValueError(&'static str);

    impl fmt::Display for ValueError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "invalid value: {}", self.0)
        }
    }

    impl std::error::Error for ValueError {}

    fn parse_port() -> Result<u16, ValueError> {
        Err(ValueError("port"))
    }

    fn logger(testing: &Testing) -> Logger {
        Logger::builder("app")
            .dispatch(|d| d.append(testing.clone()))
            .build()
    }

    #[test]
    fn test_suppressed_error_is_logged_once() {
        let testing = Testing::default();
        let logger = logger(&testing);

        let result = catch(&logger).reraise(false).call(parse_port);

        assert!(matches!(result, Ok(None)));
        let lines = testing.lines();
        assert_eq!(lines.len(), 1);
        assert!(
            lines[0].starts_with(
                "[ERROR] [app] function `utilforth::catch::tests::parse_port` failed: invalid value: port\n"
            ),
            "{}",
            lines[0]
        );
    }

    #[test]
    fn test_reraise_returns_original_error() {
        let testing = Testing::default();
        let logger = logger(&testing);

        let err = catch(&logger).call(parse_port).unwrap_err();

        assert!(err.downcast_ref::<ValueError>().is_some());
        assert_eq!(testing.levels(), vec![Level::Error]);
    }

    #[test]
    fn test_backtrace_points_at_error_origin() {
        let testing = Testing::default().with_layout(PatternLayout::new("{message}").unwrap());
        let logger = logger(&testing);

        let err = catch(&logger)
            .call(|| Err::<(), _>(anyhow::anyhow!("origin")))
            .unwrap_err();

        let lines = testing.lines();
        let (message, trace) = lines[0].split_once('\n').unwrap();
        assert!(message.ends_with("failed: origin"));
        match err.backtrace().status() {
            BacktraceStatus::Captured => {
                assert_eq!(trace, err.backtrace().to_string().trim_end());
            }
            _ => assert!(!trace.trim().is_empty()),
        }
    }

    #[test]
    fn test_success_passes_value_through() {
        let testing = Testing::default();
        let logger = logger(&testing);

        let value = catch(&logger).call(|| Ok::<_, ValueError>(8080)).unwrap();

        assert_eq!(value, Some(8080));
        assert!(testing.lines().is_empty());
    }

    #[test]
    fn test_callback_level_and_call_site() {
        let testing = Testing::default()
            .with_layout(PatternLayout::new("{level} {file}:{line} {message}").unwrap());
        let logger = logger(&testing);
        let seen = RefCell::new(vec![]);

        let line = line!() + 5;
        let _ = catch(&logger)
            .level(Level::Critical)
            .name("load_settings")
            .on_error(|err| seen.borrow_mut().push(err.to_string()))
            .call(parse_port);

        assert_eq!(*seen.borrow(), vec!["invalid value: port".to_string()]);
        assert!(testing.lines()[0].starts_with(&format!(
            "CRITICAL catch.rs:{line} function `load_settings` failed"
        )));
    }

    #[test]
    fn test_wrap_is_reusable() {
        let testing = Testing::default();
        let logger = logger(&testing);
        let calls = Cell::new(0);

        let task = catch(&logger).reraise(false).wrap(|| {
            calls.set(calls.get() + 1);
            if calls.get() % 2 == 0 {
                Ok(calls.get())
            } else {
                Err(anyhow::anyhow!("odd call"))
            }
        });

        assert!(matches!(task(), Ok(None)));
        assert!(matches!(task(), Ok(Some(2))));
        assert!(matches!(task(), Ok(None)));
        assert_eq!(testing.levels(), vec![Level::Error, Level::Error]);
    }

    #[test]
    fn test_panic_is_swallowed_without_reraise() {
        let testing = Testing::default();
        let logger = logger(&testing);

        let result: Option<()> = catch(&logger)
            .reraise(false)
            .call_unwind(|| panic!("worker exploded"));

        assert!(result.is_none());
        assert!(testing.lines()[0].contains("failed: panicked: worker exploded"));
    }

    #[test]
    fn test_panic_is_resumed_with_reraise() {
        let testing = Testing::default();
        let logger = logger(&testing);

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            catch(&logger).call_unwind::<(), _>(|| panic!("worker exploded"))
        }));

        assert!(outcome.is_err());
        assert_eq!(testing.levels(), vec![Level::Error]);
    }
}
