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

use std::fmt::Write;
use std::str::FromStr;

use crate::Error;
use crate::layout::Layout;
use crate::record::Record;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S,%3f";

/// A layout that renders records through a template parsed once at construction.
///
/// Supported placeholders:
///
/// | placeholder | value                                  |
/// |-------------|----------------------------------------|
/// | `{time}`    | local time, `2025-06-19 16:51:55,123`  |
/// | `{level}`   | `DEBUG`, `INFO`, `WARNING`, ...        |
/// | `{name}`    | logger name                            |
/// | `{target}`  | record target                          |
/// | `{module}`  | module path, or the target if unknown  |
/// | `{file}`    | file name of the call site             |
/// | `{path}`    | full file path of the call site        |
/// | `{line}`    | line of the call site                  |
/// | `{message}` | message body                           |
///
/// A placeholder may carry an alignment spec such as `{level:<8}`, `{line:>4}` or
/// `{name:^10}`. Use `{{` and `}}` for literal braces.
///
/// When the record carries a backtrace, it is appended on a new line.
///
/// # Examples
///
/// ```
/// use utilforth::layout::PatternLayout;
///
/// let layout = PatternLayout::new("[{level:<8}] {name} - {message}").unwrap();
/// assert!(PatternLayout::new("{nope}").is_err());
/// ```
#[derive(Debug, Clone)]
pub struct PatternLayout {
    segments: Vec<Segment>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field(Field, Option<Align>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Time,
    Level,
    Name,
    Target,
    Module,
    File,
    Path,
    Line,
    Message,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
    Left(usize),
    Right(usize),
    Center(usize),
}

impl PatternLayout {
    /// The default template of console sinks.
    pub const DEFAULT_CONSOLE: &'static str =
        "[{level:<8}] [{name}] [{file}:{module}:{line}] - {message}";

    /// The default template of file sinks.
    pub const DEFAULT_FILE: &'static str =
        "{time} - [{level:<8}] [{name}] [{file}:{module}:{line}] - {message}";

    /// Parse a template.
    ///
    /// # Errors
    ///
    /// Return an error if the template has unbalanced braces, an unknown placeholder or a
    /// malformed alignment spec.
    pub fn new(pattern: &str) -> Result<Self, Error> {
        let segments = parse(pattern)
            .map_err(|err| err.with_context("pattern", pattern))?;
        Ok(Self { segments })
    }

    /// Render the record, leaving out every `{message}` placeholder when `with_message` is
    /// false.
    pub(crate) fn render(&self, record: &Record, with_message: bool) -> String {
        let mut text = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(literal) => text.push_str(literal),
                Segment::Field(Field::Message, _) if !with_message => {}
                Segment::Field(field, align) => {
                    let value = field.value(record);
                    // SAFETY: write to a string always succeeds
                    match *align {
                        None => text.push_str(&value),
                        Some(Align::Left(width)) => write!(&mut text, "{value:<width$}").unwrap(),
                        Some(Align::Right(width)) => write!(&mut text, "{value:>width$}").unwrap(),
                        Some(Align::Center(width)) => write!(&mut text, "{value:^width$}").unwrap(),
                    }
                }
            }
        }
        text
    }
}

impl Default for PatternLayout {
    fn default() -> Self {
        Self::from_str(Self::DEFAULT_FILE).expect("default file pattern must be valid")
    }
}

impl FromStr for PatternLayout {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PatternLayout::new(s)
    }
}

impl Layout for PatternLayout {
    fn format(&self, record: &Record) -> Result<Vec<u8>, Error> {
        let mut text = self.render(record, true);
        if let Some(backtrace) = record.backtrace() {
            text.push('\n');
            text.push_str(backtrace.trim_end());
        }
        Ok(text.into_bytes())
    }
}

impl Field {
    fn value(self, record: &Record) -> String {
        match self {
            Field::Time => record.time().strftime(TIME_FORMAT).to_string(),
            Field::Level => record.level().as_str().to_string(),
            Field::Name => record.name().to_string(),
            Field::Target => record.target().to_string(),
            Field::Module => record.module_path().unwrap_or(record.target()).to_string(),
            Field::File => record.filename().to_string(),
            Field::Path => record.file().unwrap_or_default().to_string(),
            Field::Line => record.line().unwrap_or_default().to_string(),
            Field::Message => record.payload().to_string(),
        }
    }
}

impl FromStr for Field {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "time" => Ok(Field::Time),
            "level" => Ok(Field::Level),
            "name" => Ok(Field::Name),
            "target" => Ok(Field::Target),
            "module" => Ok(Field::Module),
            "file" => Ok(Field::File),
            "path" => Ok(Field::Path),
            "line" => Ok(Field::Line),
            "message" => Ok(Field::Message),
            _ => Err(Error::new(format!("unknown placeholder: {s:?}"))),
        }
    }
}

impl FromStr for Align {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (ctor, width): (fn(usize) -> Align, &str) = match s.chars().next() {
            Some('<') => (Align::Left, &s[1..]),
            Some('>') => (Align::Right, &s[1..]),
            Some('^') => (Align::Center, &s[1..]),
            _ => (Align::Left, s),
        };
        let width = width
            .parse::<usize>()
            .map_err(|err| Error::new(format!("malformed alignment: {s:?}")).with_source(err))?;
        Ok(ctor(width))
    }
}

fn parse(pattern: &str) -> Result<Vec<Segment>, Error> {
    let mut segments = vec![];
    let mut literal = String::new();
    let mut chars = pattern.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                literal.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                literal.push('}');
            }
            '}' => return Err(Error::new("unmatched '}' in pattern")),
            '{' => {
                let mut spec = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some('{') | None => {
                            return Err(Error::new("unterminated placeholder in pattern"));
                        }
                        Some(c) => spec.push(c),
                    }
                }

                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }

                let (field, align) = match spec.split_once(':') {
                    Some((field, align)) => (field.trim(), Some(align.parse::<Align>()?)),
                    None => (spec.trim(), None),
                };
                segments.push(Segment::Field(field.parse()?, align));
            }
            c => literal.push(c),
        }
    }

    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Level;

    fn record(level: Level, message: &str) -> Record<'_> {
        Record::builder()
            .name("app")
            .level(level)
            .module_path(Some("app::worker"))
            .file(Some("src/worker.rs"))
            .line(Some(42))
            .payload(message)
            .build()
    }

    #[test]
    fn test_default_console_pattern() {
        let layout = PatternLayout::new(PatternLayout::DEFAULT_CONSOLE).unwrap();
        let bytes = layout.format(&record(Level::Info, "started")).unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            "[INFO    ] [app] [worker.rs:app::worker:42] - started"
        );
    }

    #[test]
    fn test_alignment_and_escapes() {
        let layout = PatternLayout::new("{{{level:>8}}} {line:^6}|{path}").unwrap();
        let text = layout.render(&record(Level::Error, "x"), true);
        assert_eq!(text, "{   ERROR}   42  |src/worker.rs");
    }

    #[test]
    fn test_render_without_message() {
        let layout = PatternLayout::new("[{level}] {message} <").unwrap();
        let text = layout.render(&record(Level::Warning, "careful"), false);
        assert_eq!(text, "[WARNING]  <");
    }

    #[test]
    fn test_time_placeholder() {
        let now: jiff::Zoned = "2025-06-19T16:51:55.123456+00:00[UTC]".parse().unwrap();
        let record = Record::builder().time(now).payload("x").build();
        let layout = PatternLayout::new("{time}").unwrap();
        assert_eq!(layout.render(&record, true), "2025-06-19 16:51:55,123");
    }

    #[test]
    fn test_backtrace_appended() {
        let layout = PatternLayout::new("{message}").unwrap();
        let record = Record::builder()
            .payload("failed")
            .backtrace(Some("  0: main\n"))
            .build();
        let bytes = layout.format(&record).unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), "failed\n  0: main");
    }

    #[test]
    fn test_malformed_patterns() {
        assert!(PatternLayout::new("{unknown}").is_err());
        assert!(PatternLayout::new("{level").is_err());
        assert!(PatternLayout::new("level}").is_err());
        assert!(PatternLayout::new("{level:<x}").is_err());
        let err = PatternLayout::new("{nope}").unwrap_err();
        assert_eq!(err.context("pattern"), Some("{nope}"));
    }
}
