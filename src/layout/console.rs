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

use crate::Error;
use crate::color::LevelColor;
use crate::color::RESET;
use crate::layout::Layout;
use crate::layout::PatternLayout;
use crate::record::Record;

/// A layout for console sinks that colors the level part and the message part of a line
/// independently.
///
/// With color on, a line renders as:
///
/// ```text
/// <level color>[WARNING ] [app] [main.rs:app:12] - <reset><message color>disk almost full<reset>
/// ```
///
/// Everything the template renders except `{message}` forms the level part. The message color
/// is the level color, dimmed and italic. Whether escapes are written depends only on
/// [`ColoredLayout::no_color`], never on terminal detection.
///
/// # Examples
///
/// ```
/// use utilforth::layout::ColoredLayout;
/// use utilforth::layout::PatternLayout;
///
/// let layout = ColoredLayout::new(PatternLayout::new("[{level}] {message}").unwrap());
/// let plain = ColoredLayout::default().no_color();
/// ```
#[derive(Debug, Clone)]
pub struct ColoredLayout {
    pattern: PatternLayout,
    colors: LevelColor,
    no_color: bool,
}

impl Default for ColoredLayout {
    fn default() -> Self {
        let pattern = PatternLayout::new(PatternLayout::DEFAULT_CONSOLE)
            .expect("default console pattern must be valid");
        Self::new(pattern)
    }
}

impl ColoredLayout {
    /// Create a colored layout over the given pattern.
    pub fn new(pattern: PatternLayout) -> Self {
        Self {
            pattern,
            colors: LevelColor::default(),
            no_color: false,
        }
    }

    /// Customize the color of each level.
    pub fn colors(mut self, colors: LevelColor) -> Self {
        self.colors = colors;
        self
    }

    /// Disable colored output.
    pub fn no_color(mut self) -> Self {
        self.no_color = true;
        self
    }

    /// Enable or disable colored output.
    pub fn with_color(mut self, color: bool) -> Self {
        self.no_color = !color;
        self
    }
}

impl Layout for ColoredLayout {
    fn format(&self, record: &Record) -> Result<Vec<u8>, Error> {
        if self.no_color {
            return self.pattern.format(record);
        }

        let level = record.level();
        let head = self.pattern.render(record, false);
        let mut text = format!(
            "{}{head}{RESET}{}{}{RESET}",
            self.colors.level_style(level),
            self.colors.message_style(level),
            record.payload(),
        );
        if let Some(backtrace) = record.backtrace() {
            text.push('\n');
            text.push_str(backtrace.trim_end());
        }
        Ok(text.into_bytes())
    }
}
