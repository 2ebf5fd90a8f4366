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

//! Color utilities.

use colored::Color;

use crate::Level;

/// The escape sequence that resets all styles.
pub const RESET: &str = "\x1b[0m";

/// Colors for different log levels.
#[derive(Debug, Clone)]
pub struct LevelColor {
    /// Color for debug level logs.
    pub debug: Color,
    /// Color for info level logs.
    pub info: Color,
    /// Color for warning level logs.
    pub warning: Color,
    /// Color for error level logs.
    pub error: Color,
    /// Color for critical level logs.
    pub critical: Color,
}

impl Default for LevelColor {
    fn default() -> Self {
        Self {
            debug: Color::Cyan,
            info: Color::Green,
            warning: Color::Yellow,
            error: Color::Red,
            critical: Color::Magenta,
        }
    }
}

impl LevelColor {
    /// The color configured for the given level.
    pub fn color(&self, level: Level) -> Color {
        match level {
            Level::Debug => self.debug,
            Level::Info => self.info,
            Level::Warning => self.warning,
            Level::Error => self.error,
            Level::Critical => self.critical,
        }
    }

    /// The escape sequence that starts the level part of a line.
    pub fn level_style(&self, level: Level) -> String {
        format!("\x1b[{}m", self.color(level).to_fg_str())
    }

    /// The escape sequence that starts the message part of a line: the level color, dimmed and
    /// italic.
    pub fn message_style(&self, level: Level) -> String {
        format!("\x1b[{};2;3m", self.color(level).to_fg_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_styles() {
        let colors = LevelColor::default();
        assert_eq!(colors.level_style(Level::Debug), "\x1b[36m");
        assert_eq!(colors.level_style(Level::Info), "\x1b[32m");
        assert_eq!(colors.level_style(Level::Warning), "\x1b[33m");
        assert_eq!(colors.level_style(Level::Error), "\x1b[31m");
        assert_eq!(colors.level_style(Level::Critical), "\x1b[35m");
        assert_eq!(colors.message_style(Level::Warning), "\x1b[33;2;3m");
    }
}
