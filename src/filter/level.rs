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

use crate::filter::Filter;
use crate::filter::FilterResult;
use crate::record::Level;

/// A filter that rejects records less severe than the given level.
///
/// If the level is `Info`, it will allow `Info`, `Warning`, `Error` and `Critical` records.
#[derive(Debug, Clone, Copy)]
pub struct MinLevel(pub Level);

impl Filter for MinLevel {
    fn enabled(&self, level: Level) -> FilterResult {
        if level >= self.0 {
            FilterResult::Neutral
        } else {
            FilterResult::Reject
        }
    }
}

/// A filter that rejects records at or above the given level.
///
/// If the level is `Error`, it will allow `Debug`, `Info` and `Warning` records only.
#[derive(Debug, Clone, Copy)]
pub struct BelowLevel(pub Level);

impl Filter for BelowLevel {
    fn enabled(&self, level: Level) -> FilterResult {
        if level < self.0 {
            FilterResult::Neutral
        } else {
            FilterResult::Reject
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEVELS: [Level; 5] = [
        Level::Debug,
        Level::Info,
        Level::Warning,
        Level::Error,
        Level::Critical,
    ];

    #[test]
    fn test_min_level() {
        for threshold in LEVELS {
            let filter = MinLevel(threshold);
            for level in LEVELS {
                let expected = if level >= threshold {
                    FilterResult::Neutral
                } else {
                    FilterResult::Reject
                };
                assert_eq!(filter.enabled(level), expected, "{threshold} vs {level}");
            }
        }
    }

    #[test]
    fn test_below_level_is_complement_of_min_level() {
        for threshold in LEVELS {
            for level in LEVELS {
                assert_ne!(
                    MinLevel(threshold).enabled(level),
                    BelowLevel(threshold).enabled(level)
                );
            }
        }
    }
}
