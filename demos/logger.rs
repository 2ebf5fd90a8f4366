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

//! A configured logger with colored console output, rotating files and a caught failure.

use utilforth::Level;
use utilforth::LoggerConfig;
use utilforth::catch;
use utilforth::registry::LoggerRegistry;

fn main() {
    let logger = LoggerConfig::new("test_logger")
        .log_path("logs/test_app.log")
        .console_level(Level::Debug)
        .file_level(Level::Debug)
        .detach_error(false)
        .color_console(true)
        .file_backup_count(5)
        .file_max_bytes(10 * 1024 * 1024)
        .build();

    logger.debug(format_args!("debug message"));
    logger.info(format_args!("info message"));
    logger.warning(format_args!("warning message"));
    logger.error(format_args!("error message"));
    logger.critical(format_args!("critical message"));

    let divide = |a: i32, b: i32| {
        a.checked_div(b)
            .ok_or_else(|| anyhow::anyhow!("division by zero"))
    };
    let result = catch(&logger)
        .name("divide")
        .level(Level::Error)
        .reraise(false)
        .call(|| divide(1, 0));
    assert!(matches!(result, Ok(None)));

    // several named loggers sharing one configured logger, errors in their own file
    let config = LoggerConfig::new("shared_logger")
        .log_path("logs/test_shared.log")
        .console_level(Level::Debug)
        .detach_error(true);
    let registry = LoggerRegistry::new();
    let http = registry.register("http", &config);
    let db = registry.register("db", &config);

    http.info(format_args!("request served"));
    db.error(format_args!("query failed"));
}
