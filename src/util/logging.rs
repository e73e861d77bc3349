// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use env_logger::Logger;
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;

/// Rewrites the level of records from noisy targets, e.g. demoting
/// `actix_server` info lines to debug.
struct LevelModifierLogger {
    inner: Logger,
    rules: Vec<(String, Level, Level)>,
}

impl LevelModifierLogger {
    fn level_for(&self, target: &str, level: Level) -> Level {
        self.rules
            .iter()
            .find(|(prefix, from, _)| target.starts_with(prefix.as_str()) && *from == level)
            .map(|(_, _, to)| *to)
            .unwrap_or(level)
    }
}

impl Log for LevelModifierLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        let metadata = Metadata::builder()
            .level(self.level_for(metadata.target(), metadata.level()))
            .target(metadata.target())
            .build();
        self.inner.enabled(&metadata)
    }

    fn log(&self, record: &Record) {
        let level = self.level_for(record.target(), record.level());
        self.inner.log(
            &Record::builder()
                .level(level)
                .target(record.target())
                .args(*record.args())
                .module_path(record.module_path())
                .file(record.file())
                .line(record.line())
                .build(),
        );
    }

    fn flush(&self) {
        self.inner.flush();
    }
}

pub fn parse_level(level: &str) -> LevelFilter {
    match level.to_lowercase().as_str() {
        "trace" => LevelFilter::Trace,
        "debug" => LevelFilter::Debug,
        "info" => LevelFilter::Info,
        "warn" => LevelFilter::Warn,
        "error" => LevelFilter::Error,
        _ => LevelFilter::Info,
    }
}

pub fn build_logger(level: LevelFilter) -> Logger {
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .target(env_logger::Target::Stdout)
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] {}: {}",
                chrono::Utc::now().format("%Y-%m-%d %H:%M:%S%.3f UTC"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .build()
}

pub fn init_logger(level: &str) -> Result<(), SetLoggerError> {
    let logger = LevelModifierLogger {
        inner: build_logger(parse_level(level)),
        rules: vec![("actix_server".to_string(), Level::Info, Level::Debug)],
    };
    log::set_boxed_logger(Box::new(logger))?;
    log::set_max_level(LevelFilter::Trace);
    Ok(())
}
