// SPDX-License-Identifier: MPL-2.0

//! Logging support.
//!
//! Currently the logger prints the logs to the host's standard error.
//!
//! Messages are always printed in their entirety without being mixed with
//! messages generated concurrently on other host threads.

use alloc::format;
use std::{io::Write, time::Instant};

use log::{LevelFilter, Metadata, Record};
use spin::{Mutex as SpinLock, Once};

use crate::boot::kcmdline::KCmdlineArg;

static LOGGER: Logger = Logger {};

static BOOT_TIME: Once<Instant> = Once::new();

struct Logger {}

impl log::Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let elapsed = BOOT_TIME.call_once(Instant::now).elapsed();
        let timestamp = format!("[{:>10.3}]", elapsed.as_secs_f64());
        let level = format!("{:<5}", record.level());
        let record_str = format!("{}", record.args());

        #[cfg(feature = "log_color")]
        let (timestamp, level, record_str) = {
            use alloc::string::ToString;

            use owo_colors::OwoColorize;

            let timestamp = timestamp.green();
            let level = match record.level() {
                log::Level::Error => level.red().to_string(),
                log::Level::Warn => level.bright_yellow().to_string(),
                log::Level::Info => level.blue().to_string(),
                log::Level::Debug => level.bright_green().to_string(),
                log::Level::Trace => level.bright_black().to_string(),
            };
            let record_str = record_str.default_color();
            (timestamp, level, record_str)
        };

        // Use a global lock to prevent interleaving of log messages.
        static RECORD_LOCK: SpinLock<()> = SpinLock::new(());
        let _lock = RECORD_LOCK.lock();

        let _ = writeln!(
            std::io::stderr().lock(),
            "{} {}: {}",
            timestamp,
            level,
            record_str
        );
    }

    fn flush(&self) {}
}

/// Installs the logger with the given maximum level.
///
/// Calling it again only updates the level.
pub fn init(level: LevelFilter) {
    BOOT_TIME.call_once(Instant::now);
    // Another logger may already be installed, e.g. by an earlier boot in the
    // same process; the level is still ours to set.
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(level);
}

/// Reads `log_level=` from the kernel command line.
pub fn get_log_level(cmdline: &KCmdlineArg) -> Option<LevelFilter> {
    let value = cmdline.get_option("log_level")??;
    Some(match value {
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        // Otherwise, OFF
        _ => LevelFilter::Off,
    })
}
