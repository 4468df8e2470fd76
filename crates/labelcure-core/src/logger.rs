//! Console logging for the curation tools.
//!
//! Log lines go to stderr while the review prompt writes to stdout. Both
//! usually end up on the same terminal, so pending prompt output is flushed
//! before every log line; otherwise a buffered `> ` prompt shows up after the
//! messages logged while the reviewer was answering it.

use std::fmt;
use std::io::{self, Write};
use std::sync::OnceLock;
use std::time::Instant;

use log::{Level, LevelFilter, Log, Metadata, Record};

struct ConsoleLogger {
    level: LevelFilter,
    started: Instant,
}

/// `[   1.234s  WARN] message`
fn write_line(
    out: &mut impl Write,
    elapsed_secs: f64,
    level: Level,
    message: &fmt::Arguments<'_>,
) -> io::Result<()> {
    writeln!(out, "[{elapsed_secs:8.3}s {level:>5}] {message}")
}

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let _ = io::stdout().flush();
        let elapsed = self.started.elapsed().as_secs_f64();
        let _ = write_line(&mut io::stderr().lock(), elapsed, record.level(), record.args());
    }

    fn flush(&self) {
        let _ = io::stderr().flush();
    }
}

static LOGGER: OnceLock<ConsoleLogger> = OnceLock::new();

/// Install the console logger. Later calls keep the first level.
pub fn init_with_level(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    if LOGGER.get().is_some() {
        return Ok(());
    }
    let logger = LOGGER.get_or_init(|| ConsoleLogger {
        level,
        started: Instant::now(),
    });
    log::set_logger(logger)?;
    log::set_max_level(level);
    Ok(())
}

/// Install a `tracing` subscriber on stderr instead of the console logger.
///
/// `log` records are bridged; the filter comes from `RUST_LOG` (default
/// `info`).
#[cfg(feature = "tracing")]
pub fn init_tracing(json: bool) {
    use tracing_subscriber::fmt::format::FmtSpan;
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_span_events(FmtSpan::CLOSE);
    let _ = if json {
        builder.json().flatten_event(true).finish().try_init()
    } else {
        builder.compact().finish().try_init()
    };
}
