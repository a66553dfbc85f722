use std::{
    env,
    io::{stderr, IsTerminal, Write},
    sync::{Arc, Mutex},
};

use anyhow::Result;
use log::{Level, LevelFilter, Metadata, Record};
use termcolor::{BufferedStandardStream, Color, ColorChoice, ColorSpec, WriteColor};
use time::{macros::format_description, OffsetDateTime};

/// Logger for log:: messages. Everything goes to stderr, stdout is kept for
/// the stats lines so they can be piped to other tools.
pub(crate) struct Logger {
    /// Max level the logger will output.
    max_level: LevelFilter,
    inner: Mutex<LoggerWriter>,
}

struct LoggerWriter {
    stderr: BufferedStandardStream,
    use_colors: bool,
}

impl Logger {
    pub(crate) fn init(max_level: LevelFilter) -> Result<Arc<Self>> {
        let use_colors = Self::check_color_use();
        let logger = Arc::new(Logger {
            max_level,
            inner: Mutex::new(LoggerWriter {
                stderr: BufferedStandardStream::stderr(match use_colors {
                    true => ColorChoice::Auto,
                    false => ColorChoice::Never,
                }),
                use_colors,
            }),
        });

        log::set_max_level(max_level);
        log::set_boxed_logger(Box::new(Arc::clone(&logger)))?;

        Ok(logger)
    }

    fn level_color(level: Level) -> Color {
        match level {
            Level::Error => Color::Red,
            Level::Warn => Color::Yellow,
            Level::Info => Color::Blue,
            Level::Debug => Color::Cyan,
            Level::Trace => Color::White,
        }
    }

    fn try_log(&self, record: &Record) -> Result<()> {
        let inner: &mut LoggerWriter = &mut self.inner.lock().unwrap();

        // Timestamps are only useful when debugging.
        if self.max_level >= LevelFilter::Debug {
            OffsetDateTime::now_utc().format_into(
                &mut inner.stderr,
                format_description!("[hour]:[minute]:[second].[subsecond digits:6] "),
            )?;
        }

        // Prefix errors and warnings with their level, or everything when
        // debugging.
        if record.level() <= LevelFilter::Warn || self.max_level >= LevelFilter::Debug {
            if inner.use_colors {
                inner
                    .stderr
                    .set_color(ColorSpec::new().set_fg(Some(Self::level_color(record.level()))))?;
            }
            write!(inner.stderr, "{:5} ", record.level())?;
            if inner.use_colors {
                inner.stderr.reset()?;
            }
        }

        writeln!(inner.stderr, "{}", record.args())?;
        inner.stderr.flush()?;
        Ok(())
    }

    /// Colors are used only on a terminal which is not "dumb".
    fn check_color_use() -> bool {
        stderr().is_terminal() && matches!(env::var("TERM"), Ok(x) if x != "dumb")
    }
}

impl log::Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.max_level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        // Not much we can do to report the error...
        let _ = self.try_log(record);
    }

    fn flush(&self) {
        let _ = self.inner.lock().unwrap().stderr.flush();
    }
}
