use std::{path::PathBuf, str::FromStr, time::Duration};

use anyhow::Result;
use clap::{builder::PossibleValuesParser, Parser};
use log::LevelFilter;

use crate::helpers::number::Grouping;

/// Default probe object, looked up in the current directory.
pub(crate) const DEFAULT_FILENAME: &str = "trace_prog_kern.o";

/// XDP exception tracepoint loader and stats program
///
/// Loads a BPF object, attaches its program to the xdp:xdp_exception
/// tracepoint and periodically prints the per-interface counters it collects.
#[derive(Parser, Debug)]
#[command(name = "trace-stats", version)]
pub(crate) struct TraceStatsCli {
    #[arg(short, long, help = "Quiet mode (no verbose output)")]
    pub(crate) quiet: bool,
    #[arg(
        long,
        value_name = "file",
        default_value = DEFAULT_FILENAME,
        help = "Load program from <file>"
    )]
    pub(crate) filename: PathBuf,
    #[arg(
        long,
        value_name = "secs",
        default_value_t = 2,
        value_parser = clap::value_parser!(u64).range(1..),
        help = "Interval between two stats dumps, in seconds"
    )]
    pub(crate) interval: u64,
    #[arg(long, help = "Do not group digits of the counters")]
    pub(crate) no_grouping: bool,
    #[arg(
        long,
        value_parser=PossibleValuesParser::new(["error", "warn", "info", "debug", "trace"]),
        default_value = "info",
        help = "Log level",
    )]
    pub(crate) log_level: String,
}

impl TraceStatsCli {
    /// Resolve the arguments into the configuration used by the rest of the
    /// program.
    pub(crate) fn config(&self) -> StatsConfig {
        StatsConfig {
            filename: self.filename.clone(),
            verbose: !self.quiet,
            interval: Duration::from_secs(self.interval),
            grouping: match self.no_grouping {
                true => Grouping::None,
                false => Grouping::Thousands(','),
            },
        }
    }

    pub(crate) fn log_level(&self) -> Result<LevelFilter> {
        Ok(LevelFilter::from_str(&self.log_level)?)
    }
}

/// Runtime configuration, passed explicitly to the loader and the poller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct StatsConfig {
    /// Path of the probe object.
    pub(crate) filename: PathBuf,
    /// Report what is loaded and read.
    pub(crate) verbose: bool,
    /// Time between two scans of the stats map.
    pub(crate) interval: Duration,
    pub(crate) grouping: Grouping,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            filename: PathBuf::from(DEFAULT_FILENAME),
            verbose: true,
            interval: Duration::from_secs(2),
            grouping: Grouping::Thousands(','),
        }
    }
}
