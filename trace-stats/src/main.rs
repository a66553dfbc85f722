use std::{io, process::ExitCode};

use anyhow::Result;
use clap::Parser;
use log::{debug, error, info};

mod cli;
mod core;
mod helpers;
mod stats;

use crate::{
    cli::TraceStatsCli,
    core::{
        check::collection_prerequisites,
        error::{exit_status_of, ExitStatus},
        maps::{resolve_table, validate_table},
        probe::{Hook, ProbeObject},
    },
    helpers::{logger::Logger, signals::Running},
    stats::{stats_map_expectation, Poller, STATS_MAP_NAME},
};

fn main() -> ExitCode {
    let cli = match TraceStatsCli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return match e.use_stderr() {
                true => ExitStatus::FailOption,
                false => ExitStatus::Ok,
            }
            .into();
        }
    };

    match run(cli) {
        Ok(()) => ExitStatus::Ok.into(),
        Err(e) => {
            error!("{e:#}");
            exit_status_of(&e).into()
        }
    }
}

fn run(cli: TraceStatsCli) -> Result<()> {
    Logger::init(cli.log_level()?)?;
    let config = cli.config();

    collection_prerequisites()?;
    // Register the signal handlers before loading anything, so an early
    // termination still goes through the teardown below.
    let run = Running::new()?;

    let probe = ProbeObject::load(&config, &Hook::xdp_exception())?;
    debug!("Using program {} on {}", probe.program(), probe.hook());

    let table = resolve_table(&probe, STATS_MAP_NAME)?;
    let info = validate_table(&table, &stats_map_expectation())?;
    if config.verbose {
        info!("Collecting stats from BPF map");
        info!(" - {info}");
    }

    Poller::new(&table, &config).run(&run, &mut io::stdout().lock())?;

    drop(table);
    probe.detach();
    Ok(())
}
