use std::{
    cmp,
    io::Write,
    thread,
    time::{Duration, Instant},
};

use anyhow::Result;
use log::warn;

use super::{decode_key, decode_slots, render, sum_slots, Sample};
use crate::{
    cli::StatsConfig,
    core::maps::CounterTable,
    helpers::{cpus::possible_cpus, net::ifindex_to_name, number::Grouping, signals::Running},
};

// Longest uninterrupted sleep, so termination is noticed quickly.
const WAIT_SLICE: Duration = Duration::from_millis(100);

/// Periodically reads a per-CPU stats map and prints per-interface totals.
///
/// Scans are not atomic: the probe keeps updating counters while they are
/// read, so a line is a best effort view of the map.
pub(crate) struct Poller<'a, T: CounterTable> {
    table: &'a T,
    interval: Duration,
    grouping: Grouping,
    possible_cpus: fn() -> Result<usize>,
    ifname: fn(i32) -> Option<String>,
}

impl<'a, T: CounterTable> Poller<'a, T> {
    pub(crate) fn new(table: &'a T, config: &StatsConfig) -> Self {
        Self {
            table,
            interval: config.interval,
            grouping: config.grouping,
            possible_cpus,
            ifname: ifindex_to_name,
        }
    }

    /// Read every entry of the map once. Entries that can't be read are
    /// reported and skipped.
    pub(crate) fn scan(&self) -> Result<Vec<Sample>> {
        // Not cached, the number of possible CPUs is a property of the system.
        let ncpus = (self.possible_cpus)()?;

        let mut samples = Vec::new();
        for key in self.table.keys() {
            let sample = self.table.lookup_percpu(&key).and_then(|raw| {
                Ok(Sample {
                    ifindex: decode_key(&key)?,
                    total: sum_slots(&decode_slots(&key, &raw, ncpus)?),
                })
            });

            match sample {
                Ok(sample) => samples.push(sample),
                Err(e) => warn!("{e}"),
            }
        }

        Ok(samples)
    }

    /// Scan the map and write the result as a single line.
    pub(crate) fn print<W: Write>(&self, out: &mut W) -> Result<()> {
        let samples = self.scan()?;
        writeln!(out, "{}", render(&samples, self.ifname, self.grouping))?;
        out.flush()?;
        Ok(())
    }

    /// Print the map content every interval, until `run` is terminated.
    pub(crate) fn run<W: Write>(&self, run: &Running, out: &mut W) -> Result<()> {
        while run.running() {
            self.print(out)?;
            self.wait(run);
        }
        Ok(())
    }

    fn wait(&self, run: &Running) {
        let deadline = Instant::now() + self.interval;

        while run.running() {
            let left = deadline.saturating_duration_since(Instant::now());
            if left.is_zero() {
                break;
            }
            thread::sleep(cmp::min(left, WAIT_SLICE));
        }
    }
}
