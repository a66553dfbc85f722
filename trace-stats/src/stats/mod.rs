//! # Stats
//!
//! Reduction of the per-CPU XDP exception counters into per-interface totals
//! and the polling loop printing them.

pub(crate) mod aggregate;
pub(crate) use aggregate::*;

pub(crate) mod poller;
pub(crate) use poller::*;

use std::mem;

use crate::core::maps::TableExpectation;

/// Map filled by the probe, keyed by interface index.
pub(crate) const STATS_MAP_NAME: &str = "xdp_stats_map";

/// Shape of the stats map: a signed 32-bit interface index as key and a
/// 64-bit counter per CPU as value. Size and type are not checked.
pub(crate) fn stats_map_expectation() -> TableExpectation {
    TableExpectation {
        key_size: mem::size_of::<i32>() as u32,
        value_size: mem::size_of::<u64>() as u32,
        ..Default::default()
    }
}
