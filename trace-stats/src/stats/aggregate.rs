use std::mem;

use crate::{
    core::error::StatsError,
    helpers::{net::ifindex_display, number::Grouping},
};

/// Total of one interface's counter over all CPUs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Sample {
    pub(crate) ifindex: i32,
    pub(crate) total: u64,
}

/// Sum the per-CPU slots of a counter. The kernel counters wrap around and so
/// does the sum.
pub(crate) fn sum_slots(slots: &[u64]) -> u64 {
    slots.iter().fold(0, |total, v| total.wrapping_add(*v))
}

/// Interface index stored in a raw map key.
pub(crate) fn decode_key(key: &[u8]) -> Result<i32, StatsError> {
    let raw: [u8; mem::size_of::<i32>()] = key
        .try_into()
        .map_err(|_| StatsError::table_read(key, format!("unexpected key size {}", key.len())))?;
    Ok(i32::from_ne_bytes(raw))
}

/// Decode the raw per-CPU slots of `key`. There must be exactly `ncpus` of
/// them, `ncpus` being the number of possible CPUs at the time of the read.
pub(crate) fn decode_slots(
    key: &[u8],
    slots: &[Vec<u8>],
    ncpus: usize,
) -> Result<Vec<u64>, StatsError> {
    if slots.len() != ncpus {
        return Err(StatsError::table_read(
            key,
            format!("got {} per-CPU values, expected {ncpus}", slots.len()),
        ));
    }

    slots
        .iter()
        .map(|slot| {
            slot.get(..mem::size_of::<u64>())
                .and_then(|raw| raw.try_into().ok())
                .map(u64::from_ne_bytes)
                .ok_or_else(|| {
                    StatsError::table_read(key, format!("per-CPU value too short ({})", slot.len()))
                })
        })
        .collect()
}

/// Render a scan as a single line: `<ifname> (<total>)` pairs separated by
/// spaces, in scan order.
pub(crate) fn render<F>(samples: &[Sample], ifname: F, grouping: Grouping) -> String
where
    F: Fn(i32) -> Option<String>,
{
    samples
        .iter()
        .map(|s| {
            format!(
                "{} ({})",
                ifindex_display(s.ifindex, ifname(s.ifindex)),
                grouping.format(s.total)
            )
        })
        .collect::<Vec<_>>()
        .join(" ")
}
