use std::fs;

use anyhow::{anyhow, bail, Context, Result};

const POSSIBLE_CPUS: &str = "/sys/devices/system/cpu/possible";

/// Number of possible CPUs, which is the number of slots of a per-CPU map
/// value. Read from sysfs on every call.
pub(crate) fn possible_cpus() -> Result<usize> {
    let list = fs::read_to_string(POSSIBLE_CPUS)
        .with_context(|| format!("Could not read {POSSIBLE_CPUS}"))?;
    parse_cpu_list(&list)
}

/// Count the CPUs in a kernel cpu list (e.g. "0-3,6,8-9").
pub(crate) fn parse_cpu_list(list: &str) -> Result<usize> {
    let list = list.trim();
    if list.is_empty() {
        bail!("Empty CPU list");
    }

    list.split(',').try_fold(0, |count, range| {
        let parse = |s: &str| {
            s.trim()
                .parse::<usize>()
                .map_err(|e| anyhow!("Invalid CPU number '{s}' in list '{list}': {e}"))
        };

        let len = match range.split_once('-') {
            Some((start, end)) => {
                let (start, end) = (parse(start)?, parse(end)?);
                if end < start {
                    bail!("Invalid CPU range '{range}' in list '{list}'");
                }
                end - start + 1
            }
            None => {
                parse(range)?;
                1
            }
        };

        Ok(count + len)
    })
}
