use std::{fs, os::unix::fs::MetadataExt};

use anyhow::Result;
use caps::{CapSet, Capability};
use log::{debug, warn};
use nix::unistd::Uid;

/// Look for conditions under which loading or attaching the probe is known to
/// fail. Nothing here is fatal: the kernel has the final word and the load
/// step reports the precise error.
pub(crate) fn collection_prerequisites() -> Result<()> {
    // In an unprivileged userns having the capabilities is not enough, some
    // bpf(2) calls need system-wide ones.
    if fs::metadata("/proc")?.uid() != 0 {
        warn!("Likely running in an unprivileged user namespace, loading BPF objects might fail with -EPERM");
    }

    let has = |cap| caps::has_cap(None, CapSet::Effective, cap);

    // CAP_SYS_ADMIN covers both loading and attaching on all kernels.
    if has(Capability::CAP_SYS_ADMIN)? {
        debug!("Running with CAP_SYS_ADMIN (euid {})", Uid::effective());
        return Ok(());
    }

    if !has(Capability::CAP_BPF)? {
        warn!("Missing CAP_BPF: the BPF object can't be loaded");
    }
    // Attaching to tracepoints goes through perf events.
    if !has(Capability::CAP_PERFMON)? {
        warn!("Missing CAP_PERFMON: the program can't be attached to a tracepoint");
    }

    Ok(())
}
