//! # Errors
//!
//! Failures of the probe pipeline. Everything happening before polling starts
//! is fatal and carries an exit status for the host process; `TableRead` is
//! the only kind the poller recovers from.

use std::{fmt, path::PathBuf, process::ExitCode};

use crate::core::maps::SchemaField;

/// Exit statuses returned to the host process.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub(crate) enum ExitStatus {
    Ok = 0,
    Fail = 1,
    FailOption = 2,
    /// Kernel object or table subsystem failure.
    FailBpf = 40,
}

impl From<ExitStatus> for ExitCode {
    fn from(status: ExitStatus) -> Self {
        ExitCode::from(status as u8)
    }
}

#[derive(thiserror::Error, Debug)]
pub(crate) enum StatsError {
    #[error("could not open BPF object file '{}': {source}", .path.display())]
    LoadOpen {
        path: PathBuf,
        #[source]
        source: libbpf_rs::Error,
    },
    #[error("loading BPF object file '{}' failed: {source}", .path.display())]
    VerifierReject {
        path: PathBuf,
        #[source]
        source: libbpf_rs::Error,
    },
    #[error("no program found in BPF object file '{}'", .path.display())]
    ProgramNotFound { path: PathBuf },
    #[error("could not attach program '{program}' to tracepoint {hook}: {source}")]
    Attach {
        program: String,
        hook: String,
        #[source]
        source: libbpf_rs::Error,
    },
    #[error("cannot find map by name: {name}")]
    TableNotFound { name: String },
    #[error("can't get info of map '{name}': {source}")]
    TableInfo {
        name: String,
        #[source]
        source: libbpf_rs::Error,
    },
    #[error("map {field} ({observed}) mismatch expected {field} ({expected})")]
    SchemaMismatch {
        field: SchemaField,
        expected: u32,
        observed: u32,
    },
    #[error("lookup failed for key {key}: {reason}")]
    TableRead { key: KeyDisplay, reason: String },
}

impl StatsError {
    /// Exit status of a fatal error. `TableRead` never terminates the process
    /// on its own but maps to the table subsystem category if it escapes.
    pub(crate) fn exit_status(&self) -> ExitStatus {
        use StatsError::*;
        match self {
            SchemaMismatch { .. } => ExitStatus::Fail,
            LoadOpen { .. }
            | VerifierReject { .. }
            | ProgramNotFound { .. }
            | Attach { .. }
            | TableNotFound { .. }
            | TableInfo { .. }
            | TableRead { .. } => ExitStatus::FailBpf,
        }
    }

    pub(crate) fn table_read<R: fmt::Display>(key: &[u8], reason: R) -> Self {
        StatsError::TableRead {
            key: KeyDisplay(key.to_vec()),
            reason: reason.to_string(),
        }
    }
}

/// Raw map key, printed as hex in native byte order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct KeyDisplay(pub(crate) Vec<u8>);

impl fmt::Display for KeyDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match <[u8; 4]>::try_from(self.0.as_slice()) {
            Ok(raw) => write!(f, "{:#x}", i32::from_ne_bytes(raw)),
            Err(_) => {
                write!(f, "0x")?;
                self.0.iter().try_for_each(|b| write!(f, "{b:02x}"))
            }
        }
    }
}

/// Exit status to report for an error bubbling up to `main`.
pub(crate) fn exit_status_of(err: &anyhow::Error) -> ExitStatus {
    match err.downcast_ref::<StatsError>() {
        Some(e) => e.exit_status(),
        None => ExitStatus::Fail,
    }
}
