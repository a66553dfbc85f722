//! # Maps
//!
//! Access to the maps exposed by a loaded probe object: lookup by name, shape
//! validation and raw per-CPU reads.

// Re-export table.rs
#[allow(clippy::module_inception)]
pub(crate) mod table;
pub(crate) use table::*;

pub(crate) mod schema;
pub(crate) use schema::*;

use crate::core::error::StatsError;

/// Query the live metadata of a table and check it against an expectation.
/// The metadata is returned for reporting purposes.
pub(crate) fn validate_table<T: CounterTable>(
    table: &T,
    expect: &TableExpectation,
) -> Result<TableInfo, StatsError> {
    let info = table.info()?;
    expect.validate(&info)?;
    Ok(info)
}
