//! # Schema
//!
//! Userspace is responsible for knowing which map it reads and what its
//! values look like. The validator compares the live map metadata against a
//! caller-declared expectation before anything is read out of it.

use std::fmt;

use crate::core::{error::StatsError, maps::TableInfo};

/// Expected shape of a map. A field set to 0 is not checked; it never means
/// "expect 0".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct TableExpectation {
    pub(crate) key_size: u32,
    pub(crate) value_size: u32,
    pub(crate) max_entries: u32,
    /// Raw `bpf_map_type`.
    pub(crate) map_type: u32,
}

/// Checked map properties, in check order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SchemaField {
    KeySize,
    ValueSize,
    MaxEntries,
    Type,
}

impl fmt::Display for SchemaField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use SchemaField::*;
        f.write_str(match self {
            KeySize => "key size",
            ValueSize => "value size",
            MaxEntries => "max_entries",
            Type => "type",
        })
    }
}

impl TableExpectation {
    /// Validate the live metadata. Only the first mismatch is reported.
    pub(crate) fn validate(&self, info: &TableInfo) -> Result<(), StatsError> {
        use SchemaField::*;

        [
            (KeySize, self.key_size, info.key_size),
            (ValueSize, self.value_size, info.value_size),
            (MaxEntries, self.max_entries, info.max_entries),
            (Type, self.map_type, info.map_type),
        ]
        .into_iter()
        .try_for_each(|(field, expected, observed)| {
            if expected != 0 && expected != observed {
                return Err(StatsError::SchemaMismatch {
                    field,
                    expected,
                    observed,
                });
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    fn live() -> TableInfo {
        TableInfo {
            name: "xdp_stats_map".to_string(),
            id: 42,
            map_type: libbpf_sys::BPF_MAP_TYPE_PERCPU_ARRAY,
            key_size: 4,
            value_size: 8,
            max_entries: 5,
        }
    }

    fn mismatch(res: Result<(), StatsError>) -> (SchemaField, u32, u32) {
        match res {
            Err(StatsError::SchemaMismatch {
                field,
                expected,
                observed,
            }) => (field, expected, observed),
            other => panic!("expected a schema mismatch, got {other:?}"),
        }
    }

    #[test]
    fn wildcard_accepts_anything() {
        let exp = TableExpectation::default();

        assert!(exp.validate(&live()).is_ok());
        assert!(exp
            .validate(&TableInfo {
                key_size: 0,
                value_size: 0,
                max_entries: 0,
                map_type: 0,
                ..live()
            })
            .is_ok());
        assert!(exp
            .validate(&TableInfo {
                key_size: u32::MAX,
                value_size: 1,
                max_entries: 1 << 20,
                map_type: libbpf_sys::BPF_MAP_TYPE_HASH,
                ..live()
            })
            .is_ok());
    }

    #[test]
    fn matching_expectation() {
        let exp = TableExpectation {
            key_size: 4,
            value_size: 8,
            ..Default::default()
        };
        assert!(exp.validate(&live()).is_ok());

        let exp = TableExpectation {
            key_size: 4,
            value_size: 8,
            max_entries: 5,
            map_type: libbpf_sys::BPF_MAP_TYPE_PERCPU_ARRAY,
        };
        assert!(exp.validate(&live()).is_ok());
    }

    #[test_case(TableExpectation { key_size: 8, ..Default::default() } => (SchemaField::KeySize, 8, 4))]
    #[test_case(TableExpectation { value_size: 16, ..Default::default() } => (SchemaField::ValueSize, 16, 8))]
    #[test_case(TableExpectation { max_entries: 256, ..Default::default() } => (SchemaField::MaxEntries, 256, 5))]
    #[test_case(TableExpectation { map_type: libbpf_sys::BPF_MAP_TYPE_HASH, ..Default::default() }
                => (SchemaField::Type, libbpf_sys::BPF_MAP_TYPE_HASH, libbpf_sys::BPF_MAP_TYPE_PERCPU_ARRAY))]
    fn single_field_mismatch(exp: TableExpectation) -> (SchemaField, u32, u32) {
        mismatch(exp.validate(&live()))
    }

    #[test]
    fn first_mismatch_wins() {
        let exp = TableExpectation {
            key_size: 2,
            value_size: 2,
            max_entries: 2,
            map_type: 2,
        };
        assert_eq!(mismatch(exp.validate(&live())), (SchemaField::KeySize, 2, 4));

        let exp = TableExpectation {
            key_size: 4,
            max_entries: 7,
            map_type: 2,
            ..Default::default()
        };
        assert_eq!(
            mismatch(exp.validate(&live())),
            (SchemaField::MaxEntries, 7, 5)
        );
    }
}
