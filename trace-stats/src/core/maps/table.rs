//! # Table
//!
//! `CounterTable` is the reader-side view of a BPF map: metadata, the raw
//! "next key" primitive and per-CPU value reads. `KernelTable` implements it
//! on top of a map owned by a loaded [`ProbeObject`].

use std::{
    ffi::c_void,
    fmt, io,
    iter::FusedIterator,
    os::fd::{AsFd, AsRawFd},
    ptr,
};

use libbpf_rs::{MapCore, MapFlags};
use log::warn;

use crate::core::{error::StatsError, probe::ProbeObject};

/// Metadata of a live map, as reported by the kernel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct TableInfo {
    pub(crate) name: String,
    pub(crate) id: u32,
    /// Raw `bpf_map_type`.
    pub(crate) map_type: u32,
    pub(crate) key_size: u32,
    pub(crate) value_size: u32,
    pub(crate) max_entries: u32,
}

impl fmt::Display for TableInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "BPF map (bpf_map_type:{} {:?}) id:{} name:{} key_size:{} value_size:{} max_entries:{}",
            self.map_type,
            libbpf_rs::MapType::from(self.map_type),
            self.id,
            self.name,
            self.key_size,
            self.value_size,
            self.max_entries,
        )
    }
}

/// Read access to a per-CPU map.
pub(crate) trait CounterTable {
    /// Name of the map in the object it comes from.
    fn name(&self) -> String;
    /// Query the map metadata from the kernel.
    fn info(&self) -> Result<TableInfo, StatsError>;
    /// Return the key following `prev` (or the first key if `None`), or
    /// `None` once all keys were returned.
    fn next_key(&self, prev: Option<&[u8]>) -> Result<Option<Vec<u8>>, StatsError>;
    /// Read the value of `key` on every possible CPU. One raw slot per CPU is
    /// returned.
    fn lookup_percpu(&self, key: &[u8]) -> Result<Vec<Vec<u8>>, StatsError>;

    /// Walk the keys currently in the map. See [`Keys`].
    fn keys(&self) -> Keys<'_, Self>
    where
        Self: Sized,
    {
        Keys {
            table: self,
            prev: None,
            done: false,
        }
    }
}

/// Single pass over the keys of a map, driven by the "next key" primitive.
///
/// No ordering is guaranteed and the sequence can't be restarted. The probe
/// keeps writing to the map while we iterate, so keys added or removed
/// concurrently may or may not show up. An iteration error is logged and
/// ends the sequence.
pub(crate) struct Keys<'a, T: CounterTable> {
    table: &'a T,
    prev: Option<Vec<u8>>,
    done: bool,
}

impl<T: CounterTable> Iterator for Keys<'_, T> {
    type Item = Vec<u8>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.table.next_key(self.prev.as_deref()) {
            Ok(Some(key)) => {
                // Always move forward from the last returned key, whatever
                // happens to its value afterwards.
                self.prev = Some(key.clone());
                Some(key)
            }
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                warn!("Could not get next key of map {}: {e}", self.table.name());
                self.done = true;
                None
            }
        }
    }
}

impl<T: CounterTable> FusedIterator for Keys<'_, T> {}

/// Map living in a loaded probe object. It can't outlive the object.
pub(crate) struct KernelTable<'obj> {
    map: libbpf_rs::Map<'obj>,
}

impl<'obj> From<libbpf_rs::Map<'obj>> for KernelTable<'obj> {
    fn from(map: libbpf_rs::Map<'obj>) -> Self {
        Self { map }
    }
}

impl CounterTable for KernelTable<'_> {
    fn name(&self) -> String {
        self.map.name().to_string_lossy().into_owned()
    }

    fn info(&self) -> Result<TableInfo, StatsError> {
        let info = self.map.info().map_err(|source| StatsError::TableInfo {
            name: self.name(),
            source,
        })?;

        Ok(TableInfo {
            name: info
                .name()
                .map(str::to_string)
                .unwrap_or_else(|_| self.name()),
            id: info.info.id,
            map_type: info.info.type_,
            key_size: info.info.key_size,
            value_size: info.info.value_size,
            max_entries: info.info.max_entries,
        })
    }

    fn next_key(&self, prev: Option<&[u8]>) -> Result<Option<Vec<u8>>, StatsError> {
        let mut next = vec![0u8; self.map.key_size() as usize];

        let prev_ptr = match prev {
            Some(prev) if prev.len() != next.len() => {
                return Err(StatsError::table_read(
                    prev,
                    format!("key is {} bytes, map expects {}", prev.len(), next.len()),
                ))
            }
            Some(prev) => prev.as_ptr() as *const c_void,
            None => ptr::null(),
        };

        // Both buffers are key_size long, as checked above.
        let ret = unsafe {
            libbpf_sys::bpf_map_get_next_key(
                self.map.as_fd().as_raw_fd(),
                prev_ptr,
                next.as_mut_ptr() as *mut c_void,
            )
        };

        match -ret {
            0 => Ok(Some(next)),
            libc::ENOENT => Ok(None),
            errno => Err(StatsError::table_read(
                prev.unwrap_or_default(),
                io::Error::from_raw_os_error(errno),
            )),
        }
    }

    fn lookup_percpu(&self, key: &[u8]) -> Result<Vec<Vec<u8>>, StatsError> {
        self.map
            .lookup_percpu(key, MapFlags::ANY)
            .map_err(|e| StatsError::table_read(key, e))?
            .ok_or_else(|| StatsError::table_read(key, "no such entry"))
    }
}

/// Find a table by name in a set of tables.
pub(crate) fn find_table<T, I>(tables: I, name: &str) -> Result<T, StatsError>
where
    T: CounterTable,
    I: IntoIterator<Item = T>,
{
    tables
        .into_iter()
        .find(|t| t.name() == name)
        .ok_or_else(|| StatsError::TableNotFound {
            name: name.to_string(),
        })
}

/// Get a handle to the map named `name` inside a loaded probe object. Nothing
/// is created nor modified kernel side.
pub(crate) fn resolve_table<'obj>(
    probe: &'obj ProbeObject,
    name: &str,
) -> Result<KernelTable<'obj>, StatsError> {
    find_table(probe.object().maps().map(KernelTable::from), name)
}


#[cfg(test)]
mod tests {
    use super::{testing::FakeTable, *};

    fn ifindexes<T: CounterTable>(table: &T) -> Vec<i32> {
        table
            .keys()
            .map(|k| i32::from_ne_bytes(k.try_into().unwrap()))
            .collect()
    }

    #[test]
    fn keys_walk_whole_table() {
        let table = FakeTable::new("xdp_stats_map")
            .with_entry(3, &[1, 2])
            .with_entry(1, &[3, 4])
            .with_entry(7, &[0, 0]);

        // Whatever order the map gives us, untouched.
        assert_eq!(ifindexes(&table), vec![3, 1, 7]);
    }

    #[test]
    fn keys_empty_table() {
        let table = FakeTable::new("xdp_stats_map");
        assert!(table.keys().next().is_none());
    }

    #[test]
    fn keys_move_past_failing_entries() {
        let table = FakeTable::new("xdp_stats_map")
            .with_failing_entry(1)
            .with_entry(2, &[1]);

        let mut keys = table.keys();
        let first = keys.next().unwrap();
        assert!(table.lookup_percpu(&first).is_err());
        assert_eq!(keys.next(), Some(2i32.to_ne_bytes().to_vec()));
        assert_eq!(keys.next(), None);
        // Fused.
        assert_eq!(keys.next(), None);
    }

    struct BrokenTable;

    impl CounterTable for BrokenTable {
        fn name(&self) -> String {
            "broken".to_string()
        }

        fn info(&self) -> Result<TableInfo, StatsError> {
            unimplemented!()
        }

        fn next_key(&self, prev: Option<&[u8]>) -> Result<Option<Vec<u8>>, StatsError> {
            match prev {
                None => Ok(Some(vec![1, 0, 0, 0])),
                Some(prev) => Err(StatsError::table_read(prev, "EPERM")),
            }
        }

        fn lookup_percpu(&self, _: &[u8]) -> Result<Vec<Vec<u8>>, StatsError> {
            unimplemented!()
        }
    }

    #[test]
    fn keys_stop_on_error() {
        assert_eq!(BrokenTable.keys().count(), 1);
    }

    #[test]
    fn find_table_by_name() {
        let tables = vec![
            FakeTable::new("events"),
            FakeTable::new("xdp_stats_map"),
        ];

        assert_eq!(
            find_table(tables, "xdp_stats_map").unwrap().name,
            "xdp_stats_map"
        );
    }

    #[test]
    fn find_missing_table() {
        let tables = vec![FakeTable::new("events")];

        match find_table(tables, "xdp_stats_map") {
            Err(StatsError::TableNotFound { name }) => assert_eq!(name, "xdp_stats_map"),
            _ => panic!("table should not be found"),
        }
        assert!(matches!(
            find_table(Vec::<FakeTable>::new(), "xdp_stats_map"),
            Err(StatsError::TableNotFound { .. })
        ));
    }

    #[test]
    fn table_info_display() {
        let info = FakeTable::new("xdp_stats_map").info().unwrap();
        assert_eq!(
            info.to_string(),
            "BPF map (bpf_map_type:5 PercpuHash) id:1 name:xdp_stats_map key_size:4 value_size:8 max_entries:32"
        );
    }
}
