//! # Memory Storage Adapter
//!
//! In-memory slot storage backed by a HashMap.
//! Fast, but volatile (data lost on shutdown).
//!
//! Good for:
//! - Testing
//! - Small payloads (thumbnails, coordinates)
//! - Caches that are snapshotted externally

use std::collections::HashMap;

use crate::core::Blob;
use crate::ports::SlotStore;

#[derive(Debug, Clone, Default)]
struct SlotRecord {
    payload: Option<Blob>,
    meta: Option<Vec<f32>>,
}

/// In-memory slot storage adapter
#[derive(Debug, Default)]
pub struct MemoryStorage {
    /// Records keyed by slot index
    records: HashMap<usize, SlotRecord>,

    /// Current size in bytes
    current_size: usize,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Calculate size of a record in bytes
    fn record_size(record: &SlotRecord) -> usize {
        // Slot key: 8 bytes
        // Payload: data.len() bytes
        // Meta: len * 4 bytes (f32)
        // Overhead: ~48 bytes for struct padding and HashMap entry
        8 + record.payload.as_ref().map_or(0, Blob::size)
            + record.meta.as_ref().map_or(0, |m| m.len() * 4)
            + 48
    }
}

impl SlotStore for MemoryStorage {
    fn put(&mut self, slot: usize, payload: Option<Blob>, meta: Option<Vec<f32>>) {
        self.take(slot);

        if payload.is_none() && meta.is_none() {
            return;
        }

        let record = SlotRecord { payload, meta };
        self.current_size += Self::record_size(&record);
        self.records.insert(slot, record);
    }

    fn payload(&self, slot: usize) -> Option<&Blob> {
        self.records.get(&slot).and_then(|r| r.payload.as_ref())
    }

    fn meta(&self, slot: usize) -> Option<&[f32]> {
        self.records.get(&slot).and_then(|r| r.meta.as_deref())
    }

    fn take(&mut self, slot: usize) -> (Option<Blob>, Option<Vec<f32>>) {
        match self.records.remove(&slot) {
            Some(record) => {
                self.current_size -= Self::record_size(&record);
                (record.payload, record.meta)
            }
            None => (None, None),
        }
    }

    fn len(&self) -> usize {
        self.records.len()
    }

    fn size_bytes(&self) -> usize {
        self.current_size
    }

    fn clear(&mut self) {
        self.records.clear();
        self.current_size = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_storage_put_and_get() {
        let mut storage = MemoryStorage::new();

        storage.put(3, Some(Blob::from_str("hello")), Some(vec![0.5, 1.5]));

        assert_eq!(storage.len(), 1);
        assert_eq!(storage.payload(3).and_then(Blob::as_str), Some("hello"));
        assert_eq!(storage.meta(3), Some(&[0.5, 1.5][..]));
        assert!(storage.payload(0).is_none());
    }

    #[test]
    fn test_memory_storage_put_replaces() {
        let mut storage = MemoryStorage::new();

        storage.put(1, Some(Blob::new(vec![0u8; 100])), None);
        let big = storage.size_bytes();

        storage.put(1, Some(Blob::new(vec![0u8; 10])), None);

        assert_eq!(storage.len(), 1);
        assert_eq!(storage.size_bytes(), big - 90);
    }

    #[test]
    fn test_memory_storage_put_nothing_frees_slot() {
        let mut storage = MemoryStorage::new();

        storage.put(0, Some(Blob::from_str("x")), None);
        storage.put(0, None, None);

        assert!(storage.is_empty());
        assert_eq!(storage.size_bytes(), 0);
    }

    #[test]
    fn test_memory_storage_take() {
        let mut storage = MemoryStorage::new();

        storage.put(2, Some(Blob::from_str("img")), Some(vec![1.0]));

        let (payload, meta) = storage.take(2);
        assert_eq!(payload, Some(Blob::from_str("img")));
        assert_eq!(meta, Some(vec![1.0]));
        assert!(storage.is_empty());
        assert_eq!(storage.size_bytes(), 0);

        assert_eq!(storage.take(2), (None, None));
    }

    #[test]
    fn test_memory_storage_clear() {
        let mut storage = MemoryStorage::new();

        for i in 0..10 {
            storage.put(i, Some(Blob::empty()), Some(vec![i as f32]));
        }

        assert_eq!(storage.len(), 10);
        assert!(storage.size_bytes() > 0);

        storage.clear();

        assert_eq!(storage.len(), 0);
        assert_eq!(storage.size_bytes(), 0);
    }
}
