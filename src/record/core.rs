/// Fixed-width record model.
///
/// Input files are flat arrays of 100-byte records whose first 10 bytes
/// form the sort key, compared as unsigned bytes in address order. The
/// payload bytes after the key never participate in ordering.
use std::cmp::Ordering;

/// Number of leading key bytes in a record.
pub const KEY_SIZE: usize = 10;

/// Total record width in bytes (key + payload).
pub const RECORD_SIZE: usize = 100;

/// One radix partition per possible byte value.
pub const NUM_BUCKETS: usize = 256;

/// Anything with a fixed-width leading key, sortable by the radix engine.
pub trait Keyed: Copy + Ord + Send + Sync + 'static {
    /// The key bytes. Comparison is unsigned byte-wise over exactly
    /// these bytes — never past them.
    fn key(&self) -> &[u8; KEY_SIZE];

    /// Radix bucket of this record at the given digit position.
    #[inline]
    fn radix_byte(&self, level: usize) -> usize {
        debug_assert!(level < KEY_SIZE);
        self.key()[level] as usize
    }
}

/// A full record: 10-byte key followed by 90 payload bytes.
#[derive(Clone, Copy)]
#[repr(transparent)]
pub struct Record(pub [u8; RECORD_SIZE]);

/// A bare key, used by the driver's threshold sampling phase where
/// loading full records would waste 90% of the buffer.
#[derive(Clone, Copy, Debug)]
#[repr(transparent)]
pub struct Key(pub [u8; KEY_SIZE]);

impl Keyed for Record {
    #[inline]
    fn key(&self) -> &[u8; KEY_SIZE] {
        // RECORD_SIZE >= KEY_SIZE, so the subslice always exists
        self.0[..KEY_SIZE].try_into().unwrap()
    }
}

impl Keyed for Key {
    #[inline]
    fn key(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

impl PartialEq for Record {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Record {}

impl PartialOrd for Record {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Record {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(other.key())
    }
}

impl PartialEq for Key {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Key {}

impl PartialOrd for Key {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Key {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl Record {
    /// Copy out the leading key.
    #[inline]
    pub fn to_key(&self) -> Key {
        let mut k = [0u8; KEY_SIZE];
        k.copy_from_slice(&self.0[..KEY_SIZE]);
        Key(k)
    }
}

impl std::fmt::Debug for Record {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Record").field(&self.to_key().0).finish()
    }
}

/// Reinterpret a byte buffer as records, in place.
/// Panics if the length is not a whole number of records.
#[inline]
pub fn records_from_bytes_mut(bytes: &mut [u8]) -> &mut [Record] {
    assert!(
        bytes.len() % RECORD_SIZE == 0,
        "buffer length {} is not a multiple of the record size {}",
        bytes.len(),
        RECORD_SIZE
    );
    let count = bytes.len() / RECORD_SIZE;
    // SAFETY: Record is repr(transparent) over [u8; RECORD_SIZE] (align 1),
    // and the length check guarantees `count` whole records.
    unsafe { std::slice::from_raw_parts_mut(bytes.as_mut_ptr() as *mut Record, count) }
}

/// Reinterpret a byte buffer as records, read-only.
/// Panics if the length is not a whole number of records.
#[inline]
pub fn records_from_bytes(bytes: &[u8]) -> &[Record] {
    assert!(
        bytes.len() % RECORD_SIZE == 0,
        "buffer length {} is not a multiple of the record size {}",
        bytes.len(),
        RECORD_SIZE
    );
    let count = bytes.len() / RECORD_SIZE;
    // SAFETY: same layout argument as records_from_bytes_mut
    unsafe { std::slice::from_raw_parts(bytes.as_ptr() as *const Record, count) }
}

/// View a record slice as raw bytes for writing back out.
#[inline]
pub fn records_as_bytes(records: &[Record]) -> &[u8] {
    // SAFETY: Record is repr(transparent) over [u8; RECORD_SIZE]
    unsafe {
        std::slice::from_raw_parts(records.as_ptr() as *const u8, records.len() * RECORD_SIZE)
    }
}

/// Partition index for a key against a sorted threshold list.
///
/// `num_partitions` partitions need `num_partitions - 1` thresholds:
/// keys below `thresholds[0]` land in partition 0, keys in
/// `[thresholds[i-1], thresholds[i])` land in partition i, and keys at or
/// above the last threshold land in the final partition. `partition_point`
/// gives the first threshold greater than the key.
#[inline]
pub fn partition_index(key: &Key, thresholds: &[Key]) -> usize {
    thresholds.partition_point(|t| t <= key)
}
