/// K-way merge of sorted record runs.
///
/// Used when a partition file is still bigger than the sort buffer
/// (key skew): the driver sorts it in buffer-size runs and this module
/// merges the runs with a BinaryHeap min-heap in O(n log k).
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::Path;

use crate::common::io::read_full;
use crate::record::{RECORD_SIZE, Record};

/// 1MB per-run read buffer.
const RUN_BUF_SIZE: usize = 1024 * 1024;

/// Buffered reader yielding whole records from one run file.
pub struct RunReader {
    reader: BufReader<File>,
}

impl RunReader {
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = File::open(path)?;
        Ok(RunReader {
            reader: BufReader::with_capacity(RUN_BUF_SIZE, file),
        })
    }

    /// Next record, or None at end of run. A trailing partial record
    /// means the run writer was interrupted and is reported as an error.
    pub fn next_record(&mut self) -> io::Result<Option<Record>> {
        let mut buf = [0u8; RECORD_SIZE];
        let n = read_full(&mut self.reader, &mut buf)?;
        match n {
            0 => Ok(None),
            RECORD_SIZE => Ok(Some(Record(buf))),
            _ => Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("run file ends with a partial record ({} bytes)", n),
            )),
        }
    }
}

/// Entry in the merge heap. BinaryHeap is a max-heap, so callers wrap
/// entries in `Reverse` to pop the smallest key first. Ties break on
/// run index to keep the merge deterministic.
struct MergeEntry {
    record: Record,
    run: usize,
}

impl PartialEq for MergeEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for MergeEntry {}

impl PartialOrd for MergeEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MergeEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.record
            .cmp(&other.record)
            .then_with(|| self.run.cmp(&other.run))
    }
}

/// Merge sorted run files into `writer` in ascending key order.
pub fn merge_runs(paths: &[impl AsRef<Path>], writer: &mut impl Write) -> io::Result<()> {
    let mut readers = Vec::with_capacity(paths.len());
    for path in paths {
        readers.push(RunReader::open(path.as_ref())?);
    }

    let mut heap: BinaryHeap<Reverse<MergeEntry>> = BinaryHeap::with_capacity(readers.len());
    for (run, reader) in readers.iter_mut().enumerate() {
        if let Some(record) = reader.next_record()? {
            heap.push(Reverse(MergeEntry { record, run }));
        }
    }

    while let Some(Reverse(min)) = heap.pop() {
        writer.write_all(&min.record.0)?;
        if let Some(record) = readers[min.run].next_record()? {
            heap.push(Reverse(MergeEntry {
                record,
                run: min.run,
            }));
        }
    }

    Ok(())
}
