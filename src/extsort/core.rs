/// Disk-based multi-phase driver around the radix engine.
///
/// Inputs too large for the sort buffer go through three phases:
/// 1. sample every record's key, sort the key array, and pick evenly
///    spaced partition thresholds;
/// 2. stream the input again, routing each record into one temporary
///    file per partition;
/// 3. sort each partition in memory (partitions are value-ranged, so
///    appending them in order yields the final output). A partition
///    that still exceeds the buffer is sorted in buffer-size runs and
///    k-way merged.
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::common::io::{file_size, open_noatime, read_file_mmap, read_file_vec, read_full};
use crate::extsort::merge::merge_runs;
use crate::radix;
use crate::record::{KEY_SIZE, Key, RECORD_SIZE, records_from_bytes, records_from_bytes_mut};

/// 4MB output buffer — reduces flush frequency for large files.
const OUTPUT_BUF_SIZE: usize = 4 * 1024 * 1024;

/// 1MB buffer per partition writer during phase 2.
const PARTITION_BUF_SIZE: usize = 1024 * 1024;

/// Upper bound on the derived partition count (open-fd budget).
const MAX_AUTO_PARTITIONS: usize = 512;

/// Default in-memory sort buffer: 1GB.
pub const DEFAULT_BUFFER_SIZE: usize = 1_000_000_000;

#[derive(Debug, Error)]
pub enum ExtsortError {
    #[error("input size {0} is not a multiple of the {RECORD_SIZE}-byte record size")]
    MisalignedInput(u64),
    #[error("buffer size {0} is smaller than one record")]
    BufferTooSmall(usize),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Configuration for one external-sort invocation.
#[derive(Debug, Clone)]
pub struct SortConfig {
    /// Worker threads for the radix engine. None = all available cores.
    pub parallel: Option<usize>,
    /// In-memory sort buffer in bytes.
    pub buffer_size: usize,
    /// Directory for partition and run scratch files. None = $TMPDIR.
    pub temp_dir: Option<PathBuf>,
    /// Explicit partition count; None derives one from the input size.
    pub num_partitions: Option<usize>,
    /// Print phase progress to stderr.
    pub verbose: bool,
}

impl Default for SortConfig {
    fn default() -> Self {
        SortConfig {
            parallel: None,
            buffer_size: DEFAULT_BUFFER_SIZE,
            temp_dir: None,
            num_partitions: None,
            verbose: false,
        }
    }
}

impl SortConfig {
    fn threads(&self) -> usize {
        self.parallel
            .unwrap_or_else(|| {
                std::thread::available_parallelism()
                    .map(|n| n.get())
                    .unwrap_or(1)
            })
            .max(1)
    }

    /// Whole records that fit in the sort buffer.
    fn buffer_records(&self) -> usize {
        self.buffer_size / RECORD_SIZE
    }
}

/// Per-invocation scratch directory, removed on drop. The original
/// implementation used a fixed ./tmp/ it never cleaned up.
struct ScratchDir {
    path: PathBuf,
}

impl ScratchDir {
    fn create(base: Option<&Path>) -> io::Result<Self> {
        let base = match base {
            Some(dir) => dir.to_path_buf(),
            None => std::env::temp_dir(),
        };
        let path = base.join(format!("fxsort-{}", std::process::id()));
        fs::create_dir_all(&path)?;
        Ok(ScratchDir { path })
    }

    fn partition_path(&self, partition: usize) -> PathBuf {
        self.path.join(format!("part_{:04}.data", partition))
    }

    fn run_path(&self, partition: usize, run: usize) -> PathBuf {
        self.path
            .join(format!("part_{:04}.run_{:04}.data", partition, run))
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

/// Sort the record file at `input` into `output`.
///
/// The input must be a whole number of records; an empty input produces
/// an empty output. Inputs no larger than the buffer are sorted in one
/// in-memory pass; larger inputs go through the three-phase pipeline.
pub fn sort_file(input: &Path, output: &Path, config: &SortConfig) -> Result<(), ExtsortError> {
    if config.buffer_size < RECORD_SIZE {
        return Err(ExtsortError::BufferTooSmall(config.buffer_size));
    }

    let size = file_size(input)?;
    if size % RECORD_SIZE as u64 != 0 {
        return Err(ExtsortError::MisalignedInput(size));
    }
    if size == 0 {
        File::create(output)?;
        return Ok(());
    }

    let threads = config.threads();
    let num_records = (size / RECORD_SIZE as u64) as usize;
    if config.verbose {
        eprintln!(
            "fxsort: {} records ({} bytes), {} threads",
            num_records, size, threads
        );
    }

    // In-memory fast path
    if size <= config.buffer_size as u64 {
        let mut bytes = read_file_vec(input)?;
        radix::sort(records_from_bytes_mut(&mut bytes), 0, threads);
        let mut writer = BufWriter::with_capacity(OUTPUT_BUF_SIZE, File::create(output)?);
        writer.write_all(&bytes)?;
        writer.flush()?;
        return Ok(());
    }

    let scratch = ScratchDir::create(config.temp_dir.as_deref())?;
    let num_partitions = config
        .num_partitions
        .unwrap_or_else(|| derive_partitions(size, config.buffer_size))
        .max(1);

    let thresholds = sample_thresholds(input, num_records, num_partitions, threads, config)?;
    if config.verbose {
        eprintln!(
            "fxsort: phase 1 done: {} thresholds for {} partitions",
            thresholds.len(),
            num_partitions
        );
    }

    partition_input(input, &thresholds, num_partitions, &scratch, config)?;
    if config.verbose {
        eprintln!("fxsort: phase 2 done: input partitioned");
    }

    let mut writer = BufWriter::with_capacity(OUTPUT_BUF_SIZE, File::create(output)?);
    for partition in 0..num_partitions {
        sort_partition_into(partition, &scratch, threads, config, &mut writer)?;
    }
    writer.flush()?;
    if config.verbose {
        eprintln!("fxsort: phase 3 done: output written");
    }

    Ok(())
}

/// Aim for partitions of roughly half the sort buffer so each one
/// comfortably fits in memory even with mildly uneven thresholds.
fn derive_partitions(file_size: u64, buffer_size: usize) -> usize {
    let target = (buffer_size / 2).max(RECORD_SIZE) as u64;
    let parts = (file_size + target - 1) / target;
    (parts as usize).clamp(2, MAX_AUTO_PARTITIONS)
}

/// Phase 1: sample keys over the input, sort the key array, pick
/// `num_partitions - 1` evenly spaced thresholds.
///
/// The sample is capped at `buffer_size / KEY_SIZE` keys; past that,
/// every stride-th key is taken instead of every key, so phase 1 stays
/// inside the sort buffer no matter how large the input is. Approximate
/// thresholds only skew partition sizes, which phase 3's run splitting
/// already absorbs.
fn sample_thresholds(
    input: &Path,
    num_records: usize,
    num_partitions: usize,
    threads: usize,
    config: &SortConfig,
) -> Result<Vec<Key>, ExtsortError> {
    if num_partitions <= 1 {
        return Ok(Vec::new());
    }

    let max_keys = (config.buffer_size / KEY_SIZE).max(num_partitions);
    let stride = ((num_records + max_keys - 1) / max_keys).max(1);

    let mut keys: Vec<Key> = Vec::with_capacity(num_records / stride + 1);
    let mut file = open_noatime(input)?;
    let mut buf = vec![0u8; config.buffer_records().max(1) * RECORD_SIZE];
    let mut index = 0usize;

    loop {
        let n = read_full(&mut file, &mut buf)?;
        if n == 0 {
            break;
        }
        // The file length is a record multiple and reads before EOF fill
        // the whole (record-multiple) buffer, so n is always aligned.
        debug_assert!(n % RECORD_SIZE == 0);
        for record in records_from_bytes(&buf[..n]) {
            if index % stride == 0 {
                keys.push(record.to_key());
            }
            index += 1;
        }
        if n < buf.len() {
            break;
        }
    }

    radix::sort(&mut keys, 0, threads);

    let thresholds = (1..num_partitions)
        .map(|i| keys[i * keys.len() / num_partitions])
        .collect();
    Ok(thresholds)
}

/// Phase 2: stream the input and append each record to its partition's
/// scratch file, chosen by threshold lookup.
fn partition_input(
    input: &Path,
    thresholds: &[Key],
    num_partitions: usize,
    scratch: &ScratchDir,
    config: &SortConfig,
) -> Result<(), ExtsortError> {
    let mut writers: Vec<BufWriter<File>> = Vec::with_capacity(num_partitions);
    for partition in 0..num_partitions {
        let file = File::create(scratch.partition_path(partition))?;
        writers.push(BufWriter::with_capacity(PARTITION_BUF_SIZE, file));
    }

    let mut file = open_noatime(input)?;
    let mut buf = vec![0u8; config.buffer_records().max(1) * RECORD_SIZE];

    loop {
        let n = read_full(&mut file, &mut buf)?;
        if n == 0 {
            break;
        }
        debug_assert!(n % RECORD_SIZE == 0);
        for record in records_from_bytes(&buf[..n]) {
            let partition = crate::record::partition_index(&record.to_key(), thresholds);
            writers[partition].write_all(&record.0)?;
        }
        if n < buf.len() {
            break;
        }
    }

    for mut writer in writers {
        writer.flush()?;
    }
    Ok(())
}

/// Phase 3, one partition: sort it in memory and append to the output.
/// Oversized partitions (key skew) are sorted in buffer-size runs which
/// are then heap-merged.
fn sort_partition_into(
    partition: usize,
    scratch: &ScratchDir,
    threads: usize,
    config: &SortConfig,
    writer: &mut BufWriter<File>,
) -> Result<(), ExtsortError> {
    let path = scratch.partition_path(partition);
    let size = file_size(&path)?;
    if size == 0 {
        return Ok(());
    }

    if size <= config.buffer_size as u64 {
        let mut bytes = read_file_vec(&path)?;
        radix::sort(records_from_bytes_mut(&mut bytes), 0, threads);
        writer.write_all(&bytes)?;
        return Ok(());
    }

    if config.verbose {
        eprintln!(
            "fxsort: partition {} exceeds the buffer ({} bytes), splitting into runs",
            partition, size
        );
    }

    let mut run_paths = Vec::new();
    let mut file = open_noatime(&path)?;
    let mut buf = vec![0u8; config.buffer_records().max(1) * RECORD_SIZE];

    loop {
        let n = read_full(&mut file, &mut buf)?;
        if n == 0 {
            break;
        }
        debug_assert!(n % RECORD_SIZE == 0);
        radix::sort(records_from_bytes_mut(&mut buf[..n]), 0, threads);

        let run_path = scratch.run_path(partition, run_paths.len());
        let mut run_writer = BufWriter::with_capacity(PARTITION_BUF_SIZE, File::create(&run_path)?);
        run_writer.write_all(&buf[..n])?;
        run_writer.flush()?;
        run_paths.push(run_path);

        if n < buf.len() {
            break;
        }
    }

    merge_runs(&run_paths, writer)?;
    for run_path in &run_paths {
        let _ = fs::remove_file(run_path);
    }
    Ok(())
}

/// Check that a record file is sorted, diagnosing the first disorder
/// like `sort -c` does. Returns false (after printing the offending
/// record index) when out of order.
pub fn check_sorted_file(path: &Path) -> Result<bool, ExtsortError> {
    let size = file_size(path)?;
    if size % RECORD_SIZE as u64 != 0 {
        return Err(ExtsortError::MisalignedInput(size));
    }

    let data = read_file_mmap(path)?;
    let records = records_from_bytes(&data);
    for i in 1..records.len() {
        if records[i - 1] > records[i] {
            eprintln!(
                "fxsort: {}: disorder: record {} sorts before its predecessor",
                path.display(),
                i
            );
            return Ok(false);
        }
    }
    Ok(true)
}

/// Parse a buffer size string like "10K", "1M", "1G".
pub fn parse_buffer_size(s: &str) -> Result<usize, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty buffer size".to_string());
    }

    let (num_part, suffix) = if s.ends_with(|c: char| c.is_ascii_alphabetic()) {
        let (n, s) = s.split_at(s.len() - 1);
        (n, s.chars().next())
    } else {
        (s, None)
    };

    let base: usize = num_part
        .parse()
        .map_err(|_| format!("invalid buffer size: {}", s))?;

    let multiplier = match suffix {
        Some('K') | Some('k') => 1024,
        Some('M') | Some('m') => 1024 * 1024,
        Some('G') | Some('g') => 1024 * 1024 * 1024,
        Some('T') | Some('t') => 1024usize.pow(4),
        Some('b') => 512,
        Some(c) => return Err(format!("invalid suffix '{}' in buffer size", c)),
        None => 1,
    };

    Ok(base * multiplier)
}
