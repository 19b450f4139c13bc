//! Line-aligned corpus partitioning.
//!
//! Splits a training file into per-thread byte ranges that always begin
//! and end on line boundaries, so N workers can seek to their own offset
//! and read disjoint, complete lines with no coordination. Offsets are
//! computed once before training and are read-only afterwards.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{Context, Result};

use crate::read_word;

/// Index of a language in the registry's language vector.
pub type LangId = usize;

/// `N + 1` byte offsets delimiting `N` line-aligned blocks:
/// `offsets[0] == 0`, `offsets[N] == file size`, and every offset lands
/// immediately after a newline (or at 0 / end of file). Blocks hold
/// `ceil(lines / N)` lines; if the file has fewer lines than blocks, the
/// trailing offsets repeat end of file and those blocks are empty.
pub fn compute_block_offsets(path: &Path, num_blocks: usize) -> Result<(Vec<u64>, u64)> {
    let open = || {
        File::open(path).with_context(|| format!("error opening training file {}", path.display()))
    };

    // First pass: count lines.
    let mut reader = BufReader::new(open()?);
    let mut num_lines: u64 = 0;
    let mut line = Vec::new();
    let mut file_size: u64 = 0;
    loop {
        line.clear();
        let n = reader
            .read_until(b'\n', &mut line)
            .with_context(|| format!("error reading {}", path.display()))?;
        if n == 0 {
            break;
        }
        file_size += n as u64;
        num_lines += 1;
    }

    if num_lines == 0 {
        return Ok((vec![0; num_blocks + 1], 0));
    }

    // Second pass: record the offset after every block of lines.
    let block_size = (num_lines - 1) / num_blocks as u64 + 1;
    let mut offsets = Vec::with_capacity(num_blocks + 1);
    offsets.push(0u64);

    let mut reader = BufReader::new(open()?);
    let mut pos: u64 = 0;
    let mut lines_in_block: u64 = 0;
    let mut line_count: u64 = 0;
    loop {
        line.clear();
        let n = reader
            .read_until(b'\n', &mut line)
            .with_context(|| format!("error reading {}", path.display()))?;
        if n == 0 {
            break;
        }
        pos += n as u64;
        lines_in_block += 1;
        line_count += 1;
        if lines_in_block == block_size || line_count == num_lines {
            offsets.push(pos);
            lines_in_block = 0;
            if line_count == num_lines {
                break;
            }
        }
    }
    while offsets.len() < num_blocks + 1 {
        offsets.push(file_size);
    }

    debug_assert_eq!(offsets.len(), num_blocks + 1);
    debug_assert_eq!(*offsets.last().unwrap(), file_size);
    Ok((offsets, num_lines))
}

/// Counts whitespace-delimited tokens (newlines count as the sentence
/// sentinel, matching vocabulary learning).
pub fn count_words(path: &Path) -> Result<u64> {
    let mut reader = BufReader::new(
        File::open(path).with_context(|| format!("error opening training file {}", path.display()))?,
    );
    let mut train_words = 0;
    while read_word(&mut reader)
        .with_context(|| format!("error reading {}", path.display()))?
        .is_some()
    {
        train_words += 1;
    }
    Ok(train_words)
}

/// One physical corpus file bound to one language, with the metadata the
/// training engine needs: token total, per-thread block offsets, and the
/// shared progress counter all threads fold into.
pub struct TrainingFile {
    pub path: PathBuf,
    pub lang: LangId,
    pub num_lines: u64,
    pub train_words: u64,
    pub blocks: Vec<u64>,
    /// Total words processed this pass, updated by every worker thread
    /// with relaxed ordering; an approximation, not an exact tally at any
    /// instant.
    pub word_count_actual: AtomicU64,
}

impl TrainingFile {
    pub fn open(path: PathBuf, lang: LangId, num_blocks: usize) -> Result<Self> {
        let train_words = count_words(&path)?;
        let (blocks, num_lines) = compute_block_offsets(&path, num_blocks)?;
        Ok(TrainingFile {
            path,
            lang,
            num_lines,
            train_words,
            blocks,
            word_count_actual: AtomicU64::new(0),
        })
    }

    pub fn reset_progress(&self) {
        self.word_count_actual.store(0, Ordering::Relaxed);
    }

    pub fn progress(&self) -> u64 {
        self.word_count_actual.load(Ordering::Relaxed)
    }

    pub fn add_progress(&self, n: u64) -> u64 {
        self.word_count_actual.fetch_add(n, Ordering::Relaxed) + n
    }
}
