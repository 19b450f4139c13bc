//! Vocabulary construction.
//!
//! A vocabulary is a frequency-ordered array of words plus an
//! open-addressing hash table mapping words to array ids. The table uses
//! a polynomial hash (multiplier 257) with linear probing, exactly like
//! word2vec: the slot holds an id, the array holds the word, and the two
//! are related only through that indirection. While a corpus is being
//! scanned the vocabulary is periodically reduced (infrequent words
//! dropped at a rising threshold) to bound memory; once input is
//! exhausted it is finalized and ids are frozen.

use std::cmp::Reverse;
use std::io::{BufRead, Write};

use anyhow::{bail, Context, Result};
use indicatif::ProgressBar;
use serde::{Deserialize, Serialize};

use crate::{read_word, EOS};

/// Reserve hint for Huffman code construction. Codes are growable, so this
/// is not a correctness bound; trees deeper than 40 still encode properly.
pub const MAX_CODE_LENGTH: usize = 40;

const EMPTY: i32 = -1;

#[derive(Clone, Serialize, Deserialize)]
pub struct VocabWord {
    pub word: String,
    pub count: u64,
    /// Huffman code bits, root to leaf. Empty unless hierarchical softmax
    /// is in use.
    pub code: Vec<u8>,
    /// Internal tree-node indices traversed root to leaf, paired with
    /// `code` entry by entry.
    pub point: Vec<u32>,
}

impl VocabWord {
    fn new(word: String, count: u64) -> Self {
        VocabWord {
            word,
            count,
            code: Vec::new(),
            point: Vec::new(),
        }
    }
}

pub struct Vocabulary {
    words: Vec<VocabWord>,
    /// hash slot -> word id, or EMPTY.
    slots: Vec<i32>,
    min_reduce: u64,
    /// Total retained token count, valid after `finalize`.
    train_words: u64,
}

impl Vocabulary {
    /// An empty vocabulary holding only the `</s>` sentinel at id 0.
    pub fn new(hash_size: usize) -> Self {
        let mut vocab = Vocabulary {
            words: Vec::with_capacity(1000),
            slots: vec![EMPTY; hash_size],
            min_reduce: 1,
            train_words: 0,
        };
        vocab.add_word(EOS.to_string(), 0);
        vocab
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn word(&self, id: usize) -> &VocabWord {
        &self.words[id]
    }

    pub fn words(&self) -> &[VocabWord] {
        &self.words
    }

    pub(crate) fn words_mut(&mut self) -> &mut [VocabWord] {
        &mut self.words
    }

    /// Total count of retained tokens; meaningful after `finalize`.
    pub fn train_words(&self) -> u64 {
        self.train_words
    }

    fn hash(&self, word: &str) -> usize {
        let mut hash: u64 = 0;
        for &b in word.as_bytes() {
            hash = hash.wrapping_mul(257).wrapping_add(b as u64);
        }
        hash as usize % self.slots.len()
    }

    /// Returns the id of a word, or `None` if it is not in the vocabulary.
    /// Absence is an expected outcome, not an error.
    pub fn lookup(&self, word: &str) -> Option<usize> {
        let mut slot = self.hash(word);
        loop {
            let id = self.slots[slot];
            if id == EMPTY {
                return None;
            }
            if self.words[id as usize].word == word {
                return Some(id as usize);
            }
            slot = (slot + 1) % self.slots.len();
        }
    }

    fn add_word(&mut self, word: String, count: u64) -> usize {
        let id = self.words.len();
        let mut slot = self.hash(&word);
        while self.slots[slot] != EMPTY {
            slot = (slot + 1) % self.slots.len();
        }
        self.slots[slot] = id as i32;
        self.words.push(VocabWord::new(word, count));
        id
    }

    /// Counts one occurrence of `word`, inserting it if new. Reduces the
    /// vocabulary whenever it grows past 70% of the table capacity.
    pub fn insert_or_increment(&mut self, word: &str) {
        match self.lookup(word) {
            Some(id) => self.words[id].count += 1,
            None => {
                self.add_word(word.to_string(), 1);
                if self.words.len() as f64 > self.slots.len() as f64 * 0.7 {
                    self.reduce();
                }
            }
        }
    }

    fn rebuild_slots(&mut self) {
        self.slots.fill(EMPTY);
        for id in 0..self.words.len() {
            let mut slot = self.hash(&self.words[id].word);
            while self.slots[slot] != EMPTY {
                slot = (slot + 1) % self.slots.len();
            }
            self.slots[slot] = id as i32;
        }
    }

    /// Drops every word (except the sentinel) whose count is at or below
    /// the current reduce threshold, then raises the threshold. Called
    /// repeatedly during a streaming scan, each call prunes harder.
    pub fn reduce(&mut self) {
        let min_reduce = self.min_reduce;
        let mut i = 0;
        self.words.retain(|vw| {
            let keep = i == 0 || vw.count > min_reduce;
            i += 1;
            keep
        });
        self.rebuild_slots();
        self.min_reduce += 1;
    }

    /// Sorts by descending count (sentinel stays at id 0), drops words
    /// below `min_count`, rebuilds the hash table and recomputes the
    /// retained token total. Ids are stable afterwards; calling this again
    /// with no intervening insertions is a no-op.
    pub fn finalize(&mut self, min_count: u64) {
        self.words[1..].sort_by_key(|vw| Reverse(vw.count));

        let mut i = 0;
        self.words.retain(|vw| {
            let keep = i == 0 || vw.count >= min_count;
            i += 1;
            keep
        });
        self.rebuild_slots();

        self.train_words = self.words.iter().map(|vw| vw.count).sum();
        for vw in &mut self.words {
            vw.code.reserve(MAX_CODE_LENGTH);
            vw.point.reserve(MAX_CODE_LENGTH);
        }
    }

    /// Scans whitespace-delimited tokens from `fin`, counting every one
    /// (newlines count the sentinel). Returns the number of tokens read.
    pub fn learn_from_reader(
        &mut self,
        fin: &mut impl BufRead,
        progress: Option<&ProgressBar>,
    ) -> Result<u64> {
        let mut words_read: u64 = 0;
        while let Some(word) = read_word(fin).context("error reading training data")? {
            words_read += 1;
            if words_read % 100_000 == 0 {
                if let Some(pb) = progress {
                    pb.set_message(format!("{}K words", words_read / 1000));
                    pb.tick();
                }
            }
            self.insert_or_increment(&word);
        }
        Ok(words_read)
    }

    /// Writes `word count` lines in vocabulary order.
    pub fn save(&self, fo: &mut impl Write) -> Result<()> {
        for vw in &self.words {
            writeln!(fo, "{} {}", vw.word, vw.count).context("error writing vocab file")?;
        }
        Ok(())
    }

    /// Rebuilds a vocabulary from `word count` lines. The result carries
    /// the same `(word, count)` semantics as a freshly learned vocabulary
    /// and must be finalized the same way.
    pub fn from_reader(fin: &mut impl BufRead, hash_size: usize) -> Result<Self> {
        let mut vocab = Vocabulary {
            words: Vec::with_capacity(1000),
            slots: vec![EMPTY; hash_size],
            min_reduce: 1,
            train_words: 0,
        };

        for (line_num, line) in fin.lines().enumerate() {
            let line = line.context("error reading vocabulary file")?;
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.is_empty() {
                continue;
            }
            if fields.len() != 2 {
                bail!("vocabulary file syntax error on line {}", line_num + 1);
            }
            let count: u64 = fields[1].parse().with_context(|| {
                format!(
                    "vocabulary file: bad frequency number on line {}",
                    line_num + 1
                )
            })?;
            vocab.add_word(fields[0].to_string(), count);
        }

        if vocab.words.is_empty() || vocab.words[0].word != EOS {
            bail!("vocabulary file does not start with the {} sentinel", EOS);
        }
        Ok(vocab)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn learned(text: &str) -> Vocabulary {
        let mut vocab = Vocabulary::new(1 << 16);
        let mut r = Cursor::new(text.as_bytes().to_vec());
        vocab.learn_from_reader(&mut r, None).unwrap();
        vocab
    }

    #[test]
    fn counts_match_occurrences() {
        let vocab = learned("a b a c\n b c a b\n");
        assert_eq!(vocab.word(vocab.lookup("a").unwrap()).count, 3);
        assert_eq!(vocab.word(vocab.lookup("b").unwrap()).count, 3);
        assert_eq!(vocab.word(vocab.lookup("c").unwrap()).count, 2);
        // two newlines, two sentinel occurrences
        assert_eq!(vocab.word(0).count, 2);
        assert_eq!(vocab.word(0).word, EOS);
    }

    #[test]
    fn lookup_miss_is_none() {
        let vocab = learned("a b\n");
        assert_eq!(vocab.lookup("zebra"), None);
    }

    #[test]
    fn finalize_sorts_descending_with_sentinel_first() {
        let mut vocab = learned("a b a c\n b c a b\n");
        vocab.finalize(1);
        assert_eq!(vocab.word(0).word, EOS);
        for i in 2..vocab.len() {
            assert!(vocab.word(i - 1).count >= vocab.word(i).count);
        }
        // ids still resolve through the rebuilt table
        for id in 0..vocab.len() {
            assert_eq!(vocab.lookup(&vocab.word(id).word), Some(id));
        }
        // </s>:2, then a:3, b:3 (encounter order), c:2
        let words: Vec<&str> = vocab.words().iter().map(|vw| vw.word.as_str()).collect();
        assert_eq!(words, vec![EOS, "a", "b", "c"]);
        assert_eq!(vocab.train_words(), 2 + 3 + 3 + 2);
    }

    #[test]
    fn finalize_prunes_below_min_count() {
        let mut vocab = learned("a a a b b c\n");
        vocab.finalize(2);
        assert_eq!(vocab.lookup("c"), None);
        assert!(vocab.lookup("a").is_some());
        assert!(vocab.lookup("b").is_some());
        // sentinel exempt even though its count (1) is below min_count
        assert_eq!(vocab.word(0).word, EOS);
    }

    #[test]
    fn finalize_is_idempotent() {
        let mut vocab = learned("a b a c d d d\n b c a b\n");
        vocab.finalize(2);
        let before: Vec<(String, u64)> = vocab
            .words()
            .iter()
            .map(|vw| (vw.word.clone(), vw.count))
            .collect();
        vocab.finalize(2);
        let after: Vec<(String, u64)> = vocab
            .words()
            .iter()
            .map(|vw| (vw.word.clone(), vw.count))
            .collect();
        assert_eq!(before, after);
    }

    #[test]
    fn reduce_spares_sentinel_and_raises_threshold() {
        let mut vocab = learned("a a b\n");
        // </s> count 1, a 2, b 1; threshold 1 drops b only
        vocab.reduce();
        assert_eq!(vocab.lookup("b"), None);
        assert!(vocab.lookup("a").is_some());
        assert_eq!(vocab.word(0).word, EOS);
        // threshold has risen to 2; a (count 2) now goes too
        vocab.reduce();
        assert_eq!(vocab.lookup("a"), None);
        assert_eq!(vocab.word(0).word, EOS);
    }

    #[test]
    fn streaming_scan_reduces_when_the_table_fills() {
        // 10 slots, so a 71st-percent word fires the automatic reduce
        let mut vocab = Vocabulary::new(10);
        let mut text = "the ".repeat(60);
        for i in 0..50 {
            text.push_str(&format!("w{i} "));
        }
        text.push('\n');
        vocab
            .learn_from_reader(&mut Cursor::new(text.into_bytes()), None)
            .unwrap();

        // the trigger kept the live set under 70% of capacity
        assert!(vocab.len() <= 7);
        assert!(vocab.min_reduce > 1);
        // the singletons went; the frequent word kept its full count
        assert_eq!(vocab.word(vocab.lookup("the").unwrap()).count, 60);
        assert_eq!(vocab.word(0).word, EOS);
    }

    #[test]
    fn save_and_reload_reproduce_counts() {
        let mut vocab = learned("a b a c\n b c a b\n");
        vocab.finalize(1);

        let mut buf = Vec::new();
        vocab.save(&mut buf).unwrap();

        let mut reloaded = Vocabulary::from_reader(&mut Cursor::new(buf), 1 << 16).unwrap();
        reloaded.finalize(1);

        assert_eq!(vocab.len(), reloaded.len());
        for id in 0..vocab.len() {
            assert_eq!(vocab.word(id).word, reloaded.word(id).word);
            assert_eq!(vocab.word(id).count, reloaded.word(id).count);
        }
        assert_eq!(vocab.train_words(), reloaded.train_words());
    }

    #[test]
    fn reload_requires_sentinel() {
        let data = b"a 3\nb 2\n".to_vec();
        assert!(Vocabulary::from_reader(&mut Cursor::new(data), 1 << 16).is_err());
    }
}
