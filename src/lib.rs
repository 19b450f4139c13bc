//! Multilingual skip-gram word vectors.
//!
//! Trains distributional word embeddings from raw text with negative
//! sampling and/or hierarchical softmax, optionally coupling the vector
//! spaces of several languages through sentence alignments. Training is
//! asynchronous SGD: worker threads update the shared embedding matrices
//! in place without locks, in the style of word2vec.

use std::io::{self, BufRead};
use std::sync::atomic::{AtomicU32, Ordering};

pub mod config;
pub mod huffman;
pub mod model;
pub mod output;
pub mod pair;
pub mod partition;
pub mod train;
pub mod vocab;

pub use config::Config;
pub use model::LanguageModel;
pub use pair::{build_corpus, Corpus, PairSpec};
pub use train::Trainer;
pub use vocab::{VocabWord, Vocabulary};

/// Precision of float numbers.
#[allow(non_camel_case_types)]
pub type real = f32;

/// Longest token we store; longer tokens are silently truncated on read.
pub const MAX_STRING: usize = 100;

/// Sentences are capped at this many tokens; the rest of the line is read
/// and discarded.
pub const MAX_SENTENCE_LENGTH: usize = 1000;

/// The end-of-sentence sentinel, always vocabulary id 0.
pub const EOS: &str = "</s>";

/// The linear congruential generator word2vec uses everywhere.
#[derive(Clone)]
pub struct Rng(pub u64);

impl Rng {
    pub fn rand_u64(&mut self) -> u64 {
        self.0 = self.0.wrapping_mul(25214903917).wrapping_add(11);
        self.0
    }

    /// A sample from `[0, 1)` with 16 bits of precision.
    pub fn rand_real(&mut self) -> real {
        (self.rand_u64() & 0xFFFF) as real / 65536.0
    }
}

/// A shared, concurrently-mutable `real` with no synchronization beyond
/// atomicity of the individual load/store.
///
/// Training threads read and write embedding rows through these cells
/// without locking; concurrent read-modify-write interleavings can lose
/// updates, which asynchronous SGD tolerates as optimizer noise. Relaxed
/// atomics compile to plain moves on the targets we care about.
#[derive(Default)]
#[repr(transparent)]
pub struct Real {
    bits: AtomicU32,
}

impl Real {
    pub fn get(&self) -> real {
        real::from_bits(self.bits.load(Ordering::Relaxed))
    }

    pub fn set(&self, value: real) {
        self.bits.store(value.to_bits(), Ordering::Relaxed);
    }

    /// Non-atomic increment: a racing `add` on the same cell may be lost.
    pub fn add(&self, x: real) {
        let a = self.get();
        self.set(a + x);
    }
}

/// Reads a single word, treating space, tab, and newline as boundaries.
///
/// Returns `Ok(None)` at end of input. A newline is reported as the `</s>`
/// sentinel; a newline terminating a word is left unconsumed so the next
/// call yields `</s>` (sentence boundaries are never silently swallowed).
pub fn read_word(fin: &mut impl BufRead) -> io::Result<Option<String>> {
    let mut word = Vec::new();
    loop {
        let b = {
            let buf = fin.fill_buf()?;
            if buf.is_empty() {
                break;
            }
            buf[0]
        };

        if b == b'\r' {
            fin.consume(1);
            continue;
        }
        if b == b' ' || b == b'\t' || b == b'\n' {
            if !word.is_empty() {
                // Leave a newline for the next call to report as </s>.
                if b != b'\n' {
                    fin.consume(1);
                }
                break;
            }
            fin.consume(1);
            if b == b'\n' {
                return Ok(Some(EOS.to_string()));
            }
            continue;
        }
        fin.consume(1);
        if word.len() < MAX_STRING - 1 {
            word.push(b); // Truncate too long words
        }
    }
    Ok(if word.is_empty() {
        None
    } else {
        Some(String::from_utf8_lossy(&word).to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn words_of(text: &str) -> Vec<String> {
        let mut r = Cursor::new(text.as_bytes().to_vec());
        let mut out = vec![];
        while let Some(w) = read_word(&mut r).unwrap() {
            out.push(w);
        }
        out
    }

    #[test]
    fn read_word_splits_and_reports_sentences() {
        assert_eq!(
            words_of("a b a c\n b c a b\n"),
            vec!["a", "b", "a", "c", "</s>", "b", "c", "a", "b", "</s>"]
        );
    }

    #[test]
    fn read_word_newline_after_word_is_not_lost() {
        // The newline directly terminating "c" must still produce </s>.
        assert_eq!(words_of("c\nd"), vec!["c", "</s>", "d"]);
    }

    #[test]
    fn read_word_handles_crlf_and_tabs() {
        assert_eq!(words_of("a\tb\r\nc"), vec!["a", "b", "</s>", "c"]);
    }

    #[test]
    fn read_word_truncates_long_tokens() {
        let long = "x".repeat(500);
        let words = words_of(&long);
        assert_eq!(words.len(), 1);
        assert_eq!(words[0].len(), MAX_STRING - 1);
    }

    #[test]
    fn rng_is_the_word2vec_lcg() {
        let mut rng = Rng(1);
        assert_eq!(rng.rand_u64(), 25214903928);
        let r = rng.rand_real();
        assert!((0.0..1.0).contains(&r));
    }
}
