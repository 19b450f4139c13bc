//! Per-language model state: the vocabulary, the shared embedding
//! matrices, and the negative-sampling unigram table.
//!
//! Matrices are allocated once the vocabulary is frozen and are then
//! mutated in place by all worker threads concurrently; see [`Real`] for
//! the synchronization (non-)discipline. Row `i` of every matrix belongs
//! to vocabulary id `i` for the whole run.

use aligned_box::AlignedBox;

use crate::config::Config;
use crate::huffman;
use crate::vocab::Vocabulary;
use crate::{real, Real, Rng};

pub const EXP_TABLE_SIZE: usize = 1000;
pub const MAX_EXP: real = 6.0;

/// Precomputed logistic function over `[-MAX_EXP, MAX_EXP]`, clamped to
/// 0/1 outside. Read-only and shared by all threads.
pub struct SigmoidTable {
    table: Vec<real>,
}

impl SigmoidTable {
    pub fn new() -> Self {
        let table = (0..EXP_TABLE_SIZE)
            .map(|i| {
                let e = ((i as real / EXP_TABLE_SIZE as real * 2.0 - 1.0) * MAX_EXP).exp();
                e / (e + 1.0) // f(x) = x / (x + 1) over the precomputed exp
            })
            .collect();
        SigmoidTable { table }
    }

    /// Approximates 1 / (1 + e^-x).
    pub fn get(&self, x: real) -> real {
        if x >= MAX_EXP {
            1.0
        } else if x <= -MAX_EXP {
            0.0
        } else {
            self.table[((x + MAX_EXP) * (EXP_TABLE_SIZE as real / MAX_EXP / 2.0)) as usize]
        }
    }
}

impl Default for SigmoidTable {
    fn default() -> Self {
        SigmoidTable::new()
    }
}

/// Builds the table for O(1) frequency-biased negative draws: word ids
/// appear in proportion to `count^0.75`.
pub fn build_unigram_table(vocab: &Vocabulary, table_size: usize) -> Vec<u32> {
    let power: f64 = 0.75;
    let train_words_pow: f64 = vocab
        .words()
        .iter()
        .map(|vw| (vw.count as f64).powf(power))
        .sum();

    let mut table = Vec::with_capacity(table_size);
    let mut i = 0;
    let mut d1 = (vocab.word(i).count as f64).powf(power) / train_words_pow;
    for a in 0..table_size {
        table.push(i as u32);
        if (a as f64 / table_size as f64) > d1 {
            i += 1;
            if i >= vocab.len() {
                i = vocab.len() - 1;
            }
            d1 += (vocab.word(i).count as f64).powf(power) / train_words_pow;
        }
    }
    table
}

pub struct LanguageModel {
    name: String,
    pub vocab: Vocabulary,
    dim: usize,
    /// Input embeddings, `vocab.len() * dim`, row i = word id i.
    syn0: AlignedBox<[Real]>,
    /// Output tree-node embeddings, present iff hierarchical softmax.
    syn1: Option<AlignedBox<[Real]>>,
    /// Output word embeddings, present iff negative sampling.
    syn1neg: Option<AlignedBox<[Real]>>,
    /// Negative-sampling draw table; empty when negative sampling is off.
    table: Vec<u32>,
}

impl LanguageModel {
    /// Freezes a finalized vocabulary into trainable state: random input
    /// embeddings, zeroed output embeddings for whichever output layers
    /// are enabled, Huffman codes iff hierarchical softmax, and the
    /// unigram table iff negative sampling.
    pub fn new(name: String, mut vocab: Vocabulary, config: &Config) -> Self {
        let vocab_size = vocab.len();
        let dim = config.dim;

        let syn0: AlignedBox<[Real]> =
            AlignedBox::slice_from_default(128, vocab_size * dim).expect("Memory allocation failed");
        let syn1 = config.hs.then(|| {
            AlignedBox::slice_from_default(128, vocab_size * dim).expect("Memory allocation failed")
        });
        let syn1neg = (config.negative > 0).then(|| {
            AlignedBox::slice_from_default(128, vocab_size * dim).expect("Memory allocation failed")
        });

        let mut rng = Rng(1);
        for a in 0..vocab_size {
            for b in 0..dim {
                syn0[a * dim + b].set((rng.rand_real() - 0.5) / dim as real);
            }
        }

        if config.hs {
            huffman::assign_codes(vocab.words_mut());
        }
        let table = if config.negative > 0 {
            build_unigram_table(&vocab, config.unigram_table_size)
        } else {
            Vec::new()
        };

        LanguageModel {
            name,
            vocab,
            dim,
            syn0,
            syn1,
            syn1neg,
            table,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    #[inline]
    pub fn syn0(&self) -> &[Real] {
        &self.syn0
    }

    #[inline]
    pub fn syn1(&self) -> &[Real] {
        self.syn1.as_deref().unwrap_or(&[])
    }

    #[inline]
    pub fn syn1neg(&self) -> &[Real] {
        self.syn1neg.as_deref().unwrap_or(&[])
    }

    /// Draws a negative-sample word id from the unigram table. A draw of
    /// the sentinel is remapped to a uniform non-sentinel id.
    #[inline]
    pub fn sample_negative(&self, rand: u64) -> usize {
        let mut target = self.table[(rand >> 16) as usize % self.table.len()] as usize;
        if target == 0 {
            target = rand as usize % (self.vocab.len() - 1) + 1;
        }
        target
    }

    /// The input vector for one word id, copied out for serialization.
    pub fn input_vector(&self, id: usize) -> Vec<real> {
        self.syn0[id * self.dim..][..self.dim]
            .iter()
            .map(Real::get)
            .collect()
    }

    /// The negative-sampling output vector for one word id.
    pub fn output_vector(&self, id: usize) -> Vec<real> {
        self.syn1neg()[id * self.dim..][..self.dim]
            .iter()
            .map(Real::get)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EOS;
    use std::io::Cursor;

    fn toy_vocab(counts: &[(&str, u64)]) -> Vocabulary {
        let mut text = String::new();
        for &(word, count) in counts {
            for _ in 0..count {
                text.push_str(word);
                text.push(' ');
            }
        }
        text.push('\n');
        let mut vocab = Vocabulary::new(1 << 16);
        vocab
            .learn_from_reader(&mut Cursor::new(text.into_bytes()), None)
            .unwrap();
        vocab.finalize(1);
        vocab
    }

    #[test]
    fn sigmoid_table_is_monotone_and_centered() {
        let sig = SigmoidTable::new();
        assert!((sig.get(0.0) - 0.5).abs() < 0.01);
        assert_eq!(sig.get(100.0), 1.0);
        assert_eq!(sig.get(-100.0), 0.0);
        let mut prev = 0.0;
        for i in -60..=60 {
            let y = sig.get(i as real / 10.0);
            assert!(y >= prev);
            prev = y;
        }
    }

    #[test]
    fn unigram_table_follows_three_quarter_power_law() {
        let vocab = toy_vocab(&[("the", 1000), ("cat", 100), ("sat", 10)]);
        let table_size = 100_000;
        let table = build_unigram_table(&vocab, table_size);
        assert_eq!(table.len(), table_size);

        let mut occurrences = vec![0u64; vocab.len()];
        for &id in &table {
            occurrences[id as usize] += 1;
        }

        let power = 0.75f64;
        let total: f64 = vocab
            .words()
            .iter()
            .map(|vw| (vw.count as f64).powf(power))
            .sum();
        for id in 1..vocab.len() {
            let expected = (vocab.word(id).count as f64).powf(power) / total;
            let actual = occurrences[id] as f64 / table_size as f64;
            assert!(
                (expected - actual).abs() < 0.01,
                "id {id}: expected {expected:.4}, got {actual:.4}"
            );
        }
    }

    #[test]
    fn unigram_table_handles_tiny_vocab_without_overrun() {
        let vocab = toy_vocab(&[("a", 2), ("b", 1)]);
        let table = build_unigram_table(&vocab, 1000);
        assert!(table.iter().all(|&id| (id as usize) < vocab.len()));
    }

    #[test]
    fn model_init_is_finite_and_shaped() {
        let config = Config {
            dim: 8,
            negative: 5,
            unigram_table_size: 1000,
            ..Config::default()
        };
        let vocab = toy_vocab(&[("a", 3), ("b", 2)]);
        let vocab_size = vocab.len();
        let model = LanguageModel::new("en".to_string(), vocab, &config);

        assert_eq!(model.syn0().len(), vocab_size * 8);
        assert_eq!(model.syn1neg().len(), vocab_size * 8);
        assert!(model.syn1().is_empty()); // hs off
        for id in 0..vocab_size {
            for x in model.input_vector(id) {
                assert!(x.is_finite());
                assert!(x.abs() <= 0.5 / 8.0 + 1e-6);
            }
            assert!(model.output_vector(id).iter().all(|&x| x == 0.0));
        }
        assert_eq!(model.vocab.word(0).word, EOS);
    }

    #[test]
    fn hs_model_gets_codes_and_tree_rows() {
        let config = Config {
            dim: 4,
            hs: true,
            negative: 0,
            ..Config::default()
        };
        let vocab = toy_vocab(&[("a", 3), ("b", 2), ("c", 1)]);
        let vocab_size = vocab.len();
        let model = LanguageModel::new("en".to_string(), vocab, &config);
        assert_eq!(model.syn1().len(), vocab_size * 4);
        assert!(model.syn1neg().is_empty());
        for id in 0..vocab_size {
            assert!(!model.vocab.word(id).code.is_empty());
        }
    }
}
