//! Training configuration.
//!
//! One immutable [`Config`] value is assembled before any component runs
//! and passed by reference everywhere; nothing here is global state.

use std::path::PathBuf;

use crate::real;

#[derive(Clone, Debug)]
pub struct Config {
    /// Embedding vector length (number of dimensions).
    pub dim: usize,

    /// Max skip length between words; the effective window per position is
    /// drawn uniformly from `[1, window]`.
    pub window: usize,

    /// Subsampling threshold for frequent words; `0.0` disables.
    pub sample: real,

    /// Use hierarchical softmax output layers.
    pub hs: bool,

    /// Number of negative examples per positive one; `0` disables
    /// negative sampling.
    pub negative: usize,

    /// Number of worker threads per training pass.
    pub threads: usize,

    /// Number of full passes over the corpus.
    pub iters: usize,

    /// Words occurring fewer than this many times are dropped when the
    /// vocabulary is finalized.
    pub min_count: u64,

    /// Starting learning rate; decays linearly with progress.
    pub alpha: real,

    /// Weight of cross-lingual predictions: the bilingual learning rate is
    /// `alpha * bi_weight`.
    pub bi_weight: real,

    /// Capacity of the frequency-biased negative-sampling table.
    pub unigram_table_size: usize,

    /// Capacity of the vocabulary's open-addressing hash table; the
    /// vocabulary is reduced whenever it exceeds 70% of this.
    pub vocab_hash_size: usize,

    /// Where per-language vocabulary files are kept; `None` disables
    /// vocabulary persistence and the vocabulary is always learned fresh.
    pub vocab_dir: Option<PathBuf>,

    /// Prefix for per-language vector checkpoints (`<prefix>.<lang>`);
    /// `None` disables checkpointing.
    pub output_prefix: Option<String>,

    /// Write vectors in the word2vec binary format rather than text.
    pub binary: bool,

    /// Also write output-side (negative-sampling) vectors to
    /// `<prefix>.outvec.<lang>`.
    pub save_out_vecs: bool,

    /// Serialize the whole model with bincode instead of the word2vec
    /// format.
    pub bincode: bool,

    /// 0 = silent, 1 = summaries, 2 = per-batch progress.
    pub debug: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            dim: 100,
            window: 5,
            sample: 1e-4,
            hs: false,
            negative: 5,
            threads: 1,
            iters: 1,
            min_count: 5,
            alpha: 0.025,
            bi_weight: 4.0,
            unigram_table_size: 100_000_000,
            vocab_hash_size: 30_000_000,
            vocab_dir: None,
            output_prefix: None,
            binary: false,
            save_out_vecs: false,
            bincode: false,
            debug: 2,
        }
    }
}
