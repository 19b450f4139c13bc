use std::path::PathBuf;
use std::process;

use anyhow::Result;
use clap::Parser;

use polyvec::{build_corpus, real, Config, PairSpec, Trainer};

#[derive(Parser)]
#[command(
    about = "Multilingual WORD VECTOR estimation toolkit",
    long_about = None,
    version = "0.1"
)]
struct Options {
    /// Declare a language by name; training file names must end with it.
    /// Repeat for each language
    #[arg(long = "lang", value_name = "NAME", required = true)]
    langs: Vec<String>,

    /// Train on the parallel files SRC and TGT, optionally with a word
    /// alignment file (one line of "src tgt" position pairs per sentence
    /// pair). Repeat for each pair; a file paired with itself trains
    /// monolingually
    #[arg(long = "pair", value_name = "SRC,TGT[,ALIGN]", required = true, value_parser = parse_pair)]
    pairs: Vec<PairSpec>,

    /// Use PREFIX to save the resulting word vectors, one file per
    /// language (PREFIX.<lang>), rewritten after every iteration
    #[arg(long = "output", value_name = "PREFIX")]
    output_prefix: Option<String>,

    /// Set size of word vectors; default is 100
    #[arg(long = "size", default_value_t = 100)]
    layer1_size: usize,

    /// Set max skip length between words
    #[arg(long, default_value_t = 5)]
    window: usize,

    /// Set threshold for occurrence of words. Those that appear with higher
    /// frequency in the training data will be randomly down-sampled;
    /// useful range is (0, 1e-5), 0 disables
    #[arg(long, default_value_t = 1e-4)]
    sample: real,

    /// Use Hierarchical Softmax
    #[arg(long)]
    hs: bool,

    /// Number of negative examples; common values are 3 - 10 (0 = not used)
    #[arg(long, default_value_t = 5)]
    negative: usize,

    /// Use N threads
    #[arg(long = "threads", value_name = "N", default_value_t = 1)]
    num_threads: usize,

    /// Run more training iterations
    #[arg(long, default_value_t = 1)]
    iter: usize,

    /// Discard words that appear less than N times
    #[arg(long = "min-count", value_name = "N", default_value_t = 5)]
    min_count: u64,

    /// Set the starting learning rate
    #[arg(long, default_value_t = 0.025)]
    alpha: real,

    /// Weight of the cross-lingual updates: they run at alpha * N
    #[arg(long = "bi-weight", value_name = "N", default_value_t = 4.0)]
    bi_weight: real,

    /// Size of the negative-sampling table
    #[arg(long = "table-size", value_name = "N", default_value_t = 100_000_000)]
    table_size: usize,

    /// Capacity of the vocabulary hash table
    #[arg(long = "hash-size", value_name = "N", default_value_t = 30_000_000)]
    hash_size: usize,

    /// Keep per-language vocabulary files in DIR (<lang>.vocab.minN),
    /// reading them back instead of rescanning the corpus when present
    #[arg(long = "vocab-dir", value_name = "DIR")]
    vocab_dir: Option<PathBuf>,

    /// Save the resulting vectors in binary mode
    #[arg(long)]
    binary: bool,

    /// Also save the negative-sampling output vectors (PREFIX.outvec.<lang>)
    #[arg(long = "save-out-vecs")]
    save_out_vecs: bool,

    /// Dump the full model state with bincode instead of word vectors
    #[arg(long)]
    bincode: bool,

    /// Set the debug mode (default = 2 = more info during training)
    #[arg(long = "debug", default_value_t = 2)]
    debug_mode: usize,
}

fn parse_pair(s: &str) -> Result<PairSpec, String> {
    let fields: Vec<&str> = s.split(',').collect();
    match fields.as_slice() {
        [src, tgt] => Ok(PairSpec {
            src: PathBuf::from(src),
            tgt: PathBuf::from(tgt),
            align: None,
        }),
        [src, tgt, align] => Ok(PairSpec {
            src: PathBuf::from(src),
            tgt: PathBuf::from(tgt),
            align: Some(PathBuf::from(align)),
        }),
        _ => Err(format!("expected SRC,TGT or SRC,TGT,ALIGN, got {s:?}")),
    }
}

fn run(options: Options) -> Result<()> {
    let config = Config {
        dim: options.layer1_size,
        window: options.window,
        sample: options.sample,
        hs: options.hs,
        negative: options.negative,
        threads: options.num_threads,
        iters: options.iter,
        min_count: options.min_count,
        alpha: options.alpha,
        bi_weight: options.bi_weight,
        unigram_table_size: options.table_size,
        vocab_hash_size: options.hash_size,
        vocab_dir: options.vocab_dir,
        output_prefix: options.output_prefix,
        binary: options.binary,
        save_out_vecs: options.save_out_vecs,
        bincode: options.bincode,
        debug: options.debug_mode,
    };

    let corpus = build_corpus(&config, &options.langs, &options.pairs)?;
    if config.debug > 0 {
        for (model, name) in corpus.langs.iter().zip(&options.langs) {
            println!(
                "# {name}: vocab size {}, {} training words",
                model.vocab.len(),
                model.vocab.train_words()
            );
        }
        for pair in &corpus.pairs {
            println!(
                "# pair {} - {} ({} lines{})",
                pair.src.path.display(),
                pair.tgt.path.display(),
                pair.src.num_lines,
                if pair.align.is_some() { ", aligned" } else { "" }
            );
        }
    }

    Trainer::new(config, corpus)?.train()
}

fn main() {
    let options = Options::parse();
    if let Err(err) = run(options) {
        eprintln!("{err:#}");
        process::exit(1);
    }
}
