//! The pair/alignment registry: groups source, target, and optional
//! alignment files into bilingual training units and assembles the
//! per-language models they share.
//!
//! A run holds any number of pairs; distinct pairs may train the same
//! language (its model is built once, its vocabulary learned over the
//! union of that language's files, deduplicated by path). Monolingual
//! training is the degenerate pair whose two sides are the same file.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use anyhow::{bail, ensure, Context, Result};
use indicatif::ProgressBar;

use crate::config::Config;
use crate::model::LanguageModel;
use crate::partition::{compute_block_offsets, LangId, TrainingFile};
use crate::vocab::Vocabulary;

/// One training unit as named by the configuration: two parallel files
/// and, optionally, a word-alignment file with one line per sentence pair.
#[derive(Clone, Debug)]
pub struct PairSpec {
    pub src: PathBuf,
    pub tgt: PathBuf,
    pub align: Option<PathBuf>,
}

/// A partitioned alignment file; blocks mirror the training files'.
pub struct AlignmentFile {
    pub path: PathBuf,
    pub num_lines: u64,
    pub blocks: Vec<u64>,
}

pub struct LanguagePair {
    pub src: TrainingFile,
    pub tgt: TrainingFile,
    pub align: Option<AlignmentFile>,
}

impl LanguagePair {
    /// A pair whose two sides are the same file trains monolingually:
    /// one stream, no cross-lingual step.
    pub fn is_mono(&self) -> bool {
        self.src.path == self.tgt.path && self.align.is_none()
    }
}

/// Everything the training engine shares across threads: the per-language
/// models (mutable through their `Real` cells) and the pair registry
/// (read-only during a pass except for the progress counters).
pub struct Corpus {
    pub langs: Vec<LanguageModel>,
    pub pairs: Vec<LanguagePair>,
}

/// A file belongs to the declared language its filename ends with, e.g.
/// `europarl.de` is German when `de` is declared.
pub(crate) fn language_of(path: &Path, lang_names: &[String]) -> Result<LangId> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("bad training file path {}", path.display()))?;
    for (id, name) in lang_names.iter().enumerate() {
        if file_name.ends_with(name.as_str()) {
            return Ok(id);
        }
    }
    bail!(
        "training file {} matches none of the declared languages {:?}",
        path.display(),
        lang_names
    );
}

fn vocab_file_path(config: &Config, lang_name: &str) -> Option<PathBuf> {
    config
        .vocab_dir
        .as_ref()
        .map(|dir| dir.join(format!("{lang_name}.vocab.min{}", config.min_count)))
}

/// Restores a language's vocabulary from its vocab file if one exists,
/// otherwise learns it from that language's training files (each unique
/// file scanned once) and saves it. Both paths finalize identically.
fn load_or_learn_vocab(config: &Config, lang_name: &str, files: &[&Path]) -> Result<Vocabulary> {
    let vocab_path = vocab_file_path(config, lang_name);

    if let Some(path) = vocab_path.as_ref().filter(|p| p.exists()) {
        if config.debug > 0 {
            println!("# Vocab file {} exists, loading", path.display());
        }
        let mut fin = BufReader::new(
            File::open(path).with_context(|| format!("error opening vocabulary file {}", path.display()))?,
        );
        let mut vocab = Vocabulary::from_reader(&mut fin, config.vocab_hash_size)?;
        vocab.finalize(config.min_count);
        // Preprocessed corpora map unknowns to <unk>; a restored
        // vocabulary without it cannot have come from one.
        ensure!(
            vocab.lookup("<unk>").is_some(),
            "vocabulary file {} has no <unk> entry",
            path.display()
        );
        return Ok(vocab);
    }

    let mut vocab = Vocabulary::new(config.vocab_hash_size);
    for path in files {
        let progress = (config.debug > 1).then(|| {
            let pb = ProgressBar::new_spinner();
            pb.set_message(format!("learning {lang_name} vocab from {}", path.display()));
            pb
        });
        let mut fin = BufReader::new(
            File::open(path).with_context(|| format!("error opening training file {}", path.display()))?,
        );
        let words = vocab.learn_from_reader(&mut fin, progress.as_ref())?;
        if let Some(pb) = progress {
            pb.finish_and_clear();
        }
        if config.debug > 0 {
            println!("# {lang_name}: {} words in {}", words, path.display());
        }
    }
    vocab.finalize(config.min_count);
    if config.debug > 0 {
        println!("# {lang_name}: vocab size {}", vocab.len());
    }

    if let Some(path) = vocab_path {
        let mut fo = BufWriter::new(
            File::create(&path)
                .with_context(|| format!("error creating vocab file {}", path.display()))?,
        );
        vocab.save(&mut fo)?;
    }
    Ok(vocab)
}

/// Builds all language models and partitioned pairs for a run. Fatal on
/// missing files and on line-count mismatches between the sides of a
/// pair (or its alignment file): such input is malformed, not retryable.
pub fn build_corpus(
    config: &Config,
    lang_names: &[String],
    specs: &[PairSpec],
) -> Result<Corpus> {
    ensure!(!specs.is_empty(), "no training pairs configured");

    // Unique files per language, in first-seen order.
    let mut lang_files: Vec<Vec<&Path>> = vec![Vec::new(); lang_names.len()];
    for spec in specs {
        for path in [&spec.src, &spec.tgt] {
            let lang = language_of(path, lang_names)?;
            if !lang_files[lang].iter().any(|p| *p == path.as_path()) {
                lang_files[lang].push(path);
            }
        }
    }

    let mut langs = Vec::with_capacity(lang_names.len());
    for (id, name) in lang_names.iter().enumerate() {
        ensure!(
            !lang_files[id].is_empty(),
            "language {name} appears in no training pair"
        );
        let vocab = load_or_learn_vocab(config, name, &lang_files[id])?;
        langs.push(LanguageModel::new(name.clone(), vocab, config));
    }

    let mut pairs = Vec::with_capacity(specs.len());
    for spec in specs {
        let src_lang = language_of(&spec.src, lang_names)?;
        let tgt_lang = language_of(&spec.tgt, lang_names)?;
        let src = TrainingFile::open(spec.src.clone(), src_lang, config.threads)?;
        let tgt = TrainingFile::open(spec.tgt.clone(), tgt_lang, config.threads)?;
        ensure!(
            src.num_lines == tgt.num_lines,
            "pair {} / {}: line counts differ ({} vs {})",
            spec.src.display(),
            spec.tgt.display(),
            src.num_lines,
            tgt.num_lines
        );

        let align = match &spec.align {
            None => None,
            Some(path) => {
                let (blocks, num_lines) = compute_block_offsets(path, config.threads)?;
                ensure!(
                    num_lines == src.num_lines,
                    "alignment file {}: {} lines but the pair has {}",
                    path.display(),
                    num_lines,
                    src.num_lines
                );
                Some(AlignmentFile {
                    path: path.clone(),
                    num_lines,
                    blocks,
                })
            }
        };

        pairs.push(LanguagePair { src, tgt, align });
    }

    Ok(Corpus { langs, pairs })
}
