//! Vector and model serialization.
//!
//! The default formats are the usual word-vector ones: a `"vocab_size
//! dim"` header line, then one row per word, either space-separated
//! decimal floats or the word followed by raw little-endian `f32`s.
//! Alternatively the whole model state can be dumped with bincode for
//! later reloading.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::model::LanguageModel;
use crate::pair::Corpus;
use crate::vocab::VocabWord;
use crate::{real, Real};

fn write_vectors(
    path: &str,
    model: &LanguageModel,
    binary: bool,
    row: impl Fn(usize) -> Vec<real>,
) -> Result<()> {
    let mut fo = BufWriter::new(
        File::create(path).with_context(|| format!("error creating output file {path}"))?,
    );
    let write_err = || format!("error writing output file {path}");
    writeln!(fo, "{} {}", model.vocab.len(), model.dim()).with_context(write_err)?;
    for a in 0..model.vocab.len() {
        write!(fo, "{} ", model.vocab.word(a).word).with_context(write_err)?;
        let word_vec = row(a);
        if binary {
            fo.write_all(bytemuck::cast_slice::<real, u8>(&word_vec))
                .with_context(write_err)?;
        } else {
            for f in &word_vec {
                write!(fo, "{f} ").with_context(write_err)?;
            }
        }
        writeln!(fo).with_context(write_err)?;
    }
    Ok(())
}

/// Writes the input embeddings to `<prefix>.<lang>`.
pub fn save_vectors(prefix: &str, model: &LanguageModel, binary: bool) -> Result<()> {
    write_vectors(&format!("{prefix}.{}", model.name()), model, binary, |a| {
        model.input_vector(a)
    })
}

/// Writes the negative-sampling output embeddings to
/// `<prefix>.outvec.<lang>`.
pub fn save_output_vectors(prefix: &str, model: &LanguageModel, binary: bool) -> Result<()> {
    write_vectors(
        &format!("{prefix}.outvec.{}", model.name()),
        model,
        binary,
        |a| model.output_vector(a),
    )
}

/// The complete state of one trained language, as stored by the bincode
/// format. Enough to resume lookups or continue analysis offline; the
/// Huffman codes ride along inside [`VocabWord`].
#[derive(Serialize, Deserialize)]
pub struct SavedModel {
    pub name: String,
    pub dim: usize,
    pub vocab: Vec<VocabWord>,
    pub syn0: Vec<real>,
    pub syn1: Vec<real>,
    pub syn1neg: Vec<real>,
}

impl SavedModel {
    pub fn from_model(model: &LanguageModel) -> Self {
        let dump = |m: &[Real]| m.iter().map(Real::get).collect();
        SavedModel {
            name: model.name().to_string(),
            dim: model.dim(),
            vocab: model.vocab.words().to_vec(),
            syn0: dump(model.syn0()),
            syn1: dump(model.syn1()),
            syn1neg: dump(model.syn1neg()),
        }
    }
}

/// Dumps the whole model to `<prefix>.model.<lang>`.
pub fn save_bincode(prefix: &str, model: &LanguageModel) -> Result<()> {
    let path = format!("{prefix}.model.{}", model.name());
    let fo = BufWriter::new(
        File::create(&path).with_context(|| format!("error creating output file {path}"))?,
    );
    bincode::serialize_into(fo, &SavedModel::from_model(model))
        .with_context(|| format!("error writing output file {path}"))
}

pub fn load_bincode(path: &Path) -> Result<SavedModel> {
    let fin = BufReader::new(
        File::open(path).with_context(|| format!("error opening model file {}", path.display()))?,
    );
    bincode::deserialize_from(fin)
        .with_context(|| format!("error reading model file {}", path.display()))
}

/// Saves every language of the corpus in whichever formats the
/// configuration asks for. Output vectors only exist under negative
/// sampling.
pub fn save_corpus(prefix: &str, corpus: &Corpus, config: &Config) -> Result<()> {
    for model in &corpus.langs {
        if config.bincode {
            save_bincode(prefix, model)?;
        } else {
            save_vectors(prefix, model, config.binary)?;
            if config.save_out_vecs && config.negative > 0 {
                save_output_vectors(prefix, model, config.binary)?;
            }
        }
    }
    Ok(())
}
