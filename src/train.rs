//! The asynchronous training engine.
//!
//! Each pass spawns `threads` scoped workers. A worker owns one bounded
//! reader per side of every pair, seeked to its own line-aligned block,
//! and cycles over the pairs round-robin: one sentence pair from each
//! active pair per visit. A pair is finished for this worker when either
//! side's block is exhausted or either side's per-thread word quota is
//! exceeded; the pass ends when every pair is finished. All gradient
//! updates go through [`Real`] cells with no locking.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom, Take, Write};
use std::path::Path;
use std::thread;
use std::time::Instant;

use anyhow::{ensure, Context, Result};

use crate::config::Config;
use crate::model::{LanguageModel, SigmoidTable, MAX_EXP};
use crate::output;
use crate::pair::{Corpus, LanguagePair};
use crate::partition::TrainingFile;
use crate::{read_word, real, Rng, EOS, MAX_SENTENCE_LENGTH};

/// Thread-local words read between flushes of the shared progress
/// counter (and learning-rate updates).
const PROGRESS_INTERVAL: u64 = 10_000;

pub struct Trainer {
    config: Config,
    corpus: Corpus,
    sigmoid: SigmoidTable,
    start: Instant,
}

/// Which of a worker's pairs still have sentences to give.
#[derive(Clone, Copy, PartialEq, Eq)]
enum PairState {
    Active,
    Finished,
}

/// A worker's thread-local position in one pair. Only the source-side
/// count drives the shared progress counter and the learning rate; the
/// target-side count exists for the quota check.
#[derive(Default)]
struct PairProgress {
    src_words: u64,
    src_last_words: u64,
    tgt_words: u64,
}

struct PairTask<'c> {
    pair: &'c LanguagePair,
    state: PairState,
    src: Take<BufReader<File>>,
    /// Absent for monolingual pairs, which read one stream.
    tgt: Option<Take<BufReader<File>>>,
    align: Option<Take<BufReader<File>>>,
    progress: PairProgress,
}

/// One loaded sentence: vocabulary ids of the kept words, plus the map
/// from original token positions to kept indices that alignment links
/// are resolved through (`None` marks unknown or subsampled tokens).
struct Sentence {
    words: Vec<usize>,
    id_map: Vec<Option<usize>>,
    /// In-vocabulary tokens read, kept or not; what quotas count.
    known_words: u64,
    at_eof: bool,
}

impl Sentence {
    fn orig_len(&self) -> usize {
        self.id_map.len()
    }
}

/// Reads words up to the next sentence boundary, dropping unknown words
/// and (when `sample > 0`) randomly discarding frequent ones. Tokens past
/// the sentence cap are read and discarded so the stream stays line
/// synchronized.
fn load_sentence(
    model: &LanguageModel,
    sample: real,
    train_words: u64,
    fin: &mut impl BufRead,
    rng: &mut Rng,
    words_read: &mut u64,
) -> Result<Sentence> {
    let mut sent = Sentence {
        words: Vec::new(),
        id_map: Vec::new(),
        known_words: 0,
        at_eof: false,
    };
    loop {
        let Some(token) = read_word(fin)? else {
            sent.at_eof = true;
            break;
        };
        *words_read += 1;
        if token == EOS {
            break;
        }
        if sent.id_map.len() >= MAX_SENTENCE_LENGTH {
            continue;
        }
        let Some(word) = model.vocab.lookup(&token) else {
            sent.id_map.push(None);
            continue;
        };
        sent.known_words += 1;
        if sample > 0.0 {
            // Discard probability keeps the frequency ranking while
            // thinning words far above the sample threshold.
            let cn = model.vocab.word(word).count as real;
            let k = sample * train_words as real;
            let ran = ((cn / k).sqrt() + 1.0) * k / cn;
            if ran < rng.rand_real() {
                sent.id_map.push(None);
                continue;
            }
        }
        sent.id_map.push(Some(sent.words.len()));
        sent.words.push(word);
    }
    Ok(sent)
}

/// Parses one alignment line: whitespace-separated `src tgt` position
/// pairs. An empty line means no links for this sentence pair.
fn read_alignment_links(fin: &mut impl BufRead) -> Result<Vec<(usize, usize)>> {
    let mut line = String::new();
    fin.read_line(&mut line)?;
    let mut links = Vec::new();
    let mut fields = line.split_whitespace();
    while let Some(src) = fields.next() {
        let tgt = fields
            .next()
            .with_context(|| format!("alignment line has an odd number of fields: {line:?}"))?;
        let src = src
            .parse()
            .with_context(|| format!("bad alignment position {src:?}"))?;
        let tgt = tgt
            .parse()
            .with_context(|| format!("bad alignment position {tgt:?}"))?;
        links.push((src, tgt));
    }
    Ok(links)
}

/// Source position -> target position from the explicit links, indexed
/// by original token position. Links pointing outside either sentence
/// are dropped.
fn build_align_map(
    links: &[(usize, usize)],
    src_orig_len: usize,
    tgt_orig_len: usize,
) -> Vec<Option<usize>> {
    let mut map = vec![None; src_orig_len];
    for &(src_pos, tgt_pos) in links {
        if src_pos < src_orig_len && tgt_pos < tgt_orig_len {
            map[src_pos] = Some(tgt_pos);
        }
    }
    map
}

/// The target position for one source position: its own link if it has
/// one, otherwise the average of its immediate neighbors' links, or
/// `None` when both neighbors are unaligned too.
fn resolve_target(map: &[Option<usize>], src_pos: usize) -> Option<usize> {
    if let Some(tgt_pos) = map[src_pos] {
        return Some(tgt_pos);
    }
    let mut sum = 0;
    let mut count = 0;
    if src_pos > 0 {
        if let Some(prev) = map[src_pos - 1] {
            sum += prev;
            count += 1;
        }
    }
    if src_pos + 1 < map.len() {
        if let Some(next) = map[src_pos + 1] {
            sum += next;
            count += 1;
        }
    }
    (count > 0).then(|| sum / count)
}

/// The diagonal mapping used when no alignment file is given.
fn uniform_target(src_pos: usize, src_orig_len: usize, tgt_orig_len: usize) -> usize {
    src_pos * tgt_orig_len / src_orig_len
}

fn open_block(path: &Path, blocks: &[u64], id: usize) -> Result<Take<BufReader<File>>> {
    let mut file = File::open(path)
        .with_context(|| format!("error opening training file {}", path.display()))?;
    file.seek(SeekFrom::Start(blocks[id]))
        .with_context(|| format!("error seeking in {}", path.display()))?;
    Ok(BufReader::new(file).take(blocks[id + 1] - blocks[id]))
}

impl Trainer {
    pub fn new(config: Config, corpus: Corpus) -> Result<Self> {
        ensure!(config.threads >= 1, "at least one training thread required");
        ensure!(config.window >= 1, "window must be at least 1");
        ensure!(config.dim >= 1, "vector size must be at least 1");
        ensure!(!corpus.pairs.is_empty(), "no training pairs configured");
        Ok(Trainer {
            config,
            corpus,
            sigmoid: SigmoidTable::new(),
            start: Instant::now(),
        })
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    /// Runs `iters` full passes, checkpointing the vectors after each one
    /// when an output prefix is configured.
    pub fn train(&self) -> Result<()> {
        for cur_iter in 0..self.config.iters {
            for pair in &self.corpus.pairs {
                pair.src.reset_progress();
                pair.tgt.reset_progress();
            }
            if self.config.debug > 0 {
                eprintln!("## Start iter {cur_iter}, alpha={}", self.config.alpha);
            }

            thread::scope(|scope| -> Result<()> {
                let workers: Vec<_> = (0..self.config.threads)
                    .map(|id| scope.spawn(move || self.worker(id, cur_iter)))
                    .collect();
                let mut result = Ok(());
                for worker in workers {
                    match worker.join() {
                        Ok(r) => {
                            if result.is_ok() {
                                result = r;
                            }
                        }
                        Err(panic) => std::panic::resume_unwind(panic),
                    }
                }
                result
            })?;

            if self.config.debug > 0 {
                eprintln!("\n# Done iter {cur_iter}");
            }
            if let Some(prefix) = &self.config.output_prefix {
                output::save_corpus(prefix, &self.corpus, &self.config)?;
            }
        }
        Ok(())
    }

    fn next_alpha(&self, cur_iter: usize, src: &TrainingFile, word_count_actual: u64) -> real {
        let c = &self.config;
        let done = cur_iter as u64 * src.train_words + word_count_actual;
        let total = c.iters as u64 * src.train_words + 1;
        let alpha = c.alpha * (1.0 - done as real / total as real);
        alpha.max(c.alpha * 0.0001)
    }

    fn worker(&self, id: usize, cur_iter: usize) -> Result<()> {
        let config = &self.config;
        let mut rng = Rng((id + cur_iter * config.threads) as u64);
        let mut neu1e = vec![0.0; config.dim];
        let total_src_words: u64 = self.corpus.pairs.iter().map(|p| p.src.train_words).sum();

        let mut tasks = Vec::with_capacity(self.corpus.pairs.len());
        for pair in &self.corpus.pairs {
            let tgt = if pair.is_mono() {
                None
            } else {
                Some(open_block(&pair.tgt.path, &pair.tgt.blocks, id)?)
            };
            let align = match &pair.align {
                Some(a) => Some(open_block(&a.path, &a.blocks, id)?),
                None => None,
            };
            tasks.push(PairTask {
                pair,
                state: PairState::Active,
                src: open_block(&pair.src.path, &pair.src.blocks, id)?,
                tgt,
                align,
                progress: PairProgress::default(),
            });
        }

        let first_src = &self.corpus.pairs[0].src;
        let mut alpha = self.next_alpha(cur_iter, first_src, first_src.progress());
        let mut all_src_words: u64 = 0;
        let mut prev_all_src_words: u64 = 0;
        let mut all_tgt_words: u64 = 0;

        // Round-robin over the pairs; every visit to an active pair
        // consumes one sentence pair, so each visit either makes progress
        // or retires the pair and the loop terminates.
        let mut active = tasks.len();
        while active > 0 {
            for task in &mut tasks {
                if task.state == PairState::Finished {
                    continue;
                }

                if all_src_words - prev_all_src_words > PROGRESS_INTERVAL {
                    let delta = task.progress.src_words - task.progress.src_last_words;
                    let actual = task.pair.src.add_progress(delta);
                    task.progress.src_last_words = task.progress.src_words;
                    prev_all_src_words = all_src_words;
                    alpha = self.next_alpha(cur_iter, &task.pair.src, actual);
                    if config.debug > 1 {
                        print!(
                            "\rAlpha: {:.6}, bi_alpha: {:.6}  Progress: {:.2}%  Words/thread/sec: {:.2}k  ",
                            alpha,
                            alpha * config.bi_weight,
                            all_src_words as real
                                / (config.threads as u64 * total_src_words + 1) as real
                                * 100.0,
                            all_src_words as real
                                / (self.start.elapsed().as_secs_f32() * 1000.0 + 1.0)
                        );
                        io::stdout().flush()?;
                    }
                }

                self.run_pair_step(
                    task,
                    alpha,
                    &mut rng,
                    &mut neu1e,
                    &mut all_src_words,
                    &mut all_tgt_words,
                )?;

                if task.state == PairState::Finished {
                    // flush this pair's remaining words before retiring it
                    task.pair
                        .src
                        .add_progress(task.progress.src_words - task.progress.src_last_words);
                    task.progress.src_last_words = task.progress.src_words;
                    active -= 1;
                }
            }
        }
        Ok(())
    }

    /// Processes one sentence (monolingual pair) or one sentence pair
    /// plus its cross-lingual updates, and retires the pair on block end
    /// or quota.
    fn run_pair_step(
        &self,
        task: &mut PairTask,
        alpha: real,
        rng: &mut Rng,
        neu1e: &mut [real],
        all_src_words: &mut u64,
        all_tgt_words: &mut u64,
    ) -> Result<()> {
        let config = &self.config;
        let pair = task.pair;
        let src_model = &self.corpus.langs[pair.src.lang];
        let src_quota = pair.src.train_words / config.threads as u64;

        let src_sent = load_sentence(
            src_model,
            config.sample,
            pair.src.train_words,
            &mut task.src,
            rng,
            all_src_words,
        )
        .with_context(|| format!("error reading {}", pair.src.path.display()))?;
        task.progress.src_words += src_sent.known_words;
        self.process_sentence(src_model, &src_sent, alpha, rng, neu1e);

        let Some(tgt_reader) = task.tgt.as_mut() else {
            // monolingual: one stream, source-side bookkeeping only
            if src_sent.at_eof || task.progress.src_words > src_quota {
                task.state = PairState::Finished;
            }
            return Ok(());
        };

        let tgt_model = &self.corpus.langs[pair.tgt.lang];
        let tgt_sent = load_sentence(
            tgt_model,
            config.sample,
            pair.tgt.train_words,
            tgt_reader,
            rng,
            all_tgt_words,
        )
        .with_context(|| format!("error reading {}", pair.tgt.path.display()))?;
        task.progress.tgt_words += tgt_sent.known_words;
        self.process_sentence(tgt_model, &tgt_sent, alpha, rng, neu1e);

        // The alignment line is consumed unconditionally to keep the
        // three streams in step even across empty sentences.
        let links = match (task.align.as_mut(), pair.align.as_ref()) {
            (Some(reader), Some(align)) => Some(
                read_alignment_links(reader)
                    .with_context(|| format!("error reading {}", align.path.display()))?,
            ),
            _ => None,
        };

        if !tgt_sent.words.is_empty() && src_sent.orig_len() > 0 {
            let bi_alpha = alpha * config.bi_weight;
            match links {
                Some(links) => {
                    let map = build_align_map(&links, src_sent.orig_len(), tgt_sent.orig_len());
                    for src_pos in 0..src_sent.orig_len() {
                        let Some(si) = src_sent.id_map[src_pos] else {
                            continue;
                        };
                        let Some(tgt_pos) = resolve_target(&map, src_pos) else {
                            continue;
                        };
                        let Some(ti) = tgt_sent.id_map.get(tgt_pos).copied().flatten() else {
                            continue;
                        };
                        self.align_step(src_model, src_sent.words[si], tgt_model, &tgt_sent.words, ti, bi_alpha, rng, neu1e);
                        self.align_step(tgt_model, tgt_sent.words[ti], src_model, &src_sent.words, si, bi_alpha, rng, neu1e);
                    }
                }
                None => {
                    for src_pos in 0..src_sent.orig_len() {
                        let tgt_pos =
                            uniform_target(src_pos, src_sent.orig_len(), tgt_sent.orig_len());
                        let Some(si) = src_sent.id_map[src_pos] else {
                            continue;
                        };
                        let Some(ti) = tgt_sent.id_map.get(tgt_pos).copied().flatten() else {
                            continue;
                        };
                        self.align_step(src_model, src_sent.words[si], tgt_model, &tgt_sent.words, ti, bi_alpha, rng, neu1e);
                        self.align_step(tgt_model, tgt_sent.words[ti], src_model, &src_sent.words, si, bi_alpha, rng, neu1e);
                    }
                }
            }
        }

        let tgt_quota = pair.tgt.train_words / config.threads as u64;
        if src_sent.at_eof
            || tgt_sent.at_eof
            || task.progress.src_words > src_quota
            || task.progress.tgt_words > tgt_quota
        {
            task.state = PairState::Finished;
        }
        Ok(())
    }

    /// Monolingual skip-gram over one sentence: every kept word predicts
    /// its neighbors within a per-position window drawn from `[1, window]`.
    fn process_sentence(
        &self,
        model: &LanguageModel,
        sent: &Sentence,
        alpha: real,
        rng: &mut Rng,
        neu1e: &mut [real],
    ) {
        let window = self.config.window;
        for pos in 0..sent.words.len() {
            let out_word = sent.words[pos];
            let b = (rng.rand_u64() % window as u64) as usize;
            for a in b..(window * 2 + 1 - b) {
                if a == window {
                    continue;
                }
                let Some(c) = (pos + a).checked_sub(window) else {
                    continue;
                };
                if c >= sent.words.len() {
                    continue;
                }
                self.skip_pair(model, model, sent.words[c], out_word, alpha, rng, neu1e);
            }
        }
    }

    /// Cross-lingual skip-gram step: one input word predicts the target
    /// sentence's kept words around the aligned position.
    #[allow(clippy::too_many_arguments)]
    fn align_step(
        &self,
        in_model: &LanguageModel,
        in_word: usize,
        out_model: &LanguageModel,
        out_sent: &[usize],
        out_pos: usize,
        bi_alpha: real,
        rng: &mut Rng,
        neu1e: &mut [real],
    ) {
        let window = self.config.window;
        let b = (rng.rand_u64() % window as u64) as usize;
        for a in b..(window * 2 + 1 - b) {
            if a == window {
                continue;
            }
            let Some(c) = (out_pos + a).checked_sub(window) else {
                continue;
            };
            if c >= out_sent.len() {
                continue;
            }
            self.skip_pair(in_model, out_model, in_word, out_sent[c], bi_alpha, rng, neu1e);
        }
    }

    /// One skip-gram update: the input word's embedding against the
    /// output word's layers (tree nodes under hierarchical softmax, the
    /// word row plus `negative` sampled rows under negative sampling).
    /// The models differ during cross-lingual steps: the input row lives
    /// in `in_model.syn0`, the output layers in `out_model`.
    #[allow(clippy::needless_range_loop)]
    fn skip_pair(
        &self,
        in_model: &LanguageModel,
        out_model: &LanguageModel,
        in_word: usize,
        out_word: usize,
        alpha: real,
        rng: &mut Rng,
        neu1e: &mut [real],
    ) {
        let dim = self.config.dim;
        let syn0 = in_model.syn0();
        let l1 = in_word * dim;
        neu1e.fill(0.0);

        if self.config.hs {
            let vw = out_model.vocab.word(out_word);
            let syn1 = out_model.syn1();
            for d in 0..vw.code.len() {
                let l2 = vw.point[d] as usize * dim;
                let mut f = 0.0;
                for c in 0..dim {
                    f += syn0[l1 + c].get() * syn1[l2 + c].get();
                }
                if f <= -MAX_EXP || f >= MAX_EXP {
                    continue;
                }
                let g = (1.0 - vw.code[d] as real - self.sigmoid.get(f)) * alpha;
                for c in 0..dim {
                    neu1e[c] += g * syn1[l2 + c].get();
                }
                for c in 0..dim {
                    syn1[l2 + c].add(g * syn0[l1 + c].get());
                }
            }
        }

        if self.config.negative > 0 {
            let syn1neg = out_model.syn1neg();
            for d in 0..self.config.negative + 1 {
                let (target, label) = if d == 0 {
                    (out_word, 1.0)
                } else {
                    let target = out_model.sample_negative(rng.rand_u64());
                    if target == out_word {
                        continue;
                    }
                    (target, 0.0)
                };
                let l2 = target * dim;
                let mut f = 0.0;
                for c in 0..dim {
                    f += syn0[l1 + c].get() * syn1neg[l2 + c].get();
                }
                let g = if f > MAX_EXP {
                    (label - 1.0) * alpha
                } else if f < -MAX_EXP {
                    label * alpha
                } else {
                    (label - self.sigmoid.get(f)) * alpha
                };
                for c in 0..dim {
                    neu1e[c] += g * syn1neg[l2 + c].get();
                }
                for c in 0..dim {
                    syn1neg[l2 + c].add(g * syn0[l1 + c].get());
                }
            }
        }

        for c in 0..dim {
            syn0[l1 + c].add(neu1e[c]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocab::Vocabulary;
    use std::io::Cursor;

    fn toy_model(text: &str, config: &Config) -> LanguageModel {
        let mut vocab = Vocabulary::new(1 << 16);
        vocab
            .learn_from_reader(&mut Cursor::new(text.as_bytes().to_vec()), None)
            .unwrap();
        vocab.finalize(1);
        LanguageModel::new("en".to_string(), vocab, config)
    }

    fn small_config() -> Config {
        Config {
            dim: 4,
            negative: 2,
            unigram_table_size: 1000,
            vocab_hash_size: 1 << 16,
            min_count: 1,
            sample: 0.0,
            debug: 0,
            ..Config::default()
        }
    }

    #[test]
    fn align_map_keeps_links_and_drops_out_of_range() {
        let map = build_align_map(&[(0, 1), (2, 0), (9, 0), (1, 9)], 4, 3);
        assert_eq!(map, vec![Some(1), None, Some(0), None]);
    }

    #[test]
    fn unaligned_position_is_inferred_from_neighbors() {
        let map = vec![Some(0), None, Some(4), None, None];
        assert_eq!(resolve_target(&map, 0), Some(0));
        // both neighbors aligned: averaged
        assert_eq!(resolve_target(&map, 1), Some(2));
        // one neighbor aligned: that link
        assert_eq!(resolve_target(&map, 3), Some(4));
        // no aligned neighbor: skipped
        assert_eq!(resolve_target(&map, 4), None);
    }

    #[test]
    fn uniform_mapping_is_proportional() {
        assert_eq!(uniform_target(0, 4, 8), 0);
        assert_eq!(uniform_target(2, 4, 8), 4);
        assert_eq!(uniform_target(3, 4, 8), 6);
        assert_eq!(uniform_target(5, 6, 3), 2);
    }

    #[test]
    fn alignment_lines_parse_as_position_pairs() {
        let mut r = Cursor::new(b"0 0 1 2 3 1\n\n5 5\n".to_vec());
        assert_eq!(
            read_alignment_links(&mut r).unwrap(),
            vec![(0, 0), (1, 2), (3, 1)]
        );
        assert_eq!(read_alignment_links(&mut r).unwrap(), vec![]);
        assert_eq!(read_alignment_links(&mut r).unwrap(), vec![(5, 5)]);
    }

    #[test]
    fn odd_alignment_field_count_is_an_error() {
        let mut r = Cursor::new(b"0 0 1\n".to_vec());
        assert!(read_alignment_links(&mut r).is_err());
    }

    #[test]
    fn load_sentence_maps_positions_and_counts_known_words() {
        let config = small_config();
        let model = toy_model("a b c\n", &config);
        let mut rng = Rng(1);
        let mut read = 0;

        let mut fin = Cursor::new(b"a z b\nc\n".to_vec());
        let sent = load_sentence(&model, 0.0, 100, &mut fin, &mut rng, &mut read).unwrap();
        assert_eq!(sent.orig_len(), 3);
        assert_eq!(sent.words.len(), 2);
        assert_eq!(sent.id_map, vec![Some(0), None, Some(1)]);
        assert_eq!(sent.known_words, 2);
        assert!(!sent.at_eof);
        // the unknown word and the sentence boundary are still read
        assert_eq!(read, 4);

        let sent = load_sentence(&model, 0.0, 100, &mut fin, &mut rng, &mut read).unwrap();
        assert_eq!(sent.words.len(), 1);
        assert!(!sent.at_eof);

        let sent = load_sentence(&model, 0.0, 100, &mut fin, &mut rng, &mut read).unwrap();
        assert!(sent.words.is_empty());
        assert!(sent.at_eof);
    }

    #[test]
    fn overlong_sentence_is_capped_without_desynchronizing_the_stream() {
        let config = small_config();
        let model = toy_model("a b c\n", &config);
        let mut rng = Rng(1);
        let mut read = 0;

        let mut text = "a ".repeat(MAX_SENTENCE_LENGTH + 50);
        text.push_str("\nb c\n");
        let mut fin = Cursor::new(text.into_bytes());

        let sent = load_sentence(&model, 0.0, 100, &mut fin, &mut rng, &mut read).unwrap();
        assert_eq!(sent.orig_len(), MAX_SENTENCE_LENGTH);
        assert_eq!(sent.words.len(), MAX_SENTENCE_LENGTH);
        // overflow tokens were consumed (and counted) but not kept
        assert_eq!(read, (MAX_SENTENCE_LENGTH + 50 + 1) as u64);

        // the next line starts cleanly at its first token
        let sent = load_sentence(&model, 0.0, 100, &mut fin, &mut rng, &mut read).unwrap();
        let b = model.vocab.lookup("b").unwrap();
        let c = model.vocab.lookup("c").unwrap();
        assert_eq!(sent.words, vec![b, c]);
        assert!(!sent.at_eof);
    }

    #[test]
    fn subsampling_counts_discarded_words_but_does_not_keep_them() {
        let config = small_config();
        let model = toy_model("a a a a b\n", &config);
        let mut rng = Rng(7);
        let mut read = 0;
        let mut fin = Cursor::new(b"a a a a b\n".to_vec());
        // an extremely low threshold discards almost everything
        let sent = load_sentence(&model, 1e-10, 6, &mut fin, &mut rng, &mut read).unwrap();
        assert_eq!(sent.known_words, 5);
        assert_eq!(sent.orig_len(), 5);
        let kept = sent.id_map.iter().flatten().count();
        assert_eq!(kept, sent.words.len());
        assert!(sent.words.len() < 5);
    }
}
