//! Huffman coding of the vocabulary for hierarchical softmax.
//!
//! Builds a binary tree over the word counts so that frequent words get
//! short codes. Because the vocabulary arrives sorted by descending count
//! and merged-node weights are monotonically non-decreasing, the two
//! smallest unmerged weights can always be found by comparing two scan
//! pointers (one over remaining leaves, one over finished internal nodes)
//! with no priority queue.

use crate::vocab::VocabWord;

/// Assigns a Huffman `code` and tree-node `point` path to every word.
/// `words` must be in finalized vocabulary order: the sentinel at index 0,
/// everything after it sorted by descending count.
///
/// `point[0]` is always the root (internal index `V - 2`), and `code[d]`
/// is the branch taken at `point[d]`; the heavier-leaning child of each
/// merge carries bit 1.
#[allow(clippy::needless_range_loop)]
pub fn assign_codes(words: &mut [VocabWord]) {
    let vocab_size = words.len();
    if vocab_size < 2 {
        return;
    }

    let mut count = vec![0u64; vocab_size * 2 + 1];
    let mut binary = vec![0u8; vocab_size * 2 + 1]; // which child a node is of its parent (0 or 1)
    let mut parent_node = vec![0usize; vocab_size * 2 + 1];

    for a in 0..vocab_size {
        count[a] = words[a].count;
    }
    for a in vocab_size..(vocab_size * 2) {
        count[a] = 1_000_000_000_000_000;
    }

    let mut pos1 = vocab_size;
    let mut pos2 = vocab_size;
    // Constructs the tree by adding one internal node at a time.
    for a in 0..(vocab_size - 1) {
        // First, find two smallest nodes 'min1, min2'
        let min1i;
        if pos1 > 0 && count[pos1 - 1] < count[pos2] {
            pos1 -= 1;
            min1i = pos1;
        } else {
            min1i = pos2;
            pos2 += 1;
        }

        let min2i;
        if pos1 > 0 && count[pos1 - 1] < count[pos2] {
            pos1 -= 1;
            min2i = pos1;
        } else {
            min2i = pos2;
            pos2 += 1;
        }

        count[vocab_size + a] = count[min1i] + count[min2i];
        parent_node[min1i] = vocab_size + a;
        parent_node[min2i] = vocab_size + a;
        binary[min2i] = 1;
    }

    // Walk leaf -> root collecting bits and internal-node indices, then
    // reverse so both are stored root -> leaf. Internal indices are
    // shifted down by vocab_size; the root itself is index vocab_size - 2.
    for a in 0..vocab_size {
        let mut code: Vec<u8> = vec![];
        let mut point: Vec<u32> = vec![];
        let mut b = a;
        loop {
            if !code.is_empty() {
                point.push((b - vocab_size) as u32);
            }
            code.push(binary[b]);
            b = parent_node[b];
            if b == vocab_size * 2 - 2 {
                break;
            }
        }
        code.reverse();
        words[a].code = code;
        point.push((vocab_size - 2) as u32);
        point.reverse();
        words[a].point = point;
    }
}
