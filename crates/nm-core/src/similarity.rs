//! Sequence-alignment similarity between two strings.
//!
//! Ratcliff/Obershelp "gestalt" matching: take the longest common block,
//! recurse into the unmatched text on both sides of it, and score
//! `2·M / (|a| + |b|)` where M is the number of matched characters.
//! Lengths are counted in Unicode scalar values, not bytes.

use std::collections::HashMap;

/// Similarity ratio in [0, 1]. Symmetric, and 1.0 only for identical input.
///
/// Two empty strings are identical and score 1.0; an empty string against
/// anything else scores 0.0.
pub fn similarity(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();

    // Tie-breaking in the block search favours the first argument, so run
    // both orders and keep the larger total.
    let matched = matched_chars(&a, &b).max(matched_chars(&b, &a));
    2.0 * matched as f64 / total as f64
}

/// Total size of the matching blocks between `a` and `b`.
fn matched_chars(a: &[char], b: &[char]) -> usize {
    let mut b_index: HashMap<char, Vec<usize>> = HashMap::new();
    for (j, c) in b.iter().enumerate() {
        b_index.entry(*c).or_default().push(j);
    }

    let mut matched = 0;
    let mut pending = vec![(0, a.len(), 0, b.len())];
    while let Some((a_lo, a_hi, b_lo, b_hi)) = pending.pop() {
        let (i, j, size) = longest_block(a, &b_index, a_lo, a_hi, b_lo, b_hi);
        if size == 0 {
            continue;
        }
        matched += size;
        if a_lo < i && b_lo < j {
            pending.push((a_lo, i, b_lo, j));
        }
        if i + size < a_hi && j + size < b_hi {
            pending.push((i + size, a_hi, j + size, b_hi));
        }
    }
    matched
}

/// Longest common block within `a[a_lo..a_hi]` and `b[b_lo..b_hi]`.
///
/// Returns `(i, j, size)`; among equally long blocks the one starting
/// earliest in `a` wins, then earliest in `b`.
fn longest_block(
    a: &[char],
    b_index: &HashMap<char, Vec<usize>>,
    a_lo: usize,
    a_hi: usize,
    b_lo: usize,
    b_hi: usize,
) -> (usize, usize, usize) {
    let (mut best_i, mut best_j, mut best_size) = (a_lo, b_lo, 0);
    // run length of the block ending at b[j], for the previous row of a
    let mut run_at: HashMap<usize, usize> = HashMap::new();

    for (i, c) in a.iter().enumerate().take(a_hi).skip(a_lo) {
        let mut next_run_at = HashMap::new();
        if let Some(positions) = b_index.get(c) {
            for &j in positions {
                if j < b_lo {
                    continue;
                }
                if j >= b_hi {
                    break;
                }
                let run = j
                    .checked_sub(1)
                    .and_then(|prev| run_at.get(&prev))
                    .copied()
                    .unwrap_or(0)
                    + 1;
                next_run_at.insert(j, run);
                if run > best_size {
                    best_i = i + 1 - run;
                    best_j = j + 1 - run;
                    best_size = run;
                }
            }
        }
        run_at = next_run_at;
    }

    (best_i, best_j, best_size)
}
