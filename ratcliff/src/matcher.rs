//! Ratcliff/Obershelp sequence matching.
//!
//! Finds the longest contiguous matching block between two sequences, then
//! recurses on the pieces to its left and right. The resulting blocks are
//! turned into opcodes that classify every span of both sequences as equal,
//! replaced, deleted or inserted.
//!
//! The block selection is greedy: the longest block wins even when a shorter
//! block elsewhere would produce a smaller edit script. Callers that align
//! document nodes rely on exactly this behavior.

use crate::tracing_macros::trace;
use core::hash::Hash;
use core::ops::Range;
use rapidhash::RapidHashMap as HashMap;

/// Configuration for [`SequenceMatcher`].
#[derive(Debug, Clone)]
pub struct MatcherConfig {
    /// Ignore very common elements of the second sequence when seeding matches.
    ///
    /// Only kicks in when the second sequence has at least 200 elements. An
    /// element is "popular" if it accounts for more than 1% of the sequence.
    /// Popular elements can still extend a match, they just never start one.
    pub autojunk: bool,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self { autojunk: true }
    }
}

impl MatcherConfig {
    /// Create the default configuration (autojunk enabled).
    pub fn new() -> Self {
        Self::default()
    }

    /// Disable the popular-element heuristic.
    pub fn without_autojunk(mut self) -> Self {
        self.autojunk = false;
        self
    }
}

/// A matching block: `a[a_start..a_start + size] == b[b_start..b_start + size]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Match {
    /// Start of the block in the first sequence.
    pub a_start: usize,
    /// Start of the block in the second sequence.
    pub b_start: usize,
    /// Number of matching elements.
    pub size: usize,
}

/// Classification of an aligned span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpTag {
    /// `a[a] == b[b]`
    Equal,
    /// `a[a]` should be replaced by `b[b]`
    Replace,
    /// `a[a]` should be deleted (`b` is empty)
    Delete,
    /// `b[b]` should be inserted (`a` is empty)
    Insert,
}

/// One span of an alignment between two sequences.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opcode {
    /// What happened to this span.
    pub tag: OpTag,
    /// Covered range in the first sequence.
    pub a: Range<usize>,
    /// Covered range in the second sequence.
    pub b: Range<usize>,
}

impl Opcode {
    fn new(tag: OpTag, a: Range<usize>, b: Range<usize>) -> Self {
        Self { tag, a, b }
    }
}

/// Aligns two sequences of hashable elements.
pub struct SequenceMatcher<'a, T> {
    a: &'a [T],
    b: &'a [T],
    /// For every element of `b`, the ascending list of positions where it occurs.
    b2j: HashMap<&'a T, Vec<usize>>,
}

impl<'a, T> SequenceMatcher<'a, T>
where
    T: Eq + Hash,
{
    /// Create a matcher with the default configuration.
    pub fn new(a: &'a [T], b: &'a [T]) -> Self {
        Self::with_config(a, b, &MatcherConfig::default())
    }

    /// Create a matcher with an explicit configuration.
    pub fn with_config(a: &'a [T], b: &'a [T], config: &MatcherConfig) -> Self {
        let mut b2j: HashMap<&'a T, Vec<usize>> = HashMap::default();
        for (j, elt) in b.iter().enumerate() {
            b2j.entry(elt).or_default().push(j);
        }

        let n = b.len();
        if config.autojunk && n >= 200 {
            let ntest = n / 100 + 1;
            #[cfg(feature = "tracing")]
            let before = b2j.len();
            b2j.retain(|_, positions| positions.len() <= ntest);
            trace!(popular = before - b2j.len(), "dropped popular elements");
        }

        Self { a, b, b2j }
    }

    /// Find the longest matching block in `a[alo..ahi]` and `b[blo..bhi]`.
    ///
    /// Among blocks of maximal size, returns the one that starts earliest in
    /// `a`, and of those the one that starts earliest in `b`. A size of zero
    /// means nothing matched.
    pub fn find_longest_match(&self, alo: usize, ahi: usize, blo: usize, bhi: usize) -> Match {
        let (a, b) = (self.a, self.b);
        let mut best_i = alo;
        let mut best_j = blo;
        let mut best_size = 0;

        // j2len[j] = length of the longest match ending at a[i - 1] and b[j]
        let mut j2len: HashMap<usize, usize> = HashMap::default();
        for (i, elt) in a.iter().enumerate().take(ahi).skip(alo) {
            let mut new_j2len: HashMap<usize, usize> = HashMap::default();
            if let Some(positions) = self.b2j.get(elt) {
                for &j in positions {
                    if j < blo {
                        continue;
                    }
                    if j >= bhi {
                        break;
                    }
                    let k = j
                        .checked_sub(1)
                        .and_then(|prev| j2len.get(&prev))
                        .copied()
                        .unwrap_or(0)
                        + 1;
                    new_j2len.insert(j, k);
                    if k > best_size {
                        best_i = i + 1 - k;
                        best_j = j + 1 - k;
                        best_size = k;
                    }
                }
            }
            j2len = new_j2len;
        }

        // Popular elements never seed a match, but they may still extend one.
        while best_i > alo && best_j > blo && a[best_i - 1] == b[best_j - 1] {
            best_i -= 1;
            best_j -= 1;
            best_size += 1;
        }
        while best_i + best_size < ahi
            && best_j + best_size < bhi
            && a[best_i + best_size] == b[best_j + best_size]
        {
            best_size += 1;
        }

        Match {
            a_start: best_i,
            b_start: best_j,
            size: best_size,
        }
    }

    /// All matching blocks, sorted and with adjacent blocks merged.
    ///
    /// The last entry is always the sentinel `(a.len(), b.len(), 0)`.
    pub fn matching_blocks(&self) -> Vec<Match> {
        let (la, lb) = (self.a.len(), self.b.len());

        let mut queue = vec![(0, la, 0, lb)];
        let mut blocks = Vec::new();
        while let Some((alo, ahi, blo, bhi)) = queue.pop() {
            let m = self.find_longest_match(alo, ahi, blo, bhi);
            if m.size == 0 {
                continue;
            }
            blocks.push(m);
            if alo < m.a_start && blo < m.b_start {
                queue.push((alo, m.a_start, blo, m.b_start));
            }
            if m.a_start + m.size < ahi && m.b_start + m.size < bhi {
                queue.push((m.a_start + m.size, ahi, m.b_start + m.size, bhi));
            }
        }
        blocks.sort();

        let mut merged: Vec<Match> = Vec::with_capacity(blocks.len() + 1);
        for block in blocks {
            match merged.last_mut() {
                Some(last)
                    if last.a_start + last.size == block.a_start
                        && last.b_start + last.size == block.b_start =>
                {
                    last.size += block.size;
                }
                _ => merged.push(block),
            }
        }
        merged.push(Match {
            a_start: la,
            b_start: lb,
            size: 0,
        });
        merged
    }

    /// Opcodes describing how to turn `a` into `b`.
    ///
    /// The `a` ranges of the returned opcodes partition `0..a.len()` and the
    /// `b` ranges partition `0..b.len()`, in order, with no gaps.
    pub fn opcodes(&self) -> Vec<Opcode> {
        let mut i = 0;
        let mut j = 0;
        let mut ops = Vec::new();

        for m in self.matching_blocks() {
            let tag = if i < m.a_start && j < m.b_start {
                Some(OpTag::Replace)
            } else if i < m.a_start {
                Some(OpTag::Delete)
            } else if j < m.b_start {
                Some(OpTag::Insert)
            } else {
                None
            };
            if let Some(tag) = tag {
                ops.push(Opcode::new(tag, i..m.a_start, j..m.b_start));
            }

            i = m.a_start + m.size;
            j = m.b_start + m.size;
            if m.size > 0 {
                ops.push(Opcode::new(OpTag::Equal, m.a_start..i, m.b_start..j));
            }
        }

        trace!(count = ops.len(), "opcodes");
        ops
    }

    /// Similarity in `[0, 1]`: twice the matched elements over the total length.
    pub fn ratio(&self) -> f64 {
        let total = self.a.len() + self.b.len();
        if total == 0 {
            return 1.0;
        }
        let matches: usize = self.matching_blocks().iter().map(|m| m.size).sum();
        2.0 * matches as f64 / total as f64
    }
}

/// Convenience: opcodes for two slices with the default configuration.
pub fn opcodes<T: Eq + Hash>(a: &[T], b: &[T]) -> Vec<Opcode> {
    SequenceMatcher::new(a, b).opcodes()
}
