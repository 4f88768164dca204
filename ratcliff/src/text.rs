//! Character-level text diffing with semantic cleanup.
//!
//! The raw diff is computed with Myers' middle-snake bisection, sped up by
//! trimming common affixes and by splitting on a shared substring when one
//! covers at least half of the longer text. The raw script is then cleaned up
//! so that changes line up with word and sentence boundaries:
//!
//! ```text
//! "This list item has changed." -> "This list item has been lightly edited."
//!   = "This list item has "
//!   - "chang"
//!   + "been lightly edit"
//!   = "ed."
//! ```
//!
//! All positions are in Unicode scalar values, never bytes.

use rapidhash::RapidHashMap as HashMap;

use crate::tracing_macros::{debug, trace};

/// Operation of a [`Chunk`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkOp {
    /// Text present on both sides.
    Equal,
    /// Text only present in the old text.
    Delete,
    /// Text only present in the new text.
    Insert,
}

/// A span of a text diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// What happened to the span.
    pub op: ChunkOp,
    /// The span itself.
    pub text: String,
}

impl Chunk {
    /// Create a chunk.
    pub fn new(op: ChunkOp, text: impl Into<String>) -> Self {
        Self {
            op,
            text: text.into(),
        }
    }

    /// An unchanged span.
    pub fn equal(text: impl Into<String>) -> Self {
        Self::new(ChunkOp::Equal, text)
    }

    /// A deleted span.
    pub fn delete(text: impl Into<String>) -> Self {
        Self::new(ChunkOp::Delete, text)
    }

    /// An inserted span.
    pub fn insert(text: impl Into<String>) -> Self {
        Self::new(ChunkOp::Insert, text)
    }
}

/// Diff two texts and clean the result up for human consumption.
///
/// This is [`diff_main`] followed by [`cleanup_semantic`]. Concatenating the
/// `Equal` and `Delete` chunks yields `old`; `Equal` and `Insert` yield `new`.
pub fn diff_text(old: &str, new: &str) -> Vec<Chunk> {
    let old: Vec<char> = old.chars().collect();
    let new: Vec<char> = new.chars().collect();

    let mut edits = main(&old, &new, true);
    semantic(&mut edits);
    debug!(
        old_len = old.len(),
        new_len = new.len(),
        chunks = edits.len(),
        "diff_text"
    );
    into_chunks(edits)
}

/// Compute a minimal character diff, merged but not semantically cleaned.
///
/// Texts longer than 100 characters are first diffed line by line; only the
/// replaced lines are then diffed character by character.
pub fn diff_main(old: &str, new: &str) -> Vec<Chunk> {
    let old: Vec<char> = old.chars().collect();
    let new: Vec<char> = new.chars().collect();
    into_chunks(main(&old, &new, true))
}

/// Reduce the number of edits by eliminating semantically trivial equalities,
/// then shift the remaining edits onto natural boundaries.
pub fn cleanup_semantic(chunks: &mut Vec<Chunk>) {
    let mut edits = chunks.drain(..).map(Edit::from).collect();
    semantic(&mut edits);
    chunks.extend(into_chunks(edits));
}

/// Working representation: chunks over `char` buffers so that slicing is by
/// scalar value.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Edit {
    op: ChunkOp,
    text: Vec<char>,
}

impl Edit {
    fn new(op: ChunkOp, text: &[char]) -> Self {
        Self {
            op,
            text: text.to_vec(),
        }
    }
}

impl From<Chunk> for Edit {
    fn from(chunk: Chunk) -> Self {
        Self {
            op: chunk.op,
            text: chunk.text.chars().collect(),
        }
    }
}

fn into_chunks(edits: Vec<Edit>) -> Vec<Chunk> {
    edits
        .into_iter()
        .filter(|edit| !edit.text.is_empty())
        .map(|edit| Chunk {
            op: edit.op,
            text: edit.text.into_iter().collect(),
        })
        .collect()
}

fn concat(a: &[char], b: &[char]) -> Vec<char> {
    let mut out = Vec::with_capacity(a.len() + b.len());
    out.extend_from_slice(a);
    out.extend_from_slice(b);
    out
}

fn common_prefix(a: &[char], b: &[char]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

fn common_suffix(a: &[char], b: &[char]) -> usize {
    a.iter()
        .rev()
        .zip(b.iter().rev())
        .take_while(|(x, y)| x == y)
        .count()
}

/// Position of `needle` in `hay` at or after `from`.
fn find(hay: &[char], needle: &[char], from: usize) -> Option<usize> {
    if needle.is_empty() {
        return (from <= hay.len()).then_some(from);
    }
    if from >= hay.len() || needle.len() > hay.len() - from {
        return None;
    }
    hay[from..]
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|pos| pos + from)
}

/// Length of the longest suffix of `a` that is also a prefix of `b`.
fn common_overlap(a: &[char], b: &[char]) -> usize {
    let (a_len, b_len) = (a.len(), b.len());
    if a_len == 0 || b_len == 0 {
        return 0;
    }
    let a = if a_len > b_len { &a[a_len - b_len..] } else { a };
    let b = if a_len < b_len { &b[..a_len] } else { b };
    let len = a_len.min(b_len);
    if a == b {
        return len;
    }

    let mut best = 0;
    let mut length = 1;
    loop {
        let pattern = &a[len - length.min(len)..];
        let Some(found) = find(b, pattern, 0) else {
            return best;
        };
        length += found;
        if found == 0 || a[len - length..] == b[..length] {
            best = length;
            length += 1;
        }
    }
}

fn main(text1: &[char], text2: &[char], checklines: bool) -> Vec<Edit> {
    if text1 == text2 {
        if text1.is_empty() {
            return Vec::new();
        }
        return vec![Edit::new(ChunkOp::Equal, text1)];
    }

    let prefix = common_prefix(text1, text2);
    let (rest1, rest2) = (&text1[prefix..], &text2[prefix..]);
    let suffix = common_suffix(rest1, rest2);
    let mid1 = &rest1[..rest1.len() - suffix];
    let mid2 = &rest2[..rest2.len() - suffix];

    let mut edits = compute(mid1, mid2, checklines);
    if prefix > 0 {
        edits.insert(0, Edit::new(ChunkOp::Equal, &text1[..prefix]));
    }
    if suffix > 0 {
        edits.push(Edit::new(ChunkOp::Equal, &rest1[rest1.len() - suffix..]));
    }
    cleanup_merge(&mut edits);
    edits
}

/// Diff two texts that share no common prefix or suffix.
fn compute(text1: &[char], text2: &[char], checklines: bool) -> Vec<Edit> {
    if text1.is_empty() {
        return vec![Edit::new(ChunkOp::Insert, text2)];
    }
    if text2.is_empty() {
        return vec![Edit::new(ChunkOp::Delete, text1)];
    }

    let (long, short) = if text1.len() > text2.len() {
        (text1, text2)
    } else {
        (text2, text1)
    };

    if let Some(i) = find(long, short, 0) {
        // the shorter text sits inside the longer one
        let op = if text1.len() > text2.len() {
            ChunkOp::Delete
        } else {
            ChunkOp::Insert
        };
        return [
            Edit::new(op, &long[..i]),
            Edit::new(ChunkOp::Equal, short),
            Edit::new(op, &long[i + short.len()..]),
        ]
        .into_iter()
        .filter(|edit| !edit.text.is_empty())
        .collect();
    }

    if short.len() == 1 {
        // single character that is not in the other text
        return vec![
            Edit::new(ChunkOp::Delete, text1),
            Edit::new(ChunkOp::Insert, text2),
        ];
    }

    if let Some(hm) = half_match(text1, text2) {
        trace!(common = hm.common.len(), "half match");
        let mut edits = main(hm.text1_a, hm.text2_a, checklines);
        edits.push(Edit::new(ChunkOp::Equal, hm.common));
        edits.extend(main(hm.text1_b, hm.text2_b, checklines));
        return edits;
    }

    if checklines && text1.len() > LINE_MODE_THRESHOLD && text2.len() > LINE_MODE_THRESHOLD {
        return line_mode(text1, text2);
    }

    bisect(text1, text2)
}

/// Texts longer than this (in characters) get a line-level pass first.
const LINE_MODE_THRESHOLD: usize = 100;

/// Distinct lines the old text may introduce; the new text may use the rest.
const MAX_OLD_LINES: usize = 666_666;
const MAX_LINES: usize = 0x10_FFFF - 0x800;

/// Lines of both texts, each encoded as one `char` standing for its index.
struct LineEncoding {
    lines: Vec<Vec<char>>,
    index: HashMap<Vec<char>, usize>,
}

impl LineEncoding {
    fn new() -> Self {
        // index 0 is never handed out
        Self {
            lines: vec![Vec::new()],
            index: HashMap::default(),
        }
    }

    /// Encode `text` one line (newline included) per `char`. Once `max_lines`
    /// distinct lines exist, the remainder of the text becomes one last line.
    fn encode(&mut self, text: &[char], max_lines: usize) -> Vec<char> {
        let mut out = Vec::new();
        let mut start = 0;
        while start < text.len() {
            let mut end = text[start..]
                .iter()
                .position(|&c| c == '\n')
                .map_or(text.len(), |pos| start + pos + 1);
            let line = &text[start..end];

            let existing = self.index.get(line).copied();
            let idx = match existing {
                Some(idx) => idx,
                None => {
                    let line = if self.lines.len() == max_lines {
                        end = text.len();
                        &text[start..]
                    } else {
                        line
                    };
                    self.lines.push(line.to_vec());
                    self.index.insert(line.to_vec(), self.lines.len() - 1);
                    self.lines.len() - 1
                }
            };
            out.push(line_char(idx));
            start = end;
        }
        out
    }

    /// Expand encoded edits back into the lines they stand for.
    fn decode(&self, edits: &mut [Edit]) {
        for edit in edits {
            edit.text = edit
                .text
                .iter()
                .filter_map(|&c| self.lines.get(line_index(c)))
                .flatten()
                .copied()
                .collect();
        }
    }
}

/// Line indices skip the surrogate range so every index is a valid `char`.
fn line_char(idx: usize) -> char {
    let code = if idx < 0xD800 { idx } else { idx + 0x800 };
    u32::try_from(code)
        .ok()
        .and_then(char::from_u32)
        .unwrap_or(char::MAX)
}

fn line_index(c: char) -> usize {
    let code = c as usize;
    if code < 0xD800 { code } else { code - 0x800 }
}

/// Diff line by line, clean up, then diff each replaced block character by
/// character.
fn line_mode(text1: &[char], text2: &[char]) -> Vec<Edit> {
    let mut encoding = LineEncoding::new();
    let chars1 = encoding.encode(text1, MAX_OLD_LINES);
    let chars2 = encoding.encode(text2, MAX_LINES);
    trace!(lines = encoding.lines.len() - 1, "line mode");

    let mut edits = main(&chars1, &chars2, false);
    encoding.decode(&mut edits);
    semantic(&mut edits);

    let mut out = Vec::with_capacity(edits.len());
    let mut text_delete: Vec<char> = Vec::new();
    let mut text_insert: Vec<char> = Vec::new();
    let mut pending: Vec<Edit> = Vec::new();
    for edit in edits.into_iter().chain([Edit::new(ChunkOp::Equal, &[])]) {
        match edit.op {
            ChunkOp::Delete => {
                text_delete.extend_from_slice(&edit.text);
                pending.push(edit);
            }
            ChunkOp::Insert => {
                text_insert.extend_from_slice(&edit.text);
                pending.push(edit);
            }
            ChunkOp::Equal => {
                if !text_delete.is_empty() && !text_insert.is_empty() {
                    out.extend(main(&text_delete, &text_insert, false));
                    pending.clear();
                } else {
                    out.append(&mut pending);
                }
                text_delete.clear();
                text_insert.clear();
                out.push(edit);
            }
        }
    }
    out.retain(|edit| !edit.text.is_empty());
    out
}

#[derive(Debug, PartialEq)]
struct HalfMatch<'a> {
    text1_a: &'a [char],
    text1_b: &'a [char],
    text2_a: &'a [char],
    text2_b: &'a [char],
    common: &'a [char],
}

/// Pieces around a substring shared by `long` and `short`.
struct Split<'a> {
    long_a: &'a [char],
    long_b: &'a [char],
    short_a: &'a [char],
    short_b: &'a [char],
    common: &'a [char],
}

/// Do the texts share a substring at least half the length of the longer one?
///
/// The result may not be minimal, it trades optimality for speed.
fn half_match<'a>(text1: &'a [char], text2: &'a [char]) -> Option<HalfMatch<'a>> {
    let text1_longer = text1.len() > text2.len();
    let (long, short) = if text1_longer {
        (text1, text2)
    } else {
        (text2, text1)
    };
    if long.len() < 4 || short.len() * 2 < long.len() {
        return None;
    }

    // seeds at the second and third quarters of the longer text
    let hm1 = half_match_at(long, short, long.len().div_ceil(4));
    let hm2 = half_match_at(long, short, long.len().div_ceil(2));
    let split = match (hm1, hm2) {
        (None, None) => return None,
        (Some(split), None) | (None, Some(split)) => split,
        (Some(first), Some(second)) => {
            if first.common.len() > second.common.len() {
                first
            } else {
                second
            }
        }
    };

    Some(if text1_longer {
        HalfMatch {
            text1_a: split.long_a,
            text1_b: split.long_b,
            text2_a: split.short_a,
            text2_b: split.short_b,
            common: split.common,
        }
    } else {
        HalfMatch {
            text1_a: split.short_a,
            text1_b: split.short_b,
            text2_a: split.long_a,
            text2_b: split.long_b,
            common: split.common,
        }
    })
}

fn half_match_at<'a>(long: &'a [char], short: &'a [char], i: usize) -> Option<Split<'a>> {
    let seed = &long[i..i + long.len() / 4];
    let mut best: Option<Split<'a>> = None;
    let mut best_len = 0;

    let mut next = find(short, seed, 0);
    while let Some(j) = next {
        let prefix_len = common_prefix(&long[i..], &short[j..]);
        let suffix_len = common_suffix(&long[..i], &short[..j]);
        if best_len < prefix_len + suffix_len {
            best_len = prefix_len + suffix_len;
            best = Some(Split {
                long_a: &long[..i - suffix_len],
                long_b: &long[i + prefix_len..],
                short_a: &short[..j - suffix_len],
                short_b: &short[j + prefix_len..],
                common: &short[j - suffix_len..j + prefix_len],
            });
        }
        next = find(short, seed, j + 1);
    }

    best.filter(|split| split.common.len() * 2 >= long.len())
}

/// Myers' middle snake: walk the edit graph from both ends at once, and split
/// the problem where the two paths meet.
fn bisect(text1: &[char], text2: &[char]) -> Vec<Edit> {
    let len1 = text1.len() as isize;
    let len2 = text2.len() as isize;
    // both texts hold at least two characters here, so v has room for v_offset + 1
    let max_d = (len1 + len2 + 1) / 2;
    let v_offset = max_d;
    let v_length = 2 * max_d;
    let mut v1 = vec![-1isize; v_length as usize];
    let mut v2 = vec![-1isize; v_length as usize];
    v1[(v_offset + 1) as usize] = 0;
    v2[(v_offset + 1) as usize] = 0;

    let delta = len1 - len2;
    // with an odd delta the forward path detects the overlap
    let front = delta % 2 != 0;

    let mut k1_start = 0;
    let mut k1_end = 0;
    let mut k2_start = 0;
    let mut k2_end = 0;

    for d in 0..max_d {
        // forward path
        let mut k1 = -d + k1_start;
        let k1_stop = d + 1 - k1_end;
        while k1 < k1_stop {
            let k1_offset = (v_offset + k1) as usize;
            let mut x1 = if k1 == -d || (k1 != d && v1[k1_offset - 1] < v1[k1_offset + 1]) {
                v1[k1_offset + 1]
            } else {
                v1[k1_offset - 1] + 1
            };
            let mut y1 = x1 - k1;
            while x1 >= 0
                && y1 >= 0
                && x1 < len1
                && y1 < len2
                && text1[x1 as usize] == text2[y1 as usize]
            {
                x1 += 1;
                y1 += 1;
            }
            v1[k1_offset] = x1;
            if x1 > len1 {
                // ran off the right of the graph
                k1_end += 2;
            } else if y1 > len2 {
                // ran off the bottom of the graph
                k1_start += 2;
            } else if front {
                let k2_offset = v_offset + delta - k1;
                if k2_offset >= 0 && k2_offset < v_length && v2[k2_offset as usize] != -1 {
                    let x2 = len1 - v2[k2_offset as usize];
                    if x1 >= x2 {
                        return bisect_split(text1, text2, x1 as usize, y1 as usize);
                    }
                }
            }
            k1 += 2;
        }

        // reverse path
        let mut k2 = -d + k2_start;
        let k2_stop = d + 1 - k2_end;
        while k2 < k2_stop {
            let k2_offset = (v_offset + k2) as usize;
            let mut x2 = if k2 == -d || (k2 != d && v2[k2_offset - 1] < v2[k2_offset + 1]) {
                v2[k2_offset + 1]
            } else {
                v2[k2_offset - 1] + 1
            };
            let mut y2 = x2 - k2;
            while x2 >= 0
                && y2 >= 0
                && x2 < len1
                && y2 < len2
                && text1[(len1 - x2 - 1) as usize] == text2[(len2 - y2 - 1) as usize]
            {
                x2 += 1;
                y2 += 1;
            }
            v2[k2_offset] = x2;
            if x2 > len1 {
                k2_end += 2;
            } else if y2 > len2 {
                k2_start += 2;
            } else if !front {
                let k1_offset = v_offset + delta - k2;
                if k1_offset >= 0 && k1_offset < v_length && v1[k1_offset as usize] != -1 {
                    let x1 = v1[k1_offset as usize];
                    let y1 = v_offset + x1 - k1_offset;
                    if x1 >= len1 - x2 {
                        return bisect_split(text1, text2, x1 as usize, y1 as usize);
                    }
                }
            }
            k2 += 2;
        }
    }

    // no commonality at all
    vec![
        Edit::new(ChunkOp::Delete, text1),
        Edit::new(ChunkOp::Insert, text2),
    ]
}

fn bisect_split(text1: &[char], text2: &[char], x: usize, y: usize) -> Vec<Edit> {
    let mut edits = main(&text1[..x], &text2[..y], false);
    edits.extend(main(&text1[x..], &text2[y..], false));
    edits
}

/// Merge runs of like edits, factor common affixes out of delete/insert
/// pairs, and slide single edits sideways to absorb neighbouring equalities.
fn cleanup_merge(edits: &mut Vec<Edit>) {
    // sentinel equality so the last run gets flushed
    edits.push(Edit::new(ChunkOp::Equal, &[]));

    let mut pointer = 0;
    let mut count_delete = 0;
    let mut count_insert = 0;
    let mut text_delete: Vec<char> = Vec::new();
    let mut text_insert: Vec<char> = Vec::new();

    while pointer < edits.len() {
        match edits[pointer].op {
            ChunkOp::Insert => {
                count_insert += 1;
                text_insert.extend_from_slice(&edits[pointer].text);
                pointer += 1;
            }
            ChunkOp::Delete => {
                count_delete += 1;
                text_delete.extend_from_slice(&edits[pointer].text);
                pointer += 1;
            }
            ChunkOp::Equal => {
                let run = count_delete + count_insert;
                if run > 1 {
                    if count_delete != 0 && count_insert != 0 {
                        let common = common_prefix(&text_insert, &text_delete);
                        if common != 0 {
                            let before = pointer.checked_sub(run + 1);
                            match before {
                                Some(x) if edits[x].op == ChunkOp::Equal => {
                                    edits[x].text.extend_from_slice(&text_insert[..common]);
                                }
                                _ => {
                                    edits.insert(
                                        0,
                                        Edit::new(ChunkOp::Equal, &text_insert[..common]),
                                    );
                                    pointer += 1;
                                }
                            }
                            text_insert.drain(..common);
                            text_delete.drain(..common);
                        }

                        let common = common_suffix(&text_insert, &text_delete);
                        if common != 0 {
                            let tail = &text_insert[text_insert.len() - common..];
                            edits[pointer].text = concat(tail, &edits[pointer].text);
                            text_insert.truncate(text_insert.len() - common);
                            text_delete.truncate(text_delete.len() - common);
                        }
                    }

                    let mut merged = Vec::with_capacity(2);
                    if !text_delete.is_empty() {
                        merged.push(Edit::new(ChunkOp::Delete, &text_delete));
                    }
                    if !text_insert.is_empty() {
                        merged.push(Edit::new(ChunkOp::Insert, &text_insert));
                    }
                    pointer -= run;
                    let merged_len = merged.len();
                    edits.splice(pointer..pointer + run, merged);
                    pointer += merged_len + 1;
                } else if pointer != 0 && edits[pointer - 1].op == ChunkOp::Equal {
                    // two equalities in a row
                    let text = std::mem::take(&mut edits[pointer].text);
                    edits[pointer - 1].text.extend(text);
                    edits.remove(pointer);
                } else {
                    pointer += 1;
                }
                count_insert = 0;
                count_delete = 0;
                text_delete.clear();
                text_insert.clear();
            }
        }
    }
    if edits.last().is_some_and(|edit| edit.text.is_empty()) {
        edits.pop();
    }

    // A single edit surrounded by equalities can sometimes slide over one of
    // them entirely: A<ins>BA</ins>C -> <ins>AB</ins>AC
    let mut changes = false;
    let mut pointer = 1;
    while pointer + 1 < edits.len() {
        if edits[pointer - 1].op == ChunkOp::Equal && edits[pointer + 1].op == ChunkOp::Equal {
            let prev = edits[pointer - 1].text.clone();
            let next = edits[pointer + 1].text.clone();
            let current = &edits[pointer].text;
            if current.ends_with(&prev) {
                if !prev.is_empty() {
                    let shifted = concat(&prev, &current[..current.len() - prev.len()]);
                    edits[pointer].text = shifted;
                    edits[pointer + 1].text = concat(&prev, &next);
                }
                edits.remove(pointer - 1);
                changes = true;
            } else if current.starts_with(&next) {
                let shifted = concat(&current[next.len()..], &next);
                edits[pointer - 1].text.extend_from_slice(&next);
                edits[pointer].text = shifted;
                edits.remove(pointer + 1);
                changes = true;
            }
        }
        pointer += 1;
    }
    if changes {
        cleanup_merge(edits);
    }
}

fn semantic(edits: &mut Vec<Edit>) {
    let mut changes = false;
    // indices of equalities seen so far
    let mut equalities: Vec<usize> = Vec::new();
    let mut last_equality: Option<Vec<char>> = None;
    let mut pointer: isize = 0;
    // edit lengths before and after the last equality
    let mut insertions_before = 0;
    let mut deletions_before = 0;
    let mut insertions_after = 0;
    let mut deletions_after = 0;

    while (pointer as usize) < edits.len() {
        let at = pointer as usize;
        if edits[at].op == ChunkOp::Equal {
            equalities.push(at);
            insertions_before = insertions_after;
            deletions_before = deletions_after;
            insertions_after = 0;
            deletions_after = 0;
            last_equality = Some(edits[at].text.clone());
        } else {
            if edits[at].op == ChunkOp::Insert {
                insertions_after += edits[at].text.len();
            } else {
                deletions_after += edits[at].text.len();
            }

            // an equality no longer than the edits on either side of it
            let before = insertions_before.max(deletions_before);
            let after = insertions_after.max(deletions_after);
            let trivial = last_equality
                .take_if(|eq| !eq.is_empty() && eq.len() <= before && eq.len() <= after);
            if let (Some(equality), Some(&at_equality)) = (trivial, equalities.last()) {
                edits.insert(at_equality, Edit::new(ChunkOp::Delete, &equality));
                edits[at_equality + 1].op = ChunkOp::Insert;
                equalities.pop();
                // the previous equality needs to be reevaluated too
                equalities.pop();
                pointer = equalities.last().map_or(-1, |&i| i as isize);
                insertions_before = 0;
                deletions_before = 0;
                insertions_after = 0;
                deletions_after = 0;
                changes = true;
            }
        }
        pointer += 1;
    }

    if changes {
        cleanup_merge(edits);
    }
    cleanup_semantic_lossless(edits);
    extract_overlaps(edits);
}

/// Turn `<del>abcxxx</del><ins>xxxdef</ins>` into
/// `<del>abc</del>xxx<ins>def</ins>` when the overlap is at least half of
/// either edit.
fn extract_overlaps(edits: &mut Vec<Edit>) {
    let mut pointer = 1;
    while pointer < edits.len() {
        if edits[pointer - 1].op == ChunkOp::Delete && edits[pointer].op == ChunkOp::Insert {
            let deletion = edits[pointer - 1].text.clone();
            let insertion = edits[pointer].text.clone();
            let overlap1 = common_overlap(&deletion, &insertion);
            let overlap2 = common_overlap(&insertion, &deletion);
            if overlap1 >= overlap2 {
                if overlap1 * 2 >= deletion.len() || overlap1 * 2 >= insertion.len() {
                    edits.insert(
                        pointer,
                        Edit::new(ChunkOp::Equal, &insertion[..overlap1]),
                    );
                    edits[pointer - 1].text = deletion[..deletion.len() - overlap1].to_vec();
                    edits[pointer + 1].text = insertion[overlap1..].to_vec();
                    pointer += 1;
                }
            } else if overlap2 * 2 >= deletion.len() || overlap2 * 2 >= insertion.len() {
                // reverse overlap: swap the edits around the shared text
                edits.insert(
                    pointer,
                    Edit::new(ChunkOp::Equal, &deletion[..overlap2]),
                );
                edits[pointer - 1] = Edit::new(
                    ChunkOp::Insert,
                    &insertion[..insertion.len() - overlap2],
                );
                edits[pointer + 1] = Edit::new(ChunkOp::Delete, &deletion[overlap2..]);
                pointer += 1;
            }
            pointer += 1;
        }
        pointer += 1;
    }
}

/// Slide single edits surrounded by equalities so that their edges fall on
/// the best-scoring boundaries: `The c<ins>at c</ins>ame.` becomes
/// `The <ins>cat </ins>came.`
fn cleanup_semantic_lossless(edits: &mut Vec<Edit>) {
    let mut pointer = 1;
    while pointer + 1 < edits.len() {
        if edits[pointer - 1].op == ChunkOp::Equal && edits[pointer + 1].op == ChunkOp::Equal {
            let mut equality1 = edits[pointer - 1].text.clone();
            let mut edit = edits[pointer].text.clone();
            let mut equality2 = edits[pointer + 1].text.clone();

            // shift the edit as far left as possible first
            let offset = common_suffix(&equality1, &edit);
            if offset > 0 {
                let common = edit[edit.len() - offset..].to_vec();
                equality1.truncate(equality1.len() - offset);
                edit = concat(&common, &edit[..edit.len() - offset]);
                equality2 = concat(&common, &equality2);
            }

            // then step right one character at a time, keeping the best fit
            let mut best_equality1 = equality1.clone();
            let mut best_edit = edit.clone();
            let mut best_equality2 = equality2.clone();
            let mut best_score =
                boundary_score(&equality1, &edit) + boundary_score(&edit, &equality2);
            while !edit.is_empty() && !equality2.is_empty() && edit[0] == equality2[0] {
                let c = edit.remove(0);
                equality1.push(c);
                edit.push(equality2.remove(0));
                let score = boundary_score(&equality1, &edit) + boundary_score(&edit, &equality2);
                // >= so that edits end up as far right as possible
                if score >= best_score {
                    best_score = score;
                    best_equality1 = equality1.clone();
                    best_edit = edit.clone();
                    best_equality2 = equality2.clone();
                }
            }

            if edits[pointer - 1].text != best_equality1 {
                if best_equality1.is_empty() {
                    edits.remove(pointer - 1);
                    pointer -= 1;
                } else {
                    edits[pointer - 1].text = best_equality1;
                }
                edits[pointer].text = best_edit;
                if best_equality2.is_empty() {
                    edits.remove(pointer + 1);
                    pointer = pointer.saturating_sub(1);
                } else {
                    edits[pointer + 1].text = best_equality2;
                }
            }
        }
        pointer += 1;
    }
}

/// How good a place is the boundary between `one` and `two` for an edit edge?
///
/// 6 at the edge of the text, 5 at a blank line, 4 at a line break, 3 at the
/// end of a sentence, 2 at whitespace, 1 at other punctuation, 0 mid-word.
fn boundary_score(one: &[char], two: &[char]) -> u8 {
    let (Some(&c1), Some(&c2)) = (one.last(), two.first()) else {
        return 6;
    };

    let non_alnum1 = !c1.is_alphanumeric();
    let non_alnum2 = !c2.is_alphanumeric();
    let whitespace1 = non_alnum1 && c1.is_whitespace();
    let whitespace2 = non_alnum2 && c2.is_whitespace();
    let line_break1 = whitespace1 && (c1 == '\r' || c1 == '\n');
    let line_break2 = whitespace2 && (c2 == '\r' || c2 == '\n');
    let blank_line1 = line_break1 && (one.ends_with(&['\n', '\n']) || one.ends_with(&['\n', '\r', '\n']));
    let blank_line2 = line_break2 && starts_with_blank_line(two);

    if blank_line1 || blank_line2 {
        5
    } else if line_break1 || line_break2 {
        4
    } else if non_alnum1 && !whitespace1 && whitespace2 {
        3
    } else if whitespace1 || whitespace2 {
        2
    } else if non_alnum1 || non_alnum2 {
        1
    } else {
        0
    }
}

/// `^\r?\n\r?\n`
fn starts_with_blank_line(text: &[char]) -> bool {
    let mut rest = text;
    for _ in 0..2 {
        if rest.first() == Some(&'\r') {
            rest = &rest[1..];
        }
        if rest.first() != Some(&'\n') {
            return false;
        }
        rest = &rest[1..];
    }
    true
}
