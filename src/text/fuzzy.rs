//! Fuzzy partial matching.
//!
//! The score follows the classic "partial ratio": matching blocks between the
//! alias and the text anchor windows of the text the size of the alias, each
//! window is scored with the Ratcliff/Obershelp ratio, and the best window
//! wins. The trailing sentinel block anchors the window at the end of the
//! text.

use std::collections::HashMap;

/// Scores how well `needle` appears somewhere inside `haystack` (0-100)
pub trait FuzzyMatcher: Send + Sync {
    fn partial_score(&self, needle: &str, haystack: &str) -> u8;
}

/// Partial-ratio matcher over Unicode scalar values
#[derive(Debug, Clone, Copy, Default)]
pub struct PartialRatio;

impl PartialRatio {
    pub fn new() -> Self {
        Self
    }
}

impl FuzzyMatcher for PartialRatio {
    fn partial_score(&self, needle: &str, haystack: &str) -> u8 {
        let a: Vec<char> = needle.chars().collect();
        let b: Vec<char> = haystack.chars().collect();
        if a.is_empty() || b.is_empty() {
            return 0;
        }

        let (shorter, longer) = if a.len() <= b.len() { (a, b) } else { (b, a) };

        let matcher = SequenceMatcher::new(&shorter, &longer);
        let mut best = 0.0f64;
        for block in matcher.matching_blocks() {
            let long_start = block.b.saturating_sub(block.a);
            let long_end = (long_start + shorter.len()).min(longer.len());
            let window = &longer[long_start..long_end];

            let r = ratio(&shorter, window);
            if r > 0.995 {
                return 100;
            }
            best = best.max(r);
        }

        (best * 100.0).round_ties_even() as u8
    }
}

/// Ratcliff/Obershelp similarity in [0, 1]
pub fn ratio(a: &[char], b: &[char]) -> f64 {
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    let matches: usize = SequenceMatcher::new(a, b)
        .matching_blocks()
        .iter()
        .map(|m| m.size)
        .sum();
    2.0 * matches as f64 / total as f64
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Match {
    a: usize,
    b: usize,
    size: usize,
}

/// Longest-common-block matcher without junk heuristics
struct SequenceMatcher<'s> {
    a: &'s [char],
    b: &'s [char],
    b2j: HashMap<char, Vec<usize>>,
}

impl<'s> SequenceMatcher<'s> {
    fn new(a: &'s [char], b: &'s [char]) -> Self {
        let mut b2j: HashMap<char, Vec<usize>> = HashMap::new();
        for (j, c) in b.iter().enumerate() {
            b2j.entry(*c).or_default().push(j);
        }
        Self { a, b, b2j }
    }

    fn find_longest_match(&self, alo: usize, ahi: usize, blo: usize, bhi: usize) -> Match {
        let mut best = Match { a: alo, b: blo, size: 0 };
        let mut j2len: HashMap<usize, usize> = HashMap::new();

        for i in alo..ahi {
            let mut next_j2len = HashMap::new();
            if let Some(indices) = self.b2j.get(&self.a[i]) {
                for &j in indices {
                    if j < blo {
                        continue;
                    }
                    if j >= bhi {
                        break;
                    }
                    let k = j.checked_sub(1).and_then(|p| j2len.get(&p)).copied().unwrap_or(0) + 1;
                    next_j2len.insert(j, k);
                    if k > best.size {
                        best = Match {
                            a: i + 1 - k,
                            b: j + 1 - k,
                            size: k,
                        };
                    }
                }
            }
            j2len = next_j2len;
        }

        best
    }

    /// Non-overlapping matching blocks in order, adjacent blocks merged.
    /// The last block is always the empty `(len(a), len(b))` sentinel.
    fn matching_blocks(&self) -> Vec<Match> {
        let mut queue = vec![(0, self.a.len(), 0, self.b.len())];
        let mut blocks = Vec::new();

        while let Some((alo, ahi, blo, bhi)) = queue.pop() {
            let m = self.find_longest_match(alo, ahi, blo, bhi);
            if m.size == 0 {
                continue;
            }
            if alo < m.a && blo < m.b {
                queue.push((alo, m.a, blo, m.b));
            }
            if m.a + m.size < ahi && m.b + m.size < bhi {
                queue.push((m.a + m.size, ahi, m.b + m.size, bhi));
            }
            blocks.push(m);
        }
        blocks.sort_by_key(|m| (m.a, m.b));

        let mut merged: Vec<Match> = Vec::with_capacity(blocks.len());
        for m in blocks {
            if let Some(last) = merged.last_mut() {
                if last.a + last.size == m.a && last.b + last.size == m.b {
                    last.size += m.size;
                    continue;
                }
            }
            merged.push(m);
        }
        merged.push(Match {
            a: self.a.len(),
            b: self.b.len(),
            size: 0,
        });
        merged
    }
}
