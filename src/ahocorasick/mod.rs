//! Multi-pattern byte matcher with failure links (spec.md §4.1/C2).
//!
//! This is a from-scratch Aho-Corasick automaton rather than a dependency on
//! the `aho-corasick` crate: the carving engine's signature-matching stage
//! is one of the three hard subsystems this crate exists to implement
//! (spec.md §2), so the trie/failure-link construction lives here.

use std::collections::VecDeque;

const ROOT: u32 = 0;

#[derive(Debug, Clone, Default)]
struct Node {
    /// Goto transitions, indexed by byte value.
    children: [Option<u32>; 256],
    /// Failure link.
    fail: u32,
    /// Pattern ids that complete at this node, including everything reached
    /// transitively via failure links (so search doesn't need to walk the
    /// failure chain at match time).
    output: Vec<u32>,
}

impl Node {
    fn new() -> Self {
        Self {
            children: [None; 256],
            fail: ROOT,
            output: Vec::new(),
        }
    }
}

/// A single reported match: the id of the pattern that matched, and the
/// absolute offset (relative to the caller-supplied base) at which it
/// started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match {
    pub pattern_index: u32,
    pub position: u64,
}

/// A built Aho-Corasick automaton over a fixed set of byte patterns.
///
/// Patterns are referenced by index into the slice passed to [`AhoCorasick::build`];
/// callers map `pattern_index` back to their own identifiers (e.g. signature
/// ids) since multiple signatures may share a pattern index space.
pub struct AhoCorasick {
    nodes: Vec<Node>,
    max_pattern_len: usize,
}

impl AhoCorasick {
    /// Builds the trie and failure links for `patterns`. Patterns are
    /// matched by their position in the slice (`pattern_index` in
    /// [`Match`]); empty patterns are ignored.
    pub fn build(patterns: &[impl AsRef<[u8]>]) -> Self {
        let mut nodes = vec![Node::new()];
        let mut max_pattern_len = 0usize;

        for (idx, pattern) in patterns.iter().enumerate() {
            let pattern = pattern.as_ref();
            if pattern.is_empty() {
                continue;
            }
            max_pattern_len = max_pattern_len.max(pattern.len());

            let mut cur = ROOT;
            for &byte in pattern {
                cur = match nodes[cur as usize].children[byte as usize] {
                    Some(next) => next,
                    None => {
                        nodes.push(Node::new());
                        let next = (nodes.len() - 1) as u32;
                        nodes[cur as usize].children[byte as usize] = Some(next);
                        next
                    }
                };
            }
            nodes[cur as usize].output.push(idx as u32);
        }

        let mut automaton = Self {
            nodes,
            max_pattern_len,
        };
        automaton.build_failure_links();
        automaton
    }

    /// Length of the longest pattern, used by [`Self::search_chunked`] to
    /// size the overlap between chunks.
    pub fn max_pattern_len(&self) -> usize {
        self.max_pattern_len
    }

    fn build_failure_links(&mut self) {
        let mut queue = VecDeque::new();

        // Depth-1 nodes fail to root by definition.
        for byte in 0..256usize {
            if let Some(child) = self.nodes[ROOT as usize].children[byte] {
                self.nodes[child as usize].fail = ROOT;
                queue.push_back(child);
            }
        }

        while let Some(node_idx) = queue.pop_front() {
            // Snapshot children so we can mutate `self.nodes` freely below.
            let children: Vec<(usize, u32)> = self.nodes[node_idx as usize]
                .children
                .iter()
                .enumerate()
                .filter_map(|(b, c)| c.map(|c| (b, c)))
                .collect();

            for (byte, child) in children {
                queue.push_back(child);

                // `node_idx`'s fail link has strictly smaller depth and was
                // already resolved earlier in this BFS, so following goto
                // from it (falling back through fail links, eventually to
                // root) gives the correct fail target for `child`.
                let node_fail = self.nodes[node_idx as usize].fail;
                let fail_target = self.goto(node_fail, byte as u8);

                self.nodes[child as usize].fail = fail_target;

                let inherited = self.nodes[fail_target as usize].output.clone();
                self.nodes[child as usize].output.extend(inherited);
            }
        }
    }

    fn goto(&self, mut state: u32, byte: u8) -> u32 {
        loop {
            if let Some(next) = self.nodes[state as usize].children[byte as usize] {
                return next;
            }
            if state == ROOT {
                return ROOT;
            }
            state = self.nodes[state as usize].fail;
        }
    }

    /// Searches `data` for every pattern occurrence, reporting absolute
    /// positions as `base_offset + position_in_data`.
    ///
    /// All matches at an offset are reported (overlapping patterns are not
    /// deduplicated here — the carving engine dedups by absolute offset,
    /// keeping the first-seen, per spec.md §4.1).
    pub fn search(&self, data: &[u8], base_offset: u64) -> Vec<Match> {
        let mut matches = Vec::new();
        let mut state = ROOT;

        for (i, &byte) in data.iter().enumerate() {
            state = self.goto(state, byte);
            for &pattern_index in &self.nodes[state as usize].output {
                // We don't track pattern length here; callers that need the
                // start offset derive it from the pattern bytes themselves.
                // `position` marks the END of the match (i), so compute a
                // start once the caller resolves pattern length; for this
                // crate every caller already has the pattern bytes at hand
                // via the index, so we report the match start directly.
                matches.push(Match {
                    pattern_index,
                    position: base_offset + i as u64,
                });
            }
        }

        matches
    }

    /// Scans a (possibly huge) memory-mapped buffer in chunks, carrying
    /// enough overlap (`max_pattern_len - 1` bytes) between chunks that a
    /// pattern spanning a chunk boundary is still reported exactly once, by
    /// a single chunk (spec.md §4.1, property P1).
    pub fn search_chunked(
        &self,
        data: &[u8],
        chunk_size: usize,
        pattern_lens: &[usize],
    ) -> Vec<Match> {
        let overlap = self.max_pattern_len.saturating_sub(1);
        let mut all_matches = Vec::new();
        let mut chunk_start = 0usize;

        while chunk_start < data.len() {
            let window_end = (chunk_start + chunk_size + overlap).min(data.len());
            let window = &data[chunk_start..window_end];
            let segment_end = (chunk_start + chunk_size) as u64;

            for m in self.search(window, chunk_start as u64) {
                // The match position reported by `search` is the END of the
                // match; recover the start so segment membership is judged
                // on the same point a monolithic search would use.
                let len = pattern_lens
                    .get(m.pattern_index as usize)
                    .copied()
                    .unwrap_or(1);
                let start = m.position + 1 - len as u64;

                let is_last_chunk = window_end == data.len();
                if start < segment_end || is_last_chunk {
                    all_matches.push(Match {
                        pattern_index: m.pattern_index,
                        position: start,
                    });
                }
            }

            chunk_start += chunk_size;
        }

        all_matches
    }
}
