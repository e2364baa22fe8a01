//! PageRank-style importance ranking over the inter-word graph.
//!
//! Each word privately owns an intra-population CA3<->CA3 recurrent bundle
//! (see [`crate::word::WordRecord`]), which by construction never targets
//! another word's population and so never contributes a cross-word edge.
//! Cross-word structure instead comes from the engine's context-association
//! links: when a word is learned under a context that names another,
//! already-known word, a directed edge from the new word to that word is
//! installed. This keeps every word's neuron population private (consistent
//! with each word owning its neurons and synapses exclusively) while still
//! giving the graph real hub structure to rank.

use std::collections::HashMap;

use crate::word::WordRecord;

const DAMPING: f64 = 0.85;
const TOLERANCE: f64 = 1e-6;
const MAX_ITERATIONS: usize = 100;

/// A directed, weighted association from one word to another.
#[derive(Debug, Clone)]
pub struct CrossLink {
    /// Word the edge starts at
    pub source: String,
    /// Word the edge points to
    pub target: String,
    /// Edge weight, always non-negative
    pub weight: f64,
}

struct Graph {
    ids: Vec<String>,
    outgoing: Vec<Vec<(usize, f64)>>,
    out_weight: Vec<f64>,
}

impl Graph {
    fn build(words: &[WordRecord], cross_links: &[CrossLink]) -> Self {
        let ids: Vec<String> = words.iter().map(|w| w.id.clone()).collect();
        let index: HashMap<String, usize> = ids.iter().enumerate().map(|(i, id)| (id.clone(), i)).collect();
        let n = ids.len();
        let mut edge_weight: Vec<HashMap<usize, f64>> = vec![HashMap::new(); n];

        // Intra-word recurrent synapses always have post in the same word's
        // own population, so they never yield a u != v edge; this loop
        // exists to keep the graph construction rule visible and correct
        // even if that assumption is ever relaxed.
        for (u_idx, word) in words.iter().enumerate() {
            for syn in &word.ca3_recurrent {
                let w = syn.synapse.weight.max(0.0);
                let v_idx = u_idx;
                if v_idx == u_idx || w <= 0.0 {
                    continue;
                }
                *edge_weight[u_idx].entry(v_idx).or_insert(0.0) += w;
            }
        }

        for link in cross_links {
            let (Some(&u_idx), Some(&v_idx)) = (index.get(&link.source), index.get(&link.target)) else {
                continue;
            };
            if u_idx == v_idx || link.weight <= 0.0 {
                continue;
            }
            *edge_weight[u_idx].entry(v_idx).or_insert(0.0) += link.weight;
        }

        let outgoing: Vec<Vec<(usize, f64)>> = edge_weight.into_iter().map(|m| m.into_iter().collect()).collect();
        let out_weight: Vec<f64> = outgoing.iter().map(|edges| edges.iter().map(|(_, w)| w).sum()).collect();

        Self {
            ids,
            outgoing,
            out_weight,
        }
    }

    fn len(&self) -> usize {
        self.ids.len()
    }

    fn pagerank(&self) -> HashMap<String, f64> {
        let n = self.len();
        if n == 0 {
            return HashMap::new();
        }
        if n == 1 {
            return HashMap::from([(self.ids[0].clone(), 1.0)]);
        }

        let mut rank = vec![1.0 / n as f64; n];
        for _ in 0..MAX_ITERATIONS {
            let dangling_mass: f64 = (0..n).filter(|&i| self.out_weight[i] <= 0.0).map(|i| rank[i]).sum();

            let mut next = vec![(1.0 - DAMPING) / n as f64; n];
            for u in 0..n {
                if self.out_weight[u] <= 0.0 {
                    continue;
                }
                for &(v, w) in &self.outgoing[u] {
                    next[v] += DAMPING * rank[u] * (w / self.out_weight[u]);
                }
            }
            for v in next.iter_mut() {
                *v += DAMPING * dangling_mass / n as f64;
            }

            let l1_change: f64 = rank.iter().zip(next.iter()).map(|(a, b)| (a - b).abs()).sum();
            rank = next;
            if l1_change < TOLERANCE {
                break;
            }
        }

        let max_score = rank.iter().cloned().fold(0.0_f64, f64::max);
        let normalized: Vec<f64> = if max_score > 0.0 {
            rank.iter().map(|r| r / max_score).collect()
        } else {
            rank
        };

        self.ids.iter().cloned().zip(normalized).collect()
    }
}

/// Caches the most recent PageRank result; the engine invalidates it on
/// every learn, decay, or sleep call.
#[derive(Debug, Clone, Default)]
pub struct MemoryRank {
    cache: Option<(usize, HashMap<String, f64>)>,
}

impl MemoryRank {
    /// Construct an empty, uncached ranker.
    pub fn new() -> Self {
        Self { cache: None }
    }

    /// Invalidate the cache.
    pub fn invalidate(&mut self) {
        self.cache = None;
    }

    /// Compute (or serve from cache) the importance map over `words` and the
    /// engine's context-association `cross_links`.
    pub fn calculate(&mut self, words: &[WordRecord], cross_links: &[CrossLink]) -> &HashMap<String, f64> {
        let word_count = words.len();
        if self.cache.as_ref().map(|(n, _)| *n) != Some(word_count) {
            let graph = Graph::build(words, cross_links);
            let scores = graph.pagerank();
            self.cache = Some((word_count, scores));
        }
        &self.cache.as_ref().unwrap().1
    }

    /// Importance of a single word id, `0.0` if unknown or uncomputed yet.
    pub fn rank_of(&mut self, words: &[WordRecord], cross_links: &[CrossLink], id: &str) -> f64 {
        self.calculate(words, cross_links).get(id).copied().unwrap_or(0.0)
    }

    /// Top `n` words by importance, descending.
    pub fn top_memories(&mut self, words: &[WordRecord], cross_links: &[CrossLink], n: usize) -> Vec<(String, f64)> {
        let scores = self.calculate(words, cross_links).clone();
        let mut entries: Vec<(String, f64)> = scores.into_iter().collect();
        entries.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        entries.truncate(n);
        entries
    }
}
