//! The top-level hippocampal word-store engine: the single entry point
//! external collaborators drive through `learn`/`recall`/`sleep`/`decay`/
//! `save`/`load` and the rest of the operation set in the crate root docs.

use std::collections::{HashMap, HashSet};
use std::io::{Read as IoRead, Write as IoWrite};

use hippo_core::cue_vector;
use hippo_core::StdpSynapse;
use hippo_storage::{EngineDocument, PersistedWord, SynapsePersistence};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::memory_rank::{CrossLink, MemoryRank};
use crate::sleep::{classical_sleep, dynamic_sleep, SleepReport};
use crate::trial::{run_trial, LEARN_DG_AMPLITUDE, LEARN_RECURRENT_GAIN};
use crate::word::WordRecord;

/// Retrieval boost coefficient applied to MemoryRank importance in `recall`.
const RECALL_RANK_BOOST: f64 = 1.5;

/// Persistence score threshold above which a word `will_persist`.
const PERSISTENCE_THRESHOLD: f64 = 0.5;

/// A single recall match: display text and its composite score.
#[derive(Debug, Clone, PartialEq)]
pub struct RecallMatch {
    /// Original, non-normalized word text
    pub word: String,
    /// Composite similarity x weight x rank-boost x context-relevance score
    pub score: f64,
}

/// `get_persistence`'s snapshot of one word's retention outlook.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PersistenceRecord {
    /// Mean DG->CA3 synaptic weight
    pub weight: f64,
    /// MemoryRank importance of this word
    pub importance: f64,
    /// Mean consolidation level across the DG->CA3 bundle
    pub consolidation: f64,
    /// Highest peak weight across the DG->CA3 bundle
    pub peak_weight: f64,
    /// Total replay count across the DG->CA3 bundle
    pub replay_count: u32,
    /// Estimated decay floor at the current importance
    pub estimated_floor: f64,
    /// Derived scalar summarizing retrieval durability
    pub persistence_score: f64,
    /// Whether `persistence_score` clears [`PERSISTENCE_THRESHOLD`]
    pub will_persist: bool,
}

/// Engine-wide usage statistics returned by `get_stats`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineStats {
    /// Number of distinct learned words
    pub word_count: usize,
    /// Configured word capacity
    pub capacity: usize,
    /// Total neurons across all words (DG + CA3 + CA1)
    pub neuron_count: usize,
    /// Total synapses across all words (DG->CA3 + CA3<->CA3 + CA3->CA1)
    pub synapse_count: usize,
    /// Mean DG->CA3 weight across every word
    pub mean_weight: f64,
    /// Number of words whose persistence record currently `will_persist`
    pub persistent_count: usize,
    /// `persistent_count / word_count`, `0.0` when the store is empty
    pub persistence_ratio: f64,
    /// Mean consolidation level across every DG->CA3 synapse
    pub mean_consolidation: f64,
    /// Rough byte estimate of resident neuron and synapse state
    pub memory_estimate: usize,
}

/// The hippocampal word-store engine.
pub struct Engine {
    config: EngineConfig,
    words: Vec<WordRecord>,
    index: HashMap<String, usize>,
    familiar: HashSet<String>,
    cross_links: Vec<CrossLink>,
    rank: MemoryRank,
    rng: StdRng,
}

impl Engine {
    /// Construct a new engine at `capacity` with default neuron/STDP
    /// parameters and an RNG seeded from `0`.
    pub fn new(capacity: usize) -> Self {
        Self::with_config(EngineConfig::new().with_capacity(capacity))
    }

    /// Construct a new engine from an explicit configuration.
    pub fn with_config(config: EngineConfig) -> Self {
        let rng = StdRng::seed_from_u64(config.rng_seed);
        log::info!("new hippocampal word-store engine, capacity={}", config.capacity);
        Self {
            config,
            words: Vec::new(),
            index: HashMap::new(),
            familiar: HashSet::new(),
            cross_links: Vec::new(),
            rank: MemoryRank::new(),
            rng,
        }
    }

    /// Learn `word` under an optional `context`. If the word already exists,
    /// its learning trial reruns and its frequency increments by exactly one;
    /// otherwise a fresh population is allocated, refusing if the store is at
    /// capacity.
    pub fn learn(&mut self, word: &str, context: Option<&str>) -> Result<()> {
        let id = cue_vector::normalize(word);

        if let Some(&idx) = self.index.get(&id) {
            let w = &mut self.words[idx];
            if let Some(ctx) = context {
                w.subiculum.learn_context(ctx);
                w.context = Some(ctx.to_string());
            }
            run_trial(w, LEARN_DG_AMPLITUDE, LEARN_RECURRENT_GAIN);
            w.frequency += 1;
            self.rank.invalidate();
            log::info!("relearned {:?}, frequency={}", id, w.frequency);
            return Ok(());
        }

        if self.words.len() >= self.config.capacity {
            log::debug!("capacity refusal for {:?} at capacity {}", id, self.config.capacity);
            return Err(EngineError::capacity_full(self.config.capacity));
        }

        self.install_context_link(&id, context);

        let mut record = WordRecord::new(
            id.clone(),
            word.to_string(),
            context.map(str::to_string),
            &self.config.neuron_params,
            &self.config.stdp_params,
            &mut self.rng,
        );
        run_trial(&mut record, LEARN_DG_AMPLITUDE, LEARN_RECURRENT_GAIN);

        let idx = self.words.len();
        self.words.push(record);
        self.index.insert(id.clone(), idx);
        self.familiar.insert(id.clone());
        self.rank.invalidate();
        log::info!("learned new word {:?} ({} total)", id, self.words.len());
        Ok(())
    }

    fn install_context_link(&mut self, new_id: &str, context: Option<&str>) {
        let Some(ctx) = context else { return };
        let ctx_id = cue_vector::normalize(ctx);
        if ctx_id == new_id || !self.index.contains_key(&ctx_id) {
            return;
        }
        if let Some(link) = self.cross_links.iter_mut().find(|l| l.source == new_id && l.target == ctx_id) {
            link.weight += 1.0;
        } else {
            self.cross_links.push(CrossLink { source: new_id.to_string(), target: ctx_id, weight: 1.0 });
            log::debug!("installed context association link {} -> {}", new_id, context.unwrap());
        }
    }

    /// Recall the `top_n` best-matching words for `cue`, optionally weighted
    /// by a context's subiculum relevance. Returns an empty list on an empty
    /// store; `InvalidInput` when `top_n == 0`, since a zero-length request
    /// is never a meaningful call rather than a degenerate empty one.
    pub fn recall(&mut self, cue: &str, top_n: usize, context: Option<&str>) -> Result<Vec<RecallMatch>> {
        if top_n == 0 {
            return Err(EngineError::invalid_input("top_n", "0 (must be at least 1)"));
        }
        if self.words.is_empty() {
            return Ok(Vec::new());
        }

        let mut scored = self.scored_matches(cue, context);
        scored.retain(|(sim, _)| *sim > 0.0);
        scored.truncate(top_n);
        Ok(scored.into_iter().map(|(_, m)| m).collect())
    }

    /// Recall the single best-matching word for `cue`, the way an external
    /// collaborator that only ever wants one answer would call it.
    /// `EmptyStore` when no word has ever been learned; otherwise always
    /// succeeds with the top-scoring word, even if its similarity is zero or
    /// negative (there being no learned words is the only "absent" case,
    /// not a weak match against the ones that exist).
    pub fn recall_one(&mut self, cue: &str, context: Option<&str>) -> Result<RecallMatch> {
        if self.words.is_empty() {
            return Err(EngineError::EmptyStore);
        }
        let scored = self.scored_matches(cue, context);
        Ok(scored.into_iter().map(|(_, m)| m).next().expect("non-empty store yields at least one scored match"))
    }

    /// Score every learned word against `cue`, sorted by descending score,
    /// paired with its raw cosine similarity so callers can filter on match
    /// quality independently of the context-relevance multiplier.
    fn scored_matches(&mut self, cue: &str, context: Option<&str>) -> Vec<(f64, RecallMatch)> {
        let cue_vec = cue_vector::vectorize(&cue_vector::normalize(cue));
        let mut scored: Vec<(f64, RecallMatch)> = Vec::with_capacity(self.words.len());

        for word in &self.words {
            let word_vec = cue_vector::vectorize(&word.id);
            let sim = cue_vector::cosine_similarity(&cue_vec, &word_vec);
            let base = sim * word.mean_dg_ca3_weight();
            let rank = self.rank.rank_of(&self.words, &self.cross_links, &word.id);
            let boosted = base * (1.0 + RECALL_RANK_BOOST * rank);
            let relevance = word.subiculum.compute_relevance(context);
            scored.push((sim, RecallMatch { word: word.text.clone(), score: boosted * relevance }));
        }

        scored.sort_by(|a, b| b.1.score.partial_cmp(&a.1.score).unwrap_or(std::cmp::Ordering::Equal));
        scored
    }

    /// `0` if `word` has ever been learned, `1` otherwise.
    pub fn novelty(&self, word: &str) -> u8 {
        let id = cue_vector::normalize(word);
        if self.familiar.contains(&id) {
            0
        } else {
            1
        }
    }

    /// Run `cycles` sleep cycles, classical replay-and-consolidate when
    /// `dynamic` is false, the staged noise-driven pipeline otherwise.
    pub fn sleep(&mut self, cycles: u32, dynamic: bool) -> SleepReport {
        let report = if dynamic {
            let scores = self.rank.calculate(&self.words, &self.cross_links).clone();
            let importances: Vec<f64> = self.words.iter().map(|w| scores.get(&w.id).copied().unwrap_or(0.0)).collect();
            dynamic_sleep(&mut self.words, cycles, &importances, &mut self.rng)
        } else {
            classical_sleep(&mut self.words, cycles, &mut self.rng)
        };
        self.rank.invalidate();
        report
    }

    /// Decay every synapse in the store by `rate`, resisted per-word by that
    /// word's current MemoryRank importance.
    pub fn decay(&mut self, rate: f64) {
        let importances: HashMap<String, f64> =
            self.rank.calculate(&self.words, &self.cross_links).clone();

        for word in self.words.iter_mut() {
            let importance = importances.get(&word.id).copied().unwrap_or(0.0);
            for syn in word.dg_ca3.iter_mut() {
                syn.decay(rate, importance);
            }
            for link in word.ca3_recurrent.iter_mut() {
                link.synapse.decay(rate, importance);
            }
            for link in word.ca3_ca1.iter_mut() {
                link.synapse.decay(rate, importance);
            }
        }
        self.rank.invalidate();
        log::debug!("decayed {} words at rate {}", self.words.len(), rate);
    }

    /// Retention outlook for a known word, `UnknownWord` otherwise.
    pub fn get_persistence(&mut self, word: &str) -> Result<PersistenceRecord> {
        let id = cue_vector::normalize(word);
        let &idx = self.index.get(&id).ok_or_else(|| EngineError::unknown_word(word))?;
        let importance = self.rank.rank_of(&self.words, &self.cross_links, &id);
        let w = &self.words[idx];

        let weight = w.mean_dg_ca3_weight();
        let consolidation = mean(w.dg_ca3.iter().map(|s| s.consolidation_level));
        let peak_weight = w.dg_ca3.iter().map(|s| s.peak_weight).fold(0.0_f64, f64::max);
        let replay_count = w.dg_ca3.iter().map(|s| s.replay_count).sum();
        let estimated_floor = w.dg_ca3.first().map(|s| s.floor(importance)).unwrap_or(0.0);
        let persistence_score =
            (0.3 * importance + 0.4 * consolidation + (weight / 10.0).min(0.3)).min(1.0);

        Ok(PersistenceRecord {
            weight,
            importance,
            consolidation,
            peak_weight,
            replay_count,
            estimated_floor,
            persistence_score,
            will_persist: persistence_score > PERSISTENCE_THRESHOLD,
        })
    }

    /// The `n` most important learned words, descending.
    pub fn get_top_memories(&mut self, n: usize) -> Vec<(String, f64)> {
        self.rank.top_memories(&self.words, &self.cross_links, n)
    }

    /// Engine-wide usage statistics.
    pub fn get_stats(&mut self) -> EngineStats {
        let word_count = self.words.len();
        let neuron_count: usize = self.words.iter().map(|w| w.dg.len() + w.ca3.len() + 1).sum();
        let synapse_count: usize =
            self.words.iter().map(|w| w.dg_ca3.len() + w.ca3_recurrent.len() + w.ca3_ca1.len()).sum();

        let all_dg_ca3_weights: Vec<f64> = self.words.iter().flat_map(|w| w.dg_ca3.iter().map(|s| s.weight)).collect();
        let mean_weight = mean(all_dg_ca3_weights.iter().copied());
        let mean_consolidation =
            mean(self.words.iter().flat_map(|w| w.dg_ca3.iter().map(|s| s.consolidation_level)));

        let persistent_count = (0..word_count)
            .filter(|&i| {
                let id = self.words[i].id.clone();
                self.get_persistence(&id).map(|p| p.will_persist).unwrap_or(false)
            })
            .count();
        let persistence_ratio = if word_count == 0 { 0.0 } else { persistent_count as f64 / word_count as f64 };

        let neuron_bytes = std::mem::size_of::<hippo_core::HhQuickNeuron>();
        let synapse_bytes = std::mem::size_of::<StdpSynapse>();
        let memory_estimate = neuron_count * neuron_bytes + synapse_count * synapse_bytes;

        EngineStats {
            word_count,
            capacity: self.config.capacity,
            neuron_count,
            synapse_count,
            mean_weight,
            persistent_count,
            persistence_ratio,
            mean_consolidation,
            memory_estimate,
        }
    }

    /// Serialize the full engine state to `sink`.
    pub fn save<W: IoWrite>(&self, sink: W) -> Result<()> {
        let persisted: Vec<PersistedWord> = self.words.iter().map(to_persisted_word).collect();
        let doc = EngineDocument::new(self.config.capacity, self.config.rng_seed, persisted);
        doc.save(sink)?;
        Ok(())
    }

    /// Reload an engine from `source`: reinitialise at the stored capacity
    /// and RNG seed (so recurrent wiring is bit-identical), re-learn each
    /// word once, then overwrite weights and persistence fields, including
    /// the frequency, with the persisted values.
    pub fn load<R: IoRead>(source: R) -> Result<Self> {
        let doc = EngineDocument::load(source)?;
        let mut engine = Self::with_config(EngineConfig::new().with_capacity(doc.capacity).with_rng_seed(doc.rng_seed));

        for persisted in &doc.words {
            engine.learn(&persisted.text, persisted.context.as_deref())?;
            let idx = *engine.index.get(&persisted.id).expect("just learned");
            restore_word(&mut engine.words[idx], persisted);
        }

        engine.rank.invalidate();
        Ok(engine)
    }

    /// Number of distinct learned words.
    pub fn word_count(&self) -> usize {
        self.words.len()
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let mut sum = 0.0;
    let mut count = 0usize;
    for v in values {
        sum += v;
        count += 1;
    }
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

fn to_persisted_word(word: &WordRecord) -> PersistedWord {
    PersistedWord {
        id: word.id.clone(),
        text: word.text.clone(),
        context: word.context.clone(),
        frequency: word.frequency,
        dg_ca3_weights: word.dg_ca3.iter().map(|s| s.weight).collect(),
        ca3_recurrent_weights: word.ca3_recurrent.iter().map(|l| l.synapse.weight).collect(),
        ca3_ca1_weights: word.ca3_ca1.iter().map(|l| l.synapse.weight).collect(),
        dg_ca3_persistence: word.dg_ca3.iter().map(to_persistence).collect(),
        ca3_recurrent_persistence: word.ca3_recurrent.iter().map(|l| to_persistence(&l.synapse)).collect(),
        ca3_ca1_persistence: word.ca3_ca1.iter().map(|l| to_persistence(&l.synapse)).collect(),
    }
}

fn to_persistence(syn: &StdpSynapse) -> SynapsePersistence {
    SynapsePersistence {
        consolidation: syn.consolidation_level,
        peak_weight: syn.peak_weight,
        replay_count: syn.replay_count,
    }
}

fn restore_word(word: &mut WordRecord, persisted: &PersistedWord) {
    word.frequency = persisted.frequency;
    restore_bundle(word.dg_ca3.iter_mut(), &persisted.dg_ca3_weights, &persisted.dg_ca3_persistence);
    restore_bundle(
        word.ca3_recurrent.iter_mut().map(|l| &mut l.synapse),
        &persisted.ca3_recurrent_weights,
        &persisted.ca3_recurrent_persistence,
    );
    restore_bundle(
        word.ca3_ca1.iter_mut().map(|l| &mut l.synapse),
        &persisted.ca3_ca1_weights,
        &persisted.ca3_ca1_persistence,
    );
}

fn restore_bundle<'a>(
    synapses: impl Iterator<Item = &'a mut StdpSynapse>,
    weights: &[f64],
    persistence: &[SynapsePersistence],
) {
    for (i, syn) in synapses.enumerate() {
        if let (Some(&w), Some(p)) = (weights.get(i), persistence.get(i)) {
            *syn = StdpSynapse::from_persisted(w, p.consolidation, p.peak_weight, p.replay_count);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_learn_and_recall_prefix() {
        let mut engine = Engine::new(10);
        engine.learn("cat", None).unwrap();
        engine.learn("dog", None).unwrap();
        engine.learn("car", None).unwrap();

        let matches = engine.recall("ca", 2, None).unwrap();
        assert_eq!(matches.len(), 2);
        assert!(matches[0].word == "cat" || matches[0].word == "car");
        assert!(matches[0].score > 0.0 && matches[1].score > 0.0);
        assert!(matches[0].score >= matches[1].score);
    }

    #[test]
    fn test_capacity_refusal_then_relearn_succeeds() {
        let mut engine = Engine::new(2);
        engine.learn("a", None).unwrap();
        engine.learn("b", None).unwrap();
        assert!(matches!(engine.learn("c", None), Err(EngineError::CapacityFull { capacity: 2 })));
        assert!(engine.learn("a", None).is_ok());
        assert_eq!(engine.word_count(), 2);
    }

    #[test]
    fn test_learning_known_word_increments_frequency_only() {
        let mut engine = Engine::new(10);
        engine.learn("echo", None).unwrap();
        let before = engine.word_count();
        engine.learn("echo", None).unwrap();
        assert_eq!(engine.word_count(), before);
        assert_eq!(engine.words[0].frequency, 2);
    }

    #[test]
    fn test_consolidation_floors_decay() {
        let mut engine = Engine::new(10);
        engine.learn("mem", None).unwrap();
        engine.sleep(50, false);
        for _ in 0..100 {
            engine.decay(0.5);
        }
        let record = engine.get_persistence("mem").unwrap();
        assert!(record.weight >= record.estimated_floor - 1e-6);
        assert!(record.weight > 0.5);
    }

    #[test]
    fn test_rank_concentrates_on_context_hub() {
        let mut engine = Engine::new(10);
        engine.learn("a", None).unwrap();
        engine.learn("b", Some("a")).unwrap();
        engine.learn("c", Some("a")).unwrap();

        let top = engine.get_top_memories(3);
        assert_eq!(top[0].0, "a");
        assert!((top[0].1 - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_round_trip_save_load() {
        let mut engine = Engine::new(10);
        engine.learn("one", Some("ctx")).unwrap();
        engine.learn("two", None).unwrap();
        engine.learn("three", Some("ctx")).unwrap();
        engine.learn("four", None).unwrap();
        engine.learn("five", None).unwrap();
        engine.sleep(10, false);

        let mut buf = Vec::new();
        engine.save(&mut buf).unwrap();
        let mut reloaded = Engine::load(&buf[..]).unwrap();

        for id in ["one", "two", "three", "four", "five"] {
            let original = engine.get_persistence(id).unwrap();
            let after = reloaded.get_persistence(id).unwrap();
            assert!((original.weight - after.weight).abs() < 1e-9);
            assert!((original.consolidation - after.consolidation).abs() < 1e-9);
            assert!((original.peak_weight - after.peak_weight).abs() < 1e-9);
            assert_eq!(original.replay_count, after.replay_count);
        }
    }

    #[test]
    fn test_novelty_gate() {
        let mut engine = Engine::new(10);
        assert_eq!(engine.novelty("x"), 1);
        engine.learn("x", None).unwrap();
        assert_eq!(engine.novelty("x"), 0);
        engine.decay(0.1);
        engine.sleep(3, true);
        assert_eq!(engine.novelty("x"), 0);
    }

    #[test]
    fn test_empty_store_recall_and_top_memories() {
        let mut engine = Engine::new(10);
        assert!(engine.recall("anything", 3, None).unwrap().is_empty());
        assert!(engine.get_top_memories(5).is_empty());
    }

    #[test]
    fn test_recall_zero_top_n_is_invalid_input() {
        let mut engine = Engine::new(10);
        engine.learn("cat", None).unwrap();
        let err = engine.recall("cat", 0, None).unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput { .. }));
    }

    #[test]
    fn test_recall_one_on_empty_store_is_empty_store() {
        let mut engine = Engine::new(10);
        let err = engine.recall_one("anything", None).unwrap_err();
        assert!(matches!(err, EngineError::EmptyStore));
    }

    #[test]
    fn test_recall_one_returns_best_match() {
        let mut engine = Engine::new(10);
        engine.learn("cat", None).unwrap();
        engine.learn("dog", None).unwrap();
        let best = engine.recall_one("cat", None).unwrap();
        assert_eq!(best.word, "cat");
    }

    #[test]
    fn test_get_stats_reports_word_count_and_capacity() {
        let mut engine = Engine::new(5);
        engine.learn("alpha", None).unwrap();
        engine.learn("beta", None).unwrap();
        let stats = engine.get_stats();
        assert_eq!(stats.word_count, 2);
        assert_eq!(stats.capacity, 5);
        assert!(stats.neuron_count > 0);
        assert!(stats.synapse_count > 0);
    }
}
