//! Per-word population: DG, CA3, CA1 neurons, their three synapse bundles,
//! and the subiculum context gate.

use std::collections::HashSet;

use hippo_core::{HhQuickNeuron, HhQuickParams, StdpParams, StdpSynapse};
use rand::Rng;

/// DG population size per word
pub const DG_COUNT: usize = 2;
/// CA3 population size per word
pub const CA3_COUNT: usize = 30;
/// Target recurrent CA3<->CA3 synapse count (distinct, non-self-loop pairs)
pub const CA3_RECURRENT_COUNT: usize = 180;

/// Synaptic delay, DG -> CA3 (ms)
pub const DELAY_DG_CA3: f64 = 2.0;
/// Synaptic delay, CA3 <-> CA3 recurrent (ms)
pub const DELAY_CA3_RECURRENT: f64 = 3.0;
/// Synaptic delay, CA3 -> CA1 (ms)
pub const DELAY_CA3_CA1: f64 = 2.0;

/// Charge quantum cap for DG->CA3 and CA3->CA1 synapses
pub const Q_MAX_DENSE: f64 = 50.0;
/// Charge quantum cap for CA3<->CA3 recurrent synapses
pub const Q_MAX_RECURRENT: f64 = 30.0;

fn ca3_ca1_sample_size() -> usize {
    ((CA3_COUNT as f64) * 0.3).ceil().max(3.0) as usize
}

fn stdp_params_with_delay(base: &StdpParams, delay_ms: f64, q_max: f64) -> StdpParams {
    StdpParams {
        delay_ms,
        q_max,
        ..*base
    }
}

/// A pre/post indexed synapse within a word's recurrent or CA1 bundle.
#[derive(Debug, Clone)]
pub struct IndexedSynapse {
    /// Index of the pre-synaptic CA3 neuron
    pub pre: usize,
    /// Index of the post-synaptic neuron (another CA3 neuron, or 0 for the
    /// single CA1 time cell)
    pub post: usize,
    /// The synapse itself
    pub synapse: StdpSynapse,
}

/// Per-word mapping from context label to whether that context has been
/// associated with this word, used to gate recall relevance.
#[derive(Debug, Clone, Default)]
pub struct SubiculumGate {
    learned_contexts: HashSet<String>,
}

impl SubiculumGate {
    /// Associate a context label with this word
    pub fn learn_context(&mut self, context: &str) {
        self.learned_contexts.insert(context.to_string());
    }

    /// Relevance of this word under `context`: `1.0` if the context was
    /// previously associated with this word, `0.0` if a context was supplied
    /// but never associated, `0.5` if no context was supplied at all.
    pub fn compute_relevance(&self, context: Option<&str>) -> f64 {
        match context {
            None => 0.5,
            Some(c) => {
                if self.learned_contexts.contains(c) {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }
}

/// The full population and wiring created for one learned word.
#[derive(Debug, Clone)]
pub struct WordRecord {
    /// Stable lowercased/trimmed id
    pub id: String,
    /// Original, non-normalized text, kept for display
    pub text: String,
    /// Context most recently associated at learn time
    pub context: Option<String>,
    /// Number of times `learn` has been called for this word
    pub frequency: u32,
    /// Dentate gyrus neurons
    pub dg: Vec<HhQuickNeuron>,
    /// CA3 recurrent-associative neurons
    pub ca3: Vec<HhQuickNeuron>,
    /// CA1 time cell
    pub ca1: HhQuickNeuron,
    /// DG -> CA3 dense bundle, indexed `dg_idx * CA3_COUNT + ca3_idx`
    pub dg_ca3: Vec<StdpSynapse>,
    /// CA3 <-> CA3 recurrent bundle, sparse and randomly sampled at creation
    pub ca3_recurrent: Vec<IndexedSynapse>,
    /// CA3 -> CA1 sampled bundle
    pub ca3_ca1: Vec<IndexedSynapse>,
    /// Subiculum context gate
    pub subiculum: SubiculumGate,
}

impl WordRecord {
    /// Allocate a fresh population and wiring for `word`, sampling recurrent
    /// and CA1 connectivity from `rng`.
    pub fn new(
        id: String,
        text: String,
        context: Option<String>,
        neuron_params: &HhQuickParams,
        stdp_params: &StdpParams,
        rng: &mut impl Rng,
    ) -> Self {
        let dg: Vec<HhQuickNeuron> = (0..DG_COUNT).map(|_| HhQuickNeuron::new(*neuron_params)).collect();
        let ca3: Vec<HhQuickNeuron> = (0..CA3_COUNT).map(|_| HhQuickNeuron::new(*neuron_params)).collect();
        let ca1 = HhQuickNeuron::new(*neuron_params);

        let dg_ca3_params = stdp_params_with_delay(stdp_params, DELAY_DG_CA3, Q_MAX_DENSE);
        let dg_ca3: Vec<StdpSynapse> = (0..DG_COUNT * CA3_COUNT)
            .map(|_| StdpSynapse::new(dg_ca3_params))
            .collect();

        let recurrent_params = stdp_params_with_delay(stdp_params, DELAY_CA3_RECURRENT, Q_MAX_RECURRENT);
        let mut seen_pairs: HashSet<(usize, usize)> = HashSet::new();
        let mut ca3_recurrent = Vec::with_capacity(CA3_RECURRENT_COUNT);
        let max_possible_pairs = CA3_COUNT * (CA3_COUNT - 1);
        let target = CA3_RECURRENT_COUNT.min(max_possible_pairs);
        while ca3_recurrent.len() < target {
            let pre = rng.gen_range(0..CA3_COUNT);
            let post = rng.gen_range(0..CA3_COUNT);
            if pre == post || !seen_pairs.insert((pre, post)) {
                continue;
            }
            ca3_recurrent.push(IndexedSynapse {
                pre,
                post,
                synapse: StdpSynapse::new(recurrent_params),
            });
        }

        let ca1_params = stdp_params_with_delay(stdp_params, DELAY_CA3_CA1, Q_MAX_DENSE);
        let sample_size = ca3_ca1_sample_size().min(CA3_COUNT);
        let mut chosen_pre: HashSet<usize> = HashSet::new();
        let mut ca3_ca1 = Vec::with_capacity(sample_size);
        while ca3_ca1.len() < sample_size {
            let pre = rng.gen_range(0..CA3_COUNT);
            if !chosen_pre.insert(pre) {
                continue;
            }
            ca3_ca1.push(IndexedSynapse {
                pre,
                post: 0,
                synapse: StdpSynapse::new(ca1_params),
            });
        }

        let mut subiculum = SubiculumGate::default();
        if let Some(ctx) = &context {
            subiculum.learn_context(ctx);
        }

        Self {
            id,
            text,
            context,
            frequency: 1,
            dg,
            ca3,
            ca1,
            dg_ca3,
            ca3_recurrent,
            ca3_ca1,
            subiculum,
        }
    }

    /// Mean weight of the DG->CA3 bundle; used as the base recall score and
    /// in the persistence record.
    pub fn mean_dg_ca3_weight(&self) -> f64 {
        if self.dg_ca3.is_empty() {
            return 0.0;
        }
        self.dg_ca3.iter().map(|s| s.weight).sum::<f64>() / self.dg_ca3.len() as f64
    }

    /// Reset DG and CA3 membrane state and drain (but do not clear the
    /// persistence fields of) the DG->CA3 and CA3<->CA3 synapse queues, as
    /// classical sleep requires before a replay trial.
    pub fn reset_for_replay(&mut self) {
        for n in self.dg.iter_mut() {
            n.reset();
        }
        for n in self.ca3.iter_mut() {
            n.reset();
        }
        for s in self.dg_ca3.iter_mut() {
            s.reset_transient();
        }
        for s in self.ca3_recurrent.iter_mut() {
            s.synapse.reset_transient();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn make_word(rng: &mut StdRng) -> WordRecord {
        WordRecord::new(
            "cat".to_string(),
            "cat".to_string(),
            None,
            &HhQuickParams::default(),
            &StdpParams::default(),
            rng,
        )
    }

    #[test]
    fn test_population_sizes() {
        let mut rng = StdRng::seed_from_u64(1);
        let word = make_word(&mut rng);
        assert_eq!(word.dg.len(), DG_COUNT);
        assert_eq!(word.ca3.len(), CA3_COUNT);
        assert_eq!(word.dg_ca3.len(), DG_COUNT * CA3_COUNT);
    }

    #[test]
    fn test_recurrent_bundle_has_no_self_loops() {
        let mut rng = StdRng::seed_from_u64(2);
        let word = make_word(&mut rng);
        assert!(word.ca3_recurrent.iter().all(|s| s.pre != s.post));
    }

    #[test]
    fn test_recurrent_bundle_size_approaches_target() {
        let mut rng = StdRng::seed_from_u64(3);
        let word = make_word(&mut rng);
        assert_eq!(word.ca3_recurrent.len(), CA3_RECURRENT_COUNT);
    }

    #[test]
    fn test_ca1_sample_size() {
        let mut rng = StdRng::seed_from_u64(4);
        let word = make_word(&mut rng);
        assert_eq!(word.ca3_ca1.len(), 9);
    }

    #[test]
    fn test_mean_dg_ca3_weight_starts_at_one() {
        let mut rng = StdRng::seed_from_u64(5);
        let word = make_word(&mut rng);
        assert_eq!(word.mean_dg_ca3_weight(), 1.0);
    }

    #[test]
    fn test_subiculum_relevance_defaults() {
        let gate = SubiculumGate::default();
        assert_eq!(gate.compute_relevance(None), 0.5);
        assert_eq!(gate.compute_relevance(Some("kitchen")), 0.0);
    }

    #[test]
    fn test_subiculum_relevance_after_learning_context() {
        let mut gate = SubiculumGate::default();
        gate.learn_context("kitchen");
        assert_eq!(gate.compute_relevance(Some("kitchen")), 1.0);
        assert_eq!(gate.compute_relevance(Some("garage")), 0.0);
    }
}
