//! Event-driven STDP synapse with sleep consolidation and persistence.
//!
//! Delivery is delayed and kernel-shaped rather than instantaneous: a
//! pre-synaptic spike is queued `delay_ms` in the future and, once due,
//! contributes an exponentially decaying quantum to the post-synaptic
//! current for as long as it remains in the queue. Plasticity is nearest-
//! neighbour STDP: each pre spike checks against the last post spike for
//! depression, each post spike checks against the last pre spike for
//! potentiation.

/// Fixed STDP and consolidation constants for [`StdpSynapse`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StdpParams {
    /// Synaptic transmission delay
    pub delay_ms: f64,
    /// Maximum unweighted charge quantum per spike
    pub q_max: f64,
    /// Post-synaptic current decay time constant
    pub tau_ms: f64,
    /// STDP window: timing differences beyond this are ignored
    pub stdp_window: f64,
    /// Potentiation rate
    pub ltp_rate: f64,
    /// Depression rate
    pub ltd_rate: f64,
    /// STDP exponential kernel time constant
    pub tau_stdp: f64,
    /// Minimum weight, a depression floor independent of consolidation
    pub weight_min: f64,
    /// Maximum weight
    pub weight_max: f64,
}

impl Default for StdpParams {
    fn default() -> Self {
        Self {
            delay_ms: 1.5,
            q_max: 50.0,
            tau_ms: 2.0,
            stdp_window: 20.0,
            ltp_rate: 0.15,
            ltd_rate: 0.05,
            tau_stdp: 10.0,
            weight_min: 0.1,
            weight_max: 50.0,
        }
    }
}

/// A pre-synaptic spike in flight, due for delivery at `arrival_ms`.
#[derive(Debug, Clone, Copy)]
struct PendingSpike {
    arrival_ms: f64,
    quantum: f64,
}

/// Event-driven STDP synapse.
///
/// `weight`, `consolidation_level`, `peak_weight` and `replay_count` are the
/// persisted fields a caller round-trips through storage; they are public so
/// the runtime layer can read and serialize them without a getter per field.
#[derive(Debug, Clone)]
pub struct StdpSynapse {
    params: StdpParams,
    queue: Vec<PendingSpike>,
    i_syn: f64,
    last_pre_time: f64,
    last_post_time: f64,
    /// Current synaptic weight
    pub weight: f64,
    /// Monotonically non-decreasing consolidation level in `[0, 1]`
    pub consolidation_level: f64,
    /// Highest weight ever reached
    pub peak_weight: f64,
    /// Number of sleep-consolidation replays applied
    pub replay_count: u32,
}

impl StdpSynapse {
    /// Construct a new synapse at its initial weight of `1.0`.
    pub fn new(params: StdpParams) -> Self {
        Self {
            params,
            queue: Vec::new(),
            i_syn: 0.0,
            last_pre_time: -100.0,
            last_post_time: -100.0,
            weight: 1.0,
            consolidation_level: 0.0,
            peak_weight: 1.0,
            replay_count: 0,
        }
    }

    /// Construct with default parameters
    pub fn new_default() -> Self {
        Self::new(StdpParams::default())
    }

    /// Restore a synapse to a previously persisted state, otherwise at
    /// default parameters.
    pub fn from_persisted(weight: f64, consolidation_level: f64, peak_weight: f64, replay_count: u32) -> Self {
        let mut s = Self::new_default();
        s.weight = weight;
        s.consolidation_level = consolidation_level;
        s.peak_weight = peak_weight;
        s.replay_count = replay_count;
        s
    }

    /// Current post-synaptic current contribution, as of the last `deliver` call.
    pub fn i_syn(&self) -> f64 {
        self.i_syn
    }

    /// A pre-synaptic spike arrives at time `t` (ms). Applies LTD if a post
    /// spike occurred recently, then queues a weighted charge quantum for
    /// delivery after the synaptic delay.
    pub fn on_pre_spike(&mut self, t: f64) {
        self.last_pre_time = t;

        let dt_stdp = t - self.last_post_time;
        if dt_stdp > 0.0 && dt_stdp < self.params.stdp_window {
            self.weight = (self.weight - self.params.ltd_rate * (-dt_stdp / self.params.tau_stdp).exp())
                .max(self.params.weight_min);
        }

        let quantum = self.params.q_max * self.weight;
        self.queue.push(PendingSpike {
            arrival_ms: t + self.params.delay_ms,
            quantum,
        });
    }

    /// A post-synaptic spike arrives at time `t` (ms). Applies LTP if a pre
    /// spike occurred recently.
    pub fn on_post_spike(&mut self, t: f64) {
        self.last_post_time = t;

        let dt = t - self.last_pre_time;
        if dt > 0.0 && dt < self.params.stdp_window {
            self.weight = (self.weight + self.params.ltp_rate * (-dt / self.params.tau_stdp).exp())
                .min(self.params.weight_max);
        }
    }

    /// Deliver any queued spikes that have arrived by time `t`, summing their
    /// exponentially decayed contribution into the post-synaptic current.
    pub fn deliver(&mut self, t: f64) -> f64 {
        self.i_syn = 0.0;
        self.queue.retain(|spike| {
            if spike.arrival_ms <= t {
                let dt_since = t - spike.arrival_ms;
                self.i_syn += spike.quantum * (-dt_since / self.params.tau_ms).exp();
                false
            } else {
                true
            }
        });
        self.i_syn
    }

    /// Apply one round of sleep consolidation: strengthens the weight,
    /// advances `replay_count`, and raises `consolidation_level` toward `1.0`
    /// (never decreasing it).
    pub fn consolidate(&mut self, factor: f64) {
        self.weight = (self.weight + factor).min(self.params.weight_max);
        self.replay_count += 1;
        self.consolidation_level =
            (self.consolidation_level + 0.05 * (1.0 - self.consolidation_level)).min(1.0);
        self.peak_weight = self.peak_weight.max(self.weight);
    }

    /// The minimum weight this synapse can decay to, given `importance`
    /// (typically a MemoryRank score in `[0, 1]`).
    pub fn floor(&self, importance: f64) -> f64 {
        let base_floor = 0.1;
        let importance_floor = importance * 0.4;
        let consolidation_floor = self.consolidation_level * 0.3;
        let peak_floor = self.peak_weight * 0.05;
        base_floor + importance_floor + consolidation_floor + peak_floor
    }

    /// Decay the weight by `rate`, resisted by importance, consolidation and
    /// replay history, never dropping below [`Self::floor`]. Low-importance
    /// synapses (`importance < 0.3`) decay faster, to keep recall from
    /// surfacing stale, unimportant associations.
    pub fn decay(&mut self, rate: f64, importance: f64) -> f64 {
        let floor = self.floor(importance);

        let resistance = (importance * 0.4
            + self.consolidation_level * 0.4
            + (self.replay_count as f64 * 0.01).min(0.15))
        .min(0.95);

        let actual_decay = if importance < 0.3 {
            let penalty = (0.3 - importance) * 2.0;
            rate * (1.0 - resistance) * (1.0 + penalty)
        } else {
            rate * (1.0 - resistance)
        };

        self.weight = (self.weight - actual_decay).max(floor);
        self.weight
    }

    /// Clear in-flight spikes and the delivered current; weight and
    /// persistence fields survive, since they are meant to outlive a trial.
    pub fn reset_transient(&mut self) {
        self.queue.clear();
        self.i_syn = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_synapse_starts_at_weight_one() {
        let syn = StdpSynapse::new_default();
        assert_eq!(syn.weight, 1.0);
        assert_eq!(syn.consolidation_level, 0.0);
        assert_eq!(syn.replay_count, 0);
    }

    #[test]
    fn test_delayed_delivery() {
        let mut syn = StdpSynapse::new_default();
        syn.on_pre_spike(0.0);
        assert_eq!(syn.deliver(0.0), 0.0);
        assert!(syn.deliver(2.0) > 0.0);
    }

    #[test]
    fn test_potentiation_when_pre_precedes_post() {
        let mut syn = StdpSynapse::new_default();
        let initial = syn.weight;
        syn.on_pre_spike(10.0);
        syn.on_post_spike(15.0);
        assert!(syn.weight > initial);
    }

    #[test]
    fn test_depression_when_post_precedes_pre() {
        let mut syn = StdpSynapse::new_default();
        syn.on_post_spike(10.0);
        let before = syn.weight;
        syn.on_pre_spike(15.0);
        assert!(syn.weight < before);
    }

    #[test]
    fn test_consolidation_is_monotone_and_raises_peak() {
        let mut syn = StdpSynapse::new_default();
        syn.consolidate(0.05);
        let level_after_one = syn.consolidation_level;
        assert!(level_after_one > 0.0);
        for _ in 0..20 {
            syn.consolidate(0.05);
        }
        assert!(syn.consolidation_level >= level_after_one);
        assert!(syn.consolidation_level <= 1.0);
        assert!(syn.peak_weight >= syn.weight);
    }

    #[test]
    fn test_decay_never_crosses_floor() {
        let mut syn = StdpSynapse::new_default();
        syn.consolidate(10.0);
        let floor = syn.floor(0.8);
        for _ in 0..1000 {
            syn.decay(0.5, 0.8);
        }
        assert!(syn.weight >= floor - 1e-9);
    }

    #[test]
    fn test_low_importance_decays_faster_than_high_importance() {
        let mut low = StdpSynapse::new_default();
        let mut high = StdpSynapse::new_default();
        low.consolidate(20.0);
        high.consolidate(20.0);
        let low_weight_before = low.weight;
        let high_weight_before = high.weight;
        low.decay(0.1, 0.1);
        high.decay(0.1, 0.9);
        let low_drop = low_weight_before - low.weight;
        let high_drop = high_weight_before - high.weight;
        assert!(low_drop > high_drop);
    }

    #[test]
    fn test_reset_transient_preserves_weight() {
        let mut syn = StdpSynapse::new_default();
        syn.on_pre_spike(0.0);
        syn.consolidate(1.0);
        let weight = syn.weight;
        syn.reset_transient();
        assert_eq!(syn.weight, weight);
        assert_eq!(syn.deliver(100.0), 0.0);
    }

    #[test]
    fn test_from_persisted_round_trips_fields() {
        let syn = StdpSynapse::from_persisted(5.0, 0.6, 7.0, 12);
        assert_eq!(syn.weight, 5.0);
        assert_eq!(syn.consolidation_level, 0.6);
        assert_eq!(syn.peak_weight, 7.0);
        assert_eq!(syn.replay_count, 12);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn weight_stays_within_bounds_under_any_spike_sequence(
            events in prop::collection::vec((any::<bool>(), 0.0f64..200.0), 0..200),
        ) {
            let mut syn = StdpSynapse::new_default();
            let mut t = 0.0;
            for (is_pre, gap) in events {
                t += gap;
                if is_pre {
                    syn.on_pre_spike(t);
                } else {
                    syn.on_post_spike(t);
                }
                prop_assert!(syn.weight >= syn.params.weight_min - 1e-9);
                prop_assert!(syn.weight <= syn.params.weight_max + 1e-9);
            }
        }

        #[test]
        fn decay_never_drops_below_its_own_floor(
            importance in 0.0f64..1.0,
            rate in 0.0f64..5.0,
            rounds in 0u32..500,
            consolidate_rounds in 0u32..50,
        ) {
            let mut syn = StdpSynapse::new_default();
            for _ in 0..consolidate_rounds {
                syn.consolidate(1.0);
            }
            let floor = syn.floor(importance);
            for _ in 0..rounds {
                syn.decay(rate, importance);
            }
            prop_assert!(syn.weight >= floor - 1e-9);
        }

        #[test]
        fn consolidation_level_is_monotone_and_bounded(rounds in 0u32..200, factor in 0.0f64..10.0) {
            let mut syn = StdpSynapse::new_default();
            let mut last = syn.consolidation_level;
            for _ in 0..rounds {
                syn.consolidate(factor);
                prop_assert!(syn.consolidation_level >= last);
                prop_assert!(syn.consolidation_level <= 1.0);
                last = syn.consolidation_level;
            }
        }
    }
}
