//! Sleep / consolidation: classical replay-and-consolidate cycles, and a
//! staged dynamic pipeline that reads short-term plasticity bookkeeping.

use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;

use crate::trial::{run_trial, REPLAY_DG_AMPLITUDE, REPLAY_RECURRENT_GAIN};
use crate::word::WordRecord;

/// Consolidation strength applied to DG->CA3 synapses after a classical replay
pub const CLASSICAL_DG_CA3_FACTOR: f64 = 0.03;
/// Consolidation strength applied to CA3<->CA3 recurrent synapses after a classical replay
pub const CLASSICAL_RECURRENT_FACTOR: f64 = 0.02;
/// Default consolidation rate for dynamic sleep, matching the host's `SleepConfig` default
pub const DEFAULT_CONSOLIDATION_RATE: f64 = 0.05;

/// The fixed stage order one dynamic-sleep cycle runs through.
const STAGE_ORDER: [Stage; 6] = [Stage::Light, Stage::Deep, Stage::Sws, Stage::Sws, Stage::Light, Stage::Rem];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Light,
    Deep,
    Sws,
    Rem,
}

impl Stage {
    fn noise_level(self) -> f64 {
        match self {
            Stage::Light => 0.15,
            Stage::Deep => 0.25,
            Stage::Sws => 0.35,
            Stage::Rem => 0.20,
        }
    }
}

/// Outcome of a `sleep` call, returned to the caller unconditionally (an
/// empty store produces a report with every count at zero).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SleepReport {
    /// Number of cycles run
    pub cycles: u32,
    /// Total replay events across all cycles
    pub replays: u32,
    /// Distinct words replayed at least once
    pub unique_replays: u32,
    /// Total `consolidate` calls issued
    pub consolidations: u32,
    /// Number of SWS-stage passes run (dynamic sleep only)
    pub sws_cycles: u32,
    /// Number of REM-stage passes run (dynamic sleep only)
    pub rem_cycles: u32,
}

/// Run classical sleep: each cycle samples one word by frequency, resets its
/// transient trial state, replays it weakly, then consolidates the involved
/// synapses. A no-op on an empty store.
pub fn classical_sleep(words: &mut [WordRecord], cycles: u32, rng: &mut impl Rng) -> SleepReport {
    let mut report = SleepReport { cycles, ..Default::default() };
    if words.is_empty() {
        return report;
    }

    let mut replayed = vec![false; words.len()];
    let weights: Vec<u32> = words.iter().map(|w| w.frequency.max(1)).collect();
    let Ok(dist) = WeightedIndex::new(&weights) else {
        return report;
    };

    for _ in 0..cycles {
        let idx = dist.sample(rng);
        let word = &mut words[idx];

        word.reset_for_replay();
        run_trial(word, REPLAY_DG_AMPLITUDE, REPLAY_RECURRENT_GAIN);

        for syn in word.dg_ca3.iter_mut() {
            syn.consolidate(CLASSICAL_DG_CA3_FACTOR);
            report.consolidations += 1;
        }
        for link in word.ca3_recurrent.iter_mut() {
            link.synapse.consolidate(CLASSICAL_RECURRENT_FACTOR);
            report.consolidations += 1;
        }

        report.replays += 1;
        replayed[idx] = true;
    }

    report.unique_replays = replayed.iter().filter(|&&r| r).count() as u32;
    log::info!("classical sleep: {} cycles, {} replays, {} consolidations", cycles, report.replays, report.consolidations);
    report
}

/// Run dynamic sleep: a staged [Light, Deep, SWS, SWS, Light, REM] pipeline
/// per cycle, where each stage's noise level scales a per-word replay
/// probability driven by importance and short-term plasticity state.
pub fn dynamic_sleep(words: &mut [WordRecord], cycles: u32, importances: &[f64], rng: &mut impl Rng) -> SleepReport {
    let mut report = SleepReport { cycles, ..Default::default() };
    if words.is_empty() {
        return report;
    }

    let mut replayed = vec![false; words.len()];

    for _ in 0..cycles {
        for stage in STAGE_ORDER {
            match stage {
                Stage::Sws => report.sws_cycles += 1,
                Stage::Rem => report.rem_cycles += 1,
                _ => {}
            }

            let noise = stage.noise_level();
            for (idx, word) in words.iter_mut().enumerate() {
                let importance = importances.get(idx).copied().unwrap_or(0.0);
                let s_boost = 0.0;
                let ptp_boost = 1.0;
                let p_replay = noise * importance * (1.0 + s_boost) * ptp_boost;

                if rng.gen::<f64>() >= p_replay {
                    continue;
                }

                let activation = noise + rng.gen::<f64>() * 0.3;
                if activation <= 0.7 {
                    continue;
                }

                report.replays += 1;
                replayed[idx] = true;

                let stp_boost = 1.0 + s_boost;
                for syn in word.dg_ca3.iter_mut() {
                    let factor = DEFAULT_CONSOLIDATION_RATE * stp_boost * ptp_boost * (1.0 + 0.02 * syn.replay_count as f64);
                    syn.consolidate(factor);
                    report.consolidations += 1;
                }
                for link in word.ca3_recurrent.iter_mut() {
                    let factor =
                        DEFAULT_CONSOLIDATION_RATE * stp_boost * ptp_boost * (1.0 + 0.02 * link.synapse.replay_count as f64);
                    link.synapse.consolidate(factor);
                    report.consolidations += 1;
                }
            }
        }
    }

    report.unique_replays = replayed.iter().filter(|&&r| r).count() as u32;
    log::info!(
        "dynamic sleep: {} cycles, {} replays, {} consolidations, {} sws, {} rem",
        cycles, report.replays, report.consolidations, report.sws_cycles, report.rem_cycles
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use hippo_core::{HhQuickParams, StdpParams};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn sample_words(n: usize, rng: &mut StdRng) -> Vec<WordRecord> {
        (0..n)
            .map(|i| {
                WordRecord::new(
                    format!("w{i}"),
                    format!("w{i}"),
                    None,
                    &HhQuickParams::default(),
                    &StdpParams::default(),
                    rng,
                )
            })
            .collect()
    }

    #[test]
    fn test_classical_sleep_on_empty_store_is_noop() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut words: Vec<WordRecord> = Vec::new();
        let report = classical_sleep(&mut words, 5, &mut rng);
        assert_eq!(report.replays, 0);
        assert_eq!(report.consolidations, 0);
    }

    #[test]
    fn test_classical_sleep_runs_requested_cycles() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut words = sample_words(3, &mut rng);
        let report = classical_sleep(&mut words, 10, &mut rng);
        assert_eq!(report.cycles, 10);
        assert_eq!(report.replays, 10);
        assert!(report.consolidations > 0);
    }

    #[test]
    fn test_classical_sleep_never_decreases_persistence_fields() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut words = sample_words(2, &mut rng);
        let before: Vec<f64> = words[0].dg_ca3.iter().map(|s| s.consolidation_level).collect();
        classical_sleep(&mut words, 5, &mut rng);
        let after: Vec<f64> = words[0].dg_ca3.iter().map(|s| s.consolidation_level).collect();
        assert!(before.iter().zip(after.iter()).all(|(b, a)| a >= b));
    }

    #[test]
    fn test_dynamic_sleep_on_empty_store_is_noop() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut words: Vec<WordRecord> = Vec::new();
        let report = dynamic_sleep(&mut words, 3, &[], &mut rng);
        assert_eq!(report.replays, 0);
    }

    #[test]
    fn test_dynamic_sleep_counts_sws_and_rem_stages() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut words = sample_words(2, &mut rng);
        let importances = vec![1.0, 1.0];
        let report = dynamic_sleep(&mut words, 2, &importances, &mut rng);
        assert_eq!(report.sws_cycles, 4);
        assert_eq!(report.rem_cycles, 2);
    }
}
