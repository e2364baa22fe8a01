//! The 80 ms / 0.1 ms learning-trial simulation shared by `learn` and
//! classical-sleep replay, which differ only in stimulus amplitude and
//! recurrent gain.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::word::WordRecord;

/// Trial duration, milliseconds
pub const T_LEARN_MS: f64 = 80.0;
/// Trial step size, milliseconds
pub const DT_MS: f64 = 0.1;
/// DG stimulus window start, milliseconds
pub const STIM_START_MS: f64 = 5.0;
/// DG stimulus window end, milliseconds
pub const STIM_END_MS: f64 = 15.0;

/// DG stimulus amplitude and CA3 recurrent gain for a normal learning trial.
pub const LEARN_DG_AMPLITUDE: f64 = 350.0;
/// Recurrent gain for a normal learning trial
pub const LEARN_RECURRENT_GAIN: f64 = 0.5;
/// DG stimulus amplitude for a classical-sleep weak replay
pub const REPLAY_DG_AMPLITUDE: f64 = 150.0;
/// Recurrent gain for a classical-sleep weak replay
pub const REPLAY_RECURRENT_GAIN: f64 = 0.3;

/// Run one deterministic 800-step trial against `word`'s own DG and CA3
/// populations, following the fixed per-step ordering: DG step, CA3 step
/// using delivered currents, STDP post-updates for CA3 spikes this step,
/// STDP pre-updates for any pre-neuron whose spike flag is set.
pub fn run_trial(word: &mut WordRecord, dg_amplitude: f64, recurrent_gain: f64) {
    let steps = (T_LEARN_MS / DT_MS).round() as usize;
    let mut t = 0.0;

    for _ in 0..steps {
        let i_dg = if t > STIM_START_MS && t < STIM_END_MS { dg_amplitude } else { 0.0 };

        for dg in word.dg.iter_mut() {
            let _ = dg.step(DT_MS, i_dg);
        }

        let dg_spiked: Vec<bool> = word.dg.iter().map(|n| n.spiking()).collect();

        // Synapse delivery is order-sensitive (each `deliver` call drains a
        // kernel's queued PSC contribution for this step), so currents are
        // gathered sequentially before the neurons are stepped.
        let mut currents = vec![0.0; word.ca3.len()];
        for (ca3_idx, current) in currents.iter_mut().enumerate() {
            for dg_idx in 0..word.dg.len() {
                let syn = &mut word.dg_ca3[dg_idx * crate::word::CA3_COUNT + ca3_idx];
                *current += syn.deliver(t);
            }
            for link in word.ca3_recurrent.iter_mut() {
                if link.post == ca3_idx {
                    *current += recurrent_gain * link.synapse.deliver(t);
                }
            }
        }

        #[cfg(feature = "parallel")]
        let ca3_spiked_now: Vec<bool> = word
            .ca3
            .par_iter_mut()
            .zip(currents.par_iter())
            .map(|(ca3, current)| ca3.step(DT_MS, *current).unwrap_or(false))
            .collect();
        #[cfg(not(feature = "parallel"))]
        let ca3_spiked_now: Vec<bool> = word
            .ca3
            .iter_mut()
            .zip(currents.iter())
            .map(|(ca3, current)| ca3.step(DT_MS, *current).unwrap_or(false))
            .collect();

        for (ca3_idx, &spiked) in ca3_spiked_now.iter().enumerate() {
            if spiked {
                for dg_idx in 0..word.dg.len() {
                    word.dg_ca3[dg_idx * crate::word::CA3_COUNT + ca3_idx].on_post_spike(t);
                }
                for link in word.ca3_recurrent.iter_mut() {
                    if link.post == ca3_idx {
                        link.synapse.on_post_spike(t);
                    }
                }
                for link in word.ca3_ca1.iter_mut() {
                    if link.pre == ca3_idx {
                        link.synapse.on_post_spike(t);
                    }
                }
            }
        }

        for dg_idx in 0..word.dg.len() {
            if dg_spiked[dg_idx] {
                for ca3_idx in 0..word.ca3.len() {
                    word.dg_ca3[dg_idx * crate::word::CA3_COUNT + ca3_idx].on_pre_spike(t);
                }
            }
        }

        let ca3_spiked: Vec<bool> = word.ca3.iter().map(|n| n.spiking()).collect();
        for link in word.ca3_recurrent.iter_mut() {
            if ca3_spiked[link.pre] {
                link.synapse.on_pre_spike(t);
            }
        }
        for link in word.ca3_ca1.iter_mut() {
            if ca3_spiked[link.pre] {
                link.synapse.on_pre_spike(t);
            }
        }

        let ca1_current: f64 = word.ca3_ca1.iter_mut().map(|link| link.synapse.deliver(t)).sum();
        let _ = word.ca1.step(DT_MS, ca1_current);

        t += DT_MS;
    }
}
