//! Detailed Hodgkin-Huxley soma with a process-wide, lazily-built lookup table.
//!
//! The voltage -> (tau, x_inf) table for the `m`, `h`, `n` gates is built once per
//! process and shared by every instance (Flyweight): at ~2001 entries per gate it
//! would otherwise be rebuilt per neuron for no benefit, since the table only
//! depends on the fixed rate-equation constants below, not on any per-instance state.

use std::sync::OnceLock;

use crate::error::{CoreError, Result};

const MIN_V: f64 = -100.0;
const MAX_V: f64 = 100.0;
const RESOLUTION: f64 = 0.1;

struct LookupTable {
    tau_m: Vec<f64>,
    m_inf: Vec<f64>,
    tau_h: Vec<f64>,
    h_inf: Vec<f64>,
    tau_n: Vec<f64>,
    n_inf: Vec<f64>,
}

impl LookupTable {
    fn build() -> Self {
        let steps = ((MAX_V - MIN_V) / RESOLUTION) as usize + 1;
        let mut tau_m = vec![0.0; steps];
        let mut m_inf = vec![0.0; steps];
        let mut tau_h = vec![0.0; steps];
        let mut h_inf = vec![0.0; steps];
        let mut tau_n = vec![0.0; steps];
        let mut n_inf = vec![0.0; steps];

        for i in 0..steps {
            let v = MIN_V + i as f64 * RESOLUTION;

            let am = if (v + 40.0).abs() > 1e-5 {
                0.1 * (v + 40.0) / (1.0 - (-(v + 40.0) / 10.0).exp())
            } else {
                1.0
            };
            let bm = 4.0 * (-(v + 65.0) / 18.0).exp();

            let ah = 0.07 * (-(v + 65.0) / 20.0).exp();
            let bh = 1.0 / (1.0 + (-(v + 35.0) / 10.0).exp());

            let an = if (v + 55.0).abs() > 1e-5 {
                0.01 * (v + 55.0) / (1.0 - (-(v + 55.0) / 10.0).exp())
            } else {
                0.1
            };
            let bn = 0.125 * (-(v + 65.0) / 80.0).exp();

            tau_m[i] = 1.0 / (am + bm);
            m_inf[i] = am / (am + bm);
            tau_h[i] = 1.0 / (ah + bh);
            h_inf[i] = ah / (ah + bh);
            tau_n[i] = 1.0 / (an + bn);
            n_inf[i] = an / (an + bn);
        }

        Self {
            tau_m,
            m_inf,
            tau_h,
            h_inf,
            tau_n,
            n_inf,
        }
    }

    fn index_for(&self, v: f64) -> usize {
        let raw = ((v - MIN_V) / RESOLUTION) as isize;
        raw.clamp(0, self.tau_m.len() as isize - 1) as usize
    }
}

static TABLE: OnceLock<LookupTable> = OnceLock::new();

fn shared_table() -> &'static LookupTable {
    TABLE.get_or_init(|| {
        log::debug!("building shared HHQuick lookup table ({} mV range)", MAX_V - MIN_V);
        LookupTable::build()
    })
}

/// Fixed biophysical constants for [`HhQuickNeuron`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HhQuickParams {
    /// Membrane capacitance
    pub c_m: f64,
    /// Na+ conductance
    pub g_na: f64,
    /// Na+ reversal potential
    pub e_na: f64,
    /// K+ conductance
    pub g_k: f64,
    /// K+ reversal potential
    pub e_k: f64,
    /// Leak conductance
    pub g_l: f64,
    /// Leak reversal potential
    pub e_l: f64,
    /// Spike detection threshold
    pub spike_thresh: f64,
}

impl Default for HhQuickParams {
    fn default() -> Self {
        Self {
            c_m: 1.0,
            g_na: 220.0,
            e_na: 50.0,
            g_k: 26.0,
            e_k: -77.0,
            g_l: 0.02,
            e_l: -54.4,
            spike_thresh: -15.0,
        }
    }
}

/// Operating mode of the soma: resting neurons take a cheap linear path and
/// cannot spike; only active neurons run the full HH dynamics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Cheap linear relaxation, no spiking possible
    Rest,
    /// Full Hodgkin-Huxley integration
    Active,
}

/// Detailed Hodgkin-Huxley soma driven by the shared lookup table.
#[derive(Debug, Clone)]
pub struct HhQuickNeuron {
    params: HhQuickParams,
    v: f64,
    m: f64,
    h: f64,
    n: f64,
    mode: Mode,
    ref_remaining: f64,
    i_syn_total: f64,
    spike_flag: bool,
}

impl HhQuickNeuron {
    /// Construct a neuron at its resting state, eagerly touching the shared table
    /// so the first `step` call never pays the one-time build cost.
    pub fn new(params: HhQuickParams) -> Self {
        shared_table();
        Self {
            params,
            v: -70.0,
            m: 0.05,
            h: 0.6,
            n: 0.32,
            mode: Mode::Rest,
            ref_remaining: 0.0,
            i_syn_total: 0.0,
            spike_flag: false,
        }
    }

    /// Construct with default parameters
    pub fn new_default() -> Self {
        Self::new(HhQuickParams::default())
    }

    /// Current membrane potential
    pub fn v(&self) -> f64 {
        self.v
    }

    /// Gate states `(m, h, n)`
    pub fn gates(&self) -> (f64, f64, f64) {
        (self.m, self.h, self.n)
    }

    /// Whether the most recent step produced a spike
    pub fn spiking(&self) -> bool {
        self.spike_flag
    }

    /// Deposit synaptic charge to be read (and cleared) on the next `step`
    pub fn add_synaptic_current(&mut self, current: f64) {
        self.i_syn_total += current;
    }

    /// Advance by `dt` milliseconds under total current `i_ext`, returning whether
    /// this step crossed threshold.
    pub fn step(&mut self, dt: f64, i_ext: f64) -> Result<bool> {
        self.spike_flag = false;
        self.v = self.v.clamp(-90.0, 40.0);

        let i_ext = if i_ext.is_finite() { i_ext } else { 0.0 };
        let total_current = i_ext + self.i_syn_total;
        self.i_syn_total = 0.0;

        match self.mode {
            Mode::Active => {
                let table = shared_table();
                let idx = table.index_for(self.v);
                let (tm, mi, th, hi, tn, ni) = (
                    table.tau_m[idx],
                    table.m_inf[idx],
                    table.tau_h[idx],
                    table.h_inf[idx],
                    table.tau_n[idx],
                    table.n_inf[idx],
                );

                self.m = (self.m + (dt / tm) * (mi - self.m)).clamp(0.0, 1.0);
                self.h = (self.h + (dt / th) * (hi - self.h)).clamp(0.0, 1.0);
                self.n = (self.n + (dt / tn) * (ni - self.n)).clamp(0.0, 1.0);

                let i_na = self.params.g_na * self.m.powi(3) * self.h * (self.params.e_na - self.v);
                let i_k = self.params.g_k * self.n.powi(4) * (self.params.e_k - self.v);
                let i_l = self.params.g_l * (self.params.e_l - self.v);

                let dv = (i_na + i_k + i_l + total_current) / self.params.c_m;
                self.v = (self.v + dv * dt).clamp(-90.0, 40.0);

                if self.v > self.params.spike_thresh && self.ref_remaining <= 0.0 {
                    self.spike_flag = true;
                    self.ref_remaining = 5.0;
                }
                if self.v < -60.0 && self.ref_remaining <= 0.0 {
                    self.mode = Mode::Rest;
                    self.v = self.params.e_l;
                }
                if self.ref_remaining > 0.0 {
                    self.ref_remaining -= dt;
                }
            }
            Mode::Rest => {
                if total_current.abs() > 0.001 {
                    let dv = (self.params.g_l * (self.params.e_l - self.v) + total_current)
                        / self.params.c_m;
                    self.v += dv * dt;
                    if self.v > -55.0 || total_current > 5.0 {
                        self.mode = Mode::Active;
                    }
                } else {
                    self.v += 0.1 * (self.params.e_l - self.v);
                }
            }
        }

        if !self.v.is_finite() {
            return Err(CoreError::numeric_fault("HhQuickNeuron", format!("V={}", self.v)));
        }

        Ok(self.spike_flag)
    }

    /// Reset to the resting state
    pub fn reset(&mut self) {
        self.v = -70.0;
        self.m = 0.05;
        self.h = 0.6;
        self.n = 0.32;
        self.mode = Mode::Rest;
        self.ref_remaining = 0.0;
        self.i_syn_total = 0.0;
        self.spike_flag = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_construction_rests() {
        let n = HhQuickNeuron::new_default();
        assert_eq!(n.v(), -70.0);
        assert_eq!(n.mode, Mode::Rest);
    }

    #[test]
    fn test_weak_current_no_spike() {
        let mut n = HhQuickNeuron::new_default();
        for _ in 0..50 {
            n.step(0.1, 0.0).unwrap();
        }
        assert!(!n.spiking());
    }

    #[test]
    fn test_strong_current_spikes() {
        let mut n = HhQuickNeuron::new_default();
        let mut spiked = false;
        for _ in 0..200 {
            if n.step(0.1, 350.0).unwrap() {
                spiked = true;
                break;
            }
        }
        assert!(spiked, "strong sustained current should eventually spike");
    }

    #[test]
    fn test_refractory_blocks_immediate_respike() {
        let mut n = HhQuickNeuron::new_default();
        let mut first_spike_step = None;
        for i in 0..200 {
            if n.step(0.1, 350.0).unwrap() {
                first_spike_step = Some(i);
                break;
            }
        }
        assert!(first_spike_step.is_some());
        // immediately after the spike the refractory remainder is nonzero
        assert!(n.ref_remaining > 0.0);
    }

    #[test]
    fn test_voltage_always_in_bounds() {
        let mut n = HhQuickNeuron::new_default();
        for _ in 0..1000 {
            n.step(0.1, 500.0).unwrap();
            assert!(n.v() >= -90.0 && n.v() <= 40.0);
            let (m, h, ga) = n.gates();
            for g in [m, h, ga] {
                assert!((0.0..=1.0).contains(&g));
            }
        }
    }

    #[test]
    fn test_reset_restores_resting_state() {
        let mut n = HhQuickNeuron::new_default();
        for _ in 0..200 {
            n.step(0.1, 350.0).unwrap();
        }
        n.reset();
        assert_eq!(n.v(), -70.0);
        assert!(!n.spiking());
    }

    #[test]
    fn test_shared_table_reused_across_instances() {
        let _a = HhQuickNeuron::new_default();
        let _b = HhQuickNeuron::new_default();
        // both touch the same OnceLock; this just exercises the path without
        // panicking on double-initialisation.
        let table = shared_table();
        assert!(table.tau_m.len() > 1000);
    }
}
