//! Hodgkin-Huxley gating combined with a hard leaky-integrate-and-fire reset rule.
//!
//! Unlike [`super::hh_quick`], gate rate functions are evaluated directly every
//! step rather than through the shared lookup table: this variant targets
//! mid-size populations where the simpler per-step cost beats the table's
//! amortised lookup, not the single detailed soma the table was built for.

use crate::error::{CoreError, Result};

/// Biophysical and reset-rule constants for [`HhLifNeuron`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HhLifParams {
    /// Na+ conductance
    pub g_na: f64,
    /// K+ conductance
    pub g_k: f64,
    /// Leak conductance (larger than HHQuick's, the LIF-flavoured leak)
    pub g_l: f64,
    /// Na+ reversal potential
    pub e_na: f64,
    /// K+ reversal potential
    pub e_k: f64,
    /// Leak reversal potential
    pub e_l: f64,
    /// Membrane capacitance
    pub c_m: f64,
    /// Hard spike threshold
    pub v_th: f64,
    /// Post-spike reset potential
    pub v_reset: f64,
    /// Refractory period in ms
    pub ref_period: f64,
}

impl Default for HhLifParams {
    fn default() -> Self {
        Self {
            g_na: 120.0,
            g_k: 36.0,
            g_l: 0.3,
            e_na: 50.0,
            e_k: -77.0,
            e_l: -54.4,
            c_m: 1.0,
            v_th: -50.0,
            v_reset: -70.0,
            ref_period: 2.0,
        }
    }
}

fn alpha_m(v: f64) -> f64 {
    let x = v + 40.0;
    if x.abs() > 1e-5 {
        0.1 * x / (1.0 - (-x / 10.0).exp())
    } else {
        1.0
    }
}

fn beta_m(v: f64) -> f64 {
    4.0 * (-(v + 65.0) / 18.0).exp()
}

fn alpha_h(v: f64) -> f64 {
    0.07 * (-(v + 65.0) / 20.0).exp()
}

fn beta_h(v: f64) -> f64 {
    1.0 / (1.0 + (-(v + 35.0) / 10.0).exp())
}

fn alpha_n(v: f64) -> f64 {
    let x = v + 55.0;
    if x.abs() > 1e-5 {
        0.01 * x / (1.0 - (-x / 10.0).exp())
    } else {
        0.1
    }
}

fn beta_n(v: f64) -> f64 {
    0.125 * (-(v + 65.0) / 80.0).exp()
}

/// HH-gated neuron with a LIF reset rule.
#[derive(Debug, Clone)]
pub struct HhLifNeuron {
    params: HhLifParams,
    v: f64,
    m: f64,
    h: f64,
    n: f64,
    ref_remaining: f64,
    spike_flag: bool,
    spike_count: u64,
}

impl HhLifNeuron {
    /// Construct at the resting state with the given parameters
    pub fn new(params: HhLifParams) -> Self {
        Self {
            params,
            v: -70.0,
            m: 0.05,
            h: 0.60,
            n: 0.32,
            ref_remaining: 0.0,
            spike_flag: false,
            spike_count: 0,
        }
    }

    /// Construct with default parameters
    pub fn new_default() -> Self {
        Self::new(HhLifParams::default())
    }

    /// Membrane potential
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

    /// Total spikes since construction or last reset
    pub fn spike_count(&self) -> u64 {
        self.spike_count
    }

    /// Advance by `dt` milliseconds under injected current `i_ext`.
    pub fn step(&mut self, dt: f64, i_ext: f64) -> Result<bool> {
        let i_ext = if i_ext.is_finite() { i_ext } else { 0.0 };

        if self.ref_remaining > 0.0 {
            self.ref_remaining -= dt;
            self.spike_flag = false;
            return Ok(false);
        }

        let am = alpha_m(self.v);
        let bm = beta_m(self.v);
        let ah = alpha_h(self.v);
        let bh = beta_h(self.v);
        let an = alpha_n(self.v);
        let bn = beta_n(self.v);

        self.m = (self.m + dt * (am * (1.0 - self.m) - bm * self.m)).clamp(0.0, 1.0);
        self.h = (self.h + dt * (ah * (1.0 - self.h) - bh * self.h)).clamp(0.0, 1.0);
        self.n = (self.n + dt * (an * (1.0 - self.n) - bn * self.n)).clamp(0.0, 1.0);

        let i_na = self.params.g_na * self.m.powi(3) * self.h * (self.params.e_na - self.v);
        let i_k = self.params.g_k * self.n.powi(4) * (self.params.e_k - self.v);
        let i_l = self.params.g_l * (self.params.e_l - self.v);

        let dv = (i_ext + i_na + i_k + i_l) / self.params.c_m;
        self.v = (self.v + dv * dt).clamp(-100.0, 50.0);

        if self.v >= self.params.v_th {
            self.spike_flag = true;
            self.spike_count += 1;
            self.v = self.params.v_reset;
            self.ref_remaining = self.params.ref_period;
        } else {
            self.spike_flag = false;
        }

        if !self.v.is_finite() {
            return Err(CoreError::numeric_fault("HhLifNeuron", format!("V={}", self.v)));
        }

        Ok(self.spike_flag)
    }

    /// Reset to the resting state
    pub fn reset(&mut self) {
        self.v = -70.0;
        self.m = 0.05;
        self.h = 0.60;
        self.n = 0.32;
        self.ref_remaining = 0.0;
        self.spike_flag = false;
        self.spike_count = 0;
    }
}
