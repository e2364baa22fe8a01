//! Izhikevich two-variable neuron model, for populations where HH-level detail is
//! not needed.

use crate::error::{CoreError, Result};

/// Named parameter presets reproducing common firing patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    /// Tonic, regular firing under sustained current
    RegularSpiking,
    /// High-frequency tonic firing
    FastSpiking,
    /// Bursts followed by high-frequency oscillation
    Chattering,
    /// A short initial burst followed by tonic spiking
    IntrinsicallyBursting,
    /// Low-threshold spiking
    LowThreshold,
}

/// Izhikevich `(a, b, c, d)` parameters plus initial `(v, u)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IzhikevichParams {
    /// Recovery time scale
    pub a: f64,
    /// Recovery sensitivity to `v`
    pub b: f64,
    /// Post-spike reset value of `v`
    pub c: f64,
    /// Post-spike increment of `u`
    pub d: f64,
    /// Initial membrane potential
    pub v0: f64,
    /// Initial recovery variable
    pub u0: f64,
}

impl IzhikevichParams {
    /// Parameters for a named firing-pattern preset
    pub fn preset(preset: Preset) -> Self {
        match preset {
            Preset::RegularSpiking => Self { a: 0.02, b: 0.2, c: -65.0, d: 8.0, v0: -70.0, u0: -14.0 },
            Preset::FastSpiking => Self { a: 0.1, b: 0.2, c: -65.0, d: 2.0, v0: -70.0, u0: -14.0 },
            Preset::Chattering => Self { a: 0.02, b: 0.2, c: -50.0, d: 2.0, v0: -70.0, u0: -14.0 },
            Preset::IntrinsicallyBursting => Self { a: 0.02, b: 0.2, c: -55.0, d: 4.0, v0: -70.0, u0: -14.0 },
            Preset::LowThreshold => Self { a: 0.02, b: 0.25, c: -65.0, d: 2.0, v0: -70.0, u0: -14.0 },
        }
    }
}

impl Default for IzhikevichParams {
    fn default() -> Self {
        Self::preset(Preset::RegularSpiking)
    }
}

const SPIKE_THRESH: f64 = 30.0;

/// Izhikevich neuron state and integrator.
#[derive(Debug, Clone)]
pub struct IzhikevichNeuron {
    params: IzhikevichParams,
    v: f64,
    u: f64,
    spike_flag: bool,
    spike_count: u64,
}

impl IzhikevichNeuron {
    /// Construct from explicit parameters
    pub fn new(params: IzhikevichParams) -> Self {
        Self {
            v: params.v0,
            u: params.u0,
            params,
            spike_flag: false,
            spike_count: 0,
        }
    }

    /// Construct from a named preset
    pub fn from_preset(preset: Preset) -> Self {
        Self::new(IzhikevichParams::preset(preset))
    }

    /// Membrane potential `v`
    pub fn v(&self) -> f64 {
        self.v
    }

    /// Recovery variable `u`
    pub fn u(&self) -> f64 {
        self.u
    }

    /// Total spikes fired since construction or last reset
    pub fn spike_count(&self) -> u64 {
        self.spike_count
    }

    /// Whether the most recent step produced a spike
    pub fn spiking(&self) -> bool {
        self.spike_flag
    }

    /// Advance by `dt` milliseconds under injected current `i_ext`.
    pub fn step(&mut self, dt: f64, i_ext: f64) -> Result<bool> {
        let i_ext = if i_ext.is_finite() { i_ext } else { 0.0 };

        if self.v >= SPIKE_THRESH {
            self.spike_flag = true;
            self.spike_count += 1;
            self.v = self.params.c;
            self.u += self.params.d;
        } else {
            self.spike_flag = false;
        }

        let dv = 0.04 * self.v * self.v + 5.0 * self.v + 140.0 - self.u + i_ext;
        let du = self.params.a * (self.params.b * self.v - self.u);

        self.v += dv * dt;
        self.u += du * dt;
        self.v = self.v.clamp(-100.0, 50.0);

        if !self.v.is_finite() || !self.u.is_finite() {
            return Err(CoreError::numeric_fault(
                "IzhikevichNeuron",
                format!("v={} u={}", self.v, self.u),
            ));
        }

        Ok(self.spike_flag)
    }

    /// Reset to the preset's initial state
    pub fn reset(&mut self) {
        self.v = self.params.v0;
        self.u = self.params.u0;
        self.spike_flag = false;
        self.spike_count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_regular_spiking() {
        let n = IzhikevichNeuron::new(IzhikevichParams::default());
        assert_eq!(n.v(), -70.0);
    }

    #[test]
    fn test_no_spike_without_current() {
        let mut n = IzhikevichNeuron::from_preset(Preset::RegularSpiking);
        for _ in 0..100 {
            n.step(1.0, 0.0).unwrap();
        }
        assert!(!n.spiking());
    }

    #[test]
    fn test_strong_current_spikes_and_resets() {
        let mut n = IzhikevichNeuron::from_preset(Preset::RegularSpiking);
        let mut spiked = false;
        for _ in 0..1000 {
            if n.step(1.0, 15.0).unwrap() {
                spiked = true;
                assert_eq!(n.v(), n_params_c(&n));
                break;
            }
        }
        assert!(spiked);
    }

    fn n_params_c(n: &IzhikevichNeuron) -> f64 {
        // regular spiking preset's reset value
        n.params.c
    }

    #[test]
    fn test_fast_spiking_fires_more_readily() {
        let mut rs = IzhikevichNeuron::from_preset(Preset::RegularSpiking);
        let mut fs = IzhikevichNeuron::from_preset(Preset::FastSpiking);
        let mut rs_spikes = 0;
        let mut fs_spikes = 0;
        for _ in 0..500 {
            if rs.step(1.0, 10.0).unwrap() {
                rs_spikes += 1;
            }
            if fs.step(1.0, 10.0).unwrap() {
                fs_spikes += 1;
            }
        }
        assert!(fs_spikes >= rs_spikes);
    }

    #[test]
    fn test_reset() {
        let mut n = IzhikevichNeuron::from_preset(Preset::Chattering);
        for _ in 0..200 {
            n.step(1.0, 15.0).unwrap();
        }
        n.reset();
        assert_eq!(n.spike_count(), 0);
        assert_eq!(n.v(), -70.0);
    }
}
