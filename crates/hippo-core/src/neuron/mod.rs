//! Spiking neuron kernels.
//!
//! Four variants, closed by design: [`HhQuickNeuron`] is the one the
//! hippocampal word-store populations actually use; [`IzhikevichNeuron`],
//! [`HhLifNeuron`] and [`MyelinatedAxon`] are offered as library surface for
//! callers outside the word store, not wired into it.

pub mod hh_lif;
pub mod hh_quick;
pub mod izhikevich;
pub mod myelinated_axon;

pub use hh_lif::{HhLifNeuron, HhLifParams};
pub use hh_quick::{HhQuickNeuron, HhQuickParams, Mode as HhQuickMode};
pub use izhikevich::{IzhikevichNeuron, IzhikevichParams, Preset as IzhikevichPreset};
pub use myelinated_axon::{AxonConfig, MyelinatedAxon};

use crate::error::Result;

/// Common single-compartment point-neuron contract shared by the three
/// point-neuron kernels (the axon cable is multi-compartment and does not
/// implement this).
pub trait Kernel {
    /// Advance by `dt` milliseconds under injected current `i_ext`, returning
    /// whether this step crossed threshold.
    fn step(&mut self, dt: f64, i_ext: f64) -> Result<bool>;

    /// Current membrane potential
    fn v(&self) -> f64;

    /// Whether the most recent step produced a spike
    fn spiking(&self) -> bool;

    /// Reset to the kernel's resting state
    fn reset(&mut self);
}

impl Kernel for HhQuickNeuron {
    fn step(&mut self, dt: f64, i_ext: f64) -> Result<bool> {
        HhQuickNeuron::step(self, dt, i_ext)
    }
    fn v(&self) -> f64 {
        HhQuickNeuron::v(self)
    }
    fn spiking(&self) -> bool {
        HhQuickNeuron::spiking(self)
    }
    fn reset(&mut self) {
        HhQuickNeuron::reset(self)
    }
}

impl Kernel for IzhikevichNeuron {
    fn step(&mut self, dt: f64, i_ext: f64) -> Result<bool> {
        IzhikevichNeuron::step(self, dt, i_ext)
    }
    fn v(&self) -> f64 {
        IzhikevichNeuron::v(self)
    }
    fn spiking(&self) -> bool {
        IzhikevichNeuron::spiking(self)
    }
    fn reset(&mut self) {
        IzhikevichNeuron::reset(self)
    }
}

impl Kernel for HhLifNeuron {
    fn step(&mut self, dt: f64, i_ext: f64) -> Result<bool> {
        HhLifNeuron::step(self, dt, i_ext)
    }
    fn v(&self) -> f64 {
        HhLifNeuron::v(self)
    }
    fn spiking(&self) -> bool {
        HhLifNeuron::spiking(self)
    }
    fn reset(&mut self) {
        HhLifNeuron::reset(self)
    }
}

/// A point-neuron kernel chosen at construction time, for callers that want
/// to pick a variant dynamically rather than at the type level.
#[derive(Debug, Clone)]
pub enum NeuronVariant {
    /// Detailed HH soma with shared lookup table; what the word store uses
    HhQuick(HhQuickNeuron),
    /// Izhikevich two-variable model
    Izhikevich(IzhikevichNeuron),
    /// HH gating with a hard LIF reset rule
    HhLif(HhLifNeuron),
}

impl Kernel for NeuronVariant {
    fn step(&mut self, dt: f64, i_ext: f64) -> Result<bool> {
        match self {
            NeuronVariant::HhQuick(n) => n.step(dt, i_ext),
            NeuronVariant::Izhikevich(n) => n.step(dt, i_ext),
            NeuronVariant::HhLif(n) => n.step(dt, i_ext),
        }
    }

    fn v(&self) -> f64 {
        match self {
            NeuronVariant::HhQuick(n) => n.v(),
            NeuronVariant::Izhikevich(n) => n.v(),
            NeuronVariant::HhLif(n) => n.v(),
        }
    }

    fn spiking(&self) -> bool {
        match self {
            NeuronVariant::HhQuick(n) => n.spiking(),
            NeuronVariant::Izhikevich(n) => n.spiking(),
            NeuronVariant::HhLif(n) => n.spiking(),
        }
    }

    fn reset(&mut self) {
        match self {
            NeuronVariant::HhQuick(n) => n.reset(),
            NeuronVariant::Izhikevich(n) => n.reset(),
            NeuronVariant::HhLif(n) => n.reset(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_dispatches_to_hh_quick() {
        let mut variant = NeuronVariant::HhQuick(HhQuickNeuron::new_default());
        assert_eq!(variant.v(), -70.0);
        variant.step(0.1, 0.0).unwrap();
    }

    #[test]
    fn test_variant_dispatches_to_izhikevich() {
        let mut variant = NeuronVariant::Izhikevich(IzhikevichNeuron::from_preset(IzhikevichPreset::FastSpiking));
        variant.step(1.0, 15.0).unwrap();
        variant.reset();
        assert_eq!(variant.v(), -70.0);
    }

    #[test]
    fn test_variant_dispatches_to_hh_lif() {
        let mut variant = NeuronVariant::HhLif(HhLifNeuron::new_default());
        assert!(!variant.spiking());
        variant.step(0.1, 0.0).unwrap();
    }
}
