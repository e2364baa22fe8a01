//! Spiking neuron kernels, the STDP synapse, and cue-vectorization math
//! underlying the hippocampal word-store engine.
//!
//! This crate has no notion of words, populations, or sleep cycles; it is
//! the numeric substrate `hippo-runtime` is built on.

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod cue_vector;
pub mod error;
pub mod neuron;
pub mod synapse;

pub use error::{CoreError, Result};
pub use neuron::{
    AxonConfig, HhLifNeuron, HhLifParams, HhQuickMode, HhQuickNeuron, HhQuickParams, IzhikevichNeuron,
    IzhikevichParams, IzhikevichPreset, Kernel, MyelinatedAxon, NeuronVariant,
};
pub use synapse::{StdpParams, StdpSynapse};
