//! Engine-wide configuration.

use hippo_core::{HhQuickParams, StdpParams};

/// Construction-time parameters for an [`crate::Engine`].
///
/// Mirrors the host's `NetworkConfig` / `SimulationParams` builder idiom: a
/// plain `Default` plus fluent `with_*` setters, no file or environment
/// loading (that belongs to a collaborator outside this crate).
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Maximum number of distinct words the store will hold
    pub capacity: usize,
    /// Seed for the engine-owned deterministic RNG
    pub rng_seed: u64,
    /// Default neuron parameters for DG, CA3 and CA1 populations
    pub neuron_params: HhQuickParams,
    /// Default STDP parameters for newly created synapses
    pub stdp_params: StdpParams,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            capacity: 1000,
            rng_seed: 0,
            neuron_params: HhQuickParams::default(),
            stdp_params: StdpParams::default(),
        }
    }
}

impl EngineConfig {
    /// Start from the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the word capacity
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Set the RNG seed
    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng_seed = seed;
        self
    }

    /// Set the default neuron parameters
    pub fn with_neuron_params(mut self, params: HhQuickParams) -> Self {
        self.neuron_params = params;
        self
    }

    /// Set the default STDP parameters
    pub fn with_stdp_params(mut self, params: StdpParams) -> Self {
        self.stdp_params = params;
        self
    }
}
