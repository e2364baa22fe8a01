//! Discretized myelinated axon cable with saltatory conduction.
//!
//! A 1-D chain of compartments alternating node-of-Ranvier (fast Na+, low
//! capacitance-to-leak ratio) and internode (myelin, mostly passive) segments.
//! Diffusion between compartments is a discrete Laplacian with zero-flux
//! (Neumann) boundaries; the explicit Euler step is substepped to respect a
//! CFL stability bound on the diffusion term.

use crate::error::{CoreError, Result};

/// Geometry and biophysical constants for [`MyelinatedAxon`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxonConfig {
    /// Number of compartments
    pub n: usize,
    /// Spacing, in compartments, between successive nodes of Ranvier
    pub node_period: usize,
    /// Resting potential
    pub v_rest: f64,
    /// Compartment spacing
    pub dx: f64,
    /// Fraction of the CFL bound actually used for substepping
    pub cfl_safety: f64,
    /// Diffusion coefficient at node compartments
    pub d_node: f64,
    /// Diffusion coefficient at internode (myelinated) compartments
    pub d_internode: f64,
    /// Membrane capacitance at node compartments
    pub cm_node: f64,
    /// Membrane capacitance at myelinated compartments
    pub cm_myelin: f64,
    /// Leak conductance at node compartments
    pub gl_node: f64,
    /// Leak conductance at myelinated compartments
    pub gl_myelin: f64,
    /// Leak reversal potential
    pub e_l: f64,
    /// Crossing-detection threshold for velocity measurement
    pub thresh: f64,
    /// Coupling gain from the soma into compartment 0
    pub coupling: f64,
    /// Na+ reversal potential at node compartments
    pub node_e_na: f64,
    /// Peak Na+ conductance at node compartments
    pub node_g_na: f64,
    /// Activation gate time constant at node compartments
    pub node_m_tau: f64,
    /// Inactivation gate time constant at node compartments
    pub node_h_tau: f64,
    /// Steepness of the activation sigmoid
    pub node_m_inf_k: f64,
    /// Half-activation voltage of the activation sigmoid
    pub node_m_inf_vh: f64,
    /// Steepness of the inactivation sigmoid (negative: inactivates on depolarization)
    pub node_h_inf_k: f64,
    /// Half-inactivation voltage of the inactivation sigmoid
    pub node_h_inf_vh: f64,
    /// Alpha-kernel peak current
    pub alpha_i0: f64,
    /// Alpha-kernel rise time constant
    pub alpha_tau_r: f64,
    /// Alpha-kernel decay time constant
    pub alpha_tau_d: f64,
}

impl Default for AxonConfig {
    fn default() -> Self {
        Self {
            n: 121,
            node_period: 10,
            v_rest: -70.0,
            dx: 1e-3,
            cfl_safety: 0.5,
            d_node: 0.5,
            d_internode: 0.01,
            cm_node: 1.0,
            cm_myelin: 0.01,
            gl_node: 0.1,
            gl_myelin: 0.001,
            e_l: -70.0,
            thresh: -20.0,
            coupling: 0.1,
            node_e_na: 50.0,
            node_g_na: 800.0,
            node_m_tau: 0.1,
            node_h_tau: 0.5,
            node_m_inf_k: 5.0,
            node_m_inf_vh: -40.0,
            node_h_inf_k: -5.0,
            node_h_inf_vh: -50.0,
            alpha_i0: 0.0,
            alpha_tau_r: 0.5,
            alpha_tau_d: 3.0,
        }
    }
}

fn sigmoid(v: f64, vh: f64, k: f64) -> f64 {
    1.0 / (1.0 + (-(v - vh) / k).exp())
}

/// A pending alpha-shaped current injection at the soma-coupled end.
#[derive(Debug, Clone, Copy)]
struct AlphaTrigger {
    onset_ms: f64,
}

/// Discretized myelinated axon with saltatory conduction.
#[derive(Debug, Clone)]
pub struct MyelinatedAxon {
    config: AxonConfig,
    v: Vec<f64>,
    is_node: Vec<bool>,
    m: Vec<f64>,
    h: Vec<f64>,
    triggers: Vec<AlphaTrigger>,
    last_crossing_ms: Vec<Option<f64>>,
    crossing_intervals: Vec<f64>,
    t_ms: f64,
}

impl MyelinatedAxon {
    /// Build a new axon cable from `config`, all compartments at rest.
    pub fn new(config: AxonConfig) -> Self {
        let n = config.n;
        let is_node: Vec<bool> = (0..n).map(|i| i % config.node_period == 0).collect();
        Self {
            v: vec![config.v_rest; n],
            m: vec![0.0; n],
            h: vec![1.0; n],
            triggers: Vec::new(),
            last_crossing_ms: vec![None; n],
            crossing_intervals: Vec::new(),
            is_node,
            config,
            t_ms: 0.0,
        }
    }

    /// Construct with default configuration
    pub fn new_default() -> Self {
        Self::new(AxonConfig::default())
    }

    /// Compartment voltages
    pub fn voltages(&self) -> &[f64] {
        &self.v
    }

    /// Queue an alpha-shaped current pulse onto compartment 0, starting now.
    pub fn trigger_alpha(&mut self) {
        self.triggers.push(AlphaTrigger { onset_ms: self.t_ms });
    }

    fn alpha_kernel(&self) -> f64 {
        let mut total = 0.0;
        for trig in &self.triggers {
            let dt = self.t_ms - trig.onset_ms;
            if dt > 0.0 {
                total += self.config.alpha_i0
                    * ((-dt / self.config.alpha_tau_d).exp() - (-dt / self.config.alpha_tau_r).exp());
            }
        }
        total.max(0.0)
    }

    fn laplacian(&self) -> Vec<f64> {
        let n = self.v.len();
        let dx2 = self.config.dx * self.config.dx;
        let mut lap = vec![0.0; n];
        if n < 2 {
            return lap;
        }
        lap[0] = 2.0 * (self.v[1] - self.v[0]) / dx2;
        for i in 1..n - 1 {
            lap[i] = (self.v[i + 1] - 2.0 * self.v[i] + self.v[i - 1]) / dx2;
        }
        lap[n - 1] = 2.0 * (self.v[n - 2] - self.v[n - 1]) / dx2;
        lap
    }

    fn cfl_dt(&self) -> f64 {
        let d_max = self.config.d_node.max(self.config.d_internode);
        self.config.cfl_safety * self.config.dx * self.config.dx / (2.0 * d_max)
    }

    fn record_crossings(&mut self) {
        for i in 0..self.v.len() {
            if self.v[i] > self.config.thresh {
                if self.last_crossing_ms[i].is_none() {
                    if let Some(prev) = self.last_crossing_ms[..i]
                        .iter()
                        .rev()
                        .find_map(|c| *c)
                    {
                        let dt = self.t_ms - prev;
                        if dt > 0.0 {
                            self.crossing_intervals.push(dt);
                        }
                    }
                    self.last_crossing_ms[i] = Some(self.t_ms);
                }
            } else {
                self.last_crossing_ms[i] = None;
            }
        }
    }

    /// Advance the cable by `dt_elec` milliseconds, injecting `i0_from_soma` at
    /// compartment 0, substepping internally to respect the CFL bound.
    pub fn step(&mut self, dt_elec: f64, i0_from_soma: f64) -> Result<()> {
        let dt_max = self.cfl_dt();
        let n_sub = ((dt_elec / dt_max).ceil() as usize).max(1);
        let sub_dt = dt_elec / n_sub as f64;

        for _ in 0..n_sub {
            let lap = self.laplacian();
            let alpha_current = self.alpha_kernel();

            let len = self.v.len();
            let mut next_v = vec![0.0; len];
            for i in 0..len {
                let is_node = self.is_node[i];
                let d = if is_node { self.config.d_node } else { self.config.d_internode };
                let cm = if is_node { self.config.cm_node } else { self.config.cm_myelin };
                let gl = if is_node { self.config.gl_node } else { self.config.gl_myelin };

                let mut i_ext = 0.0;
                if i == 0 {
                    i_ext += self.config.coupling * i0_from_soma + alpha_current;
                }

                let i_na = if is_node {
                    let m_inf = sigmoid(self.v[i], self.config.node_m_inf_vh, self.config.node_m_inf_k);
                    let h_inf = sigmoid(self.v[i], self.config.node_h_inf_vh, self.config.node_h_inf_k);
                    self.m[i] += sub_dt * (m_inf - self.m[i]) / self.config.node_m_tau;
                    self.h[i] += sub_dt * (h_inf - self.h[i]) / self.config.node_h_tau;
                    self.m[i] = self.m[i].clamp(0.0, 1.0);
                    self.h[i] = self.h[i].clamp(0.0, 1.0);
                    self.config.node_g_na * self.m[i].powi(3) * self.h[i] * (self.config.node_e_na - self.v[i])
                } else {
                    0.0
                };

                let dv = d * lap[i] - gl * (self.v[i] - self.config.e_l) / cm + (i_ext + i_na) / cm;
                next_v[i] = (self.v[i] + dv * sub_dt).clamp(-90.0, 50.0);
            }
            self.v = next_v;
            self.t_ms += sub_dt;
            self.record_crossings();
        }

        self.triggers.retain(|t| self.t_ms - t.onset_ms < 10.0 * self.config.alpha_tau_d);

        if self.v.iter().any(|v| !v.is_finite()) {
            return Err(CoreError::numeric_fault("MyelinatedAxon", "non-finite compartment voltage"));
        }

        Ok(())
    }

    /// Saltatory conduction velocity estimated from the most recent node-to-node
    /// crossing intervals, in meters per second. `None` if fewer than one
    /// crossing interval has been observed yet.
    pub fn velocity_last(&self) -> Option<f64> {
        if self.crossing_intervals.is_empty() {
            return None;
        }
        let mean_dt_ms: f64 =
            self.crossing_intervals.iter().sum::<f64>() / self.crossing_intervals.len() as f64;
        if mean_dt_ms <= 0.0 {
            return None;
        }
        let node_spacing_m = self.config.node_period as f64 * self.config.dx * 0.01;
        Some(node_spacing_m / (mean_dt_ms * 1e-3))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_at_rest() {
        let axon = MyelinatedAxon::new_default();
        assert!(axon.voltages().iter().all(|&v| v == -70.0));
    }

    #[test]
    fn test_soma_injection_depolarizes_first_compartment() {
        let mut axon = MyelinatedAxon::new_default();
        for _ in 0..50 {
            axon.step(0.1, 500.0).unwrap();
        }
        assert!(axon.voltages()[0] > -70.0);
    }

    #[test]
    fn test_voltages_stay_in_bounds() {
        let mut axon = MyelinatedAxon::new_default();
        for _ in 0..200 {
            axon.step(0.1, 1000.0).unwrap();
            for &v in axon.voltages() {
                assert!((-90.0..=50.0).contains(&v));
            }
        }
    }

    #[test]
    fn test_no_crossings_without_stimulus() {
        let mut axon = MyelinatedAxon::new_default();
        for _ in 0..100 {
            axon.step(0.1, 0.0).unwrap();
        }
        assert!(axon.velocity_last().is_none());
    }

    #[test]
    fn test_sustained_drive_propagates_and_yields_velocity() {
        let mut axon = MyelinatedAxon::new_default();
        for _ in 0..2000 {
            axon.step(0.1, 1200.0).unwrap();
        }
        assert!(axon.velocity_last().is_some());
    }
}
