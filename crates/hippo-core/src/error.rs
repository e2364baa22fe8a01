//! Error types for the neuron kernels and synapse.

use thiserror::Error;

/// Result type for kernel-level operations
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors the numeric core can raise. Under the clamp rules in every kernel's
/// `step`, these should never be observed; they exist so a host can detect and
/// discard a corrupted engine instance rather than propagate NaN silently.
#[derive(Error, Debug)]
pub enum CoreError {
    /// A kernel observed non-finite state after a step that should have clamped it.
    #[error("numeric fault in {component}: {detail}")]
    NumericFault {
        /// Which kernel or synapse detected the fault
        component: String,
        /// Description of the offending value
        detail: String,
    },
}

impl CoreError {
    /// Construct a numeric fault error
    pub fn numeric_fault(component: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::NumericFault {
            component: component.into(),
            detail: detail.into(),
        }
    }
}
