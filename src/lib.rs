#![doc = include_str!("../README.md")]

// Core model modules.
pub mod error;
pub mod model;
pub mod prob;
pub mod sample;
pub mod sampler;
pub mod transform;

// Ambient support for the binaries.
pub mod config;
pub mod io;

// --- High-level re-exports -------------------------------------------------

// Main entry points: the generative model and the samplers.
pub use crate::model::BayesNet;
pub use crate::sampler::{ChainSampler, MultiChainSampler, ProposalScales};

// The latent-variable assignment and its pieces.
pub use crate::sample::{FractureSample, Sample, SampleRecord, StickStates};

// Crate-wide error type.
pub use crate::error::{ModelError, Result};

// Transform helpers that are generally useful on their own.
pub use crate::transform::{apply_transform, apply_transform_point};

/// Small prelude for quick experiments.
pub mod prelude {
    pub use crate::sampler::spawn_rngs;
    pub use crate::{BayesNet, ModelError, MultiChainSampler, ProposalScales, Sample};
}
