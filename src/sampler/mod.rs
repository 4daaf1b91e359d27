//! Metropolis-Hastings inference over the latent initial conditions.
//!
//! A [`ChainSampler`] walks one chain: it seeds itself by redrawing the
//! inferable scalars of the observed sample from their priors, then proposes
//! symmetric Gaussian perturbations and accepts or rejects them against the
//! joint log-probability. [`MultiChainSampler`] runs several chains with
//! independent RNG streams and merges their output.
//!
//! Only the six scalars of the initial kinematic state are inferred. The
//! camera, the stick length, the fracture plan and the observations stay
//! pinned to the conditioning sample, so every chain explores the posterior
//! slice the observation defines.

mod chain;
mod multi;

pub use chain::ChainSampler;
pub use multi::{spawn_rngs, MultiChainSampler};

/// Default random-walk scale of the position coordinates, in world units.
pub const POS_PROPOSAL_SCALE: f64 = 0.1;
/// Default random-walk scale of the velocities, in world units per second.
pub const VEL_PROPOSAL_SCALE: f64 = 0.05;
/// Default random-walk scale of the orientation angle, in radians.
pub const ANGLE_PROPOSAL_SCALE: f64 = 0.05;
/// Default random-walk scale of the angular velocity, in radians per second.
pub const ANG_VEL_PROPOSAL_SCALE: f64 = 0.2;

/// Standard deviations of the Gaussian random-walk proposals, one per
/// kinematic quantity. Position and velocity share their scale across x
/// and y.
#[derive(Clone, Copy, Debug)]
pub struct ProposalScales {
    pub pos: f64,
    pub vel: f64,
    pub angle: f64,
    pub ang_vel: f64,
}

impl Default for ProposalScales {
    fn default() -> Self {
        Self {
            pos: POS_PROPOSAL_SCALE,
            vel: VEL_PROPOSAL_SCALE,
            angle: ANGLE_PROPOSAL_SCALE,
            ang_vel: ANG_VEL_PROPOSAL_SCALE,
        }
    }
}

#[cfg(test)]
mod tests;
