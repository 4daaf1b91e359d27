//! Crate-wide error type.
//!
//! Every failure names the offending variable or computation so a failed
//! sampling run can be traced back to the value that caused it. Proposal
//! rejection in the Metropolis-Hastings samplers is not an error and never
//! surfaces here.

use std::fmt;

/// Reasons why model construction, sampling, or record loading may fail.
#[derive(Clone, Debug, PartialEq)]
pub enum ModelError {
    /// Homogeneous divide hit a vanishing or non-finite `w` component.
    DegeneratePoint { index: usize, w: f64 },
    /// A distribution was given a non-positive or non-finite scale.
    InvalidScale { what: &'static str, value: f64 },
    /// A distribution support contains no admissible value.
    EmptySupport { what: &'static str, low: f64, high: f64 },
    /// A success probability fell outside `(0, 1)`.
    InvalidProbability { what: &'static str, value: f64 },
    /// A stick segment would have a non-positive length.
    DegenerateLength { length: f64 },
    /// A stick lifetime window `[start, end)` is empty or leaves the
    /// simulated sequence.
    InvalidLifetime { start: usize, end: usize },
    /// A fracture node carries exactly one child.
    MalformedFractureTree { fr_time: usize },
    /// A persisted record carries an unsupported format version tag.
    VersionMismatch { expected: &'static str, found: String },
    /// The observed-endpoint list does not cover the frame count.
    FrameCountMismatch { expected: usize, found: usize },
    /// An observed frame holds a different endpoint count than the
    /// trajectory recomputed from the latent state.
    EndpointCountMismatch {
        frame: usize,
        expected: usize,
        found: usize,
    },
    /// The multi-chain runner was handed the wrong number of RNGs.
    ChainCountMismatch { chains: usize, rngs: usize },
    /// A model or run parameter is out of range.
    InvalidConfig { what: &'static str, value: f64 },
}

pub type Result<T> = std::result::Result<T, ModelError>;

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::DegeneratePoint { index, w } => {
                write!(f, "degenerate homogeneous point {index} (w={w:e})")
            }
            ModelError::InvalidScale { what, value } => {
                write!(f, "invalid scale for {what}: {value}")
            }
            ModelError::EmptySupport { what, low, high } => {
                write!(f, "empty support for {what}: [{low}, {high})")
            }
            ModelError::InvalidProbability { what, value } => {
                write!(f, "invalid success probability for {what}: {value}")
            }
            ModelError::DegenerateLength { length } => {
                write!(f, "degenerate stick length: {length}")
            }
            ModelError::InvalidLifetime { start, end } => {
                write!(f, "invalid stick lifetime window [{start}, {end})")
            }
            ModelError::MalformedFractureTree { fr_time } => {
                write!(f, "fracture node at frame {fr_time} has exactly one child")
            }
            ModelError::VersionMismatch { expected, found } => {
                write!(
                    f,
                    "unsupported sample format version '{found}' (expected '{expected}')"
                )
            }
            ModelError::FrameCountMismatch { expected, found } => {
                write!(f, "observation covers {found} frames, expected {expected}")
            }
            ModelError::EndpointCountMismatch {
                frame,
                expected,
                found,
            } => {
                write!(
                    f,
                    "frame {frame}: {found} observed endpoints, expected {expected}"
                )
            }
            ModelError::ChainCountMismatch { chains, rngs } => {
                write!(f, "{rngs} rngs supplied for {chains} chains")
            }
            ModelError::InvalidConfig { what, value } => {
                write!(f, "invalid {what}: {value}")
            }
        }
    }
}

impl std::error::Error for ModelError {}
