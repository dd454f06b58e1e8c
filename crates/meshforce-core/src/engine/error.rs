use std::fmt;
use thiserror::Error;

use super::comm::CommError;
use super::config::ConfigError;
use crate::core::forcefield::params::ParamError;
use crate::core::models::ids::{NOT_LOCAL, ParticleTag, TriangleTypeId};
use crate::core::models::topology::TopologyError;

/// A triangle whose vertex does not resolve to a valid local particle.
///
/// Returned by the pass that resolves triangle vertices; no results of a step that
/// produced a fault are ever exposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriangleFault {
    pub triangle: usize,
    pub tag: ParticleTag,
    /// Raw reverse-map entry, [`NOT_LOCAL`] when the tag has no local copy.
    pub local_index: u32,
    /// Number of local (owned plus ghost) particles.
    pub limit: usize,
}

impl fmt::Display for TriangleFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.local_index == NOT_LOCAL {
            write!(
                f,
                "triangle {} references particle tag {}, which has no local copy",
                self.triangle, self.tag
            )
        } else {
            write!(
                f,
                "triangle {} references particle tag {} at local index {}, outside the {} local particle(s)",
                self.triangle, self.tag, self.local_index, self.limit
            )
        }
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Mesh connectivity fault: {0}")]
    TriangleOutOfBounds(TriangleFault),

    #[error("Parameter error: {source}")]
    Params {
        #[from]
        source: ParamError,
    },

    #[error("Evaluation failed on {partitions} other partition(s)")]
    PeerFault { partitions: usize },

    #[error("Collective reduction failed: {0}")]
    Collective(#[from] CommError),

    #[error("Invalid mesh topology: {0}")]
    Topology(#[from] TopologyError),

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Particle tag {0} has no local copy on this partition")]
    UnknownParticle(ParticleTag),

    #[error("Unknown triangle type '{0}'")]
    UnknownTypeName(String),

    #[error("Mesh defines {found} triangle type(s) but the engine was created for {expected}")]
    TypeCountMismatch { expected: usize, found: usize },

    #[error("Triangle type {0} is used by the mesh but has no area-conservation parameters")]
    MissingParams(TriangleTypeId),

    #[error("Edge flips need the whole mesh on a single partition")]
    DistributedFlip,
}

impl From<TriangleFault> for EngineError {
    fn from(fault: TriangleFault) -> Self {
        EngineError::TriangleOutOfBounds(fault)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fault_message_distinguishes_missing_and_stale_entries() {
        let missing = TriangleFault {
            triangle: 3,
            tag: ParticleTag(7),
            local_index: NOT_LOCAL,
            limit: 10,
        };
        assert!(missing.to_string().contains("no local copy"));

        let stale = TriangleFault {
            local_index: 12,
            ..missing
        };
        let message = EngineError::from(stale).to_string();
        assert!(message.contains("local index 12"));
        assert!(message.contains("10 local particle"));
    }
}
