//! # Core Models Module
//!
//! Data structures describing what a force evaluation operates on.
//!
//! ## Key Components
//!
//! - [`ids`] - Particle tags, triangle type ids and the local-index convention
//! - [`periodic_box`] - Triclinic periodic box with the minimum-image convention
//! - [`particles`] - Per-partition position snapshot (owned particles, then ghosts) and
//!   the tag → local-index reverse map
//! - [`topology`] - Mesh triangles, triangle types and edge adjacency
//! - [`system`] - The three bundled together
//!
//! ## Usage
//!
//! ```ignore
//! use meshforce::core::models::{particles::ParticleSnapshot, topology::{MeshTopology, Triangle}};
//!
//! let topology = MeshTopology::new(vec!["membrane".into()], vec![Triangle::new(0, 1, 2, 0)])?;
//! let particles = ParticleSnapshot::from_owned(&positions)?;
//! let system = MeshSystem::new(topology, particles, PeriodicBox::cubic(20.0));
//! ```

pub mod ids;
pub mod particles;
pub mod periodic_box;
pub mod system;
pub mod topology;
