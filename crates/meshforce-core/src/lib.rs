//! # meshforce
//!
//! Triangle area-conservation forces for surface meshes in periodic domains, plus the
//! energy difference of flipping a mesh edge.
//!
//! ## Architecture
//!
//! The library is split into three layers.
//!
//! - **[`core`]: The Foundation.** Stateless mesh models (`MeshSystem`, `ParticleSnapshot`,
//!   `PeriodicBox`), the pure potential (`potentials`) and mesh file I/O.
//!
//! - **[`engine`]: The Evaluators.** The `ForceEngine` capability with a sequential reference
//!   implementation and a data-parallel accelerated one, the per-kernel `Autotuner`, and the
//!   collective `Communicator` used to sum the mesh area across partitions.
//!
//! - **[`workflows`]: The Public API.** Force evaluation with a summary report and
//!   Monte-Carlo edge-flip sweeps.

pub mod core;
pub mod engine;
pub mod workflows;
