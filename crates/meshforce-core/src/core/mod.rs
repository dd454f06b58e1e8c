//! # Core Module
//!
//! Stateless building blocks shared by every force engine.
//!
//! - **Mesh representation** ([`models`]) - Particle snapshots, triangles, triangle types
//!   and the periodic box
//! - **Potential** ([`forcefield`]) - Per-type parameters, the triangle geometry kernel,
//!   vertex forces and the edge-flip energy difference
//! - **File I/O** ([`io`]) - Reading and writing mesh descriptions
//!
//! Nothing here knows about threads, partitions or tuning; those live in the engine.

pub mod forcefield;
pub mod io;
pub mod models;
