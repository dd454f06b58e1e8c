//! Kernels of the accelerated force engine.
//!
//! A step runs [`gather`] (resolve triangle vertices, detect faults, build the
//! per-particle triangle table), then [`force_pass`] and [`area_pass`]. Each pass takes
//! the work-group size chosen by its own autotuner; the size only controls how work is
//! split across the thread pool.

pub mod area_pass;
pub mod coefficients;
pub mod force_pass;
pub mod gather;
