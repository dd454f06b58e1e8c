//! # Engine Module
//!
//! Stateful force evaluation on top of the pure kernels in [`crate::core`].
//!
//! ## Overview
//!
//! A [`backend::ForceEngine`] evaluates the triangle area-conservation potential for one
//! mesh partition. Two implementations exist, selected at construction time through
//! [`config::Backend`]:
//!
//! - [`reference::ReferenceEngine`] walks the triangles sequentially.
//! - [`accelerated::AcceleratedEngine`] runs data-parallel passes on the rayon pool with
//!   work-group sizes picked by per-kernel [`tuner::Autotuner`]s.
//!
//! Both detect triangles that reference particles missing from the local arrays and
//! return the fault as an error. Both reduce the mesh area across partitions through a
//! [`comm::Communicator`].
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Backend choice, virial flag, tuner and flip settings
//! - **Collectives** ([`comm`]) - Serial and in-process partition groups
//! - **Tuning** ([`tuner`]) - Warm-up, scan and converge over candidate work-group sizes
//! - **Progress Monitoring** ([`progress`]) - Callback-based progress events
//! - **Error Handling** ([`error`]) - Step-level failures, including connectivity faults

pub mod accelerated;
pub mod backend;
pub mod comm;
pub mod config;
pub mod error;
pub mod progress;
pub mod reference;
pub(crate) mod tasks;
pub mod tuner;
