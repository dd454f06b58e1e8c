//! # Workflows Module
//!
//! End-to-end procedures built from an engine and a mesh.
//!
//! - **Evaluation** ([`evaluate`]) - Builds the configured engine, runs one or more force
//!   evaluations and summarizes the result.
//! - **Edge flips** ([`flip`]) - Monte-Carlo sweeps over the interior edges of a mesh,
//!   accepting diagonal flips by the Metropolis rule on the flip energy difference.
//!
//! Both report progress through [`crate::engine::progress::ProgressReporter`].

pub mod evaluate;
pub mod flip;
