//! # Force Field Module
//!
//! Pure mathematics of the triangle area-conservation potential. Nothing in here owns
//! state or knows about partitions beyond the ownership flags it is handed.
//!
//! ## Overview
//!
//! Each triangle of type `t` is pulled toward the target area `A_t = A_mesh(t) / N(t)`,
//! where `N(t)` is the whole-mesh number of triangles of that type:
//!
//! `E = K/(2·A_t)·(A − A_t)²`
//!
//! The energy is split evenly between the three vertices.
//!
//! ## Key Components
//!
//! - [`params`] - Per-type stiffness and target mesh area
//! - [`potentials`] - Triangle geometry kernel, vertex forces, area attribution and the
//!   quad-flip energy difference
//! - [`term`] - Per-particle force, energy and virial accumulators
//!
//! ## Usage
//!
//! ```ignore
//! use meshforce::core::forcefield::potentials::{TriangleGeometry, triangle_area_conservation};
//!
//! let geom = TriangleGeometry::new(&a, &b, &c, &pbox);
//! let term = triangle_area_conservation(&geom, params.k, params.target_triangle_area(n));
//! ```

pub mod params;
pub mod potentials;
pub mod term;
