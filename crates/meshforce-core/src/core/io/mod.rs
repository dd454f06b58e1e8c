//! Reading and writing mesh descriptions.
//!
//! A mesh file bundles the periodic box, the triangle types with their
//! area-conservation parameters, the particle positions and the triangles. The
//! [`traits::MeshFormat`] trait is the format-independent interface; [`mesh_file`]
//! implements it for the TOML layout used by the command-line tool.

pub mod mesh_file;
pub mod traits;
