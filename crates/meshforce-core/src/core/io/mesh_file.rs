use super::traits::MeshFormat;
use crate::core::forcefield::params::{ParamError, ParamTable, TriangleAreaParams};
use crate::core::models::ids::{ParticleTag, TriangleTypeId};
use crate::core::models::particles::{ParticleSnapshot, SnapshotError};
use crate::core::models::periodic_box::PeriodicBox;
use crate::core::models::system::MeshSystem;
use crate::core::models::topology::{MeshTopology, Triangle, TopologyError};
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use std::io::{self, BufRead, Write};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MeshFileError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Invalid mesh topology: {0}")]
    Topology(#[from] TopologyError),
    #[error("Invalid particle list: {0}")]
    Particles(#[from] SnapshotError),
    #[error("Invalid triangle parameters: {0}")]
    Params(#[from] ParamError),
    #[error("Triangle {triangle} refers to unknown type '{name}'")]
    UnknownTypeName { triangle: usize, name: String },
    #[error("Triangle {triangle} refers to particle tag {tag}, which is not listed")]
    MissingParticle { triangle: usize, tag: ParticleTag },
    #[error("Box lengths must be positive, got [{0}, {1}, {2}]")]
    InvalidBox(f64, f64, f64),
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
struct BoxRecord {
    lengths: [f64; 3],
    #[serde(default)]
    tilts: [f64; 3],
    #[serde(default = "all_periodic")]
    periodic: [bool; 3],
}

fn all_periodic() -> [bool; 3] {
    [true; 3]
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
struct TypeRecord {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    k: Option<f64>,
    #[serde(default, rename = "A_mesh", skip_serializing_if = "Option::is_none")]
    a_mesh: Option<f64>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
struct ParticleRecord {
    tag: u32,
    position: [f64; 3],
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
struct TriangleRecord {
    tags: [u32; 3],
    #[serde(rename = "type")]
    type_name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
struct MeshDocument {
    #[serde(rename = "box")]
    pbox: BoxRecord,
    types: Vec<TypeRecord>,
    #[serde(default)]
    particles: Vec<ParticleRecord>,
    #[serde(default)]
    triangles: Vec<TriangleRecord>,
}

/// TOML mesh description.
///
/// ```toml
/// [box]
/// lengths = [20.0, 20.0, 20.0]
/// tilts = [0.0, 0.0, 0.0]        # xy, xz, yz; optional
/// periodic = [true, true, true]  # optional
///
/// [[types]]
/// name = "membrane"
/// k = 10.0
/// A_mesh = 0.433
///
/// [[particles]]
/// tag = 0
/// position = [0.0, 0.0, 0.0]
///
/// [[triangles]]
/// tags = [0, 1, 2]
/// type = "membrane"
/// ```
///
/// Every listed particle is owned. A type without both `k` and `A_mesh` is left
/// without parameters and must be configured before forces are computed.
pub struct TomlMesh;

impl TomlMesh {
    fn build(doc: MeshDocument) -> Result<(MeshSystem, ParamTable), MeshFileError> {
        let [lx, ly, lz] = doc.pbox.lengths;
        if lx <= 0.0 || ly <= 0.0 || lz <= 0.0 {
            return Err(MeshFileError::InvalidBox(lx, ly, lz));
        }
        let [xy, xz, yz] = doc.pbox.tilts;
        let pbox = PeriodicBox::triclinic(Vector3::new(lx, ly, lz), xy, xz, yz)
            .with_periodic(doc.pbox.periodic);

        let type_names: Vec<String> = doc.types.iter().map(|t| t.name.clone()).collect();

        let particles: Vec<(ParticleTag, Point3<f64>)> = doc
            .particles
            .iter()
            .map(|p| (ParticleTag(p.tag), Point3::from(p.position)))
            .collect();
        let snapshot = ParticleSnapshot::from_owned(&particles)?;

        let mut triangles = Vec::with_capacity(doc.triangles.len());
        for (i, record) in doc.triangles.iter().enumerate() {
            let type_idx = type_names
                .iter()
                .position(|n| *n == record.type_name)
                .ok_or_else(|| MeshFileError::UnknownTypeName {
                    triangle: i,
                    name: record.type_name.clone(),
                })?;
            let [a, b, c] = record.tags;
            let triangle = Triangle::new(a, b, c, type_idx);
            if let Some(&tag) = triangle
                .tags
                .iter()
                .find(|&&tag| snapshot.local_index(tag).is_none())
            {
                return Err(MeshFileError::MissingParticle { triangle: i, tag });
            }
            triangles.push(triangle);
        }

        let topology = MeshTopology::new(type_names, triangles)?;

        let mut params = ParamTable::new(topology.n_types());
        for (i, record) in doc.types.iter().enumerate() {
            if let (Some(k), Some(a_mesh)) = (record.k, record.a_mesh) {
                params.set(TriangleTypeId(i), k, a_mesh)?;
            }
        }

        Ok((MeshSystem::new(topology, snapshot, pbox), params))
    }

    fn document(system: &MeshSystem, params: &ParamTable) -> MeshDocument {
        let lengths = system.pbox.lengths();
        let topology = &system.topology;

        let types = topology
            .type_names()
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let p = params.get(TriangleTypeId(i)).ok();
                TypeRecord {
                    name: name.clone(),
                    k: p.map(|p| p.k),
                    a_mesh: p.map(|p| p.a_mesh),
                }
            })
            .collect();

        let positions = system.particles.positions();
        let mut particles: Vec<ParticleRecord> = system
            .particles
            .tags()
            .into_iter()
            .zip(positions)
            .filter_map(|(tag, pos)| {
                tag.map(|tag| ParticleRecord {
                    tag: tag.0,
                    position: [pos.x, pos.y, pos.z],
                })
            })
            .collect();
        particles.sort_by_key(|p| p.tag);

        let triangles = topology
            .triangles()
            .iter()
            .map(|tri| TriangleRecord {
                tags: tri.tags.map(|t| t.0),
                type_name: topology
                    .type_name(tri.type_id)
                    .map(str::to_string)
                    .unwrap_or_default(),
            })
            .collect();

        MeshDocument {
            pbox: BoxRecord {
                lengths: [lengths.x, lengths.y, lengths.z],
                tilts: system.pbox.tilts(),
                periodic: system.pbox.periodic(),
            },
            types,
            particles,
            triangles,
        }
    }
}

impl MeshFormat for TomlMesh {
    type Error = MeshFileError;

    fn read_from(reader: &mut impl BufRead) -> Result<(MeshSystem, ParamTable), Self::Error> {
        let mut content = String::new();
        reader.read_to_string(&mut content)?;
        let doc: MeshDocument = toml::from_str(&content)?;
        Self::build(doc)
    }

    fn write_to(
        system: &MeshSystem,
        params: &ParamTable,
        writer: &mut impl Write,
    ) -> Result<(), Self::Error> {
        let content = toml::to_string_pretty(&Self::document(system, params))?;
        writer.write_all(content.as_bytes())?;
        Ok(())
    }
}
