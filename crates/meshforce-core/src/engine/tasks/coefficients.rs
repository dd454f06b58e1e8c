use crate::core::forcefield::params::ParamTable;
use crate::core::models::ids::TriangleTypeId;
use crate::core::models::topology::MeshTopology;
use crate::engine::error::EngineError;

/// Stiffness and per-triangle target area of one type, as read by the kernels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TypeCoefficients {
    pub k: f64,
    pub target_area: f64,
}

impl TypeCoefficients {
    /// Stand-in for a type that no triangle of the mesh uses.
    const INERT: Self = Self {
        k: 0.0,
        target_area: 1.0,
    };
}

/// Resolves the coefficients every triangle type needs for one evaluation.
///
/// The result is rebuilt from the engine's parameter table at the start of every step, so
/// a parameter change is always visible to the next evaluation. Types without parameters
/// are an error only if a triangle uses them.
pub fn resolve(
    params: &ParamTable,
    topology: &MeshTopology,
) -> Result<Vec<TypeCoefficients>, EngineError> {
    if params.n_types() != topology.n_types() {
        return Err(EngineError::TypeCountMismatch {
            expected: params.n_types(),
            found: topology.n_types(),
        });
    }

    let mut used = vec![false; topology.n_types()];
    for triangle in topology.triangles() {
        used[triangle.type_id.index()] = true;
    }

    used.iter()
        .enumerate()
        .map(|(i, &is_used)| {
            let type_id = TriangleTypeId(i);
            match params.get(type_id) {
                Ok(p) => Ok(TypeCoefficients {
                    k: p.k,
                    target_area: p.target_triangle_area(topology.global_count(type_id)),
                }),
                Err(_) if !is_used => Ok(TypeCoefficients::INERT),
                Err(_) => Err(EngineError::MissingParams(type_id)),
            }
        })
        .collect()
}
