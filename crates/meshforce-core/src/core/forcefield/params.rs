use crate::core::models::ids::TriangleTypeId;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// Area-conservation parameters of one triangle type.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct TriangleAreaParams {
    /// Stiffness `K`.
    pub k: f64,
    /// Target total area of all triangles of this type.
    #[serde(rename = "A_mesh")]
    pub a_mesh: f64,
}

impl TriangleAreaParams {
    pub fn new(k: f64, a_mesh: f64) -> Self {
        Self { k, a_mesh }
    }

    /// Target area of a single triangle, `A_t = A_mesh / n`.
    #[inline]
    pub fn target_triangle_area(&self, n_triangles: usize) -> f64 {
        if n_triangles == 0 {
            self.a_mesh
        } else {
            self.a_mesh / n_triangles as f64
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParamError {
    #[error("Triangle type {type_id} is out of range ({n_types} type(s) defined)")]
    UnknownType {
        type_id: TriangleTypeId,
        n_types: usize,
    },
    #[error("No area-conservation parameters were set for triangle type {0}")]
    Unset(TriangleTypeId),
}

/// Per-type parameter storage, sized at mesh definition time.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParamTable {
    entries: Vec<Option<TriangleAreaParams>>,
}

impl ParamTable {
    pub fn new(n_types: usize) -> Self {
        Self {
            entries: vec![None; n_types],
        }
    }

    #[inline]
    pub fn n_types(&self) -> usize {
        self.entries.len()
    }

    /// Stores parameters for a type.
    ///
    /// Non-positive values are accepted and reported as suspect. Negative values stay
    /// numerically defined; `A_mesh = 0` gives a zero target area, which the force kernel
    /// divides by, so energies and forces of that type come out non-finite.
    pub fn set(&mut self, type_id: TriangleTypeId, k: f64, a_mesh: f64) -> Result<(), ParamError> {
        let n_types = self.entries.len();
        let slot = self
            .entries
            .get_mut(type_id.index())
            .ok_or(ParamError::UnknownType { type_id, n_types })?;

        if k <= 0.0 {
            warn!("Triangle area conservation: specified K <= 0 for type {type_id} (K = {k})");
        }
        if a_mesh == 0.0 {
            warn!(
                "Triangle area conservation: specified A_mesh = 0 for type {type_id}; its energies and forces will be non-finite"
            );
        } else if a_mesh < 0.0 {
            warn!(
                "Triangle area conservation: specified A_mesh <= 0 for type {type_id} (A_mesh = {a_mesh})"
            );
        }

        *slot = Some(TriangleAreaParams::new(k, a_mesh));
        Ok(())
    }

    pub fn get(&self, type_id: TriangleTypeId) -> Result<TriangleAreaParams, ParamError> {
        match self.entries.get(type_id.index()) {
            Some(Some(params)) => Ok(*params),
            Some(None) => Err(ParamError::Unset(type_id)),
            None => Err(ParamError::UnknownType {
                type_id,
                n_types: self.entries.len(),
            }),
        }
    }

    pub fn is_set(&self, type_id: TriangleTypeId) -> bool {
        matches!(self.entries.get(type_id.index()), Some(Some(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_get_returns_stored_values() {
        let mut table = ParamTable::new(2);
        table.set(TriangleTypeId(1), 10.0, 0.433).unwrap();
        assert_eq!(
            table.get(TriangleTypeId(1)).unwrap(),
            TriangleAreaParams::new(10.0, 0.433)
        );
        assert!(table.is_set(TriangleTypeId(1)));
        assert!(!table.is_set(TriangleTypeId(0)));
    }

    #[test]
    fn get_of_unset_type_is_an_error() {
        let table = ParamTable::new(1);
        assert_eq!(
            table.get(TriangleTypeId(0)),
            Err(ParamError::Unset(TriangleTypeId(0)))
        );
    }

    #[test]
    fn out_of_range_type_is_rejected() {
        let mut table = ParamTable::new(1);
        let err = table.set(TriangleTypeId(3), 1.0, 1.0).unwrap_err();
        assert_eq!(
            err,
            ParamError::UnknownType {
                type_id: TriangleTypeId(3),
                n_types: 1
            }
        );
    }

    #[test]
    fn non_positive_values_are_accepted() {
        let mut table = ParamTable::new(1);
        table.set(TriangleTypeId(0), -1.0, 0.0).unwrap();
        assert_eq!(table.get(TriangleTypeId(0)).unwrap().k, -1.0);
    }

    #[test]
    fn target_triangle_area_divides_mesh_area_evenly() {
        let params = TriangleAreaParams::new(1.0, 12.0);
        assert_eq!(params.target_triangle_area(4), 3.0);
        assert_eq!(params.target_triangle_area(0), 12.0);
    }

    #[test]
    fn params_deserialize_with_mesh_area_key() {
        let params: TriangleAreaParams = toml::from_str("k = 2.5\nA_mesh = 4.0").unwrap();
        assert_eq!(params, TriangleAreaParams::new(2.5, 4.0));
    }
}
