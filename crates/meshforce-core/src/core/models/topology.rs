use super::ids::{ParticleTag, TriangleTypeId};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TopologyError {
    #[error("A mesh needs at least one triangle type")]
    NoTypes,
    #[error("Triangle type name '{0}' is defined more than once")]
    DuplicateTypeName(String),
    #[error("Triangle {triangle} uses type {type_id}, but only {n_types} type(s) are defined")]
    UnknownType {
        triangle: usize,
        type_id: TriangleTypeId,
        n_types: usize,
    },
    #[error("Triangle {triangle} repeats particle tag {tag}")]
    RepeatedTag { triangle: usize, tag: ParticleTag },
    #[error("Expected {expected} global triangle counts, got {found}")]
    CountLengthMismatch { expected: usize, found: usize },
    #[error(
        "Partition holds {local} triangle(s) of type {type_id}, more than the global count {global}"
    )]
    CountTooSmall {
        type_id: TriangleTypeId,
        local: usize,
        global: usize,
    },
    #[error("Triangle index {0} is out of range")]
    TriangleNotFound(usize),
}

/// One face of the constrained surface: three particle tags and a type.
///
/// The tag order defines the face orientation (a → b → c).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Triangle {
    pub tags: [ParticleTag; 3],
    pub type_id: TriangleTypeId,
}

impl Triangle {
    pub fn new(a: u32, b: u32, c: u32, type_id: usize) -> Self {
        Self {
            tags: [ParticleTag(a), ParticleTag(b), ParticleTag(c)],
            type_id: TriangleTypeId(type_id),
        }
    }

    pub fn contains(&self, tag: ParticleTag) -> bool {
        self.tags.contains(&tag)
    }

    /// The vertex that is neither `a` nor `b`.
    pub fn opposite(&self, a: ParticleTag, b: ParticleTag) -> Option<ParticleTag> {
        if !self.contains(a) || !self.contains(b) {
            return None;
        }
        self.tags.iter().copied().find(|&t| t != a && t != b)
    }

    /// True when `b` directly follows `a` in the cyclic vertex order.
    pub fn has_directed_edge(&self, a: ParticleTag, b: ParticleTag) -> bool {
        (0..3).any(|i| self.tags[i] == a && self.tags[(i + 1) % 3] == b)
    }
}

/// Undirected edge key with the smaller tag first.
pub type EdgeKey = (ParticleTag, ParticleTag);

pub fn edge_key(a: ParticleTag, b: ParticleTag) -> EdgeKey {
    if a <= b { (a, b) } else { (b, a) }
}

/// An undirected mesh edge and the triangles sharing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeshEdge {
    pub tags: [ParticleTag; 2],
    pub triangles: Vec<usize>,
}

impl MeshEdge {
    pub fn is_interior(&self) -> bool {
        self.triangles.len() == 2
    }
}

/// The triangles of a mesh (or of one partition's share of it).
///
/// Triangle count and type table are fixed at definition time. Local edits such as
/// edge flips go through [`MeshTopology::replace_pair`], which bumps the revision so
/// that cached per-topology quantities can be refreshed.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshTopology {
    type_names: Vec<String>,
    triangles: Vec<Triangle>,
    global_counts: Vec<usize>,
    revision: u64,
}

impl MeshTopology {
    pub fn new(type_names: Vec<String>, triangles: Vec<Triangle>) -> Result<Self, TopologyError> {
        if type_names.is_empty() {
            return Err(TopologyError::NoTypes);
        }
        for (i, name) in type_names.iter().enumerate() {
            if type_names[..i].contains(name) {
                return Err(TopologyError::DuplicateTypeName(name.clone()));
            }
        }
        for (i, triangle) in triangles.iter().enumerate() {
            Self::validate_triangle(i, triangle, type_names.len())?;
        }

        let mut global_counts = vec![0; type_names.len()];
        for triangle in &triangles {
            global_counts[triangle.type_id.index()] += 1;
        }

        Ok(Self {
            type_names,
            triangles,
            global_counts,
            revision: 0,
        })
    }

    /// Declares the whole-mesh triangle count per type for a partition that only holds
    /// part of the triangles.
    pub fn with_global_counts(mut self, counts: Vec<usize>) -> Result<Self, TopologyError> {
        if counts.len() != self.type_names.len() {
            return Err(TopologyError::CountLengthMismatch {
                expected: self.type_names.len(),
                found: counts.len(),
            });
        }
        for (type_idx, (&local, &global)) in self.global_counts.iter().zip(&counts).enumerate() {
            if local > global {
                return Err(TopologyError::CountTooSmall {
                    type_id: TriangleTypeId(type_idx),
                    local,
                    global,
                });
            }
        }
        self.global_counts = counts;
        self.revision += 1;
        Ok(self)
    }

    fn validate_triangle(
        index: usize,
        triangle: &Triangle,
        n_types: usize,
    ) -> Result<(), TopologyError> {
        if triangle.type_id.index() >= n_types {
            return Err(TopologyError::UnknownType {
                triangle: index,
                type_id: triangle.type_id,
                n_types,
            });
        }
        let [a, b, c] = triangle.tags;
        if a == b || a == c {
            return Err(TopologyError::RepeatedTag { triangle: index, tag: a });
        }
        if b == c {
            return Err(TopologyError::RepeatedTag { triangle: index, tag: b });
        }
        Ok(())
    }

    #[inline]
    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    #[inline]
    pub fn n_types(&self) -> usize {
        self.type_names.len()
    }

    pub fn type_names(&self) -> &[String] {
        &self.type_names
    }

    pub fn type_name(&self, type_id: TriangleTypeId) -> Option<&str> {
        self.type_names.get(type_id.index()).map(String::as_str)
    }

    pub fn type_id(&self, name: &str) -> Option<TriangleTypeId> {
        self.type_names
            .iter()
            .position(|n| n == name)
            .map(TriangleTypeId)
    }

    /// Whole-mesh number of triangles of a type.
    pub fn global_count(&self, type_id: TriangleTypeId) -> usize {
        self.global_counts.get(type_id.index()).copied().unwrap_or(0)
    }

    pub fn global_counts(&self) -> &[usize] {
        &self.global_counts
    }

    /// Incremented on every change to the triangle list or counts.
    #[inline]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Every undirected edge with the triangles that share it, ordered by tag pair.
    pub fn edges(&self) -> Vec<MeshEdge> {
        let mut map: BTreeMap<EdgeKey, Vec<usize>> = BTreeMap::new();
        for (i, triangle) in self.triangles.iter().enumerate() {
            let [a, b, c] = triangle.tags;
            for (u, v) in [(a, b), (b, c), (c, a)] {
                map.entry(edge_key(u, v)).or_default().push(i);
            }
        }
        map.into_iter()
            .map(|((u, v), triangles)| MeshEdge {
                tags: [u, v],
                triangles,
            })
            .collect()
    }

    /// Edge lookup table, for callers that edit the mesh edge by edge.
    pub fn edge_map(&self) -> HashMap<EdgeKey, Vec<usize>> {
        self.edges()
            .into_iter()
            .map(|e| (edge_key(e.tags[0], e.tags[1]), e.triangles))
            .collect()
    }

    /// Replaces two triangles at once. Type ids must stay within the type table.
    pub fn replace_pair(
        &mut self,
        (i, tri_i): (usize, Triangle),
        (j, tri_j): (usize, Triangle),
    ) -> Result<(), TopologyError> {
        let len = self.triangles.len();
        for idx in [i, j] {
            if idx >= len {
                return Err(TopologyError::TriangleNotFound(idx));
            }
        }
        Self::validate_triangle(i, &tri_i, self.n_types())?;
        Self::validate_triangle(j, &tri_j, self.n_types())?;

        for (idx, new) in [(i, tri_i), (j, tri_j)] {
            let old_type = self.triangles[idx].type_id.index();
            let new_type = new.type_id.index();
            if old_type != new_type {
                self.global_counts[old_type] -= 1;
                self.global_counts[new_type] += 1;
            }
            self.triangles[idx] = new;
        }
        self.revision += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tetrahedron() -> MeshTopology {
        MeshTopology::new(
            vec!["membrane".to_string()],
            vec![
                Triangle::new(0, 1, 2, 0),
                Triangle::new(0, 3, 1, 0),
                Triangle::new(1, 3, 2, 0),
                Triangle::new(0, 2, 3, 0),
            ],
        )
        .unwrap()
    }

    #[test]
    fn new_counts_triangles_per_type() {
        let topo = MeshTopology::new(
            vec!["a".into(), "b".into()],
            vec![Triangle::new(0, 1, 2, 0), Triangle::new(1, 2, 3, 1), Triangle::new(2, 3, 4, 1)],
        )
        .unwrap();
        assert_eq!(topo.global_counts(), &[1, 2]);
        assert_eq!(topo.type_id("b"), Some(TriangleTypeId(1)));
        assert_eq!(topo.type_name(TriangleTypeId(0)), Some("a"));
    }

    #[test]
    fn new_rejects_unknown_type() {
        let result = MeshTopology::new(vec!["a".into()], vec![Triangle::new(0, 1, 2, 3)]);
        assert!(matches!(result, Err(TopologyError::UnknownType { triangle: 0, .. })));
    }

    #[test]
    fn new_rejects_repeated_tag() {
        let result = MeshTopology::new(vec!["a".into()], vec![Triangle::new(0, 1, 1, 0)]);
        assert_eq!(
            result.unwrap_err(),
            TopologyError::RepeatedTag {
                triangle: 0,
                tag: ParticleTag(1)
            }
        );
    }

    #[test]
    fn new_rejects_duplicate_type_names() {
        let result = MeshTopology::new(vec!["a".into(), "a".into()], vec![]);
        assert_eq!(result.unwrap_err(), TopologyError::DuplicateTypeName("a".into()));
    }

    #[test]
    fn closed_tetrahedron_has_six_interior_edges() {
        let edges = tetrahedron().edges();
        assert_eq!(edges.len(), 6);
        assert!(edges.iter().all(MeshEdge::is_interior));
    }

    #[test]
    fn open_quad_has_one_interior_edge() {
        let topo = MeshTopology::new(
            vec!["a".into()],
            vec![Triangle::new(0, 1, 2, 0), Triangle::new(1, 0, 3, 0)],
        )
        .unwrap();
        let interior: Vec<_> = topo.edges().into_iter().filter(MeshEdge::is_interior).collect();
        assert_eq!(interior.len(), 1);
        assert_eq!(interior[0].tags, [ParticleTag(0), ParticleTag(1)]);
        assert_eq!(interior[0].triangles, vec![0, 1]);
    }

    #[test]
    fn opposite_and_directed_edge_follow_vertex_order() {
        let tri = Triangle::new(4, 7, 9, 0);
        assert_eq!(tri.opposite(ParticleTag(9), ParticleTag(4)), Some(ParticleTag(7)));
        assert_eq!(tri.opposite(ParticleTag(9), ParticleTag(5)), None);
        assert!(tri.has_directed_edge(ParticleTag(9), ParticleTag(4)));
        assert!(!tri.has_directed_edge(ParticleTag(4), ParticleTag(9)));
    }

    #[test]
    fn global_counts_must_cover_local_triangles() {
        let result = tetrahedron().with_global_counts(vec![3]);
        assert!(matches!(result, Err(TopologyError::CountTooSmall { local: 4, global: 3, .. })));
        let topo = tetrahedron().with_global_counts(vec![8]).unwrap();
        assert_eq!(topo.global_count(TriangleTypeId(0)), 8);
    }

    #[test]
    fn replace_pair_bumps_revision() {
        let mut topo = MeshTopology::new(
            vec!["a".into()],
            vec![Triangle::new(0, 1, 2, 0), Triangle::new(1, 0, 3, 0)],
        )
        .unwrap();
        let before = topo.revision();
        topo.replace_pair((0, Triangle::new(0, 3, 2, 0)), (1, Triangle::new(3, 1, 2, 0)))
            .unwrap();
        assert_eq!(topo.revision(), before + 1);
        assert_eq!(topo.triangles()[1], Triangle::new(3, 1, 2, 0));
        assert!(topo.replace_pair((0, Triangle::new(0, 3, 2, 0)), (5, Triangle::new(3, 1, 2, 0))).is_err());
    }
}
