use super::ids::{LocalIndex, NOT_LOCAL, ParticleTag};
use nalgebra::Point3;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SnapshotError {
    #[error("Particle tag {0} appears more than once in the snapshot")]
    DuplicateTag(ParticleTag),
    #[error("Owned particle count {n_owned} exceeds the {n_local} local positions")]
    OwnedCountTooLarge { n_owned: usize, n_local: usize },
    #[error("Particle tag {tag} is too large for a snapshot of {n_local} particle(s) (limit {limit})")]
    TagOutOfRange {
        tag: ParticleTag,
        n_local: usize,
        limit: usize,
    },
}

/// Tags below this bound are always accepted, whatever the particle count.
const MIN_TAG_SPAN: usize = 1 << 20;
/// Reverse-map entries allowed per local particle beyond [`MIN_TAG_SPAN`].
const TAG_SPAN_PER_PARTICLE: usize = 16;

/// Largest tag span the dense reverse map may cover for `n_local` particles.
fn tag_span_limit(n_local: usize) -> usize {
    n_local.saturating_mul(TAG_SPAN_PER_PARTICLE).max(MIN_TAG_SPAN)
}

/// Positions of the particles visible to one partition.
///
/// Local indices `0..n_owned` are the particles this partition owns; the range
/// `n_owned..n_owned + n_ghost` holds read-only replicas of particles owned by a
/// neighboring partition. Ghosts take part in the geometry but are never the target
/// of an accumulated force.
#[derive(Debug, Clone, Default)]
pub struct ParticleSnapshot {
    positions: Vec<Point3<f64>>,
    n_owned: usize,
    rtags: Vec<u32>,
}

impl ParticleSnapshot {
    /// Builds a snapshot in which every particle is owned.
    pub fn from_owned(particles: &[(ParticleTag, Point3<f64>)]) -> Result<Self, SnapshotError> {
        Self::with_ghosts(particles, &[])
    }

    /// Builds a snapshot from owned particles followed by ghost replicas.
    pub fn with_ghosts(
        owned: &[(ParticleTag, Point3<f64>)],
        ghosts: &[(ParticleTag, Point3<f64>)],
    ) -> Result<Self, SnapshotError> {
        let n_local = owned.len() + ghosts.len();
        let limit = tag_span_limit(n_local);
        let mut max_tag = 0;
        for (tag, _) in owned.iter().chain(ghosts.iter()) {
            if tag.index() >= limit {
                return Err(SnapshotError::TagOutOfRange {
                    tag: *tag,
                    n_local,
                    limit,
                });
            }
            max_tag = max_tag.max(tag.index() + 1);
        }

        let mut rtags = vec![NOT_LOCAL; max_tag];
        let mut positions = Vec::with_capacity(n_local);

        for (local_idx, (tag, pos)) in owned.iter().chain(ghosts.iter()).enumerate() {
            let slot = &mut rtags[tag.index()];
            if *slot != NOT_LOCAL {
                return Err(SnapshotError::DuplicateTag(*tag));
            }
            *slot = local_idx as u32;
            positions.push(*pos);
        }

        Ok(Self {
            positions,
            n_owned: owned.len(),
            rtags,
        })
    }

    /// Assembles a snapshot from arrays handed over by a particle-data owner.
    ///
    /// The reverse map is taken as-is: entries may be [`NOT_LOCAL`] or even point past
    /// the local arrays (a stale map). Force engines detect such entries when a triangle
    /// references them.
    pub fn from_raw_parts(
        positions: Vec<Point3<f64>>,
        n_owned: usize,
        rtags: Vec<u32>,
    ) -> Result<Self, SnapshotError> {
        if n_owned > positions.len() {
            return Err(SnapshotError::OwnedCountTooLarge {
                n_owned,
                n_local: positions.len(),
            });
        }
        Ok(Self {
            positions,
            n_owned,
            rtags,
        })
    }

    #[inline]
    pub fn n_owned(&self) -> usize {
        self.n_owned
    }

    #[inline]
    pub fn n_ghost(&self) -> usize {
        self.positions.len() - self.n_owned
    }

    /// Number of owned plus ghost particles.
    #[inline]
    pub fn n_local(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn positions(&self) -> &[Point3<f64>] {
        &self.positions
    }

    #[inline]
    pub fn position(&self, idx: LocalIndex) -> Option<&Point3<f64>> {
        self.positions.get(idx)
    }

    #[inline]
    pub fn is_owned(&self, idx: LocalIndex) -> bool {
        idx < self.n_owned
    }

    /// Raw reverse-map entry for a tag, [`NOT_LOCAL`] if the tag is unknown here.
    #[inline]
    pub fn rtag(&self, tag: ParticleTag) -> u32 {
        self.rtags.get(tag.index()).copied().unwrap_or(NOT_LOCAL)
    }

    /// Resolves a tag to a local index that is guaranteed to be in range.
    pub fn local_index(&self, tag: ParticleTag) -> Option<LocalIndex> {
        let idx = self.rtag(tag);
        if idx == NOT_LOCAL || idx as usize >= self.positions.len() {
            None
        } else {
            Some(idx as usize)
        }
    }

    /// Moves the particle with the given tag, if it has a local copy.
    pub fn set_position(&mut self, tag: ParticleTag, pos: Point3<f64>) -> bool {
        match self.local_index(tag) {
            Some(idx) => {
                self.positions[idx] = pos;
                true
            }
            None => false,
        }
    }

    /// Tags of the local particles, in local-index order.
    pub fn tags(&self) -> Vec<Option<ParticleTag>> {
        let mut tags = vec![None; self.positions.len()];
        for (tag, &idx) in self.rtags.iter().enumerate() {
            if let Some(slot) = tags.get_mut(idx as usize) {
                *slot = Some(ParticleTag(tag as u32));
            }
        }
        tags
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64) -> Point3<f64> {
        Point3::new(x, 0.0, 0.0)
    }

    #[test]
    fn owned_particles_resolve_to_their_insertion_order() {
        let snap =
            ParticleSnapshot::from_owned(&[(ParticleTag(5), p(0.0)), (ParticleTag(2), p(1.0))])
                .unwrap();
        assert_eq!(snap.local_index(ParticleTag(5)), Some(0));
        assert_eq!(snap.local_index(ParticleTag(2)), Some(1));
        assert_eq!(snap.local_index(ParticleTag(3)), None);
        assert_eq!(snap.local_index(ParticleTag(99)), None);
        assert_eq!(snap.n_owned(), 2);
        assert_eq!(snap.n_ghost(), 0);
    }

    #[test]
    fn ghosts_follow_owned_particles_and_are_not_owned() {
        let snap = ParticleSnapshot::with_ghosts(
            &[(ParticleTag(0), p(0.0))],
            &[(ParticleTag(1), p(1.0)), (ParticleTag(2), p(2.0))],
        )
        .unwrap();
        let ghost = snap.local_index(ParticleTag(2)).unwrap();
        assert_eq!(ghost, 2);
        assert!(!snap.is_owned(ghost));
        assert!(snap.is_owned(0));
        assert_eq!(snap.n_local(), 3);
    }

    #[test]
    fn duplicate_tags_are_rejected() {
        let result =
            ParticleSnapshot::from_owned(&[(ParticleTag(1), p(0.0)), (ParticleTag(1), p(1.0))]);
        assert_eq!(result.unwrap_err(), SnapshotError::DuplicateTag(ParticleTag(1)));
    }

    #[test]
    fn sparse_tags_within_the_span_are_accepted() {
        let snap = ParticleSnapshot::from_owned(&[(ParticleTag(1_000_000), p(0.0))]).unwrap();
        assert_eq!(snap.local_index(ParticleTag(1_000_000)), Some(0));
    }

    #[test]
    fn tags_far_beyond_the_particle_count_are_rejected() {
        let result = ParticleSnapshot::from_owned(&[
            (ParticleTag(0), p(0.0)),
            (ParticleTag(4_000_000_000), p(1.0)),
        ]);
        assert_eq!(
            result.unwrap_err(),
            SnapshotError::TagOutOfRange {
                tag: ParticleTag(4_000_000_000),
                n_local: 2,
                limit: MIN_TAG_SPAN,
            }
        );
    }

    #[test]
    fn tag_span_grows_with_the_particle_count() {
        assert_eq!(tag_span_limit(0), MIN_TAG_SPAN);
        assert_eq!(tag_span_limit(1 << 20), 16 << 20);
    }

    #[test]
    fn stale_reverse_map_entries_do_not_resolve() {
        let snap = ParticleSnapshot::from_raw_parts(vec![p(0.0), p(1.0)], 2, vec![0, 7]).unwrap();
        assert_eq!(snap.rtag(ParticleTag(1)), 7);
        assert_eq!(snap.local_index(ParticleTag(1)), None);
    }

    #[test]
    fn set_position_moves_the_tagged_particle() {
        let mut snap = ParticleSnapshot::from_owned(&[(ParticleTag(3), p(0.0))]).unwrap();
        assert!(snap.set_position(ParticleTag(3), p(4.0)));
        assert_eq!(snap.positions()[0], p(4.0));
        assert!(!snap.set_position(ParticleTag(4), p(4.0)));
    }

    #[test]
    fn tags_invert_the_reverse_map() {
        let snap =
            ParticleSnapshot::from_owned(&[(ParticleTag(4), p(0.0)), (ParticleTag(1), p(1.0))])
                .unwrap();
        assert_eq!(snap.tags(), vec![Some(ParticleTag(4)), Some(ParticleTag(1))]);
    }
}
