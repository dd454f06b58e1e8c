use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommError {
    #[error(
        "Collective sum mismatch: rank {rank} contributed {found} value(s) while rank 0 contributed {expected}"
    )]
    LengthMismatch {
        rank: usize,
        expected: usize,
        found: usize,
    },
}

/// Collective operations across the partitions of one decomposed mesh.
///
/// `all_reduce_sum` blocks until every partition of the group has called it and has no
/// timeout: a partition that never arrives hangs the others.
pub trait Communicator: Send + Sync {
    fn rank(&self) -> usize;

    fn size(&self) -> usize;

    /// Whether this partition is one of several.
    fn is_distributed(&self) -> bool {
        self.size() > 1
    }

    /// Replaces `values` on every partition with their element-wise sum over all
    /// partitions.
    fn all_reduce_sum(&self, values: &mut [f64]) -> Result<(), CommError>;
}

/// The only partition of a non-decomposed run.
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialCommunicator;

impl Communicator for SerialCommunicator {
    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }

    fn all_reduce_sum(&self, _values: &mut [f64]) -> Result<(), CommError> {
        Ok(())
    }
}

struct RoundState {
    generation: u64,
    contributions: Vec<Option<Vec<f64>>>,
    published: Result<Vec<f64>, CommError>,
}

struct GroupShared {
    size: usize,
    state: Mutex<RoundState>,
    round_complete: Condvar,
}

/// One member of an in-process partition group. Each member is meant to be driven by
/// its own thread.
#[derive(Clone)]
pub struct GroupCommunicator {
    rank: usize,
    shared: Arc<GroupShared>,
}

/// Factory for in-process partition groups.
pub struct LocalGroup;

impl LocalGroup {
    /// Creates `size` communicators that reduce with each other, ranks `0..size`.
    pub fn create(size: usize) -> Vec<GroupCommunicator> {
        let shared = Arc::new(GroupShared {
            size,
            state: Mutex::new(RoundState {
                generation: 0,
                contributions: vec![None; size],
                published: Ok(Vec::new()),
            }),
            round_complete: Condvar::new(),
        });
        (0..size)
            .map(|rank| GroupCommunicator {
                rank,
                shared: Arc::clone(&shared),
            })
            .collect()
    }
}

/// Sums contributions in rank order, so every round gives the same bits regardless of
/// arrival order.
fn combine(contributions: &[Vec<f64>]) -> Result<Vec<f64>, CommError> {
    let expected = contributions.first().map_or(0, Vec::len);
    let mut sum = vec![0.0; expected];
    for (rank, values) in contributions.iter().enumerate() {
        if values.len() != expected {
            return Err(CommError::LengthMismatch {
                rank,
                expected,
                found: values.len(),
            });
        }
        for (acc, v) in sum.iter_mut().zip(values) {
            *acc += v;
        }
    }
    Ok(sum)
}

impl Communicator for GroupCommunicator {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.shared.size
    }

    fn all_reduce_sum(&self, values: &mut [f64]) -> Result<(), CommError> {
        let shared = &*self.shared;
        let mut state = shared.state.lock();

        state.contributions[self.rank] = Some(values.to_vec());
        let arrived = state.contributions.iter().filter(|c| c.is_some()).count();

        if arrived == shared.size {
            let contributions: Vec<Vec<f64>> = state
                .contributions
                .iter_mut()
                .filter_map(Option::take)
                .collect();
            state.published = combine(&contributions);
            state.generation = state.generation.wrapping_add(1);
            shared.round_complete.notify_all();
        } else {
            let generation = state.generation;
            while state.generation == generation {
                shared.round_complete.wait(&mut state);
            }
        }

        // The next round cannot complete before this member joins it, so the published
        // result still belongs to the round this call took part in.
        match &state.published {
            Ok(sum) => {
                values.copy_from_slice(sum);
                Ok(())
            }
            Err(e) => Err(e.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn serial_reduction_is_the_identity() {
        let comm = SerialCommunicator;
        let mut values = [1.5, -2.0];
        comm.all_reduce_sum(&mut values).unwrap();
        assert_eq!(values, [1.5, -2.0]);
        assert!(!comm.is_distributed());
    }

    #[test]
    fn group_members_all_receive_the_sum() {
        let group = LocalGroup::create(3);
        let results: Vec<Vec<f64>> = thread::scope(|s| {
            let handles: Vec<_> = group
                .iter()
                .map(|comm| {
                    s.spawn(move || {
                        let mut values = vec![comm.rank() as f64, 1.0];
                        comm.all_reduce_sum(&mut values).unwrap();
                        values
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        for values in results {
            assert_eq!(values, vec![3.0, 3.0]);
        }
    }

    #[test]
    fn consecutive_rounds_do_not_mix() {
        let group = LocalGroup::create(2);
        thread::scope(|s| {
            for comm in &group {
                s.spawn(move || {
                    for round in 0..50 {
                        let mut values = [round as f64 + comm.rank() as f64];
                        comm.all_reduce_sum(&mut values).unwrap();
                        assert_eq!(values[0], 2.0 * round as f64 + 1.0);
                    }
                });
            }
        });
    }

    #[test]
    fn length_mismatch_fails_on_every_member() {
        let group = LocalGroup::create(2);
        let results: Vec<Result<(), CommError>> = thread::scope(|s| {
            let handles: Vec<_> = group
                .iter()
                .map(|comm| {
                    s.spawn(move || {
                        let mut values = vec![1.0; comm.rank() + 1];
                        comm.all_reduce_sum(&mut values)
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        for result in results {
            assert_eq!(
                result,
                Err(CommError::LengthMismatch {
                    rank: 1,
                    expected: 1,
                    found: 2
                })
            );
        }
    }

    #[test]
    fn group_reports_rank_and_size() {
        let group = LocalGroup::create(4);
        assert_eq!(group.len(), 4);
        assert_eq!(group[2].rank(), 2);
        assert!(group.iter().all(|c| c.size() == 4 && c.is_distributed()));
        assert!(!LocalGroup::create(1)[0].is_distributed());
    }
}
