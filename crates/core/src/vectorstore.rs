//! Exact nearest-neighbour search over an in-memory matrix.
//!
//! `FlatIndex` stores vectors row-major in one contiguous buffer and scores
//! queries by squared Euclidean distance. Results always carry exactly `k`
//! slots; slots past the number of stored vectors are marked invalid
//! (`position == None`) so callers can tell "fewer than k items" apart from
//! a hit at position 0.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IndexError {
    #[error("index dimension must be > 0")]
    ZeroDimension,
    #[error("dimension mismatch: index has {expected} dims, vector has {got} dims")]
    DimensionMismatch { expected: usize, got: usize },
    #[error("k must be > 0")]
    InvalidK,
}

/// One ranked slot in a search result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Row in the index, or `None` when no vector fills this slot.
    pub position: Option<usize>,
    pub distance: f32,
}

impl Neighbor {
    fn invalid() -> Self {
        Self {
            position: None,
            distance: f32::INFINITY,
        }
    }
}

pub trait VectorIndex: Send + Sync {
    fn dim(&self) -> usize;
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>, IndexError>;
}

#[derive(Debug, Clone)]
pub struct FlatIndex {
    dim: usize,
    data: Vec<f32>,
}

impl FlatIndex {
    pub fn new(dim: usize) -> Result<Self, IndexError> {
        if dim == 0 {
            return Err(IndexError::ZeroDimension);
        }
        Ok(Self {
            dim,
            data: Vec::new(),
        })
    }

    /// Appends vectors in order. Either all are added or none.
    pub fn add(&mut self, vectors: &[Vec<f32>]) -> Result<(), IndexError> {
        if let Some(v) = vectors.iter().find(|v| v.len() != self.dim) {
            return Err(IndexError::DimensionMismatch {
                expected: self.dim,
                got: v.len(),
            });
        }
        self.data.reserve(vectors.len() * self.dim);
        for v in vectors {
            self.data.extend_from_slice(v);
        }
        Ok(())
    }

    pub fn vector(&self, position: usize) -> Option<&[f32]> {
        let start = position.checked_mul(self.dim)?;
        self.data.get(start..start + self.dim)
    }
}

pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

#[derive(Debug)]
struct Candidate {
    position: usize,
    distance: f32,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    // Max-heap on (distance, position): the root is the worst kept candidate,
    // and among equal distances the later row is evicted first.
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then(self.position.cmp(&other.position))
    }
}

impl VectorIndex for FlatIndex {
    fn dim(&self) -> usize {
        self.dim
    }

    fn len(&self) -> usize {
        self.data.len() / self.dim
    }

    fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>, IndexError> {
        if k == 0 {
            return Err(IndexError::InvalidK);
        }
        if query.len() != self.dim {
            return Err(IndexError::DimensionMismatch {
                expected: self.dim,
                got: query.len(),
            });
        }

        let mut heap: BinaryHeap<Candidate> = BinaryHeap::with_capacity(k + 1);
        for (position, row) in self.data.chunks_exact(self.dim).enumerate() {
            let candidate = Candidate {
                position,
                distance: squared_l2(query, row),
            };
            if heap.len() < k {
                heap.push(candidate);
            } else if let Some(worst) = heap.peek() {
                if candidate < *worst {
                    heap.pop();
                    heap.push(candidate);
                }
            }
        }

        let mut neighbors: Vec<Neighbor> = heap
            .into_sorted_vec()
            .into_iter()
            .map(|c| Neighbor {
                position: Some(c.position),
                distance: c.distance,
            })
            .collect();
        neighbors.resize(k, Neighbor::invalid());
        Ok(neighbors)
    }
}
