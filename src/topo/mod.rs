//! Polygonal topology model.
//!
//! [`FaceTopology`] stores vertices plus per-face vertex loops of arbitrary
//! degree. No triangulation happens here: faces keep their true loops, and
//! fan decomposition for kernels without n-gon support is an adapter concern.
//! [`EdgeCreaseMap`] carries per-edge subdivision crease weights keyed by
//! unordered vertex pairs.

use std::collections::{BTreeMap, HashSet};

use smallvec::SmallVec;

use crate::util::{Error, Result, Vec3};

/// One polygonal face: an ordered vertex loop of degree >= 3.
///
/// Most faces are triangles or quads, so the loop is inline up to degree 4.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FaceRecord {
    pub vertex_indices: SmallVec<[u32; 4]>,
}

impl FaceRecord {
    /// Create a face record from a vertex loop.
    pub fn new(vertex_indices: impl Into<SmallVec<[u32; 4]>>) -> Self {
        Self {
            vertex_indices: vertex_indices.into(),
        }
    }

    /// Face degree (number of vertices in the loop).
    pub fn degree(&self) -> usize {
        self.vertex_indices.len()
    }

    /// Check if two faces have the same loop up to rotation.
    ///
    /// Winding is not normalized: `[0,1,2]` matches `[1,2,0]` but not
    /// `[2,1,0]`.
    pub fn same_loop_cyclic(&self, other: &FaceRecord) -> bool {
        let n = self.vertex_indices.len();
        if n != other.vertex_indices.len() {
            return false;
        }
        (0..n).any(|shift| {
            (0..n).all(|i| self.vertex_indices[i] == other.vertex_indices[(i + shift) % n])
        })
    }
}

/// Vertex positions plus face loops.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FaceTopology {
    pub vertices: Vec<Vec3>,
    pub faces: Vec<FaceRecord>,
}

impl FaceTopology {
    /// Build a topology, validating the data model invariants.
    ///
    /// Fails with [`Error::InvalidTopology`] if:
    /// - any face has degree < 3
    /// - any face references a vertex index >= `vertices.len()`
    /// - any face repeats a vertex index within its loop (degenerate)
    /// - faces exist while the vertex list is empty
    pub fn build(vertices: Vec<Vec3>, face_index_lists: Vec<Vec<u32>>) -> Result<Self> {
        if vertices.is_empty() && !face_index_lists.is_empty() {
            return Err(Error::topology(format!(
                "{} faces reference an empty vertex list",
                face_index_lists.len()
            )));
        }
        let vertex_count = vertices.len() as u32;
        let mut faces = Vec::with_capacity(face_index_lists.len());
        let mut seen = HashSet::new();
        for (face_idx, loop_indices) in face_index_lists.into_iter().enumerate() {
            if loop_indices.len() < 3 {
                return Err(Error::topology(format!(
                    "face {} has degree {} (minimum is 3)",
                    face_idx,
                    loop_indices.len()
                )));
            }
            seen.clear();
            for &vi in &loop_indices {
                if vi >= vertex_count {
                    return Err(Error::topology(format!(
                        "face {} references vertex {} (vertex count is {})",
                        face_idx, vi, vertex_count
                    )));
                }
                if !seen.insert(vi) {
                    return Err(Error::topology(format!(
                        "face {} repeats vertex {} within its loop",
                        face_idx, vi
                    )));
                }
            }
            faces.push(FaceRecord {
                vertex_indices: SmallVec::from_vec(loop_indices),
            });
        }
        Ok(Self { vertices, faces })
    }

    /// Number of vertices.
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Number of logical faces.
    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    /// Face counts grouped by degree, in ascending degree order.
    ///
    /// Adapters use this to pick a construction strategy (e.g. whether any
    /// fan decomposition is needed at all).
    pub fn face_degree_histogram(&self) -> BTreeMap<usize, usize> {
        let mut hist = BTreeMap::new();
        for face in &self.faces {
            *hist.entry(face.degree()).or_insert(0usize) += 1;
        }
        hist
    }

    /// Check whether any face is an n-gon (degree >= 5).
    pub fn has_ngons(&self) -> bool {
        self.faces.iter().any(|f| f.degree() >= 5)
    }

    /// Verify that an edge exists in some face loop.
    pub fn contains_edge(&self, edge: EdgeKey) -> bool {
        self.faces.iter().any(|face| {
            let n = face.vertex_indices.len();
            (0..n).any(|i| {
                EdgeKey::new(face.vertex_indices[i], face.vertex_indices[(i + 1) % n]) == edge
            })
        })
    }
}

/// An undirected edge, keyed by its two vertex indices with `a <= b`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EdgeKey {
    a: u32,
    b: u32,
}

impl EdgeKey {
    /// Create an edge key; the vertex order does not matter.
    pub fn new(v0: u32, v1: u32) -> Self {
        if v0 <= v1 {
            Self { a: v0, b: v1 }
        } else {
            Self { a: v1, b: v0 }
        }
    }

    /// Lower vertex index.
    pub fn lo(&self) -> u32 {
        self.a
    }

    /// Higher vertex index.
    pub fn hi(&self) -> u32 {
        self.b
    }
}

/// Per-edge subdivision crease weights in `[0.0, 1.0]`.
///
/// An absent edge has implicit weight 0 (fully smooth). Weights are clamped
/// on insert; zero weights are not stored.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EdgeCreaseMap {
    weights: BTreeMap<EdgeKey, f32>,
}

impl EdgeCreaseMap {
    /// Create an empty crease map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the crease weight for an edge. Weight is clamped to `[0, 1]`;
    /// a zero weight removes the entry.
    pub fn set(&mut self, edge: EdgeKey, weight: f32) {
        let w = weight.clamp(0.0, 1.0);
        if w > 0.0 {
            self.weights.insert(edge, w);
        } else {
            self.weights.remove(&edge);
        }
    }

    /// Crease weight for an edge; absent edges are fully smooth.
    pub fn get(&self, edge: EdgeKey) -> f32 {
        self.weights.get(&edge).copied().unwrap_or(0.0)
    }

    /// Number of creased edges.
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    /// Check if no edge is creased.
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Iterate creased edges in (lo, hi) key order.
    pub fn iter(&self) -> impl Iterator<Item = (EdgeKey, f32)> + '_ {
        self.weights.iter().map(|(k, v)| (*k, *v))
    }

    /// Check that every creased edge exists in the topology.
    pub fn validate_against(&self, topology: &FaceTopology) -> Result<()> {
        for (edge, _) in self.iter() {
            if !topology.contains_edge(edge) {
                return Err(Error::malformed(format!(
                    "crease references edge ({}, {}) not present in any face",
                    edge.lo(),
                    edge.hi()
                )));
            }
        }
        Ok(())
    }

    /// Compare two crease maps within an absolute weight tolerance.
    pub fn approx_eq(&self, other: &EdgeCreaseMap, eps: f32) -> bool {
        self.weights.len() == other.weights.len()
            && self
                .iter()
                .zip(other.iter())
                .all(|((ea, wa), (eb, wb))| ea == eb && (wa - wb).abs() <= eps)
    }
}
