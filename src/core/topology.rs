//! Face and edge table construction for tetrahedral meshes.
//!
//! Cells reference nodes; faces and edges are not part of the input and are
//! derived here by canonicalizing sub-simplices (sorting their node-index
//! tuples) and deduplicating through a hash map. Ids are dense and assigned
//! in first-occurrence order, so rebuilding the tables from the same
//! connectivity reproduces them exactly.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::collections::{
    fast_hash_map_with_capacity, CellId, EdgeId, EdgeKey, FaceId, FaceKey, FastHashMap,
    LocalIndex, NodeId, SmallBuffer,
};

/// Cell-local node positions of the four faces of a tetrahedron.
///
/// Face `k` consists of the cell's nodes excluding position `k`, in a cyclic
/// pattern so that node `k` is the vertex opposite face `k`. The covolume
/// computations rely on this pairing.
pub const CELL_FACES: [[usize; 3]; 4] = [[1, 2, 3], [2, 3, 0], [3, 0, 1], [0, 1, 2]];

/// Cell-local node positions of the three edges of each local face.
///
/// Edge `i` of face `k` connects the two face vertices other than the `i`-th,
/// so within the face the same opposite-pairing holds as for [`CELL_FACES`].
pub const FACE_EDGES: [[[usize; 2]; 3]; 4] = [
    [[2, 3], [3, 1], [1, 2]],
    [[3, 0], [0, 2], [2, 3]],
    [[0, 1], [1, 3], [3, 0]],
    [[1, 2], [2, 0], [0, 1]],
];

/// Error type for topology construction.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum TopologyError {
    /// A face is shared by a number of cells other than 1 or 2, which means
    /// the input connectivity does not describe a manifold mesh.
    #[error(
        "face {face:?} is shared by {multiplicity} cells, expected 1 (boundary) or 2 (interior)"
    )]
    NonManifoldFace {
        /// The canonical (ascending) node ids of the offending face.
        face: FaceKey,
        /// How many cells reference the face.
        multiplicity: usize,
    },
}

/// Unique faces of a mesh together with cell-face adjacency.
///
/// Produced by [`build_faces`]; all ids are dense indices in first-occurrence
/// order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceTopology {
    /// Canonical node triples of the unique faces.
    pub faces: Vec<FaceKey>,
    /// For every cell, the global face id of its local face `k`.
    pub cell_faces: Vec<[FaceId; 4]>,
    /// For every face, the cells referencing it and the local face index
    /// under which they do. Length 1 for boundary faces, 2 for interior ones.
    pub face_cells: Vec<SmallBuffer<(CellId, LocalIndex), 2>>,
    /// Whether the face belongs to exactly one cell.
    pub is_boundary: Vec<bool>,
}

impl FaceTopology {
    /// Number of unique faces.
    #[must_use]
    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    /// Ids of the boundary faces, in ascending order.
    #[must_use]
    pub fn boundary_faces(&self) -> Vec<FaceId> {
        self.is_boundary
            .iter()
            .enumerate()
            .filter_map(|(id, &boundary)| boundary.then_some(id))
            .collect()
    }
}

/// Unique edges of a mesh together with face-edge adjacency.
///
/// Produced by [`build_edges`] from the canonical face table.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeTopology {
    /// Canonical node pairs of the unique edges.
    pub edges: Vec<EdgeKey>,
    /// For every face, the global edge id of its local edge `i` (the edge
    /// excluding the face's `i`-th node).
    pub face_edges: Vec<[EdgeId; 3]>,
}

impl EdgeTopology {
    /// Number of unique edges.
    #[must_use]
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// Map from canonical edge key to edge id, for callers that need to
    /// resolve node pairs against the table.
    #[must_use]
    pub fn edge_ids(&self) -> FastHashMap<EdgeKey, EdgeId> {
        self.edges
            .iter()
            .enumerate()
            .map(|(id, &key)| (key, id))
            .collect()
    }
}

/// Derives the unique face table and cell-face adjacency from cell
/// connectivity.
///
/// Every cell emits its four local faces as sorted node triples; equal
/// triples are the same face. The unique faces keep the order in which they
/// were first seen. Runs in time linear in the number of emitted faces.
///
/// # Errors
///
/// Returns [`TopologyError::NonManifoldFace`] if any face is referenced by
/// more than two cells.
///
/// # Examples
///
/// ```
/// use covolume::core::topology::build_faces;
///
/// // Two tetrahedra sharing the face {0, 1, 2}.
/// let topology = build_faces(&[[0, 1, 2, 3], [0, 1, 2, 4]]).unwrap();
/// assert_eq!(topology.num_faces(), 7);
/// assert_eq!(topology.is_boundary.iter().filter(|&&b| !b).count(), 1);
/// ```
pub fn build_faces(cells: &[[NodeId; 4]]) -> Result<FaceTopology, TopologyError> {
    let mut ids: FastHashMap<FaceKey, FaceId> = fast_hash_map_with_capacity(4 * cells.len());
    let mut faces: Vec<FaceKey> = Vec::new();
    let mut face_cells: Vec<SmallBuffer<(CellId, LocalIndex), 2>> = Vec::new();
    let mut cell_faces: Vec<[FaceId; 4]> = Vec::with_capacity(cells.len());

    for (cell_id, cell) in cells.iter().enumerate() {
        let mut row = [0usize; 4];
        for (k, local) in CELL_FACES.iter().enumerate() {
            let mut key = [cell[local[0]], cell[local[1]], cell[local[2]]];
            key.sort_unstable();
            let id = *ids.entry(key).or_insert_with(|| {
                faces.push(key);
                face_cells.push(SmallBuffer::new());
                faces.len() - 1
            });
            face_cells[id].push((cell_id, k as LocalIndex));
            row[k] = id;
        }
        cell_faces.push(row);
    }

    for (id, adjacent) in face_cells.iter().enumerate() {
        let multiplicity = adjacent.len();
        if multiplicity > 2 {
            return Err(TopologyError::NonManifoldFace {
                face: faces[id],
                multiplicity,
            });
        }
    }
    let is_boundary: Vec<bool> = face_cells.iter().map(|adj| adj.len() == 1).collect();

    tracing::debug!(
        "built face table: {} unique faces from {} cells, {} on the boundary",
        faces.len(),
        cells.len(),
        is_boundary.iter().filter(|&&b| b).count()
    );

    Ok(FaceTopology {
        faces,
        cell_faces,
        face_cells,
        is_boundary,
    })
}

/// Derives the unique edge table and face-edge adjacency from the canonical
/// face table, with the same dedup scheme as [`build_faces`].
///
/// # Examples
///
/// ```
/// use covolume::core::topology::{build_edges, build_faces};
///
/// let faces = build_faces(&[[0, 1, 2, 3]]).unwrap();
/// let edges = build_edges(&faces.faces);
/// assert_eq!(edges.num_edges(), 6);
/// ```
#[must_use]
pub fn build_edges(faces: &[FaceKey]) -> EdgeTopology {
    let mut ids: FastHashMap<EdgeKey, EdgeId> = fast_hash_map_with_capacity(3 * faces.len());
    let mut edges: Vec<EdgeKey> = Vec::new();
    let mut face_edges: Vec<[EdgeId; 3]> = Vec::with_capacity(faces.len());

    for face in faces {
        let mut row = [0usize; 3];
        for i in 0..3 {
            let a = face[(i + 1) % 3];
            let b = face[(i + 2) % 3];
            let key = if a < b { [a, b] } else { [b, a] };
            let id = *ids.entry(key).or_insert_with(|| {
                edges.push(key);
                edges.len() - 1
            });
            row[i] = id;
        }
        face_edges.push(row);
    }

    tracing::debug!(
        "built edge table: {} unique edges from {} faces",
        edges.len(),
        faces.len()
    );

    EdgeTopology { edges, face_edges }
}
