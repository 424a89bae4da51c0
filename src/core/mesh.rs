//! Tetrahedral mesh with lazily computed Voronoi finite-volume geometry.
//!
//! [`TetraMesh`] owns the immutable input data (node coordinates and
//! cell-to-node connectivity) and derives everything else on first use:
//! face/edge topology, circumcenters and volumes, covolume/edge-length
//! ratios, per-node control volumes and the Delaunay-violation diagnostic.
//! Derived tables are memoized behind atomic caches and shared as `Arc`s;
//! since the mesh never mutates after construction there is no
//! invalidation.

use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::collections::{CellId, FaceId, FastHashSet, NodeId};
use crate::core::topology::{
    build_edges, build_faces, EdgeTopology, FaceTopology, TopologyError, CELL_FACES, FACE_EDGES,
};
use crate::geometry::circumsphere::circumcenters_and_volumes;
use crate::geometry::covolume::{
    circumcenter_face_distance, triangle_area_and_ce_ratios, OpposingEdgeDots,
};

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Error type for mesh construction.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum MeshConstructionError {
    /// A cell references a node id beyond the coordinate sequence.
    #[error("cell {cell} references node {node}, but the mesh has only {num_nodes} nodes")]
    NodeIndexOutOfBounds {
        /// The offending cell.
        cell: CellId,
        /// The out-of-bounds node id.
        node: NodeId,
        /// Number of nodes in the mesh.
        num_nodes: usize,
    },
    /// A cell references the same node in two of its four slots.
    #[error("cell {cell} references node {node} more than once")]
    DuplicateNodeInCell {
        /// The offending cell.
        cell: CellId,
        /// The repeated node id.
        node: NodeId,
    },
    /// A node is referenced by no cell at all. Strip unused nodes (and
    /// re-index the cells) before handing the data to the mesh.
    #[error("node {node} is not referenced by any cell")]
    UnusedNode {
        /// The unused node id.
        node: NodeId,
    },
}

/// Error type for ce-ratio computation requests.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum CeRatioError {
    /// The algebraic mode (solving a dense per-cell system in the edge dot
    /// products) is intentionally unsupported; only the geometric closed
    /// form is available.
    #[error("the algebraic ce-ratio mode is disabled; use CeRatioMode::Geometric")]
    AlgebraicModeDisabled,
}

/// Selects how covolume/edge-length ratios are computed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CeRatioMode {
    /// Closed-form per-face evaluation from circumcenter-face distances.
    #[default]
    Geometric,
    /// Dense per-cell linear solve. Disabled; requesting it is an error.
    Algebraic,
}

// =============================================================================
// DERIVED TABLES
// =============================================================================

/// Per-cell circumcenters and volumes.
///
/// A degenerate (flat) cell has volume `0.0` and a non-finite circumcenter;
/// both are data, not errors.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CellGeometry {
    /// Circumcenter of every cell.
    pub circumcenters: Vec<Point3<f64>>,
    /// Volume of every cell (`>= 0`, zero only for degenerate cells).
    pub volumes: Vec<f64>,
}

/// Per-cell dual (Voronoi) metrics: face areas, signed circumcenter-face
/// distances and covolume/edge-length ratio contributions.
///
/// All tables are indexed `[cell][local face]`, with the ce-ratios further
/// indexed by the face's local edge. Non-finite entries appear for
/// degenerate cells and flow through untouched.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DualMetrics {
    /// Area of local face `k` of every cell.
    pub face_areas: Vec<[f64; 4]>,
    /// Signed distance from the cell circumcenter to local face `k`,
    /// positive when the circumcenter lies on the side of the opposing
    /// vertex. A negative sum of these over a face's adjacent cells is a
    /// Delaunay violation.
    pub face_distances: Vec<[f64; 4]>,
    /// Ce-ratio contribution of edge `i` of local face `k` of every cell.
    /// May be negative where the mesh is locally non-Delaunay.
    pub ce_ratios: Vec<[[f64; 3]; 4]>,
}

// =============================================================================
// MESH
// =============================================================================

/// An immutable tetrahedral mesh and its derived Voronoi FVM geometry.
///
/// # Examples
///
/// ```
/// use approx::assert_relative_eq;
/// use covolume::core::mesh::TetraMesh;
///
/// let mesh = TetraMesh::from_arrays(
///     vec![
///         [0.0, 0.0, 0.0],
///         [1.0, 0.0, 0.0],
///         [0.0, 1.0, 0.0],
///         [0.0, 0.0, 1.0],
///     ],
///     vec![[0, 1, 2, 3]],
/// )
/// .unwrap();
///
/// // The control volumes partition the mesh volume among the nodes.
/// let control_volumes = mesh.control_volumes();
/// let total: f64 = control_volumes.iter().sum();
/// assert_relative_eq!(total, 1.0 / 6.0, epsilon = 1e-14);
/// ```
pub struct TetraMesh {
    node_coords: Vec<Point3<f64>>,
    cells: Vec<[NodeId; 4]>,
    cell_geometry: ArcSwapOption<CellGeometry>,
    face_topology: ArcSwapOption<FaceTopology>,
    edge_topology: ArcSwapOption<EdgeTopology>,
    dual_metrics: ArcSwapOption<DualMetrics>,
    control_volumes: ArcSwapOption<Vec<f64>>,
}

impl TetraMesh {
    /// Creates a mesh from node coordinates and cell connectivity.
    ///
    /// The cell ordering convention is that node `k` of a cell is opposite
    /// its local face `k`; beyond that, cell orientation does not matter.
    ///
    /// # Errors
    ///
    /// Returns a [`MeshConstructionError`] if a cell references a node out
    /// of bounds or twice, or if some node is referenced by no cell.
    pub fn new(
        node_coords: Vec<Point3<f64>>,
        cells: Vec<[NodeId; 4]>,
    ) -> Result<Self, MeshConstructionError> {
        let num_nodes = node_coords.len();
        let mut is_used = vec![false; num_nodes];
        for (cell_id, cell) in cells.iter().enumerate() {
            for (slot, &node) in cell.iter().enumerate() {
                if node >= num_nodes {
                    return Err(MeshConstructionError::NodeIndexOutOfBounds {
                        cell: cell_id,
                        node,
                        num_nodes,
                    });
                }
                if cell[..slot].contains(&node) {
                    return Err(MeshConstructionError::DuplicateNodeInCell {
                        cell: cell_id,
                        node,
                    });
                }
                is_used[node] = true;
            }
        }
        if let Some(node) = is_used.iter().position(|&used| !used) {
            return Err(MeshConstructionError::UnusedNode { node });
        }

        tracing::debug!(
            "constructed tetrahedral mesh with {} nodes and {} cells",
            num_nodes,
            cells.len()
        );

        Ok(Self {
            node_coords,
            cells,
            cell_geometry: ArcSwapOption::empty(),
            face_topology: ArcSwapOption::empty(),
            edge_topology: ArcSwapOption::empty(),
            dual_metrics: ArcSwapOption::empty(),
            control_volumes: ArcSwapOption::empty(),
        })
    }

    /// Convenience constructor taking plain coordinate triples.
    ///
    /// # Errors
    ///
    /// Same as [`TetraMesh::new`].
    pub fn from_arrays(
        node_coords: Vec<[f64; 3]>,
        cells: Vec<[NodeId; 4]>,
    ) -> Result<Self, MeshConstructionError> {
        Self::new(node_coords.into_iter().map(Point3::from).collect(), cells)
    }

    /// Number of nodes.
    #[must_use]
    pub fn num_nodes(&self) -> usize {
        self.node_coords.len()
    }

    /// Number of cells.
    #[must_use]
    pub fn num_cells(&self) -> usize {
        self.cells.len()
    }

    /// The node coordinates, in input order.
    #[must_use]
    pub fn node_coords(&self) -> &[Point3<f64>] {
        &self.node_coords
    }

    /// The cell connectivity, in input order.
    #[must_use]
    pub fn cells(&self) -> &[[NodeId; 4]] {
        &self.cells
    }

    // -------------------------------------------------------------------------
    // Lazily computed tables
    // -------------------------------------------------------------------------

    /// Per-cell circumcenters and volumes, computed on first use.
    #[must_use]
    pub fn cell_geometry(&self) -> Arc<CellGeometry> {
        load_or_compute(&self.cell_geometry, || {
            let (circumcenters, volumes) =
                circumcenters_and_volumes(&self.node_coords, &self.cells);
            tracing::debug!(
                "computed circumcenters and volumes for {} cells",
                volumes.len()
            );
            CellGeometry {
                circumcenters,
                volumes,
            }
        })
    }

    /// The unique face table and cell-face adjacency, computed on first use.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::NonManifoldFace`] if a face is shared by
    /// more than two cells.
    pub fn face_topology(&self) -> Result<Arc<FaceTopology>, TopologyError> {
        load_or_try_compute(&self.face_topology, || build_faces(&self.cells))
    }

    /// The unique edge table and face-edge adjacency, computed on first use.
    ///
    /// # Errors
    ///
    /// Propagates the face-table error for non-manifold input.
    pub fn edge_topology(&self) -> Result<Arc<EdgeTopology>, TopologyError> {
        let faces = self.face_topology()?;
        Ok(load_or_compute(&self.edge_topology, || {
            build_edges(&faces.faces)
        }))
    }

    /// Per-cell dual metrics (face areas, circumcenter-face distances and
    /// ce-ratio contributions), computed on first use with the geometric
    /// closed form.
    #[must_use]
    pub fn dual_metrics(&self) -> Arc<DualMetrics> {
        load_or_compute(&self.dual_metrics, || self.compute_dual_metrics())
    }

    /// Like [`TetraMesh::dual_metrics`], but with an explicit mode.
    ///
    /// # Errors
    ///
    /// Returns [`CeRatioError::AlgebraicModeDisabled`] for
    /// [`CeRatioMode::Algebraic`]; there is no silent fallback.
    pub fn dual_metrics_with_mode(
        &self,
        mode: CeRatioMode,
    ) -> Result<Arc<DualMetrics>, CeRatioError> {
        match mode {
            CeRatioMode::Geometric => Ok(self.dual_metrics()),
            CeRatioMode::Algebraic => Err(CeRatioError::AlgebraicModeDisabled),
        }
    }

    /// Per-node control volumes, computed on first use.
    ///
    /// Every (cell, face, edge) occurrence contributes
    /// `‖edge‖² · ce_ratio / 6` to both endpoint nodes of the edge. For a
    /// Delaunay mesh all entries are positive and they sum to the total
    /// mesh volume; near Delaunay-violating edges entries can legitimately
    /// be negative.
    #[must_use]
    pub fn control_volumes(&self) -> Arc<Vec<f64>> {
        load_or_compute(&self.control_volumes, || self.compute_control_volumes())
    }

    // -------------------------------------------------------------------------
    // Derived views
    // -------------------------------------------------------------------------

    /// Ce-ratios accumulated per unique edge, in edge-table order.
    ///
    /// Interior edges collect contributions from every incident (cell, face)
    /// pair; the scalar can be negative where the mesh is locally
    /// non-Delaunay.
    ///
    /// # Errors
    ///
    /// Propagates topology errors for non-manifold input.
    pub fn edge_ce_ratios(&self) -> Result<Vec<f64>, TopologyError> {
        let faces = self.face_topology()?;
        let edges = self.edge_topology()?;
        let metrics = self.dual_metrics();

        let mut accumulated = vec![0.0; edges.num_edges()];
        for (cell_id, cell) in self.cells.iter().enumerate() {
            for k in 0..4 {
                let face_id = faces.cell_faces[cell_id][k];
                let face = faces.faces[face_id];
                for i in 0..3 {
                    // The cell-local edge i of face k excludes one face
                    // node; the canonical face's edge with the same excluded
                    // node is the same edge.
                    let excluded = cell[CELL_FACES[k][i]];
                    let j = if excluded == face[0] {
                        0
                    } else if excluded == face[1] {
                        1
                    } else {
                        2
                    };
                    accumulated[edges.face_edges[face_id][j]] += metrics.ce_ratios[cell_id][k][i];
                }
            }
        }
        Ok(accumulated)
    }

    /// Length of every unique edge, in edge-table order.
    ///
    /// # Errors
    ///
    /// Propagates topology errors for non-manifold input.
    pub fn edge_lengths(&self) -> Result<Vec<f64>, TopologyError> {
        let edges = self.edge_topology()?;
        Ok(edges
            .edges
            .iter()
            .map(|&[a, b]| (self.node_coords[b] - self.node_coords[a]).norm())
            .collect())
    }

    /// Ids of the faces on the mesh boundary (multiplicity one), ascending.
    ///
    /// # Errors
    ///
    /// Propagates topology errors for non-manifold input.
    pub fn boundary_faces(&self) -> Result<Vec<FaceId>, TopologyError> {
        Ok(self.face_topology()?.boundary_faces())
    }

    /// Ids of the nodes lying on boundary faces, sorted ascending.
    ///
    /// # Errors
    ///
    /// Propagates topology errors for non-manifold input.
    pub fn boundary_nodes(&self) -> Result<Vec<NodeId>, TopologyError> {
        let topology = self.face_topology()?;
        let mut unique: FastHashSet<NodeId> = FastHashSet::default();
        for (face, &boundary) in topology.faces.iter().zip(&topology.is_boundary) {
            if boundary {
                unique.extend(face.iter().copied());
            }
        }
        let mut nodes: Vec<NodeId> = unique.into_iter().collect();
        nodes.sort_unstable();
        Ok(nodes)
    }

    /// Number of faces whose summed signed circumcenter distances are
    /// negative.
    ///
    /// Interior faces sum the contributions of both adjacent cells, boundary
    /// faces use their single cell. Zero means the mesh is (numerically)
    /// Delaunay.
    ///
    /// # Errors
    ///
    /// Propagates topology errors for non-manifold input.
    pub fn num_delaunay_violations(&self) -> Result<usize, TopologyError> {
        let topology = self.face_topology()?;
        let metrics = self.dual_metrics();

        let violations = topology
            .face_cells
            .iter()
            .filter(|adjacent| {
                let sum: f64 = adjacent
                    .iter()
                    .map(|&(cell, k)| metrics.face_distances[cell][usize::from(k)])
                    .sum();
                sum < 0.0
            })
            .count();

        tracing::debug!(
            "delaunay diagnostic: {} of {} faces violating",
            violations,
            topology.num_faces()
        );
        Ok(violations)
    }

    // -------------------------------------------------------------------------
    // Computations behind the caches
    // -------------------------------------------------------------------------

    fn compute_dual_metrics(&self) -> DualMetrics {
        let geometry = self.cell_geometry();
        let coords = &self.node_coords;

        let mut face_areas = Vec::with_capacity(self.cells.len());
        let mut face_distances = Vec::with_capacity(self.cells.len());
        let mut ce_ratios = Vec::with_capacity(self.cells.len());

        for (cell, &volume) in self.cells.iter().zip(&geometry.volumes) {
            let mut areas = [0.0; 4];
            let mut distances = [0.0; 4];
            let mut ratios = [[0.0; 3]; 4];

            for k in 0..4 {
                // Edges between the vertices of local face k, cyclically
                // paired so edge i is opposite face vertex i.
                let face_edges: [Vector3<f64>; 3] = std::array::from_fn(|i| {
                    let [p0, p1] = FACE_EDGES[k][i];
                    coords[cell[p1]] - coords[cell[p0]]
                });
                let (area, face_ce) = triangle_area_and_ce_ratios([
                    face_edges[1].dot(&face_edges[2]),
                    face_edges[2].dot(&face_edges[0]),
                    face_edges[0].dot(&face_edges[1]),
                ]);

                // Edges from the opposing vertex to the face vertices.
                let opposing = coords[cell[k]];
                let spans: [Vector3<f64>; 3] =
                    std::array::from_fn(|j| coords[cell[CELL_FACES[k][j]]] - opposing);
                let dots = OpposingEdgeDots {
                    e0_e0: spans[0].dot(&spans[0]),
                    e1_e1: spans[1].dot(&spans[1]),
                    e2_e2: spans[2].dot(&spans[2]),
                    e0_e1: spans[0].dot(&spans[1]),
                    e1_e2: spans[1].dot(&spans[2]),
                    e2_e0: spans[2].dot(&spans[0]),
                };
                let distance = circumcenter_face_distance(&dots, volume, area);

                areas[k] = area;
                distances[k] = distance;
                for i in 0..3 {
                    ratios[k][i] = 0.5 * face_ce[i] * distance;
                }
            }

            face_areas.push(areas);
            face_distances.push(distances);
            ce_ratios.push(ratios);
        }

        DualMetrics {
            face_areas,
            face_distances,
            ce_ratios,
        }
    }

    fn compute_control_volumes(&self) -> Vec<f64> {
        let metrics = self.dual_metrics();
        let coords = &self.node_coords;

        let mut volumes = vec![0.0; self.node_coords.len()];
        for (cell_id, cell) in self.cells.iter().enumerate() {
            for k in 0..4 {
                for i in 0..3 {
                    let [p0, p1] = FACE_EDGES[k][i];
                    let (a, b) = (cell[p0], cell[p1]);
                    let edge = coords[b] - coords[a];
                    let contribution =
                        edge.dot(&edge) * metrics.ce_ratios[cell_id][k][i] / 6.0;
                    volumes[a] += contribution;
                    volumes[b] += contribution;
                }
            }
        }
        volumes
    }
}

impl fmt::Debug for TetraMesh {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TetraMesh")
            .field("num_nodes", &self.num_nodes())
            .field("num_cells", &self.num_cells())
            .finish_non_exhaustive()
    }
}

// =============================================================================
// CACHE HELPERS
// =============================================================================

/// Loads a memoized table, computing and installing it on first use.
///
/// Uses an RCU update so that under concurrent first access exactly one
/// result wins and every caller observes the same `Arc`.
fn load_or_compute<T, F>(cache: &ArcSwapOption<T>, build: F) -> Arc<T>
where
    F: FnOnce() -> T,
{
    if let Some(cached) = cache.load_full() {
        return cached;
    }
    let built = Arc::new(build());
    cache.rcu(|current| match current {
        Some(existing) => Some(Arc::clone(existing)),
        None => Some(Arc::clone(&built)),
    });
    cache.load_full().unwrap_or(built)
}

/// Fallible variant of [`load_or_compute`]; errors are returned to the
/// caller and nothing is cached, so a later call retries the computation.
fn load_or_try_compute<T, E, F>(cache: &ArcSwapOption<T>, build: F) -> Result<Arc<T>, E>
where
    F: FnOnce() -> Result<T, E>,
{
    if let Some(cached) = cache.load_full() {
        return Ok(cached);
    }
    let built = Arc::new(build()?);
    cache.rcu(|current| match current {
        Some(existing) => Some(Arc::clone(existing)),
        None => Some(Arc::clone(&built)),
    });
    Ok(cache.load_full().unwrap_or(built))
}
