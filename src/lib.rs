//! # covolume
//!
//! Voronoi finite-volume geometry for tetrahedral meshes.
//!
//! Given node coordinates and cell-to-node connectivity, this library
//! derives the quantities a Voronoi-based finite-volume discretization
//! needs:
//!
//! - unique face and edge tables with cell-face and face-edge adjacency,
//!   built by canonical-tuple deduplication in first-occurrence order
//! - per-cell circumcenters and volumes from closed-form expressions
//! - covolume/edge-length ("ce") ratios per (cell, face, edge) and
//!   accumulated per unique edge
//! - per-node control volumes via scatter accumulation
//! - a count of Delaunay-violating faces as a mesh-quality diagnostic
//!
//! Mesh file I/O, visualization and mesh generation are deliberately out of
//! scope; the library consumes plain coordinate/connectivity data and
//! produces serializable tables keyed by stable integer ids.
//!
//! # Basic Usage
//!
//! ```rust
//! use approx::assert_relative_eq;
//! use covolume::prelude::*;
//!
//! // A unit cube split into six tetrahedra around the main diagonal.
//! let nodes: Vec<[f64; 3]> = (0..8)
//!     .map(|i| [f64::from(i & 1), f64::from((i >> 1) & 1), f64::from((i >> 2) & 1)])
//!     .collect();
//! let cells = vec![
//!     [0, 1, 3, 7],
//!     [0, 1, 5, 7],
//!     [0, 2, 3, 7],
//!     [0, 2, 6, 7],
//!     [0, 4, 5, 7],
//!     [0, 4, 6, 7],
//! ];
//! let mesh = TetraMesh::from_arrays(nodes, cells).unwrap();
//!
//! // Every cell of the split has volume 1/6.
//! let geometry = mesh.cell_geometry();
//! for &volume in &geometry.volumes {
//!     assert_relative_eq!(volume, 1.0 / 6.0, epsilon = 1e-14);
//! }
//!
//! // The control volumes partition the cube volume among the eight nodes.
//! let control_volumes = mesh.control_volumes();
//! let total: f64 = control_volumes.iter().sum();
//! assert_relative_eq!(total, 1.0, epsilon = 1e-12);
//!
//! // The split is Delaunay.
//! assert_eq!(mesh.num_delaunay_violations().unwrap(), 0);
//! ```
//!
//! # Error Handling
//!
//! Structural problems abort mesh construction or topology building with an
//! explicit error: unused nodes, out-of-bounds or repeated node indices
//! ([`MeshConstructionError`](core::mesh::MeshConstructionError)) and
//! non-manifold faces ([`TopologyError`](core::topology::TopologyError)).
//! Numerical degeneracy is not an error: a flat cell yields volume `0.0`
//! and non-finite circumcenter, distances and ratios, preserving the rest
//! of the mesh; callers are expected to check finiteness where it matters.
//! The algebraic ce-ratio mode is explicitly unsupported and requesting it
//! fails with [`CeRatioError`](core::mesh::CeRatioError) rather than
//! silently falling back to the geometric closed form.

#![forbid(unsafe_code)]

/// Mesh data structures and topology construction.
pub mod core {
    /// Collection aliases and entity id types.
    pub mod collections;
    /// The tetrahedral mesh and its lazily derived tables.
    pub mod mesh;
    /// Face and edge table construction.
    pub mod topology;
    pub use mesh::*;
    pub use topology::*;
}

/// Closed-form geometric kernels operating on batches of simplices.
pub mod geometry {
    /// Circumcenter and volume of tetrahedral cells.
    pub mod circumsphere;
    /// Triangle ce-ratios and circumcenter-face distances.
    pub mod covolume;
    pub use circumsphere::*;
    pub use covolume::*;
}

/// Re-exports of the commonly used types and functions.
pub mod prelude {
    pub use crate::core::{
        collections::{CellId, EdgeId, EdgeKey, FaceId, FaceKey, NodeId},
        mesh::{
            CeRatioError, CeRatioMode, CellGeometry, DualMetrics, MeshConstructionError, TetraMesh,
        },
        topology::{
            build_edges, build_faces, EdgeTopology, FaceTopology, TopologyError, CELL_FACES,
            FACE_EDGES,
        },
    };
    pub use crate::geometry::{
        circumsphere::{circumcenter_and_volume, circumcenters_and_volumes},
        covolume::{
            circumcenter_face_distance, triangle_area_and_ce_ratios,
            triangle_areas_and_ce_ratios, OpposingEdgeDots,
        },
    };
}
