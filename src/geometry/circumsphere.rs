//! Circumcenter and volume kernel for tetrahedral cells.
//!
//! Closed-form, per-cell formulas with no state; the batch entry point maps
//! them over all cells of a mesh at once.

#![forbid(unsafe_code)]

use nalgebra::Point3;

use crate::core::collections::NodeId;

/// Computes the circumcenter and volume of a single tetrahedron.
///
/// With edge vectors `a`, `b`, `c` from vertex 0 to the other three vertices
/// and the scalar triple product `ω = ⟨a, b×c⟩`, the circumcenter is
///
/// ```text
/// v0 + (b×c·‖a‖² + c×a·‖b‖² + a×b·‖c‖²) / (2ω)
/// ```
///
/// (each cross product weighted by the squared length of the edge it does
/// not involve) and the volume is `|ω| / 6`.
///
/// A degenerate (flat) tetrahedron has `ω = 0`: the volume comes out as an
/// exact `0.0` and the circumcenter as a non-finite point. No error is
/// raised; callers must check the volume before trusting the circumcenter.
///
/// # Examples
///
/// ```
/// use covolume::geometry::circumsphere::circumcenter_and_volume;
/// use nalgebra::Point3;
///
/// let (center, volume) = circumcenter_and_volume(&[
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(0.0, 1.0, 0.0),
///     Point3::new(0.0, 0.0, 1.0),
/// ]);
/// assert_eq!(center, Point3::new(0.5, 0.5, 0.5));
/// assert!((volume - 1.0 / 6.0).abs() < 1e-15);
/// ```
#[must_use]
pub fn circumcenter_and_volume(vertices: &[Point3<f64>; 4]) -> (Point3<f64>, f64) {
    let a = vertices[1] - vertices[0];
    let b = vertices[2] - vertices[0];
    let c = vertices[3] - vertices[0];

    let b_cross_c = b.cross(&c);
    let c_cross_a = c.cross(&a);
    let a_cross_b = a.cross(&b);
    let omega = a.dot(&b_cross_c);

    let relative = (b_cross_c * a.norm_squared()
        + c_cross_a * b.norm_squared()
        + a_cross_b * c.norm_squared())
        / (2.0 * omega);

    (vertices[0] + relative, omega.abs() / 6.0)
}

/// Computes circumcenters and volumes for every cell of a mesh in one pass.
///
/// # Panics
///
/// Panics if a cell references a node id outside `node_coords`; mesh
/// construction guarantees this cannot happen for validated meshes.
#[must_use]
pub fn circumcenters_and_volumes(
    node_coords: &[Point3<f64>],
    cells: &[[NodeId; 4]],
) -> (Vec<Point3<f64>>, Vec<f64>) {
    let mut circumcenters = Vec::with_capacity(cells.len());
    let mut volumes = Vec::with_capacity(cells.len());
    for cell in cells {
        let vertices = [
            node_coords[cell[0]],
            node_coords[cell[1]],
            node_coords[cell[2]],
            node_coords[cell[3]],
        ];
        let (center, volume) = circumcenter_and_volume(&vertices);
        circumcenters.push(center);
        volumes.push(volume);
    }
    (circumcenters, volumes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn regular_tetrahedron() -> [Point3<f64>; 4] {
        let s3 = 3.0_f64.sqrt();
        let s6 = 6.0_f64.sqrt();
        [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, s3 / 2.0, 0.0),
            Point3::new(0.5, s3 / 6.0, s6 / 3.0),
        ]
    }

    #[test]
    fn unit_corner_tetrahedron() {
        let (center, volume) = circumcenter_and_volume(&[
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
        ]);
        assert_relative_eq!(center, Point3::new(0.5, 0.5, 0.5), epsilon = 1e-14);
        assert_relative_eq!(volume, 1.0 / 6.0, epsilon = 1e-14);
    }

    #[test]
    fn regular_tetrahedron_volume_and_equidistance() {
        let vertices = regular_tetrahedron();
        let (center, volume) = circumcenter_and_volume(&vertices);

        assert_relative_eq!(volume, 1.0 / (6.0 * 2.0_f64.sqrt()), epsilon = 1e-14);

        let radius = 0.375_f64.sqrt();
        for vertex in &vertices {
            assert_relative_eq!((vertex - center).norm(), radius, epsilon = 1e-12);
        }
    }

    #[test]
    fn translation_invariance_of_volume() {
        let shift = nalgebra::Vector3::new(10.0, -3.0, 0.25);
        let vertices = regular_tetrahedron();
        let shifted = vertices.map(|v| v + shift);

        let (_, volume) = circumcenter_and_volume(&vertices);
        let (center, shifted_volume) = circumcenter_and_volume(&shifted);
        assert_relative_eq!(volume, shifted_volume, epsilon = 1e-12);
        for vertex in &shifted {
            assert_relative_eq!(
                (vertex - center).norm(),
                0.375_f64.sqrt(),
                epsilon = 1e-12
            );
        }
    }

    #[test]
    fn coplanar_cell_degenerates_without_panicking() {
        let (center, volume) = circumcenter_and_volume(&[
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
        ]);
        assert_eq!(volume, 0.0);
        assert!(!center.coords.iter().all(|c| c.is_finite()));
    }

    #[test]
    fn batch_matches_single_cell_kernel() {
        let coords = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(1.0, 1.0, 1.0),
        ];
        let cells = [[0, 1, 2, 3], [1, 2, 3, 4]];
        let (centers, volumes) = circumcenters_and_volumes(&coords, &cells);
        assert_eq!(centers.len(), 2);
        for (cell, (center, volume)) in cells.iter().zip(centers.iter().zip(&volumes)) {
            let vertices = [
                coords[cell[0]],
                coords[cell[1]],
                coords[cell[2]],
                coords[cell[3]],
            ];
            let (expected_center, expected_volume) = circumcenter_and_volume(&vertices);
            assert_eq!(*center, expected_center);
            assert_eq!(*volume, expected_volume);
        }
    }
}
