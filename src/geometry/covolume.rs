//! Covolume primitives: triangle ce-ratios and the circumcenter-face
//! distance closed form.
//!
//! The covolume/edge-length ("ce") ratio weights finite-volume flux
//! contributions: for an edge of a triangle it is half the cotangent of the
//! opposite angle, and for a tetrahedron the triangle ratio gets scaled by
//! the signed distance between the cell circumcenter and the face. Both are
//! evaluated as rational functions of edge dot products, without
//! trigonometric calls.

#![forbid(unsafe_code)]

/// Triangle area and per-edge ce-ratios from cyclic edge dot products.
///
/// The input is `d[k] = ⟨e_{k+1}, e_{k+2}⟩` where `e_0`, `e_1`, `e_2` are
/// the edge vectors of the triangle with edge `k` opposite node `k` (so the
/// three vectors sum to zero). Then
///
/// ```text
/// area  = 0.5 · √(d2·d0 + d0·d1 + d1·d2)
/// ce[k] = −d[k] / (4·area)     (= 0.5 · cot of the angle opposite edge k)
/// ```
///
/// A degenerate triangle has zero area and yields non-finite ratios, which
/// callers are expected to propagate rather than repair.
///
/// # Examples
///
/// ```
/// use covolume::geometry::covolume::triangle_area_and_ce_ratios;
///
/// // Right isosceles triangle: the ratio for the hypotenuse (opposite the
/// // right angle) vanishes since cot(90°) = 0.
/// let e0 = [-1.0, 1.0];          // hypotenuse direction
/// let e1 = [0.0, -1.0];
/// let e2 = [1.0, 0.0];
/// let dots = [
///     e1[0] * e2[0] + e1[1] * e2[1],
///     e2[0] * e0[0] + e2[1] * e0[1],
///     e0[0] * e1[0] + e0[1] * e1[1],
/// ];
/// let (area, ce) = triangle_area_and_ce_ratios(dots);
/// assert!((area - 0.5).abs() < 1e-15);
/// assert_eq!(ce[0], 0.0);
/// assert!((ce[1] - 0.5).abs() < 1e-15);
/// assert!((ce[2] - 0.5).abs() < 1e-15);
/// ```
#[must_use]
pub fn triangle_area_and_ce_ratios(ei_dot_ej: [f64; 3]) -> (f64, [f64; 3]) {
    let area = 0.5
        * (ei_dot_ej[2] * ei_dot_ej[0]
            + ei_dot_ej[0] * ei_dot_ej[1]
            + ei_dot_ej[1] * ei_dot_ej[2])
            .sqrt();
    let ce = [
        -ei_dot_ej[0] * 0.25 / area,
        -ei_dot_ej[1] * 0.25 / area,
        -ei_dot_ej[2] * 0.25 / area,
    ];
    (area, ce)
}

/// Batch form of [`triangle_area_and_ce_ratios`] over many triangles.
#[must_use]
pub fn triangle_areas_and_ce_ratios(ei_dot_ej: &[[f64; 3]]) -> (Vec<f64>, Vec<[f64; 3]>) {
    let mut areas = Vec::with_capacity(ei_dot_ej.len());
    let mut ratios = Vec::with_capacity(ei_dot_ej.len());
    for &dots in ei_dot_ej {
        let (area, ce) = triangle_area_and_ce_ratios(dots);
        areas.push(area);
        ratios.push(ce);
    }
    (areas, ratios)
}

/// The six pairwise dot products of the edge vectors `e0`, `e1`, `e2` that
/// run from one tetrahedron vertex to the three vertices of the opposite
/// face.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct OpposingEdgeDots {
    /// `⟨e0, e0⟩`
    pub e0_e0: f64,
    /// `⟨e1, e1⟩`
    pub e1_e1: f64,
    /// `⟨e2, e2⟩`
    pub e2_e2: f64,
    /// `⟨e0, e1⟩`
    pub e0_e1: f64,
    /// `⟨e1, e2⟩`
    pub e1_e2: f64,
    /// `⟨e2, e0⟩`
    pub e2_e0: f64,
}

/// Degree-4 cofactor polynomial from the generalized circumradius identity
/// `72·V² = Σ cofactor·⟨eᵢ, eⱼ⟩`, grouped per squared edge length. Term
/// order is fixed; the sign convention decides violation detection
/// downstream, so do not reassociate.
fn delta(d: &OpposingEdgeDots) -> f64 {
    let OpposingEdgeDots {
        e0_e0,
        e1_e1,
        e2_e2,
        e0_e1,
        e1_e2,
        e2_e0,
    } = *d;

    e0_e0 * e1_e1 * e2_e2 - e2_e2 * e0_e1 * e0_e1
        + e0_e1 * e1_e2 * e2_e2 - e2_e2 * e1_e1 * e2_e0
        + e2_e0 * e0_e1 * e2_e2 - e2_e2 * e1_e2 * e0_e0
        + e0_e1 * e1_e2 * e0_e0 - e0_e0 * e2_e0 * e1_e1
        + e1_e1 * e2_e2 * e0_e0 - e0_e0 * e1_e2 * e1_e2
        + e1_e2 * e2_e0 * e0_e0 - e0_e0 * e2_e2 * e0_e1
        + e2_e0 * e0_e1 * e1_e1 - e1_e1 * e0_e0 * e1_e2
        + e1_e2 * e2_e0 * e1_e1 - e1_e1 * e0_e1 * e2_e2
        + e0_e0 * e2_e2 * e1_e1 - e1_e1 * e2_e0 * e2_e0
}

/// Signed distance between a tetrahedron's circumcenter and one of its
/// faces, positive when the circumcenter lies on the same side as the
/// opposing vertex.
///
/// `dots` are the pairwise products of the edges from the opposing vertex to
/// the face (see [`OpposingEdgeDots`]), `volume` the cell volume and
/// `face_area` the area of the face. The distance is
///
/// ```text
/// (72·volume² − delta) / (24·volume·face_area)
/// ```
///
/// For a degenerate cell (`volume == 0`) the result is non-finite and flows
/// through downstream computations unchanged.
#[must_use]
pub fn circumcenter_face_distance(dots: &OpposingEdgeDots, volume: f64, face_area: f64) -> f64 {
    let a = (72.0 * volume * volume - delta(dots)) / (12.0 * face_area);
    0.5 * a / volume
}
