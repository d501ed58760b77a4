//! Redshift wedge projection.
//!
//! Each galaxy is placed in the plane with its redshift as the radius and
//! its right ascension as the polar angle, so galaxies at one redshift lie
//! on a circle around the origin and large-scale structure shows up as
//! shells binned by cosmic epoch.
//!
//! This is a visualisation aid only. Redshift is used directly as a radius:
//! the projection is not distance-preserving and is not a comoving-distance
//! computation, so plotted separations carry no physical length.

use crate::data::model::CatalogRow;

/// A galaxy placed in the wedge plane, with its redshift kept for colouring.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectedPoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// How sky positions are flattened onto the plot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProjectionKind {
    /// Angle from RA, radius from redshift. Iso-redshift sets are circles.
    #[default]
    Polar,
    /// Orthographic projection onto the plane tangent to the mean pointing,
    /// scaled by redshift. Keeps a narrow footprint compact but does not give
    /// circular iso-redshift contours.
    TangentPlane,
}

impl ProjectionKind {
    pub const ALL: [ProjectionKind; 2] = [ProjectionKind::Polar, ProjectionKind::TangentPlane];

    pub fn label(self) -> &'static str {
        match self {
            ProjectionKind::Polar => "Polar (RA angle, z radius)",
            ProjectionKind::TangentPlane => "Tangent plane",
        }
    }
}

/// Polar wedge coordinates for one source: θ = RA in radians,
/// `(z cos θ, z sin θ)`. A zero redshift maps to the origin.
pub fn project_wedge(ra_deg: f64, z: f64) -> (f64, f64) {
    let theta = ra_deg.to_radians();
    (z * theta.cos(), z * theta.sin())
}

/// Project rows in order.
pub fn project_rows<'a, I>(rows: I, kind: ProjectionKind) -> Vec<ProjectedPoint>
where
    I: IntoIterator<Item = &'a CatalogRow>,
{
    match kind {
        ProjectionKind::Polar => rows
            .into_iter()
            .map(|r| {
                let (x, y) = project_wedge(r.ra, r.z);
                ProjectedPoint { x, y, z: r.z }
            })
            .collect(),
        ProjectionKind::TangentPlane => {
            let rows: Vec<&CatalogRow> = rows.into_iter().collect();
            let positions: Vec<(f64, f64, f64)> =
                rows.iter().map(|r| (r.ra, r.dec, r.z)).collect();
            project_tangent_plane(&positions)
        }
    }
}

type Vec3 = [f64; 3];

fn unit_vector(ra_deg: f64, dec_deg: f64) -> Vec3 {
    let (ra, dec) = (ra_deg.to_radians(), dec_deg.to_radians());
    [dec.cos() * ra.cos(), dec.cos() * ra.sin(), dec.sin()]
}

fn cross(a: Vec3, b: Vec3) -> Vec3 {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn dot(a: Vec3, b: Vec3) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn norm(a: Vec3) -> f64 {
    dot(a, a).sqrt()
}

fn scale(a: Vec3, s: f64) -> Vec3 {
    [a[0] * s, a[1] * s, a[2] * s]
}

/// Tangent basis `(t1, t2)` at `center`, with `t1` perpendicular to the
/// north celestial pole. Falls back to the x axis when `center` is the pole.
fn tangent_basis(center: Vec3) -> (Vec3, Vec3) {
    const NORTH: Vec3 = [0.0, 0.0, 1.0];
    let t1 = cross(center, NORTH);
    let n1 = norm(t1);
    let t1 = if n1 > 1e-12 {
        scale(t1, 1.0 / n1)
    } else {
        [1.0, 0.0, 0.0]
    };
    (t1, cross(center, t1))
}

/// `(ra_deg, dec_deg, z)` triples onto the plane tangent to their mean
/// direction, coordinates scaled by redshift.
pub fn project_tangent_plane(positions: &[(f64, f64, f64)]) -> Vec<ProjectedPoint> {
    if positions.is_empty() {
        return Vec::new();
    }

    let units: Vec<Vec3> = positions
        .iter()
        .map(|&(ra, dec, _)| unit_vector(ra, dec))
        .collect();

    let mut mean = [0.0; 3];
    for u in &units {
        for k in 0..3 {
            mean[k] += u[k];
        }
    }
    let n = norm(mean);
    // Footprint symmetric about the origin: no preferred centre, use the pole.
    let center = if n > 1e-12 {
        scale(mean, 1.0 / n)
    } else {
        [0.0, 0.0, 1.0]
    };
    let (t1, t2) = tangent_basis(center);

    units
        .iter()
        .zip(positions)
        .map(|(u, &(_, _, z))| ProjectedPoint {
            x: dot(*u, t1) * z,
            y: dot(*u, t2) * z,
            z,
        })
        .collect()
}
