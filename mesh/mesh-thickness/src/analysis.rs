//! Per-vertex ray casting and the parallel measurement loop.
//!
//! Thickness at a vertex is the distance from the vertex to the first
//! surface hit by a ray cast inward, opposite to the vertex normal.

use mesh_types::{MeshTopology, Point3, Vector3};
use rayon::prelude::*;
use tracing::debug;

use crate::bvh::{Ray, SpatialIndex};
use crate::field::{MissReason, Thickness, ThicknessField};
use crate::params::{ThicknessParams, ZERO_TOLERANCE};

/// Hits closer than this many offsets from the ray origin belong to the
/// faces around the vertex itself.
const SELF_HIT_FACTOR: f64 = 2.0;

/// Measure the wall thickness at one vertex.
///
/// The ray starts `params.epsilon` outside the surface along the normal and
/// travels inward. Faces met within `2 * epsilon` of the origin are the
/// vertex's own faces and are ignored, so walls thinner than about
/// `epsilon` go unmeasured. The offset is subtracted from the hit distance
/// and the result is clamped at zero.
///
/// A missing, non-finite or near-zero `normal` gives
/// [`MissReason::DegenerateNormal`].
///
/// # Example
///
/// ```
/// use mesh_types::{Point3, Vector3, unit_cube};
/// use mesh_thickness::{measure_vertex, ThicknessParams, TriangleBvh};
///
/// let cube = unit_cube();
/// let bvh = TriangleBvh::build(&cube);
/// let params = ThicknessParams::default();
///
/// // Center of the top face, normal pointing up
/// let top = Point3::new(0.5, 0.5, 1.0);
/// let t = measure_vertex(&top, Some(Vector3::z()), &bvh, &params);
/// assert!((t.distance().unwrap_or(0.0) - 1.0).abs() < 1e-9);
/// ```
pub fn measure_vertex<I: SpatialIndex + ?Sized>(
    position: &Point3<f64>,
    normal: Option<Vector3<f64>>,
    index: &I,
    params: &ThicknessParams,
) -> Thickness {
    let Some(normal) = normal
        .filter(|n| n.iter().all(|c| c.is_finite()))
        .and_then(|n| n.try_normalize(ZERO_TOLERANCE))
    else {
        return Thickness::Unmeasured(MissReason::DegenerateNormal);
    };

    let epsilon = params.epsilon;
    let ray = Ray::new(position + normal * epsilon, -normal)
        .with_min_distance(SELF_HIT_FACTOR * epsilon);

    let Some(face) = index.nearest_hit(&ray, params.max_ray_distance) else {
        return Thickness::Unmeasured(MissReason::NoHit);
    };
    let Some(t) = index.intersect(face, &ray).filter(|t| t.is_finite()) else {
        return Thickness::Unmeasured(MissReason::Unconfirmed);
    };

    Thickness::Measured {
        distance: (t - epsilon).max(0.0),
        face,
    }
}

/// Where vertex normals come from for one run.
#[derive(Debug)]
pub(crate) enum VertexNormals {
    /// Every vertex carries its own normal.
    FromMesh,
    /// Estimated normals, indexed by vertex id, for vertices without one.
    Estimated(Vec<Option<Vector3<f64>>>),
}

impl VertexNormals {
    fn normal<M: MeshTopology + ?Sized>(&self, mesh: &M, vertex: usize) -> Option<Vector3<f64>> {
        let own = mesh.vertex(vertex).and_then(|v| v.normal);
        match self {
            Self::FromMesh => own,
            Self::Estimated(normals) => own.or_else(|| normals.get(vertex).copied().flatten()),
        }
    }
}

/// Marker for a run stopped by the cancellation predicate.
struct Interrupted;

/// Measure every vertex of `mesh` in parallel.
///
/// Vertices are processed in chunks of `params.cancel_check_interval` ids;
/// the cancellation predicate is polled once at the start of each chunk.
/// Returns the field and whether the run finished without cancellation.
/// On cancellation, vertices not reached keep [`MissReason::NotProcessed`].
pub(crate) fn measure_all<M, I>(
    mesh: &M,
    normals: &VertexNormals,
    index: &I,
    params: &ThicknessParams,
) -> (ThicknessField, bool)
where
    M: MeshTopology + Sync + ?Sized,
    I: SpatialIndex + Sync + ?Sized,
{
    let mut field = ThicknessField::pending(mesh);
    let interval = params.cancel_check_interval.max(1);
    let cancel = params.cancel.as_ref();

    debug!(
        slots = field.len(),
        chunk_size = interval,
        "Casting inward rays"
    );

    let outcome = field
        .slots_mut()
        .par_chunks_mut(interval)
        .enumerate()
        .try_for_each(|(chunk, slots)| {
            if cancel.is_some_and(|c| c.is_cancelled()) {
                return Err(Interrupted);
            }
            let first = chunk * interval;
            for (offset, slot) in slots.iter_mut().enumerate() {
                let id = first + offset;
                let Some(vertex) = mesh.vertex(id) else {
                    continue;
                };
                *slot = measure_vertex(&vertex.position, normals.normal(mesh, id), index, params);
            }
            Ok(())
        });

    (field, outcome.is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bvh::TriangleBvh;
    use crate::cancel::CancelCheck;
    use crate::params::DEFAULT_EPSILON;
    use mesh_types::{IndexedMesh, Vertex, area_weighted_normals, unit_cube};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Two 2x2 squares at z = 0 and z = `gap`.
    fn plates(gap: f64) -> IndexedMesh {
        let mut mesh = IndexedMesh::new();
        for z in [0.0, gap] {
            mesh.add_vertex(Vertex::from_coords(0.0, 0.0, z));
            mesh.add_vertex(Vertex::from_coords(2.0, 0.0, z));
            mesh.add_vertex(Vertex::from_coords(2.0, 2.0, z));
            mesh.add_vertex(Vertex::from_coords(0.0, 2.0, z));
        }
        for base in [0, 4] {
            mesh.add_face([base, base + 1, base + 2]);
            mesh.add_face([base, base + 2, base + 3]);
        }
        mesh
    }

    fn measure_from_top(gap: f64) -> Thickness {
        let mesh = plates(gap);
        let bvh = TriangleBvh::build(&mesh);
        let top = Point3::new(0.3, 0.7, gap);
        measure_vertex(&top, Some(Vector3::z()), &bvh, &ThicknessParams::default())
    }

    /// Index that always proposes face 0 and answers with a fixed parameter.
    struct FixedIndex(Option<f64>);

    impl SpatialIndex for FixedIndex {
        fn nearest_hit(&self, _ray: &Ray, _max_distance: f64) -> Option<usize> {
            Some(0)
        }

        fn intersect(&self, _face: usize, _ray: &Ray) -> Option<f64> {
            self.0
        }
    }

    #[test]
    fn test_measures_plate_gap() {
        let t = measure_from_top(1.0);
        let distance = t.distance().unwrap_or(f64::NAN);
        assert!((distance - 1.0).abs() < 1e-12);
        assert!(matches!(t.hit_face(), Some(0 | 1)));
    }

    #[test]
    fn test_offset_is_compensated_on_thin_walls() {
        let gap = 5.0 * DEFAULT_EPSILON;
        let distance = measure_from_top(gap).distance().unwrap_or(f64::NAN);
        assert!((distance - gap).abs() < 1e-12, "got {distance}");
    }

    #[test]
    fn test_walls_below_offset_floor_are_unmeasured() {
        let t = measure_from_top(0.5 * DEFAULT_EPSILON);
        assert_eq!(t, Thickness::Unmeasured(MissReason::NoHit));
    }

    #[test]
    fn test_degenerate_normals() {
        let bvh = TriangleBvh::build(&plates(1.0));
        let params = ThicknessParams::default();
        let p = Point3::new(0.3, 0.7, 1.0);

        for normal in [
            None,
            Some(Vector3::zeros()),
            Some(Vector3::new(0.0, 0.0, 1e-9)),
            Some(Vector3::new(f64::NAN, 0.0, 1.0)),
        ] {
            assert_eq!(
                measure_vertex(&p, normal, &bvh, &params),
                Thickness::Unmeasured(MissReason::DegenerateNormal),
                "normal {normal:?}"
            );
        }
    }

    #[test]
    fn test_unnormalized_normal_is_accepted() {
        let bvh = TriangleBvh::build(&plates(1.0));
        let p = Point3::new(0.3, 0.7, 1.0);
        let n = Some(Vector3::new(0.0, 0.0, 7.5));
        let t = measure_vertex(&p, n, &bvh, &ThicknessParams::default());
        assert!(t.distance().is_some_and(|d| (d - 1.0).abs() < 1e-12));
    }

    #[test]
    fn test_max_ray_distance_gives_no_hit() {
        let bvh = TriangleBvh::build(&plates(1.0));
        let params = ThicknessParams::default().max_ray_distance(0.5);
        let p = Point3::new(0.3, 0.7, 1.0);
        let t = measure_vertex(&p, Some(Vector3::z()), &bvh, &params);
        assert_eq!(t, Thickness::Unmeasured(MissReason::NoHit));
    }

    #[test]
    fn test_unconfirmed_candidates() {
        let params = ThicknessParams::default();
        let p = Point3::origin();
        let n = Some(Vector3::z());

        for index in [
            FixedIndex(None),
            FixedIndex(Some(f64::NAN)),
            FixedIndex(Some(f64::INFINITY)),
        ] {
            assert_eq!(
                measure_vertex(&p, n, &index, &params),
                Thickness::Unmeasured(MissReason::Unconfirmed)
            );
        }
    }

    #[test]
    fn test_result_is_clamped_at_zero() {
        let params = ThicknessParams::default();
        let index = FixedIndex(Some(0.5 * params.epsilon));
        let t = measure_vertex(&Point3::origin(), Some(Vector3::z()), &index, &params);
        assert_eq!(t, Thickness::Measured { distance: 0.0, face: 0 });
    }

    #[test]
    fn test_measure_all_cube() {
        let cube = unit_cube();
        let bvh = TriangleBvh::build(&cube);
        let normals = VertexNormals::Estimated(area_weighted_normals(&cube));
        let params = ThicknessParams::default().cancel_check_interval(3);

        let (field, completed) = measure_all(&cube, &normals, &bvh, &params);
        assert!(completed);
        assert_eq!(field.len(), 8);
        for (id, t) in field.vertices() {
            assert!(t.is_measured(), "vertex {id} unmeasured: {t:?}");
        }
    }

    #[test]
    fn test_measure_all_skips_holes() {
        let mut cube = unit_cube();
        cube.add_vertex(Vertex::from_coords(9.0, 9.0, 9.0));
        cube.remove_vertex(8);
        let bvh = TriangleBvh::build(&cube);
        let normals = VertexNormals::Estimated(area_weighted_normals(&cube));

        let (field, completed) = measure_all(&cube, &normals, &bvh, &ThicknessParams::default());
        assert!(completed);
        assert_eq!(field.get(8), Thickness::Unmeasured(MissReason::NoVertex));
    }

    #[test]
    fn test_cancel_before_start_processes_nothing() {
        let cube = unit_cube();
        let bvh = TriangleBvh::build(&cube);
        let normals = VertexNormals::Estimated(area_weighted_normals(&cube));
        let params = ThicknessParams::default()
            .cancel_check_interval(1)
            .with_cancel(CancelCheck::new(|| true));

        let (field, completed) = measure_all(&cube, &normals, &bvh, &params);
        assert!(!completed);
        assert!(
            field
                .vertices()
                .all(|(_, t)| t == Thickness::Unmeasured(MissReason::NotProcessed))
        );
    }

    #[test]
    fn test_cancel_mid_run_leaves_unprocessed_vertices() {
        let cube = unit_cube();
        let bvh = TriangleBvh::build(&cube);
        let normals = VertexNormals::Estimated(area_weighted_normals(&cube));
        let polls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&polls);
        let params = ThicknessParams::default()
            .cancel_check_interval(1)
            .with_cancel(CancelCheck::new(move || counter.fetch_add(1, Ordering::SeqCst) >= 3));

        let (field, completed) = measure_all(&cube, &normals, &bvh, &params);
        assert!(!completed);

        // One vertex per chunk, and only three polls allowed work through
        let measured = field.vertices().filter(|(_, t)| t.is_measured()).count();
        assert!(measured <= 3, "measured {measured}");
        assert!(polls.load(Ordering::SeqCst) >= 4);
    }
}
