//! End-to-end thickness scenarios on small known meshes.
//!
//! Run with: cargo test -p mesh-thickness --test scenarios

use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use approx::assert_relative_eq;
use mesh_thickness::{
    CancelCheck, Completion, DEFAULT_EPSILON, MissReason, Thickness, ThicknessAnalyzer,
    ThicknessError, ThicknessParams, TriangleBvh, analyze_thickness,
};
use mesh_types::{IndexedMesh, MeshTopology, Point3, Vector3, Vertex, unit_cube, uv_sphere};

// =============================================================================
// Mesh builders
// =============================================================================

/// Two `size` x `size` unit-grid plates, at z = 0 facing down and at
/// z = `gap` facing up. Every vertex carries its plate normal.
fn plates(size: u32, gap: f64) -> IndexedMesh {
    let n = size + 1;
    let mut mesh = IndexedMesh::new();

    for (z, normal) in [(0.0, -Vector3::z()), (gap, Vector3::z())] {
        for j in 0..n {
            for i in 0..n {
                let position = Point3::new(f64::from(i), f64::from(j), z);
                mesh.add_vertex(Vertex::with_normal(position, normal));
            }
        }
    }

    for plate in 0..2 {
        let base = plate * n * n;
        for j in 0..size {
            for i in 0..size {
                let a = base + j * n + i;
                let (b, c, d) = (a + 1, a + n + 1, a + n);
                if plate == 0 {
                    mesh.add_face([a, c, b]);
                    mesh.add_face([a, d, c]);
                } else {
                    mesh.add_face([a, b, c]);
                    mesh.add_face([a, c, d]);
                }
            }
        }
    }

    mesh
}

fn computed<M: MeshTopology + Sync>(
    mesh: &M,
    params: ThicknessParams,
) -> ThicknessAnalyzer<'_, M> {
    let mut analyzer = ThicknessAnalyzer::new(mesh, params);
    match analyzer.compute() {
        Ok(Completion::Complete) => analyzer,
        other => panic!("compute did not complete: {other:?}"),
    }
}

fn measured_values<M: MeshTopology + Sync>(analyzer: &ThicknessAnalyzer<'_, M>) -> Vec<f64> {
    analyzer
        .field()
        .map(|f| f.vertices().filter_map(|(_, t)| t.distance()).collect())
        .unwrap_or_default()
}

// =============================================================================
// Closed shapes
// =============================================================================

#[test]
fn sphere_thickness_is_close_to_diameter() {
    let radius = 10.0;
    let sphere = uv_sphere(radius, 24, 48);
    let analyzer = computed(&sphere, ThicknessParams::default());

    let values = measured_values(&analyzer);
    let close = values
        .iter()
        .filter(|&&t| (t - 2.0 * radius).abs() <= 0.3 * 2.0 * radius)
        .count();

    assert!(
        close * 10 >= sphere.vertex_count() * 7,
        "only {close} of {} vertices near the diameter",
        sphere.vertex_count()
    );
}

#[test]
fn cube_walls_are_at_least_one_unit() {
    let cube = unit_cube();
    let analyzer = computed(&cube, ThicknessParams::for_printing());

    let stats = analyzer.statistics().unwrap_or_default();
    assert_eq!(stats.measured_count, 8);
    assert!(stats.is_thick_enough(1.0 - 1e-9));
    assert!(stats.max.is_some_and(|s| s.thickness <= 3f64.sqrt() + 1e-9));
    assert_relative_eq!(stats.coverage_percent(), 100.0);
}

#[test]
fn inverted_sphere_is_mostly_unmeasured() {
    let mut sphere = uv_sphere(5.0, 12, 24);
    sphere.flip_normals();
    assert!(sphere.is_inside_out());

    let analyzer = computed(&sphere, ThicknessParams::default());
    let stats = analyzer.statistics().unwrap_or_default();

    assert!(
        stats.unmeasured_count * 10 >= stats.vertex_count() * 9,
        "{stats}"
    );
    assert_eq!(stats.no_hit_count, stats.unmeasured_count);
}

// =============================================================================
// Parallel plates
// =============================================================================

#[test]
fn parallel_plates_measure_the_gap() {
    let gap = 2.0;
    let mesh = plates(4, gap);
    let analyzer = computed(&mesh, ThicknessParams::default().auto_compute_normals(false));

    let values = measured_values(&analyzer);
    assert_eq!(values.len(), mesh.vertex_count());
    for t in values {
        assert_relative_eq!(t, gap, epsilon = 1e-9);
    }

    let all: Vec<usize> = mesh.vertex_ids().collect();
    assert_eq!(analyzer.thin_vertices(gap + 0.01), Ok(all));
    assert_eq!(analyzer.thin_vertices(gap - 0.01), Ok(Vec::new()));
}

#[test]
fn plates_a_few_offsets_apart_are_measured_exactly() {
    let gap = 10.0 * DEFAULT_EPSILON;
    let mesh = plates(2, gap);
    let analyzer = computed(&mesh, ThicknessParams::default());

    let min = analyzer.minimum_thickness().ok().flatten();
    let min = min.map_or(f64::NAN, |s| s.thickness);
    assert_relative_eq!(min, gap, max_relative = 1e-6);
}

#[test]
fn plates_thinner_than_the_offset_are_unmeasured() {
    let mesh = plates(2, 0.25 * DEFAULT_EPSILON);
    let analyzer = computed(&mesh, ThicknessParams::default());

    let stats = analyzer.statistics().unwrap_or_default();
    assert_eq!(stats.measured_count, 0);
    assert_eq!(stats.no_hit_count, mesh.vertex_count());
    assert_eq!(analyzer.minimum_thickness(), Ok(None));
}

#[test]
fn max_ray_distance_limits_plates() {
    let mesh = plates(2, 3.0);
    let analyzer = computed(&mesh, ThicknessParams::default().max_ray_distance(2.0));

    let stats = analyzer.statistics().unwrap_or_default();
    assert_eq!(stats.measured_count, 0);
    assert!(analyzer.thin_vertices(f64::INFINITY).is_ok_and(|v| v.is_empty()));
}

// =============================================================================
// Degenerate inputs
// =============================================================================

#[test]
fn empty_mesh_has_empty_field() {
    let mesh = IndexedMesh::new();
    let analyzer = computed(&mesh, ThicknessParams::default());

    assert!(analyzer.field().is_ok_and(|f| f.is_empty()));
    assert_eq!(analyzer.minimum_thickness(), Ok(None));
    let stats = analyzer.statistics().unwrap_or_default();
    assert_eq!(stats.vertex_count(), 0);
    assert!(stats.avg_thickness.abs() < f64::EPSILON);
}

#[test]
fn single_triangle_has_nothing_opposite() {
    let mut mesh = IndexedMesh::new();
    mesh.add_vertex(Vertex::from_coords(0.0, 0.0, 0.0));
    mesh.add_vertex(Vertex::from_coords(1.0, 0.0, 0.0));
    mesh.add_vertex(Vertex::from_coords(0.0, 1.0, 0.0));
    mesh.add_face([0, 1, 2]);

    let analyzer = computed(&mesh, ThicknessParams::default());
    for id in 0..3 {
        assert_eq!(
            analyzer.thickness(id),
            Ok(Thickness::Unmeasured(MissReason::NoHit))
        );
    }
    assert_eq!(analyzer.minimum_thickness(), Ok(None));
}

#[test]
fn sparse_ids_are_skipped() {
    let mut mesh = unit_cube();
    let removed = mesh.add_vertex(Vertex::from_coords(4.0, 4.0, 4.0));
    mesh.remove_vertex(removed);
    let isolated = mesh.add_vertex(Vertex::from_coords(8.0, 8.0, 8.0));

    let analyzer = computed(&mesh, ThicknessParams::default());

    assert_eq!(analyzer.field().map(|f| f.len()), Ok(mesh.max_vertex_id()));
    assert_eq!(
        analyzer.thickness(removed),
        Ok(Thickness::Unmeasured(MissReason::NoVertex))
    );
    assert_eq!(
        analyzer.thickness(isolated),
        Ok(Thickness::Unmeasured(MissReason::DegenerateNormal))
    );

    let stats = analyzer.statistics().unwrap_or_default();
    assert_eq!(stats.vertex_count(), mesh.vertex_count());
    assert_eq!(stats.degenerate_normal_count, 1);
    assert!(!analyzer.thin_vertices(f64::INFINITY).unwrap_or_default().contains(&removed));
}

#[test]
fn non_finite_vertices_only_cost_their_own_measurements() {
    let mut sphere = uv_sphere(5.0, 12, 24);
    let broken: Vec<usize> = (100..106).collect();
    for &id in &broken {
        sphere.vertices[id] = Some(Vertex::from_coords(f64::NAN, 0.0, f64::NAN));
    }

    let analyzer = computed(&sphere, ThicknessParams::default());

    for &id in &broken {
        assert!(analyzer.thickness(id).is_ok_and(|t| !t.is_measured()), "vertex {id}");
    }
    let stats = analyzer.statistics().unwrap_or_default();
    assert!(stats.measured_count > sphere.vertex_count() / 2);
    assert!(measured_values(&analyzer).iter().all(|d| d.is_finite() && *d <= 10.0 + 1e-6));
}

#[test]
fn missing_normals_is_a_configuration_error() {
    let cube = unit_cube();
    let params = ThicknessParams::default().auto_compute_normals(false);
    let mut analyzer = ThicknessAnalyzer::new(&cube, params);

    let err = analyzer.compute();
    assert_eq!(err, Err(ThicknessError::MissingNormals));
    assert!(err.is_err_and(|e| e.is_configuration()));
    assert!(!analyzer.is_computed());
}

// =============================================================================
// Lifecycle
// =============================================================================

#[test]
fn cancelled_before_start_processes_nothing() {
    let sphere = uv_sphere(3.0, 8, 16);
    let flag = Arc::new(AtomicBool::new(true));
    let params = ThicknessParams::default()
        .cancel_check_interval(4)
        .with_cancel(CancelCheck::from_flag(Arc::clone(&flag)));

    let mut analyzer = ThicknessAnalyzer::new(&sphere, params);
    assert_eq!(analyzer.compute(), Ok(Completion::Cancelled));

    for id in sphere.vertex_ids() {
        assert_eq!(
            analyzer.thickness(id),
            Ok(Thickness::Unmeasured(MissReason::NotProcessed))
        );
    }
    assert_eq!(analyzer.minimum_thickness(), Ok(None));
}

#[test]
fn recompute_replaces_the_field() {
    let sphere = uv_sphere(3.0, 8, 16);
    let flag = Arc::new(AtomicBool::new(true));
    let params = ThicknessParams::default().with_cancel(CancelCheck::from_flag(Arc::clone(&flag)));

    let mut analyzer = ThicknessAnalyzer::new(&sphere, params);
    assert_eq!(analyzer.compute(), Ok(Completion::Cancelled));

    flag.store(false, std::sync::atomic::Ordering::Relaxed);
    assert_eq!(analyzer.compute(), Ok(Completion::Complete));
    let stats = analyzer.statistics().unwrap_or_default();
    assert_eq!(stats.not_processed_count, 0);
    assert!(stats.measured_count > 0);
}

#[test]
fn results_do_not_depend_on_chunking() {
    let sphere = uv_sphere(4.0, 10, 20);
    let coarse = computed(&sphere, ThicknessParams::default().cancel_check_interval(1000));
    let fine = computed(&sphere, ThicknessParams::default().cancel_check_interval(1));

    assert_eq!(coarse.field(), fine.field());
}

#[test]
fn shared_index_serves_several_analyzers() {
    let sphere = uv_sphere(5.0, 12, 24);
    let bvh = TriangleBvh::build(&sphere);

    let mut full = ThicknessAnalyzer::with_index(&sphere, &bvh, ThicknessParams::default());
    let mut bounded = ThicknessAnalyzer::with_index(
        &sphere,
        &bvh,
        ThicknessParams::default().max_ray_distance(1.0),
    );
    assert_eq!(full.compute(), Ok(Completion::Complete));
    assert_eq!(bounded.compute(), Ok(Completion::Complete));

    let owned = computed(&sphere, ThicknessParams::default());
    assert_eq!(full.field(), owned.field());
    assert_eq!(bounded.statistics().map(|s| s.measured_count), Ok(0));

    // Different thresholds on the same field
    let thin_loose = full.thin_vertices(20.0).unwrap_or_default();
    let thin_strict = full.thin_vertices(5.0).unwrap_or_default();
    assert_eq!(thin_loose.len(), full.statistics().map(|s| s.measured_count).unwrap_or(0));
    assert!(thin_strict.is_empty());
}

#[test]
fn one_shot_report() {
    let report = analyze_thickness(&plates(3, 0.5), &ThicknessParams::default(), 0.8);
    let report = report.unwrap_or_else(|e| panic!("analysis failed: {e}"));

    assert!(!report.passes());
    assert_eq!(report.thin.total, 32);
    assert!(report.thin.regions.iter().all(|r| (r.thickness - 0.5).abs() < 1e-9));
    assert!(format!("{report}").contains("Thin regions (< 0.800): 32"));
}
