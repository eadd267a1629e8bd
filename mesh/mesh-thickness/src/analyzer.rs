//! The stateful analyzer: compute once, query many times.

use std::sync::OnceLock;

use mesh_types::{MeshTopology, area_weighted_normals};
use tracing::{debug, info, warn};

use crate::analysis::{VertexNormals, measure_all};
use crate::bvh::{SpatialIndex, TriangleBvh};
use crate::error::{ThicknessError, ThicknessResult};
use crate::field::{Thickness, ThicknessField};
use crate::params::ThicknessParams;
use crate::result::{
    AnalysisReport, Completion, ThicknessSample, ThicknessStats, ThinRegion, ThinRegionReport,
};

/// Where the analyzer gets its ray-query index.
enum IndexSource<'a> {
    /// Supplied by the caller, who keeps ownership.
    Borrowed(&'a (dyn SpatialIndex + Sync)),
    /// Built from the mesh on the first compute and reused afterwards.
    Owned(OnceLock<TriangleBvh>),
}

/// Per-vertex wall thickness over one mesh.
///
/// The analyzer borrows the mesh immutably for its whole lifetime, so the
/// geometry cannot change between [`compute`](Self::compute) and the
/// queries. Every query fails with [`ThicknessError::NotComputed`] until
/// `compute` has run once.
///
/// # Example
///
/// ```
/// use mesh_types::uv_sphere;
/// use mesh_thickness::{ThicknessAnalyzer, ThicknessParams};
///
/// let sphere = uv_sphere(5.0, 16, 32);
/// let mut analyzer = ThicknessAnalyzer::new(&sphere, ThicknessParams::default());
/// analyzer.compute()?;
///
/// let stats = analyzer.statistics()?;
/// assert!(stats.measured_count > 0);
/// assert!(analyzer.thin_vertices(1.0)?.is_empty());
/// # Ok::<(), mesh_thickness::ThicknessError>(())
/// ```
pub struct ThicknessAnalyzer<'a, M: MeshTopology + Sync> {
    mesh: &'a M,
    params: ThicknessParams,
    index: IndexSource<'a>,
    field: Option<ThicknessField>,
}

impl<'a, M: MeshTopology + Sync> ThicknessAnalyzer<'a, M> {
    /// Create an analyzer that builds its own [`TriangleBvh`] when first computed.
    #[must_use]
    pub const fn new(mesh: &'a M, params: ThicknessParams) -> Self {
        Self {
            mesh,
            params,
            index: IndexSource::Owned(OnceLock::new()),
            field: None,
        }
    }

    /// Create an analyzer that queries a caller-owned index.
    ///
    /// The index must describe the same triangles as `mesh`, with face
    /// indices matching the mesh's face order.
    #[must_use]
    pub const fn with_index(
        mesh: &'a M,
        index: &'a (dyn SpatialIndex + Sync),
        params: ThicknessParams,
    ) -> Self {
        Self {
            mesh,
            params,
            index: IndexSource::Borrowed(index),
            field: None,
        }
    }

    /// The parameters used by [`compute`](Self::compute).
    #[must_use]
    pub const fn params(&self) -> &ThicknessParams {
        &self.params
    }

    /// Check if the analyzer builds and owns its index.
    #[must_use]
    pub const fn owns_index(&self) -> bool {
        matches!(self.index, IndexSource::Owned(_))
    }

    /// Check if [`compute`](Self::compute) has run.
    #[must_use]
    pub const fn is_computed(&self) -> bool {
        self.field.is_some()
    }

    /// Measure the thickness at every vertex.
    ///
    /// Runs in parallel. A cancelled run still stores its partial field, with
    /// the vertices it did not reach marked not processed, and reports
    /// [`Completion::Cancelled`]. Computing again replaces the field.
    ///
    /// # Errors
    ///
    /// - [`ThicknessError::InvalidParams`] if the parameters fail validation.
    /// - [`ThicknessError::MissingNormals`] if the mesh lacks vertex normals
    ///   and `auto_compute_normals` is off.
    ///
    /// On error the previously computed field, if any, is kept.
    pub fn compute(&mut self) -> ThicknessResult<Completion> {
        self.params.validate()?;
        let normals = self.prepare_normals()?;

        info!(
            vertices = self.mesh.vertex_count(),
            faces = self.mesh.face_count(),
            epsilon = self.params.epsilon,
            max_ray_distance = self.params.max_ray_distance,
            "Starting wall thickness analysis"
        );

        let mesh = self.mesh;
        let index: &(dyn SpatialIndex + Sync) = match &self.index {
            IndexSource::Borrowed(index) => *index,
            IndexSource::Owned(cell) => cell.get_or_init(|| {
                let bvh = TriangleBvh::build(mesh);
                debug!(faces = bvh.face_count(), "Built triangle BVH");
                bvh
            }),
        };

        let (field, completed) = measure_all(mesh, &normals, index, &self.params);
        let stats = field.statistics();
        self.field = Some(field);

        if completed {
            info!(
                measured = stats.measured_count,
                unmeasured = stats.unmeasured_count,
                min_thickness = ?stats.min.map(|s| s.thickness),
                "Wall thickness analysis complete"
            );
            Ok(Completion::Complete)
        } else {
            warn!(
                measured = stats.measured_count,
                not_processed = stats.not_processed_count,
                "Wall thickness analysis cancelled"
            );
            Ok(Completion::Cancelled)
        }
    }

    /// Mesh normals win wherever present; the rest are estimated from faces.
    fn prepare_normals(&self) -> ThicknessResult<VertexNormals> {
        let missing = self
            .mesh
            .vertex_ids()
            .filter(|&id| self.mesh.vertex(id).is_none_or(|v| !v.has_normal()))
            .count();
        if missing == 0 {
            return Ok(VertexNormals::FromMesh);
        }
        if !self.params.auto_compute_normals {
            return Err(ThicknessError::missing_normals());
        }
        debug!(
            missing,
            total = self.mesh.vertex_count(),
            "Estimating normals for vertices without one"
        );
        Ok(VertexNormals::Estimated(area_weighted_normals(self.mesh)))
    }

    /// The computed field.
    ///
    /// # Errors
    ///
    /// Returns [`ThicknessError::NotComputed`] before the first compute.
    pub fn field(&self) -> ThicknessResult<&ThicknessField> {
        self.field.as_ref().ok_or(ThicknessError::NotComputed)
    }

    /// Thickness at one vertex.
    ///
    /// Ids that are not vertices of the mesh give
    /// [`MissReason::NoVertex`](crate::MissReason::NoVertex).
    ///
    /// # Errors
    ///
    /// Returns [`ThicknessError::NotComputed`] before the first compute.
    pub fn thickness(&self, vertex: usize) -> ThicknessResult<Thickness> {
        Ok(self.field()?.get(vertex))
    }

    /// Ids of vertices measured strictly thinner than `threshold`, ascending.
    ///
    /// # Errors
    ///
    /// Returns [`ThicknessError::NotComputed`] before the first compute.
    pub fn thin_vertices(&self, threshold: f64) -> ThicknessResult<Vec<usize>> {
        Ok(self.field()?.thin_vertices(threshold))
    }

    /// The thinnest measured vertex, or `None` if nothing was measured.
    ///
    /// # Errors
    ///
    /// Returns [`ThicknessError::NotComputed`] before the first compute.
    pub fn minimum_thickness(&self) -> ThicknessResult<Option<ThicknessSample>> {
        Ok(self.field()?.minimum())
    }

    /// Aggregate statistics over the field.
    ///
    /// # Errors
    ///
    /// Returns [`ThicknessError::NotComputed`] before the first compute.
    pub fn statistics(&self) -> ThicknessResult<ThicknessStats> {
        Ok(self.field()?.statistics())
    }

    /// Thin vertices with their positions and hit faces.
    ///
    /// At most `max_regions` regions are listed, lowest ids first; the
    /// report's `total` still counts all of them.
    ///
    /// # Errors
    ///
    /// Returns [`ThicknessError::NotComputed`] before the first compute.
    pub fn thin_regions(
        &self,
        threshold: f64,
        max_regions: usize,
    ) -> ThicknessResult<ThinRegionReport> {
        let field = self.field()?;
        let mut report = ThinRegionReport {
            threshold,
            ..ThinRegionReport::default()
        };

        for (vertex, t) in field.vertices() {
            let Thickness::Measured { distance, face } = t else {
                continue;
            };
            if distance >= threshold || distance.is_nan() {
                continue;
            }
            report.total += 1;
            if report.regions.len() < max_regions {
                if let Some(v) = self.mesh.vertex(vertex) {
                    report.regions.push(ThinRegion {
                        vertex,
                        position: v.position,
                        thickness: distance,
                        hit_face: face,
                    });
                }
            }
        }

        if report.has_thin_regions() {
            warn!(
                thin_count = report.total,
                threshold, "Found thin regions below threshold"
            );
        }
        Ok(report)
    }
}

/// Default number of thin regions listed by [`analyze_thickness`].
pub const DEFAULT_MAX_REGIONS: usize = 1000;

/// Compute thickness and summarize it against `min_thickness` in one call.
///
/// # Errors
///
/// Same as [`ThicknessAnalyzer::compute`].
pub fn analyze_thickness<M: MeshTopology + Sync>(
    mesh: &M,
    params: &ThicknessParams,
    min_thickness: f64,
) -> ThicknessResult<AnalysisReport> {
    let mut analyzer = ThicknessAnalyzer::new(mesh, params.clone());
    let completion = analyzer.compute()?;
    Ok(AnalysisReport {
        completion,
        stats: analyzer.statistics()?,
        thin: analyzer.thin_regions(min_thickness, DEFAULT_MAX_REGIONS)?,
    })
}
