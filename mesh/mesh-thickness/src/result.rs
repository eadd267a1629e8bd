//! Result types for thickness analysis.

use std::fmt;

use mesh_types::Point3;

/// Whether a thickness run finished or was cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Completion {
    /// Every vertex was processed.
    Complete,
    /// The cancellation predicate fired; some vertices are not processed.
    Cancelled,
}

impl Completion {
    /// Check if the run processed every vertex.
    #[must_use]
    pub const fn is_complete(self) -> bool {
        matches!(self, Self::Complete)
    }
}

/// A vertex together with its measured thickness.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThicknessSample {
    /// Vertex id.
    pub vertex: usize,
    /// Measured wall thickness.
    pub thickness: f64,
}

/// Aggregate statistics over a computed thickness field.
///
/// Only vertices of the mesh are counted; ids that are holes in a sparse
/// mesh are ignored.
///
/// # Example
///
/// ```
/// use mesh_thickness::ThicknessStats;
///
/// let stats = ThicknessStats::default();
/// assert!(stats.min.is_none());
/// assert!(stats.is_thick_enough(1.0));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThicknessStats {
    /// Thinnest measured vertex; the lowest id wins ties.
    pub min: Option<ThicknessSample>,
    /// Thickest measured vertex; the lowest id wins ties.
    pub max: Option<ThicknessSample>,
    /// Mean of measured thicknesses, or `0.0` if none were measured.
    pub avg_thickness: f64,
    /// Vertices with a measurement.
    pub measured_count: usize,
    /// Vertices without a measurement, for any reason.
    pub unmeasured_count: usize,
    /// Unmeasured because the run was cancelled first.
    pub not_processed_count: usize,
    /// Unmeasured because the normal was missing or degenerate.
    pub degenerate_normal_count: usize,
    /// Unmeasured because the inward ray hit nothing.
    pub no_hit_count: usize,
    /// Unmeasured because the exact intersection test disagreed.
    pub unconfirmed_count: usize,
}

impl ThicknessStats {
    /// Number of vertices covered by the statistics.
    #[must_use]
    pub const fn vertex_count(&self) -> usize {
        self.measured_count + self.unmeasured_count
    }

    /// Percentage of vertices with a measurement.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn coverage_percent(&self) -> f64 {
        let total = self.vertex_count();
        if total == 0 {
            0.0
        } else {
            100.0 * (self.measured_count as f64) / (total as f64)
        }
    }

    /// Check if no measured vertex is thinner than `min_thickness`.
    #[must_use]
    pub fn is_thick_enough(&self, min_thickness: f64) -> bool {
        self.min.is_none_or(|s| s.thickness >= min_thickness)
    }
}

impl fmt::Display for ThicknessStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Wall Thickness Statistics:")?;
        writeln!(f, "  Vertices: {}", self.vertex_count())?;
        writeln!(f, "  Measured: {}", self.measured_count)?;
        writeln!(f, "  Coverage: {:.1}%", self.coverage_percent())?;
        match (self.min, self.max) {
            (Some(min), Some(max)) => {
                writeln!(f, "  Min thickness: {:.3} (vertex {})", min.thickness, min.vertex)?;
                writeln!(f, "  Max thickness: {:.3} (vertex {})", max.thickness, max.vertex)?;
                writeln!(f, "  Avg thickness: {:.3}", self.avg_thickness)?;
            }
            _ => writeln!(f, "  No measurements")?,
        }
        if self.unmeasured_count > 0 {
            writeln!(
                f,
                "  Unmeasured: {} (no hit {}, degenerate normal {}, unconfirmed {}, not processed {})",
                self.unmeasured_count,
                self.no_hit_count,
                self.degenerate_normal_count,
                self.unconfirmed_count,
                self.not_processed_count
            )?;
        }
        Ok(())
    }
}

/// A vertex where the wall is thinner than a threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct ThinRegion {
    /// Vertex id where the thin wall was detected.
    pub vertex: usize,
    /// Position of the vertex.
    pub position: Point3<f64>,
    /// Measured wall thickness at this point.
    pub thickness: f64,
    /// Face index that the inward ray hit.
    pub hit_face: usize,
}

/// Thin regions found for one threshold.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThinRegionReport {
    /// Threshold the regions were checked against.
    pub threshold: f64,
    /// Thin regions in ascending vertex order, at most `max_regions` of them.
    pub regions: Vec<ThinRegion>,
    /// Total number of thin vertices, including any left out of `regions`.
    pub total: usize,
}

impl ThinRegionReport {
    /// Check if any thin region was found.
    #[must_use]
    pub const fn has_thin_regions(&self) -> bool {
        self.total > 0
    }

    /// Whether `regions` was cut short by the region limit.
    #[must_use]
    pub const fn truncated(&self) -> bool {
        self.total > self.regions.len()
    }
}

/// Summary of a one-shot analysis.
///
/// # Example
///
/// ```
/// use mesh_types::unit_cube;
/// use mesh_thickness::{analyze_thickness, ThicknessParams};
///
/// let report = analyze_thickness(&unit_cube(), &ThicknessParams::default(), 0.5)?;
/// assert!(report.completion.is_complete());
/// assert!(!report.thin.has_thin_regions());
/// println!("{report}");
/// # Ok::<(), mesh_thickness::ThicknessError>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisReport {
    /// Whether the run was cancelled.
    pub completion: Completion,
    /// Field statistics.
    pub stats: ThicknessStats,
    /// Thin regions below the requested minimum thickness.
    pub thin: ThinRegionReport,
}

impl AnalysisReport {
    /// Check if the run completed and no wall is below the threshold.
    #[must_use]
    pub const fn passes(&self) -> bool {
        self.completion.is_complete() && !self.thin.has_thin_regions()
    }
}

impl fmt::Display for AnalysisReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.stats)?;
        writeln!(
            f,
            "  Thin regions (< {:.3}): {}",
            self.thin.threshold, self.thin.total
        )?;
        if self.thin.truncated() {
            writeln!(f, "  (showing first {})", self.thin.regions.len())?;
        }
        if !self.completion.is_complete() {
            writeln!(f, "  (cancelled, results are partial)")?;
        }
        Ok(())
    }
}
