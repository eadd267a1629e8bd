//! Per-vertex thickness storage and the queries over it.

// Vertex counts fit comfortably in f64 mantissas.
#![allow(clippy::cast_precision_loss)]

use mesh_types::MeshTopology;

use crate::result::{ThicknessSample, ThicknessStats};

/// Legacy "no measurement" value, for callers that expect a plain `f64`.
pub const THICKNESS_SENTINEL: f64 = f64::MAX;

/// Why a vertex has no thickness value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MissReason {
    /// The id does not name a vertex of the analyzed mesh.
    NoVertex,
    /// The run was cancelled before this vertex was reached.
    NotProcessed,
    /// The vertex normal is missing or too short to give a direction.
    DegenerateNormal,
    /// The inward ray left the mesh (or the search distance) without a hit.
    NoHit,
    /// The exact intersection test rejected the candidate face.
    Unconfirmed,
}

/// Thickness at one vertex.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Thickness {
    /// Distance to the opposing surface, and the face that was hit.
    Measured {
        /// Wall thickness, finite and non-negative.
        distance: f64,
        /// Face index hit by the inward ray.
        face: usize,
    },
    /// No measurement.
    Unmeasured(MissReason),
}

impl Thickness {
    /// The measured distance, if any.
    #[must_use]
    pub const fn distance(self) -> Option<f64> {
        match self {
            Self::Measured { distance, .. } => Some(distance),
            Self::Unmeasured(_) => None,
        }
    }

    /// The face hit by the inward ray, if any.
    #[must_use]
    pub const fn hit_face(self) -> Option<usize> {
        match self {
            Self::Measured { face, .. } => Some(face),
            Self::Unmeasured(_) => None,
        }
    }

    /// Whether a distance was measured.
    #[must_use]
    pub const fn is_measured(self) -> bool {
        matches!(self, Self::Measured { .. })
    }

    /// The distance, or [`THICKNESS_SENTINEL`] when unmeasured.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_thickness::{MissReason, Thickness, THICKNESS_SENTINEL};
    ///
    /// let hit = Thickness::Measured { distance: 1.5, face: 3 };
    /// assert_eq!(hit.to_sentinel(), 1.5);
    ///
    /// let miss = Thickness::Unmeasured(MissReason::NoHit);
    /// assert_eq!(miss.to_sentinel(), THICKNESS_SENTINEL);
    /// ```
    #[must_use]
    pub const fn to_sentinel(self) -> f64 {
        match self {
            Self::Measured { distance, .. } => distance,
            Self::Unmeasured(_) => THICKNESS_SENTINEL,
        }
    }
}

/// Thickness values for every vertex id of a mesh, indexed by id.
///
/// The field has one slot per id below the mesh's `max_vertex_id`. Slots
/// for ids that are not vertices hold [`MissReason::NoVertex`] and are
/// ignored by every query.
#[derive(Debug, Clone, PartialEq)]
pub struct ThicknessField {
    slots: Vec<Thickness>,
}

impl ThicknessField {
    /// Create a field for `mesh` with every vertex marked not processed.
    pub(crate) fn pending<M: MeshTopology + ?Sized>(mesh: &M) -> Self {
        let slots = (0..mesh.max_vertex_id())
            .map(|id| {
                Thickness::Unmeasured(if mesh.is_vertex(id) {
                    MissReason::NotProcessed
                } else {
                    MissReason::NoVertex
                })
            })
            .collect();
        Self { slots }
    }

    pub(crate) fn slots_mut(&mut self) -> &mut [Thickness] {
        &mut self.slots
    }

    /// Number of slots (one past the largest vertex id).
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Check if the field has no slots.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Thickness at `vertex`; ids outside the field are [`MissReason::NoVertex`].
    #[must_use]
    pub fn get(&self, vertex: usize) -> Thickness {
        self.slots
            .get(vertex)
            .copied()
            .unwrap_or(Thickness::Unmeasured(MissReason::NoVertex))
    }

    /// Iterate over `(vertex id, thickness)` for vertices only, in ascending id order.
    pub fn vertices(&self) -> impl Iterator<Item = (usize, Thickness)> + '_ {
        self.slots
            .iter()
            .copied()
            .enumerate()
            .filter(|(_, t)| *t != Thickness::Unmeasured(MissReason::NoVertex))
    }

    /// Every slot in the legacy encoding, unmeasured as [`THICKNESS_SENTINEL`].
    #[must_use]
    pub fn to_sentinel_vec(&self) -> Vec<f64> {
        self.slots.iter().map(|t| t.to_sentinel()).collect()
    }

    /// Ids of vertices whose thickness is strictly below `threshold`, ascending.
    #[must_use]
    pub fn thin_vertices(&self, threshold: f64) -> Vec<usize> {
        self.vertices()
            .filter(|(_, t)| t.distance().is_some_and(|d| d < threshold))
            .map(|(id, _)| id)
            .collect()
    }

    /// Smallest measured thickness; the lowest id wins ties.
    ///
    /// `None` when no vertex was measured.
    #[must_use]
    pub fn minimum(&self) -> Option<ThicknessSample> {
        self.vertices()
            .filter_map(|(vertex, t)| {
                t.distance()
                    .map(|thickness| ThicknessSample { vertex, thickness })
            })
            .fold(None, |best, sample| match best {
                Some(b) if b.thickness <= sample.thickness => Some(b),
                _ => Some(sample),
            })
    }

    /// Aggregate statistics in a single pass.
    #[must_use]
    pub fn statistics(&self) -> ThicknessStats {
        let mut stats = ThicknessStats::default();
        let mut sum = 0.0;

        for (vertex, t) in self.vertices() {
            match t {
                Thickness::Measured { distance, .. } => {
                    let sample = ThicknessSample {
                        vertex,
                        thickness: distance,
                    };
                    stats.measured_count += 1;
                    sum += distance;
                    if stats.min.is_none_or(|m| distance < m.thickness) {
                        stats.min = Some(sample);
                    }
                    if stats.max.is_none_or(|m| distance > m.thickness) {
                        stats.max = Some(sample);
                    }
                }
                Thickness::Unmeasured(reason) => {
                    stats.unmeasured_count += 1;
                    match reason {
                        MissReason::NotProcessed => stats.not_processed_count += 1,
                        MissReason::DegenerateNormal => stats.degenerate_normal_count += 1,
                        MissReason::NoHit => stats.no_hit_count += 1,
                        MissReason::Unconfirmed => stats.unconfirmed_count += 1,
                        MissReason::NoVertex => {}
                    }
                }
            }
        }

        if stats.measured_count > 0 {
            stats.avg_thickness = sum / stats.measured_count as f64;
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn measured(distance: f64) -> Thickness {
        Thickness::Measured { distance, face: 0 }
    }

    fn field(slots: Vec<Thickness>) -> ThicknessField {
        ThicknessField { slots }
    }

    fn sample_field() -> ThicknessField {
        field(vec![
            measured(2.0),
            Thickness::Unmeasured(MissReason::NoVertex),
            measured(0.5),
            Thickness::Unmeasured(MissReason::NoHit),
            measured(0.5),
            measured(3.0),
            Thickness::Unmeasured(MissReason::DegenerateNormal),
        ])
    }

    #[test]
    fn test_get_out_of_range_is_no_vertex() {
        let f = sample_field();
        assert_eq!(f.get(1), Thickness::Unmeasured(MissReason::NoVertex));
        assert_eq!(f.get(100), Thickness::Unmeasured(MissReason::NoVertex));
        assert_eq!(f.get(0).distance(), Some(2.0));
    }

    #[test]
    fn test_vertices_skip_holes() {
        let ids: Vec<usize> = sample_field().vertices().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![0, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_thin_vertices_strict_and_ascending() {
        let f = sample_field();
        assert!(f.thin_vertices(0.5).is_empty());
        assert_eq!(f.thin_vertices(0.6), vec![2, 4]);
        assert_eq!(f.thin_vertices(2.5), vec![0, 2, 4]);
        assert_eq!(f.thin_vertices(f64::INFINITY), vec![0, 2, 4, 5]);
    }

    #[test]
    fn test_minimum_prefers_lowest_id_on_ties() {
        let min = sample_field().minimum();
        assert_eq!(
            min,
            Some(ThicknessSample {
                vertex: 2,
                thickness: 0.5
            })
        );
    }

    #[test]
    fn test_minimum_of_unmeasured_field_is_none() {
        let f = field(vec![
            Thickness::Unmeasured(MissReason::NoHit),
            Thickness::Unmeasured(MissReason::NotProcessed),
        ]);
        assert!(f.minimum().is_none());
    }

    #[test]
    fn test_statistics() {
        let stats = sample_field().statistics();
        assert_eq!(stats.min, sample_field().minimum());
        assert_eq!(stats.max.map(|s| s.vertex), Some(5));
        assert!((stats.avg_thickness - 1.5).abs() < 1e-12);
        assert_eq!(stats.measured_count, 4);
        assert_eq!(stats.unmeasured_count, 2);
        assert_eq!(stats.no_hit_count, 1);
        assert_eq!(stats.degenerate_normal_count, 1);
        assert_eq!(stats.vertex_count(), 6);
    }

    #[test]
    fn test_empty_field_statistics() {
        let stats = field(Vec::new()).statistics();
        assert_eq!(stats.measured_count, 0);
        assert_eq!(stats.unmeasured_count, 0);
        assert!(stats.avg_thickness.abs() < f64::EPSILON);
        assert!(stats.min.is_none() && stats.max.is_none());
    }

    #[test]
    fn test_sentinel_encoding() {
        let legacy = sample_field().to_sentinel_vec();
        assert_eq!(legacy.len(), 7);
        assert!((legacy[0] - 2.0).abs() < f64::EPSILON);
        assert!((legacy[3] - THICKNESS_SENTINEL).abs() < f64::EPSILON);
    }
}
