//! Ray queries against mesh triangles.
//!
//! [`SpatialIndex`] is the two-stage query surface the thickness analysis
//! consumes: a coarse nearest-hit lookup followed by an exact re-intersection
//! against the candidate face. [`TriangleBvh`] is the bounding volume
//! hierarchy implementation of it.

use mesh_types::{MeshTopology, Point3, Triangle, Vector3};
use smallvec::SmallVec;

/// Triangles per leaf before a node is split.
pub const DEFAULT_LEAF_SIZE: usize = 4;

/// Subtrees at least this large are built on both sides of a `rayon::join`.
const PARALLEL_BUILD_THRESHOLD: usize = 4096;

/// Determinant magnitude below which a ray counts as parallel to a face.
const DET_TOLERANCE: f64 = 1e-14;

/// Padding applied to node boxes so flat, axis-aligned faces stay hittable.
const BOX_PADDING: f64 = 1e-9;

/// A half-line with a dead zone near its origin.
///
/// Hits with parameter `t <= min_distance` are ignored by every
/// [`SpatialIndex`] query. The direction is expected to be unit length so
/// that `t` is a distance.
///
/// # Example
///
/// ```
/// use mesh_thickness::Ray;
/// use mesh_types::{Point3, Vector3};
///
/// let ray = Ray::new(Point3::origin(), Vector3::x()).with_min_distance(0.5);
/// assert!((ray.point_at(2.0).x - 2.0).abs() < 1e-12);
/// assert!((ray.min_distance - 0.5).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// Ray origin.
    pub origin: Point3<f64>,
    /// Ray direction (unit length).
    pub direction: Vector3<f64>,
    /// Hits at or before this parameter are ignored.
    pub min_distance: f64,
}

impl Ray {
    /// Create a ray that accepts any hit in front of its origin.
    #[must_use]
    pub const fn new(origin: Point3<f64>, direction: Vector3<f64>) -> Self {
        Self {
            origin,
            direction,
            min_distance: 0.0,
        }
    }

    /// Ignore hits with `t <= min_distance`.
    #[must_use]
    pub const fn with_min_distance(mut self, min_distance: f64) -> Self {
        self.min_distance = min_distance;
        self
    }

    /// Point at parameter `t` along the ray.
    #[must_use]
    pub fn point_at(&self, t: f64) -> Point3<f64> {
        self.origin + self.direction * t
    }

    /// Component-wise inverse direction for slab tests.
    ///
    /// Near-zero components map to `f64::MAX` rather than infinity so that
    /// `0 * inv` stays finite.
    fn inverse_direction(&self) -> Vector3<f64> {
        self.direction.map(|d| {
            if d.abs() > DET_TOLERANCE {
                1.0 / d
            } else {
                f64::MAX
            }
        })
    }
}

/// Ray queries over a fixed snapshot of a mesh's triangles.
///
/// Implementations must be safe to query from many threads at once.
pub trait SpatialIndex {
    /// Find the face hit first by `ray` with `ray.min_distance < t <= max_distance`.
    fn nearest_hit(&self, ray: &Ray, max_distance: f64) -> Option<usize>;

    /// Exactly intersect `ray` with one face.
    ///
    /// Returns the hit parameter if the face exists and the ray crosses it
    /// with `t > ray.min_distance`.
    fn intersect(&self, face: usize, ray: &Ray) -> Option<f64>;
}

fn is_finite(tri: &Triangle) -> bool {
    tri.vertices().iter().all(|p| p.iter().all(|c| c.is_finite()))
}

/// Axis-aligned bounding box of a BVH node.
#[derive(Debug, Clone, Copy)]
struct Aabb {
    min: Point3<f64>,
    max: Point3<f64>,
}

impl Aabb {
    fn empty() -> Self {
        Self {
            min: Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            max: Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    fn from_triangle(tri: &Triangle) -> Self {
        let mut aabb = Self::empty();
        for p in tri.vertices() {
            aabb.min = aabb.min.inf(&p);
            aabb.max = aabb.max.sup(&p);
        }
        aabb
    }

    fn expand(&mut self, other: &Self) {
        self.min = self.min.inf(&other.min);
        self.max = self.max.sup(&other.max);
    }

    fn padded(&self, padding: f64) -> Self {
        let pad = Vector3::repeat(padding);
        Self {
            min: self.min - pad,
            max: self.max + pad,
        }
    }

    fn center(&self) -> Point3<f64> {
        nalgebra::center(&self.min, &self.max)
    }

    fn longest_axis(&self) -> usize {
        let extent = self.max - self.min;
        if extent.x >= extent.y && extent.x >= extent.z {
            0
        } else if extent.y >= extent.z {
            1
        } else {
            2
        }
    }

    /// Slab test. Returns the entry and exit parameters clipped to `t >= 0`.
    fn ray_intersect(&self, origin: &Point3<f64>, dir_inv: &Vector3<f64>) -> Option<(f64, f64)> {
        let t1 = (self.min - origin).component_mul(dir_inv);
        let t2 = (self.max - origin).component_mul(dir_inv);

        let t_min = t1.inf(&t2).max();
        let t_max = t1.sup(&t2).min();

        if t_max >= t_min && t_max >= 0.0 {
            Some((t_min.max(0.0), t_max))
        } else {
            None
        }
    }
}

#[derive(Debug)]
enum BvhNode {
    Leaf {
        aabb: Aabb,
        faces: SmallVec<[u32; DEFAULT_LEAF_SIZE]>,
    },
    Internal {
        aabb: Aabb,
        left: Box<BvhNode>,
        right: Box<BvhNode>,
    },
}

impl BvhNode {
    const fn aabb(&self) -> &Aabb {
        match self {
            Self::Leaf { aabb, .. } | Self::Internal { aabb, .. } => aabb,
        }
    }
}

/// Bounding volume hierarchy over a mesh's triangles.
///
/// Built once from a mesh snapshot; later mesh edits are not reflected.
/// Face ids match the mesh's face indices. Faces that reference missing
/// vertices or have non-finite coordinates are left out of the tree and
/// never reported as hits.
///
/// # Example
///
/// ```
/// use mesh_thickness::{Ray, SpatialIndex, TriangleBvh};
/// use mesh_types::{unit_cube, Point3, Vector3};
///
/// let bvh = TriangleBvh::build(&unit_cube());
/// let ray = Ray::new(Point3::new(0.5, 0.5, 2.0), -Vector3::z());
///
/// let face = bvh.nearest_hit(&ray, f64::INFINITY).unwrap();
/// let t = bvh.intersect(face, &ray).unwrap();
/// assert!((t - 1.0).abs() < 1e-12); // top face at z = 1
/// ```
#[derive(Debug)]
pub struct TriangleBvh {
    root: Option<BvhNode>,
    triangles: Vec<Option<Triangle>>,
}

impl TriangleBvh {
    /// Build a BVH with [`DEFAULT_LEAF_SIZE`] triangles per leaf.
    #[must_use]
    pub fn build<M: MeshTopology + ?Sized>(mesh: &M) -> Self {
        Self::with_leaf_size(mesh, DEFAULT_LEAF_SIZE)
    }

    /// Build a BVH with at most `max_leaf_size` triangles per leaf.
    ///
    /// Large subtrees are built in parallel.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn with_leaf_size<M: MeshTopology + ?Sized>(mesh: &M, max_leaf_size: usize) -> Self {
        let triangles: Vec<Option<Triangle>> = (0..mesh.face_count())
            .map(|i| mesh.triangle(i).filter(is_finite))
            .collect();

        // Mesh faces are u32-indexed, so face ids fit in u32
        let boxes: Vec<(u32, Aabb)> = triangles
            .iter()
            .enumerate()
            .filter_map(|(i, tri)| Some((i as u32, Aabb::from_triangle(tri.as_ref()?))))
            .collect();

        let root = if boxes.is_empty() {
            None
        } else {
            let indices: Vec<usize> = (0..boxes.len()).collect();
            Some(Self::build_recursive(&boxes, indices, max_leaf_size.max(1)))
        };

        Self { root, triangles }
    }

    fn build_recursive(
        boxes: &[(u32, Aabb)],
        indices: Vec<usize>,
        max_leaf_size: usize,
    ) -> BvhNode {
        let mut aabb = Aabb::empty();
        for &i in &indices {
            aabb.expand(&boxes[i].1);
        }
        let aabb = aabb.padded(BOX_PADDING);

        if indices.len() <= max_leaf_size {
            return BvhNode::Leaf {
                aabb,
                faces: indices.iter().map(|&i| boxes[i].0).collect(),
            };
        }

        // Split at the median centroid along the longest axis
        let axis = aabb.longest_axis();
        let mut sorted = indices;
        sorted.sort_by(|&a, &b| {
            let ca = boxes[a].1.center()[axis];
            let cb = boxes[b].1.center()[axis];
            ca.total_cmp(&cb)
        });

        let right_indices = sorted.split_off(sorted.len() / 2);
        let left_indices = sorted;

        let (left, right) = if right_indices.len() >= PARALLEL_BUILD_THRESHOLD {
            rayon::join(
                || Self::build_recursive(boxes, left_indices, max_leaf_size),
                || Self::build_recursive(boxes, right_indices, max_leaf_size),
            )
        } else {
            (
                Self::build_recursive(boxes, left_indices, max_leaf_size),
                Self::build_recursive(boxes, right_indices, max_leaf_size),
            )
        };

        BvhNode::Internal {
            aabb,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Number of faces in the mesh snapshot, including unresolvable ones.
    #[must_use]
    pub fn face_count(&self) -> usize {
        self.triangles.len()
    }

    /// Check if the hierarchy holds no triangles.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    fn hit_parameter(&self, face: usize, ray: &Ray) -> Option<f64> {
        let tri = self.triangles.get(face)?.as_ref()?;
        tri.ray_parameter(&ray.origin, &ray.direction, DET_TOLERANCE)
            .filter(|&t| t > ray.min_distance)
    }

    fn trace(
        &self,
        node: &BvhNode,
        ray: &Ray,
        dir_inv: &Vector3<f64>,
        max_distance: f64,
        best: &mut Option<(f64, usize)>,
    ) {
        let limit = best.map_or(max_distance, |(t, _)| t);
        match node.aabb().ray_intersect(&ray.origin, dir_inv) {
            Some((t_near, t_far)) if t_near <= limit && t_far > ray.min_distance => {}
            _ => return,
        }

        match node {
            BvhNode::Leaf { faces, .. } => {
                for &face in faces {
                    let face = face as usize;
                    let Some(t) = self.hit_parameter(face, ray) else {
                        continue;
                    };
                    // Ties keep the first face found
                    let closer = match *best {
                        Some((best_t, _)) => t < best_t,
                        None => t <= max_distance,
                    };
                    if closer {
                        *best = Some((t, face));
                    }
                }
            }
            BvhNode::Internal { left, right, .. } => {
                self.trace(left, ray, dir_inv, max_distance, best);
                self.trace(right, ray, dir_inv, max_distance, best);
            }
        }
    }
}

impl SpatialIndex for TriangleBvh {
    fn nearest_hit(&self, ray: &Ray, max_distance: f64) -> Option<usize> {
        let root = self.root.as_ref()?;
        let dir_inv = ray.inverse_direction();
        let mut best = None;
        self.trace(root, ray, &dir_inv, max_distance, &mut best);
        best.map(|(_, face)| face)
    }

    fn intersect(&self, face: usize, ray: &Ray) -> Option<f64> {
        self.hit_parameter(face, ray)
    }
}
