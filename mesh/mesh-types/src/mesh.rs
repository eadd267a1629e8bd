//! Indexed triangle mesh with stable vertex ids.

use crate::{MeshTopology, Triangle, Vertex, area_weighted_normals};
use nalgebra::Vector3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An indexed triangle mesh.
///
/// Vertices live in slots addressed by stable ids. Removing a vertex
/// empties its slot instead of compacting the array, so the ids of all
/// other vertices survive edits and the id space may become sparse.
///
/// # Memory Layout
///
/// - `vertices`: `Vec<Option<Vertex>>` - one slot per id, `None` once removed
/// - `faces`: `Vec<[u32; 3]>` - Triangle faces as vertex ids
///
/// # Winding Order
///
/// Faces use **counter-clockwise (CCW) winding** when viewed from outside.
/// This means normals point outward by the right-hand rule.
///
/// # Example
///
/// ```
/// use mesh_types::{IndexedMesh, Vertex, MeshTopology};
///
/// let mut mesh = IndexedMesh::new();
/// let a = mesh.add_vertex(Vertex::from_coords(0.0, 0.0, 0.0));
/// let b = mesh.add_vertex(Vertex::from_coords(1.0, 0.0, 0.0));
/// let c = mesh.add_vertex(Vertex::from_coords(0.0, 1.0, 0.0));
/// let d = mesh.add_vertex(Vertex::from_coords(9.0, 9.0, 9.0));
/// mesh.add_face([a as u32, b as u32, c as u32]);
///
/// mesh.remove_vertex(d);
/// assert_eq!(mesh.vertex_count(), 3);
/// assert_eq!(mesh.max_vertex_id(), 4);
/// assert!(!mesh.is_vertex(d));
/// ```
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct IndexedMesh {
    /// Vertex slots indexed by vertex id.
    pub vertices: Vec<Option<Vertex>>,

    /// Triangle faces as ids into the vertex slots.
    /// Each face is `[v0, v1, v2]` with counter-clockwise winding.
    pub faces: Vec<[u32; 3]>,
}

impl IndexedMesh {
    /// Create a new empty mesh.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            vertices: Vec::new(),
            faces: Vec::new(),
        }
    }

    /// Create a mesh with pre-allocated capacity.
    #[inline]
    #[must_use]
    pub fn with_capacity(vertex_count: usize, face_count: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertex_count),
            faces: Vec::with_capacity(face_count),
        }
    }

    /// Create a mesh from densely packed vertices and faces.
    ///
    /// Vertex `i` of `vertices` receives id `i`.
    #[must_use]
    pub fn from_parts(vertices: Vec<Vertex>, faces: Vec<[u32; 3]>) -> Self {
        Self {
            vertices: vertices.into_iter().map(Some).collect(),
            faces,
        }
    }

    /// Append a vertex and return its id.
    pub fn add_vertex(&mut self, vertex: Vertex) -> usize {
        self.vertices.push(Some(vertex));
        self.vertices.len() - 1
    }

    /// Append a face.
    pub fn add_face(&mut self, face: [u32; 3]) {
        self.faces.push(face);
    }

    /// Remove a vertex, leaving its id unused, and drop every face that
    /// references it.
    ///
    /// Returns the removed vertex, or `None` if the id was not live.
    pub fn remove_vertex(&mut self, id: usize) -> Option<Vertex> {
        let removed = self.vertices.get_mut(id)?.take()?;
        self.faces
            .retain(|face| face.iter().all(|&vi| vi as usize != id));
        Some(removed)
    }

    /// Store area-weighted normals on every vertex that has incident faces.
    ///
    /// Vertices without a usable normal keep `None`.
    pub fn compute_normals(&mut self) {
        let normals = area_weighted_normals(&*self);
        for (slot, normal) in self.vertices.iter_mut().zip(normals) {
            if let Some(vertex) = slot {
                vertex.normal = normal;
            }
        }
    }

    /// Clear all vertex normals.
    pub fn clear_normals(&mut self) {
        for vertex in self.vertices.iter_mut().flatten() {
            vertex.normal = None;
        }
    }

    /// Flip all face normals by reversing winding order.
    pub fn flip_normals(&mut self) {
        for face in &mut self.faces {
            face.swap(1, 2);
        }
        for vertex in self.vertices.iter_mut().flatten() {
            if let Some(ref mut normal) = vertex.normal {
                *normal = -*normal;
            }
        }
    }

    /// Compute the signed volume of the mesh.
    ///
    /// Sum of signed tetrahedra formed by each face and the origin. Positive
    /// for a closed mesh with outward-facing winding, negative when the mesh
    /// is inside-out. Faces referencing missing vertices are skipped.
    #[must_use]
    pub fn signed_volume(&self) -> f64 {
        self.triangles()
            .map(|(_, tri)| {
                let [v0, v1, v2] = tri.vertices();
                v0.coords.dot(&v1.coords.cross(&v2.coords))
            })
            .sum::<f64>()
            / 6.0
    }

    /// Check if the mesh appears to be inside-out.
    #[inline]
    #[must_use]
    pub fn is_inside_out(&self) -> bool {
        self.signed_volume() < 0.0
    }

    /// Translate mesh by the given vector.
    pub fn translate(&mut self, offset: Vector3<f64>) {
        for vertex in self.vertices.iter_mut().flatten() {
            vertex.position += offset;
        }
    }
}

impl MeshTopology for IndexedMesh {
    #[inline]
    fn vertex_count(&self) -> usize {
        self.vertices.iter().flatten().count()
    }

    #[inline]
    fn face_count(&self) -> usize {
        self.faces.len()
    }

    #[inline]
    fn max_vertex_id(&self) -> usize {
        self.vertices.len()
    }

    fn vertex(&self, id: usize) -> Option<&Vertex> {
        self.vertices.get(id).and_then(Option::as_ref)
    }

    fn vertex_ids(&self) -> impl Iterator<Item = usize> {
        self.vertices
            .iter()
            .enumerate()
            .filter_map(|(id, slot)| slot.as_ref().map(|_| id))
    }

    fn faces(&self) -> impl Iterator<Item = [u32; 3]> {
        self.faces.iter().copied()
    }

    fn triangle(&self, face_index: usize) -> Option<Triangle> {
        let [i0, i1, i2] = *self.faces.get(face_index)?;
        Some(Triangle {
            v0: self.vertex(i0 as usize)?.position,
            v1: self.vertex(i1 as usize)?.position,
            v2: self.vertex(i2 as usize)?.position,
        })
    }
}

/// Helper function to create a unit cube mesh.
///
/// Creates a cube from (0,0,0) to (1,1,1) with outward-facing winding and
/// no stored normals.
///
/// # Example
///
/// ```
/// use mesh_types::{unit_cube, MeshTopology};
///
/// let cube = unit_cube();
/// assert_eq!(cube.vertex_count(), 8);
/// assert_eq!(cube.face_count(), 12);
/// ```
#[must_use]
pub fn unit_cube() -> IndexedMesh {
    let corners = [
        [0.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [1.0, 1.0, 0.0],
        [0.0, 1.0, 0.0],
        [0.0, 0.0, 1.0],
        [1.0, 0.0, 1.0],
        [1.0, 1.0, 1.0],
        [0.0, 1.0, 1.0],
    ];

    // 2 triangles per side, CCW when viewed from outside
    let faces = vec![
        [0, 2, 1],
        [0, 3, 2], // bottom (-Z)
        [4, 5, 6],
        [4, 6, 7], // top (+Z)
        [0, 1, 5],
        [0, 5, 4], // front (-Y)
        [3, 7, 6],
        [3, 6, 2], // back (+Y)
        [0, 4, 7],
        [0, 7, 3], // left (-X)
        [1, 2, 6],
        [1, 6, 5], // right (+X)
    ];

    IndexedMesh::from_parts(corners.into_iter().map(Vertex::from).collect(), faces)
}

/// Create a UV sphere centred at the origin.
///
/// `stacks` is the number of latitude bands (at least 2) and `slices` the
/// number of longitude segments (at least 3); smaller values are clamped.
/// The poles are single vertices. Winding is outward-facing and no normals
/// are stored.
///
/// # Example
///
/// ```
/// use mesh_types::{uv_sphere, MeshTopology};
///
/// let sphere = uv_sphere(2.0, 8, 12);
/// assert_eq!(sphere.vertex_count(), 2 + 7 * 12);
/// assert!(!sphere.is_inside_out());
/// ```
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
pub fn uv_sphere(radius: f64, stacks: usize, slices: usize) -> IndexedMesh {
    let stacks = stacks.max(2);
    let slices = slices.max(3);
    let ring_count = stacks - 1;

    let mut mesh = IndexedMesh::with_capacity(2 + ring_count * slices, 2 * ring_count * slices);

    let north = mesh.add_vertex(Vertex::from_coords(0.0, 0.0, radius)) as u32;
    for ring in 1..=ring_count {
        let theta = std::f64::consts::PI * ring as f64 / stacks as f64;
        let (sin_t, cos_t) = theta.sin_cos();
        for slice in 0..slices {
            let phi = std::f64::consts::TAU * slice as f64 / slices as f64;
            let (sin_p, cos_p) = phi.sin_cos();
            mesh.add_vertex(Vertex::from_coords(
                radius * sin_t * cos_p,
                radius * sin_t * sin_p,
                radius * cos_t,
            ));
        }
    }
    let south = mesh.add_vertex(Vertex::from_coords(0.0, 0.0, -radius)) as u32;

    let ring_vertex = |ring: usize, slice: usize| (1 + ring * slices + slice % slices) as u32;

    for slice in 0..slices {
        mesh.add_face([north, ring_vertex(0, slice), ring_vertex(0, slice + 1)]);
    }
    for ring in 0..ring_count - 1 {
        for slice in 0..slices {
            let a = ring_vertex(ring, slice);
            let b = ring_vertex(ring + 1, slice);
            let c = ring_vertex(ring + 1, slice + 1);
            let d = ring_vertex(ring, slice + 1);
            mesh.add_face([a, b, c]);
            mesh.add_face([a, c, d]);
        }
    }
    for slice in 0..slices {
        mesh.add_face([
            south,
            ring_vertex(ring_count - 1, slice + 1),
            ring_vertex(ring_count - 1, slice),
        ]);
    }

    mesh
}
