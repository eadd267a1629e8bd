//! Traits for mesh types.

use crate::{Triangle, Vertex};

/// Trait for types that provide mesh topology information.
///
/// Vertices are addressed by stable `usize` ids. Ids may be sparse: a mesh
/// that had vertices removed keeps the surviving ids unchanged and leaves
/// holes behind, so `max_vertex_id` can exceed `vertex_count`.
///
/// This is the read-only surface analysis crates consume; they never need
/// mutable access to the mesh.
pub trait MeshTopology {
    /// Get the number of live vertices.
    fn vertex_count(&self) -> usize;

    /// Get the number of faces (triangles).
    fn face_count(&self) -> usize;

    /// Check if the mesh is empty.
    fn is_empty(&self) -> bool {
        self.vertex_count() == 0 || self.face_count() == 0
    }

    /// Upper bound on vertex ids: every live id is strictly below this.
    fn max_vertex_id(&self) -> usize;

    /// Check whether `id` refers to a live vertex.
    fn is_vertex(&self, id: usize) -> bool {
        self.vertex(id).is_some()
    }

    /// Get a vertex by id.
    ///
    /// Returns `None` if the id is out of range or the vertex was removed.
    fn vertex(&self, id: usize) -> Option<&Vertex>;

    /// Iterate over live vertex ids in ascending order.
    fn vertex_ids(&self) -> impl Iterator<Item = usize>;

    /// Iterate over all faces as vertex id triples.
    fn faces(&self) -> impl Iterator<Item = [u32; 3]>;

    /// Get a triangle by face index with resolved vertex positions.
    ///
    /// Returns `None` if the face index is out of bounds or the face
    /// references a vertex that does not exist.
    fn triangle(&self, face_index: usize) -> Option<Triangle>;

    /// Iterate over all resolvable triangles together with their face index.
    fn triangles(&self) -> impl Iterator<Item = (usize, Triangle)> {
        (0..self.face_count()).filter_map(|i| self.triangle(i).map(|tri| (i, tri)))
    }

    /// Check whether every live vertex carries a normal.
    ///
    /// An empty mesh trivially has normals.
    fn has_vertex_normals(&self) -> bool {
        self.vertex_ids()
            .all(|id| self.vertex(id).is_some_and(Vertex::has_normal))
    }
}
