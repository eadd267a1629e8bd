//! Vertex normal estimation.

use nalgebra::Vector3;

use crate::MeshTopology;

/// Compute area-weighted vertex normals from the faces around each vertex.
///
/// The result is indexed by vertex id and has `mesh.max_vertex_id()`
/// entries. A slot is `None` when the id is not a live vertex, when the
/// vertex has no incident faces, or when the incident face normals cancel
/// out (e.g. a vertex shared by two opposite-facing sheets).
///
/// Faces referencing missing vertices are skipped.
///
/// # Example
///
/// ```
/// use mesh_types::{area_weighted_normals, unit_cube};
///
/// let cube = unit_cube();
/// let normals = area_weighted_normals(&cube);
/// assert_eq!(normals.len(), 8);
/// assert!(normals.iter().all(Option::is_some));
/// ```
#[must_use]
pub fn area_weighted_normals<M: MeshTopology + ?Sized>(mesh: &M) -> Vec<Option<Vector3<f64>>> {
    let mut sums = vec![Vector3::zeros(); mesh.max_vertex_id()];

    for (face_index, face) in mesh.faces().enumerate() {
        // Normal length = 2 * area, so summing raw cross products weights by area
        let Some(tri) = mesh.triangle(face_index) else {
            continue;
        };
        let weighted = tri.normal_unnormalized();
        for vi in face {
            if let Some(sum) = sums.get_mut(vi as usize) {
                *sum += weighted;
            }
        }
    }

    sums.into_iter()
        .enumerate()
        .map(|(id, sum)| {
            let len = sum.norm();
            (mesh.is_vertex(id) && len > f64::EPSILON).then(|| sum / len)
        })
        .collect()
}
