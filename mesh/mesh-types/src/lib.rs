//! Core mesh types shared by the mesh analysis crates.
//!
//! This crate provides the foundational types for mesh processing:
//!
//! - [`Vertex`] - A point in 3D space with an optional normal
//! - [`IndexedMesh`] - A triangle mesh whose vertices have stable, possibly sparse ids
//! - [`Triangle`] - A concrete triangle with vertex positions
//! - [`MeshTopology`] - The read-only mesh surface consumed by analysis crates
//!
//! # Vertex Ids
//!
//! Removing a vertex leaves a hole instead of renumbering the survivors, so
//! ids handed out earlier stay valid. Iterate with
//! [`MeshTopology::vertex_ids`] rather than `0..vertex_count()`.
//!
//! # Units
//!
//! This library is **unit-agnostic**. All coordinates are `f64`.
//! Downstream crates (mesh-thickness) assume millimeters.
//!
//! # Coordinate System
//!
//! Uses a **right-handed coordinate system**. Face winding is
//! **counter-clockwise (CCW) when viewed from outside**, so normals point
//! outward by the right-hand rule.
//!
//! # Example
//!
//! ```
//! use mesh_types::{Vertex, IndexedMesh, Point3, MeshTopology};
//!
//! // Create a simple triangle mesh
//! let mut mesh = IndexedMesh::new();
//! mesh.add_vertex(Vertex::new(Point3::new(0.0, 0.0, 0.0)));
//! mesh.add_vertex(Vertex::new(Point3::new(1.0, 0.0, 0.0)));
//! mesh.add_vertex(Vertex::new(Point3::new(0.5, 1.0, 0.0)));
//! mesh.add_face([0, 1, 2]);
//!
//! assert_eq!(mesh.face_count(), 1);
//! assert!(!mesh.is_empty());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

mod mesh;
mod normals;
mod traits;
mod triangle;
mod vertex;

// Re-export core types
pub use mesh::{IndexedMesh, unit_cube, uv_sphere};
pub use normals::area_weighted_normals;
pub use traits::MeshTopology;
pub use triangle::Triangle;
pub use vertex::Vertex;

// Re-export nalgebra types for convenience
pub use nalgebra::{Point3, Vector3};
