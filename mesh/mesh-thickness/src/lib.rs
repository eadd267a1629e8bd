//! Per-vertex wall thickness analysis for 3D meshes.
//!
//! Thin walls fail structurally or do not print at all. This crate measures
//! how thick the wall is at every vertex of a closed mesh and answers
//! questions about the result: which vertices are thinner than a limit,
//! where the thinnest point is, and how the thickness is distributed.
//!
//! # Algorithm
//!
//! For each vertex a ray is cast inward, opposite to the vertex normal,
//! and the distance to the first surface it meets is the local wall
//! thickness. Rays start slightly outside the surface and ignore hits in a
//! small dead zone around their origin, so a vertex never measures its own
//! faces. Ray queries go through a [`SpatialIndex`]; the default is a
//! [`TriangleBvh`] built from the mesh.
//!
//! Vertices are measured in parallel. Long runs can be stopped with a
//! [`CancelCheck`], polled once per batch of vertices.
//!
//! Vertices that cannot be measured are not errors: they are recorded as
//! [`Thickness::Unmeasured`] with a [`MissReason`].
//!
//! # Example
//!
//! ```
//! use mesh_types::unit_cube;
//! use mesh_thickness::{ThicknessAnalyzer, ThicknessParams, FDM_MIN_WALL};
//!
//! let cube = unit_cube();
//! let mut analyzer = ThicknessAnalyzer::new(&cube, ThicknessParams::for_printing());
//! analyzer.compute()?;
//!
//! if let Some(min) = analyzer.minimum_thickness()? {
//!     println!("Thinnest wall {:.3} at vertex {}", min.thickness, min.vertex);
//! }
//! assert!(analyzer.thin_vertices(FDM_MIN_WALL)?.is_empty());
//! # Ok::<(), mesh_thickness::ThicknessError>(())
//! ```
//!
//! # Use Cases
//!
//! - **3D Printing Validation**: Check if walls are thick enough for printing
//! - **Structural Analysis**: Find weak/thin areas in a model
//! - **Quality Control**: Verify manufactured parts meet specifications

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

mod analysis;
mod analyzer;
mod bvh;
mod cancel;
mod error;
mod field;
mod params;
mod result;

pub use analysis::measure_vertex;
pub use analyzer::{DEFAULT_MAX_REGIONS, ThicknessAnalyzer, analyze_thickness};
pub use bvh::{DEFAULT_LEAF_SIZE, Ray, SpatialIndex, TriangleBvh};
pub use cancel::CancelCheck;
pub use error::{ThicknessError, ThicknessResult};
pub use field::{MissReason, THICKNESS_SENTINEL, Thickness, ThicknessField};
pub use params::{
    DEFAULT_CANCEL_CHECK_INTERVAL, DEFAULT_EPSILON, FDM_MIN_WALL, SLA_MIN_WALL, ThicknessParams,
    ZERO_TOLERANCE,
};
pub use result::{
    AnalysisReport, Completion, ThicknessSample, ThicknessStats, ThinRegion, ThinRegionReport,
};
