//! Parameters for wall thickness analysis.

use crate::cancel::CancelCheck;
use crate::error::{ThicknessError, ThicknessResult};

/// Lengths below this are treated as zero (degenerate normals).
pub const ZERO_TOLERANCE: f64 = 1e-8;

/// Default self-intersection offset: a small multiple of [`ZERO_TOLERANCE`].
pub const DEFAULT_EPSILON: f64 = 10.0 * ZERO_TOLERANCE;

/// Default number of vertices processed between cancellation polls.
pub const DEFAULT_CANCEL_CHECK_INTERVAL: usize = 256;

/// Typical minimum wall for FDM printing, in millimeters.
pub const FDM_MIN_WALL: f64 = 0.8;

/// Typical minimum wall for SLA/resin printing, in millimeters.
pub const SLA_MIN_WALL: f64 = 0.4;

/// Parameters for wall thickness analysis.
///
/// The thin-wall threshold is not part of the parameters: it is supplied
/// per query, so one computed field can be checked against several limits.
///
/// # Example
///
/// ```
/// use mesh_thickness::{ThicknessParams, DEFAULT_EPSILON};
///
/// let params = ThicknessParams::default();
/// assert!(params.auto_compute_normals);
/// assert!(params.max_ray_distance.is_infinite());
/// assert!((params.epsilon - DEFAULT_EPSILON).abs() < 1e-20);
///
/// let bounded = ThicknessParams::default().max_ray_distance(50.0);
/// assert!((bounded.max_ray_distance - 50.0).abs() < 1e-10);
/// ```
#[derive(Debug, Clone)]
pub struct ThicknessParams {
    /// Estimate vertex normals when the mesh has none.
    /// When `false`, a mesh without normals is a configuration error.
    pub auto_compute_normals: bool,

    /// Maximum ray distance to trace. `f64::INFINITY` searches the whole mesh.
    pub max_ray_distance: f64,

    /// Self-intersection offset: ray origins are pushed this far outward
    /// along the normal, and the same amount is subtracted from the hit.
    pub epsilon: f64,

    /// Number of vertices processed between cancellation polls.
    pub cancel_check_interval: usize,

    /// Optional cancellation predicate.
    pub cancel: Option<CancelCheck>,
}

impl Default for ThicknessParams {
    fn default() -> Self {
        Self {
            auto_compute_normals: true,
            max_ray_distance: f64::INFINITY,
            epsilon: DEFAULT_EPSILON,
            cancel_check_interval: DEFAULT_CANCEL_CHECK_INTERVAL,
            cancel: None,
        }
    }
}

impl ThicknessParams {
    /// Create params for 3D printing validation.
    ///
    /// Rays are limited to 500mm, larger than any consumer build volume.
    #[must_use]
    pub fn for_printing() -> Self {
        Self {
            max_ray_distance: 500.0,
            ..Self::default()
        }
    }

    /// Create params for noisy 3D scan data.
    ///
    /// Uses a larger offset so rays clear the bumpy faces around each vertex.
    #[must_use]
    pub fn for_scans() -> Self {
        Self {
            epsilon: 1e-5,
            ..Self::default()
        }
    }

    /// Enable or disable automatic normal estimation.
    #[must_use]
    pub const fn auto_compute_normals(mut self, enabled: bool) -> Self {
        self.auto_compute_normals = enabled;
        self
    }

    /// Set the maximum ray distance.
    #[must_use]
    pub const fn max_ray_distance(mut self, distance: f64) -> Self {
        self.max_ray_distance = distance;
        self
    }

    /// Set the self-intersection offset.
    #[must_use]
    pub const fn epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Set how many vertices are processed between cancellation polls.
    #[must_use]
    pub const fn cancel_check_interval(mut self, interval: usize) -> Self {
        self.cancel_check_interval = interval;
        self
    }

    /// Attach a cancellation predicate.
    #[must_use]
    pub fn with_cancel(mut self, cancel: CancelCheck) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Check that the parameters describe a runnable analysis.
    ///
    /// # Errors
    ///
    /// Returns [`ThicknessError::InvalidParams`] if `epsilon` is not a finite
    /// positive number, `max_ray_distance` is not positive, or
    /// `cancel_check_interval` is zero.
    pub fn validate(&self) -> ThicknessResult<()> {
        if !(self.epsilon.is_finite() && self.epsilon > 0.0) {
            return Err(ThicknessError::invalid_params(format!(
                "epsilon must be finite and positive, got {}",
                self.epsilon
            )));
        }
        if self.max_ray_distance.is_nan() || self.max_ray_distance <= 0.0 {
            return Err(ThicknessError::invalid_params(format!(
                "max_ray_distance must be positive, got {}",
                self.max_ray_distance
            )));
        }
        if self.cancel_check_interval == 0 {
            return Err(ThicknessError::invalid_params(
                "cancel_check_interval must be at least 1",
            ));
        }
        Ok(())
    }
}
