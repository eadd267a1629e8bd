//! Cooperative cancellation for thickness runs.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// A shared predicate polled by the parallel measurement loop.
///
/// The loop checks it once per batch of vertices, never per vertex, so a
/// cancellation takes effect after the batches already in flight finish.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicBool, Ordering};
/// use mesh_thickness::CancelCheck;
///
/// let flag = Arc::new(AtomicBool::new(false));
/// let check = CancelCheck::from_flag(Arc::clone(&flag));
/// assert!(!check.is_cancelled());
///
/// flag.store(true, Ordering::Relaxed);
/// assert!(check.is_cancelled());
/// ```
#[derive(Clone)]
pub struct CancelCheck(Arc<dyn Fn() -> bool + Send + Sync>);

impl CancelCheck {
    /// Wrap an arbitrary predicate. Returning `true` requests cancellation.
    pub fn new(predicate: impl Fn() -> bool + Send + Sync + 'static) -> Self {
        Self(Arc::new(predicate))
    }

    /// Cancel once `flag` is set.
    #[must_use]
    pub fn from_flag(flag: Arc<AtomicBool>) -> Self {
        Self::new(move || flag.load(Ordering::Relaxed))
    }

    /// Poll the predicate.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        (self.0)()
    }
}

impl fmt::Debug for CancelCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CancelCheck(..)")
    }
}
