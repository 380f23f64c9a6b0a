use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative cancellation flag, owned by the caller and consulted by the
/// grouping engine between blocks. Cloning shares the flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self { Self::default() }

    pub fn cancel(&self) { self.0.store(true, Ordering::Relaxed) }

    pub fn is_cancelled(&self) -> bool { self.0.load(Ordering::Relaxed) }
}
