//! # Idempotent Ensure
//!
//! Create-if-absent primitive used for every prerequisite and product the
//! reconciler materializes. Losing a creation race to a concurrent pass is
//! success, which is what makes re-delivered reconciles safe to replay.

use tracing::debug;

use crate::models::Resource;

use super::{Store, StoreResult};

impl Store {
    /// Create the resource if no object occupies its (kind, key) slot.
    ///
    /// An existing occupant is left untouched even when its content
    /// differs; drift correction is the owning reconciler's decision, not
    /// the ensure primitive's.
    pub async fn ensure<R: Resource>(&self, resource: &R) -> StoreResult<()> {
        match self.create(resource).await {
            Ok(_) => {
                debug!(
                    kind = %R::KIND,
                    key = %resource.key(),
                    "Created resource"
                );
                Ok(())
            }
            Err(e) if e.is_already_exists() => {
                debug!(
                    kind = %R::KIND,
                    key = %resource.key(),
                    "Resource already present, ensure is a no-op"
                );
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}
