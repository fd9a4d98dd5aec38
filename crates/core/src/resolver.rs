//! Contract for the external emissions-measurement provider.

use async_trait::async_trait;

use crate::Error;
use crate::model::{EmissionsRecord, ResolveRow};

/// Resolves emissions for rows the cache could not answer.
///
/// Implementations must return exactly one record per input row, in input
/// order. Failures should be reported as [`Error::External`]; the engine
/// reclassifies anything else as external before surfacing it.
#[async_trait]
pub trait EmissionsResolver: Send + Sync {
    async fn resolve(&self, batch: &[ResolveRow]) -> Result<Vec<EmissionsRecord>, Error>;
}
