//! The data-access seam: where records and city lists come from.

use async_trait::async_trait;
use bizmap_core::BusinessRecord;

use crate::orchestrator::ViewOrchestrator;

#[async_trait]
pub trait RecordSource: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// All records registered in `city`, already normalized.
    async fn fetch_records_by_city(&self, city: &str) -> Result<Vec<BusinessRecord>, Self::Error>;

    async fn fetch_city_list(&self) -> Result<Vec<String>, Self::Error>;
}

/// Fetches `city` and hands the records to `orchestrator`.
///
/// On failure the orchestrator is left with an empty record set, so table
/// and map render empty instead of showing the previous city, and the error
/// is returned for the caller to surface.
///
/// # Errors
///
/// Returns the source's error if the fetch fails.
pub async fn load_city<S>(
    orchestrator: &mut ViewOrchestrator,
    source: &S,
    city: &str,
) -> Result<usize, S::Error>
where
    S: RecordSource + ?Sized,
{
    orchestrator.set_city(Some(city));
    match source.fetch_records_by_city(city).await {
        Ok(records) => {
            let count = records.len();
            orchestrator.replace_records(records);
            tracing::info!(city, count, "loaded city records");
            Ok(count)
        }
        Err(err) => {
            tracing::error!(city, error = %err, "failed to load city records");
            orchestrator.clear_records();
            Err(err)
        }
    }
}
