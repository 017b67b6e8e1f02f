use crate::error::Result;
use crate::storage::{ExportArtifact, TableStore, WriteRequest};

pub const SECONDS_PER_DAY: i64 = 86_400;

/// `now - window`, Grenze inklusive
pub fn cutoff_timestamp(now: i64, window_days: u32) -> i64 {
    now - i64::from(window_days) * SECONDS_PER_DAY
}

/// Scanne die Quelltabelle und schreibe alle Items mit `Updated >= cutoff`
/// als Write Requests in das Artifact.
pub async fn export_records(
    store: &dyn TableStore,
    table: &str,
    cutoff: i64,
    artifact: &ExportArtifact,
) -> Result<usize> {
    tracing::info!(table, cutoff, "Exporting recently updated records");

    let items = store.scan_updated_since(table, cutoff).await?;
    let requests = items
        .iter()
        .map(WriteRequest::from_item)
        .collect::<Result<Vec<_>>>()?;

    artifact.write(&requests)?;

    tracing::info!(
        table,
        records = requests.len(),
        artifact = %artifact.path().display(),
        "Export written"
    );

    Ok(requests.len())
}
