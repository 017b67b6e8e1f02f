use crate::error::Result;
use crate::storage::{TableStore, WriteRequest};

/// Maximale Items pro BatchWriteItem Aufruf
pub const BATCH_WRITE_LIMIT: usize = 25;

/// Aufeinanderfolgende Batches zu je höchstens 25 Requests, Reihenfolge bleibt erhalten
pub fn partition(requests: &[WriteRequest]) -> std::slice::Chunks<'_, WriteRequest> {
    requests.chunks(BATCH_WRITE_LIMIT)
}

/// Schreibe alle Requests batchweise in die Zieltabelle.
///
/// Ein fehlgeschlagener Batch bricht sofort ab, ohne Retry und ohne
/// Buchführung über bereits geschriebene Batches.
pub async fn load_batches(
    store: &dyn TableStore,
    table: &str,
    requests: &[WriteRequest],
) -> Result<usize> {
    let total = requests.len().div_ceil(BATCH_WRITE_LIMIT);
    let mut written = 0;

    for batch in partition(requests) {
        let items = batch
            .iter()
            .map(WriteRequest::to_item)
            .collect::<Result<Vec<_>>>()?;
        store.batch_put(table, items).await?;
        written += 1;

        tracing::info!(table, batch = written, total, size = batch.len(), "Batch written");
    }

    Ok(written)
}
